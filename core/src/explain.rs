//! Explainability — why a customer scored what they scored.

use crate::{
    customer::CustomerRecord,
    scoring::{self, RiskFactor},
    types::RiskScore,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub customer_id: String,
    /// Always equal to `scoring::score` for the same record.
    pub total:       RiskScore,
    /// Points descending; equal points keep category order.
    pub factors:     Vec<RiskFactor>,
}

impl Explanation {
    /// Factors worth showing: those that actually added points.
    pub fn visible_factors(&self) -> impl Iterator<Item = &RiskFactor> {
        self.factors.iter().filter(|f| f.points > 0)
    }
}

pub fn explain(record: &CustomerRecord) -> Explanation {
    let mut factors = scoring::risk_factors(record).to_vec();
    let total = scoring::clamp_total(&factors);
    // Stable: ties stay in contract, tenure, internet, charge, senior order.
    factors.sort_by(|a, b| b.points.cmp(&a.points));

    Explanation {
        customer_id: record.id.clone(),
        total,
        factors,
    }
}
