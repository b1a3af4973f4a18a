//! Risk scoring — a fixed additive heuristic, not a fitted model.
//!
//! Five factor categories each contribute points:
//!
//!   contract   MonthToMonth 35 | OneYear 16 | TwoYear 6
//!   tenure     ≤3 26 | ≤6 18 | ≤12 10 | ≤24 6 | else 0
//!   internet   Fiber 14 | DSL 6 | None 0
//!   charge     ≥90 14 | ≥70 7 | else 0
//!   senior     5 | 0
//!
//! `risk_factors` is the single source of these points. Both `score`
//! and the explainability engine read it, so the explained total can
//! never drift from the score.

use crate::{
    customer::{Contract, CustomerRecord, InternetService},
    types::RiskScore,
};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

pub const MAX_RISK_SCORE: RiskScore = 100;

/// Factor categories in their fixed explanation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorCategory {
    Contract,
    Tenure,
    Internet,
    Charge,
    Senior,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub category: FactorCategory,
    pub label:    String,
    pub points:   RiskScore,
}

impl RiskFactor {
    fn new(category: FactorCategory, label: &str, points: RiskScore) -> Self {
        Self { category, label: label.to_string(), points }
    }
}

fn contract_factor(contract: Contract) -> RiskFactor {
    let (label, points) = match contract {
        Contract::MonthToMonth => ("Month-to-month contract", 35),
        Contract::OneYear      => ("One year contract", 16),
        Contract::TwoYear      => ("Two year contract", 6),
    };
    RiskFactor::new(FactorCategory::Contract, label, points)
}

fn tenure_factor(tenure_months: u32) -> RiskFactor {
    let (label, points) = match tenure_months {
        0..=3   => ("Tenure 0–3 months", 26),
        4..=6   => ("Tenure 4–6 months", 18),
        7..=12  => ("Tenure 7–12 months", 10),
        13..=24 => ("Tenure 13–24 months", 6),
        _       => ("Tenure 25+ months", 0),
    };
    RiskFactor::new(FactorCategory::Tenure, label, points)
}

fn internet_factor(service: InternetService) -> RiskFactor {
    let (label, points) = match service {
        InternetService::Fiber => ("Fiber optic", 14),
        InternetService::Dsl   => ("DSL", 6),
        InternetService::None  => ("No internet", 0),
    };
    RiskFactor::new(FactorCategory::Internet, label, points)
}

fn charge_factor(monthly_charge: f64) -> RiskFactor {
    let (label, points) = if monthly_charge >= 90.0 {
        ("Monthly ≥ $90", 14)
    } else if monthly_charge >= 70.0 {
        ("Monthly $70–$89", 7)
    } else {
        ("Monthly < $70", 0)
    };
    RiskFactor::new(FactorCategory::Charge, label, points)
}

fn senior_factor(is_senior: bool) -> RiskFactor {
    if is_senior {
        RiskFactor::new(FactorCategory::Senior, "Senior citizen", 5)
    } else {
        RiskFactor::new(FactorCategory::Senior, "Not a senior citizen", 0)
    }
}

/// Per-category contributions in category order, zero-point factors included.
pub fn risk_factors(record: &CustomerRecord) -> [RiskFactor; 5] {
    [
        contract_factor(record.contract),
        tenure_factor(record.tenure_months),
        internet_factor(record.internet_service),
        charge_factor(record.monthly_charge),
        senior_factor(record.is_senior),
    ]
}

/// Sum of factor points, clamped at the top only. The clamp is
/// unreachable with today's weights (their maxima sum to 94) but must
/// hold if weights change.
pub fn clamp_total(factors: &[RiskFactor]) -> RiskScore {
    let raw: RiskScore = factors.iter().map(|f| f.points).sum();
    raw.min(MAX_RISK_SCORE)
}

pub fn score(record: &CustomerRecord) -> RiskScore {
    clamp_total(&risk_factors(record))
}

// ── Risk table ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRow {
    pub customer: CustomerRecord,
    pub score:    RiskScore,
    pub at_risk:  bool,
}

/// Highest-risk customers first, at most `limit` rows. Equal scores keep
/// input order. A row is at-risk when its score reaches `cutoff`.
pub fn rank_by_risk<R: Borrow<CustomerRecord>>(
    rows: &[R],
    cutoff: RiskScore,
    limit: usize,
) -> Vec<RiskRow> {
    let mut scored: Vec<(&CustomerRecord, RiskScore)> = rows
        .iter()
        .map(Borrow::<CustomerRecord>::borrow)
        .map(|r| (r, score(r)))
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));

    scored
        .into_iter()
        .take(limit)
        .map(|(record, score)| RiskRow {
            customer: record.clone(),
            score,
            at_risk: score >= cutoff,
        })
        .collect()
}
