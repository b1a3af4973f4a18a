//! Driver ranking — which segments churn above the baseline.
//!
//! Candidates are a fixed, ordered list. Each is scored by lift
//! (segment churn / baseline churn); small segments are dropped before
//! ranking. Ties fall back to segment size, then declaration order.

use crate::{
    aggregate::churn_rate,
    config::DriverConfig,
    customer::{Contract, CustomerRecord, InternetService},
    types::Percent,
};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::cmp::Ordering;

/// Candidate segment predicates, in declaration order.
/// NEVER reorder: the order is the final tie-breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentRule {
    MonthToMonth,
    FiberOptic,
    ShortTenure,
    HighMonthlyCharge,
    Senior,
}

impl SegmentRule {
    pub const ALL: [SegmentRule; 5] = [
        Self::MonthToMonth,
        Self::FiberOptic,
        Self::ShortTenure,
        Self::HighMonthlyCharge,
        Self::Senior,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::MonthToMonth      => "Month-to-month",
            Self::FiberOptic        => "Fiber optic",
            Self::ShortTenure       => "Tenure ≤ 6",
            Self::HighMonthlyCharge => "Monthly ≥ 90",
            Self::Senior            => "Senior citizen",
        }
    }

    pub fn matches(&self, record: &CustomerRecord) -> bool {
        match self {
            Self::MonthToMonth      => record.contract == Contract::MonthToMonth,
            Self::FiberOptic        => record.internet_service == InternetService::Fiber,
            Self::ShortTenure       => record.tenure_months <= 6,
            Self::HighMonthlyCharge => record.monthly_charge >= 90.0,
            Self::Senior            => record.is_senior,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverSegment {
    pub name: String,
    pub rule: SegmentRule,
    pub rate: Percent,
    pub lift: f64,
    pub n:    usize,
}

/// Baseline churn for lift, floored so a churn-free subset never divides by zero.
pub fn baseline_rate<R: Borrow<CustomerRecord>>(rows: &[R], epsilon: f64) -> Percent {
    churn_rate(rows).max(epsilon)
}

/// Score every candidate against `rows` and return the top-k by lift.
pub fn rank_drivers<R: Borrow<CustomerRecord>>(rows: &[R], config: &DriverConfig) -> Vec<DriverSegment> {
    let baseline = baseline_rate(rows, config.baseline_epsilon);

    let mut segments: Vec<DriverSegment> = SegmentRule::ALL
        .iter()
        .map(|rule| {
            let members: Vec<&CustomerRecord> = rows
                .iter()
                .map(Borrow::<CustomerRecord>::borrow)
                .filter(|r| rule.matches(r))
                .collect();
            let rate = churn_rate(&members);
            DriverSegment {
                name: rule.name().to_string(),
                rule: *rule,
                rate,
                lift: rate / baseline,
                n:    members.len(),
            }
        })
        .filter(|seg| seg.n >= config.min_segment_size)
        .collect();

    // Stable sort keeps declaration order as the last tie-breaker.
    segments.sort_by(|a, b| {
        b.lift
            .partial_cmp(&a.lift)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.n.cmp(&a.n))
    });
    segments.truncate(config.top_k);

    log::debug!(
        "drivers: baseline={baseline:.2}% kept {} of {} candidates",
        segments.len(),
        SegmentRule::ALL.len(),
    );
    segments
}
