//! Aggregate engine — churn rate, average monthly charge and cohort grouping.
//!
//! Every reducer is total: an empty subset yields 0 rather than an error.
//! All functions accept either owned records or a borrowed filtered view.

use crate::{
    customer::{Contract, CustomerRecord, InternetService},
    types::Percent,
};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;

// ── Reducers ─────────────────────────────────────────────────────────────────

/// Share of churned records, as a percentage. 0 for an empty subset.
pub fn churn_rate<R: Borrow<CustomerRecord>>(rows: &[R]) -> Percent {
    if rows.is_empty() {
        return 0.0;
    }
    let churned = rows
        .iter()
        .map(Borrow::<CustomerRecord>::borrow)
        .filter(|r| r.churned)
        .count();
    churned as f64 / rows.len() as f64 * 100.0
}

/// Arithmetic mean of the monthly charge. 0 for an empty subset.
pub fn average_monthly<R: Borrow<CustomerRecord>>(rows: &[R]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let total: f64 = rows
        .iter()
        .map(Borrow::<CustomerRecord>::borrow)
        .map(|r| r.monthly_charge)
        .sum();
    total / rows.len() as f64
}

/// Group records by `key_fn`. Only keys that occur in `rows` appear in
/// the result; each group keeps the input order.
pub fn group_by<'a, R, K, F>(rows: &'a [R], mut key_fn: F) -> BTreeMap<K, Vec<&'a CustomerRecord>>
where
    R: Borrow<CustomerRecord>,
    K: Ord,
    F: FnMut(&CustomerRecord) -> K,
{
    let mut groups: BTreeMap<K, Vec<&'a CustomerRecord>> = BTreeMap::new();
    for row in rows {
        let record: &'a CustomerRecord = Borrow::<CustomerRecord>::borrow(row);
        groups.entry(key_fn(record)).or_default().push(record);
    }
    groups
}

// ── Tenure buckets ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TenureBucket {
    UpTo3,
    From4To6,
    From7To12,
    From13To24,
    Over24,
}

impl TenureBucket {
    pub const ALL: [TenureBucket; 5] = [
        Self::UpTo3,
        Self::From4To6,
        Self::From7To12,
        Self::From13To24,
        Self::Over24,
    ];

    /// Upper bounds are inclusive and checked ascending.
    pub fn for_tenure(tenure_months: u32) -> Self {
        match tenure_months {
            0..=3   => Self::UpTo3,
            4..=6   => Self::From4To6,
            7..=12  => Self::From7To12,
            13..=24 => Self::From13To24,
            _       => Self::Over24,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::UpTo3      => "0–3",
            Self::From4To6   => "4–6",
            Self::From7To12  => "7–12",
            Self::From13To24 => "13–24",
            Self::Over24     => "25+",
        }
    }
}

// ── Cohorts ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortStat {
    pub label:      String,
    pub n:          usize,
    pub churn_rate: Percent,
}

/// Churn by cohort along the three dashboard dimensions, each in its
/// fixed display order. Unobserved keys report `n = 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortBreakdown {
    pub tenure:   Vec<CohortStat>,
    pub contract: Vec<CohortStat>,
    pub internet: Vec<CohortStat>,
}

fn ordered_stats<K: Ord + Copy>(
    groups: &BTreeMap<K, Vec<&CustomerRecord>>,
    order: &[K],
    label: impl Fn(&K) -> &'static str,
) -> Vec<CohortStat> {
    order
        .iter()
        .map(|key| {
            let rows = groups.get(key).map(Vec::as_slice).unwrap_or(&[]);
            CohortStat {
                label:      label(key).to_string(),
                n:          rows.len(),
                churn_rate: churn_rate(rows),
            }
        })
        .collect()
}

pub fn cohort_breakdown<R: Borrow<CustomerRecord>>(rows: &[R]) -> CohortBreakdown {
    let by_tenure = group_by(rows, |r| TenureBucket::for_tenure(r.tenure_months));
    let by_contract = group_by(rows, |r| r.contract);
    let by_internet = group_by(rows, |r| r.internet_service);

    CohortBreakdown {
        tenure:   ordered_stats(&by_tenure, &TenureBucket::ALL, TenureBucket::label),
        contract: ordered_stats(&by_contract, &Contract::ALL, Contract::label),
        internet: ordered_stats(&by_internet, &InternetService::ALL, InternetService::label),
    }
}

// ── KPI summary ──────────────────────────────────────────────────────────────

/// Headline figures for a subset. This is the payload the offload worker
/// returns; the wire names follow the dashboard protocol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSummary {
    pub count:       usize,
    pub churn:       Percent,
    pub avg_monthly: f64,
}

pub fn kpi_summary<R: Borrow<CustomerRecord>>(rows: &[R]) -> KpiSummary {
    KpiSummary {
        count:       rows.len(),
        churn:       churn_rate(rows),
        avg_monthly: average_monthly(rows),
    }
}
