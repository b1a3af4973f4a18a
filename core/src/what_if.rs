//! What-if retention simulation.
//!
//! Counterfactual: move a share of Month-to-month customers onto One year
//! and Two year contracts, assume they churn at those cohorts' observed
//! rates, and recompute overall churn. Non Month-to-month customers are
//! left untouched.
//!
//! ROI credits each prevented churn with `retention_horizon_months` of the
//! subset's average monthly charge against a flat cost per conversion.
//! ROI is `None` when nothing is spent; it is never reported as 0%.

use crate::{
    aggregate::{average_monthly, churn_rate},
    config::WhatIfConfig,
    customer::{Contract, CustomerRecord},
    types::Percent,
};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WhatIfParams {
    pub pct_to_one_year:     Percent,
    pub pct_to_two_year:     Percent,
    pub cost_per_conversion: f64,
}

impl WhatIfParams {
    pub fn from_config(config: &WhatIfConfig) -> Self {
        Self {
            pct_to_one_year:     config.default_pct_to_one_year,
            pct_to_two_year:     config.default_pct_to_two_year,
            cost_per_conversion: config.default_cost_per_conversion,
        }
    }
}

impl Default for WhatIfParams {
    fn default() -> Self {
        Self::from_config(&WhatIfConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    pub current:   Percent,
    pub simulated: Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoiProjection {
    pub current:         Percent,
    pub simulated:       Percent,
    /// Churn points saved, never negative.
    pub delta_pts:       Percent,
    pub saved_customers: u64,
    pub converted_count: u64,
    pub spend:           f64,
    pub value:           f64,
    /// `None` when spend is zero.
    pub roi:             Option<f64>,
}

/// Clamp a requested conversion share into `[0, ceiling]`.
/// NaN collapses to 0.
pub fn clamp_conversion_pct(pct: Percent, ceiling: Percent) -> Percent {
    pct.max(0.0).min(ceiling.max(0.0))
}

fn contract_cohort<'a, R: Borrow<CustomerRecord>>(
    rows: &'a [R],
    contract: Contract,
) -> Vec<&'a CustomerRecord> {
    rows.iter()
        .map(Borrow::<CustomerRecord>::borrow)
        .filter(|r| r.contract == contract)
        .collect()
}

/// Observed churn for a target cohort, or `current × fallback` when the
/// cohort has no members to observe.
fn target_rate(cohort: &[&CustomerRecord], current: Percent, fallback: f64) -> Percent {
    if cohort.is_empty() {
        current * fallback
    } else {
        churn_rate(cohort)
    }
}

pub fn simulate_conversion<R: Borrow<CustomerRecord>>(
    rows: &[R],
    pct_to_one_year: Percent,
    pct_to_two_year: Percent,
    config: &WhatIfConfig,
) -> Simulation {
    let current = churn_rate(rows);

    let month_to_month = contract_cohort(rows, Contract::MonthToMonth);
    if month_to_month.is_empty() {
        return Simulation { current, simulated: current };
    }

    let one_year = contract_cohort(rows, Contract::OneYear);
    let two_year = contract_cohort(rows, Contract::TwoYear);

    let r_m = churn_rate(&month_to_month);
    let r_1 = target_rate(&one_year, current, config.one_year_fallback_factor);
    let r_2 = target_rate(&two_year, current, config.two_year_fallback_factor);

    let p1 = clamp_conversion_pct(pct_to_one_year, config.max_conversion_pct) / 100.0;
    let p2 = clamp_conversion_pct(pct_to_two_year, config.max_conversion_pct) / 100.0;
    let p0 = (1.0 - p1 - p2).max(0.0);

    let blended_m_rate = p0 * r_m + p1 * r_1 + p2 * r_2;

    let other_churned = one_year.iter().chain(two_year.iter()).filter(|r| r.churned).count() as f64;
    let m_churned = blended_m_rate / 100.0 * month_to_month.len() as f64;
    let simulated = (other_churned + m_churned) / rows.len() as f64 * 100.0;

    Simulation { current, simulated }
}

pub fn project_roi<R: Borrow<CustomerRecord>>(
    rows: &[R],
    params: &WhatIfParams,
    config: &WhatIfConfig,
) -> RoiProjection {
    let Simulation { current, simulated } =
        simulate_conversion(rows, params.pct_to_one_year, params.pct_to_two_year, config);
    let delta_pts = (current - simulated).max(0.0);

    let saved_customers = (delta_pts / 100.0 * rows.len() as f64).round() as u64;

    let converted_pct = clamp_conversion_pct(params.pct_to_one_year, config.max_conversion_pct)
        + clamp_conversion_pct(params.pct_to_two_year, config.max_conversion_pct);
    let m2m_count = contract_cohort(rows, Contract::MonthToMonth).len();
    let converted_count = (converted_pct / 100.0 * m2m_count as f64).round() as u64;

    let spend = converted_count as f64 * params.cost_per_conversion.max(0.0);
    let value = saved_customers as f64 * average_monthly(rows) * config.retention_horizon_months;
    let roi = (spend > 0.0).then(|| (value - spend) / spend * 100.0);

    log::debug!(
        "what_if: current={current:.2}% simulated={simulated:.2}% saved={saved_customers} \
         converted={converted_count} spend={spend:.2}"
    );

    RoiProjection {
        current,
        simulated,
        delta_pts,
        saved_customers,
        converted_count,
        spend,
        value,
        roi,
    }
}
