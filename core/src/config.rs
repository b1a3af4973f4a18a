//! Tunable analytics constants.
//!
//! Defaults reproduce the dashboard's fixed policy. A JSON file may
//! override any subset of fields; absent fields keep their defaults.
//! Risk-score factor weights are deliberately NOT configurable here
//! (see scoring.rs).

use serde::{Deserialize, Serialize};

// ── Driver ranking ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DriverConfig {
    /// Segments smaller than this are noise and never reported.
    pub min_segment_size: usize,
    /// Floor applied to the baseline churn rate before dividing.
    pub baseline_epsilon: f64,
    pub top_k:            usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            min_segment_size: 40,
            baseline_epsilon: 1e-4,
            top_k:            5,
        }
    }
}

// ── What-if simulation ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WhatIfConfig {
    /// Policy ceiling on the share of a cohort that can be converted.
    pub max_conversion_pct:       f64,
    /// Stand-in One year churn when the cohort is empty, as a multiple of current churn.
    pub one_year_fallback_factor: f64,
    /// Stand-in Two year churn when the cohort is empty.
    pub two_year_fallback_factor: f64,
    /// Months of revenue credited per retained customer.
    pub retention_horizon_months: f64,
    pub default_pct_to_one_year:  f64,
    pub default_pct_to_two_year:  f64,
    pub default_cost_per_conversion: f64,
}

impl Default for WhatIfConfig {
    fn default() -> Self {
        Self {
            max_conversion_pct:          60.0,
            one_year_fallback_factor:    0.70,
            two_year_fallback_factor:    0.55,
            retention_horizon_months:    6.0,
            default_pct_to_one_year:     15.0,
            default_pct_to_two_year:     10.0,
            default_cost_per_conversion: 35.0,
        }
    }
}

// ── Risk table ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RiskTableConfig {
    /// Scores at or above this are flagged at-risk.
    pub cutoff: u32,
    pub limit:  usize,
}

impl Default for RiskTableConfig {
    fn default() -> Self {
        Self { cutoff: 65, limit: 80 }
    }
}

// ── Demo dataset ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatasetConfig {
    pub seed: u64,
    pub size: usize,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self { seed: 71313, size: 1200 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub drivers: DriverConfig,
    pub what_if: WhatIfConfig,
    pub risk:    RiskTableConfig,
    pub dataset: DatasetConfig,
}

impl AnalyticsConfig {
    /// Load from a JSON file. In tests, use AnalyticsConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: AnalyticsConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        log::debug!("config: loaded {path}");
        Ok(config)
    }

    /// Production defaults with a small demo dataset, for unit tests.
    pub fn default_test() -> Self {
        Self {
            dataset: DatasetConfig { seed: 42, size: 400 },
            ..Self::default()
        }
    }
}
