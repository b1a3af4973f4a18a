use serde::{Deserialize, Serialize};
use crate::{
    filter::FilterCriteria,
    types::{CustomerId, Percent, RiskScore},
};

/// Every user-issued dashboard command.
/// Each one changes session state; the caller recomputes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum DashboardCommand {
    // ── Filters ───────────────────────────────────
    SetFilters { filters: FilterCriteria },

    // ── Risk table ────────────────────────────────
    SetRiskCutoff { cutoff: RiskScore },
    SelectCustomer { customer_id: CustomerId },
    ClearSelection,

    // ── What-if ───────────────────────────────────
    SetWhatIf {
        pct_to_one_year:     Percent,
        pct_to_two_year:     Percent,
        cost_per_conversion: f64,
    },

    // ── Session ───────────────────────────────────
    /// Restore default filters, cutoff and what-if inputs.
    Reset,
    /// Replace the dataset with a freshly generated one.
    RegenerateDemo {
        #[serde(default)]
        seed: Option<u64>,
    },
}
