//! Dashboard session — presentation state wired to the analytics engine.
//!
//! RECOMPUTE ORDER (fixed, documented, never reordered):
//!   1. Offload KPI request   (background worker, async)
//!   2. Filter                (every later step reads this subset)
//!   3. Cohort breakdown
//!   4. Driver ranking
//!   5. Risk table
//!   6. What-if / ROI
//!   7. Explanation of the selected customer
//!
//! RULES:
//!   - The session owns the dataset, the selection and every input.
//!     The engine modules hold no state between calls.
//!   - Steps 2–7 run to completion within one recompute, so they always
//!     see the same filter parameters.

use crate::{
    aggregate::{cohort_breakdown, kpi_summary, CohortBreakdown, KpiSummary},
    command::DashboardCommand,
    config::AnalyticsConfig,
    customer::{CustomerCollection, CustomerRecord},
    drivers::{baseline_rate, rank_drivers, DriverSegment},
    error::{AnalyticsError, AnalyticsResult},
    explain::{explain, Explanation},
    filter::{filter, FilterCriteria},
    generator::generate_customers,
    offload::OffloadCoordinator,
    scoring::{rank_by_risk, RiskRow},
    types::{CustomerId, Percent, RequestSeq, RiskScore},
    what_if::{project_roi, RoiProjection, WhatIfParams},
};
use serde::Serialize;
use std::time::Duration;

/// Everything the presentation layer renders after one recompute.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub filters:        FilterCriteria,
    /// Latest KPIs accepted from the worker (or computed inline when no
    /// worker is attached). `None` while the first response is pending.
    /// They may answer an older request than `pending_seq`.
    pub kpis:           Option<KpiSummary>,
    /// Request `kpis` answers. `None` when computed inline.
    pub kpi_seq:        Option<RequestSeq>,
    /// Request submitted by this recompute.
    pub pending_seq:    Option<RequestSeq>,
    pub cohorts:        CohortBreakdown,
    pub baseline_churn: Percent,
    pub drivers:        Vec<DriverSegment>,
    pub risk_cutoff:    RiskScore,
    pub risk_table:     Vec<RiskRow>,
    pub what_if:        WhatIfParams,
    pub roi:            RoiProjection,
    pub explanation:    Option<Explanation>,
}

pub struct ChurnDashboard {
    pub config:  AnalyticsConfig,
    data:        CustomerCollection,
    filters:     FilterCriteria,
    what_if:     WhatIfParams,
    risk_cutoff: RiskScore,
    selected:    Option<CustomerId>,
    offload:     Option<OffloadCoordinator>,
}

impl ChurnDashboard {
    pub fn new(config: AnalyticsConfig, data: CustomerCollection) -> Self {
        Self {
            what_if:     WhatIfParams::from_config(&config.what_if),
            risk_cutoff: config.risk.cutoff,
            filters:     FilterCriteria::default(),
            selected:    None,
            offload:     None,
            data,
            config,
        }
    }

    /// Session over the configured demo dataset.
    pub fn demo(config: AnalyticsConfig) -> Self {
        let data = generate_customers(config.dataset.size, config.dataset.seed);
        Self::new(config, data)
    }

    /// Attach a background worker for KPI aggregation.
    pub fn with_offload(mut self) -> AnalyticsResult<Self> {
        self.offload = Some(OffloadCoordinator::spawn()?);
        Ok(self)
    }

    pub fn data(&self) -> &[CustomerRecord] {
        &self.data
    }

    pub fn filters(&self) -> &FilterCriteria {
        &self.filters
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn set_filters(&mut self, filters: FilterCriteria) {
        self.filters = filters;
    }

    pub fn set_what_if(&mut self, params: WhatIfParams) {
        self.what_if = params;
    }

    pub fn set_risk_cutoff(&mut self, cutoff: RiskScore) {
        self.risk_cutoff = cutoff;
    }

    /// Select a customer for explanation. The id must exist in the dataset.
    pub fn select(&mut self, customer_id: &str) -> AnalyticsResult<()> {
        if !self.data.iter().any(|r| r.id == customer_id) {
            return Err(AnalyticsError::CustomerNotFound { id: customer_id.to_string() });
        }
        self.selected = Some(customer_id.to_string());
        Ok(())
    }

    pub fn reset(&mut self) {
        self.filters = FilterCriteria::default();
        self.risk_cutoff = self.config.risk.cutoff;
        self.what_if = WhatIfParams::from_config(&self.config.what_if);
        self.selected = None;
    }

    pub fn replace_data(&mut self, data: CustomerCollection) {
        self.data = data;
        self.selected = None;
    }

    pub fn apply(&mut self, command: DashboardCommand) -> AnalyticsResult<()> {
        log::debug!("dashboard: apply {command:?}");
        match command {
            DashboardCommand::SetFilters { filters } => self.set_filters(filters),
            DashboardCommand::SetRiskCutoff { cutoff } => self.set_risk_cutoff(cutoff),
            DashboardCommand::SelectCustomer { customer_id } => self.select(&customer_id)?,
            DashboardCommand::ClearSelection => self.selected = None,
            DashboardCommand::SetWhatIf {
                pct_to_one_year,
                pct_to_two_year,
                cost_per_conversion,
            } => self.set_what_if(WhatIfParams {
                pct_to_one_year,
                pct_to_two_year,
                cost_per_conversion,
            }),
            DashboardCommand::Reset => self.reset(),
            DashboardCommand::RegenerateDemo { seed } => {
                let seed = seed.unwrap_or(self.config.dataset.seed);
                let data = generate_customers(self.config.dataset.size, seed);
                self.replace_data(data);
            }
        }
        Ok(())
    }

    /// Run one full recompute in the documented order.
    pub fn recompute(&mut self) -> AnalyticsResult<DashboardView> {
        // 1. Offload
        let pending_seq = match self.offload.as_mut() {
            Some(worker) => Some(worker.submit(&self.data, &self.filters)?),
            None => None,
        };

        // 2. Filter
        let subset = filter(&self.data, &self.filters);

        // 3–6. Foreground analytics
        let cohorts = cohort_breakdown(&subset);
        let baseline_churn = baseline_rate(&subset, self.config.drivers.baseline_epsilon);
        let drivers = rank_drivers(&subset, &self.config.drivers);
        let risk_table = rank_by_risk(&subset, self.risk_cutoff, self.config.risk.limit);
        let roi = project_roi(&subset, &self.what_if, &self.config.what_if);

        // 7. Explanation
        let explanation = self
            .selected
            .as_deref()
            .and_then(|id| self.data.iter().find(|r| r.id == id))
            .map(explain);

        let (kpis, kpi_seq) = match self.offload.as_mut() {
            Some(worker) => {
                worker.poll()?;
                (worker.current(), worker.current_seq())
            }
            None => (Some(kpi_summary(&subset)), None),
        };

        log::debug!(
            "dashboard: recomputed {} of {} customers, {} drivers",
            subset.len(),
            self.data.len(),
            drivers.len(),
        );

        Ok(DashboardView {
            filters: self.filters,
            kpis,
            kpi_seq,
            pending_seq,
            cohorts,
            baseline_churn,
            drivers,
            risk_cutoff: self.risk_cutoff,
            risk_table,
            what_if: self.what_if,
            roi,
            explanation,
        })
    }

    /// Wait for the worker to answer the latest request. Returns the
    /// inline KPIs immediately when no worker is attached.
    pub fn settle_kpis(&mut self, timeout: Duration) -> AnalyticsResult<Option<KpiSummary>> {
        match self.offload.as_mut() {
            Some(worker) => worker.wait_current(timeout),
            None => Ok(Some(kpi_summary(&filter(&self.data, &self.filters)))),
        }
    }
}
