//! Customer record model and the ingest boundary.
//!
//! RULE: Records are immutable once created. Every analytics pass
//! borrows the collection; nothing downstream mutates it.
//!
//! The analytics functions never validate their input. Callers that
//! load data from outside the process should run `validate_collection`
//! once at ingest.

use crate::{
    error::{AnalyticsError, AnalyticsResult},
    types::CustomerId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const TENURE_MIN_MONTHS: u32 = 1;
pub const TENURE_MAX_MONTHS: u32 = 72;
pub const MONTHLY_CHARGE_MIN: f64 = 18.0;
pub const MONTHLY_CHARGE_MAX: f64 = 120.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Contract {
    #[serde(rename = "Month-to-month")]
    MonthToMonth,
    #[serde(rename = "One year")]
    OneYear,
    #[serde(rename = "Two year")]
    TwoYear,
}

impl Contract {
    /// Display order used by cohort charts.
    pub const ALL: [Contract; 3] = [Self::MonthToMonth, Self::OneYear, Self::TwoYear];

    pub fn label(&self) -> &'static str {
        match self {
            Self::MonthToMonth => "Month-to-month",
            Self::OneYear      => "One year",
            Self::TwoYear      => "Two year",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InternetService {
    #[serde(rename = "Fiber optic")]
    Fiber,
    #[serde(rename = "DSL")]
    Dsl,
    #[serde(rename = "None")]
    None,
}

impl InternetService {
    pub const ALL: [InternetService; 3] = [Self::Fiber, Self::Dsl, Self::None];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Fiber => "Fiber optic",
            Self::Dsl   => "DSL",
            Self::None  => "None",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerRecord {
    #[serde(rename = "customerID")]
    pub id:               CustomerId,
    pub contract:         Contract,
    #[serde(rename = "internet")]
    pub internet_service: InternetService,
    #[serde(rename = "senior")]
    pub is_senior:        bool,
    #[serde(rename = "tenure")]
    pub tenure_months:    u32,
    #[serde(rename = "monthly")]
    pub monthly_charge:   f64,
    #[serde(rename = "churn")]
    pub churned:          bool,
}

/// Ordered collection of customers. Order carries no meaning to any
/// computation, but filtering preserves it.
pub type CustomerCollection = Vec<CustomerRecord>;

impl CustomerRecord {
    /// Check a single record against the declared field domains.
    pub fn validate(&self) -> AnalyticsResult<()> {
        let invalid = |reason: String| AnalyticsError::InvalidRecord {
            id: self.id.clone(),
            reason,
        };

        if self.id.trim().is_empty() {
            return Err(invalid("empty customer id".into()));
        }
        if !(TENURE_MIN_MONTHS..=TENURE_MAX_MONTHS).contains(&self.tenure_months) {
            return Err(invalid(format!(
                "tenure {} outside [{TENURE_MIN_MONTHS},{TENURE_MAX_MONTHS}]",
                self.tenure_months
            )));
        }
        if !self.monthly_charge.is_finite()
            || self.monthly_charge < MONTHLY_CHARGE_MIN
            || self.monthly_charge > MONTHLY_CHARGE_MAX
        {
            return Err(invalid(format!(
                "monthly charge {} outside [{MONTHLY_CHARGE_MIN},{MONTHLY_CHARGE_MAX}]",
                self.monthly_charge
            )));
        }
        Ok(())
    }
}

/// Validate every record and reject duplicate ids.
pub fn validate_collection(rows: &[CustomerRecord]) -> AnalyticsResult<()> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(rows.len());
    for record in rows {
        record.validate()?;
        if !seen.insert(record.id.as_str()) {
            return Err(AnalyticsError::DuplicateId { id: record.id.clone() });
        }
    }
    Ok(())
}

/// Read a JSON array of customer records from disk and validate it.
pub fn load_collection(path: impl AsRef<Path>) -> AnalyticsResult<CustomerCollection> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let rows: CustomerCollection = serde_json::from_str(&content)?;
    validate_collection(&rows)?;
    log::info!("ingest: loaded {} customers from {}", rows.len(), path.display());
    Ok(rows)
}
