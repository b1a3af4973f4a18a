//! Filter engine: predicate-based subset selection.
//!
//! A record is retained iff it matches the contract selection, the
//! internet selection and the inclusive tenure range. An inverted range
//! (`tenure_min > tenure_max`) is not corrected; it simply matches nothing.

use crate::customer::{Contract, CustomerRecord, InternetService, TENURE_MAX_MONTHS};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;

/// A categorical filter: either every value, or exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<T> {
    All,
    Only(T),
}

// Manual impl: no `T: Default` bound.
impl<T> Default for Selection<T> {
    fn default() -> Self {
        Self::All
    }
}

impl<T: PartialEq> Selection<T> {
    pub fn admits(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == value,
        }
    }
}

// Wire form is the bare string "All" or the value's own wire name.
impl<T: Serialize> Serialize for Selection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::All => serializer.serialize_str("All"),
            Self::Only(value) => value.serialize(serializer),
        }
    }
}

#[derive(Deserialize)]
enum AllMarker {
    All,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SelectionRepr<T> {
    All(AllMarker),
    Only(T),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Selection<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match SelectionRepr::<T>::deserialize(deserializer)? {
            SelectionRepr::All(AllMarker::All) => Self::All,
            SelectionRepr::Only(value) => Self::Only(value),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub contract:         Selection<Contract>,
    #[serde(rename = "internet", default)]
    pub internet_service: Selection<InternetService>,
    #[serde(rename = "tMin")]
    pub tenure_min:       u32,
    #[serde(rename = "tMax")]
    pub tenure_max:       u32,
}

impl Default for FilterCriteria {
    /// The dashboard's reset state: everything, tenure 0..=72.
    fn default() -> Self {
        Self {
            contract:         Selection::All,
            internet_service: Selection::All,
            tenure_min:       0,
            tenure_max:       TENURE_MAX_MONTHS,
        }
    }
}

impl FilterCriteria {
    pub fn matches(&self, record: &CustomerRecord) -> bool {
        self.contract.admits(&record.contract)
            && self.internet_service.admits(&record.internet_service)
            && self.tenure_min <= record.tenure_months
            && record.tenure_months <= self.tenure_max
    }
}

/// Single stable pass over `rows`, borrowing every match.
pub fn filter<'a, R>(rows: &'a [R], criteria: &FilterCriteria) -> Vec<&'a CustomerRecord>
where
    R: Borrow<CustomerRecord>,
{
    rows.iter()
        .map(Borrow::<CustomerRecord>::borrow)
        .filter(|record| criteria.matches(record))
        .collect()
}
