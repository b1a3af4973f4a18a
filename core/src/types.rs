//! Shared primitive types used across the analytics engine.

/// A stable, unique identifier for a customer record.
pub type CustomerId = String;

/// A percentage in [0, 100].
pub type Percent = f64;

/// A bounded additive risk score in [0, 100].
pub type RiskScore = u32;

/// Monotonic tag attached to every offloaded request.
pub type RequestSeq = u64;
