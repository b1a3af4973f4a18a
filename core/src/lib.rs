//! churn-core: churn risk analytics over an in-memory customer collection.
//!
//! Leaf-first:
//!   customer   — record model and ingest validation
//!   filter     — predicate subset selection
//!   aggregate  — churn rate, average charge, cohorts, KPI summary
//!   drivers    — segment lift ranking
//!   scoring    — additive risk score and risk table
//!   explain    — per-factor score decomposition
//!   what_if    — contract-migration simulation and ROI
//!   offload    — background KPI worker and its message protocol
//!   dashboard  — presentation-layer session that drives all of the above

pub mod aggregate;
pub mod command;
pub mod config;
pub mod customer;
pub mod dashboard;
pub mod drivers;
pub mod error;
pub mod explain;
pub mod filter;
pub mod generator;
pub mod offload;
pub mod rng;
pub mod scoring;
pub mod types;
pub mod what_if;
