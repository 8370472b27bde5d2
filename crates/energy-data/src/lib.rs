//! Data pipeline for the energy dashboard.
//!
//! Responsible for reading uploaded CSV exports, resolving timestamps,
//! curating and coercing meter columns, the optional idle-baseline
//! correction, reshaping to long form, and filtering/aggregating the result.

pub mod aggregator;
pub mod analysis;
pub mod baseline;
pub mod curation;
pub mod normalize;
pub mod reader;
pub mod reshape;

pub use energy_core as core;
