//! Core types for the energy dashboard.
//!
//! Holds the data model shared by every pipeline stage, the error type,
//! configuration, and the cell-level parsers for timestamps and meter values.

pub mod data_processors;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{DashboardError, Result};
