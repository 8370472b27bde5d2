//! Interaction layer for the energy dashboard.
//!
//! Keeps a user's uploads and filter selection and hands both to the
//! stateless pipeline whenever something changes.

pub mod session;

pub use energy_core as core;
pub use energy_data as data;
