//! Runtime layer for the fuel dashboard.
//!
//! Caches and rate-limits snapshot fetches, and drives periodic re-analysis
//! for watch mode.

pub mod orchestrator;
pub mod provider;
pub mod rate_limit;

pub use fuel_core as core;
pub use fuel_data as data;
