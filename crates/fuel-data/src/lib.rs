//! Data layer for the fuel dashboard.
//!
//! Loads fuel-log snapshots from disk, groups entries per machine, derives
//! hour-meter intervals and folds them into the consumption, efficiency and
//! cost aggregates the dashboard displays.

pub mod aggregator;
pub mod analysis;
pub mod analyzer;
pub mod reader;
pub mod table;

pub use fuel_core as core;
