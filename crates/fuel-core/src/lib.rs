//! Core types and pure helpers for the fuel dashboard.
//!
//! Holds the log-entry data model, the row normaliser, timestamp and month
//! helpers, cost projection, display formatting, error types and CLI
//! settings shared by the other crates.

pub mod calculations;
pub mod data_processors;
pub mod error;
pub mod formatting;
pub mod models;
pub mod pricing;
pub mod settings;
pub mod time_utils;
