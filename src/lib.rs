//! `dcf-signal` library crate.
//!
//! The binary (`dsig`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the forecasting and valuation halves can be used on their own
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod decision;
pub mod domain;
pub mod error;
pub mod features;
pub mod forecast;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
pub mod tuning;
pub mod valuation;
