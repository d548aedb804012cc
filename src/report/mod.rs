//! Reporting utilities: plain-text summaries for stdout.

pub mod format;

pub use format::*;
