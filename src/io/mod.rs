//! Input/output helpers.
//!
//! - cleaned price CSV ingest + validation (`ingest`)
//! - DCF assumptions JSON (`assumptions`)
//! - result exports (CSV/JSON) (`export`)

pub mod assumptions;
pub mod export;
pub mod ingest;

pub use assumptions::*;
pub use export::*;
pub use ingest::*;
