//! Intrinsic valuation (discounted cash flow).

pub mod dcf;

pub use dcf::*;
