//! Data handling: the immutable dataset table, chronological splitting, and
//! synthetic series generation.

pub mod dataset;
pub mod sample;
pub mod split;

pub use dataset::*;
pub use sample::*;
pub use split::*;
