//! Mathematical utilities: sample moments and standard scores.

pub mod zscore;

pub use zscore::*;
