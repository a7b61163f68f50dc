//! Reporting utilities: terminal tables and run summaries.

mod format;

pub use format::*;
