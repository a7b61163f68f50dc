//! Input/output helpers.
//!
//! - source ingestion + normalization (`ingest`)
//! - CSV exports of stored rows (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
