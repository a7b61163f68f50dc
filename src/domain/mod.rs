//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - canonical rows (`Observation`) and derived outliers (`AnomalyRecord`)
//! - the indicator configuration (`IndicatorSpec`, `IndicatorSet`)
//! - per-stage results (`FetchOutcome`, `IngestReport`, `DetectionReport`)

pub mod types;

pub use types::*;
