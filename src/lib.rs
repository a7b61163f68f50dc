//! `macro-anomaly` library crate.
//!
//! The binary (`macro-anomaly`) is a thin wrapper around this library so that:
//!
//! - ingestion and detection are testable against substitute storage and sources
//! - a scheduled job and an ad-hoc re-detection can share the same code paths
//!
//! Public surface:
//! - [`io::ingest`] replaces canonical storage from a [`data::SeriesSource`]
//! - [`detect::AnomalyDetector::detect_and_store`] recomputes one indicator's anomalies
//! - [`detect::get_anomalies`] and [`store::load_series`] are the read side

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod detect;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod math;
pub mod report;
pub mod store;

pub use config::PipelineConfig;
pub use detect::{AnomalyDetector, get_anomalies};
pub use domain::{AnomalyRecord, DetectionOutcome, DetectionReport, IngestReport, Observation};
pub use error::{AppError, PipelineError, PipelineResult};
