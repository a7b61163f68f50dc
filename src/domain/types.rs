//! Shared domain types.
//!
//! These types are intentionally kept small and serializable so they can be:
//!
//! - written to and read from canonical storage
//! - exported to CSV for downstream tools
//! - passed between the ingestion and detection stages without conversion

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{PipelineError, PipelineResult};

/// Default outlier threshold in standard-deviation units.
pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;

/// Canonical long-format row: one observation of one indicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub indicator: String,
    /// `None` when the source reported a missing value for the date.
    pub value: Option<f64>,
}

/// A stored outlier. At most one per `(date, indicator)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyRecord {
    pub date: NaiveDate,
    pub indicator: String,
    pub value: f64,
    pub z_score: f64,
}

/// One configured indicator: the name it is stored under plus the id the
/// external source knows it by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorSpec {
    pub display_name: String,
    pub series_id: String,
}

impl IndicatorSpec {
    pub fn new(display_name: impl Into<String>, series_id: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            series_id: series_id.into(),
        }
    }

    /// Parse a `NAME=SERIES_ID` assignment (as accepted by `--series`).
    pub fn parse_assignment(raw: &str) -> PipelineResult<Self> {
        let (name, series_id) = raw.split_once('=').ok_or_else(|| {
            PipelineError::Config(format!("expected NAME=SERIES_ID, got `{raw}`"))
        })?;
        Ok(Self::new(name.trim(), series_id.trim()))
    }
}

/// Ordered `display_name -> series_id` mapping with unique display names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorSet {
    specs: Vec<IndicatorSpec>,
}

impl IndicatorSet {
    pub fn new(specs: Vec<IndicatorSpec>) -> PipelineResult<Self> {
        if specs.is_empty() {
            return Err(PipelineError::Config(
                "at least one indicator must be configured".to_string(),
            ));
        }
        for (idx, spec) in specs.iter().enumerate() {
            if spec.display_name.is_empty() || spec.series_id.is_empty() {
                return Err(PipelineError::Config(format!(
                    "indicator #{} has an empty display name or series id",
                    idx + 1
                )));
            }
            if specs[..idx]
                .iter()
                .any(|prev| prev.display_name == spec.display_name)
            {
                return Err(PipelineError::Config(format!(
                    "duplicate indicator display name `{}`",
                    spec.display_name
                )));
            }
        }
        Ok(Self { specs })
    }

    /// CPI, unemployment and the effective fed funds rate.
    pub fn defaults() -> Self {
        Self {
            specs: vec![
                IndicatorSpec::new("CPI", "CPIAUCSL"),
                IndicatorSpec::new("Unemployment Rate", "UNRATE"),
                IndicatorSpec::new("Fed Funds Rate", "FEDFUNDS"),
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndicatorSpec> {
        self.specs.iter()
    }

    pub fn as_slice(&self) -> &[IndicatorSpec] {
        &self.specs
    }
}

/// A series as returned by the external source: dated, possibly-missing values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSeries {
    pub points: Vec<(NaiveDate, Option<f64>)>,
}

impl RawSeries {
    pub fn new(points: Vec<(NaiveDate, Option<f64>)>) -> Self {
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Result of fetching one configured series.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Fetched {
        spec: IndicatorSpec,
        series: RawSeries,
    },
    Skipped {
        spec: IndicatorSpec,
        reason: String,
    },
}

/// Summary of a successful ingestion run.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub rows_written: usize,
    /// Display names that contributed rows, in configuration order.
    pub indicators: Vec<String>,
    /// `(display_name, reason)` for each series that was skipped.
    pub skipped: Vec<(String, String)>,
}

/// How the working set of one indicator resolved statistically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetectionOutcome {
    /// z-scores were computed for every numeric observation.
    Scored {
        observations: usize,
        mean: f64,
        std_dev: f64,
    },
    /// No numeric observations at all.
    NoData,
    /// Exactly one numeric observation.
    InsufficientData { observations: usize },
    /// Every numeric observation is identical (standard deviation is zero).
    DegenerateDistribution { observations: usize },
}

impl DetectionOutcome {
    pub fn observations(&self) -> usize {
        match *self {
            DetectionOutcome::Scored { observations, .. }
            | DetectionOutcome::InsufficientData { observations }
            | DetectionOutcome::DegenerateDistribution { observations } => observations,
            DetectionOutcome::NoData => 0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DetectionOutcome::Scored { .. } => "scored",
            DetectionOutcome::NoData => "no_data",
            DetectionOutcome::InsufficientData { .. } => "insufficient_data",
            DetectionOutcome::DegenerateDistribution { .. } => "degenerate_distribution",
        }
    }
}

/// Result of one `detect_and_store` call.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionReport {
    pub indicator: String,
    pub outcome: DetectionOutcome,
    /// The outlier set now stored for the indicator (date-ascending).
    pub anomalies: Vec<AnomalyRecord>,
}
