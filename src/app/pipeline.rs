//! Shared "ingest then detect" workflow.
//!
//! Keeping this in one place avoids duplicating the core flow between the CLI
//! commands and tests:
//! source fetch -> normalize -> canonical replace -> per-indicator detection

use rusqlite::Connection;

use crate::data::SeriesSource;
use crate::detect::AnomalyDetector;
use crate::domain::{DetectionReport, IndicatorSet, IngestReport};
use crate::error::PipelineResult;

/// All computed outputs of a single `run`.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestReport,
    pub detections: Vec<DetectionReport>,
}

/// Replace canonical storage from `source`, then recompute anomalies for each
/// indicator that was just ingested.
///
/// If ingestion fails nothing is detected and storage is left as it was.
pub fn run_full<S>(
    conn: &mut Connection,
    source: &S,
    indicators: &IndicatorSet,
    detector: &AnomalyDetector,
) -> PipelineResult<RunOutput>
where
    S: SeriesSource + ?Sized,
{
    let ingest = crate::io::ingest(conn, source, indicators)?;
    let detections = detector.detect_many(conn, &ingest.indicators)?;
    Ok(RunOutput { ingest, detections })
}
