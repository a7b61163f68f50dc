//! Per-indicator anomaly detection.
//!
//! For one indicator the detector:
//! 1. reads its canonical rows (date-ascending)
//! 2. drops rows whose value is missing or non-numeric
//! 3. scores the remaining values (see `math::zscore`)
//! 4. keeps observations with `|z| > threshold`
//! 5. replaces the indicator's stored anomaly set
//!
//! Steps 1 and 5 share one `IMMEDIATE` transaction, so the stored set always
//! corresponds to a single committed version of `macro_data`. Small or flat
//! series are not errors: they resolve to an empty set, and the stale set is
//! still cleared.

use std::time::Instant;

use log::{error, info};
use rusqlite::{Connection, TransactionBehavior};

use crate::domain::{AnomalyRecord, DEFAULT_Z_THRESHOLD, DetectionOutcome, DetectionReport, Observation};
use crate::error::{PipelineError, PipelineResult};
use crate::math::{ZScores, is_outlier, z_scores};
use crate::store;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyDetector {
    threshold: f64,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_Z_THRESHOLD,
        }
    }
}

impl AnomalyDetector {
    /// `threshold` must be finite and non-negative.
    pub fn new(threshold: f64) -> PipelineResult<Self> {
        if !(threshold.is_finite() && threshold >= 0.0) {
            return Err(PipelineError::Config(format!(
                "z-score threshold must be a finite, non-negative number (got {threshold})"
            )));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Recompute and persist the anomaly set for `indicator`.
    ///
    /// Storage failures are returned as `PipelineError::Storage` and leave the
    /// previously stored set in place.
    pub fn detect_and_store(
        &self,
        conn: &mut Connection,
        indicator: &str,
    ) -> PipelineResult<DetectionReport> {
        let started_at = Instant::now();
        let result = self.detect_in_transaction(conn, indicator);

        match &result {
            Ok(report) => info!(
                "event=detect module=detect status=ok indicator={indicator:?} outcome={} observations={} anomalies={} threshold={} duration_ms={}",
                report.outcome.label(),
                report.outcome.observations(),
                report.anomalies.len(),
                self.threshold,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=detect module=detect status=error indicator={indicator:?} duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            ),
        }
        result
    }

    fn detect_in_transaction(
        &self,
        conn: &mut Connection,
        indicator: &str,
    ) -> PipelineResult<DetectionReport> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let observations = store::load_series(&tx, indicator)?;
        let (outcome, anomalies) = score_observations(&observations, self.threshold);
        store::write_anomalies(&tx, indicator, &anomalies)?;
        tx.commit()?;

        Ok(DetectionReport {
            indicator: indicator.to_string(),
            outcome,
            anomalies,
        })
    }

    /// Run detection for every indicator in the catalog.
    ///
    /// Each indicator is its own unit of work; the first storage failure stops
    /// the sweep and is returned (indicators already processed stay committed).
    pub fn detect_all(&self, conn: &mut Connection) -> PipelineResult<Vec<DetectionReport>> {
        let indicators = store::list_indicators(conn)?;
        self.detect_many(conn, &indicators)
    }

    /// Run detection for the given indicators, in order.
    pub fn detect_many(
        &self,
        conn: &mut Connection,
        indicators: &[String],
    ) -> PipelineResult<Vec<DetectionReport>> {
        indicators
            .iter()
            .map(|indicator| self.detect_and_store(conn, indicator))
            .collect()
    }
}

/// Stored anomalies for `indicator`, date-ascending; empty when none exist.
pub fn get_anomalies(conn: &Connection, indicator: &str) -> PipelineResult<Vec<AnomalyRecord>> {
    Ok(store::load_anomalies(conn, indicator)?)
}

/// Score one indicator's rows and select outliers. Pure; touches no storage.
///
/// `observations` must be date-ascending (as `store::load_series` returns
/// them). Rows without a numeric value are ignored. If the same date appears
/// more than once, only the later row can be reported so the
/// `(date, indicator)` key stays unique.
pub fn score_observations(
    observations: &[Observation],
    threshold: f64,
) -> (DetectionOutcome, Vec<AnomalyRecord>) {
    let working: Vec<&Observation> = observations
        .iter()
        .filter(|obs| obs.value.is_some_and(f64::is_finite))
        .collect();
    let values: Vec<f64> = working.iter().filter_map(|obs| obs.value).collect();

    match z_scores(&values) {
        ZScores::Empty => (DetectionOutcome::NoData, Vec::new()),
        ZScores::Single => (
            DetectionOutcome::InsufficientData { observations: 1 },
            Vec::new(),
        ),
        ZScores::Degenerate { n, .. } => (
            DetectionOutcome::DegenerateDistribution { observations: n },
            Vec::new(),
        ),
        ZScores::Scored {
            mean,
            std_dev,
            scores,
        } => {
            let mut anomalies: Vec<AnomalyRecord> = Vec::new();
            for ((obs, value), z) in working.iter().zip(&values).zip(scores) {
                if !is_outlier(z, threshold) {
                    continue;
                }
                let record = AnomalyRecord {
                    date: obs.date,
                    indicator: obs.indicator.clone(),
                    value: *value,
                    z_score: z,
                };
                match anomalies.last_mut() {
                    Some(last) if last.date == record.date => *last = record,
                    _ => anomalies.push(record),
                }
            }

            (
                DetectionOutcome::Scored {
                    observations: values.len(),
                    mean,
                    std_dev,
                },
                anomalies,
            )
        }
    }
}
