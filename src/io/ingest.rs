//! Series ingestion and normalization.
//!
//! This module turns a set of heterogeneous source series into the single
//! long-format `(date, indicator, value)` table and swaps it into canonical
//! storage.
//!
//! Design goals:
//! - **Partial-failure tolerance**: a series that fails or comes back empty is
//!   recorded as skipped; the rest of the run continues.
//! - **Isolated fetches**: each series is fetched independently (in parallel),
//!   so one slow provider call cannot abort another.
//! - **All-or-nothing writes**: the canonical table is only replaced when at
//!   least one row was produced, and then in a single transaction.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::NaiveDate;
use log::{info, warn};
use rayon::prelude::*;
use rusqlite::Connection;

use crate::data::SeriesSource;
use crate::domain::{FetchOutcome, IndicatorSet, IndicatorSpec, IngestReport, Observation, RawSeries};
use crate::error::{PipelineError, PipelineResult};
use crate::store;

/// Fetch every configured series and replace canonical storage with the result.
///
/// Returns `PipelineError::EmptyResult` (and leaves storage untouched) when no
/// series produced any rows.
pub fn ingest<S>(
    conn: &mut Connection,
    source: &S,
    indicators: &IndicatorSet,
) -> PipelineResult<IngestReport>
where
    S: SeriesSource + ?Sized,
{
    let started_at = Instant::now();
    let attempted = indicators.as_slice().len();
    info!("event=ingest module=ingest status=start series={attempted}");

    let outcomes = fetch_all(source, indicators);
    let rows = normalize(&outcomes);

    let skipped: Vec<(String, String)> = outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            FetchOutcome::Skipped { spec, reason } => {
                Some((spec.display_name.clone(), reason.clone()))
            }
            FetchOutcome::Fetched { .. } => None,
        })
        .collect();

    if rows.is_empty() {
        warn!(
            "event=ingest module=ingest status=error reason=empty_result attempted={attempted} duration_ms={}",
            started_at.elapsed().as_millis()
        );
        return Err(PipelineError::EmptyResult { attempted });
    }

    let rows_written = store::replace_observations(conn, &rows)?;

    let indicators_written: Vec<String> = outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            FetchOutcome::Fetched { spec, .. } => Some(spec.display_name.clone()),
            FetchOutcome::Skipped { .. } => None,
        })
        .collect();

    info!(
        "event=ingest module=ingest status=ok rows={rows_written} indicators={} skipped={} duration_ms={}",
        indicators_written.len(),
        skipped.len(),
        started_at.elapsed().as_millis()
    );

    Ok(IngestReport {
        rows_written,
        indicators: indicators_written,
        skipped,
    })
}

/// Fetch each configured series independently, in configuration order.
pub fn fetch_all<S>(source: &S, indicators: &IndicatorSet) -> Vec<FetchOutcome>
where
    S: SeriesSource + ?Sized,
{
    indicators
        .as_slice()
        .par_iter()
        .map(|spec| fetch_one(source, spec))
        .collect()
}

fn fetch_one<S>(source: &S, spec: &IndicatorSpec) -> FetchOutcome
where
    S: SeriesSource + ?Sized,
{
    let started_at = Instant::now();
    match source.fetch_series(&spec.series_id) {
        Ok(series) if series.is_empty() => {
            warn!(
                "event=fetch_series module=ingest status=skip indicator={:?} series_id={} reason=empty",
                spec.display_name, spec.series_id
            );
            FetchOutcome::Skipped {
                spec: spec.clone(),
                reason: "source returned no observations".to_string(),
            }
        }
        Ok(series) => {
            info!(
                "event=fetch_series module=ingest status=ok indicator={:?} series_id={} observations={} duration_ms={}",
                spec.display_name,
                spec.series_id,
                series.points.len(),
                started_at.elapsed().as_millis()
            );
            FetchOutcome::Fetched {
                spec: spec.clone(),
                series,
            }
        }
        Err(err) => {
            warn!(
                "event=fetch_series module=ingest status=skip indicator={:?} series_id={} error={err}",
                spec.display_name, spec.series_id
            );
            FetchOutcome::Skipped {
                spec: spec.clone(),
                reason: err.to_string(),
            }
        }
    }
}

/// Reshape fetched series into canonical rows.
///
/// Rows are grouped by series in configuration order and are date-ascending
/// within a series. A date repeated within one series keeps its last value.
pub fn normalize(outcomes: &[FetchOutcome]) -> Vec<Observation> {
    let mut rows = Vec::new();
    for outcome in outcomes {
        if let FetchOutcome::Fetched { spec, series } = outcome {
            rows.extend(reshape(&spec.display_name, series));
        }
    }
    rows
}

fn reshape(indicator: &str, series: &RawSeries) -> Vec<Observation> {
    let by_date: BTreeMap<NaiveDate, Option<f64>> = series
        .points
        .iter()
        .map(|&(date, value)| (date, value.filter(|v| v.is_finite())))
        .collect();

    by_date
        .into_iter()
        .map(|(date, value)| Observation {
            date,
            indicator: indicator.to_string(),
            value,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn reshape_collapses_duplicate_dates_and_sorts() {
        let series = RawSeries::new(vec![
            (d(2020, 3, 1), Some(3.0)),
            (d(2020, 1, 1), Some(1.0)),
            (d(2020, 3, 1), Some(4.0)),
            (d(2020, 2, 1), None),
        ]);
        let rows = reshape("X", &series);
        let got: Vec<_> = rows.iter().map(|r| (r.date, r.value)).collect();
        assert_eq!(
            got,
            vec![
                (d(2020, 1, 1), Some(1.0)),
                (d(2020, 2, 1), None),
                (d(2020, 3, 1), Some(4.0)),
            ]
        );
        assert!(rows.iter().all(|r| r.indicator == "X"));
    }

    #[test]
    fn reshape_turns_non_finite_values_into_nulls() {
        let series = RawSeries::new(vec![(d(2020, 1, 1), Some(f64::NAN))]);
        assert_eq!(reshape("X", &series)[0].value, None);
    }

    #[test]
    fn normalize_ignores_skipped_outcomes() {
        let outcomes = vec![
            FetchOutcome::Skipped {
                spec: IndicatorSpec::new("A", "A_ID"),
                reason: "timeout".to_string(),
            },
            FetchOutcome::Fetched {
                spec: IndicatorSpec::new("B", "B_ID"),
                series: RawSeries::new(vec![(d(2021, 1, 1), Some(2.0))]),
            },
        ];
        let rows = normalize(&outcomes);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].indicator, "B");
    }
}
