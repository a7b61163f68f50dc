//! A substitute source backed by prepared data.
//!
//! Useful for offline runs and for exercising partial-failure behavior.

use std::collections::HashMap;

use chrono::NaiveDate;

use super::SeriesSource;
use crate::domain::RawSeries;
use crate::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone)]
enum Entry {
    Series(RawSeries),
    Failure(String),
}

#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    entries: HashMap<String, Entry>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a series of fully-present values.
    pub fn with_values(self, series_id: &str, points: &[(NaiveDate, f64)]) -> Self {
        let points = points.iter().map(|&(d, v)| (d, Some(v))).collect();
        self.with_series(series_id, RawSeries::new(points))
    }

    pub fn with_series(mut self, series_id: &str, series: RawSeries) -> Self {
        self.entries
            .insert(series_id.to_string(), Entry::Series(series));
        self
    }

    /// Make every fetch of `series_id` fail with `reason`.
    pub fn with_failure(mut self, series_id: &str, reason: impl Into<String>) -> Self {
        self.entries
            .insert(series_id.to_string(), Entry::Failure(reason.into()));
        self
    }
}

impl SeriesSource for InMemorySource {
    fn fetch_series(&self, series_id: &str) -> PipelineResult<RawSeries> {
        match self.entries.get(series_id) {
            Some(Entry::Series(series)) => Ok(series.clone()),
            Some(Entry::Failure(reason)) => Err(PipelineError::SourceFetch {
                series_id: series_id.to_string(),
                reason: reason.clone(),
            }),
            None => Err(PipelineError::SourceFetch {
                series_id: series_id.to_string(),
                reason: "unknown series".to_string(),
            }),
        }
    }
}
