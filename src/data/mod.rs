//! External data sources.
//!
//! Ingestion only needs "series id in, dated values out"; the provider behind
//! that capability is a `SeriesSource`.

pub mod fred;
pub mod memory;

pub use fred::FredClient;
pub use memory::InMemorySource;

use crate::domain::RawSeries;
use crate::error::PipelineResult;

/// A provider of named time series.
///
/// Implementations must be `Sync`: ingestion fetches configured series in
/// parallel, each call isolated from the others.
pub trait SeriesSource: Sync {
    /// Fetch the full series for `series_id`.
    ///
    /// An empty `RawSeries` means the source has no data for the id.
    fn fetch_series(&self, series_id: &str) -> PipelineResult<RawSeries>;
}
