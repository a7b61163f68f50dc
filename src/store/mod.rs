//! SQLite canonical storage.
//!
//! # Responsibility
//! - Open and configure SQLite connections.
//! - Create the `macro_data` / `anomaly_data` schema when absent.
//! - Provide the transactional replace primitives used by ingestion and
//!   detection, plus the read queries exposed to callers.
//!
//! # Invariants
//! - Every replace runs inside a single `IMMEDIATE` transaction; a failure on
//!   any path drops the transaction and rolls back.
//! - Dates are stored as `YYYY-MM-DD` text so lexical order is date order.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

mod anomalies;
mod canonical;
mod open;
mod schema;

pub use anomalies::{load_anomalies, replace_anomalies, write_anomalies};
pub use canonical::{coerce_numeric, list_indicators, load_series, replace_observations};
pub use open::{open_store, open_store_in_memory};
pub use schema::{ensure_schema, table_exists};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to prepare database directory `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("table `{table}` is missing; is this a macro-anomaly database?")]
    MissingTable { table: &'static str },

    #[error("invalid row in {table}: {detail}")]
    InvalidRow { table: &'static str, detail: String },
}

const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn date_to_sql(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn date_from_sql(table: &'static str, raw: &str) -> StoreResult<NaiveDate> {
    // Tolerate a trailing time component ("2020-01-01 00:00:00") written by
    // other tools; only the calendar date is meaningful here.
    let day = raw.trim().get(..10).unwrap_or(raw.trim());
    NaiveDate::parse_from_str(day, DATE_FORMAT).map_err(|e| StoreError::InvalidRow {
        table,
        detail: format!("date `{raw}` is not YYYY-MM-DD: {e}"),
    })
}
