//! Connection bootstrap utilities for SQLite.
//!
//! # Invariants
//! - Returned connections have the canonical schema in place.
//! - Returned connections wait on a busy lock instead of failing immediately,
//!   so an ingestion job and an ad-hoc detection run can share a file.

use std::path::Path;
use std::time::{Duration, Instant};

use log::{error, info};
use rusqlite::Connection;

use super::schema::ensure_schema;
use super::{StoreError, StoreResult};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (creating if needed) a SQLite database file.
///
/// The parent directory is created when missing.
pub fn open_store(path: impl AsRef<Path>) -> StoreResult<Connection> {
    let path = path.as_ref();
    let started_at = Instant::now();
    info!(
        "event=db_open module=store status=start mode=file path={}",
        path.display()
    );

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let result = Connection::open(path)
        .map_err(StoreError::from)
        .and_then(|mut conn| {
            // WAL lets readers keep seeing the last committed table while a
            // replace is in flight.
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                row.get::<_, String>(0)
            })?;
            bootstrap_connection(&mut conn)?;
            Ok(conn)
        });

    log_open_result("file", started_at, &result);
    result
}

/// Opens a private in-memory database with the schema applied.
pub fn open_store_in_memory() -> StoreResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=store status=start mode=memory");

    let result = Connection::open_in_memory()
        .map_err(StoreError::from)
        .and_then(|mut conn| {
            bootstrap_connection(&mut conn)?;
            Ok(conn)
        });

    log_open_result("memory", started_at, &result);
    result
}

fn bootstrap_connection(conn: &mut Connection) -> StoreResult<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    ensure_schema(conn)?;
    Ok(())
}

fn log_open_result(mode: &str, started_at: Instant, result: &StoreResult<Connection>) {
    match result {
        Ok(_) => info!(
            "event=db_open module=store status=ok mode={mode} duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_open module=store status=error mode={mode} duration_ms={} error={err}",
            started_at.elapsed().as_millis()
        ),
    }
}
