//! `anomaly_data`: the per-indicator outlier cache.

use std::time::Instant;

use log::{error, info};
use rusqlite::{Connection, TransactionBehavior, params};

use super::{StoreResult, date_from_sql, date_to_sql};
use crate::domain::AnomalyRecord;

const TABLE: &str = "anomaly_data";

/// Replaces the stored outlier set for `indicator` in one transaction.
///
/// Rows for other indicators are not touched. An empty `records` slice clears
/// the indicator.
pub fn replace_anomalies(
    conn: &mut Connection,
    indicator: &str,
    records: &[AnomalyRecord],
) -> StoreResult<()> {
    let started_at = Instant::now();
    let result = (|| -> StoreResult<usize> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let removed = write_anomalies(&tx, indicator, records)?;
        tx.commit()?;
        Ok(removed)
    })();

    match &result {
        Ok(removed) => info!(
            "event=anomalies_replace module=store status=ok indicator={indicator:?} removed={removed} inserted={} duration_ms={}",
            records.len(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=anomalies_replace module=store status=error indicator={indicator:?} duration_ms={} error={err}",
            started_at.elapsed().as_millis()
        ),
    }
    result.map(|_| ())
}

/// Delete-then-insert for one indicator, without opening a transaction.
///
/// The caller must hold a transaction on `conn`; this lets a read of
/// `macro_data` and the rewrite share one unit of work. Returns the number of
/// rows removed.
pub fn write_anomalies(
    conn: &Connection,
    indicator: &str,
    records: &[AnomalyRecord],
) -> StoreResult<usize> {
    let removed = conn.execute("DELETE FROM anomaly_data WHERE indicator = ?1;", [indicator])?;
    let mut stmt = conn.prepare(
        "INSERT INTO anomaly_data (date, indicator, value, z_score)
         VALUES (?1, ?2, ?3, ?4);",
    )?;
    for record in records {
        stmt.execute(params![
            date_to_sql(record.date),
            indicator,
            record.value,
            record.z_score
        ])?;
    }
    Ok(removed)
}

/// Stored outliers for `indicator`, date-ascending. Unknown indicators yield
/// an empty list.
pub fn load_anomalies(conn: &Connection, indicator: &str) -> StoreResult<Vec<AnomalyRecord>> {
    let mut stmt = conn.prepare(
        "SELECT date, value, z_score
         FROM anomaly_data
         WHERE indicator = ?1
         ORDER BY date ASC;",
    )?;
    let raw_rows = stmt
        .query_map([indicator], |row| {
            Ok((
                row.get::<_, String>("date")?,
                row.get::<_, f64>("value")?,
                row.get::<_, f64>("z_score")?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    raw_rows
        .into_iter()
        .map(|(date, value, z_score)| {
            Ok(AnomalyRecord {
                date: date_from_sql(TABLE, &date)?,
                indicator: indicator.to_string(),
                value,
                z_score,
            })
        })
        .collect()
}
