//! `macro_data`: the canonical long-format table.

use std::time::Instant;

use log::{error, info};
use rusqlite::types::Value;
use rusqlite::{Connection, TransactionBehavior, params};

use super::{StoreError, StoreResult, date_from_sql, date_to_sql, table_exists};
use crate::domain::Observation;

const TABLE: &str = "macro_data";

/// Replaces the entire contents of `macro_data` with `rows` in one transaction.
///
/// Returns the number of rows written. Readers see either the previous table
/// or the new one, never a mix.
pub fn replace_observations(conn: &mut Connection, rows: &[Observation]) -> StoreResult<usize> {
    let started_at = Instant::now();
    let result = (|| -> StoreResult<usize> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let removed = tx.execute("DELETE FROM macro_data;", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO macro_data (date, indicator, value) VALUES (?1, ?2, ?3);",
            )?;
            for row in rows {
                stmt.execute(params![date_to_sql(row.date), row.indicator, row.value])?;
            }
        }
        tx.commit()?;
        info!(
            "event=store_replace module=store status=ok table={TABLE} removed={removed} inserted={}",
            rows.len()
        );
        Ok(rows.len())
    })();

    if let Err(err) = &result {
        error!(
            "event=store_replace module=store status=error table={TABLE} duration_ms={} error={err}",
            started_at.elapsed().as_millis()
        );
    }
    result
}

/// All rows for one indicator, date-ascending.
///
/// Values that are not numeric (NULL, blobs, unparsable text) are returned as
/// `None` rather than failing the read.
pub fn load_series(conn: &Connection, indicator: &str) -> StoreResult<Vec<Observation>> {
    let mut stmt = conn.prepare(
        "SELECT date, value
         FROM macro_data
         WHERE indicator = ?1
         ORDER BY date ASC;",
    )?;
    let raw_rows = stmt
        .query_map([indicator], |row| {
            Ok((row.get::<_, String>("date")?, row.get::<_, Value>("value")?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    raw_rows
        .into_iter()
        .map(|(date, value)| {
            Ok(Observation {
                date: date_from_sql(TABLE, &date)?,
                indicator: indicator.to_string(),
                value: coerce_numeric(&value),
            })
        })
        .collect()
}

/// The indicator catalog: distinct indicator names present in `macro_data`.
///
/// A database without `macro_data` is reported as `MissingTable` rather than
/// as an empty catalog.
pub fn list_indicators(conn: &Connection) -> StoreResult<Vec<String>> {
    if !table_exists(conn, TABLE)? {
        return Err(StoreError::MissingTable { table: TABLE });
    }
    let mut stmt = conn.prepare(
        "SELECT DISTINCT indicator
         FROM macro_data
         WHERE indicator IS NOT NULL
         ORDER BY indicator ASC;",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

/// Best-effort numeric view of a stored SQLite value.
///
/// REAL and INTEGER convert directly, TEXT is parsed after trimming. Anything
/// else, and any non-finite result, yields `None`.
pub fn coerce_numeric(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Real(v) => *v,
        Value::Integer(v) => *v as f64,
        Value::Text(text) => text.trim().parse::<f64>().ok()?,
        Value::Null | Value::Blob(_) => return None,
    };
    v.is_finite().then_some(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_numeric_handles_every_storage_class() {
        assert_eq!(coerce_numeric(&Value::Real(1.5)), Some(1.5));
        assert_eq!(coerce_numeric(&Value::Integer(7)), Some(7.0));
        assert_eq!(coerce_numeric(&Value::Text(" 2.25 ".to_string())), Some(2.25));
        assert_eq!(coerce_numeric(&Value::Text(".".to_string())), None);
        assert_eq!(coerce_numeric(&Value::Text("NaN".to_string())), None);
        assert_eq!(coerce_numeric(&Value::Null), None);
        assert_eq!(coerce_numeric(&Value::Blob(vec![1, 2])), None);
    }
}
