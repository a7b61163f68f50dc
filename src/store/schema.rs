//! Table definitions.

use rusqlite::Connection;

use super::StoreResult;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS macro_data (
    date TEXT,
    indicator TEXT,
    value REAL
);
CREATE INDEX IF NOT EXISTS idx_macro_data_indicator_date
    ON macro_data (indicator, date);
CREATE TABLE IF NOT EXISTS anomaly_data (
    date TEXT,
    indicator TEXT,
    value REAL,
    z_score REAL,
    PRIMARY KEY (date, indicator)
);
";

/// Creates both tables (and the lookup index) if they do not exist yet.
pub fn ensure_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

pub fn table_exists(conn: &Connection, table_name: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table_name],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
