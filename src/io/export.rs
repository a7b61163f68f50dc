//! Export query results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::path::Path;

use serde::Serialize;

use crate::domain::{AnomalyRecord, Observation};
use crate::error::AppError;

const SERIES_HEADER: [&str; 3] = ["date", "indicator", "value"];
const ANOMALY_HEADER: [&str; 4] = ["date", "indicator", "value", "z_score"];

/// Write canonical rows to a CSV file. Missing values are written as empty cells.
pub fn write_series_csv(path: &Path, rows: &[Observation]) -> Result<(), AppError> {
    write_csv(path, &SERIES_HEADER, rows)
}

/// Write stored anomalies to a CSV file.
pub fn write_anomalies_csv(path: &Path, rows: &[AnomalyRecord]) -> Result<(), AppError> {
    write_csv(path, &ANOMALY_HEADER, rows)
}

// The header is written explicitly so an empty result still yields a valid file.
fn write_csv<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<(), AppError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writer
        .write_record(header)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn series_export_writes_header_and_empty_cells_for_nulls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.csv");
        let rows = vec![
            Observation {
                date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                indicator: "CPI".to_string(),
                value: Some(258.5),
            },
            Observation {
                date: NaiveDate::from_ymd_opt(2020, 2, 1).unwrap(),
                indicator: "CPI".to_string(),
                value: None,
            },
        ];

        write_series_csv(&path, &rows).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines, ["date,indicator,value", "2020-01-01,CPI,258.5", "2020-02-01,CPI,"]);
    }

    #[test]
    fn anomaly_export_of_empty_set_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anomalies.csv");

        write_anomalies_csv(&path, &[]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.trim_end(), "date,indicator,value,z_score");
    }
}
