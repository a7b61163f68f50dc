use chrono::NaiveDate;
use macro_anomaly::data::{InMemorySource, SeriesSource};
use macro_anomaly::domain::{IndicatorSet, IndicatorSpec, RawSeries};
use macro_anomaly::error::{PipelineError, PipelineResult};
use macro_anomaly::io::ingest;
use macro_anomaly::store::{list_indicators, load_series, open_store, open_store_in_memory};
use rusqlite::Connection;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn indicators() -> IndicatorSet {
    IndicatorSet::new(vec![
        IndicatorSpec::new("CPI", "CPIAUCSL"),
        IndicatorSpec::new("Unemployment Rate", "UNRATE"),
        IndicatorSpec::new("Fed Funds Rate", "FEDFUNDS"),
    ])
    .unwrap()
}

fn full_source() -> InMemorySource {
    InMemorySource::new()
        .with_values(
            "CPIAUCSL",
            &[(d(2020, 1, 1), 258.7), (d(2020, 2, 1), 259.0), (d(2020, 3, 1), 258.1)],
        )
        .with_values("UNRATE", &[(d(2020, 1, 1), 3.6), (d(2020, 2, 1), 3.5)])
        .with_values("FEDFUNDS", &[(d(2020, 1, 1), 1.55), (d(2020, 2, 1), 1.58)])
}

fn all_rows(conn: &Connection) -> Vec<(String, String, Option<f64>)> {
    let mut stmt = conn
        .prepare("SELECT date, indicator, value FROM macro_data ORDER BY indicator, date;")
        .unwrap();
    stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

#[test]
fn ingest_writes_long_format_rows_for_every_series() {
    let mut conn = open_store_in_memory().unwrap();

    let report = ingest(&mut conn, &full_source(), &indicators()).unwrap();

    assert_eq!(report.rows_written, 7);
    assert_eq!(report.indicators, ["CPI", "Unemployment Rate", "Fed Funds Rate"]);
    assert!(report.skipped.is_empty());

    let cpi = load_series(&conn, "CPI").unwrap();
    assert_eq!(cpi.len(), 3);
    assert_eq!(cpi[0].date, d(2020, 1, 1));
    assert_eq!(cpi[2].value, Some(258.1));

    let rows = all_rows(&conn);
    assert!(rows.iter().all(|(date, _, _)| date.len() == 10));
}

#[test]
fn one_failed_series_is_skipped_without_error() {
    let mut conn = open_store_in_memory().unwrap();
    let source = full_source().with_failure("UNRATE", "HTTP 500");

    let report = ingest(&mut conn, &source, &indicators()).unwrap();

    assert_eq!(report.indicators, ["CPI", "Fed Funds Rate"]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].0, "Unemployment Rate");
    assert!(report.skipped[0].1.contains("HTTP 500"));
    assert_eq!(list_indicators(&conn).unwrap(), ["CPI", "Fed Funds Rate"]);
}

#[test]
fn empty_series_is_skipped_like_a_failure() {
    let mut conn = open_store_in_memory().unwrap();
    let source = full_source().with_series("FEDFUNDS", RawSeries::default());

    let report = ingest(&mut conn, &source, &indicators()).unwrap();

    assert_eq!(report.indicators, ["CPI", "Unemployment Rate"]);
    assert_eq!(report.skipped[0].0, "Fed Funds Rate");
}

#[test]
fn all_series_failing_leaves_storage_untouched() {
    let mut conn = open_store_in_memory().unwrap();
    ingest(&mut conn, &full_source(), &indicators()).unwrap();
    let before = all_rows(&conn);

    let broken = InMemorySource::new()
        .with_failure("CPIAUCSL", "timeout")
        .with_failure("UNRATE", "timeout")
        .with_series("FEDFUNDS", RawSeries::default());
    let err = ingest(&mut conn, &broken, &indicators()).unwrap_err();

    assert!(matches!(err, PipelineError::EmptyResult { attempted: 3 }));
    assert_eq!(all_rows(&conn), before);
}

#[test]
fn failed_replace_rolls_back_to_previous_rows() {
    let mut conn = open_store_in_memory().unwrap();
    ingest(&mut conn, &full_source(), &indicators()).unwrap();
    let before = all_rows(&conn);

    // The delete and the first inserts succeed; the last indicator's insert aborts.
    conn.execute_batch(
        "CREATE TRIGGER reject_fed_funds BEFORE INSERT ON macro_data
         WHEN NEW.indicator = 'Fed Funds Rate'
         BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
    )
    .unwrap();
    let err = ingest(&mut conn, &full_source(), &indicators()).unwrap_err();

    assert!(matches!(err, PipelineError::Storage(_)), "got {err:?}");
    assert_eq!(all_rows(&conn), before);
}

#[test]
fn ingestion_replaces_previous_contents() {
    let mut conn = open_store_in_memory().unwrap();
    ingest(&mut conn, &full_source(), &indicators()).unwrap();

    let only_cpi = IndicatorSet::new(vec![IndicatorSpec::new("CPI", "CPIAUCSL")]).unwrap();
    let report = ingest(&mut conn, &full_source(), &only_cpi).unwrap();

    assert_eq!(report.rows_written, 3);
    assert_eq!(list_indicators(&conn).unwrap(), ["CPI"]);
    assert_eq!(all_rows(&conn).len(), 3);
}

#[test]
fn ingesting_twice_yields_identical_table() {
    let mut conn = open_store_in_memory().unwrap();

    ingest(&mut conn, &full_source(), &indicators()).unwrap();
    let first = all_rows(&conn);
    ingest(&mut conn, &full_source(), &indicators()).unwrap();
    let second = all_rows(&conn);

    assert_eq!(first, second);
}

#[test]
fn missing_values_are_stored_as_null_and_duplicates_collapse() {
    let mut conn = open_store_in_memory().unwrap();
    let source = InMemorySource::new().with_series(
        "CPIAUCSL",
        RawSeries::new(vec![
            (d(2020, 1, 1), Some(1.0)),
            (d(2020, 2, 1), None),
            (d(2020, 1, 1), Some(2.0)),
        ]),
    );
    let cpi = IndicatorSet::new(vec![IndicatorSpec::new("CPI", "CPIAUCSL")]).unwrap();

    let report = ingest(&mut conn, &source, &cpi).unwrap();

    assert_eq!(report.rows_written, 2);
    assert_eq!(
        all_rows(&conn),
        vec![
            ("2020-01-01".to_string(), "CPI".to_string(), Some(2.0)),
            ("2020-02-01".to_string(), "CPI".to_string(), None),
        ]
    );
}

struct SlowFailingSource;

impl SeriesSource for SlowFailingSource {
    fn fetch_series(&self, series_id: &str) -> PipelineResult<RawSeries> {
        if series_id == "SLOW" {
            std::thread::sleep(std::time::Duration::from_millis(50));
            return Err(PipelineError::SourceFetch {
                series_id: series_id.to_string(),
                reason: "timed out".to_string(),
            });
        }
        Ok(RawSeries::new(vec![(
            NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            Some(1.0),
        )]))
    }
}

#[test]
fn outcomes_keep_configuration_order_with_custom_source() {
    let mut conn = open_store_in_memory().unwrap();
    let set = IndicatorSet::new(vec![
        IndicatorSpec::new("Slow", "SLOW"),
        IndicatorSpec::new("B", "B_ID"),
        IndicatorSpec::new("A", "A_ID"),
    ])
    .unwrap();

    let report = ingest(&mut conn, &SlowFailingSource, &set).unwrap();

    assert_eq!(report.indicators, ["B", "A"]);
    assert_eq!(report.skipped[0].0, "Slow");
}

#[test]
fn file_backed_store_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("macro_data.db");

    {
        let mut conn = open_store(&path).unwrap();
        ingest(&mut conn, &full_source(), &indicators()).unwrap();
    }

    let conn = open_store(&path).unwrap();
    assert_eq!(
        list_indicators(&conn).unwrap(),
        ["CPI", "Fed Funds Rate", "Unemployment Rate"]
    );
    assert_eq!(all_rows(&conn).len(), 7);
}
