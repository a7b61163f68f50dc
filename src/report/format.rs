//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the ingestion/detection code stays free of presentation concerns
//! - output changes are localized

use crate::domain::{AnomalyRecord, DetectionOutcome, DetectionReport, IngestReport, Observation};

/// Summary of an ingestion run.
pub fn format_ingest_report(report: &IngestReport) -> String {
    let mut out = String::new();

    out.push_str("=== Ingestion ===\n");
    out.push_str(&format!("Rows written: {}\n", report.rows_written));
    out.push_str(&format!("Indicators: {}\n", report.indicators.join(", ")));
    for (name, reason) in &report.skipped {
        out.push_str(&format!("  (skipped {name}) {reason}\n"));
    }

    out
}

/// One line per detection run, then the outliers found.
pub fn format_detection_reports(reports: &[DetectionReport], threshold: f64) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Anomaly detection (|z| > {threshold}) ===\n"));
    if reports.is_empty() {
        out.push_str("No indicators in canonical storage.\n");
        return out;
    }

    for report in reports {
        out.push_str(&format!(
            "{:<28} {:>5} anomalies  {}\n",
            truncate(&report.indicator, 28),
            report.anomalies.len(),
            describe_outcome(&report.outcome)
        ));
    }

    for report in reports.iter().filter(|r| !r.anomalies.is_empty()) {
        out.push('\n');
        out.push_str(&format!("{}:\n", report.indicator));
        out.push_str(&format_anomaly_table(&report.anomalies));
    }

    out
}

fn describe_outcome(outcome: &DetectionOutcome) -> String {
    match outcome {
        DetectionOutcome::Scored {
            observations,
            mean,
            std_dev,
        } => format!("n={observations} mean={mean:.4} std={std_dev:.4}"),
        DetectionOutcome::NoData => "no numeric observations".to_string(),
        DetectionOutcome::InsufficientData { observations } => {
            format!("n={observations}, not enough data for z-scores")
        }
        DetectionOutcome::DegenerateDistribution { observations } => {
            format!("n={observations}, all values identical")
        }
    }
}

/// Stored anomalies as a table.
pub fn format_anomaly_table(rows: &[AnomalyRecord]) -> String {
    if rows.is_empty() {
        return "No anomalies stored.\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!("{:<10} {:>14} {:>10}\n", "date", "value", "z_score"));
    out.push_str(&format!("{:-<10} {:-<14} {:-<10}\n", "", "", ""));
    for r in rows {
        out.push_str(&format!("{:<10} {:>14.4} {:>10.3}\n", r.date, r.value, r.z_score));
    }
    out
}

/// Canonical rows as a table; missing values print as `-`.
pub fn format_series_table(rows: &[Observation]) -> String {
    if rows.is_empty() {
        return "No observations stored.\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!("{:<10} {:>14}\n", "date", "value"));
    out.push_str(&format!("{:-<10} {:-<14}\n", "", ""));
    for r in rows {
        let value = r
            .value
            .map(|v| format!("{v:.4}"))
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!("{:<10} {:>14}\n", r.date, value));
    }
    out
}

pub fn format_indicators(names: &[String]) -> String {
    if names.is_empty() {
        return "No indicators in canonical storage. Run `macro-anomaly ingest` first.\n"
            .to_string();
    }
    names.iter().map(|n| format!("{n}\n")).collect()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
