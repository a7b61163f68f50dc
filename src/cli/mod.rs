//! Command-line parsing.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! ingestion/detection code. Values are only parsed here; layering them over
//! the config file happens in `app`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "macro-anomaly",
    version,
    about = "Ingest macroeconomic series from FRED and flag z-score outliers"
)]
pub struct Cli {
    /// SQLite database path (overrides the config file).
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// TOML config file with db_path, threshold, observation_start and [indicators].
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Write logs to rotating files in this directory instead of stderr.
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch all configured series and replace the canonical table.
    Ingest(SourceArgs),
    /// Recompute stored anomalies from the canonical table (no fetching).
    Detect(DetectArgs),
    /// Ingest, then detect anomalies for every freshly ingested indicator.
    Run(RunArgs),
    /// List indicators present in the canonical table.
    Indicators,
    /// Print (or export) canonical rows for one indicator.
    Series(QueryArgs),
    /// Print (or export) stored anomalies for one indicator.
    Anomalies(QueryArgs),
}

/// Options controlling what is fetched from the source.
#[derive(Debug, Args, Clone, Default)]
pub struct SourceArgs {
    /// Indicator mapping as NAME=SERIES_ID; repeat to configure several.
    /// Replaces the configured indicator set.
    #[arg(long = "series", value_name = "NAME=ID")]
    pub series: Vec<String>,

    /// Only fetch observations on or after this date (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    pub start: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct DetectArgs {
    /// Indicator to process; all indicators in the catalog when omitted.
    pub indicator: Option<String>,

    /// Outlier threshold in standard deviations.
    #[arg(long, value_name = "Z")]
    pub threshold: Option<f64>,
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Outlier threshold in standard deviations.
    #[arg(long, value_name = "Z")]
    pub threshold: Option<f64>,
}

#[derive(Debug, Args, Clone)]
pub struct QueryArgs {
    pub indicator: String,

    /// Write rows to this CSV file instead of printing them.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_accepts_repeated_series_and_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "macro-anomaly",
            "run",
            "--series",
            "CPI=CPIAUCSL",
            "--series",
            "Unemployment Rate=UNRATE",
            "--threshold",
            "2.5",
            "--db",
            "/tmp/x.db",
        ]);
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.source.series.len(), 2);
        assert_eq!(args.threshold, Some(2.5));
    }

    #[test]
    fn detect_indicator_is_optional() {
        let cli = Cli::parse_from(["macro-anomaly", "detect"]);
        assert!(matches!(cli.command, Command::Detect(DetectArgs { indicator: None, .. })));
    }
}
