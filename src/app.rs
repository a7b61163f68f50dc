//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - initializes logging
//! - layers CLI flags over the config file
//! - opens canonical storage and dispatches the command
//! - prints reports / writes exports

use clap::Parser;
use rusqlite::Connection;

use crate::cli::{Cli, Command, DetectArgs, QueryArgs, RunArgs, SourceArgs};
use crate::config::{PipelineConfig, parse_date};
use crate::data::FredClient;
use crate::domain::{IndicatorSet, IndicatorSpec};
use crate::error::{AppError, PipelineResult};

pub mod pipeline;

/// Entry point for the `macro-anomaly` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    let level = cli
        .log_level
        .as_deref()
        .unwrap_or(crate::logging::default_log_level());
    crate::logging::init_logging(level, cli.log_dir.as_deref())
        .map_err(|e| AppError::new(2, e))?;

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }

    match cli.command {
        Command::Ingest(args) => handle_ingest(config, &args),
        Command::Detect(args) => handle_detect(config, &args),
        Command::Run(args) => handle_run(config, &args),
        Command::Indicators => handle_indicators(&config),
        Command::Series(args) => handle_series(&config, &args),
        Command::Anomalies(args) => handle_anomalies(&config, &args),
    }
}

fn handle_ingest(mut config: PipelineConfig, args: &SourceArgs) -> Result<(), AppError> {
    apply_source_args(&mut config, args)?;
    let source = fred_client(&config)?;
    let mut conn = open(&config)?;

    let report = crate::io::ingest(&mut conn, &source, &config.indicators)?;
    print!("{}", crate::report::format_ingest_report(&report));
    Ok(())
}

fn handle_detect(mut config: PipelineConfig, args: &DetectArgs) -> Result<(), AppError> {
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    let detector = config.detector()?;
    let mut conn = open(&config)?;

    let reports = match &args.indicator {
        Some(indicator) => vec![detector.detect_and_store(&mut conn, indicator)?],
        None => detector.detect_all(&mut conn)?,
    };
    print!(
        "{}",
        crate::report::format_detection_reports(&reports, detector.threshold())
    );
    Ok(())
}

fn handle_run(mut config: PipelineConfig, args: &RunArgs) -> Result<(), AppError> {
    apply_source_args(&mut config, &args.source)?;
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    // Validate before any network traffic.
    let detector = config.detector()?;
    let source = fred_client(&config)?;
    let mut conn = open(&config)?;

    let output = pipeline::run_full(&mut conn, &source, &config.indicators, &detector)?;
    print!("{}", crate::report::format_ingest_report(&output.ingest));
    println!();
    print!(
        "{}",
        crate::report::format_detection_reports(&output.detections, detector.threshold())
    );
    Ok(())
}

fn handle_indicators(config: &PipelineConfig) -> Result<(), AppError> {
    let conn = open(config)?;
    let names = crate::store::list_indicators(&conn).map_err(crate::error::PipelineError::from)?;
    print!("{}", crate::report::format_indicators(&names));
    Ok(())
}

fn handle_series(config: &PipelineConfig, args: &QueryArgs) -> Result<(), AppError> {
    let conn = open(config)?;
    let rows = crate::store::load_series(&conn, &args.indicator)
        .map_err(crate::error::PipelineError::from)?;

    match &args.export {
        Some(path) => {
            crate::io::write_series_csv(path, &rows)?;
            println!("Wrote {} rows to {}", rows.len(), path.display());
        }
        None => print!("{}", crate::report::format_series_table(&rows)),
    }
    Ok(())
}

fn handle_anomalies(config: &PipelineConfig, args: &QueryArgs) -> Result<(), AppError> {
    let conn = open(config)?;
    let rows = crate::detect::get_anomalies(&conn, &args.indicator)?;

    match &args.export {
        Some(path) => {
            crate::io::write_anomalies_csv(path, &rows)?;
            println!("Wrote {} anomalies to {}", rows.len(), path.display());
        }
        None => print!("{}", crate::report::format_anomaly_table(&rows)),
    }
    Ok(())
}

fn apply_source_args(config: &mut PipelineConfig, args: &SourceArgs) -> PipelineResult<()> {
    if !args.series.is_empty() {
        let specs = args
            .series
            .iter()
            .map(|raw| IndicatorSpec::parse_assignment(raw))
            .collect::<PipelineResult<Vec<_>>>()?;
        config.indicators = IndicatorSet::new(specs)?;
    }
    if let Some(start) = &args.start {
        config.observation_start = Some(parse_date(start)?);
    }
    Ok(())
}

fn fred_client(config: &PipelineConfig) -> PipelineResult<FredClient> {
    Ok(FredClient::from_env()?.with_observation_start(config.observation_start))
}

fn open(config: &PipelineConfig) -> PipelineResult<Connection> {
    Ok(crate::store::open_store(&config.db_path)?)
}
