//! Logger bootstrap.
//!
//! # Responsibility
//! - Initialize the `log` backend exactly once per process.
//! - Log to stderr by default, or to size-rotated files when a directory is given.
//!
//! # Invariants
//! - Initialization is idempotent for identical settings.
//! - Re-initialization with a different level or destination is rejected.
//! - Initialization never panics.

use std::path::{Path, PathBuf};

use flexi_logger::{
    Cleanup, Criterion, FileSpec, LogSpecification, Logger, LoggerHandle, Naming, WriteMode,
};
use log::info;
use once_cell::sync::OnceCell;

const LOG_FILE_BASENAME: &str = "macro-anomaly";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();

struct LoggingState {
    level: String,
    log_dir: Option<PathBuf>,
    _logger: LoggerHandle,
}

/// Initializes logging at `level`, writing to `log_dir` when given and to
/// stderr otherwise.
///
/// # Errors
/// - `level` is neither a bare level (trace|debug|info|warn|error) nor a
///   valid module spec such as `macro_anomaly=debug,info`.
/// - `log_dir` cannot be created.
/// - logging was already initialized with different settings.
pub fn init_logging(level: &str, log_dir: Option<&Path>) -> Result<(), String> {
    let normalized_level = normalize_level(level)?;
    let normalized_dir = log_dir.map(Path::to_path_buf);

    let state = LOGGING_STATE.get_or_try_init(|| -> Result<LoggingState, String> {
        let logger = Logger::try_with_str(&normalized_level)
            .map_err(|err| format!("invalid log level `{normalized_level}`: {err}"))?;

        let logger = match &normalized_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir).map_err(|err| {
                    format!("failed to create log directory `{}`: {err}", dir.display())
                })?;
                logger
                    .log_to_file(
                        FileSpec::default()
                            .directory(dir.as_path())
                            .basename(LOG_FILE_BASENAME),
                    )
                    .rotate(
                        Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                        Naming::Numbers,
                        Cleanup::KeepLogFiles(MAX_LOG_FILES),
                    )
                    .write_mode(WriteMode::BufferAndFlush)
                    .append()
                    .format_for_files(flexi_logger::detailed_format)
            }
            None => logger
                .log_to_stderr()
                .format_for_stderr(flexi_logger::default_format),
        }
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))?;

        info!(
            "event=app_start module=logging status=ok level={normalized_level} version={}",
            env!("CARGO_PKG_VERSION")
        );

        Ok(LoggingState {
            level: normalized_level.clone(),
            log_dir: normalized_dir.clone(),
            _logger: logger,
        })
    })?;

    if state.level != normalized_level {
        return Err(format!(
            "logging already initialized with level `{}`; refusing to switch to `{}`",
            state.level, normalized_level
        ));
    }
    if state.log_dir != normalized_dir {
        return Err(format!(
            "logging already initialized at `{}`; refusing to switch to `{}`",
            describe_dir(state.log_dir.as_deref()),
            describe_dir(normalized_dir.as_deref())
        ));
    }

    Ok(())
}

/// Returns the default log level for current build mode.
///
/// - `debug` builds -> `debug`
/// - `release` builds -> `info`
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

/// Canonical form of a level argument.
///
/// Bare level names are lowercased. Anything containing a module directive
/// (`=`) or a list (`,`) is validated as a flexi_logger spec and kept verbatim.
fn normalize_level(level: &str) -> Result<String, String> {
    let trimmed = level.trim();
    if trimmed.contains(['=', ',']) {
        LogSpecification::parse(trimmed)
            .map_err(|err| format!("invalid log spec `{trimmed}`: {err}"))?;
        return Ok(trimmed.to_string());
    }
    let bare = match trimmed.to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" => "error",
        other => {
            return Err(format!(
                "unsupported log level `{other}`; expected trace|debug|info|warn|error or a module spec"
            ));
        }
    };
    Ok(bare.to_string())
}

fn describe_dir(dir: Option<&Path>) -> String {
    dir.map_or_else(|| "stderr".to_string(), |d| d.display().to_string())
}
