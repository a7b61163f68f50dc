//! Error types.
//!
//! - `PipelineError` is what the library returns. Callers can tell "detection
//!   failed to run" (`Storage`) apart from "no anomalies" (an `Ok` report).
//! - `AppError` is what the binary prints; it carries a process exit code.

use thiserror::Error;

use crate::store::StoreError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A single series could not be fetched. Ingestion recovers from this
    /// locally by skipping the series.
    #[error("failed to fetch series {series_id}: {reason}")]
    SourceFetch { series_id: String, reason: String },

    /// Every configured series failed or came back empty.
    #[error("ingestion produced no rows ({attempted} series attempted); canonical storage left untouched")]
    EmptyResult { attempted: usize },

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<rusqlite::Error> for PipelineError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(StoreError::Sqlite(value))
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let exit_code = match &err {
            PipelineError::Config(_) => 2,
            PipelineError::EmptyResult { .. } => 3,
            PipelineError::SourceFetch { .. } | PipelineError::Storage(_) => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
