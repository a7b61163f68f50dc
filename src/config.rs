//! Run configuration.
//!
//! Values come from three layers, later ones winning:
//! 1. built-in defaults (`PipelineConfig::default`)
//! 2. an optional TOML file
//! 3. command-line flags (applied by `app`)
//!
//! Example file:
//!
//! ```toml
//! db_path = "data/macro_data.db"
//! threshold = 3.0
//! observation_start = "1990-01-01"
//!
//! [indicators]
//! "CPI" = "CPIAUCSL"
//! "Unemployment Rate" = "UNRATE"
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::detect::AnomalyDetector;
use crate::domain::{DEFAULT_Z_THRESHOLD, IndicatorSet, IndicatorSpec};
use crate::error::{PipelineError, PipelineResult};

pub const DEFAULT_DB_PATH: &str = "data/macro_data.db";

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub db_path: PathBuf,
    pub indicators: IndicatorSet,
    pub threshold: f64,
    /// Earliest observation date requested from the source.
    pub observation_start: Option<NaiveDate>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            indicators: IndicatorSet::defaults(),
            threshold: DEFAULT_Z_THRESHOLD,
            observation_start: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    db_path: Option<PathBuf>,
    threshold: Option<f64>,
    observation_start: Option<String>,
    indicators: Option<toml::Table>,
}

impl PipelineConfig {
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("failed to read config '{}': {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> PipelineResult<Self> {
        let file: ConfigFile = toml::from_str(text)
            .map_err(|e| PipelineError::Config(format!("invalid config file: {e}")))?;

        let mut config = Self::default();
        if let Some(db_path) = file.db_path {
            config.db_path = db_path;
        }
        if let Some(threshold) = file.threshold {
            config.threshold = threshold;
        }
        if let Some(raw) = file.observation_start {
            config.observation_start = Some(parse_date(&raw)?);
        }
        if let Some(table) = file.indicators {
            let specs = table
                .into_iter()
                .map(|(name, value)| match value {
                    toml::Value::String(series_id) => Ok(IndicatorSpec::new(name, series_id)),
                    other => Err(PipelineError::Config(format!(
                        "indicator `{name}` must map to a series id string, got {}",
                        other.type_str()
                    ))),
                })
                .collect::<PipelineResult<Vec<_>>>()?;
            config.indicators = IndicatorSet::new(specs)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PipelineResult<()> {
        self.detector().map(|_| ())
    }

    pub fn detector(&self) -> PipelineResult<AnomalyDetector> {
        AnomalyDetector::new(self.threshold)
    }
}

pub fn parse_date(raw: &str) -> PipelineResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| PipelineError::Config(format!("invalid date `{raw}` (expected YYYY-MM-DD): {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_keeps_defaults() {
        assert_eq!(PipelineConfig::from_toml_str("").unwrap(), PipelineConfig::default());
    }

    #[test]
    fn file_values_override_defaults_and_keep_indicator_order() {
        let config = PipelineConfig::from_toml_str(
            r#"
            db_path = "/tmp/macro.db"
            threshold = 2.5
            observation_start = "2000-01-01"

            [indicators]
            "Unemployment Rate" = "UNRATE"
            "CPI" = "CPIAUCSL"
            "#,
        )
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/macro.db"));
        assert_eq!(config.threshold, 2.5);
        assert_eq!(config.observation_start, NaiveDate::from_ymd_opt(2000, 1, 1));
        let names: Vec<_> = config
            .indicators
            .iter()
            .map(|s| s.display_name.as_str())
            .collect();
        assert_eq!(names, ["Unemployment Rate", "CPI"]);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        for text in [
            "threshold = -1.0",
            "observation_start = \"01/01/2000\"",
            "[indicators]\nCPI = 5",
            "unknown_key = true",
            "[indicators]",
        ] {
            assert!(
                matches!(PipelineConfig::from_toml_str(text), Err(PipelineError::Config(_))),
                "expected config error for {text:?}"
            );
        }
    }
}
