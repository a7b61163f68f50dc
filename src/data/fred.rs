//! FRED API integration.

use std::time::Duration;

use chrono::NaiveDate;
use log::debug;
use reqwest::blocking::Client;
use serde::Deserialize;

use super::SeriesSource;
use crate::domain::RawSeries;
use crate::error::{PipelineError, PipelineResult};

const BASE_URL: &str = "https://api.stlouisfed.org/fred/series/observations";
/// FRED's per-request maximum.
const OBS_LIMIT: usize = 100_000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const API_KEY_VAR: &str = "FRED_API_KEY";

pub struct FredClient {
    client: Client,
    api_key: String,
    observation_start: Option<NaiveDate>,
}

impl FredClient {
    pub fn new(api_key: impl Into<String>) -> PipelineResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PipelineError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            observation_start: None,
        })
    }

    /// Read the API key from the environment (after loading `.env`).
    pub fn from_env() -> PipelineResult<Self> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var(API_KEY_VAR).map_err(|_| {
            PipelineError::Config(format!("Missing {API_KEY_VAR} in environment (.env)."))
        })?;
        Self::new(api_key)
    }

    /// Only request observations on or after `start`.
    pub fn with_observation_start(mut self, start: Option<NaiveDate>) -> Self {
        self.observation_start = start;
        self
    }

    fn request(&self, series_id: &str) -> Result<ObservationsResponse, String> {
        let limit = OBS_LIMIT.to_string();
        let mut req = self.client.get(BASE_URL).query(&[
            ("series_id", series_id),
            ("api_key", self.api_key.as_str()),
            ("file_type", "json"),
            ("sort_order", "asc"),
            ("limit", limit.as_str()),
        ]);

        if let Some(start) = self.observation_start {
            req = req.query(&[("observation_start", &start.format("%Y-%m-%d").to_string())]);
        }

        let resp = req.send().map_err(|e| format!("FRED request failed: {e}"))?;

        let status = resp.status();
        if !status.is_success() {
            // FRED reports request problems (bad id, bad key) as a JSON body.
            let detail = resp
                .json::<ErrorResponse>()
                .map(|body| body.error_message)
                .unwrap_or_default();
            return Err(format!("FRED request failed with status {status}. {detail}")
                .trim_end()
                .to_string());
        }

        resp.json()
            .map_err(|e| format!("Failed to parse FRED response: {e}"))
    }
}

impl SeriesSource for FredClient {
    fn fetch_series(&self, series_id: &str) -> PipelineResult<RawSeries> {
        let to_error = |reason: String| PipelineError::SourceFetch {
            series_id: series_id.to_string(),
            reason,
        };
        let body = self.request(series_id).map_err(to_error)?;
        let series = to_raw_series(body.observations).map_err(to_error)?;
        debug!(
            "event=fred_fetch module=data status=ok series_id={series_id} observations={}",
            series.points.len()
        );
        Ok(series)
    }
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    date: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error_message: String,
}

fn to_raw_series(observations: Vec<Observation>) -> Result<RawSeries, String> {
    let mut points = Vec::with_capacity(observations.len());
    for obs in observations {
        let date = NaiveDate::parse_from_str(&obs.date, "%Y-%m-%d")
            .map_err(|e| format!("Invalid FRED date '{}': {e}", obs.date))?;
        points.push((date, parse_value(&obs.value)));
    }
    Ok(RawSeries::new(points))
}

/// FRED marks missing observations with `"."`.
fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed == "." || trimmed.is_empty() {
        return None;
    }
    let v = trimmed.parse::<f64>().ok()?;
    if v.is_finite() {
        Some(v)
    } else {
        None
    }
}
