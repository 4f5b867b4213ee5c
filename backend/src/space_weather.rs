//! Client for the NASA DONKI space-weather notifications.
//!
//! The feed is advisory: transport, status and decoding failures are logged
//! and surface as an empty event list.

use chrono::NaiveDate;
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{PipelineError, PipelineResult};

pub const DEFAULT_BASE_URL: &str = "https://api.nasa.gov/DONKI/";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Coronal mass ejection notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoronalMassEjection {
    #[serde(rename = "activityID")]
    pub activity_id: String,
    pub start_time: Option<String>,
    #[serde(default)]
    pub source_location: Option<String>,
    #[serde(default)]
    pub active_region_num: Option<i64>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Solar flare notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolarFlare {
    #[serde(rename = "flrID")]
    pub flare_id: String,
    pub begin_time: Option<String>,
    #[serde(default)]
    pub peak_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    /// GOES class, e.g. `M1.2`.
    #[serde(default)]
    pub class_type: Option<String>,
    #[serde(default)]
    pub source_location: Option<String>,
    #[serde(default)]
    pub active_region_num: Option<i64>,
}

impl SolarFlare {
    /// GOES class letter (`A`, `B`, `C`, `M`, `X`).
    pub fn class_letter(&self) -> Option<char> {
        self.class_type
            .as_deref()
            .and_then(|c| c.chars().next())
            .map(|c| c.to_ascii_uppercase())
    }
}

#[derive(Debug, Clone)]
pub struct DonkiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl DonkiClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> PipelineResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PipelineError::Configuration(format!("http client: {e}")))?;
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Query parameters for an endpoint call over `[start, end]`.
    pub fn query(&self, start: NaiveDate, end: NaiveDate) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("startDate", start.format("%Y-%m-%d").to_string()),
            ("endDate", end.format("%Y-%m-%d").to_string()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }
        params
    }

    pub async fn get_cmes(&self, start: NaiveDate, end: NaiveDate) -> Vec<CoronalMassEjection> {
        self.get("CME", start, end).await
    }

    pub async fn get_flares(&self, start: NaiveDate, end: NaiveDate) -> Vec<SolarFlare> {
        self.get("FLR", start, end).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        match self.fetch(&url, start, end).await {
            Ok(events) => {
                info!("{}: {} events between {} and {}", endpoint, events.len(), start, end);
                events
            }
            Err(e) => {
                warn!("Space-weather request to {} failed: {}", url, e);
                Vec::new()
            }
        }
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        url: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<T>, reqwest::Error> {
        let response = self
            .http
            .get(url)
            .query(&self.query(start, end))
            .send()
            .await?
            .error_for_status()?;
        response.json::<Vec<T>>().await
    }
}
