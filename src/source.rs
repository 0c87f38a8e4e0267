//! Upstream source of the latest sensor reading
//!
//! The upstream endpoint answers with either a JSON array of readings (the
//! first element is the latest one) or a single reading object.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{instrument, trace};

use crate::config::SourceConfig;
use crate::reading::Reading;

/// Why a fetch produced no reading
#[derive(Debug)]
pub enum FetchError {
    /// Transport failure (connection refused, timeout, ...)
    Request(String),

    /// Upstream answered with a non-success status
    Status(u16),

    /// Body is not a reading or a list of readings
    Malformed(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Request(msg) => write!(f, "upstream request failed: {}", msg),
            FetchError::Status(status) => write!(f, "upstream answered with HTTP {}", status),
            FetchError::Malformed(msg) => write!(f, "malformed upstream payload: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

/// Read-only provider of the most recent reading
#[async_trait]
pub trait ReadingSource: Send + Sync {
    /// Zero or one reading per call
    async fn fetch_latest(&self) -> Result<Option<Reading>, FetchError>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Many(Vec<Reading>),
    One(Reading),
}

impl Payload {
    fn into_latest(self) -> Option<Reading> {
        match self {
            Payload::Many(readings) => readings.into_iter().next(),
            Payload::One(reading) => Some(reading),
        }
    }
}

/// Parse an upstream body into its latest reading
pub fn parse_payload(body: &str) -> Result<Option<Reading>, FetchError> {
    serde_json::from_str::<Payload>(body)
        .map(Payload::into_latest)
        .map_err(|e| FetchError::Malformed(e.to_string()))
}

/// HTTP implementation polling a JSON endpoint
pub struct HttpReadingSource {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpReadingSource {
    pub fn new(config: &SourceConfig) -> reqwest::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()?,
            url: config.url.clone(),
            token: config.token.clone(),
        })
    }
}

#[async_trait]
impl ReadingSource for HttpReadingSource {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_latest(&self) -> Result<Option<Reading>, FetchError> {
        trace!("requesting latest reading");

        let mut request = self.client.get(&self.url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        parse_payload(&body)
    }
}
