use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::trace;

use crate::thresholds::Thresholds;
use crate::util::{get_api_token, get_gateway_token, get_source_token};

/// Process configuration, loaded once at startup and handed to each component
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// Seconds between two ingestion ticks
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    pub source: SourceConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Messaging gateway (without it, alerts are evaluated and logged only)
    pub gateway: Option<GatewayConfig>,

    #[serde(default)]
    pub thresholds: Thresholds,

    /// Read API (only used when built with the `api` feature)
    pub api: Option<ApiConfig>,
}

/// Upstream endpoint returning the latest reading
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SourceConfig {
    pub url: String,
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Storage backend configuration
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (no persistence)
    #[serde(rename = "none")]
    None,

    /// SQLite database (default)
    Sqlite {
        /// Path to the SQLite database file
        #[serde(default = "default_sqlite_path")]
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Sqlite {
            path: default_sqlite_path(),
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the gateway API
    #[serde(default = "default_gateway_url")]
    pub url: String,

    /// Static credential sent as the `Authorization` header
    pub token: Option<String>,

    /// Where alerts go; unresolved destinations skip the alert cycle
    pub destination: Option<Destination>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    /// A fixed gateway target (phone number or group id)
    Target(String),

    /// A WhatsApp group looked up by name on every alert cycle
    Group(String),
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// Allowed CORS origin; `"*"` allows any origin
    #[serde(default = "default_allow_origin")]
    pub allow_origin: String,

    /// Shared bearer token required on every request
    pub auth_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            allow_origin: default_allow_origin(),
            auth_token: None,
        }
    }
}

fn default_interval() -> u64 {
    3
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./sensor.db")
}

fn default_gateway_url() -> String {
    String::from("https://api.fonnte.com")
}

fn default_allow_origin() -> String {
    String::from("http://localhost:3001")
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

impl Config {
    /// Fill credentials missing from the file with values from the environment.
    pub fn resolve_env(mut self) -> Self {
        if self.source.token.is_none() {
            self.source.token = get_source_token();
        }

        if let Some(gateway) = self.gateway.as_mut()
            && gateway.token.is_none()
        {
            gateway.token = get_gateway_token();
        }

        if let Some(api) = self.api.as_mut()
            && api.auth_token.is_none()
        {
            api.auth_token = get_api_token();
        }

        self
    }

    fn validate(self) -> anyhow::Result<Self> {
        if self.interval_secs == 0 {
            anyhow::bail!("interval_secs must be at least 1");
        }
        if self.source.url.trim().is_empty() {
            anyhow::bail!("source.url must not be empty");
        }
        if self.source.timeout_secs == 0 {
            anyhow::bail!("source.timeout_secs must be at least 1");
        }
        if let Some(gateway) = &self.gateway {
            if gateway.token.is_none() {
                anyhow::bail!(
                    "gateway configured without a token (set gateway.token or GATEWAY_TOKEN)"
                );
            }
            if gateway.timeout_secs == 0 {
                anyhow::bail!("gateway.timeout_secs must be at least 1");
            }
        }
        Ok(self)
    }
}

pub fn parse_config(content: &str) -> anyhow::Result<Config> {
    let config: Config = serde_json::from_str(content)
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))?;
    config.resolve_env().validate()
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    parse_config(&file_content).inspect(|config| trace!("loaded config: {config:?}"))
}
