//! Outbound messaging gateway
//!
//! The production implementation talks to a Fonnte-style WhatsApp gateway:
//!
//! - `POST {url}/send` with `{"target", "message"}` delivers one message
//! - `POST {url}/get-whatsapp-group` lists the groups the device is in
//!
//! Both calls authenticate with the raw token in the `Authorization` header.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::config::{Destination, GatewayConfig};

/// One outbound notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertMessage {
    #[serde(rename = "message")]
    pub text: String,

    #[serde(rename = "target")]
    pub destination: String,
}

#[derive(Debug)]
pub enum GatewayError {
    /// The destination lookup failed
    Resolution(String),

    /// A single message could not be delivered to the gateway
    Dispatch(String),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Resolution(msg) => write!(f, "destination lookup failed: {}", msg),
            GatewayError::Dispatch(msg) => write!(f, "message dispatch failed: {}", msg),
        }
    }
}

impl std::error::Error for GatewayError {}

#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Current destination, or `None` if nothing is configured / found
    async fn resolve_destination(&self) -> Result<Option<String>, GatewayError>;

    /// Deliver a single message
    async fn send(&self, message: &AlertMessage) -> Result<(), GatewayError>;
}

#[derive(Debug, Deserialize)]
struct GroupList {
    #[serde(default)]
    status: bool,
    #[serde(default)]
    data: Vec<Group>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Group {
    id: String,
    name: String,
}

#[derive(Debug, Clone)]
pub struct FonnteGateway {
    client: reqwest::Client,
    url: String,
    token: String,
    destination: Option<Destination>,
}

impl FonnteGateway {
    pub fn new(config: &GatewayConfig) -> reqwest::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()?,
            url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone().unwrap_or_default(),
            destination: config.destination.clone(),
        })
    }

    #[instrument(skip(self))]
    async fn find_group(&self, name: &str) -> Result<Option<String>, GatewayError> {
        let response = self
            .client
            .post(format!("{}/get-whatsapp-group", self.url))
            .header("Authorization", &self.token)
            .send()
            .await
            .map_err(|e| GatewayError::Resolution(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::Resolution(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let groups: GroupList = response
            .json()
            .await
            .map_err(|e| GatewayError::Resolution(e.to_string()))?;

        if !groups.status {
            return Err(GatewayError::Resolution(
                groups
                    .reason
                    .unwrap_or_else(|| "gateway reported failure".to_string()),
            ));
        }

        debug!("gateway knows {} groups", groups.data.len());

        Ok(groups
            .data
            .into_iter()
            .find(|group| group.name == name)
            .map(|group| group.id))
    }
}

#[async_trait]
impl MessagingGateway for FonnteGateway {
    async fn resolve_destination(&self) -> Result<Option<String>, GatewayError> {
        match &self.destination {
            None => Ok(None),
            Some(Destination::Target(target)) => Ok(Some(target.clone())),
            Some(Destination::Group(name)) => {
                let group = self.find_group(name).await?;
                if group.is_none() {
                    warn!("no WhatsApp group named {name:?} on the gateway");
                }
                Ok(group)
            }
        }
    }

    #[instrument(skip(self, message), fields(target = %message.destination))]
    async fn send(&self, message: &AlertMessage) -> Result<(), GatewayError> {
        debug!("sending alert: {}", message.text);

        let response = self
            .client
            .post(format!("{}/send", self.url))
            .header("Authorization", &self.token)
            .json(message)
            .send()
            .await
            .map_err(|e| {
                error!("failed to reach messaging gateway: {}", e);
                GatewayError::Dispatch(e.to_string())
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.is_success() {
            info!("alert handed to gateway: {}", body);
            Ok(())
        } else {
            error!("gateway rejected alert with status {}: {}", status, body);
            Err(GatewayError::Dispatch(format!("HTTP {}", status)))
        }
    }
}
