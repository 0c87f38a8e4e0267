//! Alert delivery
//!
//! Sends are sequential and best-effort: a failed message is recorded and
//! logged, and the remaining messages are still attempted. There is no retry
//! and no durable queue.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::gateway::{AlertMessage, MessagingGateway};

/// Result of one send attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    Failed(String),
}

/// Result of one alert cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing exceeded a threshold
    NoAlerts,

    /// Alerts existed but no destination could be resolved
    DestinationUnavailable,

    /// One outcome per alert, in send order
    Dispatched(Vec<DispatchOutcome>),
}

impl CycleOutcome {
    pub fn sent(&self) -> usize {
        match self {
            CycleOutcome::Dispatched(outcomes) => outcomes
                .iter()
                .filter(|outcome| **outcome == DispatchOutcome::Sent)
                .count(),
            _ => 0,
        }
    }
}

#[derive(Clone)]
pub struct AlertDispatcher {
    gateway: Arc<dyn MessagingGateway>,
}

impl AlertDispatcher {
    pub fn new(gateway: Arc<dyn MessagingGateway>) -> Self {
        Self { gateway }
    }

    /// Look up the current destination; failures are logged and yield `None`.
    pub async fn resolve_destination(&self) -> Option<String> {
        match self.gateway.resolve_destination().await {
            Ok(Some(destination)) => Some(destination),
            Ok(None) => {
                warn!("no alert destination configured or found");
                None
            }
            Err(e) => {
                warn!("{e}");
                None
            }
        }
    }

    /// Send every alert to `destination`, in order.
    #[instrument(skip(self, alerts), fields(count = alerts.len()))]
    pub async fn dispatch_all(&self, alerts: &[String], destination: &str) -> Vec<DispatchOutcome> {
        let mut outcomes = Vec::with_capacity(alerts.len());

        for text in alerts {
            let message = AlertMessage {
                text: text.clone(),
                destination: destination.to_string(),
            };

            let outcome = match self.gateway.send(&message).await {
                Ok(()) => DispatchOutcome::Sent,
                Err(e) => {
                    warn!("alert not delivered, continuing with the rest: {e}");
                    DispatchOutcome::Failed(e.to_string())
                }
            };
            outcomes.push(outcome);
        }

        outcomes
    }

    /// Resolve the destination and dispatch, skipping the cycle when there is
    /// nothing to send or nowhere to send it.
    pub async fn notify(&self, alerts: &[String]) -> CycleOutcome {
        if alerts.is_empty() {
            debug!("no alerts to send");
            return CycleOutcome::NoAlerts;
        }

        let Some(destination) = self.resolve_destination().await else {
            warn!("skipping {} alert(s), no destination", alerts.len());
            return CycleOutcome::DestinationUnavailable;
        };

        let outcomes = self.dispatch_all(alerts, &destination).await;
        let cycle = CycleOutcome::Dispatched(outcomes);
        info!("dispatched {}/{} alert(s)", cycle.sent(), alerts.len());
        cycle
    }
}
