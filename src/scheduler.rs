//! Ingestion scheduler
//!
//! Drives the pipeline on a fixed cadence:
//!
//! ```text
//! timer tick → fetch latest → insert if new ─(new)→ evaluate thresholds → dispatch alerts
//!     ↑                            │
//!     │                            └─(duplicate / failure)→ done
//!     └─── Commands (TickNow, Shutdown)
//! ```
//!
//! A tick always runs to completion before the next timer event or command is
//! looked at, so ticks never overlap. Timer events missed while a slow tick
//! was running are skipped, not replayed.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::dispatch::{AlertDispatcher, CycleOutcome};
use crate::gate::PersistenceGate;
use crate::source::ReadingSource;
use crate::thresholds::ThresholdEvaluator;

/// What a single tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Upstream unreachable or payload malformed
    FetchFailed(String),

    /// Upstream answered with no reading
    NoReading,

    /// The store could not be queried or written
    StorageFailed(String),

    /// Reading was already stored; nothing evaluated or sent
    Duplicate,

    /// Reading was stored and the alert path ran
    Inserted(CycleOutcome),
}

/// One fetch → persist → alert pipeline
pub struct IngestionScheduler {
    source: Arc<dyn ReadingSource>,
    gate: PersistenceGate,
    evaluator: ThresholdEvaluator,
    /// Without a dispatcher alerts are only logged
    dispatcher: Option<AlertDispatcher>,
}

impl IngestionScheduler {
    pub fn new(
        source: Arc<dyn ReadingSource>,
        gate: PersistenceGate,
        evaluator: ThresholdEvaluator,
        dispatcher: Option<AlertDispatcher>,
    ) -> Self {
        Self {
            source,
            gate,
            evaluator,
            dispatcher,
        }
    }

    /// Run one tick. Never fails: every error is logged and reported in the outcome.
    #[instrument(skip(self))]
    pub async fn tick(&self) -> TickOutcome {
        let reading = match self.source.fetch_latest().await {
            Ok(Some(reading)) => reading,
            Ok(None) => {
                warn!("upstream returned no reading");
                return TickOutcome::NoReading;
            }
            Err(e) => {
                error!("{e}");
                return TickOutcome::FetchFailed(e.to_string());
            }
        };

        trace!("fetched {reading}");

        match self.gate.insert_if_new(&reading).await {
            Ok(true) => {}
            Ok(false) => return TickOutcome::Duplicate,
            Err(e) => {
                error!("{e}");
                return TickOutcome::StorageFailed(e.to_string());
            }
        }

        let alerts = self.evaluator.evaluate(std::slice::from_ref(&reading));

        let cycle = match &self.dispatcher {
            Some(dispatcher) => dispatcher.notify(&alerts).await,
            None if alerts.is_empty() => CycleOutcome::NoAlerts,
            None => {
                for alert in &alerts {
                    warn!("no gateway configured, alert not sent: {alert}");
                }
                CycleOutcome::DestinationUnavailable
            }
        };

        TickOutcome::Inserted(cycle)
    }
}

/// Commands that can be sent to the ingestion actor
#[derive(Debug)]
pub enum IngestionCommand {
    /// Run a tick right away (serialized with timer ticks)
    TickNow {
        respond_to: oneshot::Sender<TickOutcome>,
    },

    /// Stop after the in-flight tick
    Shutdown,
}

struct IngestionActor {
    scheduler: IngestionScheduler,
    command_rx: mpsc::Receiver<IngestionCommand>,
    period: Duration,
}

impl IngestionActor {
    async fn run(mut self) {
        debug!("starting ingestion actor, period {:?}", self.period);

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let outcome = self.scheduler.tick().await;
                    trace!("tick finished: {outcome:?}");
                }

                command = self.command_rx.recv() => {
                    match command {
                        Some(IngestionCommand::TickNow { respond_to }) => {
                            debug!("received TickNow command");
                            let outcome = self.scheduler.tick().await;
                            let _ = respond_to.send(outcome);
                        }
                        Some(IngestionCommand::Shutdown) => {
                            debug!("received shutdown command");
                            break;
                        }
                        None => {
                            warn!("command channel closed, shutting down");
                            break;
                        }
                    }
                }
            }
        }

        info!("ingestion stopped");
    }
}

/// Handle for controlling the ingestion actor
#[derive(Clone)]
pub struct IngestionHandle {
    sender: mpsc::Sender<IngestionCommand>,
}

impl IngestionHandle {
    /// Spawn the actor; the first tick runs immediately.
    pub fn spawn(scheduler: IngestionScheduler, period: Duration) -> (Self, JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);

        let actor = IngestionActor {
            scheduler,
            command_rx: cmd_rx,
            period,
        };

        let task = tokio::spawn(actor.run());

        (Self { sender: cmd_tx }, task)
    }

    pub async fn tick_now(&self) -> Result<TickOutcome> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(IngestionCommand::TickNow { respond_to: tx })
            .await
            .context("failed to send TickNow command")?;

        rx.await.context("failed to receive tick outcome")
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(IngestionCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}
