//! Helper functions and fakes for integration tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sensor_watch::{
    config::{Destination, GatewayConfig, SourceConfig},
    dispatch::AlertDispatcher,
    gate::PersistenceGate,
    gateway::{AlertMessage, GatewayError, MessagingGateway},
    reading::{Reading, parse_timestamp},
    scheduler::IngestionScheduler,
    source::{FetchError, ReadingSource},
    storage::ReadingStore,
    thresholds::ThresholdEvaluator,
};

pub fn reading(temperature: &str, humidity: &str, timestamp: &str) -> Reading {
    Reading::new(temperature, humidity, parse_timestamp(timestamp).unwrap())
}

pub fn source_config(url: String) -> SourceConfig {
    SourceConfig {
        url,
        token: None,
        timeout_secs: 2,
    }
}

pub fn gateway_config(url: String, destination: Option<Destination>) -> GatewayConfig {
    GatewayConfig {
        url,
        token: Some("test-token".to_string()),
        destination,
        timeout_secs: 2,
    }
}

pub fn mock_reading_json(temperature: &str, humidity: &str, timestamp: &str) -> serde_json::Value {
    serde_json::json!([{
        "temperature": temperature,
        "humidity": humidity,
        "timestamp": timestamp
    }])
}

/// Source replaying a fixed script, then repeating the last entry
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<Option<Reading>, String>>>,
    calls: Mutex<usize>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<Option<Reading>, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(0),
        }
    }

    pub fn repeating(reading: Reading) -> Self {
        Self::new(vec![Ok(Some(reading))])
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ReadingSource for ScriptedSource {
    async fn fetch_latest(&self) -> Result<Option<Reading>, FetchError> {
        *self.calls.lock().unwrap() += 1;

        let mut script = self.script.lock().unwrap();
        let next = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };

        match next {
            Some(Ok(reading)) => Ok(reading),
            Some(Err(msg)) => Err(FetchError::Request(msg)),
            None => Ok(None),
        }
    }
}

/// Gateway recording every resolution and send
#[derive(Default)]
pub struct RecordingGateway {
    pub destination: Option<String>,
    pub failing: Vec<String>,
    pub resolutions: Mutex<usize>,
    pub sent: Mutex<Vec<AlertMessage>>,
}

impl RecordingGateway {
    pub fn with_destination(destination: &str) -> Self {
        Self {
            destination: Some(destination.to_string()),
            ..Default::default()
        }
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.text.clone())
            .collect()
    }

    pub fn resolutions(&self) -> usize {
        *self.resolutions.lock().unwrap()
    }
}

#[async_trait]
impl MessagingGateway for RecordingGateway {
    async fn resolve_destination(&self) -> Result<Option<String>, GatewayError> {
        *self.resolutions.lock().unwrap() += 1;
        Ok(self.destination.clone())
    }

    async fn send(&self, message: &AlertMessage) -> Result<(), GatewayError> {
        self.sent.lock().unwrap().push(message.clone());
        if self.failing.iter().any(|text| message.text.contains(text)) {
            return Err(GatewayError::Dispatch("rejected".to_string()));
        }
        Ok(())
    }
}

pub fn pipeline(
    source: Arc<dyn ReadingSource>,
    store: Arc<dyn ReadingStore>,
    gateway: Arc<dyn MessagingGateway>,
) -> IngestionScheduler {
    IngestionScheduler::new(
        source,
        PersistenceGate::new(store),
        ThresholdEvaluator::default(),
        Some(AlertDispatcher::new(gateway)),
    )
}
