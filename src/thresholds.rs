//! Threshold rules for sensor readings
//!
//! Pure classification, no I/O. A reading whose value cannot be parsed to a
//! finite number never triggers an alert: malformed data is logged and treated
//! as within limits.
//!
//! ```text
//! temperature:  alert iff  t > 40.0
//! humidity:     alert iff  h < 40.0  or  h > 80.0   (40 and 80 are fine)
//! ```

use serde::Deserialize;
use tracing::warn;

use crate::reading::Reading;

/// Numeric limits applied to every reading
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Thresholds {
    /// Temperatures strictly above this value alert
    #[serde(default = "default_temperature_max")]
    pub temperature_max: f64,

    /// Humidity strictly below this value alerts
    #[serde(default = "default_humidity_min")]
    pub humidity_min: f64,

    /// Humidity strictly above this value alerts
    #[serde(default = "default_humidity_max")]
    pub humidity_max: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temperature_max: default_temperature_max(),
            humidity_min: default_humidity_min(),
            humidity_max: default_humidity_max(),
        }
    }
}

fn default_temperature_max() -> f64 {
    40.0
}

fn default_humidity_min() -> f64 {
    40.0
}

fn default_humidity_max() -> f64 {
    80.0
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdEvaluator {
    thresholds: Thresholds,
}

impl ThresholdEvaluator {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn is_high_temperature(&self, reading: &Reading) -> bool {
        parse_value("temperature", &reading.temperature)
            .is_some_and(|temperature| temperature > self.thresholds.temperature_max)
    }

    pub fn is_high_or_low_humidity(&self, reading: &Reading) -> bool {
        parse_value("humidity", &reading.humidity).is_some_and(|humidity| {
            humidity < self.thresholds.humidity_min || humidity > self.thresholds.humidity_max
        })
    }

    /// Alert strings for a batch of readings.
    ///
    /// All temperature alerts come first, then all humidity alerts.
    pub fn evaluate(&self, readings: &[Reading]) -> Vec<String> {
        let temperature_alerts = readings
            .iter()
            .filter(|reading| self.is_high_temperature(reading))
            .map(describe_temperature_alert);

        let humidity_alerts = readings
            .iter()
            .filter(|reading| self.is_high_or_low_humidity(reading))
            .map(describe_humidity_alert);

        temperature_alerts.chain(humidity_alerts).collect()
    }
}

pub fn describe_temperature_alert(reading: &Reading) -> String {
    format!(
        "🚨 High temperature alert at {}: {} °C",
        reading.timestamp_text(),
        reading.temperature
    )
}

pub fn describe_humidity_alert(reading: &Reading) -> String {
    format!(
        "💧 Humidity alert at {}: {}%",
        reading.timestamp_text(),
        reading.humidity
    )
}

fn parse_value(field: &str, raw: &str) -> Option<f64> {
    match raw.trim().parse::<f64>() {
        Ok(value) if !value.is_finite() => {
            warn!("{field} value {raw:?} is not a finite number, ignoring for threshold checks");
            None
        }
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{field} value {raw:?} is not numeric ({e}), ignoring for threshold checks");
            None
        }
    }
}
