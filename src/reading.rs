//! Sensor reading data model
//!
//! A [`Reading`] is identified by its full value triple
//! `(temperature, humidity, timestamp)`. There is no surrogate key involved in
//! equality: two readings are the same iff all three fields compare equal.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Canonical textual form used for storage and alert messages
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Alternative layouts accepted from the upstream source
const ACCEPTED_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// One sensor sample
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reading {
    /// Temperature in °C as a decimal string
    #[serde(deserialize_with = "decimal_text")]
    pub temperature: String,

    /// Relative humidity in % as a decimal string
    #[serde(deserialize_with = "decimal_text")]
    pub humidity: String,

    #[serde(with = "timestamp")]
    pub timestamp: NaiveDateTime,
}

impl Reading {
    pub fn new(
        temperature: impl Into<String>,
        humidity: impl Into<String>,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            temperature: temperature.into(),
            humidity: humidity.into(),
            timestamp,
        }
    }

    /// Timestamp in its canonical form (`2024-01-01T00:00:00`)
    pub fn timestamp_text(&self) -> String {
        format_timestamp(&self.timestamp)
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} °C / {}% at {}",
            self.temperature,
            self.humidity,
            self.timestamp_text()
        )
    }
}

/// A reading that has been persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredReading {
    /// Storage-engine row id (not part of the dedup key)
    pub id: i64,

    #[serde(flatten)]
    pub reading: Reading,

    /// When this process inserted the row
    pub inserted_at: DateTime<Utc>,
}

pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a timestamp in any of the layouts the upstream source is known to send.
///
/// RFC 3339 values keep their local wall-clock time; the offset is dropped so
/// alert text shows the time the sensor reported.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(text) {
        return Some(with_offset.naive_local());
    }

    ACCEPTED_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

/// Accept both `"42.5"` and `42.5`, keeping the literal decimal text.
///
/// Relies on serde_json's `arbitrary_precision`, which keeps the number's
/// source text even when it is buffered through an untagged enum.
fn decimal_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Decimal {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Decimal::deserialize(deserializer)? {
        Decimal::Text(text) => text,
        Decimal::Number(number) => number.to_string(),
    })
}

pub mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S>(timestamp: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_timestamp(timestamp))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        super::parse_timestamp(&text)
            .ok_or_else(|| D::Error::custom(format!("unrecognized timestamp: {text}")))
    }
}
