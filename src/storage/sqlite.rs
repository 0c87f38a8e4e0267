//! SQLite storage backend implementation
//!
//! ## Features
//!
//! - **Embedded**: No separate database server required
//! - **WAL mode**: Reads (API) do not block the ingestion writer
//! - **Atomic dedup**: Unique index on `(temperature, humidity, timestamp)`
//!   plus `ON CONFLICT DO NOTHING`, so check and insert are one statement
//! - **Migrations**: Automatic schema versioning with sqlx

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info, instrument, warn};

use super::backend::{HealthStatus, ReadingStore};
use super::error::{StorageError, StorageResult};
use crate::reading::{Reading, StoredReading, format_timestamp, parse_timestamp};

pub struct SqliteStore {
    pool: Pool<Sqlite>,
    db_path: String,
}

impl SqliteStore {
    /// Open (or create) the database file and run migrations.
    ///
    /// ```no_run
    /// # use sensor_watch::storage::sqlite::SqliteStore;
    /// # async fn example() -> anyhow::Result<()> {
    /// let store = SqliteStore::new("./sensor.db").await?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip_all)]
    pub async fn new(db_path: impl AsRef<Path>) -> StorageResult<Self> {
        let db_path_str = db_path.as_ref().to_string_lossy().to_string();

        info!("initializing SQLite store at: {}", db_path_str);

        let options = SqliteConnectOptions::new()
            .filename(&db_path_str)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        debug!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("database migrations complete");

        Ok(Self {
            pool,
            db_path: db_path_str,
        })
    }

    fn millis_to_timestamp(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
    }

    fn row_to_stored(row: SqliteRow) -> StorageResult<StoredReading> {
        let timestamp_text: String = row.try_get("timestamp")?;
        let timestamp = parse_timestamp(&timestamp_text).ok_or_else(|| {
            StorageError::QueryFailed(format!("stored timestamp is invalid: {timestamp_text}"))
        })?;

        Ok(StoredReading {
            id: row.try_get("id")?,
            reading: Reading {
                temperature: row.try_get("temperature")?,
                humidity: row.try_get("humidity")?,
                timestamp,
            },
            inserted_at: Self::millis_to_timestamp(row.try_get("inserted_at")?),
        })
    }
}

#[async_trait]
impl ReadingStore for SqliteStore {
    #[instrument(skip(self), fields(reading = %reading))]
    async fn contains(&self, reading: &Reading) -> StorageResult<bool> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sensor WHERE temperature = ? AND humidity = ? AND timestamp = ?",
        )
        .bind(&reading.temperature)
        .bind(&reading.humidity)
        .bind(format_timestamp(&reading.timestamp))
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    #[instrument(skip(self), fields(reading = %reading))]
    async fn insert(&self, reading: &Reading) -> StorageResult<()> {
        sqlx::query(
            "INSERT INTO sensor (temperature, humidity, timestamp, inserted_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&reading.temperature)
        .bind(&reading.humidity)
        .bind(format_timestamp(&reading.timestamp))
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self), fields(reading = %reading))]
    async fn insert_if_absent(&self, reading: &Reading) -> StorageResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO sensor (temperature, humidity, timestamp, inserted_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (temperature, humidity, timestamp) DO NOTHING
            "#,
        )
        .bind(&reading.temperature)
        .bind(&reading.humidity)
        .bind(format_timestamp(&reading.timestamp))
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected() == 1;
        debug!("conditional insert, inserted = {inserted}");
        Ok(inserted)
    }

    #[instrument(skip(self))]
    async fn latest(&self) -> StorageResult<Option<StoredReading>> {
        let row = sqlx::query(
            r#"
            SELECT id, temperature, humidity, timestamp, inserted_at
            FROM sensor
            ORDER BY timestamp DESC, id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_stored).transpose()
    }

    #[instrument(skip(self))]
    async fn count(&self) -> StorageResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sensor")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> StorageResult<HealthStatus> {
        match sqlx::query("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => {
                let mut metadata = HashMap::new();
                metadata.insert("backend".to_string(), "sqlite".to_string());
                metadata.insert("db_path".to_string(), self.db_path.clone());

                Ok(HealthStatus {
                    healthy: true,
                    message: "SQLite backend operational".to_string(),
                    metadata,
                })
            }
            Err(e) => {
                warn!("health check failed: {}", e);
                Ok(HealthStatus {
                    healthy: false,
                    message: format!("health check failed: {}", e),
                    metadata: HashMap::new(),
                })
            }
        }
    }

    async fn close(&self) -> StorageResult<()> {
        info!("closing SQLite store");
        self.pool.close().await;
        Ok(())
    }
}
