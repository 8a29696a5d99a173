//! Repository Implementation

use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

use score_window::AttentionKey;

use crate::StorageError;

/// One point of the attention time series
#[derive(Debug, Clone, Serialize)]
pub struct HistoryPoint {
    pub timestamp: String,
    pub attention: f64,
}

/// Per-user attention percentage within a meeting
#[derive(Debug, Clone, Serialize)]
pub struct UserAttention {
    pub user_email: String,
    pub attention_percent: f64,
}

/// SQLite-backed store for aggregates and history
#[derive(Debug, Clone)]
pub struct AttentionStore {
    pool: SqlitePool,
}

impl AttentionStore {
    /// Connect to a SQLite database, creating the file if missing.
    ///
    /// URL format: `sqlite:path/to/db.sqlite`.
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        info!(url, "connected to attention database");
        Ok(Self { pool })
    }

    /// In-memory store for tests. A single connection keeps every query on
    /// the same in-memory database.
    pub async fn in_memory() -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Close the connection pool. Subsequent queries fail with a
    /// pool-closed database error.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Create tables if absent. Idempotent; run once at startup.
    pub async fn init_schema(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS attention_scores (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                meeting_id TEXT NOT NULL,
                user_email TEXT NOT NULL,
                date TEXT NOT NULL,
                attention REAL,
                updated_at TEXT,
                attention_sum REAL DEFAULT 0,
                attention_count INTEGER DEFAULT 0,
                UNIQUE(meeting_id, user_email, date)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS attention_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                meeting_id TEXT NOT NULL,
                user_email TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                attention REAL NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fold one binary label into the (meeting, user, day) running aggregate.
    ///
    /// A single atomic upsert: on conflict the new running average is
    /// computed from the pre-update row, so concurrent writers cannot lose
    /// updates. No-op for the unknown-identity sentinel.
    pub async fn upsert_daily(
        &self,
        key: &AttentionKey,
        date: &str,
        label: f64,
        now_iso: &str,
    ) -> Result<(), StorageError> {
        if key.is_unknown() {
            debug!(meeting_id = %key.meeting_id, "skipping aggregate upsert for unknown identity");
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO attention_scores
                (meeting_id, user_email, date, attention, updated_at, attention_sum, attention_count)
            VALUES (?, ?, ?, ?, ?, ?, 1)
            ON CONFLICT(meeting_id, user_email, date) DO UPDATE SET
                attention = (attention_sum + excluded.attention_sum) / (attention_count + 1),
                attention_sum = attention_sum + excluded.attention_sum,
                attention_count = attention_count + 1,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&key.meeting_id)
        .bind(&key.user_identity)
        .bind(date)
        .bind(label)
        .bind(now_iso)
        .bind(label)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Append one labelled frame to the event history.
    ///
    /// The timestamp is the caller-supplied one, already validated upstream;
    /// insertion order need not match timestamp order.
    pub async fn append_history(
        &self,
        key: &AttentionKey,
        timestamp: &str,
        label: f64,
    ) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO attention_history (meeting_id, user_email, timestamp, attention) VALUES (?, ?, ?, ?)",
        )
        .bind(&key.meeting_id)
        .bind(&key.user_identity)
        .bind(timestamp)
        .bind(label)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Full event series for one participant, timestamp-ascending
    pub async fn history(
        &self,
        meeting_id: &str,
        user_email: &str,
    ) -> Result<Vec<HistoryPoint>, StorageError> {
        let rows = sqlx::query_as::<_, (String, f64)>(
            "SELECT timestamp, attention FROM attention_history
             WHERE meeting_id = ? AND user_email = ? ORDER BY timestamp ASC",
        )
        .bind(meeting_id)
        .bind(user_email)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(timestamp, attention)| HistoryPoint { timestamp, attention })
            .collect())
    }

    /// Attention percentage per user for a meeting, summed across all dates
    pub async fn meeting_percentages(
        &self,
        meeting_id: &str,
    ) -> Result<Vec<UserAttention>, StorageError> {
        let rows = sqlx::query(
            "SELECT user_email, SUM(attention_sum) AS total_sum, SUM(attention_count) AS total_count
             FROM attention_scores WHERE meeting_id = ?
             GROUP BY user_email ORDER BY user_email",
        )
        .bind(meeting_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let user_email: String = row.get("user_email");
                let sum: Option<f64> = row.get("total_sum");
                let count: Option<i64> = row.get("total_count");
                UserAttention {
                    user_email,
                    attention_percent: percent(sum, count),
                }
            })
            .collect())
    }

    /// Attention percentage for one user in a meeting, summed across all
    /// dates. 0.0 when no aggregate row exists. Always recomputed from the
    /// stored sum/count, never from the cached average.
    pub async fn user_percent(
        &self,
        meeting_id: &str,
        user_email: &str,
    ) -> Result<f64, StorageError> {
        let row = sqlx::query(
            "SELECT SUM(attention_sum) AS total_sum, SUM(attention_count) AS total_count
             FROM attention_scores WHERE meeting_id = ? AND user_email = ?",
        )
        .bind(meeting_id)
        .bind(user_email)
        .fetch_one(&self.pool)
        .await?;

        let sum: Option<f64> = row.get("total_sum");
        let count: Option<i64> = row.get("total_count");
        Ok(percent(sum, count))
    }
}

fn percent(sum: Option<f64>, count: Option<i64>) -> f64 {
    match (sum, count) {
        (Some(sum), Some(count)) if count > 0 => sum / count as f64 * 100.0,
        _ => 0.0,
    }
}
