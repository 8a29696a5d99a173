//! Storage Layer
//!
//! SQLite persistence for the attention pipeline: the per-day running
//! aggregates (`attention_scores`) and the append-only event history
//! (`attention_history`).

mod repository;

pub use repository::{AttentionStore, HistoryPoint, UserAttention};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
