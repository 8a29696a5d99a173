//! Frame submission route
//!
//! `POST /api/images` runs the full pipeline: validate, write the
//! last-write-wins meeting descriptor, classify off the async runtime,
//! persist the label, then commit the in-memory windows.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use score_window::AttentionKey;

use crate::error::ApiError;
use crate::AppState;

/// Inbound snapshot payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSubmission {
    /// Base64 image, optionally with a data-URL header before a comma
    pub image_data: String,
    pub meeting_id: String,
    /// ISO-8601, source-provided; `Z` suffix accepted
    pub timestamp: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub attention: u8,
}

/// Last-seen descriptor, overwritten on every frame for the meeting
#[derive(Debug, Serialize)]
struct MeetingDescriptor<'a> {
    #[serde(rename = "meetingId")]
    meeting_id: &'a str,
    #[serde(rename = "userEmail")]
    user_email: &'a str,
    timestamp: &'a str,
}

pub async fn submit_image(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ImageSubmission>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    // All validation happens before any side effect
    let image_bytes = decode_image_payload(&body.image_data)?;
    let observed_at = parse_timestamp(&body.timestamp)?;
    validate_meeting_id(&body.meeting_id)?;
    let key = AttentionKey::resolve(
        &body.meeting_id,
        body.user_id.as_deref(),
        body.user_name.as_deref(),
    );

    write_meeting_descriptor(&state.meeting_data_dir, &key, &body.timestamp).await?;

    // Classification is CPU-bound; keep it off the async workers
    let classifier = state.classifier.clone();
    let raw = tokio::task::spawn_blocking(move || classifier.classify(&image_bytes))
        .await
        .map_err(|e| ApiError::Internal(format!("classifier task failed: {e}")))?;

    // Per-key critical section: window mutation and the aggregate upsert
    // stay in arrival order for this participant
    let entry = state.registry.entry(&key);
    let mut windows = entry.lock().await;
    let label = windows.preview_label(raw);

    let date = observed_at.format("%Y-%m-%d").to_string();
    let now_iso = Utc::now().to_rfc3339();
    state
        .store
        .append_history(&key, &body.timestamp, label as f64)
        .await?;
    state
        .store
        .upsert_daily(&key, &date, label as f64, &now_iso)
        .await?;

    // Windows mutate only once persistence has succeeded
    windows.commit(raw, label);

    debug!(
        meeting_id = %key.meeting_id,
        user = %key.user_identity,
        raw,
        label,
        "frame processed"
    );

    Ok(Json(SubmissionResponse {
        status: "success",
        message: "Image processed and not stored",
        attention: label,
    }))
}

/// Strip an optional data-URL header and decode the base64 body
fn decode_image_payload(payload: &str) -> Result<Vec<u8>, ApiError> {
    let encoded = match payload.split_once(',') {
        Some((_, rest)) => rest,
        None => payload,
    };
    BASE64
        .decode(encoded.trim())
        .map_err(|e| ApiError::Validation(format!("invalid base64 image data: {e}")))
}

fn parse_timestamp(timestamp: &str) -> Result<DateTime<FixedOffset>, ApiError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map_err(|e| ApiError::Validation(format!("invalid timestamp {timestamp:?}: {e}")))
}

/// Meeting ids become file names; reject anything that could escape the
/// descriptor directory
fn validate_meeting_id(meeting_id: &str) -> Result<(), ApiError> {
    if meeting_id.is_empty() {
        return Err(ApiError::Validation("meeting id must not be empty".into()));
    }
    if meeting_id.contains('/') || meeting_id.contains('\\') || meeting_id.contains("..") {
        return Err(ApiError::Validation(format!(
            "meeting id {meeting_id:?} contains path separators"
        )));
    }
    Ok(())
}

async fn write_meeting_descriptor(
    dir: &Path,
    key: &AttentionKey,
    timestamp: &str,
) -> Result<(), ApiError> {
    let descriptor = MeetingDescriptor {
        meeting_id: &key.meeting_id,
        user_email: &key.user_identity,
        timestamp,
    };
    let contents = serde_json::to_vec_pretty(&descriptor)
        .map_err(|e| ApiError::Internal(format!("descriptor serialization failed: {e}")))?;
    let path: PathBuf = dir.join(format!("{}.json", key.meeting_id));
    tokio::fs::write(&path, contents).await?;
    Ok(())
}
