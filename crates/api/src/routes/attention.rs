//! Attention lookup routes

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use storage::{HistoryPoint, UserAttention};

use crate::error::ApiError;
use crate::AppState;

/// One currently-tracked participant with their rolling session average
#[derive(Debug, Serialize)]
pub struct LiveAttention {
    #[serde(rename = "meetingId")]
    pub meeting_id: String,
    #[serde(rename = "userEmail")]
    pub user_email: String,
    pub attention_score: f64,
}

/// `GET /api/attention`: every key tracked this process lifetime, with the
/// long-term window average rounded to 2 decimals
pub async fn live_attention(State(state): State<Arc<AppState>>) -> Json<Vec<LiveAttention>> {
    let snapshot = state.registry.snapshot().await;
    Json(
        snapshot
            .into_iter()
            .map(|s| LiveAttention {
                meeting_id: s.key.meeting_id,
                user_email: s.key.user_identity,
                attention_score: (s.session_average as f64 * 100.0).round() / 100.0,
            })
            .collect(),
    )
}

#[derive(Debug, Deserialize)]
pub struct MeetingQuery {
    pub meeting_id: String,
}

/// `GET /api/db-attention-data`: per-user percentages for a meeting,
/// aggregated across all dates
pub async fn meeting_data(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MeetingQuery>,
) -> Result<Json<Vec<UserAttention>>, ApiError> {
    let rows = state.store.meeting_percentages(&params.meeting_id).await?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub meeting_id: String,
    pub user_email: String,
}

#[derive(Debug, Serialize)]
pub struct UserScore {
    pub user_email: String,
    pub attention_percent: f64,
}

/// `GET /api/db-attention-score`: one user's percentage, 0.0 without rows
pub async fn user_score(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserQuery>,
) -> Result<Json<UserScore>, ApiError> {
    let attention_percent = state
        .store
        .user_percent(&params.meeting_id, &params.user_email)
        .await?;
    Ok(Json(UserScore {
        user_email: params.user_email,
        attention_percent,
    }))
}

/// `GET /api/attention-history`: full event series, timestamp-ascending
pub async fn history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserQuery>,
) -> Result<Json<Vec<HistoryPoint>>, ApiError> {
    let points = state
        .store
        .history(&params.meeting_id, &params.user_email)
        .await?;
    Ok(Json(points))
}
