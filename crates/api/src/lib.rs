//! Meeting Attention API Server
//!
//! REST surface over the attention pipeline: frame submission, live and
//! persisted attention lookups, and the embedded dashboard page.

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
pub mod error;
pub mod routes;

pub use config::Settings;
pub use error::ApiError;

use score_window::WindowRegistry;
use storage::AttentionStore;
use vision::FrameClassifier;

/// Application state shared across handlers
pub struct AppState {
    /// Durable aggregates and history
    pub store: AttentionStore,
    /// In-memory per-participant windows
    pub registry: WindowRegistry,
    /// Snapshot-to-score pipeline
    pub classifier: Arc<dyn FrameClassifier>,
    /// Directory for per-meeting descriptor files
    pub meeting_data_dir: PathBuf,
}

impl AppState {
    pub fn new(
        store: AttentionStore,
        classifier: Arc<dyn FrameClassifier>,
        meeting_data_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            registry: WindowRegistry::new(),
            classifier,
            meeting_data_dir: meeting_data_dir.into(),
        }
    }
}

/// Create the application router
pub fn create_router(state: Arc<AppState>, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/api/images", post(routes::images::submit_image))
        .route("/api/health", get(health_handler))
        .route("/api/attention", get(routes::attention::live_attention))
        .route("/api/db-attention", get(routes::dashboard::page))
        .route("/api/db-attention-data", get(routes::attention::meeting_data))
        .route("/api/db-attention-score", get(routes::attention::user_score))
        .route("/api/attention-history", get(routes::attention::history))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe
async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }
    let parsed: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin, "skipping unparsable CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(parsed))
}

/// Initialize logging
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    // Ignore the error when a subscriber is already installed (tests)
    let _ = tracing::subscriber::set_global_default(subscriber);
}
