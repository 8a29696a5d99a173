//! Meeting Attention Pipeline - Main Entry Point

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use api::{create_router, init_logging, AppState, Settings};
use storage::AttentionStore;
use vision::{AttentionClassifier, VisionConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("=== Meeting Attention Pipeline v{} ===", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load().context("loading configuration")?;
    tokio::fs::create_dir_all(&settings.meeting_data_dir)
        .await
        .with_context(|| format!("creating {}", settings.meeting_data_dir))?;

    let store = AttentionStore::connect(&settings.database_url())
        .await
        .context("connecting to database")?;
    store.init_schema().await.context("initializing schema")?;

    let classifier = Arc::new(AttentionClassifier::new(VisionConfig::default()));
    let state = Arc::new(AppState::new(store, classifier, &settings.meeting_data_dir));
    let app = create_router(state, &settings.origins());

    let addr = format!("{}:{}", settings.host, settings.port);
    info!("starting attention server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
