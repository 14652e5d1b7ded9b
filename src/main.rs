// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod error;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::application::dashboard_service::DashboardService;
use crate::application::dataset_cache::DatasetCache;
use crate::application::session_service::SessionService;
use crate::infrastructure::config::load_config;
use crate::infrastructure::logging::init_tracing;
use crate::infrastructure::sqlite_repository::SqliteRepository;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    create_session, dataset_summary, delete_session, get_session, health_check, reload_dataset,
    replace_filter, select_all, select_none, session_events,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Load configuration
    let config = load_config()?;
    let data = &config.data;

    // Create repository (infrastructure layer)
    let repository = Arc::new(SqliteRepository::new(
        data.db_path.clone(),
        data.table.clone(),
        data.columns.clone(),
    ));

    // Create services (application layer)
    let dataset_cache = Arc::new(DatasetCache::new(
        repository,
        data.cache_ttl(),
        data.missing_text_sentinel.clone(),
    ));
    let dashboard_service = DashboardService::new(
        config.dashboard.title.clone(),
        config.dashboard.chart_options(),
    );
    let session_service = SessionService::new(
        dataset_cache.clone(),
        dashboard_service,
        config.server.session_idle_timeout(),
    );

    // Warm the cache so a missing database shows up at startup
    if let Err(e) = dataset_cache.get().await {
        tracing::error!("Initial dataset load failed: {}", e);
    }

    // Create application state
    let state = Arc::new(AppState {
        dataset_cache,
        session_service,
        source: data.db_path.display().to_string(),
        table: data.table.clone(),
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/dataset", get(dataset_summary))
        .route("/dataset/reload", post(reload_dataset))
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(get_session).delete(delete_session))
        .route("/sessions/:id/events", get(session_events))
        .route("/sessions/:id/filters/:dimension", put(replace_filter))
        .route("/sessions/:id/filters/:dimension/all", post(select_all))
        .route("/sessions/:id/filters/:dimension/none", post(select_none))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.bind_addr.parse()?;
    tracing::info!("Starting firefighter-dashboard on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
