use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skyplan_api::config::ApiConfig;
use skyplan_api::router::create_router;
use skyplan_api::state::AppState;
use skyplan_core::ports::DocumentStore;
use skyplan_store::{FileDocumentStore, MemoryDocumentStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skyplan_api=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::load()?;

    tracing::info!(port = config.port, "Starting Skyplan API server");

    let store: Arc<dyn DocumentStore> = match &config.data_dir {
        Some(dir) => {
            tracing::info!(data_dir = %dir, "Using file-backed storage");
            Arc::new(FileDocumentStore::open(dir)?)
        }
        None => {
            tracing::info!("Using in-memory storage (set SKYPLAN_DATA_DIR to persist)");
            Arc::new(MemoryDocumentStore::new())
        }
    };

    let state = Arc::new(AppState::new(store));

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .context("invalid CORS origin")?,
        )
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
