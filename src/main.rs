use axum::routing::{get, post};
use axum::Router;
use tracing_subscriber::EnvFilter;

use rag_search::api;
use rag_search::config::Config;
use rag_search::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!("LLM provider: {} ({})", config.llm.provider, config.llm.base_url);
    match &config.expander.base_url {
        Some(url) => tracing::info!("Expansion sidecar: {url}"),
        None => tracing::info!("Expansion sidecar not configured, sparse signal disabled"),
    }

    let state = AppState::new(config.clone())?;

    let app = Router::new()
        .route("/healthz", get(api::healthz))
        .route("/ingest", post(api::ingest::ingest))
        .route("/query", post(api::query::query))
        .route("/cache/clear", post(api::clear_cache))
        .route("/cache/stats", get(api::cache_stats))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
