mod analytics;
mod cadence;
mod config;
mod db;
mod errors;
mod llm_client;
mod meetings;
mod models;
mod outreach;
mod prospects;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cadence::engine::CadenceEngine;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::outreach::drafter::LlmEmailDrafter;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SDR API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url, config.database_max_connections).await?;

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.llm_max_tokens)?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Cadence engine is built from explicit configuration, never global state
    let engine = Arc::new(CadenceEngine::new(config.cadence.clone()));
    info!(
        "Cadence: follow-up offsets {:?} days, max {} follow-ups, fallback policy '{}'",
        engine.config().follow_up_days(),
        engine.config().max_follow_ups(),
        config.fallback_policy
    );

    // Build app state
    let state = AppState {
        db,
        llm: llm.clone(),
        config: config.clone(),
        engine,
        drafter: Arc::new(LlmEmailDrafter(llm)),
    };

    // Background cadence sweep
    let _scheduler = outreach::scheduler::spawn(state.clone(), config.scheduler_interval_secs);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS origins once a dashboard origin exists

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
