use std::sync::Arc;

use sqlx::PgPool;

use crate::cadence::engine::CadenceEngine;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::outreach::drafter::EmailDrafter;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub llm: LlmClient,
    pub config: Config,
    /// Built once from `config.cadence`; pure, so sharing it needs no locking.
    pub engine: Arc<CadenceEngine>,
    /// Pluggable email drafter. Default: LlmEmailDrafter.
    pub drafter: Arc<dyn EmailDrafter>,
}
