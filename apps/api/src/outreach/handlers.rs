//! Axum route handlers for the Outreach API.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::outreach::dispatch::{dispatch_next, load_prospect, parse_requested_email_type, DispatchResult};
use crate::outreach::drafter::{draft_with_policy, DraftOutcome, ProspectProfile};
use crate::outreach::scheduler::{run_sweep, SweepReport};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DraftRequest {
    pub prospect_id: Uuid,
    #[serde(default = "default_email_type")]
    pub email_type: String,
}

fn default_email_type() -> String {
    "initial".to_string()
}

/// POST /api/v1/outreach/:prospect_id/dispatch
///
/// Runs one cadence cycle: engine decision → draft → record. Responds with the
/// decision even when nothing is due.
pub async fn handle_dispatch(
    State(state): State<AppState>,
    Path(prospect_id): Path<Uuid>,
) -> Result<Json<DispatchResult>, AppError> {
    let result = dispatch_next(
        &state.db,
        &state.engine,
        state.drafter.as_ref(),
        state.config.fallback_policy,
        prospect_id,
        Utc::now(),
    )
    .await?;
    Ok(Json(result))
}

/// POST /api/v1/outreach/draft
///
/// Drafts an email of an explicit type without recording anything.
pub async fn handle_draft(
    State(state): State<AppState>,
    Json(request): Json<DraftRequest>,
) -> Result<Json<DraftOutcome>, AppError> {
    let email_type = parse_requested_email_type(&request.email_type, &state.engine)?;

    let mut conn = state.db.acquire().await?;
    let prospect = load_prospect(&mut conn, request.prospect_id, false).await?;
    drop(conn);

    let profile = ProspectProfile::from(&prospect);
    let outcome = draft_with_policy(
        state.drafter.as_ref(),
        state.config.fallback_policy,
        &profile,
        email_type,
    )
    .await?;
    Ok(Json(outcome))
}

/// POST /api/v1/outreach/sweep
///
/// Runs the scheduler's sweep immediately and returns its tally.
pub async fn handle_sweep(State(state): State<AppState>) -> Result<Json<SweepReport>, AppError> {
    Ok(Json(run_sweep(&state).await?))
}
