use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::cadence::engine::NextAction;
use crate::cadence::lifecycle::{validate_transition, LifecycleSignal};
use crate::cadence::models::ProspectStatus;
use crate::errors::AppError;
use crate::models::outreach::OutreachEventRow;
use crate::models::prospect::ProspectRow;
use crate::outreach::dispatch::{evaluate, load_events, load_prospect};
use crate::prospects::research::{
    research_prospect, validate_create_request, CreateProspectRequest, ResearchReport,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateProspectResponse {
    pub prospect: ProspectRow,
    pub research: ResearchReport,
}

#[derive(Debug, Serialize)]
pub struct NextActionResponse {
    pub prospect_id: Uuid,
    pub status: ProspectStatus,
    pub events_recorded: usize,
    pub decision: NextAction,
    pub evaluated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SignalRequest {
    pub signal: LifecycleSignal,
}

#[derive(Debug, Serialize)]
pub struct SignalResponse {
    pub prospect_id: Uuid,
    pub previous_status: ProspectStatus,
    pub status: ProspectStatus,
}

/// POST /api/v1/prospects
pub async fn handle_create_prospect(
    State(state): State<AppState>,
    Json(mut req): Json<CreateProspectRequest>,
) -> Result<(StatusCode, Json<CreateProspectResponse>), AppError> {
    validate_create_request(&mut req)?;
    ensure_email_available(&state.db, &req.email).await?;

    let research = research_prospect(&state.llm, state.config.fallback_policy, &req).await?;

    let prospect = sqlx::query_as::<_, ProspectRow>(
        r#"
        INSERT INTO prospects
            (name, email, company, title, linkedin_url, phone, industry, company_size, pain_points, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(&req.name)
    .bind(&req.email)
    .bind(&req.company)
    .bind(&req.title)
    .bind(&research.linkedin_url)
    .bind(&req.phone)
    .bind(&req.industry)
    .bind(&req.company_size)
    .bind(&research.pain_points)
    .bind(ProspectStatus::New.as_str())
    .fetch_one(&state.db)
    .await
    .map_err(|e| match e {
        // lost a race with a concurrent create for the same address
        sqlx::Error::Database(db) if db.is_unique_violation() => duplicate_email(&req.email),
        other => AppError::Database(other),
    })?;

    info!("Created prospect {} ({})", prospect.id, prospect.company);

    Ok((
        StatusCode::CREATED,
        Json(CreateProspectResponse { prospect, research }),
    ))
}

/// Rejects a known address before research spends a model call on it.
async fn ensure_email_available(db: &PgPool, email: &str) -> Result<(), AppError> {
    let taken: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM prospects WHERE email = $1)")
            .bind(email)
            .fetch_one(db)
            .await?;
    if taken {
        return Err(duplicate_email(email));
    }
    Ok(())
}

fn duplicate_email(email: &str) -> AppError {
    AppError::Conflict(format!("A prospect with email {email} already exists"))
}

/// GET /api/v1/prospects?status=contacted
pub async fn handle_list_prospects(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ProspectRow>>, AppError> {
    let prospects = match query.status {
        Some(raw) => {
            let status: ProspectStatus = raw.parse().map_err(AppError::Validation)?;
            sqlx::query_as::<_, ProspectRow>(
                "SELECT * FROM prospects WHERE status = $1 ORDER BY created_at DESC",
            )
            .bind(status.as_str())
            .fetch_all(&state.db)
            .await?
        }
        None => {
            sqlx::query_as::<_, ProspectRow>("SELECT * FROM prospects ORDER BY created_at DESC")
                .fetch_all(&state.db)
                .await?
        }
    };
    Ok(Json(prospects))
}

/// GET /api/v1/prospects/:id
pub async fn handle_get_prospect(
    State(state): State<AppState>,
    Path(prospect_id): Path<Uuid>,
) -> Result<Json<ProspectRow>, AppError> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(load_prospect(&mut conn, prospect_id, false).await?))
}

/// GET /api/v1/prospects/:id/events
pub async fn handle_get_events(
    State(state): State<AppState>,
    Path(prospect_id): Path<Uuid>,
) -> Result<Json<Vec<OutreachEventRow>>, AppError> {
    let mut conn = state.db.acquire().await?;
    // 404 for unknown prospects rather than an empty log
    load_prospect(&mut conn, prospect_id, false).await?;
    Ok(Json(load_events(&mut conn, prospect_id).await?))
}

/// GET /api/v1/prospects/:id/next-action
///
/// Reports what the cadence engine would do right now. Records nothing.
pub async fn handle_next_action(
    State(state): State<AppState>,
    Path(prospect_id): Path<Uuid>,
) -> Result<Json<NextActionResponse>, AppError> {
    let now = Utc::now();
    let mut conn = state.db.acquire().await?;
    let snapshot = evaluate(&mut conn, &state.engine, prospect_id, false, now).await?;
    Ok(Json(NextActionResponse {
        prospect_id,
        status: snapshot.status,
        events_recorded: snapshot.events.len(),
        decision: snapshot.decision,
        evaluated_at: now,
    }))
}

/// POST /api/v1/prospects/:id/signals
///
/// Applies an external lifecycle signal. A reply also flags the most recent
/// outreach event so the log itself records that the prospect answered.
pub async fn handle_signal(
    State(state): State<AppState>,
    Path(prospect_id): Path<Uuid>,
    Json(req): Json<SignalRequest>,
) -> Result<Json<SignalResponse>, AppError> {
    let mut tx = state.db.begin().await?;
    let prospect = load_prospect(&mut tx, prospect_id, true).await?;
    let previous_status = prospect.lifecycle_status()?;
    let status = apply_signal(&mut tx, prospect_id, previous_status, req.signal).await?;
    tx.commit().await?;

    info!("Prospect {prospect_id}: {previous_status} -> {status} ({:?})", req.signal);

    Ok(Json(SignalResponse {
        prospect_id,
        previous_status,
        status,
    }))
}

/// Validates and persists a signal-driven transition inside the caller's transaction.
pub async fn apply_signal(
    conn: &mut sqlx::PgConnection,
    prospect_id: Uuid,
    current: ProspectStatus,
    signal: LifecycleSignal,
) -> Result<ProspectStatus, AppError> {
    let next = signal.target_status();
    validate_transition(current, next)?;

    sqlx::query("UPDATE prospects SET status = $1 WHERE id = $2")
        .bind(next.as_str())
        .bind(prospect_id)
        .execute(&mut *conn)
        .await?;

    if signal == LifecycleSignal::Reply {
        sqlx::query(
            r#"
            UPDATE outreach_events SET replied = TRUE
            WHERE id = (
                SELECT id FROM outreach_events
                WHERE prospect_id = $1
                ORDER BY sequence DESC
                LIMIT 1
            )
            "#,
        )
        .bind(prospect_id)
        .execute(&mut *conn)
        .await?;
    }

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_email_is_conflict() {
        let err = duplicate_email("dana@northwind.io");
        assert!(matches!(err, AppError::Conflict(ref msg) if msg.contains("dana@northwind.io")));
    }
}
