//! Outreach dispatch: one evaluate -> draft -> record cycle for a prospect.
//!
//! Flow:
//! 1. Read prospect + event log (no lock) and ask the cadence engine what is due.
//! 2. Draft the email outside any transaction (the LLM call may be slow).
//! 3. In a transaction holding `FOR UPDATE` on the prospect row, reload the log,
//!    re-run the engine, and only record the send if the decision is unchanged.
//!
//! The row lock plus the `UNIQUE (prospect_id, sequence)` constraint is what
//! serializes concurrent dispatchers for the same prospect. The engine itself
//! stays side-effect free.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::cadence::engine::{CadenceEngine, CadenceError, NextAction};
use crate::cadence::lifecycle::{status_after_send, validate_transition};
use crate::cadence::models::{EmailType, OutreachEvent, ProspectStatus};
use crate::errors::AppError;
use crate::models::outreach::OutreachEventRow;
use crate::models::prospect::ProspectRow;
use crate::outreach::drafter::{draft_with_policy, DraftOutcome, EmailDrafter, FallbackPolicy, ProspectProfile};

/// A prospect, its log, and what the engine decided at `now`.
#[derive(Debug, Clone)]
pub struct CadenceSnapshot {
    pub prospect: ProspectRow,
    pub status: ProspectStatus,
    pub events: Vec<OutreachEventRow>,
    pub decision: NextAction,
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatchResult {
    pub prospect_id: Uuid,
    pub decision: NextAction,
    pub status: ProspectStatus,
    /// The recorded send, when the decision called for one.
    pub sent: Option<OutreachEventRow>,
    pub used_fallback: bool,
}

pub async fn load_prospect(
    conn: &mut PgConnection,
    prospect_id: Uuid,
    for_update: bool,
) -> Result<ProspectRow, AppError> {
    let sql = if for_update {
        "SELECT * FROM prospects WHERE id = $1 FOR UPDATE"
    } else {
        "SELECT * FROM prospects WHERE id = $1"
    };
    sqlx::query_as::<_, ProspectRow>(sql)
        .bind(prospect_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Prospect {prospect_id} not found")))
}

/// Log order is the sequence number alone; timestamps are left for the
/// engine to validate.
const EVENT_LOG_SQL: &str =
    "SELECT * FROM outreach_events WHERE prospect_id = $1 ORDER BY sequence ASC";

/// Returns the outreach log for a prospect in sequence order.
pub async fn load_events(
    conn: &mut PgConnection,
    prospect_id: Uuid,
) -> Result<Vec<OutreachEventRow>, sqlx::Error> {
    sqlx::query_as::<_, OutreachEventRow>(EVENT_LOG_SQL)
        .bind(prospect_id)
        .fetch_all(&mut *conn)
        .await
}

pub fn to_cadence_events(rows: &[OutreachEventRow]) -> Result<Vec<OutreachEvent>, CadenceError> {
    rows.iter().map(OutreachEvent::try_from).collect()
}

/// Loads state and runs the engine. Read-only.
pub async fn evaluate(
    conn: &mut PgConnection,
    engine: &CadenceEngine,
    prospect_id: Uuid,
    for_update: bool,
    now: DateTime<Utc>,
) -> Result<CadenceSnapshot, AppError> {
    let prospect = load_prospect(conn, prospect_id, for_update).await?;
    let status = prospect.lifecycle_status()?;
    let events = load_events(conn, prospect_id).await?;
    let decision = engine.next_action(status, &to_cadence_events(&events)?, now)?;
    Ok(CadenceSnapshot {
        prospect,
        status,
        events,
        decision,
    })
}

/// Runs one dispatch cycle for a prospect. See module docs for the locking protocol.
pub async fn dispatch_next(
    pool: &PgPool,
    engine: &CadenceEngine,
    drafter: &dyn EmailDrafter,
    policy: FallbackPolicy,
    prospect_id: Uuid,
    now: DateTime<Utc>,
) -> Result<DispatchResult, AppError> {
    let snapshot = {
        let mut conn = pool.acquire().await?;
        evaluate(&mut conn, engine, prospect_id, false, now).await?
    };

    let Some(email_type) = snapshot.decision.email_type() else {
        debug!(
            "Prospect {prospect_id}: no outreach due ({:?})",
            snapshot.decision
        );
        return Ok(DispatchResult {
            prospect_id,
            decision: snapshot.decision,
            status: snapshot.status,
            sent: None,
            used_fallback: false,
        });
    };

    let profile = ProspectProfile::from(&snapshot.prospect);
    let draft = draft_with_policy(drafter, policy, &profile, email_type).await?;

    let mut tx = pool.begin().await?;
    let locked = evaluate(&mut tx, engine, prospect_id, true, now).await?;

    // On error, dropping `tx` rolls back and releases the lock.
    confirm_locked_decision(prospect_id, email_type, &locked.decision)?;

    let sent = record_send(&mut tx, prospect_id, &draft, now).await?;

    let status = match status_change_after_send(locked.status)? {
        Some(next) => {
            sqlx::query("UPDATE prospects SET status = $1 WHERE id = $2")
                .bind(next.as_str())
                .bind(prospect_id)
                .execute(&mut *tx)
                .await?;
            next
        }
        None => locked.status,
    };

    tx.commit().await?;

    info!(
        "Recorded {} for prospect {} (fallback={}, status={})",
        email_type, prospect_id, draft.used_fallback, status
    );

    Ok(DispatchResult {
        prospect_id,
        decision: locked.decision,
        status,
        sent: Some(sent),
        used_fallback: draft.used_fallback,
    })
}

/// The decision re-made under the row lock must call for the same email that
/// was drafted. Anything else means another writer got there first.
pub fn confirm_locked_decision(
    prospect_id: Uuid,
    drafted: EmailType,
    locked: &NextAction,
) -> Result<(), AppError> {
    match locked.email_type() {
        Some(due) if due == drafted => Ok(()),
        Some(due) => Err(AppError::Conflict(format!(
            "Outreach state for prospect {prospect_id} changed while drafting {drafted}; {due} is now due"
        ))),
        None => Err(AppError::Conflict(format!(
            "Outreach state for prospect {prospect_id} changed while drafting {drafted}; nothing is due"
        ))),
    }
}

/// Status to persist after a recorded send, checked against the lifecycle table.
pub fn status_change_after_send(
    current: ProspectStatus,
) -> Result<Option<ProspectStatus>, AppError> {
    match status_after_send(current) {
        Some(next) => {
            validate_transition(current, next)?;
            Ok(Some(next))
        }
        None => Ok(None),
    }
}

async fn record_send(
    conn: &mut PgConnection,
    prospect_id: Uuid,
    draft: &DraftOutcome,
    sent_at: DateTime<Utc>,
) -> Result<OutreachEventRow, AppError> {
    let row = sqlx::query_as::<_, OutreachEventRow>(
        r#"
        INSERT INTO outreach_events
            (prospect_id, email_type, sequence, subject, content, used_fallback, sent_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(prospect_id)
    .bind(draft.email_type.to_string())
    .bind(i16::from(draft.email_type.sequence()))
    .bind(&draft.email.subject)
    .bind(&draft.email.content)
    .bind(draft.used_fallback)
    .bind(sent_at)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(format!(
            "{} already recorded for prospect {prospect_id}",
            draft.email_type
        )),
        other => AppError::Database(other),
    })?;
    Ok(row)
}

/// Parses and validates an explicit email type against the configured cadence.
pub fn parse_requested_email_type(
    raw: &str,
    engine: &CadenceEngine,
) -> Result<EmailType, AppError> {
    let email_type: EmailType = raw.parse().map_err(AppError::Validation)?;
    if usize::from(email_type.sequence()) > engine.config().max_follow_ups() {
        return Err(AppError::Validation(format!(
            "{email_type} exceeds the configured maximum of {} follow-ups",
            engine.config().max_follow_ups()
        )));
    }
    Ok(email_type)
}
