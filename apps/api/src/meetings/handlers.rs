//! Axum route handlers for the Meetings API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::cadence::lifecycle::LifecycleSignal;
use crate::cadence::models::ProspectStatus;
use crate::errors::AppError;
use crate::llm_client::prompts::{EMAIL_JSON_SCHEMA, JSON_ONLY_SYSTEM, SENDER_VOICE_INSTRUCTION};
use crate::llm_client::PRECISE_TEMPERATURE;
use crate::meetings::prompts::SCHEDULING_EMAIL_PROMPT_TEMPLATE;
use crate::meetings::slots::{format_slot_options, propose_meeting_times};
use crate::models::meeting::MeetingRow;
use crate::outreach::dispatch::load_prospect;
use crate::outreach::drafter::{resolve_with_policy, validate_email, GenerationError, StructuredEmail};
use crate::prospects::handlers::apply_signal;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProposeMeetingResponse {
    pub prospect_id: Uuid,
    pub email: StructuredEmail,
    pub used_fallback: bool,
    pub available_times: Vec<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct BookMeetingRequest {
    pub prospect_id: Uuid,
    pub scheduled_time: DateTime<Utc>,
    pub meeting_link: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BookMeetingResponse {
    pub meeting: MeetingRow,
    pub status: ProspectStatus,
}

pub fn build_scheduling_prompt(name: &str, company: &str, slot_list: &str) -> String {
    SCHEDULING_EMAIL_PROMPT_TEMPLATE
        .replace("{voice}", SENDER_VOICE_INSTRUCTION)
        .replace("{schema}", EMAIL_JSON_SCHEMA)
        .replace("{slots}", slot_list)
        .replace("{name}", name)
        .replace("{company}", company)
}

pub fn fallback_scheduling_email(name: &str, company: &str, slot_list: &str) -> StructuredEmail {
    StructuredEmail {
        subject: format!("Meeting with {company} - {name}"),
        content: format!(
            "Hi {name},\n\n\
             Thanks for your interest! I'd love to show you how we can help {company} increase sales efficiency.\n\n\
             Which of these times work for a 30-minute call?\n\n\
             {slot_list}\n\n\
             Looking forward to our conversation!\n\n\
             Best,\nAI SDR"
        ),
    }
}

/// POST /api/v1/meetings/propose/:prospect_id
///
/// Proposes slots and drafts the scheduling email. Records nothing.
pub async fn handle_propose_meeting(
    State(state): State<AppState>,
    Path(prospect_id): Path<Uuid>,
) -> Result<Json<ProposeMeetingResponse>, AppError> {
    let prospect = {
        let mut conn = state.db.acquire().await?;
        load_prospect(&mut conn, prospect_id, false).await?
    };
    let status = prospect.lifecycle_status()?;
    if matches!(status, ProspectStatus::Converted | ProspectStatus::Unsubscribed) {
        return Err(AppError::Conflict(format!(
            "Prospect {prospect_id} is {status}; not proposing a meeting"
        )));
    }

    let available_times = propose_meeting_times(Utc::now());
    let slot_list = format_slot_options(&available_times);

    let prompt = build_scheduling_prompt(&prospect.name, &prospect.company, &slot_list);
    let result = state
        .llm
        .call_json::<StructuredEmail>(&prompt, JSON_ONLY_SYSTEM, PRECISE_TEMPERATURE)
        .await
        .map_err(GenerationError::from)
        .and_then(validate_email);

    let (email, used_fallback) = resolve_with_policy(result, state.config.fallback_policy, || {
        fallback_scheduling_email(&prospect.name, &prospect.company, &slot_list)
    })?;

    Ok(Json(ProposeMeetingResponse {
        prospect_id,
        email,
        used_fallback,
        available_times,
    }))
}

/// POST /api/v1/meetings
///
/// Books a meeting and moves the prospect to `meeting_scheduled`. Booking a
/// second meeting for an already-scheduled prospect keeps the status as is.
pub async fn handle_book_meeting(
    State(state): State<AppState>,
    Json(req): Json<BookMeetingRequest>,
) -> Result<(StatusCode, Json<BookMeetingResponse>), AppError> {
    if req.scheduled_time <= Utc::now() {
        return Err(AppError::Validation(
            "scheduled_time must be in the future".to_string(),
        ));
    }

    let mut tx = state.db.begin().await?;
    let prospect = load_prospect(&mut tx, req.prospect_id, true).await?;
    let current = prospect.lifecycle_status()?;

    let status = if current == ProspectStatus::MeetingScheduled {
        current
    } else {
        apply_signal(&mut tx, req.prospect_id, current, LifecycleSignal::MeetingBooked).await?
    };

    let meeting = sqlx::query_as::<_, MeetingRow>(
        r#"
        INSERT INTO meetings (prospect_id, scheduled_time, meeting_link)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(req.prospect_id)
    .bind(req.scheduled_time)
    .bind(&req.meeting_link)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(
        "Booked meeting {} for prospect {} at {}",
        meeting.id, req.prospect_id, req.scheduled_time
    );

    Ok((
        StatusCode::CREATED,
        Json(BookMeetingResponse { meeting, status }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_email_lists_slots() {
        let slots = "1. Tuesday, March 05 at 10:00 AM\n2. Tuesday, March 05 at 02:00 PM";
        let email = fallback_scheduling_email("Dana", "Northwind", slots);
        assert_eq!(email.subject, "Meeting with Northwind - Dana");
        assert!(email.content.contains(slots));
        assert!(email.content.contains("30-minute call"));
    }

    #[test]
    fn test_scheduling_prompt_fills_placeholders() {
        let prompt = build_scheduling_prompt("Dana", "Northwind", "1. Tuesday");
        assert!(prompt.contains("meeting with Dana from Northwind"));
        assert!(prompt.contains("1. Tuesday"));
        assert!(!prompt.contains("{slots}"));
        assert!(!prompt.contains("{voice}"));
    }

    #[test]
    fn test_book_request_parses_rfc3339() {
        let json = serde_json::json!({
            "prospect_id": Uuid::new_v4(),
            "scheduled_time": "2030-01-15T14:00:00Z"
        });
        let req: BookMeetingRequest = serde_json::from_value(json).unwrap();
        assert!(req.meeting_link.is_none());
    }
}
