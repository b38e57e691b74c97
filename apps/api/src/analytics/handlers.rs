use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::cadence::models::ProspectStatus;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AnalyticsReport {
    pub total_prospects: i64,
    pub total_emails: i64,
    pub total_meetings: i64,
    pub replied_emails: i64,
    pub fallback_emails: i64,
    /// replied / emails × 100, two decimals
    pub engagement_rate: f64,
    pub prospects_by_status: BTreeMap<String, i64>,
}

/// Percentage of emails that received a reply, rounded to two decimals.
pub fn engagement_rate(replied: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let rate = replied as f64 / total as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}

/// Every known status appears, zero-filled; unknown stored values are kept as-is.
pub fn status_breakdown(rows: Vec<(String, i64)>) -> BTreeMap<String, i64> {
    let mut out: BTreeMap<String, i64> = ProspectStatus::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), 0))
        .collect();
    for (status, count) in rows {
        *out.entry(status).or_insert(0) += count;
    }
    out
}

/// GET /api/v1/analytics
pub async fn handle_analytics(
    State(state): State<AppState>,
) -> Result<Json<AnalyticsReport>, AppError> {
    let total_prospects: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM prospects")
        .fetch_one(&state.db)
        .await?;

    let (total_emails, replied_emails, fallback_emails): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*),
               COUNT(*) FILTER (WHERE replied),
               COUNT(*) FILTER (WHERE used_fallback)
        FROM outreach_events
        "#,
    )
    .fetch_one(&state.db)
    .await?;

    let total_meetings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM meetings")
        .fetch_one(&state.db)
        .await?;

    let by_status: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) FROM prospects GROUP BY status")
            .fetch_all(&state.db)
            .await?;

    Ok(Json(AnalyticsReport {
        total_prospects,
        total_emails,
        total_meetings,
        replied_emails,
        fallback_emails,
        engagement_rate: engagement_rate(replied_emails, total_emails),
        prospects_by_status: status_breakdown(by_status),
    }))
}
