//! Background cadence sweep.
//!
//! Every tick, each prospect that is not in a terminal status gets one
//! dispatch cycle. Failures are logged per prospect and never stop the loop.

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::cadence::engine::CadenceError;
use crate::cadence::models::ProspectStatus;
use crate::errors::AppError;
use crate::outreach::dispatch::dispatch_next;
use crate::state::AppState;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub examined: usize,
    pub sent: usize,
    pub idle: usize,
    /// Lost a race with another dispatcher; picked up again next tick.
    pub skipped: usize,
    /// Prospects whose outreach log failed validation.
    pub integrity_alarms: Vec<Uuid>,
    pub failed: usize,
}

impl SweepReport {
    fn record(&mut self, prospect_id: Uuid, outcome: &Result<bool, AppError>) {
        self.examined += 1;
        match outcome {
            Ok(true) => self.sent += 1,
            Ok(false) => self.idle += 1,
            Err(AppError::Conflict(_)) => self.skipped += 1,
            Err(AppError::Cadence(CadenceError::InvalidHistory(_))) => {
                self.integrity_alarms.push(prospect_id)
            }
            Err(_) => self.failed += 1,
        }
    }
}

/// Statuses the sweep visits.
pub fn active_statuses() -> Vec<String> {
    ProspectStatus::ALL
        .into_iter()
        .filter(|s| !s.is_terminal())
        .map(|s| s.as_str().to_string())
        .collect()
}

/// Starts the periodic sweep. Returns `None` when the interval is 0.
pub fn spawn(state: AppState, interval_secs: u64) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        info!("Cadence scheduler disabled (SCHEDULER_INTERVAL_SECS=0)");
        return None;
    }

    info!("Cadence scheduler running every {interval_secs}s");
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            match run_sweep(&state).await {
                Ok(report) => info!(
                    "Cadence sweep: examined={} sent={} idle={} skipped={} alarms={} failed={}",
                    report.examined,
                    report.sent,
                    report.idle,
                    report.skipped,
                    report.integrity_alarms.len(),
                    report.failed
                ),
                Err(e) => error!("Cadence sweep failed to start: {e}"),
            }
        }
    }))
}

/// Runs one dispatch cycle for every active prospect.
pub async fn run_sweep(state: &AppState) -> Result<SweepReport, AppError> {
    let prospect_ids: Vec<Uuid> = sqlx::query_scalar(
        "SELECT id FROM prospects WHERE status = ANY($1) ORDER BY created_at ASC",
    )
    .bind(active_statuses())
    .fetch_all(&state.db)
    .await?;

    let mut report = SweepReport::default();
    for prospect_id in prospect_ids {
        let outcome = dispatch_next(
            &state.db,
            &state.engine,
            state.drafter.as_ref(),
            state.config.fallback_policy,
            prospect_id,
            Utc::now(),
        )
        .await
        .map(|result| result.sent.is_some());

        match &outcome {
            Err(AppError::Cadence(CadenceError::InvalidHistory(msg))) => {
                error!("Prospect {prospect_id}: outreach history failed validation: {msg}")
            }
            Err(AppError::Conflict(msg)) => info!("Prospect {prospect_id}: {msg}"),
            Err(e) => warn!("Prospect {prospect_id}: dispatch failed: {e}"),
            Ok(_) => {}
        }
        report.record(prospect_id, &outcome);
    }

    Ok(report)
}
