//! Cadence Engine: decides whether and what outreach is due next for a prospect.
//!
//! The engine is a pure function over `(status, events, now)`: no I/O, no clock
//! reads, no shared state. Callers fetch the event log, ask for the next action,
//! and are responsible for serializing per-prospect read-modify-write cycles.
//!
//! Algorithm:
//! 1. Terminal status → `NoAction(TerminalStatus)`
//! 2. Empty log → `SendInitial`
//! 3. k follow-ups already sent, k ≥ max → `NoAction(SequenceExhausted)`
//! 4. eligible_at = initial.sent_at + follow_up_days[k]
//! 5. now ≥ eligible_at → `SendFollowUp(k + 1)`, otherwise `NoAction(NotYetDue)`

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::cadence::models::{EmailType, OutreachEvent, ProspectStatus};

pub const DEFAULT_FOLLOW_UP_DAYS: [u32; 5] = [2, 5, 10, 15, 21];
pub const DEFAULT_MAX_FOLLOW_UPS: usize = 5;
/// Upper bound on any single follow-up offset (ten years).
pub const MAX_FOLLOW_UP_OFFSET_DAYS: u32 = 3650;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CadenceError {
    /// The event log is inconsistent. Treat as a data-integrity alarm, never retry.
    #[error("Invalid outreach history: {0}")]
    InvalidHistory(String),

    #[error("Invalid cadence configuration: {0}")]
    InvalidConfig(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Follow-up offsets (days after the initial send) and the follow-up cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CadenceConfig {
    follow_up_days: Vec<u32>,
    max_follow_ups: usize,
}

impl CadenceConfig {
    /// Offsets must be positive, at most `MAX_FOLLOW_UP_OFFSET_DAYS` and
    /// strictly increasing, and there must be one per allowed follow-up.
    pub fn new(follow_up_days: Vec<u32>, max_follow_ups: usize) -> Result<Self, CadenceError> {
        if max_follow_ups == 0 {
            return Err(CadenceError::InvalidConfig(
                "max_follow_ups must be at least 1".to_string(),
            ));
        }
        if max_follow_ups > u8::MAX as usize {
            return Err(CadenceError::InvalidConfig(format!(
                "max_follow_ups must be at most {}",
                u8::MAX
            )));
        }
        if follow_up_days.len() < max_follow_ups {
            return Err(CadenceError::InvalidConfig(format!(
                "{} follow-up offsets configured but max_follow_ups is {max_follow_ups}",
                follow_up_days.len()
            )));
        }
        if follow_up_days.first() == Some(&0) {
            return Err(CadenceError::InvalidConfig(
                "follow-up offsets must be greater than zero".to_string(),
            ));
        }
        if let Some(too_far) = follow_up_days
            .iter()
            .find(|d| **d > MAX_FOLLOW_UP_OFFSET_DAYS)
        {
            return Err(CadenceError::InvalidConfig(format!(
                "follow-up offset of {too_far} days exceeds the limit of {MAX_FOLLOW_UP_OFFSET_DAYS}"
            )));
        }
        if follow_up_days.windows(2).any(|w| w[1] <= w[0]) {
            return Err(CadenceError::InvalidConfig(format!(
                "follow-up offsets must be strictly increasing: {follow_up_days:?}"
            )));
        }
        Ok(Self {
            follow_up_days,
            max_follow_ups,
        })
    }

    pub fn follow_up_days(&self) -> &[u32] {
        &self.follow_up_days
    }

    pub fn max_follow_ups(&self) -> usize {
        self.max_follow_ups
    }
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            follow_up_days: DEFAULT_FOLLOW_UP_DAYS.to_vec(),
            max_follow_ups: DEFAULT_MAX_FOLLOW_UPS,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Decisions
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoActionReason {
    TerminalStatus,
    /// An event in the log is flagged as replied even though the cached status lags.
    ReplyRecorded,
    SequenceExhausted,
    NotYetDue,
}

impl fmt::Display for NoActionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NoActionReason::TerminalStatus => "terminal status",
            NoActionReason::ReplyRecorded => "reply recorded",
            NoActionReason::SequenceExhausted => "sequence exhausted",
            NoActionReason::NotYetDue => "not yet due",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum NextAction {
    NoAction {
        reason: NoActionReason,
        /// Only set for `NotYetDue`, so the caller can schedule the next check.
        eligible_at: Option<DateTime<Utc>>,
    },
    SendInitial,
    SendFollowUp {
        number: u8,
        eligible_at: DateTime<Utc>,
    },
}

impl NextAction {
    fn none(reason: NoActionReason) -> Self {
        NextAction::NoAction {
            reason,
            eligible_at: None,
        }
    }

    /// The email to send, if this decision calls for one.
    pub fn email_type(&self) -> Option<EmailType> {
        match self {
            NextAction::NoAction { .. } => None,
            NextAction::SendInitial => Some(EmailType::Initial),
            NextAction::SendFollowUp { number, .. } => Some(EmailType::FollowUp(*number)),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct CadenceEngine {
    config: CadenceConfig,
}

impl CadenceEngine {
    pub fn new(config: CadenceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CadenceConfig {
        &self.config
    }

    /// Computes the next outreach action. `events` must be ordered oldest first.
    pub fn next_action(
        &self,
        status: ProspectStatus,
        events: &[OutreachEvent],
        now: DateTime<Utc>,
    ) -> Result<NextAction, CadenceError> {
        if status.is_terminal() {
            return Ok(NextAction::none(NoActionReason::TerminalStatus));
        }

        self.validate_history(status, events)?;

        let Some(initial) = events.first() else {
            return Ok(NextAction::SendInitial);
        };

        if events.iter().any(|e| e.replied) {
            return Ok(NextAction::none(NoActionReason::ReplyRecorded));
        }

        let sent_follow_ups = events.len() - 1;
        if sent_follow_ups >= self.config.max_follow_ups {
            return Ok(NextAction::none(NoActionReason::SequenceExhausted));
        }

        let offset = self.config.follow_up_days[sent_follow_ups];
        let eligible_at = initial
            .sent_at
            .checked_add_signed(Duration::days(i64::from(offset)))
            .ok_or_else(|| {
                CadenceError::InvalidHistory(format!(
                    "initial sent at {} plus {offset} days is out of range",
                    initial.sent_at
                ))
            })?;

        if now >= eligible_at {
            Ok(NextAction::SendFollowUp {
                // bounded by max_follow_ups, which the config caps at u8::MAX
                number: (sent_follow_ups + 1) as u8,
                eligible_at,
            })
        } else {
            Ok(NextAction::NoAction {
                reason: NoActionReason::NotYetDue,
                eligible_at: Some(eligible_at),
            })
        }
    }

    /// Rejects any log that is not exactly `initial, follow_up_1, …, follow_up_k`
    /// with non-decreasing timestamps. Never repairs the sequence.
    pub fn validate_history(
        &self,
        status: ProspectStatus,
        events: &[OutreachEvent],
    ) -> Result<(), CadenceError> {
        if events.is_empty() {
            return Ok(());
        }

        if status == ProspectStatus::New {
            return Err(CadenceError::InvalidHistory(format!(
                "status is 'new' but {} outreach events are recorded",
                events.len()
            )));
        }

        for (position, event) in events.iter().enumerate() {
            let sequence = usize::from(event.email_type.sequence());

            if sequence != position {
                let message = match event.email_type {
                    EmailType::Initial => {
                        format!("duplicate initial email at position {position}")
                    }
                    _ if position == 0 => {
                        format!("log starts with {} instead of initial", event.email_type)
                    }
                    _ if sequence < position => {
                        format!("duplicate or out-of-order {} at position {position}", event.email_type)
                    }
                    _ => format!(
                        "gap in sequence: expected follow_up_{position}, found {}",
                        event.email_type
                    ),
                };
                return Err(CadenceError::InvalidHistory(message));
            }

            if sequence > self.config.max_follow_ups {
                return Err(CadenceError::InvalidHistory(format!(
                    "{} exceeds the configured maximum of {} follow-ups",
                    event.email_type, self.config.max_follow_ups
                )));
            }
        }

        if let Some(pair) = events.windows(2).find(|w| w[1].sent_at < w[0].sent_at) {
            return Err(CadenceError::InvalidHistory(format!(
                "{} sent at {} precedes {} sent at {}",
                pair[1].email_type, pair[1].sent_at, pair[0].email_type, pair[0].sent_at
            )));
        }

        Ok(())
    }
}
