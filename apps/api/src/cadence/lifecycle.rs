//! Prospect lifecycle state machine.
//!
//! new -> contacted -> replied -> meeting_scheduled -> converted
//! Unsubscribe is allowed from every non-final state. Steps may be skipped
//! forward (a contacted prospect can book a meeting without a recorded reply),
//! never backward. `contacted` is only entered by a successful send; every
//! other move comes from an external signal.

use serde::Deserialize;
use thiserror::Error;

use crate::cadence::models::ProspectStatus;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Invalid status transition: {0} -> {1}")]
    InvalidTransition(ProspectStatus, ProspectStatus),
}

/// External events that move a prospect through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleSignal {
    Reply,
    MeetingBooked,
    Converted,
    Unsubscribe,
}

impl LifecycleSignal {
    pub fn target_status(&self) -> ProspectStatus {
        match self {
            LifecycleSignal::Reply => ProspectStatus::Replied,
            LifecycleSignal::MeetingBooked => ProspectStatus::MeetingScheduled,
            LifecycleSignal::Converted => ProspectStatus::Converted,
            LifecycleSignal::Unsubscribe => ProspectStatus::Unsubscribed,
        }
    }
}

/// Validate that a status transition is allowed.
pub fn validate_transition(from: ProspectStatus, to: ProspectStatus) -> Result<(), LifecycleError> {
    use ProspectStatus::*;

    let valid = matches!(
        (from, to),
        (New, Contacted)
            | (New, Unsubscribed)
            | (Contacted, Replied)
            | (Contacted, MeetingScheduled)
            | (Contacted, Converted)
            | (Contacted, Unsubscribed)
            | (Replied, MeetingScheduled)
            | (Replied, Converted)
            | (Replied, Unsubscribed)
            | (MeetingScheduled, Converted)
            | (MeetingScheduled, Unsubscribed)
    );

    if valid {
        Ok(())
    } else {
        Err(LifecycleError::InvalidTransition(from, to))
    }
}

/// Status a prospect should hold after a successful send, if it changes.
/// Only the first send moves the prospect; follow-ups leave status alone.
pub fn status_after_send(current: ProspectStatus) -> Option<ProspectStatus> {
    (current == ProspectStatus::New).then_some(ProspectStatus::Contacted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cadence::models::ProspectStatus::*;

    #[test]
    fn test_new_to_contacted() {
        assert!(validate_transition(New, Contacted).is_ok());
    }

    #[test]
    fn test_contacted_to_each_terminal() {
        for to in [Replied, MeetingScheduled, Converted, Unsubscribed] {
            assert!(validate_transition(Contacted, to).is_ok(), "contacted -> {to}");
        }
    }

    #[test]
    fn test_replied_can_progress() {
        assert!(validate_transition(Replied, MeetingScheduled).is_ok());
        assert!(validate_transition(Replied, Converted).is_ok());
    }

    #[test]
    fn test_unsubscribe_before_first_send() {
        assert!(validate_transition(New, Unsubscribed).is_ok());
    }

    #[test]
    fn test_new_cannot_skip_to_replied() {
        assert_eq!(
            validate_transition(New, Replied),
            Err(LifecycleError::InvalidTransition(New, Replied))
        );
    }

    #[test]
    fn test_no_backward_moves() {
        assert!(validate_transition(Contacted, New).is_err());
        assert!(validate_transition(Replied, Contacted).is_err());
        assert!(validate_transition(MeetingScheduled, Replied).is_err());
    }

    #[test]
    fn test_final_states_are_closed() {
        for to in ProspectStatus::ALL {
            assert!(validate_transition(Converted, to).is_err(), "converted -> {to}");
            assert!(validate_transition(Unsubscribed, to).is_err(), "unsubscribed -> {to}");
        }
    }

    #[test]
    fn test_self_transitions_invalid() {
        for status in ProspectStatus::ALL {
            assert!(validate_transition(status, status).is_err());
        }
    }

    #[test]
    fn test_only_first_send_changes_status() {
        assert_eq!(status_after_send(New), Some(Contacted));
        assert_eq!(status_after_send(Contacted), None);
    }

    #[test]
    fn test_signal_targets() {
        assert_eq!(LifecycleSignal::Reply.target_status(), Replied);
        assert_eq!(LifecycleSignal::MeetingBooked.target_status(), MeetingScheduled);
        let signal: LifecycleSignal = serde_json::from_str(r#""meeting_booked""#).unwrap();
        assert_eq!(signal, LifecycleSignal::MeetingBooked);
    }

    #[test]
    fn test_error_display() {
        let err = LifecycleError::InvalidTransition(Converted, Contacted);
        assert_eq!(
            err.to_string(),
            "Invalid status transition: converted -> contacted"
        );
    }
}
