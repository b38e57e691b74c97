//! Domain types shared by the cadence engine, the lifecycle state machine,
//! and the persistence layer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::cadence::engine::CadenceError;

/// Lifecycle status of a prospect. Stored as snake_case text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProspectStatus {
    #[default]
    New,
    Contacted,
    Replied,
    MeetingScheduled,
    Converted,
    Unsubscribed,
}

impl ProspectStatus {
    pub const ALL: [ProspectStatus; 6] = [
        ProspectStatus::New,
        ProspectStatus::Contacted,
        ProspectStatus::Replied,
        ProspectStatus::MeetingScheduled,
        ProspectStatus::Converted,
        ProspectStatus::Unsubscribed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProspectStatus::New => "new",
            ProspectStatus::Contacted => "contacted",
            ProspectStatus::Replied => "replied",
            ProspectStatus::MeetingScheduled => "meeting_scheduled",
            ProspectStatus::Converted => "converted",
            ProspectStatus::Unsubscribed => "unsubscribed",
        }
    }

    /// No automated outreach happens once a prospect reaches one of these.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProspectStatus::Replied
                | ProspectStatus::MeetingScheduled
                | ProspectStatus::Converted
                | ProspectStatus::Unsubscribed
        )
    }
}

impl fmt::Display for ProspectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProspectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProspectStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown prospect status '{s}'"))
    }
}

/// Which email in the sequence an outreach event represents.
///
/// Serialized as `"initial"` or `"follow_up_<n>"` (n ≥ 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmailType {
    Initial,
    FollowUp(u8),
}

impl EmailType {
    /// Position in the sequence: 0 for the initial email, n for follow-up n.
    pub fn sequence(&self) -> u8 {
        match self {
            EmailType::Initial => 0,
            EmailType::FollowUp(n) => *n,
        }
    }
}

impl fmt::Display for EmailType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmailType::Initial => f.write_str("initial"),
            EmailType::FollowUp(n) => write!(f, "follow_up_{n}"),
        }
    }
}

impl FromStr for EmailType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "initial" {
            return Ok(EmailType::Initial);
        }
        // Only the canonical spelling is accepted, so a parsed value always
        // displays back to the stored text.
        let n = s
            .strip_prefix("follow_up_")
            .and_then(|digits| digits.parse::<u8>().ok().filter(|n| n.to_string() == digits))
            .filter(|n| *n >= 1)
            .ok_or_else(|| format!("unknown email type '{s}'"))?;
        Ok(EmailType::FollowUp(n))
    }
}

impl Serialize for EmailType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EmailType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One email sent to a prospect. The ordered log of these is the source of
/// truth for what was sent when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutreachEvent {
    pub email_type: EmailType,
    pub sent_at: DateTime<Utc>,
    pub replied: bool,
}

impl TryFrom<&crate::models::outreach::OutreachEventRow> for OutreachEvent {
    type Error = CadenceError;

    fn try_from(row: &crate::models::outreach::OutreachEventRow) -> Result<Self, Self::Error> {
        let email_type = row.email_type.parse().map_err(|e: String| {
            CadenceError::InvalidHistory(format!("event {}: {e}", row.id))
        })?;
        Ok(OutreachEvent {
            email_type,
            sent_at: row.sent_at,
            replied: row.replied,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in ProspectStatus::ALL {
            assert_eq!(status.as_str().parse::<ProspectStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_status_serde_is_snake_case() {
        let json = serde_json::to_string(&ProspectStatus::MeetingScheduled).unwrap();
        assert_eq!(json, r#""meeting_scheduled""#);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!ProspectStatus::New.is_terminal());
        assert!(!ProspectStatus::Contacted.is_terminal());
        assert!(ProspectStatus::Replied.is_terminal());
        assert!(ProspectStatus::MeetingScheduled.is_terminal());
        assert!(ProspectStatus::Converted.is_terminal());
        assert!(ProspectStatus::Unsubscribed.is_terminal());
    }

    #[test]
    fn test_email_type_parsing() {
        assert_eq!("initial".parse::<EmailType>().unwrap(), EmailType::Initial);
        assert_eq!(
            "follow_up_3".parse::<EmailType>().unwrap(),
            EmailType::FollowUp(3)
        );
        assert!("follow_up_0".parse::<EmailType>().is_err());
        assert!("follow_up_x".parse::<EmailType>().is_err());
        assert!("reminder".parse::<EmailType>().is_err());
    }

    #[test]
    fn test_email_type_rejects_non_canonical_numbers() {
        for raw in ["follow_up_+1", "follow_up_01", "follow_up_ 1", "follow_up_"] {
            assert!(raw.parse::<EmailType>().is_err(), "accepted {raw}");
        }
    }

    #[test]
    fn test_email_type_serializes_as_string() {
        let json = serde_json::to_string(&EmailType::FollowUp(2)).unwrap();
        assert_eq!(json, r#""follow_up_2""#);
        let back: EmailType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EmailType::FollowUp(2));
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let err = "lost".parse::<ProspectStatus>().unwrap_err();
        assert!(err.contains("lost"));
    }
}
