use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MeetingRow {
    pub id: Uuid,
    pub prospect_id: Uuid,
    pub scheduled_time: DateTime<Utc>,
    pub meeting_link: Option<String>,
    pub transcript: Option<String>,
    pub action_items: Value,
    pub outcome: Option<String>,
    pub created_at: DateTime<Utc>,
}
