use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One row of the append-only outreach log.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OutreachEventRow {
    pub id: Uuid,
    pub prospect_id: Uuid,
    pub email_type: String,
    pub sequence: i16,
    pub subject: String,
    pub content: String,
    pub used_fallback: bool,
    pub sent_at: DateTime<Utc>,
    pub opened: bool,
    pub clicked: bool,
    pub replied: bool,
}
