use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::cadence::models::ProspectStatus;
use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProspectRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub company: String,
    pub title: Option<String>,
    pub linkedin_url: Option<String>,
    pub phone: Option<String>,
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub pain_points: Vec<String>,
    pub engagement_score: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl ProspectRow {
    /// Parses the stored status. An unknown value means the row was written
    /// outside this service and is reported rather than guessed at.
    pub fn lifecycle_status(&self) -> Result<ProspectStatus, AppError> {
        self.status.parse().map_err(|e: String| {
            AppError::Internal(anyhow::anyhow!("prospect {}: {e}", self.id))
        })
    }
}
