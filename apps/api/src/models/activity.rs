use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Pending,
    Approved,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::Pending => "pending",
            ActivityStatus::Approved => "approved",
        }
    }
}

/// A persisted achievement. Content fields are never updated in place.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActivityRow {
    pub id: Uuid,
    pub student_id: String,
    pub title: String,
    pub summary: String,
    pub skills: String,
    pub date: NaiveDate,
    pub evidence_path: Option<String>,
    pub grade_section: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
