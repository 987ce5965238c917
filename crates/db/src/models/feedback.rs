use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DbError;
use crate::models::timestamp_to_datetime;

/// User feedback attached to a task, as stored.
#[derive(Debug, Clone)]
pub struct FeedbackEntry {
    pub id: Uuid,
    pub task_id: Uuid,
    pub feedback: String,
    pub rating: Option<u8>,
    pub improvements: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedbackRow {
    pub id: String,
    pub task_id: String,
    pub feedback: String,
    pub rating: Option<i64>,
    pub improvements: String,
    pub created_at: i64,
}

impl FeedbackRow {
    pub fn into_domain(self) -> Result<FeedbackEntry, DbError> {
        Ok(FeedbackEntry {
            id: Uuid::parse_str(&self.id).unwrap_or_default(),
            task_id: Uuid::parse_str(&self.task_id).unwrap_or_default(),
            feedback: self.feedback,
            rating: self.rating.map(|r| r.clamp(1, 5) as u8),
            improvements: serde_json::from_str(&self.improvements)?,
            created_at: timestamp_to_datetime(self.created_at),
        })
    }
}
