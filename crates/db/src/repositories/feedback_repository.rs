use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{FeedbackEntry, FeedbackRow};

#[derive(Clone)]
pub struct FeedbackRepository {
    pool: SqlitePool,
}

impl FeedbackRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        task_id: Uuid,
        feedback: &str,
        rating: Option<u8>,
        improvements: &[String],
    ) -> Result<FeedbackEntry, DbError> {
        let entry = FeedbackEntry {
            id: Uuid::new_v4(),
            task_id,
            feedback: feedback.to_string(),
            rating,
            improvements: improvements.to_vec(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO feedback (id, task_id, feedback, rating, improvements, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(entry.task_id.to_string())
        .bind(&entry.feedback)
        .bind(entry.rating.map(|r| r as i64))
        .bind(serde_json::to_string(&entry.improvements)?)
        .bind(entry.created_at.timestamp())
        .execute(&self.pool)
        .await?;

        Ok(entry)
    }

    pub async fn find_for_task(&self, task_id: Uuid) -> Result<Vec<FeedbackEntry>, DbError> {
        let rows: Vec<FeedbackRow> =
            sqlx::query_as("SELECT * FROM feedback WHERE task_id = ? ORDER BY created_at")
                .bind(task_id.to_string())
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(|r| r.into_domain()).collect()
    }
}
