use std::collections::BTreeMap;

use pixelgen_core::AgentResult;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::AgentResultRow;

#[derive(Clone)]
pub struct AgentResultRepository {
    pool: SqlitePool,
}

impl AgentResultRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record the latest result for one agent. Row-level UPSERT keyed by
    /// (task, agent) keeps concurrent reporters from losing updates.
    pub async fn upsert(
        &self,
        task_id: Uuid,
        agent_name: &str,
        result: &AgentResult,
    ) -> Result<(), DbError> {
        let row = AgentResultRow::from_domain(&task_id.to_string(), agent_name, result)?;

        sqlx::query(
            r#"
            INSERT INTO agent_results (
                task_id, agent_name, success, data, error, metrics,
                iteration, duration_ms, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(task_id, agent_name) DO UPDATE SET
                success = excluded.success,
                data = excluded.data,
                error = excluded.error,
                metrics = excluded.metrics,
                iteration = excluded.iteration,
                duration_ms = excluded.duration_ms,
                created_at = excluded.created_at
            "#,
        )
        .bind(&row.task_id)
        .bind(&row.agent_name)
        .bind(row.success)
        .bind(&row.data)
        .bind(&row.error)
        .bind(&row.metrics)
        .bind(row.iteration)
        .bind(row.duration_ms)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_for_task(
        &self,
        task_id: Uuid,
    ) -> Result<BTreeMap<String, AgentResult>, DbError> {
        let rows: Vec<AgentResultRow> =
            sqlx::query_as("SELECT * FROM agent_results WHERE task_id = ? ORDER BY agent_name")
                .bind(task_id.to_string())
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(|r| r.into_domain()).collect()
    }
}
