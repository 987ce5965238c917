use std::collections::BTreeMap;

use chrono::Utc;
use pixelgen_core::{TaskContext, TaskPatch};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::TaskRow;
use crate::repositories::AgentResultRepository;

/// How many times a compare-and-swap update is retried before giving up.
const CAS_RETRIES: u32 = 5;

#[derive(Clone)]
pub struct TaskRepository {
    pool: SqlitePool,
}

impl TaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, task: &TaskContext) -> Result<TaskContext, DbError> {
        let row = TaskRow::from_domain(task, 0)?;

        sqlx::query(
            r#"
            INSERT INTO tasks (
                id, user_id, input_kind, input_data, input_options, input_metadata,
                status, output, metrics, iteration, max_iterations, progress,
                current_agent, improvements, error, version, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.user_id)
        .bind(&row.input_kind)
        .bind(&row.input_data)
        .bind(&row.input_options)
        .bind(&row.input_metadata)
        .bind(&row.status)
        .bind(&row.output)
        .bind(&row.metrics)
        .bind(row.iteration)
        .bind(row.max_iterations)
        .bind(row.progress)
        .bind(&row.current_agent)
        .bind(&row.improvements)
        .bind(&row.error)
        .bind(row.version)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(task.clone())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<TaskContext>, DbError> {
        let row: Option<TaskRow> = sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let agents = AgentResultRepository::new(self.pool.clone())
            .find_for_task(id)
            .await?;

        Ok(Some(row.into_domain(agents)?))
    }

    /// Paged task listing, newest first. Agent result maps are left empty;
    /// use `find_by_id` for the full record.
    pub async fn list(&self, page: u32, limit: u32) -> Result<Vec<TaskContext>, DbError> {
        let limit = limit.clamp(1, 100) as i64;
        let offset = (page.max(1) - 1) as i64 * limit;

        let rows: Vec<TaskRow> =
            sqlx::query_as("SELECT * FROM tasks ORDER BY created_at DESC LIMIT ? OFFSET ?")
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|r| r.into_domain(BTreeMap::new()))
            .collect()
    }

    pub async fn count(&self) -> Result<i64, DbError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Apply a partial update under optimistic concurrency control.
    ///
    /// The row's `version` column is compared and swapped; on a lost race the
    /// row is reloaded and the patch reapplied, up to `CAS_RETRIES` times, so
    /// near-simultaneous writers never overwrite each other's fields.
    pub async fn update(
        &self,
        id: Uuid,
        patch: &TaskPatch,
    ) -> Result<Option<TaskContext>, DbError> {
        for _ in 0..CAS_RETRIES {
            let row: Option<TaskRow> = sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;

            let Some(row) = row else {
                return Ok(None);
            };
            let version = row.version;

            let mut task = row.into_domain(BTreeMap::new())?;
            apply_patch(&mut task, patch);
            task.updated_at = Utc::now();

            let updated = TaskRow::from_domain(&task, version + 1)?;
            let result = sqlx::query(
                r#"
                UPDATE tasks
                SET status = ?, output = ?, metrics = ?, iteration = ?,
                    max_iterations = ?, progress = ?, current_agent = ?,
                    improvements = ?, error = ?, version = ?, updated_at = ?
                WHERE id = ? AND version = ?
                "#,
            )
            .bind(&updated.status)
            .bind(&updated.output)
            .bind(&updated.metrics)
            .bind(updated.iteration)
            .bind(updated.max_iterations)
            .bind(updated.progress)
            .bind(&updated.current_agent)
            .bind(&updated.improvements)
            .bind(&updated.error)
            .bind(updated.version)
            .bind(updated.updated_at)
            .bind(&updated.id)
            .bind(version)
            .execute(&self.pool)
            .await?;

            if result.rows_affected() > 0 {
                return self.find_by_id(id).await;
            }

            tracing::debug!(task_id = %id, "Task update lost CAS race, retrying");
        }

        Err(DbError::VersionConflict(id))
    }

    /// Like [`update`](Self::update), but leaves tasks already in a terminal
    /// state untouched and returns them as-is. This is what lets a committed
    /// cancellation win any race against in-flight lifecycle writes: the
    /// cancel bumps `version`, the writer's CAS fails, the reload sees the
    /// terminal status and backs off instead of resurrecting the task.
    pub async fn update_active(
        &self,
        id: Uuid,
        patch: &TaskPatch,
    ) -> Result<Option<TaskContext>, DbError> {
        for _ in 0..CAS_RETRIES {
            let row: Option<TaskRow> = sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;

            let Some(row) = row else {
                return Ok(None);
            };
            let version = row.version;

            let mut task = row.into_domain(BTreeMap::new())?;
            if task.status.is_terminal() {
                return self.find_by_id(id).await;
            }
            apply_patch(&mut task, patch);
            task.updated_at = Utc::now();

            let updated = TaskRow::from_domain(&task, version + 1)?;
            let result = sqlx::query(
                r#"
                UPDATE tasks
                SET status = ?, output = ?, metrics = ?, iteration = ?,
                    max_iterations = ?, progress = ?, current_agent = ?,
                    improvements = ?, error = ?, version = ?, updated_at = ?
                WHERE id = ? AND version = ?
                "#,
            )
            .bind(&updated.status)
            .bind(&updated.output)
            .bind(&updated.metrics)
            .bind(updated.iteration)
            .bind(updated.max_iterations)
            .bind(updated.progress)
            .bind(&updated.current_agent)
            .bind(&updated.improvements)
            .bind(&updated.error)
            .bind(updated.version)
            .bind(updated.updated_at)
            .bind(&updated.id)
            .bind(version)
            .execute(&self.pool)
            .await?;

            if result.rows_affected() > 0 {
                return self.find_by_id(id).await;
            }

            tracing::debug!(task_id = %id, "Guarded task update lost CAS race, retrying");
        }

        Err(DbError::VersionConflict(id))
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn apply_patch(task: &mut TaskContext, patch: &TaskPatch) {
    if let Some(status) = patch.status {
        task.status = status;
    }
    if let Some(output) = &patch.output {
        task.output = Some(output.clone());
    }
    if let Some(metrics) = &patch.metrics {
        task.metrics = Some(metrics.clone());
    }
    if let Some(iteration) = patch.iteration {
        task.iteration = iteration;
    }
    if let Some(max_iterations) = patch.max_iterations {
        task.max_iterations = max_iterations;
    }
    if let Some(progress) = patch.progress {
        task.progress = progress.min(100);
    }
    if let Some(current_agent) = &patch.current_agent {
        task.current_agent = current_agent.clone();
    }
    if let Some(improvements) = &patch.improvements {
        task.improvements = improvements.clone();
    }
    if let Some(error) = &patch.error {
        task.error = error.clone();
    }
}
