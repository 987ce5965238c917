use pixelgen_core::GeneratedComponent;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::ComponentRow;

#[derive(Clone)]
pub struct ComponentRepository {
    pool: SqlitePool,
}

impl ComponentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        task_id: Uuid,
        component: &GeneratedComponent,
    ) -> Result<(), DbError> {
        let row = ComponentRow::from_domain(task_id, component)?;

        sqlx::query(
            r#"
            INSERT INTO components (id, task_id, name, body, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET name = excluded.name, body = excluded.body
            "#,
        )
        .bind(&row.id)
        .bind(&row.task_id)
        .bind(&row.name)
        .bind(&row.body)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<GeneratedComponent>, DbError> {
        let row: Option<ComponentRow> = sqlx::query_as("SELECT * FROM components WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_domain()).transpose()
    }

    pub async fn find_by_task(&self, task_id: Uuid) -> Result<Option<GeneratedComponent>, DbError> {
        let row: Option<ComponentRow> = sqlx::query_as(
            "SELECT * FROM components WHERE task_id = ? ORDER BY created_at DESC LIMIT 1",
        )
        .bind(task_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_domain()).transpose()
    }

    pub async fn list(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<GeneratedComponent>, i64), DbError> {
        let limit_i = limit.clamp(1, 100) as i64;
        let offset = (page.max(1) - 1) as i64 * limit_i;

        let rows: Vec<ComponentRow> =
            sqlx::query_as("SELECT * FROM components ORDER BY created_at DESC LIMIT ? OFFSET ?")
                .bind(limit_i)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM components")
            .fetch_one(&self.pool)
            .await?;

        let components = rows
            .into_iter()
            .map(|r| r.into_domain())
            .collect::<Result<Vec<_>, _>>()?;

        Ok((components, total))
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM components WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
