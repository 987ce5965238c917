use pixelgen_core::GeneratedComponent;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ComponentRow {
    pub id: String,
    pub task_id: String,
    pub name: String,
    pub body: String,
    pub created_at: i64,
}

impl ComponentRow {
    pub fn into_domain(self) -> Result<GeneratedComponent, DbError> {
        Ok(serde_json::from_str(&self.body)?)
    }

    pub fn from_domain(task_id: Uuid, component: &GeneratedComponent) -> Result<Self, DbError> {
        Ok(Self {
            id: component.id.to_string(),
            task_id: task_id.to_string(),
            name: component.name.clone(),
            body: serde_json::to_string(component)?,
            created_at: chrono::Utc::now().timestamp(),
        })
    }
}
