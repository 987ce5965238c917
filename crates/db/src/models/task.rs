use std::collections::BTreeMap;

use pixelgen_core::{
    AgentResult, GeneratedComponent, InputKind, InputMetadata, QualityMetrics, TaskContext,
    TaskStatus, UserInput,
};
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{datetime_to_timestamp, timestamp_to_datetime};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TaskRow {
    pub id: String,
    pub user_id: Option<String>,
    pub input_kind: String,
    pub input_data: Vec<u8>,
    pub input_options: String,
    pub input_metadata: String,
    pub status: String,
    pub output: Option<String>,
    pub metrics: Option<String>,
    pub iteration: i64,
    pub max_iterations: i64,
    pub progress: i64,
    pub current_agent: Option<String>,
    pub improvements: String,
    pub error: Option<String>,
    pub version: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TaskRow {
    pub fn into_domain(
        self,
        agents: BTreeMap<String, AgentResult>,
    ) -> Result<TaskContext, DbError> {
        let output: Option<GeneratedComponent> = self
            .output
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        let metrics: Option<QualityMetrics> = self
            .metrics
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        Ok(TaskContext {
            task_id: Uuid::parse_str(&self.id).unwrap_or_default(),
            user_id: self.user_id,
            input: UserInput {
                kind: InputKind::parse(&self.input_kind).unwrap_or(InputKind::Image),
                data: self.input_data,
                options: serde_json::from_str(&self.input_options)?,
                metadata: serde_json::from_str::<InputMetadata>(&self.input_metadata)?,
            },
            status: TaskStatus::parse(&self.status).unwrap_or_default(),
            output,
            metrics,
            iteration: self.iteration as u32,
            max_iterations: self.max_iterations as u32,
            progress: self.progress.clamp(0, 100) as u8,
            current_agent: self.current_agent,
            improvements: serde_json::from_str(&self.improvements)?,
            error: self.error,
            agents,
            created_at: timestamp_to_datetime(self.created_at),
            updated_at: timestamp_to_datetime(self.updated_at),
        })
    }

    pub fn from_domain(task: &TaskContext, version: i64) -> Result<Self, DbError> {
        Ok(Self {
            id: task.task_id.to_string(),
            user_id: task.user_id.clone(),
            input_kind: task.input.kind.as_str().to_string(),
            input_data: task.input.data.clone(),
            input_options: serde_json::to_string(&task.input.options)?,
            input_metadata: serde_json::to_string(&task.input.metadata)?,
            status: task.status.as_str().to_string(),
            output: task
                .output
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
            metrics: task
                .metrics
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
            iteration: task.iteration as i64,
            max_iterations: task.max_iterations as i64,
            progress: task.progress as i64,
            current_agent: task.current_agent.clone(),
            improvements: serde_json::to_string(&task.improvements)?,
            error: task.error.clone(),
            version,
            created_at: datetime_to_timestamp(task.created_at),
            updated_at: datetime_to_timestamp(task.updated_at),
        })
    }
}
