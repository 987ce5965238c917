use pixelgen_core::AgentResult;

use crate::error::DbError;
use crate::models::{datetime_to_timestamp, timestamp_to_datetime};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AgentResultRow {
    pub task_id: String,
    pub agent_name: String,
    pub success: i64,
    pub data: Option<String>,
    pub error: Option<String>,
    pub metrics: Option<String>,
    pub iteration: i64,
    pub duration_ms: i64,
    pub created_at: i64,
}

impl AgentResultRow {
    pub fn into_domain(self) -> Result<(String, AgentResult), DbError> {
        let result = AgentResult {
            success: self.success != 0,
            data: self.data.as_deref().map(serde_json::from_str).transpose()?,
            error: self.error,
            metrics: self
                .metrics
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            iteration: self.iteration as u32,
            duration_ms: self.duration_ms as u64,
            timestamp: timestamp_to_datetime(self.created_at),
        };
        Ok((self.agent_name, result))
    }

    pub fn from_domain(
        task_id: &str,
        agent_name: &str,
        result: &AgentResult,
    ) -> Result<Self, DbError> {
        Ok(Self {
            task_id: task_id.to_string(),
            agent_name: agent_name.to_string(),
            success: i64::from(result.success),
            data: result.data.as_ref().map(serde_json::to_string).transpose()?,
            error: result.error.clone(),
            metrics: result
                .metrics
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
            iteration: result.iteration as i64,
            duration_ms: result.duration_ms as i64,
            created_at: datetime_to_timestamp(result.timestamp),
        })
    }
}
