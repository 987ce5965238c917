use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{AgentResult, GeneratedComponent, QualityMetrics, UserInput};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// The full lifecycle record of one generation task.
///
/// Owned exclusively by the task store; the orchestrator holds a transient
/// working copy during an iteration and writes results back through the
/// store's update operation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskContext {
    pub task_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub input: UserInput,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<GeneratedComponent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<QualityMetrics>,
    pub iteration: u32,
    pub max_iterations: u32,
    /// Coarse percentage for status polling, 0-100.
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_agent: Option<String>,
    /// Latest refinement hints from the evaluator.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub improvements: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Latest result per agent name.
    #[serde(default)]
    pub agents: BTreeMap<String, AgentResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskContext {
    pub fn new(input: UserInput, max_iterations: u32) -> Self {
        let now = Utc::now();
        Self {
            task_id: Uuid::new_v4(),
            user_id: None,
            input,
            status: TaskStatus::default(),
            output: None,
            metrics: None,
            iteration: 0,
            max_iterations,
            progress: 0,
            current_agent: None,
            improvements: Vec::new(),
            error: None,
            agents: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Wall-clock duration of the task so far, in seconds.
    pub fn duration_secs(&self) -> f64 {
        (self.updated_at - self.created_at).num_milliseconds() as f64 / 1000.0
    }
}

/// Partial update applied through the store. `None` fields are untouched;
/// the doubled options distinguish "leave as is" from "clear".
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub status: Option<TaskStatus>,
    pub output: Option<GeneratedComponent>,
    pub metrics: Option<QualityMetrics>,
    pub iteration: Option<u32>,
    pub max_iterations: Option<u32>,
    pub progress: Option<u8>,
    pub current_agent: Option<Option<String>>,
    pub improvements: Option<Vec<String>>,
    pub error: Option<Option<String>>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.output.is_none()
            && self.metrics.is_none()
            && self.iteration.is_none()
            && self.max_iterations.is_none()
            && self.progress.is_none()
            && self.current_agent.is_none()
            && self.improvements.is_none()
            && self.error.is_none()
    }
}
