//! Event types emitted over the task lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping all events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: Event,
}

impl EventEnvelope {
    /// Create a new event envelope with auto-generated ID and timestamp
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// All possible events in the system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A submission was accepted and a task record created
    #[serde(rename = "task.created")]
    TaskCreated { task_id: Uuid, input_kind: String },

    /// Task moved between lifecycle states
    #[serde(rename = "task.status_changed")]
    TaskStatusChanged {
        task_id: Uuid,
        from_status: String,
        to_status: String,
    },

    /// One refinement iteration finished evaluation
    #[serde(rename = "task.iteration_completed")]
    IterationCompleted {
        task_id: Uuid,
        iteration: u32,
        overall_score: f64,
        passed: bool,
    },

    /// A cancel request was applied to the task
    #[serde(rename = "task.cancelled")]
    TaskCancelled { task_id: Uuid },

    /// One agent invocation finished (success or failure)
    #[serde(rename = "agent.finished")]
    AgentFinished {
        task_id: Uuid,
        agent: String,
        iteration: u32,
        success: bool,
    },

    /// User feedback arrived for a task
    #[serde(rename = "feedback.received")]
    FeedbackReceived {
        task_id: Uuid,
        rating: Option<u8>,
    },

    /// Generic error event
    #[serde(rename = "error")]
    Error {
        message: String,
        context: Option<String>,
    },
}

impl Event {
    /// Get the task ID associated with this event, if any
    pub fn task_id(&self) -> Option<Uuid> {
        match self {
            Event::TaskCreated { task_id, .. } => Some(*task_id),
            Event::TaskStatusChanged { task_id, .. } => Some(*task_id),
            Event::IterationCompleted { task_id, .. } => Some(*task_id),
            Event::TaskCancelled { task_id } => Some(*task_id),
            Event::AgentFinished { task_id, .. } => Some(*task_id),
            Event::FeedbackReceived { task_id, .. } => Some(*task_id),
            Event::Error { .. } => None,
        }
    }
}
