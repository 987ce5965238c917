use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Invalid status transition from '{from}' to '{to}'")]
    InvalidTransition { from: String, to: String },

    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("Unknown agent '{0}' referenced in pipeline")]
    UnknownAgent(String),

    #[error("Agent '{0}' registered more than once")]
    DuplicateAgent(String),

    #[error("Dependency cycle in agent pipeline involving: {0}")]
    DependencyCycle(String),

    #[error("Critical agent '{agent}' failed: {reason}")]
    CriticalAgentFailed { agent: String, reason: String },

    #[error("Pipeline produced no rendered candidate to evaluate")]
    NoRenderedCandidate,

    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    #[error("Agent execution error: {0}")]
    AgentExecution(String),

    #[error("Database error: {0}")]
    Database(#[from] db::DbError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
