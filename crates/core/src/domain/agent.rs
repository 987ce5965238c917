use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::QualityMetrics;

/// Outcome of one agent invocation for one iteration. Only the latest result
/// per (task, agent) pair is retained.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<QualityMetrics>,
    pub iteration: u32,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl AgentResult {
    pub fn ok(data: Value, iteration: u32, duration_ms: u64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            metrics: None,
            iteration,
            duration_ms,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(error: impl Into<String>, iteration: u32, duration_ms: u64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            metrics: None,
            iteration,
            duration_ms,
            timestamp: Utc::now(),
        }
    }
}

/// Static description of one agent in the pipeline.
///
/// `dependencies` gates scheduling: the agent runs only after every named
/// dependency has produced a result in the current iteration. `critical`
/// decides whether an exhausted-retries failure aborts the whole task or
/// merely skips the agent's dependents for the iteration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    pub name: String,
    pub enabled: bool,
    pub priority: i32,
    pub timeout_ms: u64,
    pub retries: u32,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default = "default_critical")]
    pub critical: bool,
}

fn default_critical() -> bool {
    true
}

impl AgentConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            priority: 0,
            timeout_ms: 30_000,
            retries: 2,
            dependencies: Vec::new(),
            critical: true,
        }
    }

    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn optional(mut self) -> Self {
        self.critical = false;
        self
    }
}
