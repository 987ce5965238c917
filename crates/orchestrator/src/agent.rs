use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use pixelgen_core::{AgentConfig, AgentResult, TaskContext, UserInput};

use crate::error::Result;

/// Read-only view of the task handed to an agent for one invocation.
///
/// Agents never see the live task record; the runner snapshots it at the
/// start of the invocation so concurrent store writes cannot change the
/// inputs mid-run.
#[derive(Debug, Clone)]
pub struct TaskSnapshot {
    pub task_id: Uuid,
    pub input: UserInput,
    pub iteration: u32,
    /// Refinement hints accumulated from earlier evaluations and feedback.
    pub hints: Vec<String>,
    /// Latest result per agent, including this iteration's upstream stages.
    pub results: BTreeMap<String, AgentResult>,
}

impl TaskSnapshot {
    pub fn of(task: &TaskContext) -> Self {
        Self {
            task_id: task.task_id,
            input: task.input.clone(),
            iteration: task.iteration,
            hints: task.improvements.clone(),
            results: task.agents.clone(),
        }
    }

    /// Successful payload of an upstream agent, if it produced one.
    pub fn dependency_output(&self, agent: &str) -> Option<&Value> {
        self.results
            .get(agent)
            .filter(|r| r.success)
            .and_then(|r| r.data.as_ref())
    }
}

/// One stage of the generation pipeline.
///
/// Implementations must be side-effect free with respect to the task store;
/// all persistence goes through the runner.
#[async_trait]
pub trait Agent: Send + Sync {
    fn config(&self) -> &AgentConfig;

    fn name(&self) -> &str {
        &self.config().name
    }

    async fn run(&self, snapshot: &TaskSnapshot) -> Result<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixelgen_core::{GenerationOptions, InputMetadata};
    use serde_json::json;

    #[test]
    fn test_snapshot_dependency_output() {
        let mut task = TaskContext::new(
            UserInput::image(vec![0], GenerationOptions::default(), InputMetadata::default()),
            5,
        );
        task.agents.insert(
            "vision".to_string(),
            AgentResult::ok(json!({"elements": 3}), 1, 120),
        );
        task.agents.insert(
            "asset".to_string(),
            AgentResult::failed("no assets detected", 1, 80),
        );

        let snapshot = TaskSnapshot::of(&task);
        assert_eq!(
            snapshot.dependency_output("vision"),
            Some(&json!({"elements": 3}))
        );
        assert_eq!(snapshot.dependency_output("asset"), None);
        assert_eq!(snapshot.dependency_output("missing"), None);
    }
}
