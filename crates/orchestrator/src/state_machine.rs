use pixelgen_core::TaskStatus;

use crate::error::{OrchestratorError, Result};

/// Guard for every task status write. All status changes, whether driven by
/// the runner, a cancel request, or a feedback refinement, are validated here
/// before they reach the store.
pub struct TaskStateMachine;

impl TaskStateMachine {
    pub fn validate_transition(from: &TaskStatus, to: &TaskStatus) -> Result<()> {
        let allowed = Self::allowed_transitions(from);

        if allowed.contains(to) {
            Ok(())
        } else {
            Err(OrchestratorError::InvalidTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            })
        }
    }

    fn allowed_transitions(from: &TaskStatus) -> Vec<TaskStatus> {
        match from {
            TaskStatus::Pending => vec![TaskStatus::Processing, TaskStatus::Cancelled],
            TaskStatus::Processing => vec![
                TaskStatus::Completed,
                TaskStatus::Failed,
                TaskStatus::Cancelled,
            ],
            // Feedback-driven refinement re-enters the loop.
            TaskStatus::Completed => vec![TaskStatus::Processing],
            TaskStatus::Failed => vec![],
            TaskStatus::Cancelled => vec![],
        }
    }

    pub fn can_transition(from: &TaskStatus, to: &TaskStatus) -> bool {
        Self::validate_transition(from, to).is_ok()
    }
}
