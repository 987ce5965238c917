use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use pixelgen_core::TaskStatus;

/// The envelope every endpoint responds with. `task_id` and `status` are
/// set whenever the response concerns one task, so clients can poll without
/// unwrapping `data`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
            task_id: None,
            status: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            message: Some(message.into()),
            task_id: None,
            status: None,
        }
    }

    pub fn error(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: Some(message.into()),
            task_id: None,
            status: None,
        }
    }

    pub fn with_task(mut self, task_id: Uuid, status: TaskStatus) -> Self {
        self.task_id = Some(task_id);
        self.status = Some(status);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_envelope_wire_format() {
        let response =
            ApiResponse::ok(json!({"n": 1})).with_task(Uuid::nil(), TaskStatus::Pending);
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["success"], true);
        assert_eq!(value["taskId"], Uuid::nil().to_string());
        assert_eq!(value["status"], "pending");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_error_envelope() {
        let response = ApiResponse::<Value>::error("not_found", "Task not found");
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "not_found");
        assert!(value.get("data").is_none());
    }
}
