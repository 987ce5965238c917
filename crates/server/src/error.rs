use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use crate::response::ApiResponse;

#[derive(Debug)]
pub enum AppError {
    Validation(String),
    Upload(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Timeout(String),
    Conflict(String),
    Internal(String),
    Database(db::DbError),
    Orchestrator(orchestrator::OrchestratorError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg),
            AppError::Upload(msg) => (StatusCode::BAD_REQUEST, "upload_error", msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            AppError::Timeout(msg) => (StatusCode::REQUEST_TIMEOUT, "timeout", msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {:?}", err);
                match err {
                    db::DbError::TaskNotFound(id) => (
                        StatusCode::NOT_FOUND,
                        "not_found",
                        format!("Task not found: {}", id),
                    ),
                    db::DbError::ComponentNotFound(id) => (
                        StatusCode::NOT_FOUND,
                        "not_found",
                        format!("Component not found: {}", id),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "database_error",
                        "Database error occurred".to_string(),
                    ),
                }
            }
            AppError::Orchestrator(err) => {
                use orchestrator::OrchestratorError;
                match err {
                    OrchestratorError::TaskNotFound(id) => (
                        StatusCode::NOT_FOUND,
                        "not_found",
                        format!("Task not found: {}", id),
                    ),
                    OrchestratorError::InvalidTransition { .. } => {
                        (StatusCode::CONFLICT, "conflict", err.to_string())
                    }
                    other => {
                        tracing::error!("Orchestrator error: {:?}", other);
                        (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            "orchestrator_error",
                            "Task processing error occurred".to_string(),
                        )
                    }
                }
            }
        };

        let body = Json(ApiResponse::<Value>::error(error_type, message));
        (status, body).into_response()
    }
}

impl From<db::DbError> for AppError {
    fn from(err: db::DbError) -> Self {
        AppError::Database(err)
    }
}

impl From<orchestrator::OrchestratorError> for AppError {
    fn from(err: orchestrator::OrchestratorError) -> Self {
        AppError::Orchestrator(err)
    }
}
