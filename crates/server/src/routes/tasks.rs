use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use orchestrator::pipeline::SANDBOX_RENDER;
use pixelgen_core::{GeneratedComponent, QualityMetrics, TaskContext, TaskStatus};

use crate::error::AppError;
use crate::response::ApiResponse;
use crate::state::AppState;

async fn load_task(state: &AppState, task_id: Uuid) -> Result<TaskContext, AppError> {
    state
        .store
        .tasks
        .find_by_id(task_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Task not found: {}", task_id)))
}

#[utoipa::path(
    get,
    path = "/api/components/task/{task_id}",
    tag = "tasks",
    params(("task_id" = Uuid, Path, description = "Task identifier")),
    responses(
        (status = 200, description = "Current lifecycle state", body = ApiResponse<TaskContext>),
        (status = 404, description = "Unknown task")
    )
)]
pub async fn task_status(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<ApiResponse<TaskContext>>, AppError> {
    let task = load_task(&state, task_id).await?;
    let status = task.status;
    Ok(Json(ApiResponse::ok(task).with_task(task_id, status)))
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    pub component: GeneratedComponent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<QualityMetrics>,
    pub iterations: u32,
    pub duration_secs: f64,
}

#[utoipa::path(
    get,
    path = "/api/components/task/{task_id}/result",
    tag = "tasks",
    params(("task_id" = Uuid, Path, description = "Task identifier")),
    responses(
        (status = 200, description = "Final result, or failure details", body = ApiResponse<TaskResult>),
        (status = 202, description = "Task is still running"),
        (status = 404, description = "Unknown task")
    )
)]
pub async fn task_result(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<Value>>), AppError> {
    let task = load_task(&state, task_id).await?;

    match task.status {
        TaskStatus::Completed => {
            let component = task.output.clone().ok_or_else(|| {
                AppError::Internal(format!("Completed task {} has no output", task_id))
            })?;
            let result = TaskResult {
                component,
                metrics: task.metrics.clone(),
                iterations: task.iteration,
                duration_secs: task.duration_secs(),
            };
            let body = ApiResponse::ok(serde_json::to_value(result).map_err(|e| {
                AppError::Internal(format!("Result serialization failed: {e}"))
            })?)
            .with_task(task_id, task.status);
            Ok((StatusCode::OK, Json(body)))
        }
        TaskStatus::Pending | TaskStatus::Processing => {
            let body = ApiResponse::message("Task is still processing")
                .with_task(task_id, task.status);
            Ok((StatusCode::ACCEPTED, Json(body)))
        }
        TaskStatus::Failed => {
            let message = task
                .error
                .clone()
                .unwrap_or_else(|| "Task failed".to_string());
            let body =
                ApiResponse::error("task_failed", message).with_task(task_id, task.status);
            Ok((StatusCode::OK, Json(body)))
        }
        TaskStatus::Cancelled => {
            let body = ApiResponse::error("task_cancelled", "Task was cancelled")
                .with_task(task_id, task.status);
            Ok((StatusCode::OK, Json(body)))
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/components/task/{task_id}",
    tag = "tasks",
    params(("task_id" = Uuid, Path, description = "Task identifier")),
    responses(
        (status = 200, description = "Task cancelled"),
        (status = 404, description = "Unknown task"),
        (status = 409, description = "Task already finished")
    )
)]
pub async fn cancel_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let cancelled = state.orchestrator.cancel(task_id).await?;
    Ok(Json(
        ApiResponse::message("Task cancelled").with_task(task_id, cancelled.status),
    ))
}

#[utoipa::path(
    get,
    path = "/api/components/metrics/{task_id}",
    tag = "tasks",
    params(("task_id" = Uuid, Path, description = "Task identifier")),
    responses(
        (status = 200, description = "Latest quality metrics", body = ApiResponse<QualityMetrics>),
        (status = 404, description = "Unknown task or no metrics yet")
    )
)]
pub async fn task_metrics(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<ApiResponse<QualityMetrics>>, AppError> {
    let task = load_task(&state, task_id).await?;
    let metrics = task.metrics.clone().ok_or_else(|| {
        AppError::NotFound(format!("No metrics recorded yet for task {}", task_id))
    })?;
    Ok(Json(ApiResponse::ok(metrics).with_task(task_id, task.status)))
}

#[utoipa::path(
    get,
    path = "/api/components/preview/{task_id}",
    tag = "tasks",
    params(("task_id" = Uuid, Path, description = "Task identifier")),
    responses(
        (status = 200, description = "Standalone HTML preview of the generated component"),
        (status = 404, description = "Unknown task or no output yet")
    )
)]
pub async fn preview_component(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<Html<String>, AppError> {
    let task = load_task(&state, task_id).await?;
    let component = task.output.as_ref().ok_or_else(|| {
        AppError::NotFound(format!("No component output yet for task {}", task_id))
    })?;

    let styles = component.files.styles.as_deref().unwrap_or_default();
    let page = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{name}</title>\n\
         <style>{styles}</style>\n</head>\n<body>\n<div id=\"root\"></div>\n\
         <pre>{source}</pre>\n</body>\n</html>\n",
        name = component.name,
        source = html_escape(&component.files.component),
    );
    Ok(Html(page))
}

fn html_escape(source: &str) -> String {
    source
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[utoipa::path(
    get,
    path = "/api/components/preview/{task_id}/screenshot",
    tag = "tasks",
    params(("task_id" = Uuid, Path, description = "Task identifier")),
    responses(
        (status = 200, description = "Latest sandbox render artifact"),
        (status = 404, description = "Unknown task or nothing rendered yet")
    )
)]
pub async fn task_screenshot(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let task = load_task(&state, task_id).await?;
    let render = task
        .agents
        .get(SANDBOX_RENDER)
        .filter(|r| r.success)
        .and_then(|r| r.data.clone())
        .ok_or_else(|| {
            AppError::NotFound(format!("No render captured yet for task {}", task_id))
        })?;
    Ok(Json(ApiResponse::ok(render).with_task(task_id, task.status)))
}
