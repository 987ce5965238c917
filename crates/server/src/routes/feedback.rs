use axum::extract::{Path, State};
use axum::Json;
use events::{Event, EventEnvelope};
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use pixelgen_core::TaskStatus;

use crate::error::AppError;
use crate::response::ApiResponse;
use crate::state::AppState;

const MIN_FEEDBACK_LEN: usize = 10;
const MAX_FEEDBACK_LEN: usize = 1000;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub feedback: String,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub improvements: Vec<String>,
}

#[utoipa::path(
    post,
    path = "/api/components/feedback/{task_id}",
    tag = "feedback",
    params(("task_id" = Uuid, Path, description = "Task identifier")),
    request_body = FeedbackRequest,
    responses(
        (status = 200, description = "Feedback recorded; refinement started for completed tasks"),
        (status = 400, description = "Invalid feedback"),
        (status = 404, description = "Unknown task")
    )
)]
pub async fn submit_feedback(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<FeedbackRequest>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let feedback = payload.feedback.trim();
    let length = feedback.chars().count();
    if length < MIN_FEEDBACK_LEN || length > MAX_FEEDBACK_LEN {
        return Err(AppError::Validation(format!(
            "Feedback must be between {MIN_FEEDBACK_LEN} and {MAX_FEEDBACK_LEN} characters"
        )));
    }
    if let Some(rating) = payload.rating {
        if !(1..=5).contains(&rating) {
            return Err(AppError::Validation(
                "Rating must be between 1 and 5".to_string(),
            ));
        }
    }

    let task = state
        .store
        .tasks
        .find_by_id(task_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Task not found: {}", task_id)))?;

    state
        .store
        .feedback
        .insert(task.task_id, feedback, payload.rating, &payload.improvements)
        .await?;
    state
        .event_bus
        .publish(EventEnvelope::new(Event::FeedbackReceived {
            task_id: task.task_id,
            rating: payload.rating,
        }));

    if task.status == TaskStatus::Completed {
        let hints = if payload.improvements.is_empty() {
            vec![feedback.to_string()]
        } else {
            payload.improvements.clone()
        };
        let reopened = state
            .orchestrator
            .begin_refinement(task.task_id, hints)
            .await?;
        state.orchestrator.spawn(task.task_id);

        return Ok(Json(
            ApiResponse::message("Feedback recorded, refinement started")
                .with_task(task.task_id, reopened.status),
        ));
    }

    Ok(Json(
        ApiResponse::message("Feedback recorded").with_task(task.task_id, task.status),
    ))
}
