use std::collections::BTreeMap;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use events::{Event, EventEnvelope};
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

use pixelgen_core::{
    Framework, GenerationMode, GenerationOptions, InputMetadata, TaskContext, Theme, UserInput,
};

use crate::error::AppError;
use crate::response::ApiResponse;
use crate::state::AppState;

type Accepted = (StatusCode, Json<ApiResponse<Value>>);

struct FilePart {
    bytes: Vec<u8>,
    filename: Option<String>,
    content_type: Option<String>,
}

/// Pull the file part plus every text field out of a multipart submission.
async fn read_submission(
    mut multipart: Multipart,
    file_field: &str,
) -> Result<(Option<FilePart>, BTreeMap<String, String>), AppError> {
    let mut file: Option<FilePart> = None;
    let mut fields = BTreeMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Upload(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == file_field {
            let filename = field.file_name().map(|s| s.to_string());
            let content_type = field.content_type().map(|s| s.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Upload(e.to_string()))?;
            file = Some(FilePart {
                bytes: bytes.to_vec(),
                filename,
                content_type,
            });
        } else if !name.is_empty() {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::Upload(e.to_string()))?;
            fields.insert(name, value);
        }
    }

    Ok((file, fields))
}

fn parse_options(fields: &BTreeMap<String, String>) -> Result<GenerationOptions, AppError> {
    let mut options = GenerationOptions::default();

    if let Some(raw) = fields.get("mode") {
        options.mode = match raw.as_str() {
            "pixel-perfect" => GenerationMode::PixelPerfect,
            "fast-approximate" => GenerationMode::FastApproximate,
            other => {
                return Err(AppError::Validation(format!(
                    "Unknown generation mode: {other}"
                )))
            }
        };
    }
    if let Some(raw) = fields.get("includeAnimations") {
        options.include_animations = parse_bool("includeAnimations", raw)?;
    }
    if let Some(raw) = fields.get("responsive") {
        options.responsive = parse_bool("responsive", raw)?;
    }
    if let Some(raw) = fields.get("theme") {
        options.theme = match raw.as_str() {
            "light" => Theme::Light,
            "dark" => Theme::Dark,
            "auto" => Theme::Auto,
            other => return Err(AppError::Validation(format!("Unknown theme: {other}"))),
        };
    }
    if let Some(raw) = fields.get("framework") {
        options.framework = match raw.as_str() {
            "react" => Framework::React,
            "vue" => Framework::Vue,
            "angular" => Framework::Angular,
            other => return Err(AppError::Validation(format!("Unknown framework: {other}"))),
        };
    }

    Ok(options)
}

fn parse_bool(field: &str, raw: &str) -> Result<bool, AppError> {
    match raw {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(AppError::Validation(format!(
            "Field '{field}' must be 'true' or 'false', got '{other}'"
        ))),
    }
}

fn validate_file(
    state: &AppState,
    file: &FilePart,
    field: &str,
    expected_prefix: &str,
) -> Result<String, AppError> {
    if file.bytes.is_empty() {
        return Err(AppError::Validation(format!(
            "Field '{field}' must carry a non-empty file"
        )));
    }
    if file.bytes.len() > state.config.max_file_size {
        return Err(AppError::Upload(format!(
            "File exceeds the {} byte limit",
            state.config.max_file_size
        )));
    }

    let mime = file
        .content_type
        .clone()
        .ok_or_else(|| AppError::Upload(format!("Field '{field}' is missing a content type")))?;
    if !mime.starts_with(expected_prefix) || !state.config.is_allowed_type(&mime) {
        return Err(AppError::Upload(format!("Unsupported file type: {mime}")));
    }

    Ok(mime)
}

/// Create the task record, announce it, and hand it to the orchestrator.
async fn accept_task(state: &AppState, input: UserInput) -> Result<Accepted, AppError> {
    let input_kind = input.kind.as_str().to_string();
    let task = TaskContext::new(input, state.config.max_iterations);
    let created = state.store.tasks.create(&task).await?;

    state
        .event_bus
        .publish(EventEnvelope::new(Event::TaskCreated {
            task_id: created.task_id,
            input_kind,
        }));
    state.orchestrator.spawn(created.task_id);

    let body = ApiResponse::message("Component generation started")
        .with_task(created.task_id, created.status);
    Ok((StatusCode::ACCEPTED, Json(body)))
}

#[utoipa::path(
    post,
    path = "/api/components/generate/image",
    tag = "generation",
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 202, description = "Task accepted"),
        (status = 400, description = "Invalid submission")
    )
)]
pub async fn generate_from_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Accepted, AppError> {
    let (file, fields) = read_submission(multipart, "image").await?;
    let file = file.ok_or_else(|| AppError::Validation("An image file is required".to_string()))?;
    let mime = validate_file(&state, &file, "image", "image/")?;
    let options = parse_options(&fields)?;

    let metadata = InputMetadata {
        filename: file.filename.clone(),
        mime_type: Some(mime),
        size: Some(file.bytes.len() as u64),
        ..Default::default()
    };
    let input = UserInput::image(file.bytes, options, metadata);

    accept_task(&state, input).await
}

#[utoipa::path(
    post,
    path = "/api/components/generate/video",
    tag = "generation",
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 202, description = "Task accepted"),
        (status = 400, description = "Invalid submission")
    )
)]
pub async fn generate_from_video(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Accepted, AppError> {
    let (file, fields) = read_submission(multipart, "video").await?;
    let file = file.ok_or_else(|| AppError::Validation("A video file is required".to_string()))?;
    let mime = validate_file(&state, &file, "video", "video/")?;
    let options = parse_options(&fields)?;

    let metadata = InputMetadata {
        filename: file.filename.clone(),
        mime_type: Some(mime),
        size: Some(file.bytes.len() as u64),
        ..Default::default()
    };
    // UserInput::video turns animation capture on regardless of options.
    let input = UserInput::video(file.bytes, options, metadata);

    accept_task(&state, input).await
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UrlRequest {
    pub url: String,
    #[serde(default)]
    pub options: Option<GenerationOptions>,
    #[serde(default)]
    pub component_selector: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/components/generate/url",
    tag = "generation",
    request_body = UrlRequest,
    responses(
        (status = 202, description = "Task accepted"),
        (status = 400, description = "Invalid URL")
    )
)]
pub async fn generate_from_url(
    State(state): State<AppState>,
    Json(payload): Json<UrlRequest>,
) -> Result<Accepted, AppError> {
    let parsed = url::Url::parse(&payload.url)
        .map_err(|_| AppError::Validation(format!("Invalid URL: {}", payload.url)))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(AppError::Validation(
            "URL must use the http or https scheme".to_string(),
        ));
    }

    let metadata = InputMetadata {
        original_url: Some(payload.url.clone()),
        component_selector: payload.component_selector,
        ..Default::default()
    };
    let input = UserInput::url(payload.url, payload.options.unwrap_or_default(), metadata);

    accept_task(&state, input).await
}
