pub mod config;
pub mod error;
pub mod response;
pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "PixelGen API",
        version = "0.1.0",
        description = "UI capture to component generation: task lifecycle, quality metrics, and component storage"
    ),
    paths(
        routes::health,
        routes::health_detailed,
        routes::generate_from_image,
        routes::generate_from_video,
        routes::generate_from_url,
        routes::task_status,
        routes::task_result,
        routes::cancel_task,
        routes::task_metrics,
        routes::preview_component,
        routes::task_screenshot,
        routes::submit_feedback,
        routes::list_components,
        routes::get_component,
        routes::delete_component,
    ),
    components(schemas(
        routes::HealthStatus,
        routes::DetailedHealth,
        routes::UrlRequest,
        routes::TaskResult,
        routes::FeedbackRequest,
        routes::ComponentPage,
        pixelgen_core::TaskContext,
        pixelgen_core::TaskStatus,
        pixelgen_core::UserInput,
        pixelgen_core::GenerationOptions,
        pixelgen_core::QualityMetrics,
        pixelgen_core::GeneratedComponent,
        pixelgen_core::AgentResult,
    )),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "generation", description = "Submit captures for component generation"),
        (name = "tasks", description = "Task lifecycle: status, result, cancel, metrics"),
        (name = "components", description = "Stored component CRUD"),
        (name = "feedback", description = "User feedback and refinement"),
    )
)]
pub struct ApiDoc;

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "name": "pixelgen",
        "version": env!("CARGO_PKG_VERSION"),
        "docs": "/swagger-ui",
    }))
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    match origin {
        Some(raw) => match raw.parse::<HeaderValue>() {
            Ok(origin) => CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(Any)
                .allow_headers(Any),
            Err(_) => {
                tracing::warn!(origin = raw, "Invalid CORS origin, allowing any");
                CorsLayer::permissive()
            }
        },
        None => CorsLayer::permissive(),
    }
}

pub fn create_router(state: AppState) -> Router {
    // Multipart overhead on top of the raw file cap.
    let body_limit = state.config.max_file_size + 64 * 1024;
    let cors = cors_layer(state.config.cors_origin.as_deref());

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", ApiDoc::openapi()))
        .route("/", get(root))
        .route("/api/health", get(routes::health))
        .route("/api/health/detailed", get(routes::health_detailed))
        .route(
            "/api/components/generate/image",
            post(routes::generate_from_image),
        )
        .route(
            "/api/components/generate/video",
            post(routes::generate_from_video),
        )
        .route(
            "/api/components/generate/url",
            post(routes::generate_from_url),
        )
        .route(
            "/api/components/task/{task_id}",
            get(routes::task_status).delete(routes::cancel_task),
        )
        .route(
            "/api/components/task/{task_id}/result",
            get(routes::task_result),
        )
        .route("/api/components/metrics/{task_id}", get(routes::task_metrics))
        .route(
            "/api/components/preview/{task_id}",
            get(routes::preview_component),
        )
        .route(
            "/api/components/preview/{task_id}/screenshot",
            get(routes::task_screenshot),
        )
        .route(
            "/api/components/feedback/{task_id}",
            post(routes::submit_feedback),
        )
        .route("/api/components/components", get(routes::list_components))
        .route(
            "/api/components/components/{id}",
            get(routes::get_component).delete(routes::delete_component),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
