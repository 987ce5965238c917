use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_secs: i64,
    pub version: String,
    pub environment: String,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses((status = 200, description = "Service is up", body = ApiResponse<HealthStatus>))
)]
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthStatus>> {
    Json(ApiResponse::ok(HealthStatus {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        uptime_secs: state.uptime_secs(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.environment.clone(),
    }))
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetailedHealth {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_secs: i64,
    pub version: String,
    pub environment: String,
    pub database: String,
    pub tasks_total: i64,
    pub agents: Vec<String>,
    pub events_published: usize,
    pub event_subscribers: usize,
}

#[utoipa::path(
    get,
    path = "/api/health/detailed",
    tag = "health",
    responses((status = 200, description = "Dependency-level health report", body = ApiResponse<DetailedHealth>))
)]
pub async fn health_detailed(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DetailedHealth>>, AppError> {
    let (database, status) = match state.store.ping().await {
        Ok(()) => ("connected".to_string(), "healthy".to_string()),
        Err(err) => {
            tracing::error!("Health check database ping failed: {:?}", err);
            ("error".to_string(), "degraded".to_string())
        }
    };

    let tasks_total = state.store.tasks.count().await.unwrap_or(0);

    Ok(Json(ApiResponse::ok(DetailedHealth {
        status,
        timestamp: Utc::now(),
        uptime_secs: state.uptime_secs(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.environment.clone(),
        database,
        tasks_total,
        agents: state.agent_names.clone(),
        events_published: state.event_bus.event_count(),
        event_subscribers: state.event_bus.subscriber_count(),
    })))
}
