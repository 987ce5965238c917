use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use pixelgen_core::GeneratedComponent;

use crate::error::AppError;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComponentPage {
    pub components: Vec<GeneratedComponent>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

#[utoipa::path(
    get,
    path = "/api/components/components",
    tag = "components",
    params(
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("limit" = Option<u32>, Query, description = "Page size, capped at 100")
    ),
    responses((status = 200, description = "Stored components, newest first", body = ApiResponse<ComponentPage>))
)]
pub async fn list_components(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<ComponentPage>>, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let (components, total) = state.store.components.list(page, limit).await?;
    Ok(Json(ApiResponse::ok(ComponentPage {
        components,
        total,
        page,
        limit,
    })))
}

#[utoipa::path(
    get,
    path = "/api/components/components/{id}",
    tag = "components",
    params(("id" = Uuid, Path, description = "Component identifier")),
    responses(
        (status = 200, description = "Stored component", body = ApiResponse<GeneratedComponent>),
        (status = 404, description = "Unknown component")
    )
)]
pub async fn get_component(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<GeneratedComponent>>, AppError> {
    let component = state
        .store
        .components
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Component not found: {}", id)))?;
    Ok(Json(ApiResponse::ok(component)))
}

#[utoipa::path(
    delete,
    path = "/api/components/components/{id}",
    tag = "components",
    params(("id" = Uuid, Path, description = "Component identifier")),
    responses(
        (status = 200, description = "Component deleted"),
        (status = 404, description = "Unknown component")
    )
)]
pub async fn delete_component(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let deleted = state.store.components.delete(id).await?;
    if deleted {
        Ok(Json(ApiResponse::message("Component deleted")))
    } else {
        Err(AppError::NotFound(format!("Component not found: {}", id)))
    }
}
