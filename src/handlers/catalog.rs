use axum::{
    Json,
    extract::{Query, State},
};
use std::sync::Arc;
use validator::Validate;

use crate::AppState;
use crate::middleware::RequestContext;
use crate::models::{Right, Role, RoleListQuery};
use crate::utils::ApiResult;

// List the rights catalog
#[utoipa::path(
    get,
    path = "/api/rights",
    responses(
        (status = 200, description = "Rights catalog", body = Vec<Right>),
        (status = 502, description = "Rights backend rejected the request")
    ),
    tag = "Catalog"
)]
pub async fn list_rights(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> ApiResult<Json<Vec<Right>>> {
    let rights = state.catalog_service.list_rights().await?;
    tracing::debug!("Returning {} rights to user {}", rights.len(), ctx.user_id);
    Ok(Json(rights.as_ref().clone()))
}

// Refetch the rights catalog from the backend
#[utoipa::path(
    post,
    path = "/api/rights/refresh",
    responses(
        (status = 200, description = "Refreshed rights catalog", body = Vec<Right>),
        (status = 502, description = "Rights backend rejected the request")
    ),
    tag = "Catalog"
)]
pub async fn refresh_rights(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> ApiResult<Json<Vec<Right>>> {
    tracing::info!("Rights catalog refresh requested by user {}", ctx.user_id);
    let rights = state.catalog_service.refresh_rights().await?;
    Ok(Json(rights.as_ref().clone()))
}

// List roles visible to the caller's company
#[utoipa::path(
    get,
    path = "/api/roles",
    params(RoleListQuery),
    responses(
        (status = 200, description = "List of roles", body = Vec<Role>),
        (status = 400, description = "Invalid paging parameters")
    ),
    tag = "Catalog"
)]
pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Query(query): Query<RoleListQuery>,
) -> ApiResult<Json<Vec<Role>>> {
    query.validate()?;
    let roles = state
        .catalog_service
        .list_roles(&ctx, query.page, query.page_size)
        .await?;
    tracing::debug!("Retrieved {} roles for user {}", roles.len(), ctx.user_id);
    Ok(Json(roles))
}
