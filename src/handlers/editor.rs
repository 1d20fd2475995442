use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;
use validator::Validate;

use crate::AppState;
use crate::middleware::RequestContext;
use crate::models::{
    EditorSessionResponse, ModuleNode, PendingChangesResponse, SaveReport, SelectRoleRequest,
    SetFlagRequest, ToggleRequest, TreeFilter,
};
use crate::utils::{ApiResult, clean_optional_string};

// Open an editor session
#[utoipa::path(
    post,
    path = "/api/editor/sessions",
    responses(
        (status = 201, description = "Session created", body = EditorSessionResponse),
        (status = 502, description = "Rights backend rejected the request")
    ),
    tag = "Editor"
)]
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> ApiResult<(StatusCode, Json<EditorSessionResponse>)> {
    let session = state.editor_session_service.create_session(&ctx).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

// Get editor session state
#[utoipa::path(
    get,
    path = "/api/editor/sessions/{id}",
    params(("id" = String, Path, description = "Editor session ID")),
    responses(
        (status = 200, description = "Session state", body = EditorSessionResponse),
        (status = 404, description = "Session not found")
    ),
    tag = "Editor"
)]
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> ApiResult<Json<EditorSessionResponse>> {
    let session = state.editor_session_service.get_session(&id, &ctx).await?;
    Ok(Json(session))
}

// Close an editor session, dropping unsaved changes
#[utoipa::path(
    delete,
    path = "/api/editor/sessions/{id}",
    params(("id" = String, Path, description = "Editor session ID")),
    responses(
        (status = 204, description = "Session closed"),
        (status = 404, description = "Session not found")
    ),
    tag = "Editor"
)]
pub async fn close_session(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.editor_session_service.close_session(&id, &ctx).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Select the role being edited
#[utoipa::path(
    put,
    path = "/api/editor/sessions/{id}/role",
    params(("id" = String, Path, description = "Editor session ID")),
    request_body = SelectRoleRequest,
    responses(
        (status = 200, description = "Role selected", body = EditorSessionResponse),
        (status = 404, description = "Session or role not found")
    ),
    tag = "Editor"
)]
pub async fn select_role(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Json(req): Json<SelectRoleRequest>,
) -> ApiResult<Json<EditorSessionResponse>> {
    let session = state
        .editor_session_service
        .select_role(&id, &ctx, req.role_id)
        .await?;
    Ok(Json(session))
}

// Module/right tree of the selected role
#[utoipa::path(
    get,
    path = "/api/editor/sessions/{id}/tree",
    params(("id" = String, Path, description = "Editor session ID"), TreeFilter),
    responses(
        (status = 200, description = "Permission tree", body = Vec<ModuleNode>),
        (status = 404, description = "Session not found")
    ),
    tag = "Editor"
)]
pub async fn get_tree(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Query(filter): Query<TreeFilter>,
) -> ApiResult<Json<Vec<ModuleNode>>> {
    filter.validate()?;
    let search = clean_optional_string(filter.search.as_ref());
    let module = clean_optional_string(filter.module.as_ref());

    let tree = state
        .editor_session_service
        .tree(&id, &ctx, search.as_deref(), module.as_deref())
        .await?;
    Ok(Json(tree))
}

// Module names for the module filter
#[utoipa::path(
    get,
    path = "/api/editor/sessions/{id}/modules",
    params(("id" = String, Path, description = "Editor session ID")),
    responses(
        (status = 200, description = "Module names", body = Vec<String>),
        (status = 404, description = "Session not found")
    ),
    tag = "Editor"
)]
pub async fn list_modules(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<String>>> {
    let modules = state.editor_session_service.modules(&id, &ctx).await?;
    Ok(Json(modules))
}

// Check or uncheck a right
#[utoipa::path(
    post,
    path = "/api/editor/sessions/{id}/rights/{right_id}/toggle",
    params(
        ("id" = String, Path, description = "Editor session ID"),
        ("right_id" = i64, Path, description = "Right ID")
    ),
    request_body = ToggleRequest,
    responses(
        (status = 200, description = "Pending changes after the toggle", body = PendingChangesResponse),
        (status = 400, description = "No role selected"),
        (status = 404, description = "Session or right not found")
    ),
    tag = "Editor"
)]
pub async fn toggle_right(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path((id, right_id)): Path<(String, i64)>,
    Json(req): Json<ToggleRequest>,
) -> ApiResult<Json<PendingChangesResponse>> {
    let pending = state
        .editor_session_service
        .toggle_right(&id, &ctx, right_id, req.checked)
        .await?;
    Ok(Json(pending))
}

// Check or uncheck every right of a module
#[utoipa::path(
    post,
    path = "/api/editor/sessions/{id}/modules/{module}/toggle",
    params(
        ("id" = String, Path, description = "Editor session ID"),
        ("module" = String, Path, description = "Module name")
    ),
    request_body = ToggleRequest,
    responses(
        (status = 200, description = "Pending changes after the toggle", body = PendingChangesResponse),
        (status = 400, description = "No role selected"),
        (status = 404, description = "Session or module not found")
    ),
    tag = "Editor"
)]
pub async fn toggle_module(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path((id, module)): Path<(String, String)>,
    Json(req): Json<ToggleRequest>,
) -> ApiResult<Json<PendingChangesResponse>> {
    let pending = state
        .editor_session_service
        .toggle_module(&id, &ctx, &module, req.checked)
        .await?;
    Ok(Json(pending))
}

// Change one action flag of a right
#[utoipa::path(
    put,
    path = "/api/editor/sessions/{id}/rights/{right_id}/flags",
    params(
        ("id" = String, Path, description = "Editor session ID"),
        ("right_id" = i64, Path, description = "Right ID")
    ),
    request_body = SetFlagRequest,
    responses(
        (status = 200, description = "Pending changes after the edit", body = PendingChangesResponse),
        (status = 400, description = "No role selected"),
        (status = 404, description = "Session or right not found")
    ),
    tag = "Editor"
)]
pub async fn set_permission_flag(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path((id, right_id)): Path<(String, i64)>,
    Json(req): Json<SetFlagRequest>,
) -> ApiResult<Json<PendingChangesResponse>> {
    let pending = state
        .editor_session_service
        .set_permission_flag(&id, &ctx, right_id, req.flag, req.checked)
        .await?;
    Ok(Json(pending))
}

// List unsaved changes
#[utoipa::path(
    get,
    path = "/api/editor/sessions/{id}/pending",
    params(("id" = String, Path, description = "Editor session ID")),
    responses(
        (status = 200, description = "Pending changes", body = PendingChangesResponse),
        (status = 404, description = "Session not found")
    ),
    tag = "Editor"
)]
pub async fn list_pending(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> ApiResult<Json<PendingChangesResponse>> {
    let pending = state.editor_session_service.pending_changes(&id, &ctx).await?;
    Ok(Json(pending))
}

// Discard unsaved changes
#[utoipa::path(
    delete,
    path = "/api/editor/sessions/{id}/pending",
    params(("id" = String, Path, description = "Editor session ID")),
    responses(
        (status = 200, description = "Pending changes after discarding", body = PendingChangesResponse),
        (status = 404, description = "Session not found")
    ),
    tag = "Editor"
)]
pub async fn discard_pending(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> ApiResult<Json<PendingChangesResponse>> {
    let pending = state.editor_session_service.discard_changes(&id, &ctx).await?;
    Ok(Json(pending))
}

// Send pending changes to the rights backend
#[utoipa::path(
    post,
    path = "/api/editor/sessions/{id}/save",
    params(("id" = String, Path, description = "Editor session ID")),
    responses(
        (status = 200, description = "Save summary, including per-right failures", body = SaveReport),
        (status = 400, description = "No role selected"),
        (status = 404, description = "Session not found")
    ),
    tag = "Editor"
)]
pub async fn save_changes(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> ApiResult<Json<SaveReport>> {
    let report = state.editor_session_service.save_changes(&id, &ctx).await?;
    Ok(Json(report))
}
