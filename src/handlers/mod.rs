pub mod catalog;
pub mod editor;
pub mod system;

use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;

use crate::AppState;

/// API routes, without docs or HTTP layers
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(system::health))
        // Catalog
        .route("/api/rights", get(catalog::list_rights))
        .route("/api/rights/refresh", post(catalog::refresh_rights))
        .route("/api/roles", get(catalog::list_roles))
        // Editor sessions
        .route("/api/editor/sessions", post(editor::create_session))
        .route(
            "/api/editor/sessions/:id",
            get(editor::get_session).delete(editor::close_session),
        )
        .route("/api/editor/sessions/:id/role", put(editor::select_role))
        .route("/api/editor/sessions/:id/tree", get(editor::get_tree))
        .route("/api/editor/sessions/:id/modules", get(editor::list_modules))
        .route(
            "/api/editor/sessions/:id/rights/:right_id/toggle",
            post(editor::toggle_right),
        )
        .route(
            "/api/editor/sessions/:id/rights/:right_id/flags",
            put(editor::set_permission_flag),
        )
        .route(
            "/api/editor/sessions/:id/modules/:module/toggle",
            post(editor::toggle_module),
        )
        .route(
            "/api/editor/sessions/:id/pending",
            get(editor::list_pending).delete(editor::discard_pending),
        )
        .route("/api/editor/sessions/:id/save", post(editor::save_changes))
        .with_state(state)
}
