use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use rights_desk::config::Config;
use rights_desk::services::{HttpRightsClient, RightsBackend, SessionSweepTask};
use rights_desk::utils::ScheduledExecutor;
use rights_desk::{AppState, handlers, models};

#[derive(OpenApi)]
#[openapi(
    paths(
        // System
        handlers::system::health,
        // Catalog
        handlers::catalog::list_rights,
        handlers::catalog::refresh_rights,
        handlers::catalog::list_roles,
        // Editor
        handlers::editor::create_session,
        handlers::editor::get_session,
        handlers::editor::close_session,
        handlers::editor::select_role,
        handlers::editor::get_tree,
        handlers::editor::list_modules,
        handlers::editor::toggle_right,
        handlers::editor::toggle_module,
        handlers::editor::set_permission_flag,
        handlers::editor::list_pending,
        handlers::editor::discard_pending,
        handlers::editor::save_changes,
    ),
    components(
        schemas(
            handlers::system::HealthResponse,
            models::Right,
            models::Role,
            models::AssignedRight,
            models::PermissionFlags,
            models::PermissionFlag,
            models::ChangeKind,
            models::PendingChange,
            models::PendingSummary,
            models::RightNode,
            models::ModuleNode,
            models::SaveFailure,
            models::SaveReport,
            models::EditorSessionResponse,
            models::SelectRoleRequest,
            models::ToggleRequest,
            models::SetFlagRequest,
            models::PendingChangesResponse,
        )
    ),
    tags(
        (name = "System", description = "Service health"),
        (name = "Catalog", description = "Rights catalog and roles"),
        (name = "Editor", description = "Role rights editor sessions"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Pick up APP_* variables from a local .env before reading configuration
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    // Initialize logging
    let log_filter = tracing_subscriber::EnvFilter::new(&config.logging.level);
    let registry = tracing_subscriber::registry().with(log_filter);

    // Keeps the non-blocking file writer alive until shutdown
    let mut _log_guard = None;
    if let Some(log_file) = &config.logging.file {
        let log_path = std::path::Path::new(log_file);
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let log_dir = log_path.parent().and_then(|p| p.to_str()).unwrap_or("logs");
        let file_name = log_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("rights-desk.log");
        // Rolling appender adds the date suffix itself
        let file_prefix = file_name.strip_suffix(".log").unwrap_or(file_name);

        let file_appender = tracing_appender::rolling::daily(log_dir, file_prefix);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        _log_guard = Some(guard);
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
            .with(tracing_subscriber::fmt::layer())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
    tracing::info!("Rights Desk starting up");
    tracing::info!("Rights backend: {}", config.backend.base_url);

    let backend: Arc<dyn RightsBackend> = Arc::new(HttpRightsClient::new(&config.backend)?);
    let app_state = Arc::new(AppState::new(backend, config.backend.role_page_size));

    // Sweep idle editor sessions in the background
    let sweeper = SessionSweepTask::new(
        Arc::clone(&app_state.editor_session_service),
        Duration::from_secs(config.editor.session_ttl_secs),
    );
    let executor = ScheduledExecutor::new(
        "editor-session-sweep",
        Duration::from_secs(config.editor.sweep_interval_secs),
    );
    tokio::spawn(executor.start(sweeper));

    let app = Router::new()
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(handlers::api_routes(Arc::clone(&app_state)))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::cors::CorsLayer::permissive());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("API documentation available at http://{}/api-docs", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
