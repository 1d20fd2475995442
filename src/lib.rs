//! Rights Desk Library
//!
//! Role rights editor for the back-office portal: keeps per-user editor
//! sessions over the rights catalog and relays saved edits to the
//! back-office REST API.

use std::sync::Arc;

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use config::Config;
pub use services::{
    CatalogService, EditorSessionService, HttpRightsClient, PermissionEditor, RightsBackend,
};

/// Application shared state
#[derive(Clone)]
pub struct AppState {
    pub catalog_service: Arc<CatalogService>,
    pub editor_session_service: Arc<EditorSessionService>,
}

impl AppState {
    pub fn new(backend: Arc<dyn RightsBackend>, role_page_size: u32) -> Self {
        let catalog_service = Arc::new(CatalogService::new(Arc::clone(&backend), role_page_size));
        let editor_session_service = Arc::new(EditorSessionService::new(
            backend,
            Arc::clone(&catalog_service),
        ));
        Self { catalog_service, editor_session_service }
    }
}
