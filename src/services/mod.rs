pub mod catalog_service;
pub mod editor_session_service;
pub mod pending_changes;
pub mod permission_editor;
pub mod rights_client;
pub mod tree_builder;

pub use catalog_service::CatalogService;
pub use editor_session_service::{EditorSession, EditorSessionService, SessionSweepTask};
pub use pending_changes::PendingChanges;
pub use permission_editor::{PermissionEditor, RoleSwitchTicket};
pub use rights_client::{HttpRightsClient, RightsBackend};
pub use tree_builder::{build_tree, effective_state};
