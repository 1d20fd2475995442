//! Per-user editor sessions
//!
//! Each session owns one [`PermissionEditor`]. Sessions are keyed by a
//! random id and bound to the user that created them; every operation
//! receives the caller's [`RequestContext`] explicitly.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::middleware::RequestContext;
use crate::models::{
    ChangeKind, EditorSessionResponse, ModuleNode, PendingChangesResponse, PermissionFlag,
    PermissionFlags, SaveFailure, SaveReport,
};
use crate::services::catalog_service::CatalogService;
use crate::services::permission_editor::PermissionEditor;
use crate::services::rights_client::RightsBackend;
use crate::utils::{ApiError, ApiResult, ScheduledTask};

pub struct EditorSession {
    pub id: String,
    pub context: RequestContext,
    pub created_at: DateTime<Utc>,
    last_active_ms: AtomicI64,
    editor: Mutex<PermissionEditor>,
}

impl EditorSession {
    fn new(context: RequestContext, editor: PermissionEditor) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            context,
            created_at: now,
            last_active_ms: AtomicI64::new(now.timestamp_millis()),
            editor: Mutex::new(editor),
        }
    }

    fn touch(&self) {
        self.last_active_ms.store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        let idle_ms = now.timestamp_millis() - self.last_active_ms.load(Ordering::Relaxed);
        Duration::from_millis(idle_ms.max(0) as u64)
    }

    async fn describe(&self) -> EditorSessionResponse {
        let editor = self.editor.lock().await;
        EditorSessionResponse {
            session_id: self.id.clone(),
            user_id: self.context.user_id,
            company_id: self.context.company_id,
            selected_role_id: editor.selected_role_id(),
            rights_count: editor.rights().len(),
            roles_count: editor.roles().len(),
            created_at: self.created_at,
        }
    }
}

pub struct EditorSessionService {
    backend: Arc<dyn RightsBackend>,
    catalog: Arc<CatalogService>,
    sessions: DashMap<String, Arc<EditorSession>>,
}

impl EditorSessionService {
    pub fn new(backend: Arc<dyn RightsBackend>, catalog: Arc<CatalogService>) -> Self {
        Self { backend, catalog, sessions: DashMap::new() }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Open an editor with the rights catalog and the caller's roles loaded
    pub async fn create_session(&self, ctx: &RequestContext) -> ApiResult<EditorSessionResponse> {
        let rights = self.catalog.list_rights().await?;
        let roles = self.catalog.list_roles(ctx, None, None).await?;

        let editor = PermissionEditor::new(rights.as_ref().clone(), roles);
        let session = Arc::new(EditorSession::new(ctx.clone(), editor));
        self.sessions.insert(session.id.clone(), Arc::clone(&session));

        tracing::info!("Editor session {} opened for user {}", session.id, ctx.user_id);
        Ok(session.describe().await)
    }

    pub async fn close_session(&self, session_id: &str, ctx: &RequestContext) -> ApiResult<()> {
        self.session(session_id, ctx)?;
        self.sessions.remove(session_id);
        tracing::info!("Editor session {} closed by user {}", session_id, ctx.user_id);
        Ok(())
    }

    pub async fn get_session(
        &self,
        session_id: &str,
        ctx: &RequestContext,
    ) -> ApiResult<EditorSessionResponse> {
        let session = self.session(session_id, ctx)?;
        Ok(session.describe().await)
    }

    fn session(&self, session_id: &str, ctx: &RequestContext) -> ApiResult<Arc<EditorSession>> {
        let session = self
            .sessions
            .get(session_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ApiError::not_found(format!("Editor session {} not found", session_id)))?;

        if session.context.user_id != ctx.user_id {
            tracing::warn!(
                "User {} tried to use editor session {} owned by user {}",
                ctx.user_id,
                session_id,
                session.context.user_id
            );
            return Err(ApiError::forbidden("Editor session belongs to another user"));
        }

        session.touch();
        Ok(session)
    }

    /// Switch the session to another role and load its assigned rights.
    ///
    /// The editor is not locked while the fetch is in flight. If another
    /// selection is made meanwhile, this response is dropped and the session
    /// reports whichever role ended up selected.
    pub async fn select_role(
        &self,
        session_id: &str,
        ctx: &RequestContext,
        role_id: i64,
    ) -> ApiResult<EditorSessionResponse> {
        let session = self.session(session_id, ctx)?;

        let ticket = {
            let mut editor = session.editor.lock().await;
            if !editor.roles().iter().any(|r| r.role_id == role_id) {
                return Err(ApiError::not_found(format!("Role {} not found", role_id)));
            }
            editor.begin_role_switch(role_id)
        };

        let assigned = self.backend.fetch_assigned_rights(role_id).await.map_err(|e| {
            tracing::warn!(
                "Failed to load assigned rights for role {} in session {}: {}",
                role_id,
                session_id,
                e
            );
            e
        })?;

        {
            let mut editor = session.editor.lock().await;
            if editor.complete_role_switch(ticket, assigned) {
                tracing::info!("Session {} switched to role {}", session_id, role_id);
            }
        }

        Ok(session.describe().await)
    }

    pub async fn tree(
        &self,
        session_id: &str,
        ctx: &RequestContext,
        search: Option<&str>,
        module: Option<&str>,
    ) -> ApiResult<Vec<ModuleNode>> {
        let session = self.session(session_id, ctx)?;
        let editor = session.editor.lock().await;
        Ok(editor.build_tree(search, module))
    }

    pub async fn modules(&self, session_id: &str, ctx: &RequestContext) -> ApiResult<Vec<String>> {
        let session = self.session(session_id, ctx)?;
        let editor = session.editor.lock().await;
        Ok(editor.modules())
    }

    pub async fn toggle_right(
        &self,
        session_id: &str,
        ctx: &RequestContext,
        right_id: i64,
        checked: bool,
    ) -> ApiResult<PendingChangesResponse> {
        let session = self.session(session_id, ctx)?;
        let mut editor = session.editor.lock().await;
        editor.toggle_right(right_id, checked)?;
        tracing::debug!("Session {}: right {} set to {}", session_id, right_id, checked);
        Ok(pending_response(&editor))
    }

    pub async fn toggle_module(
        &self,
        session_id: &str,
        ctx: &RequestContext,
        module: &str,
        checked: bool,
    ) -> ApiResult<PendingChangesResponse> {
        let session = self.session(session_id, ctx)?;
        let mut editor = session.editor.lock().await;
        editor.toggle_module(module, checked)?;
        Ok(pending_response(&editor))
    }

    pub async fn set_permission_flag(
        &self,
        session_id: &str,
        ctx: &RequestContext,
        right_id: i64,
        flag: PermissionFlag,
        checked: bool,
    ) -> ApiResult<PendingChangesResponse> {
        let session = self.session(session_id, ctx)?;
        let mut editor = session.editor.lock().await;
        editor.set_permission_flag(right_id, flag, checked)?;
        tracing::debug!(
            "Session {}: right {} flag {:?} set to {}",
            session_id,
            right_id,
            flag,
            checked
        );
        Ok(pending_response(&editor))
    }

    pub async fn pending_changes(
        &self,
        session_id: &str,
        ctx: &RequestContext,
    ) -> ApiResult<PendingChangesResponse> {
        let session = self.session(session_id, ctx)?;
        let editor = session.editor.lock().await;
        Ok(pending_response(&editor))
    }

    pub async fn discard_changes(
        &self,
        session_id: &str,
        ctx: &RequestContext,
    ) -> ApiResult<PendingChangesResponse> {
        let session = self.session(session_id, ctx)?;
        let mut editor = session.editor.lock().await;
        let discarded = editor.discard_changes();
        tracing::info!("Session {}: discarded {} pending changes", session_id, discarded);
        Ok(pending_response(&editor))
    }

    /// Send every pending change to the backend, one call per entry, in order.
    ///
    /// A failed call does not stop the batch. Accepted entries leave the
    /// pending set; rejected ones stay for a retry. When anything was accepted
    /// the assignments are re-fetched so the tree shows what the backend holds.
    pub async fn save_changes(
        &self,
        session_id: &str,
        ctx: &RequestContext,
    ) -> ApiResult<SaveReport> {
        let session = self.session(session_id, ctx)?;
        let mut editor = session.editor.lock().await;

        let role_id = editor
            .selected_role_id()
            .ok_or_else(|| ApiError::validation_error("Select a role before saving"))?;

        let changes = editor.pending_changes();
        if changes.is_empty() {
            tracing::debug!("Session {}: nothing to save for role {}", session_id, role_id);
            return Ok(SaveReport::nothing_to_save(role_id));
        }

        tracing::info!(
            "Session {}: saving {} pending changes for role {}",
            session_id,
            changes.len(),
            role_id
        );

        let mut succeeded = 0;
        let mut failures = Vec::new();

        for change in changes {
            let flags = change.flags.unwrap_or_else(PermissionFlags::all);
            let result = match change.kind {
                ChangeKind::Delete => {
                    self.backend.delete_right_from_role(role_id, change.right_id).await
                },
                ChangeKind::Add => {
                    self.backend.add_right_to_role(role_id, change.right_id, flags).await
                },
                ChangeKind::Update => {
                    self.backend.update_right_to_role(role_id, change.right_id, flags).await
                },
            };

            match result {
                Ok(()) => {
                    editor.settle_change(&change);
                    succeeded += 1;
                },
                Err(e) => {
                    let display_name = editor.right_display_name(change.right_id);
                    tracing::warn!(
                        "Session {}: {} of right '{}' failed: {}",
                        session_id,
                        change.kind,
                        display_name,
                        e
                    );
                    failures.push(SaveFailure {
                        right_id: change.right_id,
                        display_name,
                        kind: change.kind,
                        message: failure_message(e),
                    });
                },
            }
        }

        let mut report = SaveReport::from_results(role_id, succeeded, failures);

        // Settled changes already mirror the backend locally; a failed reload
        // is reported but does not roll them back.
        if succeeded > 0
            && let Some(ticket) = editor.refresh_ticket()
        {
            match self.backend.fetch_assigned_rights(role_id).await {
                Ok(assigned) => {
                    editor.apply_assigned_rights(ticket, assigned);
                },
                Err(e) => {
                    tracing::warn!(
                        "Session {}: saved changes but failed to reload rights of role {}: {}",
                        session_id,
                        role_id,
                        e
                    );
                    report.mark_refresh_failed(failure_message(e));
                },
            }
        }

        if report.is_success() {
            tracing::info!("Session {}: {}", session_id, report.message);
        } else {
            tracing::warn!("Session {}: {}", session_id, report.message);
        }
        Ok(report)
    }

    /// Drop sessions idle for longer than `ttl`
    pub fn sweep_idle_sessions(&self, ttl: Duration) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.idle_for(now) <= ttl);
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            tracing::info!("Swept {} idle editor sessions", removed);
        }
        removed
    }
}

fn pending_response(editor: &PermissionEditor) -> PendingChangesResponse {
    PendingChangesResponse {
        role_id: editor.selected_role_id(),
        summary: editor.pending_summary(),
        changes: editor.pending_changes(),
    }
}

/// Backend errors are relayed as the raw response text
fn failure_message(err: ApiError) -> String {
    match err {
        ApiError::BackendError(msg) | ApiError::BackendUnavailable(msg) => msg,
        other => other.to_string(),
    }
}

/// Background sweep of idle editor sessions
pub struct SessionSweepTask {
    service: Arc<EditorSessionService>,
    ttl: Duration,
}

impl SessionSweepTask {
    pub fn new(service: Arc<EditorSessionService>, ttl: Duration) -> Self {
        Self { service, ttl }
    }
}

impl ScheduledTask for SessionSweepTask {
    fn run(&self) -> Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send + '_>> {
        Box::pin(async move {
            self.service.sweep_idle_sessions(self.ttl);
            Ok(())
        })
    }
}
