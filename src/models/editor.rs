use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::{PermissionFlag, PermissionFlags};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Add,
    Update,
    Delete,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Unsaved local edit for one right of the selected role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingChange {
    pub right_id: i64,
    pub kind: ChangeKind,
    /// Present for `add` and `update`
    pub flags: Option<PermissionFlags>,
}

impl PendingChange {
    pub fn add(right_id: i64, flags: PermissionFlags) -> Self {
        Self { right_id, kind: ChangeKind::Add, flags: Some(flags) }
    }

    pub fn update(right_id: i64, flags: PermissionFlags) -> Self {
        Self { right_id, kind: ChangeKind::Update, flags: Some(flags) }
    }

    pub fn delete(right_id: i64) -> Self {
        Self { right_id, kind: ChangeKind::Delete, flags: None }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct PendingSummary {
    pub adds: usize,
    pub updates: usize,
    pub deletes: usize,
    pub total: usize,
}

/// Selection and flags of a right after overlaying pending edits on the assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveState {
    pub is_selected: bool,
    pub flags: PermissionFlags,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TreeFilter {
    #[validate(length(max = 200))]
    pub search: Option<String>,
    pub module: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RightNode {
    pub right_id: i64,
    pub right_code: String,
    pub display_name: String,
    pub description: Option<String>,
    pub module: String,
    pub category: Option<String>,
    pub is_selected: bool,
    pub flags: PermissionFlags,
    pub pending: Option<ChangeKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModuleNode {
    pub module: String,
    pub is_selected: bool,
    pub is_indeterminate: bool,
    pub selected_count: usize,
    pub total_count: usize,
    pub rights: Vec<RightNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveFailure {
    pub right_id: i64,
    pub display_name: String,
    pub kind: ChangeKind,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveReport {
    pub role_id: i64,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<SaveFailure>,
    pub nothing_to_save: bool,
    /// Set when the changes were saved but the assignments could not be reloaded
    pub refresh_failed: bool,
    pub message: String,
    pub finished_at: DateTime<Utc>,
}

impl SaveReport {
    pub fn nothing_to_save(role_id: i64) -> Self {
        Self {
            role_id,
            succeeded: 0,
            failed: 0,
            failures: Vec::new(),
            nothing_to_save: true,
            refresh_failed: false,
            message: "Nothing to save".to_string(),
            finished_at: Utc::now(),
        }
    }

    pub fn from_results(role_id: i64, succeeded: usize, failures: Vec<SaveFailure>) -> Self {
        let failed = failures.len();
        let mut message = format!("{} succeeded, {} failed", succeeded, failed);
        if !failures.is_empty() {
            let names: Vec<&str> = failures.iter().map(|f| f.display_name.as_str()).collect();
            message.push_str(&format!(": {}", names.join(", ")));
        }
        Self {
            role_id,
            succeeded,
            failed,
            failures,
            nothing_to_save: false,
            refresh_failed: false,
            message,
            finished_at: Utc::now(),
        }
    }

    pub fn mark_refresh_failed(&mut self, reason: impl AsRef<str>) {
        self.refresh_failed = true;
        self.message
            .push_str(&format!("; reloading assigned rights failed: {}", reason.as_ref()));
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0 && !self.refresh_failed
    }
}

// ---------------------------------------------------------------------------
// Request / response bodies of the editor endpoints
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct EditorSessionResponse {
    pub session_id: String,
    pub user_id: i64,
    pub company_id: Option<i64>,
    pub selected_role_id: Option<i64>,
    pub rights_count: usize,
    pub roles_count: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectRoleRequest {
    pub role_id: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ToggleRequest {
    pub checked: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetFlagRequest {
    pub flag: PermissionFlag,
    pub checked: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PendingChangesResponse {
    pub role_id: Option<i64>,
    pub summary: PendingSummary,
    pub changes: Vec<PendingChange>,
}
