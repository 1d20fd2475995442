//! In-memory role rights editor
//!
//! Holds the rights catalog, the assignments of the selected role as last
//! confirmed by the backend, and the local edits made on top of them. All
//! operations here are synchronous; network calls live in
//! [`crate::services::EditorSessionService`].

use std::collections::HashMap;

use crate::models::{
    AssignedRight, ChangeKind, EffectiveState, ModuleNode, PendingChange, PendingSummary,
    PermissionFlag, PermissionFlags, Right, Role,
};
use crate::services::pending_changes::PendingChanges;
use crate::services::tree_builder::{build_tree, effective_state};
use crate::utils::{ApiError, ApiResult, unique_ordered, vec_to_map};

/// Identifies one assigned-rights fetch issued for a role switch.
///
/// A response is applied only if the editor is still on the same role and no
/// newer switch happened in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSwitchTicket {
    pub role_id: i64,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct PermissionEditor {
    rights: Vec<Right>,
    roles: Vec<Role>,
    selected_role_id: Option<i64>,
    generation: u64,
    assigned: HashMap<i64, AssignedRight>,
    pending: PendingChanges,
}

impl PermissionEditor {
    pub fn new(rights: Vec<Right>, roles: Vec<Role>) -> Self {
        Self { rights, roles, ..Default::default() }
    }

    pub fn rights(&self) -> &[Right] {
        &self.rights
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn selected_role_id(&self) -> Option<i64> {
        self.selected_role_id
    }

    pub fn assigned_rights(&self) -> &HashMap<i64, AssignedRight> {
        &self.assigned
    }

    pub fn right(&self, right_id: i64) -> Option<&Right> {
        self.rights.iter().find(|r| r.right_id == right_id)
    }

    /// Display name used when reporting on a right, falling back to its id
    pub fn right_display_name(&self, right_id: i64) -> String {
        self.right(right_id)
            .map(|r| r.display_name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("Right #{}", right_id))
    }

    /// Distinct module names of the catalog, sorted
    pub fn modules(&self) -> Vec<String> {
        let mut modules = unique_ordered(self.rights.iter().map(|r| r.module.clone()).collect());
        modules.sort();
        modules
    }

    // ------------------------------------------------------------------
    // Role switching
    // ------------------------------------------------------------------

    /// Start switching to another role.
    ///
    /// Nothing changes until the matching fetch is handed to
    /// [`Self::complete_role_switch`]; a failed fetch leaves the current role intact.
    pub fn begin_role_switch(&mut self, role_id: i64) -> RoleSwitchTicket {
        self.generation += 1;
        RoleSwitchTicket { role_id, generation: self.generation }
    }

    /// Finish a role switch with the fetched assignments.
    ///
    /// Drafts and assignments of the previous role are dropped. Returns false
    /// and changes nothing when a newer switch was started in the meantime.
    pub fn complete_role_switch(
        &mut self,
        ticket: RoleSwitchTicket,
        assigned: Vec<AssignedRight>,
    ) -> bool {
        if self.generation != ticket.generation {
            tracing::warn!(
                "Discarding stale assigned rights for role {} (superseded by a newer selection)",
                ticket.role_id
            );
            return false;
        }

        if !self.pending.is_empty() {
            tracing::info!(
                "Discarding {} pending changes of role {:?} on switch to role {}",
                self.pending.len(),
                self.selected_role_id,
                ticket.role_id
            );
        }

        self.selected_role_id = Some(ticket.role_id);
        self.pending.clear();
        self.assigned = vec_to_map(assigned, |a| a.right_id);
        tracing::debug!(
            "Selected role {} with {} assigned rights",
            ticket.role_id,
            self.assigned.len()
        );
        true
    }

    /// Ticket for re-fetching the assignments of the current role
    pub fn refresh_ticket(&self) -> Option<RoleSwitchTicket> {
        self.selected_role_id
            .map(|role_id| RoleSwitchTicket { role_id, generation: self.generation })
    }

    /// Replace the assignments of the current role, keeping pending changes.
    /// Returns false for a stale response.
    pub fn apply_assigned_rights(
        &mut self,
        ticket: RoleSwitchTicket,
        assigned: Vec<AssignedRight>,
    ) -> bool {
        if self.selected_role_id != Some(ticket.role_id) || self.generation != ticket.generation {
            tracing::warn!(
                "Discarding stale assigned rights for role {} (current role: {:?})",
                ticket.role_id,
                self.selected_role_id
            );
            return false;
        }

        self.assigned = vec_to_map(assigned, |a| a.right_id);
        tracing::debug!(
            "Refreshed {} assigned rights for role {}",
            self.assigned.len(),
            ticket.role_id
        );
        true
    }

    fn require_role(&self) -> ApiResult<i64> {
        self.selected_role_id
            .ok_or_else(|| ApiError::validation_error("Select a role before editing rights"))
    }

    fn require_right(&self, right_id: i64) -> ApiResult<()> {
        match self.right(right_id) {
            Some(_) => Ok(()),
            None => Err(ApiError::not_found(format!("Right {} not found", right_id))),
        }
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    pub fn effective_state(&self, right_id: i64) -> EffectiveState {
        effective_state(self.assigned.get(&right_id), self.pending.get(right_id))
    }

    /// Check or uncheck a right
    pub fn toggle_right(&mut self, right_id: i64, checked: bool) -> ApiResult<()> {
        self.require_role()?;
        self.require_right(right_id)?;
        self.apply_toggle(right_id, checked);
        Ok(())
    }

    /// Toggle every right of a module, in catalog order
    pub fn toggle_module(&mut self, module: &str, checked: bool) -> ApiResult<usize> {
        self.require_role()?;

        let right_ids: Vec<i64> = self
            .rights
            .iter()
            .filter(|r| r.module == module)
            .map(|r| r.right_id)
            .collect();

        if right_ids.is_empty() {
            return Err(ApiError::not_found(format!("Module '{}' has no rights", module)));
        }

        for right_id in &right_ids {
            self.apply_toggle(*right_id, checked);
        }

        tracing::debug!(
            "Toggled {} rights of module '{}' to {}",
            right_ids.len(),
            module,
            checked
        );
        Ok(right_ids.len())
    }

    fn apply_toggle(&mut self, right_id: i64, checked: bool) {
        let is_assigned = self.assigned.contains_key(&right_id);
        let pending_kind = self.pending.get(right_id).map(|c| c.kind);
        let is_effective = self.effective_state(right_id).is_selected;

        if checked && !is_effective {
            if !is_assigned {
                self.pending.set(PendingChange::add(right_id, PermissionFlags::all()));
            } else if pending_kind == Some(ChangeKind::Delete) {
                self.pending.remove(right_id);
            }
        } else if !checked && is_effective {
            if is_assigned {
                self.pending.set(PendingChange::delete(right_id));
            } else {
                // Only existed as a local add, nothing to delete on the server
                self.pending.remove(right_id);
            }
        }
    }

    /// Change one action flag of a right
    pub fn set_permission_flag(
        &mut self,
        right_id: i64,
        flag: PermissionFlag,
        checked: bool,
    ) -> ApiResult<()> {
        self.require_role()?;
        self.require_right(right_id)?;

        let assigned_flags = self.assigned.get(&right_id).map(AssignedRight::flags);
        let current = match self.pending.get(right_id) {
            Some(PendingChange { flags: Some(flags), .. }) => *flags,
            _ => assigned_flags.unwrap_or_else(PermissionFlags::none),
        };
        let updated = current.with(flag, checked);

        match assigned_flags {
            None => self.pending.set(PendingChange::add(right_id, updated)),
            Some(original) if original != updated => {
                self.pending.set(PendingChange::update(right_id, updated))
            },
            Some(_) => {
                self.pending.remove(right_id);
            },
        }
        Ok(())
    }

    pub fn discard_changes(&mut self) -> usize {
        let discarded = self.pending.len();
        self.pending.clear();
        discarded
    }

    // ------------------------------------------------------------------
    // Read side
    // ------------------------------------------------------------------

    pub fn pending(&self) -> &PendingChanges {
        &self.pending
    }

    pub fn pending_changes(&self) -> Vec<PendingChange> {
        self.pending.to_vec()
    }

    pub fn pending_summary(&self) -> PendingSummary {
        self.pending.summary()
    }

    /// Fold a change the backend has accepted into the assignments and drop
    /// its pending entry, so the editor matches the backend even when the
    /// following reload fails.
    pub fn settle_change(&mut self, change: &PendingChange) {
        self.pending.remove(change.right_id);
        let Some(role_id) = self.selected_role_id else {
            return;
        };

        match change.kind {
            ChangeKind::Delete => {
                self.assigned.remove(&change.right_id);
            },
            ChangeKind::Add | ChangeKind::Update => {
                let flags = change.flags.unwrap_or_else(PermissionFlags::all);
                self.assigned
                    .insert(change.right_id, AssignedRight::new(role_id, change.right_id, flags));
            },
        }
    }

    pub fn build_tree(&self, search: Option<&str>, module: Option<&str>) -> Vec<ModuleNode> {
        build_tree(&self.rights, &self.assigned, &self.pending, search, module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn right(id: i64, name: &str, module: &str) -> Right {
        Right {
            right_id: id,
            right_code: format!("R{}", id),
            table_name: None,
            display_name: name.to_string(),
            description: None,
            module: module.to_string(),
            category: None,
            is_active: true,
        }
    }

    /// Role 5 selected; right 2 assigned with all flags
    fn editor() -> PermissionEditor {
        let mut editor = PermissionEditor::new(
            vec![
                right(1, "Invoices", "Billing"),
                right(2, "Receipts", "Billing"),
                right(3, "Job Orders", "Operations"),
            ],
            vec![],
        );
        let ticket = editor.begin_role_switch(5);
        assert!(editor.complete_role_switch(
            ticket,
            vec![AssignedRight::new(5, 2, PermissionFlags::all())]
        ));
        editor
    }

    #[test]
    fn test_toggle_requires_role() {
        let mut editor = PermissionEditor::new(vec![right(1, "Invoices", "Billing")], vec![]);
        let result = editor.toggle_right(1, true);
        assert!(matches!(result, Err(ApiError::ValidationError(_))));
        assert!(editor.pending().is_empty());

        let result = editor.toggle_module("Billing", true);
        assert!(matches!(result, Err(ApiError::ValidationError(_))));
        assert!(editor.pending().is_empty());
    }

    #[test]
    fn test_toggle_unknown_right() {
        let mut editor = editor();
        assert!(matches!(editor.toggle_right(99, true), Err(ApiError::ResourceNotFound(_))));
    }

    #[test]
    fn test_add_then_remove_collapses() {
        let mut editor = editor();
        editor.toggle_right(1, true).unwrap();
        assert_eq!(editor.pending_changes(), vec![PendingChange::add(1, PermissionFlags::all())]);

        editor.toggle_right(1, false).unwrap();
        assert!(editor.pending().is_empty());
    }

    #[test]
    fn test_delete_then_restore_collapses() {
        let mut editor = editor();
        editor.toggle_right(2, false).unwrap();
        assert_eq!(editor.pending_changes(), vec![PendingChange::delete(2)]);
        assert!(!editor.effective_state(2).is_selected);

        editor.toggle_right(2, true).unwrap();
        assert!(editor.pending().is_empty());
        assert!(editor.effective_state(2).is_selected);
    }

    #[test]
    fn test_redundant_toggles_are_ignored() {
        let mut editor = editor();
        editor.toggle_right(2, true).unwrap();
        editor.toggle_right(3, false).unwrap();
        assert!(editor.pending().is_empty());
    }

    #[test]
    fn test_set_flag_on_unassigned_creates_add() {
        let mut editor = editor();
        editor.toggle_right(1, true).unwrap();
        editor.set_permission_flag(1, PermissionFlag::AllowDelete, false).unwrap();

        let expected = PermissionFlags::all().with(PermissionFlag::AllowDelete, false);
        assert_eq!(editor.pending_changes(), vec![PendingChange::add(1, expected)]);
    }

    #[test]
    fn test_set_flag_without_toggle_creates_add_from_blank() {
        let mut editor = editor();
        editor.set_permission_flag(3, PermissionFlag::AllowGetList, true).unwrap();

        let expected = PermissionFlags::none().with(PermissionFlag::AllowGetList, true);
        assert_eq!(editor.pending_changes(), vec![PendingChange::add(3, expected)]);
        assert!(editor.effective_state(3).is_selected);
    }

    #[test]
    fn test_set_flag_back_to_original_removes_update() {
        let mut editor = editor();
        editor.set_permission_flag(2, PermissionFlag::AllowPrint, false).unwrap();
        let expected = PermissionFlags::all().with(PermissionFlag::AllowPrint, false);
        assert_eq!(editor.pending_changes(), vec![PendingChange::update(2, expected)]);

        editor.set_permission_flag(2, PermissionFlag::AllowPrint, true).unwrap();
        assert!(editor.pending().is_empty());
    }

    #[test]
    fn test_single_entry_per_right() {
        let mut editor = editor();
        editor.set_permission_flag(2, PermissionFlag::AllowInsert, false).unwrap();
        editor.set_permission_flag(2, PermissionFlag::AllowUpdate, false).unwrap();
        editor.toggle_right(2, false).unwrap();
        editor.toggle_right(2, true).unwrap();
        editor.set_permission_flag(2, PermissionFlag::AllowDelete, false).unwrap();

        assert_eq!(editor.pending().iter().filter(|c| c.right_id == 2).count(), 1);
        assert_eq!(editor.pending().len(), 1);
    }

    #[test]
    fn test_toggle_module_matches_individual_toggles() {
        let mut by_module = editor();
        let count = by_module.toggle_module("Billing", true).unwrap();
        assert_eq!(count, 2);

        let mut by_right = editor();
        by_right.toggle_right(1, true).unwrap();
        by_right.toggle_right(2, true).unwrap();

        assert_eq!(by_module.pending_changes(), by_right.pending_changes());

        by_module.toggle_module("Billing", false).unwrap();
        assert_eq!(by_module.pending_changes(), vec![PendingChange::delete(2)]);
        assert!(matches!(
            by_module.toggle_module("Nope", true),
            Err(ApiError::ResourceNotFound(_))
        ));
    }

    #[test]
    fn test_role_switch_discards_drafts() {
        let mut editor = editor();
        editor.toggle_right(1, true).unwrap();
        editor.toggle_right(2, false).unwrap();

        let ticket = editor.begin_role_switch(7);
        // Still on role 5 until the fetch lands
        assert_eq!(editor.selected_role_id(), Some(5));
        assert_eq!(editor.pending().len(), 2);

        assert!(editor.complete_role_switch(
            ticket,
            vec![AssignedRight::new(7, 3, PermissionFlags::all())]
        ));
        assert_eq!(editor.selected_role_id(), Some(7));
        assert!(editor.pending().is_empty());
        assert_eq!(editor.assigned_rights().len(), 1);
        assert!(editor.assigned_rights().contains_key(&3));
        assert!(!editor.assigned_rights().contains_key(&2));
    }

    #[test]
    fn test_stale_fetch_is_discarded() {
        let mut editor = PermissionEditor::new(vec![right(1, "Invoices", "Billing")], vec![]);
        let first = editor.begin_role_switch(5);
        let second = editor.begin_role_switch(6);

        assert!(!editor.complete_role_switch(
            first,
            vec![AssignedRight::new(5, 1, PermissionFlags::all())]
        ));
        assert_eq!(editor.selected_role_id(), None);
        assert!(editor.assigned_rights().is_empty());

        assert!(editor.complete_role_switch(second, vec![]));
        assert_eq!(editor.selected_role_id(), Some(6));

        // Switching away and back still invalidates the older ticket
        let third = editor.begin_role_switch(5);
        assert!(!editor.complete_role_switch(first, vec![]));
        assert!(editor.complete_role_switch(third, vec![]));
        assert_eq!(editor.selected_role_id(), Some(5));
    }

    #[test]
    fn test_refresh_keeps_pending_and_rejects_stale() {
        let mut editor = editor();
        editor.toggle_right(1, true).unwrap();

        let refresh = editor.refresh_ticket().unwrap();
        assert!(editor.apply_assigned_rights(
            refresh,
            vec![
                AssignedRight::new(5, 2, PermissionFlags::all()),
                AssignedRight::new(5, 3, PermissionFlags::none()),
            ]
        ));
        assert_eq!(editor.assigned_rights().len(), 2);
        assert_eq!(editor.pending().len(), 1);

        let stale = editor.refresh_ticket().unwrap();
        let _ = editor.begin_role_switch(9);
        assert!(!editor.apply_assigned_rights(stale, vec![]));
        assert_eq!(editor.assigned_rights().len(), 2);
    }

    #[test]
    fn test_modules_sorted_and_unique() {
        let editor = editor();
        assert_eq!(editor.modules(), vec!["Billing".to_string(), "Operations".to_string()]);
    }

    #[test]
    fn test_discard_changes() {
        let mut editor = editor();
        editor.toggle_right(1, true).unwrap();
        editor.toggle_right(3, true).unwrap();
        assert_eq!(editor.discard_changes(), 2);
        assert!(editor.pending().is_empty());
    }

    #[test]
    fn test_settled_changes_update_assignments() {
        let mut editor = editor();
        editor.toggle_right(1, true).unwrap();
        editor.set_permission_flag(1, PermissionFlag::AllowPrint, false).unwrap();
        editor.toggle_right(2, false).unwrap();

        for change in editor.pending_changes() {
            editor.settle_change(&change);
        }

        assert!(editor.pending().is_empty());
        let added = editor.assigned_rights().get(&1).unwrap();
        assert_eq!(added.flags(), PermissionFlags::all().with(PermissionFlag::AllowPrint, false));
        assert!(!editor.assigned_rights().contains_key(&2));

        // Checking the saved right again is a no-op
        editor.toggle_right(1, true).unwrap();
        assert!(editor.pending().is_empty());
    }
}
