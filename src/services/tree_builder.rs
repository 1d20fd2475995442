//! Module → right tree projection
//!
//! The tree is rebuilt from scratch out of (catalog, assigned rights, pending
//! changes, filters) every time it is requested. Nothing here is cached.

use std::collections::HashMap;

use crate::models::{
    AssignedRight, ChangeKind, EffectiveState, ModuleNode, PendingChange, PermissionFlags, Right,
    RightNode,
};
use crate::services::pending_changes::PendingChanges;
use crate::utils::{StringExt, group_ordered};

/// Overlay a pending change on the server assignment of one right
pub fn effective_state(
    assigned: Option<&AssignedRight>,
    pending: Option<&PendingChange>,
) -> EffectiveState {
    match (assigned, pending) {
        (_, Some(change)) if change.kind == ChangeKind::Delete => {
            EffectiveState { is_selected: false, flags: PermissionFlags::none() }
        },
        (assigned, Some(change)) => {
            let base = assigned.map(AssignedRight::flags).unwrap_or_else(PermissionFlags::all);
            EffectiveState { is_selected: true, flags: change.flags.unwrap_or(base) }
        },
        (Some(assigned), None) => EffectiveState { is_selected: true, flags: assigned.flags() },
        (None, None) => EffectiveState { is_selected: false, flags: PermissionFlags::none() },
    }
}

/// Whether a right passes the search term (already lowercased) and module filter
fn matches_filter(right: &Right, search: Option<&str>, module: Option<&str>) -> bool {
    if let Some(module) = module
        && right.module != module
    {
        return false;
    }

    match search {
        None => true,
        Some(term) => {
            right.display_name.contains_lowercase(term)
                || right.description.contains_lowercase(term)
                || right.module.contains_lowercase(term)
                || right.category.contains_lowercase(term)
        },
    }
}

/// Build the module tree.
///
/// Filtering happens before grouping. Modules keep the order in which they
/// first appear in the catalog; a module left without rights is omitted.
pub fn build_tree(
    rights: &[Right],
    assigned: &HashMap<i64, AssignedRight>,
    pending: &PendingChanges,
    search: Option<&str>,
    module: Option<&str>,
) -> Vec<ModuleNode> {
    let search = search.clean().map(|s| s.to_lowercase());
    let module = module.clean();

    let filtered = rights
        .iter()
        .filter(|r| matches_filter(r, search.as_deref(), module.as_deref()));

    group_ordered(filtered, |r| r.module.clone())
        .into_iter()
        .map(|(module, children)| {
            let rights: Vec<RightNode> = children
                .into_iter()
                .map(|right| {
                    let change = pending.get(right.right_id);
                    let state = effective_state(assigned.get(&right.right_id), change);
                    RightNode {
                        right_id: right.right_id,
                        right_code: right.right_code.clone(),
                        display_name: right.display_name.clone(),
                        description: right.description.clone(),
                        module: right.module.clone(),
                        category: right.category.clone(),
                        is_selected: state.is_selected,
                        flags: state.flags,
                        pending: change.map(|c| c.kind),
                    }
                })
                .collect();

            let total_count = rights.len();
            let selected_count = rights.iter().filter(|r| r.is_selected).count();

            ModuleNode {
                module,
                is_selected: selected_count == total_count,
                is_indeterminate: selected_count > 0 && selected_count < total_count,
                selected_count,
                total_count,
                rights,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn right(id: i64, name: &str, module: &str, category: Option<&str>) -> Right {
        Right {
            right_id: id,
            right_code: format!("R{}", id),
            table_name: None,
            display_name: name.to_string(),
            description: Some(format!("{} screen", name)),
            module: module.to_string(),
            category: category.map(str::to_string),
            is_active: true,
        }
    }

    fn catalog() -> Vec<Right> {
        vec![
            right(1, "Invoices", "Billing", Some("Finance")),
            right(2, "Receipts", "Billing", Some("Finance")),
            right(3, "Job Orders", "Operations", None),
            right(4, "Banks", "Setup", Some("Master Data")),
        ]
    }

    #[test]
    fn test_effective_state_table() {
        let assigned = AssignedRight::new(5, 1, PermissionFlags::all().with(
            crate::models::PermissionFlag::AllowPrint,
            false,
        ));
        let custom = PermissionFlags::none().with(crate::models::PermissionFlag::AllowGetList, true);

        let none = effective_state(None, None);
        assert!(!none.is_selected);
        assert_eq!(none.flags, PermissionFlags::none());

        let only_assigned = effective_state(Some(&assigned), None);
        assert!(only_assigned.is_selected);
        assert_eq!(only_assigned.flags, assigned.flags());

        let added = effective_state(None, Some(&PendingChange::add(1, custom)));
        assert!(added.is_selected);
        assert_eq!(added.flags, custom);

        let deleted = effective_state(Some(&assigned), Some(&PendingChange::delete(1)));
        assert!(!deleted.is_selected);

        let updated = effective_state(Some(&assigned), Some(&PendingChange::update(1, custom)));
        assert!(updated.is_selected);
        assert_eq!(updated.flags, custom);
    }

    #[test]
    fn test_groups_in_catalog_order() {
        let tree = build_tree(&catalog(), &HashMap::new(), &PendingChanges::new(), None, None);
        let modules: Vec<&str> = tree.iter().map(|m| m.module.as_str()).collect();
        assert_eq!(modules, vec!["Billing", "Operations", "Setup"]);
        assert_eq!(tree[0].rights.len(), 2);
        assert!(tree.iter().all(|m| !m.is_selected && !m.is_indeterminate));
    }

    #[test]
    fn test_module_aggregate_flags() {
        let mut assigned = HashMap::new();
        assigned.insert(1, AssignedRight::new(5, 1, PermissionFlags::all()));
        assigned.insert(3, AssignedRight::new(5, 3, PermissionFlags::all()));

        let tree = build_tree(&catalog(), &assigned, &PendingChanges::new(), None, None);

        let billing = &tree[0];
        assert!(!billing.is_selected);
        assert!(billing.is_indeterminate);
        assert_eq!((billing.selected_count, billing.total_count), (1, 2));

        let operations = &tree[1];
        assert!(operations.is_selected);
        assert!(!operations.is_indeterminate);

        let setup = &tree[2];
        assert!(!setup.is_selected);
        assert!(!setup.is_indeterminate);
    }

    #[test]
    fn test_pending_overlay_in_tree() {
        let mut assigned = HashMap::new();
        assigned.insert(1, AssignedRight::new(5, 1, PermissionFlags::all()));
        let mut pending = PendingChanges::new();
        pending.set(PendingChange::delete(1));
        pending.set(PendingChange::add(2, PermissionFlags::all()));

        let tree = build_tree(&catalog(), &assigned, &pending, None, None);
        let billing = &tree[0];
        assert!(!billing.rights[0].is_selected);
        assert_eq!(billing.rights[0].pending, Some(ChangeKind::Delete));
        assert!(billing.rights[1].is_selected);
        assert_eq!(billing.rights[1].pending, Some(ChangeKind::Add));
        assert!(billing.is_indeterminate);
    }

    #[test]
    fn test_search_filters_before_grouping() {
        let pending = PendingChanges::new();
        let tree = build_tree(&catalog(), &HashMap::new(), &pending, Some("  FINANCE "), None);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].module, "Billing");
        assert_eq!(tree[0].total_count, 2);

        let tree = build_tree(&catalog(), &HashMap::new(), &pending, Some("order"), None);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].rights[0].right_id, 3);

        let tree = build_tree(&catalog(), &HashMap::new(), &pending, Some("receipts screen"), None);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].rights[0].right_id, 2);
    }

    #[test]
    fn test_module_filter_and_empty_modules_omitted() {
        let pending = PendingChanges::new();
        let tree = build_tree(&catalog(), &HashMap::new(), &pending, None, Some("Setup"));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].module, "Setup");

        let tree = build_tree(&catalog(), &HashMap::new(), &pending, Some("invoice"), Some("Setup"));
        assert!(tree.is_empty());

        let tree = build_tree(&catalog(), &HashMap::new(), &pending, Some(""), Some(" "));
        assert_eq!(tree.len(), 3);
    }
}
