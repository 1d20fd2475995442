use crate::models::{ChangeKind, PendingChange, PendingSummary};

/// Insertion-ordered map of pending changes keyed by right id.
///
/// Holds at most one entry per right. Replacing an entry keeps its original
/// position so a save replays edits in the order the rights were first touched.
#[derive(Debug, Clone, Default)]
pub struct PendingChanges {
    entries: Vec<PendingChange>,
}

impl PendingChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, right_id: i64) -> Option<&PendingChange> {
        self.entries.iter().find(|c| c.right_id == right_id)
    }

    pub fn set(&mut self, change: PendingChange) {
        match self.entries.iter_mut().find(|c| c.right_id == change.right_id) {
            Some(existing) => *existing = change,
            None => self.entries.push(change),
        }
    }

    pub fn remove(&mut self, right_id: i64) -> Option<PendingChange> {
        let pos = self.entries.iter().position(|c| c.right_id == right_id)?;
        Some(self.entries.remove(pos))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingChange> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<PendingChange> {
        self.entries.clone()
    }

    pub fn summary(&self) -> PendingSummary {
        self.entries.iter().fold(PendingSummary::default(), |mut acc, change| {
            match change.kind {
                ChangeKind::Add => acc.adds += 1,
                ChangeKind::Update => acc.updates += 1,
                ChangeKind::Delete => acc.deletes += 1,
            }
            acc.total += 1;
            acc
        })
    }
}
