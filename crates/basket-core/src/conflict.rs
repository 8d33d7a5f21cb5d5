//! Human-readable comparison of two diverged replicas

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::merge::Versioned;
use crate::models::{CategoryId, ItemId, ListDocument, ListMode};

/// How one entity differs between the local and remote replica
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityChange {
    /// Live on the remote side only (or revived there)
    Added,
    /// Live locally, tombstoned remotely
    Removed,
    /// Live on both sides with different clocks
    Changed,
    Unchanged,
}

/// Per-collection classification, in first-seen order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDiff<Id> {
    pub added: Vec<Id>,
    pub removed: Vec<Id>,
    pub changed: Vec<Id>,
    pub unchanged: Vec<Id>,
}

impl<Id> Default for EntityDiff<Id> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            removed: Vec::new(),
            changed: Vec::new(),
            unchanged: Vec::new(),
        }
    }
}

impl<Id> EntityDiff<Id> {
    fn push(&mut self, change: EntityChange, id: Id) {
        match change {
            EntityChange::Added => self.added.push(id),
            EntityChange::Removed => self.removed.push(id),
            EntityChange::Changed => self.changed.push(id),
            EntityChange::Unchanged => self.unchanged.push(id),
        }
    }

    pub fn total(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed.len() + self.unchanged.len()
    }

    /// True when applying the remote side would change nothing
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Classify one id given its local and remote copies.
///
/// One-sided tombstones never existed on the other replica, so they count as
/// unchanged.
fn classify<T: Versioned>(local: Option<&T>, remote: Option<&T>) -> EntityChange {
    match (local, remote) {
        (Some(one), None) | (None, Some(one)) => {
            if one.is_tombstone() {
                EntityChange::Unchanged
            } else {
                EntityChange::Added
            }
        }
        (Some(l), Some(r)) => match (l.is_tombstone(), r.is_tombstone()) {
            (false, true) => EntityChange::Removed,
            (true, false) => EntityChange::Added,
            (true, true) => EntityChange::Unchanged,
            (false, false) if l.updated_at() == r.updated_at() => EntityChange::Unchanged,
            (false, false) => EntityChange::Changed,
        },
        (None, None) => EntityChange::Unchanged,
    }
}

/// Classify every id present on either side exactly once
pub fn diff_entities<T: Versioned>(local: &[T], remote: &[T]) -> EntityDiff<T::Id> {
    let local_by_id: HashMap<&T::Id, &T> = local.iter().map(|e| (e.key(), e)).collect();
    let remote_by_id: HashMap<&T::Id, &T> = remote.iter().map(|e| (e.key(), e)).collect();

    let mut diff = EntityDiff::default();
    let mut seen = HashSet::new();
    for id in remote.iter().chain(local).map(Versioned::key) {
        if !seen.insert(id) {
            continue;
        }
        let change = classify(
            local_by_id.get(id).copied(),
            remote_by_id.get(id).copied(),
        );
        diff.push(change, id.clone());
    }
    diff
}

/// Decision aid shown before a conflict is resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictSummary {
    pub local_title: String,
    pub remote_title: String,
    pub local_mode: ListMode,
    pub remote_mode: ListMode,
    pub categories: EntityDiff<CategoryId>,
    pub items: EntityDiff<ItemId>,
}

/// Compare two replicas without touching either
pub fn summarize_conflict(local: &ListDocument, remote: &ListDocument) -> ConflictSummary {
    ConflictSummary {
        local_title: local.title.clone(),
        remote_title: remote.title.clone(),
        local_mode: local.mode,
        remote_mode: remote.mode,
        categories: diff_entities(&local.categories, &remote.categories),
        items: diff_entities(&local.items, &remote.items),
    }
}

fn write_counts<Id>(f: &mut fmt::Formatter<'_>, name: &str, diff: &EntityDiff<Id>) -> fmt::Result {
    writeln!(
        f,
        "{name}: +{}  -{}  ~{}  ={}",
        diff.added.len(),
        diff.removed.len(),
        diff.changed.len(),
        diff.unchanged.len()
    )
}

impl fmt::Display for ConflictSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Title: local=\"{}\" | remote=\"{}\"",
            self.local_title, self.remote_title
        )?;
        writeln!(f, "Mode: local={} | remote={}", self.local_mode, self.remote_mode)?;
        writeln!(f)?;
        write_counts(f, "Categories", &self.categories)?;
        write_counts(f, "Items", &self.items)
    }
}
