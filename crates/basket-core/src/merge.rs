//! Two-way last-writer-wins merge of list replicas.
//!
//! Entities are keyed by id and compared by `updated_at`; tombstones are ordinary
//! state, so a newer deletion beats an older live record and vice versa. Ties keep
//! the local copy.

use std::collections::HashMap;
use std::hash::Hash;

use crate::models::{Category, CategoryId, Item, ItemId, ListDocument};
use crate::tree::orphaned_categories;

/// An entity that participates in last-writer-wins merging
pub trait Versioned: Clone {
    type Id: Eq + Hash + Clone;

    fn key(&self) -> &Self::Id;
    fn updated_at(&self) -> i64;
    fn deleted_at(&self) -> Option<i64>;

    fn is_tombstone(&self) -> bool {
        self.deleted_at().is_some()
    }
}

impl Versioned for Category {
    type Id = CategoryId;

    fn key(&self) -> &CategoryId {
        &self.id
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }

    fn deleted_at(&self) -> Option<i64> {
        self.deleted_at
    }
}

impl Versioned for Item {
    type Id = ItemId;

    fn key(&self) -> &ItemId {
        &self.id
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }

    fn deleted_at(&self) -> Option<i64> {
        self.deleted_at
    }
}

/// Merge two entity collections.
///
/// For each id the copy with the strictly greater `updated_at` survives; on a tie
/// the local copy wins. Ids seen on one side only are kept as-is. The result is in
/// merge insertion order (local first), which callers must not rely on.
pub fn merge_entities<T: Versioned>(local: &[T], remote: &[T]) -> Vec<T> {
    let mut merged: Vec<T> = Vec::with_capacity(local.len().max(remote.len()));
    let mut index: HashMap<T::Id, usize> = HashMap::with_capacity(merged.capacity());

    for entity in local.iter().chain(remote) {
        match index.get(entity.key()) {
            Some(&slot) => {
                if entity.updated_at() > merged[slot].updated_at() {
                    merged[slot] = entity.clone();
                }
            }
            None => {
                index.insert(entity.key().clone(), merged.len());
                merged.push(entity.clone());
            }
        }
    }

    merged
}

/// Merge a remote replica into the local one without touching either input.
///
/// Title, mode, and UI preferences follow the newer document clock; categories and
/// items merge per entity. The result keeps the local sync metadata, takes the
/// larger clock, and stays dirty if either side was dirty.
pub fn merge_docs(local: &ListDocument, remote: &ListDocument) -> ListDocument {
    if local.id != remote.id {
        tracing::warn!(
            "Merging replicas with different list ids: local={}, remote={}",
            local.id,
            remote.id
        );
    }

    let mut merged = local.clone();

    if remote.updated_at > local.updated_at {
        merged.title.clone_from(&remote.title);
        merged.mode = remote.mode;
        merged.ui = remote.ui.clone();
    }

    merged.categories = merge_entities(&local.categories, &remote.categories);
    merged.items = merge_entities(&local.items, &remote.items);
    merged.schema_version = local.schema_version.max(remote.schema_version);
    merged.updated_at = local.updated_at.max(remote.updated_at);
    merged.dirty = local.dirty || remote.dirty;
    merged.normalize();

    let orphans = orphaned_categories(&merged.categories);
    if !orphans.is_empty() {
        tracing::debug!(
            "Merged list {} has {} categories detached from the root",
            merged.id,
            orphans.len()
        );
    }

    merged
}
