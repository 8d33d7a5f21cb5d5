//! List document model: the unit of replication

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{Category, CategoryId, Item, ItemId};
use crate::error::{Error, Result};
use crate::util::{next_stamp, normalize_text_option, now_millis};

/// Current persisted schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Title used when a list is created without one
pub const DEFAULT_LIST_TITLE: &str = "New list";

/// A list identifier (UUID v7 string for lists created here)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListId(String);

impl ListId {
    /// Create a new unique list ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ListId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ListId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Display mode of a list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ListMode {
    /// Structure editing (categories, labels)
    Edit,
    /// Checking items off while shopping
    #[default]
    Shopping,
}

impl ListMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Shopping => "shopping",
        }
    }
}

impl fmt::Display for ListMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "edit" => Ok(Self::Edit),
            "shopping" => Ok(Self::Shopping),
            other => Err(Error::InvalidInput(format!("unknown list mode '{other}'"))),
        }
    }
}

/// Per-list UI preferences that replicate with the list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiPreferences {
    #[serde(default)]
    pub hide_checked: bool,
}

/// Replica bookkeeping for the remote copy of a list.
///
/// Accepts the legacy `drive*` key names when deserializing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetadata {
    /// Remote file identifier; `None` until the first push creates it
    #[serde(default, alias = "driveFileId")]
    pub remote_file_id: Option<String>,
    /// Remote folder holding the file
    #[serde(default, alias = "driveFolderId")]
    pub remote_folder_id: Option<String>,
    /// Last modification time reported by the remote host
    #[serde(default, alias = "driveModifiedTime")]
    pub remote_modified_at: Option<DateTime<Utc>>,
    /// Last successful pull (Unix ms)
    #[serde(default)]
    pub last_pulled_at: Option<i64>,
    /// Last successful push (Unix ms)
    #[serde(default)]
    pub last_pushed_at: Option<i64>,
}

impl SyncMetadata {
    pub const fn has_remote_file(&self) -> bool {
        self.remote_file_id.is_some()
    }
}

const fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// A shopping list: categories, items, and sync metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocument {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Stable identifier
    #[serde(rename = "listId")]
    pub id: ListId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub mode: ListMode,
    #[serde(default)]
    pub ui: UiPreferences,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub sync: SyncMetadata,
    /// Local mutations not yet pushed
    #[serde(default)]
    pub dirty: bool,
    /// Document clock (Unix ms), bumped by every mutation
    #[serde(default)]
    pub updated_at: i64,
}

impl ListDocument {
    /// Create a new, dirty list containing only the root category
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        let now = now_millis();
        let title = normalize_text_option(Some(title.into()))
            .unwrap_or_else(|| DEFAULT_LIST_TITLE.to_string());
        Self {
            schema_version: SCHEMA_VERSION,
            id: ListId::new(),
            title,
            mode: ListMode::Shopping,
            ui: UiPreferences::default(),
            categories: vec![Category::root(now)],
            items: Vec::new(),
            sync: SyncMetadata::default(),
            dirty: true,
            updated_at: now,
        }
    }

    /// Parse a stored or remote JSON payload and normalize it
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let mut doc: Self = serde_json::from_value(value)?;
        doc.normalize();
        Ok(doc)
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Repair payloads written by older or foreign replicas.
    ///
    /// Guarantees a live, parentless root category.
    pub fn normalize(&mut self) {
        if self.schema_version == 0 {
            self.schema_version = SCHEMA_VERSION;
        }
        match self.categories.iter_mut().find(|c| c.is_root()) {
            Some(root) => {
                root.parent_id = None;
                root.deleted_at = None;
            }
            None => self.categories.insert(0, Category::root(self.updated_at)),
        }
    }

    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Flag local changes and advance the document clock
    pub fn mark_dirty(&mut self) {
        self.touch();
    }

    /// Clear the dirty flag after a successful push (does not stamp)
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Advance the document clock, mark dirty, and return the new stamp
    pub(crate) fn touch(&mut self) -> i64 {
        let stamp = next_stamp(self.updated_at);
        self.updated_at = stamp;
        self.dirty = true;
        stamp
    }

    pub fn set_mode(&mut self, mode: ListMode) {
        self.mode = mode;
        self.touch();
    }

    /// Apply a mode by name. Unknown names are ignored and return `false`.
    pub fn set_mode_named(&mut self, mode: &str) -> bool {
        match mode.parse::<ListMode>() {
            Ok(mode) => {
                self.set_mode(mode);
                true
            }
            Err(_) => {
                tracing::debug!("Ignoring unknown list mode '{}'", mode);
                false
            }
        }
    }

    /// Rename the list. Blank titles are ignored and return `false`.
    pub fn rename(&mut self, title: &str) -> bool {
        let Some(title) = normalize_text_option(Some(title.to_string())) else {
            return false;
        };
        self.title = title;
        self.touch();
        true
    }

    pub fn set_hide_checked(&mut self, hide: bool) {
        self.ui.hide_checked = hide;
        self.touch();
    }

    pub fn root_category_id(&self) -> CategoryId {
        CategoryId::root()
    }

    pub fn category(&self, id: &CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| &c.id == id)
    }

    /// Category by id, ignoring tombstones
    pub fn live_category(&self, id: &CategoryId) -> Option<&Category> {
        self.category(id).filter(|c| !c.is_deleted())
    }

    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|i| &i.id == id)
    }

    /// Item by id, ignoring tombstones
    pub fn live_item(&self, id: &ItemId) -> Option<&Item> {
        self.item(id).filter(|i| !i.is_deleted())
    }

    pub fn live_categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter().filter(|c| !c.is_deleted())
    }

    pub fn live_items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|i| !i.is_deleted())
    }

    /// Items shown for `category`: the root shows every live item.
    ///
    /// Unchecked items come first, then by label.
    pub fn visible_items(&self, category: &CategoryId, hide_checked: bool) -> Vec<&Item> {
        let mut items = self
            .live_items()
            .filter(|item| category.is_root() || &item.category_id == category)
            .filter(|item| !(hide_checked && item.checked))
            .collect::<Vec<_>>();
        items.sort_by(|a, b| {
            a.checked
                .cmp(&b.checked)
                .then_with(|| a.label.to_lowercase().cmp(&b.label.to_lowercase()))
        });
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewItem;

    #[test]
    fn test_new_list_has_root_and_is_dirty() {
        let doc = ListDocument::new("Weekly");
        assert_eq!(doc.title, "Weekly");
        assert_eq!(doc.mode, ListMode::Shopping);
        assert!(doc.dirty);
        assert_eq!(doc.categories.len(), 1);
        assert!(doc.categories[0].is_root());
        assert!(!doc.sync.has_remote_file());
    }

    #[test]
    fn test_new_list_blank_title_uses_default() {
        assert_eq!(ListDocument::new("   ").title, DEFAULT_LIST_TITLE);
    }

    #[test]
    fn test_set_mode_named_ignores_unknown_values() {
        let mut doc = ListDocument::new("Weekly");
        doc.mark_clean();
        let before = doc.updated_at;

        assert!(!doc.set_mode_named("party"));
        assert_eq!(doc.mode, ListMode::Shopping);
        assert_eq!(doc.updated_at, before);
        assert!(!doc.dirty);

        assert!(doc.set_mode_named("edit"));
        assert_eq!(doc.mode, ListMode::Edit);
        assert!(doc.updated_at > before);
        assert!(doc.dirty);
    }

    #[test]
    fn test_mark_clean_does_not_stamp() {
        let mut doc = ListDocument::new("Weekly");
        let before = doc.updated_at;
        doc.mark_clean();
        assert!(!doc.is_dirty());
        assert_eq!(doc.updated_at, before);

        doc.mark_dirty();
        assert!(doc.is_dirty());
        assert!(doc.updated_at > before);
    }

    #[test]
    fn test_rename_and_hide_checked_stamp() {
        let mut doc = ListDocument::new("Weekly");
        let before = doc.updated_at;
        assert!(!doc.rename("  "));
        assert_eq!(doc.updated_at, before);
        assert!(doc.rename(" Party "));
        assert_eq!(doc.title, "Party");

        let renamed_at = doc.updated_at;
        doc.set_hide_checked(true);
        assert!(doc.ui.hide_checked);
        assert!(doc.updated_at > renamed_at);
    }

    #[test]
    fn test_from_json_normalizes_legacy_payload() {
        let payload = serde_json::json!({
            "listId": "list-1",
            "title": "Legacy",
            "items": [],
            "sync": {
                "driveFileId": "file-1",
                "driveModifiedTime": "2024-05-01T10:00:00Z",
                "lastPulledAt": 10
            },
            "updatedAt": 99
        });

        let doc = ListDocument::from_json(payload).unwrap();
        assert_eq!(doc.schema_version, SCHEMA_VERSION);
        assert_eq!(doc.mode, ListMode::Shopping);
        assert!(!doc.dirty);
        assert_eq!(doc.sync.remote_file_id.as_deref(), Some("file-1"));
        assert!(doc.sync.remote_modified_at.is_some());
        assert_eq!(doc.categories.len(), 1);
        assert!(doc.categories[0].is_root());
        assert_eq!(doc.categories[0].updated_at, 99);
    }

    #[test]
    fn test_json_roundtrip_keeps_document() {
        let mut doc = ListDocument::new("Weekly");
        doc.add_item(NewItem::new("Eggs").with_quantity("12"))
            .unwrap();
        let parsed = ListDocument::from_json(doc.to_json().unwrap()).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_visible_items_order_and_filter() {
        let mut doc = ListDocument::new("Weekly");
        let produce = doc
            .upsert_category(None, Some("Produce"), None)
            .unwrap();
        let apples = doc
            .add_item(NewItem::new("apples").in_category(produce.clone()))
            .unwrap()
            .unwrap();
        doc.add_item(NewItem::new("Bread")).unwrap();
        doc.add_item(NewItem::new("Avocado").in_category(produce.clone()))
            .unwrap();
        doc.toggle_item_checked(&apples).unwrap();

        let labels = |items: Vec<&Item>| {
            items
                .into_iter()
                .map(|i| i.label.clone())
                .collect::<Vec<_>>()
        };

        assert_eq!(
            labels(doc.visible_items(&CategoryId::root(), false)),
            vec!["Avocado", "Bread", "apples"]
        );
        assert_eq!(labels(doc.visible_items(&produce, true)), vec!["Avocado"]);
    }
}
