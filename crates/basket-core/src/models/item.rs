//! Item model

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::CategoryId;

/// An item identifier (UUID v7 string for items created here)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create a new unique item ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A (possibly tombstoned) shopping list item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Unique identifier
    pub id: ItemId,
    /// Non-empty, trimmed label
    pub label: String,
    /// Optional quantity (as string to allow "2" or "a few")
    #[serde(default, rename = "qty")]
    pub quantity: Option<String>,
    /// Optional unit (e.g., "rolls", "bags")
    #[serde(default)]
    pub unit: Option<String>,
    /// Owning category
    #[serde(default = "CategoryId::root")]
    pub category_id: CategoryId,
    /// Whether the item has been picked up
    #[serde(default)]
    pub checked: bool,
    /// Last update timestamp (Unix ms)
    #[serde(default)]
    pub updated_at: i64,
    /// Tombstone timestamp (Unix ms) when deleted
    #[serde(default)]
    pub deleted_at: Option<i64>,
}

impl Item {
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub(crate) fn tombstone(&mut self, at: i64) {
        self.deleted_at = Some(at);
        self.updated_at = at;
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.quantity, &self.unit) {
            (Some(qty), Some(unit)) => write!(f, "{qty} {unit} {}", self.label),
            (Some(qty), None) => write!(f, "{qty} {}", self.label),
            (None, Some(unit)) => write!(f, "{} ({unit})", self.label),
            (None, None) => f.write_str(&self.label),
        }
    }
}

/// Input for adding an item to a list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewItem {
    pub label: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    /// Owning category; defaults to the root category
    pub category_id: Option<CategoryId>,
}

impl NewItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_quantity(mut self, quantity: impl Into<String>) -> Self {
        self.quantity = Some(quantity.into());
        self
    }

    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    #[must_use]
    pub fn in_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }
}

/// Partial update applied by `ListDocument::update_item`.
///
/// `None` leaves a field untouched; `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub label: Option<String>,
    pub quantity: Option<Option<String>>,
    pub unit: Option<Option<String>>,
    pub category_id: Option<CategoryId>,
    pub checked: Option<bool>,
}

impl ItemPatch {
    pub const fn is_empty(&self) -> bool {
        self.label.is_none()
            && self.quantity.is_none()
            && self.unit.is_none()
            && self.category_id.is_none()
            && self.checked.is_none()
    }
}
