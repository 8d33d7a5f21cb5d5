//! Category model

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of the distinguished root category present in every list
pub const ROOT_CATEGORY_ID: &str = "c_root";

/// Display name given to the root category at list creation
pub const ROOT_CATEGORY_NAME: &str = "All";

/// A category identifier.
///
/// Fresh identifiers are UUID v7 strings; the root category uses [`ROOT_CATEGORY_ID`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(String);

impl CategoryId {
    /// Create a new unique category ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// The root category ID
    #[must_use]
    pub fn root() -> Self {
        Self(ROOT_CATEGORY_ID.to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_CATEGORY_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CategoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CategoryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for CategoryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A (possibly tombstoned) category within a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Unique identifier
    pub id: CategoryId,
    /// Display name
    pub name: String,
    /// Parent category; `None` only for the root
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    /// Optional explicit ordering among siblings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    /// Last update timestamp (Unix ms)
    #[serde(default)]
    pub updated_at: i64,
    /// Tombstone timestamp (Unix ms) when deleted
    #[serde(default)]
    pub deleted_at: Option<i64>,
}

impl Category {
    /// Create a live category under `parent_id`
    #[must_use]
    pub fn new(name: impl Into<String>, parent_id: CategoryId, now: i64) -> Self {
        Self {
            id: CategoryId::new(),
            name: name.into(),
            parent_id: Some(parent_id),
            order: None,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Create the root category
    #[must_use]
    pub fn root(now: i64) -> Self {
        Self {
            id: CategoryId::root(),
            name: ROOT_CATEGORY_NAME.to_string(),
            parent_id: None,
            order: None,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_root(&self) -> bool {
        self.id.is_root()
    }

    pub(crate) fn tombstone(&mut self, at: i64) {
        self.deleted_at = Some(at);
        self.updated_at = at;
    }
}
