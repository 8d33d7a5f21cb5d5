//! Remote file host abstraction and backends.

mod folder;
mod memory;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

pub use folder::FolderRemote;
pub use memory::MemoryRemote;

/// Metadata tags attached to a remote file
pub type FileTags = BTreeMap<String, String>;

/// Role granted by an "anyone with the link" permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareRole {
    #[default]
    Reader,
    Writer,
}

impl ShareRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reader => "reader",
            Self::Writer => "writer",
        }
    }
}

impl fmt::Display for ShareRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShareRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "reader" => Ok(Self::Reader),
            "writer" => Ok(Self::Writer),
            other => Err(Error::InvalidInput(format!(
                "unknown share role '{other}' (expected reader or writer)"
            ))),
        }
    }
}

/// Metadata of one remote file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    pub id: String,
    pub name: String,
    /// Containing folder id
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub modified_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: FileTags,
}

/// Filter for [`RemoteFileService::list_files`]; empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileQuery {
    pub parent: Option<String>,
    pub name: Option<String>,
    /// Every tag listed must be present with the same value
    pub tags: FileTags,
}

impl FileQuery {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn in_folder(mut self, folder_id: impl Into<String>) -> Self {
        self.parent = Some(folder_id.into());
        self
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn matches(&self, file: &FileRef) -> bool {
        if self.parent.is_some() && self.parent != file.parent {
            return false;
        }
        if self.name.as_ref().is_some_and(|name| name != &file.name) {
            return false;
        }
        self.tags
            .iter()
            .all(|(key, value)| file.tags.get(key) == Some(value))
    }
}

/// Remote host holding one JSON file per list.
///
/// Every call may fail with a transport or authorization error, surfaced as
/// [`Error::RemoteUnavailable`]. Implementations do not retry.
#[async_trait]
pub trait RemoteFileService: Send + Sync {
    /// Find or create a top-level folder, returning its id
    async fn ensure_folder(&self, name: &str) -> Result<String>;

    async fn list_files(&self, query: &FileQuery) -> Result<Vec<FileRef>>;

    async fn create_json_file(
        &self,
        name: &str,
        parent: &str,
        tags: &FileTags,
        content: &Value,
    ) -> Result<FileRef>;

    /// File content, or `None` when no copy is retrievable
    async fn get_file_content(&self, file_id: &str) -> Result<Option<Value>>;

    async fn update_file_content(&self, file_id: &str, content: &Value) -> Result<FileRef>;

    async fn create_public_permission(&self, file_id: &str, role: ShareRole) -> Result<()>;

    async fn get_share_link(&self, file_id: &str) -> Result<String>;
}

#[async_trait]
impl<T: RemoteFileService + ?Sized> RemoteFileService for Arc<T> {
    async fn ensure_folder(&self, name: &str) -> Result<String> {
        (**self).ensure_folder(name).await
    }

    async fn list_files(&self, query: &FileQuery) -> Result<Vec<FileRef>> {
        (**self).list_files(query).await
    }

    async fn create_json_file(
        &self,
        name: &str,
        parent: &str,
        tags: &FileTags,
        content: &Value,
    ) -> Result<FileRef> {
        (**self).create_json_file(name, parent, tags, content).await
    }

    async fn get_file_content(&self, file_id: &str) -> Result<Option<Value>> {
        (**self).get_file_content(file_id).await
    }

    async fn update_file_content(&self, file_id: &str, content: &Value) -> Result<FileRef> {
        (**self).update_file_content(file_id, content).await
    }

    async fn create_public_permission(&self, file_id: &str, role: ShareRole) -> Result<()> {
        (**self).create_public_permission(file_id, role).await
    }

    async fn get_share_link(&self, file_id: &str) -> Result<String> {
        (**self).get_share_link(file_id).await
    }
}
