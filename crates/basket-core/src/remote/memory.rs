//! In-process remote host for tests and embedding callers.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{FileQuery, FileRef, FileTags, RemoteFileService, ShareRole};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
struct StoredFile {
    meta: FileRef,
    content: Value,
    public_role: Option<ShareRole>,
}

#[derive(Debug, Default)]
struct MemoryState {
    /// Folder name to id
    folders: BTreeMap<String, String>,
    files: BTreeMap<String, StoredFile>,
}

/// Remote host kept entirely in memory, with a switch to simulate going offline
#[derive(Debug, Default)]
pub struct MemoryRemote {
    state: Mutex<MemoryState>,
    offline: AtomicBool,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every call fails with [`Error::RemoteUnavailable`]
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    /// Stored content, ignoring the offline switch
    pub async fn file_content(&self, file_id: &str) -> Option<Value> {
        let state = self.state.lock().await;
        state.files.get(file_id).map(|file| file.content.clone())
    }

    /// Overwrite content as another replica would, ignoring the offline switch
    pub async fn replace_content(&self, file_id: &str, content: Value) -> Result<()> {
        let mut state = self.state.lock().await;
        let file = state
            .files
            .get_mut(file_id)
            .ok_or_else(|| Error::NotFound(format!("remote file {file_id}")))?;
        file.content = content;
        file.meta.modified_time = Some(Utc::now());
        Ok(())
    }

    /// Drop a file as if it were deleted on the host
    pub async fn remove_file(&self, file_id: &str) {
        self.state.lock().await.files.remove(file_id);
    }

    pub async fn public_role(&self, file_id: &str) -> Option<ShareRole> {
        let state = self.state.lock().await;
        state.files.get(file_id).and_then(|file| file.public_role)
    }

    pub async fn file_count(&self) -> usize {
        self.state.lock().await.files.len()
    }

    fn ensure_online(&self) -> Result<()> {
        if self.is_offline() {
            Err(Error::RemoteUnavailable("remote host is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteFileService for MemoryRemote {
    async fn ensure_folder(&self, name: &str) -> Result<String> {
        self.ensure_online()?;
        let mut state = self.state.lock().await;
        let id = state
            .folders
            .entry(name.to_string())
            .or_insert_with(|| Uuid::now_v7().to_string());
        Ok(id.clone())
    }

    async fn list_files(&self, query: &FileQuery) -> Result<Vec<FileRef>> {
        self.ensure_online()?;
        let state = self.state.lock().await;
        Ok(state
            .files
            .values()
            .map(|file| &file.meta)
            .filter(|meta| query.matches(meta))
            .cloned()
            .collect())
    }

    async fn create_json_file(
        &self,
        name: &str,
        parent: &str,
        tags: &FileTags,
        content: &Value,
    ) -> Result<FileRef> {
        self.ensure_online()?;
        let meta = FileRef {
            id: Uuid::now_v7().to_string(),
            name: name.to_string(),
            parent: Some(parent.to_string()),
            modified_time: Some(Utc::now()),
            tags: tags.clone(),
        };
        let mut state = self.state.lock().await;
        state.files.insert(
            meta.id.clone(),
            StoredFile {
                meta: meta.clone(),
                content: content.clone(),
                public_role: None,
            },
        );
        Ok(meta)
    }

    async fn get_file_content(&self, file_id: &str) -> Result<Option<Value>> {
        self.ensure_online()?;
        Ok(self.file_content(file_id).await)
    }

    async fn update_file_content(&self, file_id: &str, content: &Value) -> Result<FileRef> {
        self.ensure_online()?;
        let mut state = self.state.lock().await;
        let file = state
            .files
            .get_mut(file_id)
            .ok_or_else(|| Error::NotFound(format!("remote file {file_id}")))?;
        file.content = content.clone();
        file.meta.modified_time = Some(Utc::now());
        Ok(file.meta.clone())
    }

    async fn create_public_permission(&self, file_id: &str, role: ShareRole) -> Result<()> {
        self.ensure_online()?;
        let mut state = self.state.lock().await;
        let file = state
            .files
            .get_mut(file_id)
            .ok_or_else(|| Error::NotFound(format!("remote file {file_id}")))?;
        file.public_role = Some(role);
        Ok(())
    }

    async fn get_share_link(&self, file_id: &str) -> Result<String> {
        self.ensure_online()?;
        let state = self.state.lock().await;
        if !state.files.contains_key(file_id) {
            return Err(Error::NotFound(format!("remote file {file_id}")));
        }
        Ok(format!("memory://remote/file/d/{file_id}/view"))
    }
}
