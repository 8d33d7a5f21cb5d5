//! Directory-backed remote host.
//!
//! Layout under the root directory:
//! - `index.json`: folders, file metadata, tags, and public permissions
//! - `index.lock`: exclusive OS lock held for every index read-modify-write
//! - `<folder id>/<file id>.json`: file content
//!
//! Several hosts may share the directory; the lock file keeps their index
//! updates from overwriting each other.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{FileQuery, FileRef, FileTags, RemoteFileService, ShareRole};
use crate::error::{Error, Result};

const INDEX_FILE: &str = "index.json";
const LOCK_FILE: &str = "index.lock";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FolderIndex {
    /// Folder name to id
    #[serde(default)]
    folders: BTreeMap<String, String>,
    #[serde(default)]
    files: BTreeMap<String, IndexedFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexedFile {
    meta: FileRef,
    #[serde(default)]
    public_role: Option<ShareRole>,
}

/// Remote host backed by a local (possibly shared or mounted) directory
#[derive(Debug)]
pub struct FolderRemote {
    root: PathBuf,
    /// Serializes index access within this process before taking the file lock
    index_lock: Mutex<()>,
}

/// Exclusive hold on the index, released on drop
struct IndexGuard<'a> {
    _local: MutexGuard<'a, ()>,
    _file: File,
}

impl FolderRemote {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            index_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    async fn lock_index(&self) -> Result<IndexGuard<'_>> {
        let local = self.index_lock.lock().await;
        let root = self.root.clone();
        let file = tokio::task::spawn_blocking(move || lock_file(&root))
            .await
            .map_err(|error| {
                Error::RemoteUnavailable(format!("folder remote lock task failed: {error}"))
            })??;
        Ok(IndexGuard {
            _local: local,
            _file: file,
        })
    }

    fn content_path(&self, meta: &FileRef) -> PathBuf {
        let folder = meta.parent.as_deref().unwrap_or("_root");
        self.root.join(folder).join(format!("{}.json", meta.id))
    }

    async fn load_index(&self) -> Result<FolderIndex> {
        let path = self.index_path();
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(FolderIndex::default()),
            Err(error) => Err(remote_io_error("read index", &path, &error)),
        }
    }

    async fn save_index(&self, index: &FolderIndex) -> Result<()> {
        let path = self.index_path();
        let bytes = serde_json::to_vec_pretty(index)?;
        write_atomic(&path, &bytes).await
    }

    async fn write_content(&self, meta: &FileRef, content: &Value) -> Result<()> {
        let path = self.content_path(meta);
        let bytes = serde_json::to_vec_pretty(content)?;
        write_atomic(&path, &bytes).await
    }

    fn public_link(&self, meta: &FileRef) -> String {
        format!("file://{}?id={}", self.content_path(meta).display(), meta.id)
    }
}

fn remote_io_error(operation: &str, path: &Path, error: &std::io::Error) -> Error {
    Error::RemoteUnavailable(format!(
        "folder remote {operation} failed at {}: {error}",
        path.display()
    ))
}

/// Blocks until this handle owns the directory's lock file
fn lock_file(root: &Path) -> Result<File> {
    std::fs::create_dir_all(root)
        .map_err(|error| remote_io_error("create directory", root, &error))?;
    let path = root.join(LOCK_FILE);
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)
        .map_err(|error| remote_io_error("open lock", &path, &error))?;
    file.lock_exclusive()
        .map_err(|error| remote_io_error("lock", &path, &error))?;
    Ok(file)
}

/// Write through a uniquely named temporary sibling so readers never see a
/// half-written file and concurrent writers never share a temp path
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|error| remote_io_error("create directory", parent, &error))?;
    }
    let file_name = path
        .file_name()
        .map_or_else(|| "file".into(), |name| name.to_string_lossy());
    let tmp = path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::now_v7().simple()));
    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|error| remote_io_error("write", &tmp, &error))?;
    if let Err(error) = tokio::fs::rename(&tmp, path).await {
        tokio::fs::remove_file(&tmp).await.ok();
        return Err(remote_io_error("rename", path, &error));
    }
    Ok(())
}

fn missing_file(file_id: &str) -> Error {
    Error::NotFound(format!("remote file {file_id}"))
}

#[async_trait]
impl RemoteFileService for FolderRemote {
    async fn ensure_folder(&self, name: &str) -> Result<String> {
        let _guard = self.lock_index().await?;
        let mut index = self.load_index().await?;
        if let Some(id) = index.folders.get(name) {
            return Ok(id.clone());
        }

        let id = Uuid::now_v7().to_string();
        index.folders.insert(name.to_string(), id.clone());
        self.save_index(&index).await?;
        tracing::debug!("Created remote folder {} ({})", name, id);
        Ok(id)
    }

    async fn list_files(&self, query: &FileQuery) -> Result<Vec<FileRef>> {
        let _guard = self.lock_index().await?;
        let index = self.load_index().await?;
        Ok(index
            .files
            .into_values()
            .map(|file| file.meta)
            .filter(|meta| query.matches(meta))
            .collect())
    }

    async fn create_json_file(
        &self,
        name: &str,
        parent: &str,
        tags: &FileTags,
        content: &Value,
    ) -> Result<FileRef> {
        let _guard = self.lock_index().await?;
        let mut index = self.load_index().await?;

        let meta = FileRef {
            id: Uuid::now_v7().to_string(),
            name: name.to_string(),
            parent: Some(parent.to_string()),
            modified_time: Some(Utc::now()),
            tags: tags.clone(),
        };
        self.write_content(&meta, content).await?;
        index.files.insert(
            meta.id.clone(),
            IndexedFile {
                meta: meta.clone(),
                public_role: None,
            },
        );
        self.save_index(&index).await?;
        Ok(meta)
    }

    async fn get_file_content(&self, file_id: &str) -> Result<Option<Value>> {
        let meta = {
            let _guard = self.lock_index().await?;
            let index = self.load_index().await?;
            match index.files.get(file_id) {
                Some(file) => file.meta.clone(),
                None => return Ok(None),
            }
        };

        let path = self.content_path(&meta);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(remote_io_error("read", &path, &error)),
        }
    }

    async fn update_file_content(&self, file_id: &str, content: &Value) -> Result<FileRef> {
        let _guard = self.lock_index().await?;
        let mut index = self.load_index().await?;
        let file = index
            .files
            .get_mut(file_id)
            .ok_or_else(|| missing_file(file_id))?;

        file.meta.modified_time = Some(Utc::now());
        let meta = file.meta.clone();
        self.write_content(&meta, content).await?;
        self.save_index(&index).await?;
        Ok(meta)
    }

    async fn create_public_permission(&self, file_id: &str, role: ShareRole) -> Result<()> {
        let _guard = self.lock_index().await?;
        let mut index = self.load_index().await?;
        let file = index
            .files
            .get_mut(file_id)
            .ok_or_else(|| missing_file(file_id))?;
        file.public_role = Some(role);
        self.save_index(&index).await
    }

    async fn get_share_link(&self, file_id: &str) -> Result<String> {
        let _guard = self.lock_index().await?;
        let index = self.load_index().await?;
        let file = index.files.get(file_id).ok_or_else(|| missing_file(file_id))?;
        Ok(self.public_link(&file.meta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::extract_file_id;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::tempdir;

    fn app_tags() -> FileTags {
        FileTags::from([("app".to_string(), "shoppinglist".to_string())])
    }

    #[tokio::test]
    async fn files_survive_a_new_handle() {
        let tmp = tempdir().unwrap();
        let remote = FolderRemote::new(tmp.path());
        let folder = remote.ensure_folder("MyShoppingLists").await.unwrap();
        let created = remote
            .create_json_file("list_a.json", &folder, &app_tags(), &json!({ "title": "A" }))
            .await
            .unwrap();

        let reopened = FolderRemote::new(tmp.path());
        assert_eq!(reopened.ensure_folder("MyShoppingLists").await.unwrap(), folder);
        assert_eq!(
            reopened.get_file_content(&created.id).await.unwrap(),
            Some(json!({ "title": "A" }))
        );

        let listed = reopened
            .list_files(&FileQuery::new().with_tag("app", "shoppinglist"))
            .await
            .unwrap();
        assert_eq!(listed, vec![created]);
    }

    #[tokio::test]
    async fn update_bumps_modified_time() {
        let tmp = tempdir().unwrap();
        let remote = FolderRemote::new(tmp.path());
        let folder = remote.ensure_folder("Lists").await.unwrap();
        let created = remote
            .create_json_file("a.json", &folder, &FileTags::new(), &json!(1))
            .await
            .unwrap();

        let updated = remote
            .update_file_content(&created.id, &json!(2))
            .await
            .unwrap();
        assert!(updated.modified_time >= created.modified_time);
        assert_eq!(remote.get_file_content(&created.id).await.unwrap(), Some(json!(2)));
    }

    #[tokio::test]
    async fn missing_files_read_as_none_and_fail_updates() {
        let tmp = tempdir().unwrap();
        let remote = FolderRemote::new(tmp.path());

        assert!(remote.get_file_content("nope").await.unwrap().is_none());
        assert!(matches!(
            remote.update_file_content("nope", &json!({})).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            remote.get_share_link("nope").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn share_link_carries_file_id() {
        let tmp = tempdir().unwrap();
        let remote = FolderRemote::new(tmp.path());
        let folder = remote.ensure_folder("Lists").await.unwrap();
        let created = remote
            .create_json_file("a.json", &folder, &FileTags::new(), &json!({}))
            .await
            .unwrap();

        remote
            .create_public_permission(&created.id, ShareRole::Reader)
            .await
            .unwrap();
        let link = remote.get_share_link(&created.id).await.unwrap();
        assert!(link.starts_with("file://"));
        assert_eq!(extract_file_id(&link), Some(created.id));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn two_hosts_on_one_directory_keep_every_index_entry() {
        let tmp = tempdir().unwrap();
        let laptop = FolderRemote::new(tmp.path());
        let phone = FolderRemote::new(tmp.path());
        let folder = laptop.ensure_folder("Lists").await.unwrap();
        assert_eq!(phone.ensure_folder("Lists").await.unwrap(), folder);

        let mut created = Vec::new();
        for round in 0..25 {
            let (tags_a, tags_b) = (app_tags(), app_tags());
            let (body_a, body_b) = (json!({ "round": round }), json!({ "round": round }));
            let (a, b) = tokio::join!(
                laptop.create_json_file("a.json", &folder, &tags_a, &body_a),
                phone.create_json_file("b.json", &folder, &tags_b, &body_b),
            );
            created.push(a.unwrap().id);
            created.push(b.unwrap().id);
        }

        let listed = FolderRemote::new(tmp.path())
            .list_files(&FileQuery::new().with_tag("app", "shoppinglist"))
            .await
            .unwrap();
        assert_eq!(listed.len(), created.len());
        for id in &created {
            assert!(laptop.get_file_content(id).await.unwrap().is_some(), "{id}");
        }

        let leftovers = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn unreadable_root_is_reported_as_remote_failure() {
        let tmp = tempdir().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();

        let remote = FolderRemote::new(&blocker);
        let error = remote.ensure_folder("Lists").await.unwrap_err();
        assert!(error.is_transient(), "{error}");
    }
}
