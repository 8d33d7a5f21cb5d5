//! Per-document sync state machine.
//!
//! One cycle runs strictly in sequence: ensure the remote file, pull, then either
//! declare a conflict or merge and push. The controller holds no lock of its own;
//! callers must not sync the same document concurrently.

use std::fmt;

use crate::auth::CredentialProvider;
use crate::config::SyncSettings;
use crate::error::{Error, Result};
use crate::merge::merge_docs;
use crate::models::{ConflictRecord, ListDocument, ResolutionStrategy};
use crate::remote::{FileQuery, FileRef, FileTags, RemoteFileService, ShareRole};
use crate::util::{extract_file_id, next_stamp, now_millis};

const LIST_ID_TAG: &str = "listId";

/// Result of one sync cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nothing to pull or push
    Noop(ListDocument),
    /// Local changes uploaded without a merge
    Pushed(ListDocument),
    /// Remote merged in and the result uploaded
    MergedPushed(ListDocument),
    /// Remote merged in; nothing local to contribute
    PulledOnly(ListDocument),
    /// Both replicas moved since the last pull; needs a [`ResolutionStrategy`]
    Conflict(ConflictRecord),
    /// A poll found no remote copy for a list with local changes; only a
    /// manual sync recreates it
    RemoteMissing(ListDocument),
}

/// What started a sync cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    /// Explicit user action; may create the remote file
    Manual,
    /// Background tick; never creates or recreates a remote file
    Poll,
}

/// Payload-free view of a [`SyncOutcome`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Noop,
    Pushed,
    MergedPushed,
    PulledOnly,
    Conflict,
    RemoteMissing,
}

impl SyncStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Pushed => "pushed",
            Self::MergedPushed => "merged_pushed",
            Self::PulledOnly => "pulled_only",
            Self::Conflict => "conflict",
            Self::RemoteMissing => "remote_missing",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SyncOutcome {
    pub const fn status(&self) -> SyncStatus {
        match self {
            Self::Noop(_) => SyncStatus::Noop,
            Self::Pushed(_) => SyncStatus::Pushed,
            Self::MergedPushed(_) => SyncStatus::MergedPushed,
            Self::PulledOnly(_) => SyncStatus::PulledOnly,
            Self::Conflict(_) => SyncStatus::Conflict,
            Self::RemoteMissing(_) => SyncStatus::RemoteMissing,
        }
    }

    /// The document the caller should persist locally
    pub const fn document(&self) -> &ListDocument {
        match self {
            Self::Noop(doc)
            | Self::Pushed(doc)
            | Self::MergedPushed(doc)
            | Self::PulledOnly(doc)
            | Self::RemoteMissing(doc) => doc,
            Self::Conflict(record) => &record.local,
        }
    }
}

/// Drives pulls, pushes, and conflict resolution against a remote file host
pub struct SyncController<R, C> {
    remote: R,
    credentials: C,
    settings: SyncSettings,
}

impl<R: RemoteFileService, C: CredentialProvider> SyncController<R, C> {
    pub const fn new(remote: R, credentials: C, settings: SyncSettings) -> Self {
        Self {
            remote,
            credentials,
            settings,
        }
    }

    pub const fn remote(&self) -> &R {
        &self.remote
    }

    pub const fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_authenticated()
    }

    async fn authorize(&self) -> Result<()> {
        self.credentials.ensure_valid_token().await.map(|_| ())
    }

    fn file_tags(&self, doc: &ListDocument) -> FileTags {
        FileTags::from([
            (
                self.settings.app_property_key.clone(),
                self.settings.app_property_value.clone(),
            ),
            (LIST_ID_TAG.to_string(), doc.id.to_string()),
        ])
    }

    /// Create the remote file for a document that has none yet.
    ///
    /// The returned document is bound to the new file and flagged dirty so the
    /// next push uploads the sync metadata too.
    async fn create_remote_file(&self, mut doc: ListDocument) -> Result<ListDocument> {
        let folder_id = self.remote.ensure_folder(&self.settings.folder_name).await?;

        let mut initial = doc.clone();
        initial.dirty = false;
        let created = self
            .remote
            .create_json_file(
                &self.settings.file_name(doc.id.as_str()),
                &folder_id,
                &self.file_tags(&doc),
                &initial.to_json()?,
            )
            .await?;

        let now = now_millis();
        doc.sync.remote_file_id = Some(created.id.clone());
        doc.sync.remote_folder_id = Some(folder_id);
        doc.sync.remote_modified_at = created.modified_time;
        doc.sync.last_pushed_at = Some(now);
        doc.sync.last_pulled_at = Some(now.max(doc.updated_at));
        doc.dirty = true;

        tracing::info!("Created remote file {} for list {}", created.id, doc.id);
        Ok(doc)
    }

    /// Upload a document and return the clean copy that now matches the remote.
    async fn upload(&self, doc: ListDocument) -> Result<ListDocument> {
        let file_id = doc.sync.remote_file_id.clone().ok_or_else(|| {
            Error::SyncMetadataMissing(format!("list {} has no remote file", doc.id))
        })?;

        let now = now_millis();
        let mut outgoing = doc;
        outgoing.sync.last_pushed_at = Some(now);
        outgoing.sync.last_pulled_at = Some(now.max(outgoing.updated_at));
        outgoing.mark_clean();

        let meta = self
            .remote
            .update_file_content(&file_id, &outgoing.to_json()?)
            .await?;
        if meta.modified_time.is_some() {
            outgoing.sync.remote_modified_at = meta.modified_time;
        }

        tracing::info!("Pushed list {} to remote file {}", outgoing.id, file_id);
        Ok(outgoing)
    }

    /// Force-upload a document to its existing remote file
    pub async fn push(&self, doc: ListDocument) -> Result<ListDocument> {
        if !doc.sync.has_remote_file() {
            return Err(Error::SyncMetadataMissing(format!(
                "list {} has no remote file",
                doc.id
            )));
        }
        self.authorize().await?;
        self.upload(doc).await
    }

    /// Run one sync cycle for `doc`.
    ///
    /// A conflict is declared only when the remote moved past the last pull and
    /// the local replica has unpushed changes; the local document is then
    /// returned untouched.
    pub async fn sync_detect_conflict(&self, doc: ListDocument) -> Result<SyncOutcome> {
        self.sync(doc, SyncTrigger::Manual).await
    }

    /// Run one sync cycle; a [`SyncTrigger::Poll`] cycle never creates files.
    pub async fn sync(&self, doc: ListDocument, trigger: SyncTrigger) -> Result<SyncOutcome> {
        self.authorize().await?;

        let Some(file_id) = doc.sync.remote_file_id.clone() else {
            if trigger == SyncTrigger::Poll {
                return Ok(SyncOutcome::Noop(doc));
            }
            let doc = self.create_remote_file(doc).await?;
            return Ok(SyncOutcome::Pushed(self.upload(doc).await?));
        };

        let Some(payload) = self.remote.get_file_content(&file_id).await? else {
            if !doc.is_dirty() {
                return Ok(SyncOutcome::Noop(doc));
            }
            if trigger == SyncTrigger::Poll {
                tracing::warn!(
                    "Remote file {} for list {} is gone; waiting for a manual sync",
                    file_id,
                    doc.id
                );
                return Ok(SyncOutcome::RemoteMissing(doc));
            }
            tracing::warn!(
                "Remote file {} for list {} is gone; recreating it",
                file_id,
                doc.id
            );
            let mut doc = doc;
            doc.sync.remote_file_id = None;
            let doc = self.create_remote_file(doc).await?;
            return Ok(SyncOutcome::Pushed(self.upload(doc).await?));
        };
        let remote = ListDocument::from_json(payload)?;

        let remote_changed = remote.updated_at > doc.sync.last_pulled_at.unwrap_or(0);
        if remote_changed && doc.is_dirty() {
            tracing::warn!(
                "Sync conflict on list {}: remote clock {} is past last pull {:?} and local has unpushed changes",
                doc.id,
                remote.updated_at,
                doc.sync.last_pulled_at
            );
            return Ok(SyncOutcome::Conflict(ConflictRecord {
                local: doc,
                remote,
                detected_at: now_millis(),
            }));
        }

        let mut merged = merge_docs(&doc, &remote);
        merged.sync.last_pulled_at = Some(now_millis().max(remote.updated_at));

        if merged.is_dirty() {
            Ok(SyncOutcome::MergedPushed(self.upload(merged).await?))
        } else {
            tracing::info!("Pulled remote changes for list {}", merged.id);
            Ok(SyncOutcome::PulledOnly(merged))
        }
    }

    /// Finish a conflict with the chosen strategy and return the new local document.
    pub async fn resolve_conflict(
        &self,
        record: ConflictRecord,
        strategy: ResolutionStrategy,
    ) -> Result<ListDocument> {
        let ConflictRecord { local, remote, .. } = record;
        tracing::info!("Resolving conflict on list {} with '{}'", local.id, strategy);

        match strategy {
            ResolutionStrategy::Remote => {
                let mut doc = remote;
                doc.id = local.id;
                doc.sync = local.sync;
                doc.sync.last_pulled_at = Some(now_millis().max(doc.updated_at));
                doc.mark_clean();
                Ok(doc)
            }
            ResolutionStrategy::Mine => {
                let mut doc = local;
                // Clock must pass the remote's for other replicas to notice the overwrite
                doc.updated_at = next_stamp(doc.updated_at.max(remote.updated_at));
                doc.dirty = true;
                self.push(doc).await
            }
            ResolutionStrategy::Merge => {
                let mut doc = merge_docs(&local, &remote);
                doc.mark_dirty();
                self.push(doc).await
            }
        }
    }

    /// Grant "anyone with the link" access and return the link.
    pub async fn share(&self, doc: &ListDocument, role: ShareRole) -> Result<String> {
        let file_id = doc.sync.remote_file_id.as_deref().ok_or_else(|| {
            Error::SyncMetadataMissing(format!("list {} has not been synced yet", doc.id))
        })?;
        self.authorize().await?;

        self.remote.create_public_permission(file_id, role).await?;
        let link = self.remote.get_share_link(file_id).await?;
        tracing::info!("Shared list {} as {}", doc.id, role);
        Ok(link)
    }

    /// Fetch a shared list by link or id as a new, clean local document.
    pub async fn import_shared(&self, link_or_id: &str) -> Result<ListDocument> {
        let file_id = extract_file_id(link_or_id).ok_or_else(|| {
            Error::InvalidInput(format!("no file id found in '{}'", link_or_id.trim()))
        })?;
        self.authorize().await?;

        let payload = self
            .remote
            .get_file_content(&file_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("shared list {file_id}")))?;
        let mut doc = ListDocument::from_json(payload)?;

        doc.sync.remote_file_id = Some(file_id);
        doc.sync.remote_modified_at = None;
        doc.sync.last_pushed_at = None;
        doc.sync.last_pulled_at = Some(now_millis().max(doc.updated_at));
        doc.mark_clean();

        tracing::info!("Imported shared list {} ({})", doc.id, doc.title);
        Ok(doc)
    }

    /// Remote files tagged as belonging to this application
    pub async fn list_remote_documents(&self) -> Result<Vec<FileRef>> {
        self.authorize().await?;
        let query = FileQuery::new().with_tag(
            self.settings.app_property_key.clone(),
            self.settings.app_property_value.clone(),
        );
        self.remote.list_files(&query).await
    }
}
