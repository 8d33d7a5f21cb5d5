//! Caller-owned sync context: active list, pending conflict, and status.

use tokio::sync::watch;

use crate::auth::CredentialProvider;
use crate::conflict::{summarize_conflict, ConflictSummary};
use crate::error::{Error, Result};
use crate::models::{ConflictRecord, ListDocument, ListId, ResolutionStrategy};
use crate::remote::{FileRef, RemoteFileService, ShareRole};
use crate::state::SyncState;
use crate::store::ListStore;

use super::controller::{SyncController, SyncOutcome, SyncStatus, SyncTrigger};

/// Snapshot of the session's state and status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub state: SyncState,
    pub message: String,
}

/// Everything one client needs to edit and synchronize lists.
///
/// Local edits are applied to a copy and persisted before they replace the
/// active document, so a failed edit leaves both untouched.
pub struct SyncSession<S, R, C> {
    store: S,
    controller: SyncController<R, C>,
    active: Option<ListDocument>,
    pending_conflict: Option<ConflictRecord>,
    state: SyncState,
    status: String,
    status_tx: watch::Sender<SessionStatus>,
}

fn no_active_list() -> Error {
    Error::NotFound("no active list".to_string())
}

impl<S, R, C> SyncSession<S, R, C>
where
    S: ListStore,
    R: RemoteFileService,
    C: CredentialProvider,
{
    pub fn new(store: S, controller: SyncController<R, C>) -> Self {
        let (state, status) = if controller.is_authenticated() {
            (SyncState::Synced, "Ready")
        } else {
            (SyncState::Offline, "Not signed in")
        };
        let (status_tx, _) = watch::channel(SessionStatus {
            state,
            message: status.to_string(),
        });
        Self {
            store,
            controller,
            active: None,
            pending_conflict: None,
            state,
            status: status.to_string(),
            status_tx,
        }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn controller(&self) -> &SyncController<R, C> {
        &self.controller
    }

    pub const fn active(&self) -> Option<&ListDocument> {
        self.active.as_ref()
    }

    pub const fn pending_conflict(&self) -> Option<&ConflictRecord> {
        self.pending_conflict.as_ref()
    }

    /// Diff of the pending conflict against the current local document
    pub fn conflict_summary(&self) -> Option<ConflictSummary> {
        let record = self.pending_conflict.as_ref()?;
        let local = self.active.as_ref().unwrap_or(&record.local);
        Some(summarize_conflict(local, &record.remote))
    }

    pub const fn state(&self) -> SyncState {
        self.state
    }

    /// User-visible status line
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Receive every status change without locking the session
    pub fn subscribe_status(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    fn set_status(&mut self, state: SyncState, status: impl Into<String>) {
        self.state = state;
        self.status = status.into();
        self.status_tx.send_replace(SessionStatus {
            state,
            message: self.status.clone(),
        });
    }

    fn activate(&mut self, doc: ListDocument) -> &ListDocument {
        if self.active.as_ref().is_some_and(|active| active.id != doc.id) {
            self.pending_conflict = None;
            if self.state == SyncState::Conflict {
                self.set_status(SyncState::Synced, "Ready");
            }
        }
        self.active.insert(doc)
    }

    /// Reopen the list that was active in the previous run, if it still exists
    pub async fn restore(&mut self) -> Result<Option<&ListDocument>> {
        let Some(id) = self.store.active_list().await? else {
            return Ok(None);
        };
        match self.store.get(&id).await? {
            Some(doc) => Ok(Some(self.activate(doc))),
            None => {
                self.store.set_active_list(None).await?;
                Ok(None)
            }
        }
    }

    pub async fn lists(&self) -> Result<Vec<ListDocument>> {
        self.store.get_all().await
    }

    pub async fn create_list(&mut self, title: &str) -> Result<&ListDocument> {
        let doc = ListDocument::new(title);
        self.store.put(&doc).await?;
        self.store.set_active_list(Some(&doc.id)).await?;
        tracing::info!("Created list {} ({})", doc.id, doc.title);
        Ok(self.activate(doc))
    }

    pub async fn open_list(&mut self, id: &ListId) -> Result<&ListDocument> {
        let doc = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("list {id}")))?;
        self.store.set_active_list(Some(id)).await?;
        Ok(self.activate(doc))
    }

    /// Remove a list locally; its remote file is left alone
    pub async fn delete_list(&mut self, id: &ListId) -> Result<()> {
        self.store.delete(id).await?;
        if self.active.as_ref().is_some_and(|doc| &doc.id == id) {
            self.active = None;
            self.pending_conflict = None;
            self.store.set_active_list(None).await?;
        }
        Ok(())
    }

    /// Apply a local edit to the active list and persist it.
    pub async fn edit<T>(
        &mut self,
        apply: impl FnOnce(&mut ListDocument) -> Result<T> + Send,
    ) -> Result<T> {
        let mut doc = self.active.clone().ok_or_else(no_active_list)?;
        let value = apply(&mut doc)?;
        if Some(&doc) != self.active.as_ref() {
            self.store.put(&doc).await?;
            self.active = Some(doc);
        }
        Ok(value)
    }

    async fn apply_outcome(&mut self, outcome: SyncOutcome) -> Result<SyncStatus> {
        let status = outcome.status();
        match outcome {
            SyncOutcome::Conflict(record) => {
                self.store.put(&record.local).await?;
                self.active = Some(record.local.clone());
                self.pending_conflict = Some(record);
                self.set_status(
                    SyncState::Conflict,
                    "Conflict: choose remote, mine, or merge",
                );
            }
            SyncOutcome::Noop(doc)
            | SyncOutcome::Pushed(doc)
            | SyncOutcome::MergedPushed(doc)
            | SyncOutcome::PulledOnly(doc) => {
                self.store.put(&doc).await?;
                self.active = Some(doc);
                let message = match status {
                    SyncStatus::Pushed => "Saved to remote",
                    SyncStatus::MergedPushed => "Merged and saved",
                    SyncStatus::PulledOnly => "Pulled remote changes",
                    _ => "Up to date",
                };
                self.set_status(SyncState::Synced, message);
            }
            SyncOutcome::RemoteMissing(doc) => {
                self.active = Some(doc);
                self.set_status(
                    SyncState::Error,
                    "Remote copy missing; sync manually to recreate it",
                );
            }
        }
        Ok(status)
    }

    /// User-triggered sync of the active list; failures are reported.
    pub async fn sync_now(&mut self) -> Result<SyncStatus> {
        let doc = self.active.clone().ok_or_else(no_active_list)?;
        if self.pending_conflict.is_some() {
            return Err(Error::InvalidOperation(
                "resolve the pending conflict before syncing again".to_string(),
            ));
        }
        if !self.controller.is_authenticated() {
            self.set_status(SyncState::Offline, "Sign in to sync");
            return Err(Error::RemoteUnavailable("not signed in".to_string()));
        }

        self.set_status(SyncState::Syncing, "Syncing...");
        let result = match self.controller.sync(doc, SyncTrigger::Manual).await {
            Ok(outcome) => self.apply_outcome(outcome).await,
            Err(error) => Err(error),
        };
        if let Err(error) = &result {
            self.set_status(SyncState::Error, format!("Sync failed: {error}"));
        }
        result
    }

    /// Background sync; never reports errors and never touches a pending conflict.
    ///
    /// Returns `None` when the tick was skipped or failed.
    pub async fn poll_tick(&mut self) -> Option<SyncStatus> {
        if !self.controller.is_authenticated() {
            tracing::debug!("Skipping poll: not signed in");
            return None;
        }
        let Some(doc) = self.active.clone() else {
            tracing::debug!("Skipping poll: no active list");
            return None;
        };
        if self.pending_conflict.is_some() {
            tracing::debug!("Skipping poll: conflict pending on list {}", doc.id);
            return None;
        }
        if !doc.sync.has_remote_file() {
            tracing::debug!("Skipping poll: list {} has no remote file", doc.id);
            return None;
        }

        let outcome = match self.controller.sync(doc, SyncTrigger::Poll).await {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::debug!("Background sync failed: {}", error);
                return None;
            }
        };
        match self.apply_outcome(outcome).await {
            Ok(status) => Some(status),
            Err(error) => {
                tracing::debug!("Background sync could not persist result: {}", error);
                None
            }
        }
    }

    /// Resolve the pending conflict and atomically replace the local list.
    pub async fn resolve(&mut self, strategy: ResolutionStrategy) -> Result<&ListDocument> {
        let mut record = self
            .pending_conflict
            .clone()
            .ok_or_else(|| Error::InvalidOperation("no pending conflict".to_string()))?;
        if let Some(active) = &self.active {
            record.local = active.clone();
        }

        match self.controller.resolve_conflict(record, strategy).await {
            Ok(doc) => {
                self.store.put(&doc).await?;
                self.pending_conflict = None;
                self.set_status(SyncState::Synced, format!("Conflict resolved ({strategy})"));
                let doc: &ListDocument = self.active.insert(doc);
                Ok(doc)
            }
            Err(error) => {
                self.set_status(SyncState::Conflict, format!("Resolution failed: {error}"));
                Err(error)
            }
        }
    }

    /// Sync the active list, then return a public link to it.
    pub async fn share(&mut self, role: Option<ShareRole>) -> Result<String> {
        if self.pending_conflict.is_some() {
            return Err(Error::InvalidOperation(
                "resolve the pending conflict before sharing".to_string(),
            ));
        }
        if self.sync_now().await? == SyncStatus::Conflict {
            return Err(Error::InvalidOperation(
                "list changed remotely; resolve the conflict before sharing".to_string(),
            ));
        }

        let doc = self.active.as_ref().ok_or_else(no_active_list)?;
        let role = role.unwrap_or(self.controller.settings().default_share_role);
        match self.controller.share(doc, role).await {
            Ok(link) => {
                self.set_status(SyncState::Synced, "Share link ready");
                Ok(link)
            }
            Err(error) => {
                self.set_status(SyncState::Error, format!("Share failed: {error}"));
                Err(error)
            }
        }
    }

    /// Import a shared list and make it active.
    ///
    /// A list that is already stored locally is opened instead of replaced.
    pub async fn import_shared(&mut self, link_or_id: &str) -> Result<&ListDocument> {
        let imported = match self.controller.import_shared(link_or_id).await {
            Ok(doc) => doc,
            Err(error) => {
                self.set_status(SyncState::Error, format!("Import failed: {error}"));
                return Err(error);
            }
        };

        let doc = match self.store.get(&imported.id).await? {
            Some(existing) => {
                tracing::info!("List {} already stored; opening it", existing.id);
                existing
            }
            None => {
                self.store.put(&imported).await?;
                imported
            }
        };
        self.store.set_active_list(Some(&doc.id)).await?;
        self.set_status(SyncState::Synced, format!("Imported \"{}\"", doc.title));
        Ok(self.activate(doc))
    }

    pub async fn remote_lists(&self) -> Result<Vec<FileRef>> {
        self.controller.list_remote_documents().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AccessToken, StaticCredentials};
    use crate::config::SyncSettings;
    use crate::models::{ItemPatch, NewItem};
    use crate::remote::MemoryRemote;
    use crate::store::MemoryListStore;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    type TestSession = SyncSession<Arc<MemoryListStore>, Arc<MemoryRemote>, StaticCredentials>;

    fn session_with(remote: Arc<MemoryRemote>, store: Arc<MemoryListStore>) -> TestSession {
        SyncSession::new(
            store,
            SyncController::new(
                remote,
                StaticCredentials::signed_in(AccessToken::new("token")),
                SyncSettings::default(),
            ),
        )
    }

    fn session() -> TestSession {
        session_with(Arc::new(MemoryRemote::new()), Arc::new(MemoryListStore::new()))
    }

    /// Sync the active list, then have another replica edit the remote copy.
    async fn edit_remotely(session: &TestSession, label: &str) {
        let file_id = session
            .active()
            .and_then(|doc| doc.sync.remote_file_id.clone())
            .unwrap();
        let remote = session.controller().remote();
        let mut other = ListDocument::from_json(remote.file_content(&file_id).await.unwrap())
            .unwrap();
        other.updated_at = crate::util::now_millis() + 1_000;
        other.add_item(NewItem::new(label)).unwrap();
        other.mark_clean();
        remote
            .replace_content(&file_id, other.to_json().unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn edits_are_persisted_and_failed_edits_leave_nothing_behind() {
        let mut session = session();
        session.create_list("Weekly").await.unwrap();

        let id = session
            .edit(|doc| doc.add_item(NewItem::new("Milk")))
            .await
            .unwrap()
            .unwrap();
        let stored = session
            .store()
            .get(&session.active().unwrap().id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.live_item(&id).is_some());

        let before = session.active().cloned();
        let error = session
            .edit(|doc| {
                doc.rename("Changed");
                doc.update_item(
                    &id,
                    ItemPatch {
                        label: Some(" ".to_string()),
                        ..ItemPatch::default()
                    },
                )
            })
            .await
            .unwrap_err();
        assert!(matches!(error, Error::InvalidInput(_)));
        assert_eq!(session.active().cloned(), before);
    }

    #[tokio::test]
    async fn restore_reopens_last_active_list() {
        let store = Arc::new(MemoryListStore::new());
        let remote = Arc::new(MemoryRemote::new());
        let mut first = session_with(remote.clone(), store.clone());
        let created = first.create_list("Weekly").await.unwrap().id.clone();

        let mut second = session_with(remote, store);
        let restored = second.restore().await.unwrap().unwrap();
        assert_eq!(restored.id, created);
    }

    #[tokio::test]
    async fn sync_now_reports_status_and_persists() {
        let mut session = session();
        session.create_list("Weekly").await.unwrap();

        assert_eq!(session.sync_now().await.unwrap(), SyncStatus::Pushed);
        assert_eq!(session.state(), SyncState::Synced);
        let active = session.active().unwrap().clone();
        assert!(active.sync.has_remote_file());
        assert_eq!(
            session.store().get(&active.id).await.unwrap(),
            Some(active)
        );
        assert_eq!(session.remote_lists().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sync_failures_are_surfaced_in_status() {
        let mut session = session();
        session.create_list("Weekly").await.unwrap();
        session.controller().remote().set_offline(true);

        let error = session.sync_now().await.unwrap_err();
        assert!(error.is_transient());
        assert_eq!(session.state(), SyncState::Error);
        assert!(session.status().starts_with("Sync failed"));
    }

    #[tokio::test]
    async fn conflict_is_held_until_resolved() {
        let mut session = session();
        session.create_list("Weekly").await.unwrap();
        session.sync_now().await.unwrap();

        edit_remotely(&session, "Chips").await;
        session
            .edit(|doc| doc.add_item(NewItem::new("Salsa")))
            .await
            .unwrap();

        assert_eq!(session.sync_now().await.unwrap(), SyncStatus::Conflict);
        assert_eq!(session.state(), SyncState::Conflict);
        let summary = session.conflict_summary().unwrap();
        assert_eq!(summary.items.added.len(), 2);

        // Neither polling nor manual sync may touch a pending conflict
        assert_eq!(session.poll_tick().await, None);
        assert!(matches!(
            session.sync_now().await,
            Err(Error::InvalidOperation(_))
        ));
        assert!(session.pending_conflict().is_some());

        let doc = session.resolve(ResolutionStrategy::Merge).await.unwrap();
        let labels = doc
            .live_items()
            .map(|item| item.label.clone())
            .collect::<std::collections::BTreeSet<_>>();
        assert_eq!(
            labels,
            ["Chips".to_string(), "Salsa".to_string()].into_iter().collect()
        );
        assert!(session.pending_conflict().is_none());
        assert_eq!(session.state(), SyncState::Synced);
    }

    #[tokio::test]
    async fn poll_tick_pulls_remote_changes_and_swallows_failures() {
        let mut session = session();
        session.create_list("Weekly").await.unwrap();

        // Never auto-creates the remote file
        assert_eq!(session.poll_tick().await, None);
        assert_eq!(session.controller().remote().file_count().await, 0);

        session.sync_now().await.unwrap();
        edit_remotely(&session, "Chips").await;
        assert_eq!(session.poll_tick().await, Some(SyncStatus::PulledOnly));
        assert_eq!(session.active().unwrap().live_items().count(), 1);

        session.controller().remote().set_offline(true);
        assert_eq!(session.poll_tick().await, None);
        assert_eq!(session.state(), SyncState::Synced);
    }

    #[tokio::test]
    async fn poll_leaves_a_vanished_remote_file_for_manual_sync() {
        let mut session = session();
        session.create_list("Weekly").await.unwrap();
        session.sync_now().await.unwrap();
        let old_file = session
            .active()
            .and_then(|doc| doc.sync.remote_file_id.clone())
            .unwrap();

        session.controller().remote().remove_file(&old_file).await;
        session
            .edit(|doc| doc.add_item(NewItem::new("Milk")))
            .await
            .unwrap();

        assert_eq!(session.poll_tick().await, Some(SyncStatus::RemoteMissing));
        assert_eq!(session.controller().remote().file_count().await, 0);
        assert_eq!(session.state(), SyncState::Error);
        let active = session.active().unwrap();
        assert!(active.is_dirty());
        assert_eq!(active.sync.remote_file_id.as_deref(), Some(old_file.as_str()));

        // An explicit sync is allowed to publish it again
        assert_eq!(session.sync_now().await.unwrap(), SyncStatus::Pushed);
        assert_eq!(session.controller().remote().file_count().await, 1);
        assert_ne!(
            session.active().unwrap().sync.remote_file_id.as_deref(),
            Some(old_file.as_str())
        );
    }

    #[tokio::test]
    async fn failed_save_after_sync_is_reported_as_error() {
        let store = Arc::new(MemoryListStore::new());
        let mut session = session_with(Arc::new(MemoryRemote::new()), store.clone());
        session.create_list("Weekly").await.unwrap();

        store.set_read_only(true);
        let error = session.sync_now().await.unwrap_err();
        assert!(matches!(error, Error::Io(_)));
        assert_eq!(session.state(), SyncState::Error);
        assert!(session.status().starts_with("Sync failed"));
    }

    #[tokio::test]
    async fn status_changes_reach_subscribers_without_the_session() {
        let mut session = session();
        let mut updates = session.subscribe_status();
        assert_eq!(updates.borrow().state, SyncState::Synced);

        session.create_list("Weekly").await.unwrap();
        session.sync_now().await.unwrap();

        assert!(updates.has_changed().unwrap());
        let latest = updates.borrow_and_update().clone();
        assert_eq!(
            latest,
            SessionStatus {
                state: SyncState::Synced,
                message: "Saved to remote".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn share_syncs_first_and_import_opens_the_list() {
        let remote = Arc::new(MemoryRemote::new());
        let mut owner = session_with(remote.clone(), Arc::new(MemoryListStore::new()));
        owner.create_list("Party").await.unwrap();
        owner
            .edit(|doc| doc.add_item(NewItem::new("Chips")))
            .await
            .unwrap();

        let link = owner.share(Some(ShareRole::Writer)).await.unwrap();
        assert_eq!(owner.status(), "Share link ready");

        let mut guest = session_with(remote, Arc::new(MemoryListStore::new()));
        let imported = guest.import_shared(&link).await.unwrap().clone();
        assert_eq!(imported.title, "Party");
        assert_eq!(imported.live_items().count(), 1);
        assert!(!imported.is_dirty());
        assert_eq!(guest.lists().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn signed_out_session_stays_offline() {
        let mut session = SyncSession::new(
            MemoryListStore::new(),
            SyncController::new(
                MemoryRemote::new(),
                StaticCredentials::signed_out(),
                SyncSettings::default(),
            ),
        );
        assert_eq!(session.state(), SyncState::Offline);
        session.create_list("Weekly").await.unwrap();

        assert!(session.sync_now().await.is_err());
        assert_eq!(session.status(), "Sign in to sync");
        assert_eq!(session.poll_tick().await, None);
    }
}
