//! Periodic background sync of the active list.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::session::SyncSession;
use crate::auth::CredentialProvider;
use crate::remote::RemoteFileService;
use crate::store::ListStore;

/// Handle to a running poller; dropping it stops polling after the current tick.
#[derive(Debug)]
pub struct PollerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Stop polling and wait for an in-flight tick to finish.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Err(error) = (&mut self.task).await {
            tracing::warn!("Sync poller task ended abnormally: {}", error);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Run [`SyncSession::poll_tick`] every `period`, starting one period from now.
///
/// A tick that finds the session busy (a user action holds the lock) is
/// skipped rather than queued, so at most one sync runs at a time.
pub fn spawn_poller<S, R, C>(
    session: Arc<Mutex<SyncSession<S, R, C>>>,
    period: Duration,
) -> PollerHandle
where
    S: ListStore + 'static,
    R: RemoteFileService + 'static,
    C: CredentialProvider + 'static,
{
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(async move {
        let mut ticks = time::interval_at(Instant::now() + period, period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::debug!("Sync poller started: interval={:?}", period);

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => break,
                _ = ticks.tick() => {
                    let Ok(mut session) = session.try_lock() else {
                        tracing::debug!("Skipping poll: session busy");
                        continue;
                    };
                    if let Some(status) = session.poll_tick().await {
                        tracing::debug!("Background sync finished: {}", status);
                    }
                }
            }
        }

        tracing::debug!("Sync poller stopped");
    });

    PollerHandle {
        shutdown: Some(shutdown_tx),
        task,
    }
}
