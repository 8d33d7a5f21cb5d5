//! Synchronization against the remote file host.

mod controller;
mod poller;
mod session;

pub use controller::{SyncController, SyncOutcome, SyncStatus, SyncTrigger};
pub use poller::{spawn_poller, PollerHandle};
pub use session::{SessionStatus, SyncSession};
