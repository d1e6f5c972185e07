// ── Central snapshot store ──
//
// Holds the current `Snapshot` behind an `ArcSwapOption`: reads are a
// single atomic load, writes a single atomic swap. Every commit is
// mirrored into a `watch` channel for subscribers.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::model::Snapshot;
use crate::stream::SnapshotStream;

/// Last-known-good view of the door.
///
/// Only the controller writes (`commit` and the merge helpers are
/// crate-private); everyone else reads `Arc<Snapshot>` handles that stay
/// valid no matter what is committed afterwards.
pub struct SnapshotStore {
    pub(super) current: ArcSwapOption<Snapshot>,
    snapshot_tx: watch::Sender<Option<Arc<Snapshot>>>,
    pub(super) last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (snapshot_tx, _) = watch::channel(None);
        let (last_refresh, _) = watch::channel(None);

        Self {
            current: ArcSwapOption::empty(),
            snapshot_tx,
            last_refresh,
        }
    }

    /// The most recent committed snapshot, or `None` before the first
    /// successful refresh.
    pub fn read(&self) -> Option<Arc<Snapshot>> {
        self.current.load_full()
    }

    pub fn is_initialized(&self) -> bool {
        self.current.load().is_some()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> SnapshotStream {
        SnapshotStream::new(self.snapshot_tx.subscribe())
    }

    // ── Metadata ─────────────────────────────────────────────────────

    /// When the last successful refresh cycle committed.
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    /// How long ago the last refresh occurred, or `None` if never refreshed.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_refresh().map(|t| Utc::now() - t)
    }

    // ── Writes (controller only) ─────────────────────────────────────

    /// Atomically replace the current snapshot without merging. Refresh
    /// cycles go through `apply_refresh`.
    #[cfg(test)]
    pub(crate) fn commit(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        self.current.store(Some(Arc::clone(&snapshot)));
        self.publish();
        snapshot
    }

    /// Push the current value to subscribers.
    ///
    /// The load happens inside the watch lock, so concurrent publishers
    /// can never leave subscribers on an older value than the store.
    pub(super) fn publish(&self) {
        self.snapshot_tx.send_if_modified(|seen| {
            let latest = self.current.load_full();
            let changed = match (&*seen, &latest) {
                (Some(a), Some(b)) => !Arc::ptr_eq(a, b),
                (None, None) => false,
                _ => true,
            };
            if changed {
                *seen = latest;
            }
            changed
        });
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{DoorState, ModeSet, StateSet, SystemState};

    fn snapshot(door: DoorState) -> Snapshot {
        Snapshot {
            modes: ModeSet::new(),
            states: StateSet {
                door,
                system: SystemState::On,
            },
            pets: Default::default(),
        }
    }

    #[test]
    fn read_is_none_before_first_commit() {
        let store = SnapshotStore::new();
        assert!(store.read().is_none());
        assert!(!store.is_initialized());
        assert!(store.last_refresh().is_none());
    }

    #[test]
    fn commit_replaces_whole_snapshot() {
        let store = SnapshotStore::new();
        store.commit(snapshot(DoorState::Closed));
        let before = store.read().unwrap();

        store.commit(snapshot(DoorState::Open));

        assert_eq!(before.states.door, DoorState::Closed);
        assert_eq!(store.read().unwrap().states.door, DoorState::Open);
    }

    #[test]
    fn subscribers_see_latest_commit() {
        let store = SnapshotStore::new();
        let stream = store.subscribe();
        assert!(stream.current().is_none());

        store.commit(snapshot(DoorState::Open));

        let latest = stream.latest().unwrap();
        assert!(Arc::ptr_eq(&latest, &store.read().unwrap()));
    }
}
