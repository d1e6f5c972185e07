// ── Snapshot store ──
//
// Lock-free last-known-good storage with push-based change notification.

mod refresh;
mod snapshot_store;

pub(crate) use refresh::RefreshData;
pub use snapshot_store::SnapshotStore;
