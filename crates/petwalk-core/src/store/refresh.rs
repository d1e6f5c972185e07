// ── Refresh merge logic ──
//
// Folds fetched data into a new snapshot. Fields a cycle does not fetch
// (pet status) are carried over from the previous snapshot, and only
// default to empty on the very first commit.

use std::sync::Arc;

use chrono::Utc;

use super::SnapshotStore;
use crate::model::{ModeSet, PetStatus, Snapshot, StateSet};

/// Everything one refresh cycle fetched. Only built once every fetch in
/// the cycle has succeeded.
#[derive(Debug, Clone)]
pub(crate) struct RefreshData {
    pub modes: ModeSet,
    pub states: StateSet,
}

impl SnapshotStore {
    /// Merge a successful fetch into the store.
    ///
    /// Uses read-copy-update on the `ArcSwap`, so a concurrent pet-status
    /// update can never be lost between reading the old pets and swapping
    /// in the new snapshot.
    pub(crate) fn apply_refresh(&self, data: RefreshData) -> Arc<Snapshot> {
        let RefreshData { modes, states } = data;
        let mut committed = Arc::new(Snapshot {
            modes,
            states,
            pets: PetStatus::new(),
        });
        self.current.rcu(|current| {
            let pets = current
                .as_ref()
                .map(|snap| snap.pets.clone())
                .unwrap_or_default();
            committed = Arc::new(Snapshot {
                modes: committed.modes.clone(),
                states: committed.states,
                pets,
            });
            Some(Arc::clone(&committed))
        });
        self.last_refresh.send_replace(Some(Utc::now()));
        self.publish();
        committed
    }

    /// Replace the pet map, keeping modes and states.
    ///
    /// Returns `None` when nothing has been committed yet: pet status has
    /// no snapshot to attach to before the first refresh.
    pub(crate) fn apply_pet_status(&self, pets: PetStatus) -> Option<Arc<Snapshot>> {
        let previous = self.current.rcu(|current| {
            current.as_ref().map(|snap| {
                Arc::new(Snapshot {
                    modes: snap.modes.clone(),
                    states: snap.states,
                    pets: pets.clone(),
                })
            })
        });
        previous?;
        self.publish();
        self.read()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{Direction, DoorState, PetEvent, SystemState};

    fn data(motion_in: bool, door: DoorState) -> RefreshData {
        let mut modes = ModeSet::new();
        modes.insert("motion_in".into(), motion_in);
        RefreshData {
            modes,
            states: StateSet {
                door,
                system: SystemState::On,
            },
        }
    }

    fn pets() -> PetStatus {
        let mut pets = PetStatus::new();
        pets.insert(
            "42".into(),
            Some(PetEvent {
                direction: Direction::In,
                timestamp: Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap(),
            }),
        );
        pets
    }

    #[test]
    fn first_refresh_defaults_pets_to_empty() {
        let store = SnapshotStore::new();
        let snap = store.apply_refresh(data(true, DoorState::Closed));

        assert!(snap.pets.is_empty());
        assert_eq!(snap.mode("motion_in"), Some(true));
        assert!(store.last_refresh().is_some());
    }

    #[test]
    fn refresh_passes_pet_status_through() {
        let store = SnapshotStore::new();
        store.apply_refresh(data(true, DoorState::Closed));
        store.apply_pet_status(pets()).unwrap();

        let snap = store.apply_refresh(data(false, DoorState::Open));

        assert_eq!(snap.pets, pets());
        assert_eq!(snap.mode("motion_in"), Some(false));
        assert_eq!(snap.states.door, DoorState::Open);
    }

    #[test]
    fn pet_status_before_first_refresh_is_rejected() {
        let store = SnapshotStore::new();
        assert!(store.apply_pet_status(pets()).is_none());
        assert!(store.read().is_none());
    }

    #[test]
    fn pet_status_keeps_modes_and_states() {
        let store = SnapshotStore::new();
        let before = store.apply_refresh(data(true, DoorState::Closed));

        let after = store.apply_pet_status(pets()).unwrap();

        assert_eq!(after.modes, before.modes);
        assert_eq!(after.states, before.states);
        assert_eq!(after.pets, pets());
    }
}
