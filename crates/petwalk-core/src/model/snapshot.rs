// ── Snapshot: the unit of atomic replacement ──

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::pet::{PetEvent, PetStatus};
use super::state::StateSet;

/// Mode name -> enabled. Keys are device-defined and open-ended.
pub type ModeSet = BTreeMap<String, bool>;

/// Consistent point-in-time view of everything polled from the door.
///
/// Snapshots are immutable once committed; the store swaps whole
/// `Arc<Snapshot>` values so readers never see a mix of old and new fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub modes: ModeSet,
    pub states: StateSet,
    pub pets: PetStatus,
}

impl Snapshot {
    pub fn mode(&self, name: &str) -> Option<bool> {
        self.modes.get(name).copied()
    }

    /// Last event for a pet. `None` both for unknown pets and pets never seen.
    pub fn pet_event(&self, pet_id: &str) -> Option<&PetEvent> {
        self.pets.get(pet_id).and_then(Option::as_ref)
    }
}
