// ── Unified domain model ──
//
// Every type in this module is the canonical representation of data the
// door reports. Transport strings are decoded into these types in
// `convert`; consumers (CLI, entity adapters) depend only on this module.

pub mod device;
pub mod pet;
pub mod snapshot;
pub mod state;

// ── Re-exports ──────────────────────────────────────────────────────

pub use device::DeviceInfo;
pub use pet::{Direction, Pet, PetEvent, PetStatus, Species};
pub use snapshot::{ModeSet, Snapshot};
pub use state::{DoorState, StateSet, SystemState};
