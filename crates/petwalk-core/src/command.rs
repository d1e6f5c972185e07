// ── Command API ──
//
// All write operations flow through a unified `Command` enum. The
// controller sends each variant to the matching REST endpoint and then
// requests an immediate refresh so the snapshot reflects the change.

use std::sync::Arc;

use crate::error::CoreError;
use crate::model::{DoorState, Snapshot, SystemState};

/// Keyed-state name for the door position.
pub const STATE_KEY_DOOR: &str = "door";
/// Keyed-state name for the access system.
pub const STATE_KEY_SYSTEM: &str = "system";

/// All write operations against a PetWALK door.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `PUT /modes` with a single-key body.
    SetMode { name: String, enabled: bool },
    /// `PUT /states` with only `door` set.
    SetDoorState { state: DoorState },
    /// `PUT /states` with only `system` set.
    SetSystemState { state: SystemState },
}

impl Command {
    /// Build a state command from an adapter-style `(key, on/off)` pair.
    ///
    /// Only `door` and `system` are recognised; anything else is
    /// [`CoreError::InvalidCommand`].
    pub fn from_state_key(key: &str, value: bool) -> Result<Self, CoreError> {
        match key {
            STATE_KEY_DOOR => Ok(Self::SetDoorState {
                state: DoorState::from_open(value),
            }),
            STATE_KEY_SYSTEM => Ok(Self::SetSystemState {
                state: SystemState::from_on(value),
            }),
            other => Err(CoreError::InvalidCommand { key: other.into() }),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), CoreError> {
        if let Self::SetMode { name, .. } = self {
            if name.trim().is_empty() {
                return Err(CoreError::ValidationFailed {
                    message: "mode name must not be empty".into(),
                });
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SetMode { name, enabled } => write!(f, "set mode {name}={enabled}"),
            Self::SetDoorState { state } => write!(f, "set door {state}"),
            Self::SetSystemState { state } => write!(f, "set system {state}"),
        }
    }
}

/// Outcome of a successful write.
#[derive(Debug, Clone)]
pub enum CommandResult {
    /// The write succeeded and the follow-up refresh committed this snapshot.
    Reconciled(Arc<Snapshot>),
    /// The write succeeded but the follow-up refresh failed. The failure was
    /// reported on the refresh event channel; the next cycle will pick the
    /// change up.
    Pending,
}

impl CommandResult {
    pub fn snapshot(&self) -> Option<&Arc<Snapshot>> {
        match self {
            Self::Reconciled(snap) => Some(snap),
            Self::Pending => None,
        }
    }
}
