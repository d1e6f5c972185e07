// ── API-to-domain type conversions ──
//
// Bridges raw `petwalk_api` wire types into canonical `model` types.
// Door and system values arrive as strings; anything outside the known
// vocabulary is a malformed payload, never silently defaulted.

use petwalk_api::StatesPayload;

use crate::error::CoreError;
use crate::model::{DoorState, StateSet, SystemState};

impl TryFrom<StatesPayload> for StateSet {
    type Error = CoreError;

    fn try_from(payload: StatesPayload) -> Result<Self, Self::Error> {
        Ok(Self {
            door: parse_field("door", &payload.door)?,
            system: parse_field("system", &payload.system)?,
        })
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, raw: &str) -> Result<T, CoreError> {
    raw.trim()
        .to_ascii_lowercase()
        .parse()
        .map_err(|_| CoreError::MalformedPayload {
            message: format!("unexpected {field} value '{raw}'"),
        })
}

/// Convert a door state into its wire string.
pub(crate) fn door_wire(state: DoorState) -> &'static str {
    match state {
        DoorState::Open => "open",
        DoorState::Closed => "closed",
    }
}

/// Convert a system state into its wire string.
pub(crate) fn system_wire(state: SystemState) -> &'static str {
    match state {
        SystemState::On => "on",
        SystemState::Off => "off",
    }
}
