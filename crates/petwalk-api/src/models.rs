// Wire types for the door's REST payloads.
//
// Everything here mirrors the JSON exactly. Typed enums for door and
// system state live in `petwalk-core`; this layer keeps them as strings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// `GET /modes` body and `PUT /modes` partial body: mode name -> enabled.
pub type ModesPayload = BTreeMap<String, bool>;

/// `GET /states` body.
///
/// `door` is `"open"` / `"closed"`, `system` is `"on"` / `"off"`. Firmware
/// may add more keys; they are kept in `extra` rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatesPayload {
    pub door: String,
    pub system: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// `PUT /states` body. Absent fields are omitted from the JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatesUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub door: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl StatesUpdate {
    pub fn door(value: impl Into<String>) -> Self {
        Self {
            door: Some(value.into()),
            system: None,
        }
    }

    pub fn system(value: impl Into<String>) -> Self {
        Self {
            door: None,
            system: Some(value.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.door.is_none() && self.system.is_none()
    }
}
