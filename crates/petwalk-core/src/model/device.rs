// ── Device identity ──

use serde::Serialize;

pub const MANUFACTURER: &str = "PetWALK";
pub const NAME: &str = "PetWALK";

/// Identity of the door, shared by every entity built from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// Stable identifier: the configured IP address or hostname.
    pub identifier: String,
    /// Display name, `"PetWALK {host}"` by default.
    pub name: String,
    pub manufacturer: String,
}

impl DeviceInfo {
    pub fn for_host(host: &str) -> Self {
        Self {
            identifier: host.to_owned(),
            name: format!("{NAME} {host}"),
            manufacturer: MANUFACTURER.to_owned(),
        }
    }
}
