// ── Pet identity and presence events ──

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Which way a pet last passed through the door.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

/// The most recent door passage recorded for a pet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetEvent {
    pub direction: Direction,
    pub timestamp: DateTime<Utc>,
}

/// Pet id -> last known event.
///
/// A missing key means "no known status", not "pet is away". A key mapped
/// to `None` means the pet is known but has never been seen.
pub type PetStatus = BTreeMap<String, Option<PetEvent>>;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Species {
    Cat,
    Dog,
    Unknown,
}

/// Static pet identity, supplied by configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub species: Option<Species>,
    /// Set for animals the door registered but nobody has named.
    #[serde(default)]
    pub unknown: bool,
}

impl Pet {
    /// Species label used in entity ids, `"unknown"` when not set.
    pub fn species_label(&self) -> &str {
        self.species.map_or("unknown", |s| match s {
            Species::Cat => "cat",
            Species::Dog => "dog",
            Species::Unknown => "unknown",
        })
    }
}
