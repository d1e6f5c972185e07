// ── Entity adapters ──
//
// Plain read-only views derived from a snapshot, for hosts that expose the
// door as a set of named entities (presence trackers, timestamp sensors,
// switches, a cover). Entities hold only identity; state is always read
// from the snapshot passed in.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{AsRefStr, Display};

use crate::command::{Command, STATE_KEY_SYSTEM};
use crate::config::ControllerConfig;
use crate::model::{DeviceInfo, Direction, DoorState, Pet, Snapshot, Species, SystemState};

const DOMAIN: &str = "petwalk";

/// Presence of a pet as seen by the door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Presence {
    Home,
    NotHome,
}

/// Naming shared by every entity: display name and stable unique id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityMeta {
    pub entity_id: String,
    pub name: String,
    pub unique_id: String,
}

impl EntityMeta {
    fn new(device: &DeviceInfo, entity_id: String, label: &str) -> Self {
        Self {
            name: format!("{} {} {label}", crate::model::device::NAME, device.name),
            unique_id: format!("{DOMAIN}_{}_{entity_id}", device.name),
            entity_id,
        }
    }
}

fn pet_entity_id(pet: &Pet) -> String {
    format!("pet_{}_{}", pet.species_label(), pet.name.to_lowercase())
}

fn pet_icon(species: Option<Species>) -> &'static str {
    match species {
        Some(Species::Cat) => "mdi:cat",
        Some(Species::Dog) => "mdi:dog",
        _ => "mdi:paw",
    }
}

// ── Pet presence ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PetTracker {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub pet_id: String,
    pub icon: &'static str,
    #[serde(skip)]
    ttl: Option<Duration>,
}

impl PetTracker {
    /// `Home` only if the last event was an entry no older than the TTL.
    pub fn presence(&self, snapshot: &Snapshot, now: DateTime<Utc>) -> Presence {
        let Some(event) = snapshot.pet_event(&self.pet_id) else {
            return Presence::NotHome;
        };
        if event.direction != Direction::In {
            return Presence::NotHome;
        }
        if let Some(ttl) = self.ttl {
            let age = now.signed_duration_since(event.timestamp);
            let expired = chrono::Duration::from_std(ttl).is_ok_and(|ttl| age > ttl);
            if expired {
                return Presence::NotHome;
            }
        }
        Presence::Home
    }
}

/// Timestamp of a pet's most recent passage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PetLastEventSensor {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub pet_id: String,
    pub icon: &'static str,
}

impl PetLastEventSensor {
    pub fn value(&self, snapshot: &Snapshot) -> Option<DateTime<Utc>> {
        snapshot.pet_event(&self.pet_id).map(|e| e.timestamp)
    }
}

// ── Controls ─────────────────────────────────────────────────────

/// One switch per device mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeSwitch {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub mode: String,
}

impl ModeSwitch {
    pub fn is_on(&self, snapshot: &Snapshot) -> Option<bool> {
        snapshot.mode(&self.mode)
    }

    pub fn command(&self, on: bool) -> Command {
        Command::SetMode {
            name: self.mode.clone(),
            enabled: on,
        }
    }
}

/// Access system on/off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemSwitch {
    #[serde(flatten)]
    pub meta: EntityMeta,
}

impl SystemSwitch {
    pub fn is_on(&self, snapshot: &Snapshot) -> bool {
        snapshot.states.system.is_on()
    }

    pub fn command(&self, on: bool) -> Command {
        Command::SetSystemState {
            state: SystemState::from_on(on),
        }
    }
}

/// The door flap as an open/close cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoorCover {
    #[serde(flatten)]
    pub meta: EntityMeta,
}

impl DoorCover {
    pub fn is_open(&self, snapshot: &Snapshot) -> bool {
        snapshot.states.door.is_open()
    }

    pub fn command(&self, open: bool) -> Command {
        Command::SetDoorState {
            state: DoorState::from_open(open),
        }
    }
}

// ── Entity set ───────────────────────────────────────────────────

/// Every entity a door exposes, built once from config and the first
/// snapshot's mode names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitySet {
    pub device: DeviceInfo,
    pub trackers: Vec<PetTracker>,
    pub sensors: Vec<PetLastEventSensor>,
    pub mode_switches: Vec<ModeSwitch>,
    pub system_switch: SystemSwitch,
    pub door_cover: DoorCover,
}

impl EntitySet {
    pub fn build(config: &ControllerConfig, snapshot: &Snapshot) -> Self {
        let device = DeviceInfo::for_host(&config.host);

        // Unknown or unnamed animals get no presence tracker.
        let trackers = config
            .pets
            .iter()
            .filter(|pet| !pet.unknown && !pet.name.is_empty())
            .map(|pet| PetTracker {
                meta: EntityMeta::new(&device, pet_entity_id(pet), &pet.name),
                pet_id: pet.id.clone(),
                icon: pet_icon(pet.species),
                ttl: config.pet_event_ttl,
            })
            .collect();

        let sensors = if config.include_all_events {
            config
                .pets
                .iter()
                .filter(|pet| !pet.name.is_empty())
                .map(|pet| PetLastEventSensor {
                    meta: EntityMeta::new(
                        &device,
                        format!("{}_last_event", pet_entity_id(pet)),
                        &format!("{} last event", pet.name),
                    ),
                    pet_id: pet.id.clone(),
                    icon: pet_icon(pet.species),
                })
                .collect()
        } else {
            Vec::new()
        };

        let mode_switches = snapshot
            .modes
            .keys()
            .map(|mode| ModeSwitch {
                meta: EntityMeta::new(&device, format!("mode_{}", mode.to_lowercase()), mode),
                mode: mode.clone(),
            })
            .collect();

        let system_switch = SystemSwitch {
            meta: EntityMeta::new(&device, STATE_KEY_SYSTEM.into(), "System"),
        };
        let door_cover = DoorCover {
            meta: EntityMeta::new(&device, "door".into(), "Door"),
        };

        Self {
            device,
            trackers,
            sensors,
            mode_switches,
            system_switch,
            door_cover,
        }
    }
}
