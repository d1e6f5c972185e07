//! `petwalk pets`: configured pets with last event and presence.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::Tabled;

use petwalk_core::entity::{EntitySet, Presence};
use petwalk_core::{Controller, Direction};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct PetView {
    id: String,
    name: String,
    species: String,
    /// `None` for pets that get no tracker (unknown or unnamed).
    presence: Option<Presence>,
    last_direction: Option<Direction>,
    last_seen: Option<DateTime<Utc>>,
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct PetRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Species")]
    species: String,
    #[tabled(rename = "Presence")]
    presence: String,
    #[tabled(rename = "Last event")]
    last_event: String,
}

fn ago(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - at).num_seconds().max(0).unsigned_abs();
    format!(
        "{} ago",
        humantime::format_duration(std::time::Duration::from_secs(secs))
    )
}

impl PetRow {
    fn new(p: &PetView, now: DateTime<Utc>) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            species: p.species.clone(),
            presence: p.presence.map_or_else(String::new, |pr| pr.to_string()),
            last_event: match (p.last_direction, p.last_seen) {
                (Some(dir), Some(at)) => format!("{dir} {}", ago(at, now)),
                _ => "-".into(),
            },
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let snap = util::snapshot(controller)?;
    let config = controller.config();
    let entities = EntitySet::build(config, &snap);
    let now = Utc::now();

    let pets: Vec<PetView> = config
        .pets
        .iter()
        .map(|pet| {
            let event = snap.pet_event(&pet.id);
            PetView {
                id: pet.id.clone(),
                name: pet.name.clone(),
                species: pet.species_label().to_owned(),
                presence: entities
                    .trackers
                    .iter()
                    .find(|t| t.pet_id == pet.id)
                    .map(|t| t.presence(&snap, now)),
                last_direction: event.map(|e| e.direction),
                last_seen: event.map(|e| e.timestamp),
            }
        })
        .collect();

    if pets.is_empty() && !global.quiet {
        eprintln!("No pets configured. Add [[profiles.<name>.pets]] entries to the config file.");
        return Ok(());
    }

    let out = output::render_list(
        &global.output,
        &pets,
        |p| PetRow::new(p, now),
        |p| {
            format!(
                "{}={}",
                p.id,
                p.presence.map_or_else(|| "-".into(), |pr| pr.to_string())
            )
        },
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
