//! `petwalk entities`: the entity set a host integration would register.

use chrono::Utc;
use serde::Serialize;
use tabled::Tabled;

use petwalk_core::Controller;
use petwalk_core::entity::EntitySet;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct EntityView {
    kind: &'static str,
    entity_id: String,
    name: String,
    unique_id: String,
    state: String,
}

#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Entity")]
    entity_id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
}

fn on_off(on: bool) -> String {
    if on { "on".into() } else { "off".into() }
}

pub fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let snap = util::snapshot(controller)?;
    let set = EntitySet::build(controller.config(), &snap);
    let now = Utc::now();

    // Structured formats get the full set, including device info.
    if matches!(global.output, OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml)
    {
        let out = output::render_single(&global.output, &set, |_| String::new(), |_| String::new());
        output::print_output(&out, global.quiet);
        return Ok(());
    }

    let mut views = Vec::new();
    for t in &set.trackers {
        views.push(EntityView {
            kind: "device_tracker",
            entity_id: t.meta.entity_id.clone(),
            name: t.meta.name.clone(),
            unique_id: t.meta.unique_id.clone(),
            state: t.presence(&snap, now).to_string(),
        });
    }
    for s in &set.sensors {
        views.push(EntityView {
            kind: "sensor",
            entity_id: s.meta.entity_id.clone(),
            name: s.meta.name.clone(),
            unique_id: s.meta.unique_id.clone(),
            state: s
                .value(&snap)
                .map_or_else(|| "unknown".into(), |at| at.to_rfc3339()),
        });
    }
    for m in &set.mode_switches {
        views.push(EntityView {
            kind: "switch",
            entity_id: m.meta.entity_id.clone(),
            name: m.meta.name.clone(),
            unique_id: m.meta.unique_id.clone(),
            state: m.is_on(&snap).map_or_else(|| "unknown".into(), on_off),
        });
    }
    views.push(EntityView {
        kind: "switch",
        entity_id: set.system_switch.meta.entity_id.clone(),
        name: set.system_switch.meta.name.clone(),
        unique_id: set.system_switch.meta.unique_id.clone(),
        state: on_off(set.system_switch.is_on(&snap)),
    });
    views.push(EntityView {
        kind: "cover",
        entity_id: set.door_cover.meta.entity_id.clone(),
        name: set.door_cover.meta.name.clone(),
        unique_id: set.door_cover.meta.unique_id.clone(),
        state: if set.door_cover.is_open(&snap) {
            "open".into()
        } else {
            "closed".into()
        },
    });

    let out = output::render_list(
        &global.output,
        &views,
        |v| EntityRow {
            kind: v.kind,
            entity_id: v.entity_id.clone(),
            name: v.name.clone(),
            state: v.state.clone(),
        },
        |v| v.unique_id.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
