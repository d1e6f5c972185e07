//! `petwalk status`: modes, door and system state.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use petwalk_core::{Controller, DoorState, ModeSet, SystemState};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
pub struct StatusView {
    pub device: String,
    pub door: DoorState,
    pub system: SystemState,
    pub modes: ModeSet,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl StatusView {
    pub fn from_controller(controller: &Controller) -> Result<Self, CliError> {
        let snap = util::snapshot(controller)?;
        Ok(Self {
            device: controller.device_info().name,
            door: snap.states.door,
            system: snap.states.system,
            modes: snap.modes.clone(),
            refreshed_at: controller.store().last_refresh(),
        })
    }
}

/// Multi-line human view used by `status` and `watch`.
pub fn detail(view: &StatusView, color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", view.device);
    let _ = writeln!(out, "  door:   {}", output::door_label(view.door, color));
    let _ = writeln!(out, "  system: {}", output::system_label(view.system, color));
    if !view.modes.is_empty() {
        let _ = writeln!(out, "  modes:");
        let width = view.modes.keys().map(String::len).max().unwrap_or(0);
        for (name, on) in &view.modes {
            let _ = writeln!(out, "    {name:<width$}  {}", output::flag_label(*on, color));
        }
    }
    if let Some(at) = view.refreshed_at {
        let _ = write!(out, "  updated: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    out.trim_end().to_owned()
}

pub fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let view = StatusView::from_controller(controller)?;
    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &view,
        |v| detail(v, color),
        |v| format!("door={} system={}", v.door, v.system),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
