//! Mode command handlers.

use serde::Serialize;
use tabled::Tabled;

use petwalk_core::Controller;

use crate::cli::{GlobalOpts, ModesArgs, ModesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct ModeEntry {
    name: String,
    enabled: bool,
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ModeRow {
    #[tabled(rename = "Mode")]
    name: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: ModesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ModesCommand::List => {
            let snap = util::snapshot(controller)?;
            let entries: Vec<ModeEntry> = snap
                .modes
                .iter()
                .map(|(name, enabled)| ModeEntry {
                    name: name.clone(),
                    enabled: *enabled,
                })
                .collect();
            let color = output::should_color(&global.color);
            let out = output::render_list(
                &global.output,
                &entries,
                |m| ModeRow {
                    name: m.name.clone(),
                    enabled: output::flag_label(m.enabled, color),
                },
                |m| format!("{}={}", m.name, m.enabled),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ModesCommand::Set { name, value } => {
            let snap = util::snapshot(controller)?;
            if !snap.modes.contains_key(&name) {
                return Err(CliError::Validation {
                    field: "mode".into(),
                    reason: format!(
                        "door does not report a mode named '{name}' (known: {})",
                        snap.modes.keys().cloned().collect::<Vec<_>>().join(", ")
                    ),
                });
            }
            let result = controller.set_mode(name.clone(), value.is_on()).await?;
            util::report(
                &result,
                &format!("Mode {name} {}", if value.is_on() { "enabled" } else { "disabled" }),
                global,
            );
            Ok(())
        }
    }
}
