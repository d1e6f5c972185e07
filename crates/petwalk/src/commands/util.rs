//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::sync::Arc;

use petwalk_core::{CommandResult, Controller, Snapshot};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// The controller's current snapshot. Always present after `initialize()`.
pub fn snapshot(controller: &Controller) -> Result<Arc<Snapshot>, CliError> {
    controller.read().ok_or_else(|| CliError::Internal {
        message: "no snapshot available from door".into(),
    })
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Report the outcome of a write on stderr.
pub fn report(result: &CommandResult, done: &str, global: &GlobalOpts) {
    if global.quiet {
        return;
    }
    match result {
        CommandResult::Reconciled(_) => eprintln!("{done}"),
        CommandResult::Pending => {
            eprintln!("{done} (not yet confirmed by the door; check again with `petwalk status`)");
        }
    }
}
