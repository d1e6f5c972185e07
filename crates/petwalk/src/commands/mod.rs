//! Command dispatch: bridges CLI args -> core Commands -> output formatting.

pub mod config_cmd;
pub mod door;
pub mod entities;
pub mod modes;
pub mod pets;
pub mod status;
pub mod system;
pub mod util;
pub mod watch;

use petwalk_core::Controller;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a door-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(controller, global),
        Command::Watch(args) => watch::handle(controller, args, global).await,
        Command::Modes(args) => modes::handle(controller, args, global).await,
        Command::Door(args) => door::handle(controller, args, global).await,
        Command::System(args) => system::handle(controller, args, global).await,
        Command::Pets => pets::handle(controller, global),
        Command::Entities => entities::handle(controller, global),
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal {
            message: "command does not need a door connection".into(),
        }),
    }
}
