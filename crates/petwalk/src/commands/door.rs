//! `petwalk door open|close`.

use petwalk_core::Controller;

use crate::cli::{DoorArgs, DoorCommand, GlobalOpts};
use crate::error::CliError;

use super::util;

pub async fn handle(
    controller: &Controller,
    args: DoorArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let open = matches!(args.command, DoorCommand::Open);
    let result = controller.set_door_state(open).await?;
    util::report(
        &result,
        if open { "Door opened" } else { "Door closed" },
        global,
    );
    Ok(())
}
