//! `petwalk system on|off`.

use petwalk_core::Controller;

use crate::cli::{GlobalOpts, SystemArgs, SystemCommand};
use crate::error::CliError;

use super::util;

pub async fn handle(
    controller: &Controller,
    args: SystemArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let on = matches!(args.command, SystemCommand::On);
    if !on
        && !util::confirm(
            "Turn the access system off? Pets will not be able to use the door.",
            "system off",
            global.yes,
        )?
    {
        return Ok(());
    }

    let result = controller.set_system_state(on).await?;
    util::report(
        &result,
        if on { "System turned on" } else { "System turned off" },
        global,
    );
    Ok(())
}
