//! `petwalk watch`: stream snapshot changes until interrupted.

use petwalk_core::{Controller, RefreshEvent};
use tokio::sync::broadcast::error::RecvError;

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::status::{self, StatusView};

pub async fn handle(
    controller: &Controller,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let mut snapshots = controller.subscribe();
    let mut events = controller.events();
    let mut seen = 0usize;
    let mut last = snapshots.latest();

    print_status(controller, global, color)?;

    loop {
        if args.count.is_some_and(|n| seen >= n) {
            return Ok(());
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok(()),
            snap = snapshots.changed() => {
                let Some(snap) = snap else { return Ok(()) };
                // Every cycle commits; only print when something changed.
                if last.as_deref() == Some(&*snap) {
                    continue;
                }
                last = Some(snap);
                seen += 1;
                print_status(controller, global, color)?;
            }
            event = events.recv() => match event {
                Ok(RefreshEvent::Failed { cause, .. }) if !global.quiet => {
                    eprintln!("refresh failed: {cause}");
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => return Ok(()),
            },
        }
    }
}

fn print_status(controller: &Controller, global: &GlobalOpts, color: bool) -> Result<(), CliError> {
    let view = StatusView::from_controller(controller)?;
    let out = output::render_single(
        &global.output,
        &view,
        |v| status::detail(v, color),
        |v| format!("door={} system={}", v.door, v.system),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
