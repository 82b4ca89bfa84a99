use tracing::debug;

use crate::app::AppContext;
use crate::cli::LockArgs;
use crate::ui::{badge, print, Badge, OutputMode};
use crate::volatile::{shutdown_daemon, socket_path};

pub fn handle_lock(ctx: &AppContext, args: &LockArgs) -> anyhow::Result<()> {
    let stopped = if args.all {
        shutdown_daemon(&socket_path()?)?
    } else {
        let vault = ctx.open_vault()?;
        vault.lock()?;
        false
    };
    debug!(all = args.all, stopped, "lock");

    if ctx.quiet() {
        return Ok(());
    }
    let ui_ctx = ctx.ui(false);
    let message = if args.all {
        "All sessions and biometric caches cleared."
    } else {
        "Diary locked."
    };
    match ui_ctx.mode {
        OutputMode::Pretty => print(&ui_ctx, &badge(&ui_ctx, Badge::Ok, message)),
        OutputMode::Plain | OutputMode::Json => println!("status=ok"),
    }
    Ok(())
}
