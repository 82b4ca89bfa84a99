use std::path::PathBuf;
use std::time::Duration;

use crate::cli::InternalVolatileDaemonArgs;
use crate::volatile::run_volatile_daemon;

pub fn handle_internal_volatile_daemon(args: &InternalVolatileDaemonArgs) -> anyhow::Result<()> {
    run_volatile_daemon(Duration::from_secs(args.idle), &PathBuf::from(&args.socket))
}
