//! Diary CLI - a private, template-based journal with optional encryption
//!
//! Command-line front end over `diary-core`: creates diaries, writes and
//! reads entries, and drives unlock, encryption modes and biometric unlock.

mod app;
mod authenticator;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod helpers;
mod ui;
mod volatile;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::app::AppContext;
use crate::cli::{BiometricCommand, Cli, Commands, PasswordCommand, TemplateCommand};
use crate::commands::{entries, init, maintenance, misc, security, templates};
use crate::errors::CliError;
use crate::ui::print_error;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let ctx = AppContext::new(&cli);

    if let Err(e) = run(&ctx, &cli) {
        if let Some(cli_err) = CliError::classify(&e) {
            cli_err.exit();
        }
        let ui_ctx = ctx.ui(false);
        print_error(&ui_ctx, &format!("{:#}", e), None);
        std::process::exit(1);
    }
}

fn run(ctx: &AppContext, cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Init(args) => init::handle_init(ctx, args),
        Commands::Unlock(args) => security::handle_unlock(ctx, args),
        Commands::Lock(args) => security::handle_lock(ctx, args),
        Commands::Status(args) => security::handle_status(ctx, args),
        Commands::Mode(args) => security::handle_mode(ctx, args),
        Commands::Password(command) => match command {
            PasswordCommand::Set { no_input } => security::handle_password_set(ctx, *no_input),
            PasswordCommand::Change { no_input } => {
                security::handle_password_change(ctx, *no_input)
            }
        },
        Commands::Biometric(command) => match command {
            BiometricCommand::Enable { no_input } => {
                security::handle_biometric_enable(ctx, *no_input)
            }
            BiometricCommand::Disable => security::handle_biometric_disable(ctx),
            BiometricCommand::Status { json } => security::handle_biometric_status(ctx, *json),
        },
        Commands::Template(command) => match command {
            TemplateCommand::List { json } => templates::handle_list(ctx, *json),
            TemplateCommand::Show { name, json } => templates::handle_show(ctx, name, *json),
            TemplateCommand::Add { name, blocks } => templates::handle_add(ctx, name, blocks),
            TemplateCommand::Delete { name, yes } => templates::handle_delete(ctx, name, *yes),
        },
        Commands::Add(args) => entries::handle_add(ctx, args),
        Commands::List(args) => entries::handle_list(ctx, args),
        Commands::Show(args) => entries::handle_show(ctx, args),
        Commands::Export(args) => entries::handle_export(ctx, args),
        Commands::Doctor => maintenance::handle_doctor(ctx),
        Commands::Completions(args) => misc::handle_completions(args),
        Commands::InternalVolatileDaemon(args) => {
            maintenance::handle_internal_volatile_daemon(args)
        }
    }
}
