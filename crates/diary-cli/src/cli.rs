use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use diary_core::VERSION;

/// Diary - a private, template-based journal with optional encryption
#[derive(Parser)]
#[command(name = "diary")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the diary database
    #[arg(short, long, global = true, env = "DIARY_PATH")]
    pub diary: Option<String>,

    #[command(subcommand)]
    pub command: Commands,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose logging to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    None,
    Full,
}

impl From<ModeArg> for diary_core::EncryptionMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::None => diary_core::EncryptionMode::None,
            ModeArg::Full => diary_core::EncryptionMode::Full,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Jsonl,
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Path where the diary will be created
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Encryption mode (asked interactively when omitted)
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Origin the diary is served from (e.g. https://diary.example.org)
    #[arg(long)]
    pub origin: Option<String>,

    /// Disable interactive prompts
    #[arg(long)]
    pub no_input: bool,
}

/// Arguments for the `unlock` command
#[derive(Args)]
pub struct UnlockArgs {
    /// Unlock with the platform authenticator instead of the password
    #[arg(long)]
    pub biometric: bool,

    /// Disable interactive prompts
    #[arg(long)]
    pub no_input: bool,
}

/// Arguments for the `lock` command
#[derive(Args)]
pub struct LockArgs {
    /// Stop the volatile store for every diary (drops biometric caches too)
    #[arg(long)]
    pub all: bool,
}

/// Arguments for the `status` command
#[derive(Args)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `mode` command
#[derive(Args)]
pub struct ModeArgs {
    /// Target encryption mode
    #[arg(value_enum)]
    pub mode: ModeArg,

    /// Disable interactive prompts
    #[arg(long)]
    pub no_input: bool,
}

#[derive(Subcommand)]
pub enum PasswordCommand {
    /// Set the first password
    Set {
        #[arg(long)]
        no_input: bool,
    },
    /// Change the password and re-encrypt every entry
    Change {
        #[arg(long)]
        no_input: bool,
    },
}

#[derive(Subcommand)]
pub enum BiometricCommand {
    /// Register this device for biometric unlock
    Enable {
        #[arg(long)]
        no_input: bool,
    },
    /// Remove the biometric credential
    Disable,
    /// Show biometric availability and registration
    Status {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum TemplateCommand {
    /// List templates
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show a template's blocks
    Show {
        #[arg(value_name = "NAME")]
        name: String,
        #[arg(long)]
        json: bool,
    },
    /// Create a template
    Add {
        #[arg(value_name = "NAME")]
        name: String,
        /// Block spec TYPE:LABEL[:OPTIONS], e.g. multiselect:Activities:work,sport
        #[arg(long = "block", value_name = "SPEC", required = true)]
        blocks: Vec<String>,
    },
    /// Delete an unused template
    Delete {
        #[arg(value_name = "NAME")]
        name: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

/// Arguments for the `add` command
#[derive(Args)]
pub struct AddArgs {
    /// Template to write the entry with
    #[arg(value_name = "TEMPLATE")]
    pub template: String,

    /// Field value as LABEL=VALUE (repeatable)
    #[arg(long = "value", value_name = "LABEL=VALUE")]
    pub values: Vec<String>,

    /// Complete blocks as JSON (overrides --value)
    #[arg(long)]
    pub data: Option<String>,

    /// Set custom date/time (ISO-8601 or YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,

    /// Disable interactive prompts
    #[arg(long)]
    pub no_input: bool,
}

/// Arguments for the `list` command
#[derive(Args)]
pub struct ListArgs {
    /// Filter by template name
    #[arg(long)]
    pub template: Option<String>,

    /// Filter by tag (plaintext entries only)
    #[arg(long)]
    pub tag: Option<String>,

    /// Time window (e.g., "7d", "24h")
    #[arg(long)]
    pub last: Option<String>,

    /// Start date (ISO-8601)
    #[arg(long)]
    pub since: Option<String>,

    /// End date (ISO-8601)
    #[arg(long)]
    pub until: Option<String>,

    /// Limit number of results
    #[arg(long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `show` command
#[derive(Args)]
pub struct ShowArgs {
    /// Entry ID (full UUID or unique prefix)
    #[arg(value_name = "ID")]
    pub id: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `export` command
#[derive(Args)]
pub struct ExportArgs {
    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    pub format: ExportFormat,

    /// Write to a file instead of stdout
    #[arg(long, short)]
    pub output: Option<String>,

    /// Filter by template name
    #[arg(long)]
    pub template: Option<String>,

    /// Start date (ISO-8601)
    #[arg(long)]
    pub since: Option<String>,
}

/// Arguments for the `completions` command
#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_name = "SHELL")]
    pub shell: Shell,
}

/// Arguments for the internal volatile daemon command
#[derive(Args)]
pub struct InternalVolatileDaemonArgs {
    /// Seconds without requests before exiting
    #[arg(long)]
    pub idle: u64,
    #[arg(long)]
    pub socket: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new diary
    Init(InitArgs),

    /// Unlock an encrypted diary for this session
    Unlock(UnlockArgs),

    /// End the session
    Lock(LockArgs),

    /// Show encryption, session and biometric state
    Status(StatusArgs),

    /// Switch the encryption mode
    Mode(ModeArgs),

    /// Set or change the password
    #[command(subcommand)]
    Password(PasswordCommand),

    /// Manage biometric unlock
    #[command(subcommand)]
    Biometric(BiometricCommand),

    /// Manage templates
    #[command(subcommand)]
    Template(TemplateCommand),

    /// Write a new entry
    Add(AddArgs),

    /// List entries
    List(ListArgs),

    /// Show a specific entry
    Show(ShowArgs),

    /// Export entries with decrypted content
    Export(ExportArgs),

    /// Run diagnostics
    Doctor,

    /// Generate shell completions
    Completions(CompletionsArgs),

    /// Internal volatile store daemon (not user-facing)
    #[command(hide = true, name = "internal-volatile-daemon")]
    InternalVolatileDaemon(InternalVolatileDaemonArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_with_values() {
        let cli = Cli::try_parse_from([
            "diary",
            "add",
            "Journal",
            "--value",
            "Notes=Dear diary",
            "--value",
            "Activities=work",
        ])
        .unwrap();
        match cli.command {
            Commands::Add(args) => {
                assert_eq!(args.template, "Journal");
                assert_eq!(args.values.len(), 2);
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn test_mode_rejects_unknown_value() {
        assert!(Cli::try_parse_from(["diary", "mode", "history"]).is_err());
    }
}
