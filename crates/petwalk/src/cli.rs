//! Clap derive structures for the `petwalk` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// petwalk -- control a PetWALK pet door on the local network
#[derive(Debug, Parser)]
#[command(
    name = "petwalk",
    version,
    about = "Control a PetWALK pet door from the command line",
    long_about = "Reads modes, door/system state and pet presence from a PetWALK door\n\
        over its local REST API, and opens/closes the door or toggles modes.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Door profile to use
    #[arg(long, short = 'p', env = "PETWALK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Door IP address or hostname (overrides profile)
    #[arg(long, env = "PETWALK_HOST", global = true)]
    pub host: Option<String>,

    /// Door REST port (overrides profile)
    #[arg(long, env = "PETWALK_PORT", global = true)]
    pub port: Option<u16>,

    /// Basic-auth username (overrides profile)
    #[arg(long, short = 'u', env = "PETWALK_USERNAME", global = true)]
    pub username: Option<String>,

    /// Basic-auth password
    #[arg(long, env = "PETWALK_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "PETWALK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "PETWALK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

/// On/off switch value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    #[value(alias = "true", alias = "1", alias = "enable")]
    On,
    #[value(alias = "false", alias = "0", alias = "disable")]
    Off,
}

impl Toggle {
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show modes, door and system state
    #[command(alias = "st")]
    Status,

    /// Poll the door and print each change
    Watch(WatchArgs),

    /// List or change door modes
    #[command(alias = "m")]
    Modes(ModesArgs),

    /// Open or close the door
    Door(DoorArgs),

    /// Turn the access system on or off
    #[command(alias = "sys")]
    System(SystemArgs),

    /// Show configured pets and their presence
    Pets,

    /// List the entities a host integration would expose
    Entities,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Poll interval in seconds (defaults to the profile's interval)
    #[arg(long, short = 'i', value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// Exit after this many changes
    #[arg(long, short = 'n')]
    pub count: Option<usize>,
}

// ── Modes ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ModesArgs {
    #[command(subcommand)]
    pub command: ModesCommand,
}

#[derive(Debug, Subcommand)]
pub enum ModesCommand {
    /// List all modes and whether they are enabled
    #[command(alias = "ls")]
    List,

    /// Enable or disable one mode
    Set {
        /// Mode name as reported by the door (e.g. motion_in)
        name: String,

        /// New value
        value: Toggle,
    },
}

// ── Door / System ────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DoorArgs {
    #[command(subcommand)]
    pub command: DoorCommand,
}

#[derive(Debug, Subcommand)]
pub enum DoorCommand {
    /// Open the door
    Open,
    /// Close the door
    Close,
}

#[derive(Debug, Args)]
pub struct SystemArgs {
    #[command(subcommand)]
    pub command: SystemCommand,
}

#[derive(Debug, Subcommand)]
pub enum SystemCommand {
    /// Enable the access system
    On,
    /// Disable the access system
    Off,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration (passwords masked)
    Show,

    /// Print the config file path
    Path,

    /// Check that the active profile can reach the door
    Test,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a password in the system keyring
    SetPassword {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
