//! Clap derive structures for the `moultrie` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// moultrie -- command-line access to Moultrie Mobile trail cameras
#[derive(Debug, Parser)]
#[command(
    name = "moultrie",
    version,
    about = "Manage Moultrie Mobile trail cameras from the command line",
    long_about = "Sign in to Moultrie Mobile, keep tokens on disk, and inspect or\n\
        control cellular trail cameras: device status, settings, and\n\
        on-demand photo or video captures.",
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
    /// Account profile to use
    #[arg(long, short = 'p', env = "MOULTRIE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "MOULTRIE_OUTPUT",
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

    /// Request timeout in seconds
    #[arg(long, env = "MOULTRIE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Directory holding .token, .refresh and .token_json
    #[arg(long, env = "MOULTRIE_TOKEN_DIR", global = true)]
    pub token_dir: Option<PathBuf>,

    /// Send identity and API traffic to this base URL instead
    #[arg(long, env = "MOULTRIE_BASE_URL", global = true, hide = true)]
    pub base_url: Option<String>,
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

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in (or redeem a refresh token) and write token files
    Auth(AuthArgs),

    /// List and inspect cameras
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Show and change camera settings
    #[command(alias = "set")]
    Settings(SettingsArgs),

    /// Request an on-demand photo or video
    Capture(CaptureArgs),

    /// Check for unread notifications
    Notifications,

    /// Poll continuously, logging device changes and saving rotated tokens
    Watch(WatchArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Auth ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AuthArgs {
    /// Redeem a refresh token instead of signing in. Without a value the
    /// saved .refresh file is used.
    #[arg(long, num_args = 0..=1, value_name = "TOKEN")]
    pub refresh: Option<Option<String>>,

    /// Account email
    #[arg(long, env = "MOULTRIE_EMAIL")]
    pub email: Option<String>,

    /// Account password
    #[arg(long, env = "MOULTRIE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Where to write the token files (default: the token directory)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List cameras on the account
    #[command(alias = "ls")]
    List,

    /// Show one camera
    Get {
        /// Device ID
        device: i64,
    },
}

// ── Settings ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Show a camera's settings
    Show {
        /// Device ID
        device: i64,
    },

    /// Change one setting
    Set {
        /// Device ID
        device: i64,

        /// Setting short code (e.g. CTD, CFF)
        code: String,

        /// Option text, raw value, or on/off for switches
        value: String,
    },
}

// ── Capture ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CaptureArgs {
    /// Device ID
    pub device: i64,

    /// Request a video instead of a photo
    #[arg(long)]
    pub video: bool,
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Poll period in seconds (overrides the profile)
    #[arg(long)]
    pub interval: Option<u64>,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
