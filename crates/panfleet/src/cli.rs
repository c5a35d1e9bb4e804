//! Clap derive structures for the `panfleet` CLI.
//!
//! Defines the complete command tree, global flags, and shared enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// panfleet -- manage a firewall fleet through its central manager
#[derive(Debug, Parser)]
#[command(
    name = "panfleet",
    version,
    about = "Manage a firewall fleet through its central manager",
    long_about = "Authenticate against the fleet manager's XML API, run\n\
        operational and test commands, inspect sync state, and detect\n\
        configuration drift between templates and running devices.",
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
    /// Manager profile to use
    #[arg(long, short = 'p', env = "PANFLEET_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Manager hostname or URL (overrides profile)
    #[arg(long, short = 'm', env = "PANFLEET_MANAGER", global = true)]
    pub manager: Option<String>,

    /// Username for authentication (overrides profile)
    #[arg(long, short = 'u', env = "PANFLEET_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "PANFLEET_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Accept an untrusted manager certificate, for this invocation only
    /// (never saved to a profile)
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Per-call request timeout in seconds
    #[arg(long, env = "PANFLEET_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Maximum concurrent device operations
    #[arg(long, env = "PANFLEET_CONCURRENCY", global = true)]
    pub concurrency: Option<usize>,

    /// Aggregate deadline for fleet-wide operations, in seconds
    #[arg(long, env = "PANFLEET_DEADLINE", global = true)]
    pub deadline: Option<u64>,

    /// Store credentials in this file instead of the OS keyring
    #[arg(long, env = "PANFLEET_CREDENTIALS_FILE", global = true)]
    pub credentials_file: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Authenticate and store the issued API key
    Login(LoginArgs),

    /// Revoke the API key (best effort) and forget it locally
    Logout,

    /// List the fleet's devices
    #[command(alias = "dev")]
    Devices(DevicesArgs),

    /// List device groups with shared-policy sync state
    #[command(alias = "dg")]
    DeviceGroups,

    /// List templates with per-device sync state
    #[command(alias = "tpl")]
    Templates,

    /// Run an operational or show command on a device or the whole fleet
    Run(RunArgs),

    /// Run a test command (active probe) on a device
    Test(TestArgs),

    /// Show system information for one device
    Sysinfo(SysinfoArgs),

    /// Detect configuration drift between templates and running devices
    Drift(DriftArgs),

    /// Push configuration to devices (commit-all)
    Push(PushArgs),
}

// ── Per-command arguments ────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Also store the password for unattended re-authentication
    #[arg(long)]
    pub save_password: bool,
}

#[derive(Debug, Args)]
pub struct DevicesArgs {
    /// Only devices currently connected to the manager
    #[arg(long)]
    pub connected: bool,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Target device serial
    #[arg(
        long,
        short = 's',
        value_name = "SERIAL",
        required_unless_present = "all",
        conflicts_with = "all"
    )]
    pub serial: Option<String>,

    /// Run on every connected device instead of one serial
    #[arg(long)]
    pub all: bool,

    /// CLI command (`show ...`) or op XML (`<show>...</show>`)
    #[arg(value_name = "COMMAND", required = true, num_args = 1.., trailing_var_arg = true)]
    pub command: Vec<String>,
}

#[derive(Debug, Args)]
pub struct TestArgs {
    /// Target device serial
    #[arg(value_name = "SERIAL")]
    pub serial: String,

    /// Test command, e.g. `test vpn ike-sa gateway branch-gw`
    #[arg(value_name = "COMMAND", required = true, num_args = 1.., trailing_var_arg = true)]
    pub command: Vec<String>,
}

#[derive(Debug, Args)]
pub struct SysinfoArgs {
    /// Target device serial
    #[arg(value_name = "SERIAL")]
    pub serial: String,
}

#[derive(Debug, Args)]
pub struct DriftArgs {
    /// Check a single device instead of the whole fleet
    #[arg(long, short = 's')]
    pub serial: Option<String>,

    /// Only sweep devices currently connected to the manager
    #[arg(long)]
    pub connected: bool,
}

#[derive(Debug, Args)]
pub struct PushArgs {
    #[command(subcommand)]
    pub target: PushTarget,
}

#[derive(Debug, Subcommand)]
pub enum PushTarget {
    /// Push a template stack to its devices
    Template {
        /// Template name (without the `_stack` suffix)
        name: String,
    },
    /// Push a device group's shared policy
    DeviceGroup {
        /// Device group name
        name: String,
    },
}
