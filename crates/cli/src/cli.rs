//! Command-line definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use epicrm_observability::LogFormat;

/// epicrm - role-based records manager, authentication commands.
#[derive(Parser, Debug)]
#[command(name = "epicrm", version, long_about = None, propagate_version = true)]
pub struct Cli {
    /// Directory holding the session files and the revocation ledger
    /// [default: ~/.epicrm]
    #[arg(long, env = "EPICRM_HOME", global = true)]
    pub home: Option<PathBuf>,

    /// JSON user directory [default: <home>/users.json]
    #[arg(long, env = "EPICRM_USERS", global = true)]
    pub users: Option<PathBuf>,

    /// JSON role-rule document [default: built-in table]
    #[arg(long, env = "EPICRM_ROLE_RULES", global = true)]
    pub role_rules: Option<PathBuf>,

    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", env = "EPICRM_LOG_LEVEL", global = true)]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, default_value = "text", env = "EPICRM_LOG_FORMAT", global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Log in and store a fresh token pair
    Login(LoginArgs),

    /// Revoke the stored tokens and forget them
    Logout,

    /// Exchange the stored refresh token for a new pair
    Refresh,

    /// Show the logged-in user and roles
    Whoami(WhoamiArgs),

    /// Ask whether the logged-in user may perform an operation
    Check(CheckArgs),

    /// Hash a password read from stdin (for seeding the user directory)
    #[command(name = "hash-password")]
    HashPassword,
}

#[derive(Args, Debug, Clone, Default)]
pub struct LoginArgs {
    /// Username (prompted when omitted)
    #[arg(short, long)]
    pub username: Option<String>,

    /// Read the password from the first line of stdin without prompting
    #[arg(long)]
    pub password_stdin: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct WhoamiArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Resource name, e.g. client, contract, event, user
    pub resource: String,

    /// Operation, e.g. READ, UPDATE, DELETE_OWN
    pub operation: String,

    /// Id of the record's owner
    #[arg(long)]
    pub owner: Option<u64>,

    /// Id of the user record acted upon
    #[arg(long)]
    pub target: Option<u64>,

    /// Only honor ownership-scoped grants
    #[arg(long)]
    pub own_only: bool,
}
