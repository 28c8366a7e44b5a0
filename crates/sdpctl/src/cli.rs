//! Clap derive structures for the `sdpctl` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// sdpctl -- log in to SDP controllers and negotiate the client-API version
#[derive(Debug, Parser)]
#[command(
    name = "sdpctl",
    version,
    about = "Authenticate against SDP controllers and negotiate the API version",
    long_about = "Validates connection settings, establishes TLS trust, and logs in to an\n\
        SDP controller, reporting the negotiated appliance version.\n\n\
        Settings are read from the config file, then SDPCTL_* environment\n\
        variables, then command-line flags.",
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
    /// Path to the config file (default: platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Controller admin API URL, e.g. https://controller:8443/admin
    #[arg(long, short = 'u', global = true)]
    pub url: Option<String>,

    /// Username for password login
    #[arg(long, global = true)]
    pub username: Option<String>,

    /// Password for password login
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Pre-issued bearer token (base64), used instead of a password login
    #[arg(long, global = true)]
    pub bearer_token: Option<String>,

    /// Identity provider name
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Client-API version to request
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub client_version: Option<i64>,

    /// Accept any TLS certificate (ignored when --pem-file is set)
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// PEM file with the controller certificate(s) to trust
    #[arg(long, global = true)]
    pub pem_file: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Total login budget in seconds, retries included
    #[arg(long, global = true)]
    pub login_timeout: Option<u64>,

    /// Verbose transport logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// Pretty-printed JSON
    Json,
    /// Bare values, one per line (scripting)
    Plain,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check the connection settings without contacting the controller
    Validate(ValidateArgs),

    /// Log in and report the negotiated appliance version
    Login(LoginArgs),

    /// List the client-API versions this build supports
    Versions,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Require username and password even when a bearer token is set
    #[arg(long)]
    pub require_credentials: bool,
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Print the Authorization header value
    #[arg(long)]
    pub show_token: bool,
}
