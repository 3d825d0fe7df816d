//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use zoomzone_core::TracingOutputFormat;

/// zoomzone - book video meetings against a shared calendar
#[derive(Debug, Parser)]
#[command(name = "zoomzone")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "ZOOMZONE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to the server socket
    #[arg(long, env = "ZOOMZONE_SOCKET", global = true)]
    pub socket_path: Option<PathBuf>,

    /// Connection timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Log format: pretty, compact or json
    #[arg(long, env = "ZOOMZONE_LOG_FORMAT", global = true)]
    pub log_format: Option<TracingOutputFormat>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List slots for a day with their busy flags
    Slots {
        /// Local date, YYYY-MM-DD
        #[arg(long)]
        date: String,

        /// Meeting length in minutes (defaults to the configured duration)
        #[arg(long)]
        duration: Option<i64>,
    },

    /// Book a meeting
    Book {
        /// Participant name
        #[arg(long)]
        name: String,

        /// Participant email
        #[arg(long)]
        email: String,

        /// Local date, YYYY-MM-DD
        #[arg(long)]
        date: String,

        /// Local start time, HH:MM
        #[arg(long)]
        time: String,

        /// Meeting length in minutes (defaults to the configured duration)
        #[arg(long)]
        duration: Option<i64>,
    },

    /// Send due reminders now
    Sweep,

    /// Show daemon status
    Status,

    /// Start the server daemon in the foreground
    Server,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Manage stored provider tokens
    Credentials {
        #[command(subcommand)]
        action: CredentialsAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}

/// Credential store actions.
#[derive(Debug, Subcommand)]
pub enum CredentialsAction {
    /// Store tokens obtained from a provider's consent flow
    Set {
        /// Provider id: google or zoom
        #[arg(value_parser = ["google", "zoom"])]
        provider: String,

        /// Access token (supports env:: and pass:: references)
        #[arg(long)]
        access_token: String,

        /// Refresh token (supports env:: and pass:: references)
        #[arg(long)]
        refresh_token: Option<String>,

        /// Access token lifetime in seconds
        #[arg(long)]
        expires_in: Option<i64>,
    },

    /// List stored credentials without their tokens
    Show,
}
