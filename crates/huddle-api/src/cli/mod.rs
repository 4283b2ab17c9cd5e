//! CLI command definitions and dispatch for the `huddle` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod classify;
pub mod sweep;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Group coordination assistant for WhatsApp.
#[derive(Parser)]
#[command(name = "huddle", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// Directory holding `config.toml` and the default database.
    #[arg(long, env = "HUDDLE_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the webhook server and the expiry sweeper.
    Serve {
        /// Port to listen on (overrides config and PORT).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to.
        #[arg(long)]
        host: Option<String>,
    },

    /// Run one expiry and purge sweep, then exit.
    Sweep,

    /// Create the database if needed and apply pending migrations.
    Migrate,

    /// Show how a message would be classified.
    Classify {
        /// Message text.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
}
