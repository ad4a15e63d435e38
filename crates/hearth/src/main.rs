//! Hearth - inspect and edit embedded session stores
//!
//! Main entry point for the Hearth CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{clear, delete, get, keys, set};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Hearth - inspect and edit embedded session stores
#[derive(Parser)]
#[command(name = "hearth")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Extra config file, loaded after the user and project configs
    #[arg(long, global = true, env = "HEARTH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Named store section to use
    #[arg(long, global = true, default_value = hearth_config::DEFAULT_STORE)]
    pub store: String,

    /// Store file, overriding the configured `file` setting
    #[arg(long, global = true)]
    pub file: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the session stored at a key
    Get(get::GetArgs),

    /// Store a JSON object at a key
    Set(set::SetArgs),

    /// Delete the session at a key
    Delete(delete::DeleteArgs),

    /// Delete every session whose key starts with a prefix
    Clear(clear::ClearArgs),

    /// List live keys
    Keys(keys::KeysArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console (human-readable, stderr) + rotating JSON file
    let filter = if cli.verbose {
        "hearth=debug,hearth_session=debug,hearth_config=debug,info"
    } else {
        "hearth=info,hearth_session=warn,hearth_config=warn,warn"
    };

    let log_dir = hearth_config::user_config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "hearth.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "hearth=trace,hearth_session=trace,hearth_config=debug,info",
                )),
        )
        .init();

    let ctx = commands::Context {
        json_output: cli.json,
        verbose: cli.verbose,
        config: cli.config,
        store: cli.store,
        file: cli.file,
    };

    match cli.command {
        Commands::Get(args) => get::run(args, &ctx),
        Commands::Set(args) => set::run(args, &ctx),
        Commands::Delete(args) => delete::run(args, &ctx),
        Commands::Clear(args) => clear::run(args, &ctx),
        Commands::Keys(args) => keys::run(args, &ctx),
    }
}
