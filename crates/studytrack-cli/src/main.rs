//! StudyTrack CLI - Command-line interface for StudyTrack
//!
//! Provides commands for:
//! - Running a full sync or a remote refresh
//! - Viewing local data and sync status
//! - Editing assignments, courses and study sessions offline
//! - Running the periodic sync loop in the foreground

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use studytrack_core::config::Config;

mod commands;
mod context;
mod output;

use commands::{
    assignments::AssignmentsCommand, courses::CoursesCommand, daemon::DaemonCommand,
    refresh::RefreshCommand, sessions::SessionsCommand, status::StatusCommand, sync::SyncCommand,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "studytrack", version, about = "Offline-first academic tracker")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Push local changes and pull the server state
    Sync(SyncCommand),
    /// Replace local data with the server snapshot
    Refresh(RefreshCommand),
    /// Show local data and sync status
    Status(StatusCommand),
    /// Manage assignments
    #[command(subcommand)]
    Assignments(AssignmentsCommand),
    /// Manage courses
    #[command(subcommand)]
    Courses(CoursesCommand),
    /// Record study sessions
    #[command(subcommand)]
    Sessions(SessionsCommand),
    /// Run periodic background sync until interrupted
    Daemon(DaemonCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&config_path);

    // RUST_LOG wins, then -v, then the configured level
    let filter = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    for problem in config.validate() {
        warn!(config_path = %config_path.display(), %problem, "Invalid configuration value");
    }

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match cli.command {
        Commands::Sync(cmd) => cmd.execute(&config, format).await,
        Commands::Refresh(cmd) => cmd.execute(&config, format).await,
        Commands::Status(cmd) => cmd.execute(&config, format).await,
        Commands::Assignments(cmd) => cmd.execute(&config, format).await,
        Commands::Courses(cmd) => cmd.execute(&config, format).await,
        Commands::Sessions(cmd) => cmd.execute(&config, format).await,
        Commands::Daemon(cmd) => cmd.execute(&config, format).await,
    }
}
