//! inode-refcache CLI - operator harness for the inode reference cache.
//!
//! Loads configuration, installs logging, and runs one subcommand.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use inode_refcache::config::ConfigFile;
use inode_refcache::logging::init_logging;
use tracing::debug;

use commands::config::ConfigAction;
use commands::soak::SoakArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "inode-refcache", version, about)]
struct Cli {
    /// Config file (defaults to <config dir>/inode-refcache/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless a log environment variable is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Inspect or initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Hammer the cache with concurrent open/release/unlink traffic and verify the accounting
    Soak(SoakArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = match &cli.config {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    let config_path = cli.config.or_else(ConfigFile::default_path);
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }

    // Held until exit so buffered file output is flushed.
    let _log_guard = init_logging(&config.logging)?;
    debug!(config = ?config_path, "Configuration loaded");

    match cli.command {
        Command::Config { action } => commands::config::run(action, &config, config_path.as_deref()),
        Command::Soak(args) => commands::soak::run(args, &config.cache),
    }
}
