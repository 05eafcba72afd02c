//! Configuration CLI commands.

use std::path::Path;

use clap::Subcommand;
use inode_refcache::config::ConfigFile;

use crate::error::CliError;

/// Config action subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as INI
    Show,
    /// Print the path the config file is read from
    Path,
    /// Write the effective configuration to the config file
    Init,
}

/// Run a config subcommand.
pub fn run(action: ConfigAction, config: &ConfigFile, path: Option<&Path>) -> Result<(), CliError> {
    match action {
        ConfigAction::Show => {
            print!("{}", config.to_ini_string()?);
            Ok(())
        }
        ConfigAction::Path => {
            match path {
                Some(path) => println!("{}", path.display()),
                None => println!("(no config directory available)"),
            }
            Ok(())
        }
        ConfigAction::Init => {
            let path = path.ok_or_else(|| {
                CliError::InvalidArgument(
                    "No config path available; pass --config PATH".to_string(),
                )
            })?;
            config.save(path)?;
            println!("Wrote configuration to {}", path.display());
            Ok(())
        }
    }
}
