use crate::config::CliConfig;
use arkgen_core::{ArkgenError, Result};
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write the effective settings to the config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective settings
    Show,
}

pub fn handle_config_command(cmd: ConfigCommands, config: &CliConfig, path: &Path) -> Result<()> {
    match cmd {
        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                return Err(ArkgenError::config(format!(
                    "{} already exists; pass --force to overwrite",
                    path.display()
                )));
            }
            config.save(path)?;
            println!("Wrote {}", path.display());
        }

        ConfigCommands::Show => {
            println!("Config file: {}", path.display());
            println!("{}", serde_json::to_string_pretty(config)?);
        }
    }

    Ok(())
}
