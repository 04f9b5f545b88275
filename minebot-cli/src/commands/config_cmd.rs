use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::*;

use crate::config::{get_config_path, load_config, save_config, BotConfig};

/// Configuration management
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show {
        /// Output in JSON format
        #[arg(short, long)]
        json: bool,
    },

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the configuration file path
    Path,
}

pub async fn execute(args: ConfigArgs) -> Result<()> {
    match args.action {
        ConfigAction::Show { json } => {
            let config = load_config()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
        ConfigAction::Init { force } => {
            let path = get_config_path();
            if path.exists() && !force {
                println!(
                    "{} {} already exists (use --force to overwrite)",
                    "⚠".yellow(),
                    path.display()
                );
                return Ok(());
            }

            save_config(&BotConfig::default())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{} Wrote default configuration to {}", "✓".green(), path.display());
        }
        ConfigAction::Path => println!("{}", get_config_path().display()),
    }

    Ok(())
}
