use anyhow::Result;
use clap::{Parser, Subcommand};

use minebot_cli::commands::{config_cmd, run, simulate};
use minebot_cli::{config, logging};

/// MineBot - chat-driven mining game
#[derive(Parser)]
#[command(name = "minebot")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose mode (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file path
    #[arg(short, long, global = true, env = "MINEBOT_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the chat bot on stdin/stdout
    Run(run::RunArgs),

    /// Project earnings offline, tick by tick
    Simulate(simulate::SimulateArgs),

    /// Configuration management
    Config(config_cmd::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose);

    // Load config if specified
    if let Some(config_path) = &cli.config {
        config::set_config_path(config_path);
    }

    // Execute command
    match cli.command {
        Commands::Run(args) => run::execute(args).await?,
        Commands::Simulate(args) => simulate::execute(args).await?,
        Commands::Config(args) => config_cmd::execute(args).await?,
    }

    Ok(())
}
