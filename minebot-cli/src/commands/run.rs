use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use tokio::io::BufReader;
use std::future::Future;
use std::io;
use tracing::{info, warn};

use minebot_core::{AccrualEngine, AccrualMode, MiningService};

use crate::bot::ChatBot;
use crate::config::{load_config, BotConfig};

/// Serve the chat bot on stdin/stdout
#[derive(Args)]
pub struct RunArgs {
    /// Electricity price per kWh for new miners
    #[arg(long)]
    pub price: Option<f64>,

    /// Real seconds between mining ticks
    #[arg(long)]
    pub tick_secs: Option<u64>,

    /// Carry partial coins over between ticks
    #[arg(long)]
    pub carry_over: bool,
}

pub async fn execute(args: RunArgs) -> Result<()> {
    let mut config = load_config().context("Failed to load configuration")?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    let (service, reports) = MiningService::new(
        AccrualEngine::new(config.accrual_config()),
        config.catalog(),
        config.economy.electricity_price,
        config.schedule_config(),
    );
    let bot = ChatBot::new(service);

    eprintln!("{}", "Bot is running...".green().bold());
    eprintln!(
        "  {} simulated hours every {}s, electricity at {:.2}/kWh",
        config.schedule.simulated_seconds_per_tick / 3600.0,
        config.schedule.tick_interval_secs,
        config.economy.electricity_price,
    );
    eprintln!("  Send messages as {}", "<user-id> /command".cyan());

    bot.run(
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        reports,
        wait_for_signal(tokio::signal::ctrl_c()),
    )
    .await?;

    info!("Bot stopped");
    Ok(())
}

/// Resolve once `signal` fires. If the handler cannot be installed, keep
/// serving until end of input instead of stopping straight away.
async fn wait_for_signal<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("Received Ctrl-C, shutting down"),
        Err(e) => {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

pub fn apply_overrides(config: &mut BotConfig, args: &RunArgs) {
    if let Some(price) = args.price {
        config.economy.electricity_price = price;
    }
    if let Some(tick_secs) = args.tick_secs {
        config.schedule.tick_interval_secs = tick_secs;
    }
    if args.carry_over {
        config.economy.accrual_mode = AccrualMode::CarryOver;
    }
}
