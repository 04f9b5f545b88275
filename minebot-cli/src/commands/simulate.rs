use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use minebot_core::{AccrualEngine, AccrualMode, UserKey};

use crate::config::{load_config, BotConfig};

/// Project a miner's earnings tick by tick without waiting in real time
#[derive(Args)]
pub struct SimulateArgs {
    /// Hardware tier to simulate
    #[arg(short, long, default_value = "basic")]
    pub tier: String,

    /// Number of ticks to run
    #[arg(short = 'n', long, default_value_t = 6)]
    pub ticks: u32,

    /// Collect every N ticks (manual hardware only)
    #[arg(long)]
    pub collect_every: Option<u32>,

    /// Electricity price per kWh
    #[arg(long)]
    pub price: Option<f64>,

    /// Carry partial coins over between ticks
    #[arg(long)]
    pub carry_over: bool,

    /// Output in JSON format
    #[arg(short, long)]
    pub json: bool,
}

/// State after one simulated tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationStep {
    pub tick: u32,
    pub hours: f64,
    pub coins_found: u64,
    pub collected: u64,
    pub uncollected: u64,
    pub energy_kwh: f64,
    pub earnings: f64,
    pub collection_due: bool,
}

#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "Tick")]
    tick: String,
    #[tabled(rename = "Hours")]
    hours: String,
    #[tabled(rename = "Found")]
    found: String,
    #[tabled(rename = "Collected")]
    collected: String,
    #[tabled(rename = "Uncollected")]
    uncollected: String,
    #[tabled(rename = "Energy")]
    energy: String,
    #[tabled(rename = "Earnings")]
    earnings: String,
}

impl From<&SimulationStep> for StepRow {
    fn from(step: &SimulationStep) -> Self {
        Self {
            tick: step.tick.to_string(),
            hours: format!("{:.1}", step.hours),
            found: step.coins_found.to_string(),
            collected: step.collected.to_string(),
            uncollected: format!("{}{}", step.uncollected, if step.collection_due { " (due)" } else { "" }),
            energy: format!("{:.2} kWh", step.energy_kwh),
            earnings: format!("{:.2}", step.earnings),
        }
    }
}

pub async fn execute(args: SimulateArgs) -> Result<()> {
    let mut config = load_config().context("Failed to load configuration")?;
    if let Some(price) = args.price {
        config.economy.electricity_price = price;
    }
    if args.carry_over {
        config.economy.accrual_mode = AccrualMode::CarryOver;
    }
    config.validate()?;

    let steps = simulate(&config, &args.tier, args.ticks, args.collect_every)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&steps)?);
        return Ok(());
    }

    let rows: Vec<StepRow> = steps.iter().map(StepRow::from).collect();
    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{}", table);

    if let Some(last) = steps.last() {
        let earnings = format!("{:.2}", last.earnings);
        let earnings = if last.earnings >= 0.0 { earnings.green() } else { earnings.red() };
        println!(
            "\n{} after {:.1} simulated hours: {}",
            "Total Earnings".bold(),
            last.hours,
            earnings
        );
    }

    Ok(())
}

/// Run `ticks` scheduler ticks for one miner on a private engine
pub fn simulate(config: &BotConfig, tier: &str, ticks: u32, collect_every: Option<u32>) -> Result<Vec<SimulationStep>> {
    let catalog = config.catalog();
    let profile = catalog
        .get(tier)
        .with_context(|| format!("Unknown hardware tier '{}'", tier))?;

    let engine = AccrualEngine::new(config.accrual_config());
    let user = UserKey::from("simulation");
    engine.select_hardware(&user, profile.clone(), config.economy.electricity_price);
    engine.start_mining(&user)?;

    let tick_secs = config.schedule.simulated_seconds_per_tick;
    let mut steps = Vec::with_capacity(ticks as usize);

    for tick in 1..=ticks {
        let result = engine.advance_time(&user, tick_secs)?;

        let mut collected = result.collected_coins;
        let scheduled_collect = collect_every.map_or(false, |every| every > 0 && tick % every == 0);
        if !profile.auto_collect && scheduled_collect {
            collected = engine.collect_coins(&user)?.collected_coins;
        }

        let status = engine.unit_status(&user)?;
        steps.push(SimulationStep {
            tick,
            hours: status.simulated_seconds / 3600.0,
            coins_found: result.coins_found,
            collected,
            uncollected: status.uncollected_coins,
            energy_kwh: status.total_energy_consumed_kwh,
            earnings: status.earnings,
            collection_due: result.collection_due,
        });
    }

    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_premium_projection() {
        let steps = simulate(&BotConfig::default(), "premium", 3, None).unwrap();

        assert_eq!(steps.len(), 3);
        assert!(steps.iter().all(|s| s.coins_found == 14 && s.collected == 14 && s.uncollected == 0));
        assert_eq!(steps[2].hours, 12.0);
        assert_eq!(steps[2].energy_kwh, 6.0);
        assert!((steps[2].earnings + 0.90).abs() < 1e-9);
    }

    #[test]
    fn test_basic_truncation_never_pays() {
        let steps = simulate(&BotConfig::default(), "basic", 10, Some(2)).unwrap();

        assert!(steps.iter().all(|s| s.coins_found == 0));
        assert!(steps.iter().all(|s| s.collection_due));
        assert!((steps[9].energy_kwh - 4.0).abs() < 1e-9);
        assert!((steps[9].earnings + 0.60).abs() < 1e-9);
    }

    #[test]
    fn test_basic_carry_over_pays_eventually() {
        let mut config = BotConfig::default();
        config.economy.accrual_mode = AccrualMode::CarryOver;

        let steps = simulate(&config, "basic", 7, None).unwrap();
        let found: u64 = steps.iter().map(|s| s.coins_found).sum();
        assert_eq!(found, 1);
        assert_eq!(steps[6].coins_found, 1);
        assert_eq!(steps[6].uncollected, 1);
    }

    #[test]
    fn test_manual_collection_schedule() {
        let mut config = BotConfig::default();
        config.tiers.insert(
            "rig".to_string(),
            minebot_core::HardwareProfile::new("Rig", 1e9, 500.0, false),
        );

        let steps = simulate(&config, "rig", 4, Some(2)).unwrap();
        assert_eq!(steps[0].uncollected, 14);
        assert_eq!(steps[0].collected, 0);
        assert_eq!(steps[1].collected, 28);
        assert_eq!(steps[1].uncollected, 0);
        assert_eq!(steps[2].uncollected, 14);
        assert!(steps[2].collection_due);
    }

    #[test]
    fn test_unknown_tier() {
        assert!(simulate(&BotConfig::default(), "gold", 1, None).is_err());
    }
}
