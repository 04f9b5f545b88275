//! Chat reply texts.

use minebot_core::{HardwareCatalog, TickReport, UnitStatus};

pub fn welcome(catalog: &HardwareCatalog) -> String {
    let mut text = String::from("Welcome to the Mining Bot! Choose your hardware:");
    for (i, key) in catalog.keys().enumerate() {
        text.push_str(&format!("\n{}. /{}", i + 1, key));
    }
    text
}

pub fn hardware_selected(name: &str) -> String {
    format!("{} hardware selected! Use /mine to start mining.", name)
}

pub fn select_hardware_first(catalog: &HardwareCatalog) -> String {
    format!("Please select hardware first using {}.", tier_list(catalog))
}

pub fn already_mining() -> String {
    "Mining is already in progress!".to_string()
}

pub fn mining_started(simulated_seconds_per_tick: f64) -> String {
    format!(
        "Mining started! You will collect coins every {} hours.",
        simulated_seconds_per_tick / 3600.0
    )
}

pub fn auto_collect_only(name: &str) -> String {
    format!("{} hardware auto-collects coins. No need to collect manually!", name)
}

pub fn collected(name: &str, coins: u64, earnings: f64) -> String {
    format!("{} Miner: Collected {} coins. Total Earnings: {:.2}", name, coins, earnings)
}

pub fn no_mining() -> String {
    "No mining in progress.".to_string()
}

pub fn mining_stopped() -> String {
    "Mining stopped.".to_string()
}

pub fn earnings(earnings: f64) -> String {
    format!("Total Earnings: {:.2}", earnings)
}

pub fn status(status: &UnitStatus) -> String {
    format!(
        "Hardware: {}{}\nState: {}\nUncollected: {} coins\nCollected: {} coins\nEnergy: {:.2} kWh ({:.2})\nMined for: {:.1} hours\nTotal Earnings: {:.2}",
        status.hardware,
        if status.auto_collect { " (auto-collect)" } else { "" },
        if status.is_mining { "mining" } else { "idle" },
        status.uncollected_coins,
        status.total_collected,
        status.total_energy_consumed_kwh,
        status.energy_cost,
        status.simulated_seconds / 3600.0,
        status.earnings,
    )
}

pub fn unknown_command(catalog: &HardwareCatalog) -> String {
    format!(
        "Unknown command. Choose hardware with {}, then use /mine, /collect, /earnings, /status or /stop.",
        tier_list(catalog)
    )
}

/// Message for a scheduled tick, if it warrants one
pub fn tick(report: &TickReport) -> Option<String> {
    if report.result.auto_collected {
        Some(format!(
            "{} Miner: Auto-collected {} coins. Total Earnings: {:.2}",
            report.hardware, report.result.collected_coins, report.earnings
        ))
    } else if report.result.collection_due {
        Some("Time to collect your coins! Use /collect to gather your earnings.".to_string())
    } else {
        None
    }
}

/// `/a`, `/a or /b`, `/a, /b or /c`
fn tier_list(catalog: &HardwareCatalog) -> String {
    let commands: Vec<String> = catalog.keys().map(|key| format!("/{}", key)).collect();
    match commands.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} or {}", rest.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use minebot_core::{AdvanceResult, HardwareProfile, UserKey};

    #[test]
    fn test_welcome_lists_tiers() {
        assert_eq!(
            welcome(&HardwareCatalog::default()),
            "Welcome to the Mining Bot! Choose your hardware:\n1. /basic\n2. /premium"
        );
    }

    #[test]
    fn test_tier_list() {
        let mut catalog = HardwareCatalog::new();
        assert_eq!(tier_list(&catalog), "");

        catalog.insert("basic", HardwareProfile::basic());
        assert_eq!(tier_list(&catalog), "/basic");

        catalog.insert("premium", HardwareProfile::premium());
        assert_eq!(
            select_hardware_first(&catalog),
            "Please select hardware first using /basic or /premium."
        );

        catalog.insert("asic", HardwareProfile::new("ASIC", 1e11, 3_000.0, true));
        assert_eq!(tier_list(&catalog), "/asic, /basic or /premium");
    }

    #[test]
    fn test_money_formatting() {
        assert_eq!(collected("Basic", 3, -0.06), "Basic Miner: Collected 3 coins. Total Earnings: -0.06");
        assert_eq!(mining_started(14_400.0), "Mining started! You will collect coins every 4 hours.");
        assert_eq!(mining_started(5_400.0), "Mining started! You will collect coins every 1.5 hours.");
    }

    #[test]
    fn test_tick_messages() {
        let mut report = TickReport {
            user: UserKey::from("1"),
            hardware: "Premium".to_string(),
            result: AdvanceResult {
                coins_found: 14,
                energy_consumed_kwh: 2.0,
                auto_collected: true,
                collected_coins: 14,
                collection_due: false,
            },
            earnings: -0.3,
        };
        assert_eq!(
            tick(&report).unwrap(),
            "Premium Miner: Auto-collected 14 coins. Total Earnings: -0.30"
        );

        report.result.auto_collected = false;
        assert!(tick(&report).is_none());

        report.result.collection_due = true;
        assert_eq!(
            tick(&report).unwrap(),
            "Time to collect your coins! Use /collect to gather your earnings."
        );
    }
}
