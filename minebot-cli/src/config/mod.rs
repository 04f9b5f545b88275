use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use once_cell::sync::OnceCell;
use tracing::{debug, info};

use minebot_core::{
    AccrualConfig, AccrualMode, HardwareCatalog, HardwareProfile, ScheduleConfig,
    BASIC_TIER, PREMIUM_TIER,
};

static CONFIG_PATH: OnceCell<PathBuf> = OnceCell::new();

/// Main bot configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub economy: EconomyConfig,

    #[serde(default)]
    pub schedule: ScheduleSettings,

    /// Hardware tiers, keyed by the chat command that selects them
    #[serde(default = "default_tiers")]
    pub tiers: BTreeMap<String, HardwareProfile>,
}

/// Prices and coin arithmetic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomyConfig {
    /// Electricity cost per kWh given to every new miner
    #[serde(default = "default_electricity_price")]
    pub electricity_price: f64,

    /// Hashes per coin
    #[serde(default = "default_difficulty")]
    pub difficulty: f64,

    #[serde(default)]
    pub accrual_mode: AccrualMode,
}

/// Mining schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSettings {
    /// Real seconds between ticks
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,

    /// Simulated seconds mined per tick
    #[serde(default = "default_simulated_seconds_per_tick")]
    pub simulated_seconds_per_tick: f64,

    /// Simulated seconds before manual hardware is due for collection
    #[serde(default = "default_collection_due_secs")]
    pub collection_due_secs: f64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            electricity_price: default_electricity_price(),
            difficulty: default_difficulty(),
            accrual_mode: AccrualMode::default(),
        }
    }
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval_secs(),
            simulated_seconds_per_tick: default_simulated_seconds_per_tick(),
            collection_due_secs: default_collection_due_secs(),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            economy: EconomyConfig::default(),
            schedule: ScheduleSettings::default(),
            tiers: default_tiers(),
        }
    }
}

impl BotConfig {
    /// Engine settings derived from this configuration
    pub fn accrual_config(&self) -> AccrualConfig {
        AccrualConfig {
            difficulty: self.economy.difficulty,
            mode: self.economy.accrual_mode,
            collection_due_secs: self.schedule.collection_due_secs,
        }
    }

    /// Scheduler settings derived from this configuration
    pub fn schedule_config(&self) -> ScheduleConfig {
        ScheduleConfig {
            tick_interval: Duration::from_secs(self.schedule.tick_interval_secs.max(1)),
            simulated_seconds_per_tick: self.schedule.simulated_seconds_per_tick,
            ..Default::default()
        }
    }

    pub fn catalog(&self) -> HardwareCatalog {
        self.tiers
            .iter()
            .map(|(key, profile)| (key.clone(), profile.clone()))
            .collect()
    }

    /// Reject values the engine trusts its callers to get right
    pub fn validate(&self) -> Result<()> {
        if !(self.economy.electricity_price > 0.0) {
            anyhow::bail!("electricity_price must be positive");
        }
        if !(self.economy.difficulty > 0.0) {
            anyhow::bail!("difficulty must be positive");
        }
        if !(self.schedule.simulated_seconds_per_tick > 0.0) {
            anyhow::bail!("simulated_seconds_per_tick must be positive");
        }
        if self.tiers.is_empty() {
            anyhow::bail!("at least one hardware tier must be configured");
        }
        for (key, tier) in &self.tiers {
            if !(tier.hash_rate > 0.0) || !(tier.power_consumption > 0.0) {
                anyhow::bail!("tier '{}' needs a positive hash_rate and power_consumption", key);
            }
        }
        Ok(())
    }
}

// Default value functions for serde
fn default_electricity_price() -> f64 { 0.15 }
fn default_difficulty() -> f64 { 1e12 }
fn default_tick_interval_secs() -> u64 { 4 * 60 }
fn default_simulated_seconds_per_tick() -> f64 { 4.0 * 3600.0 }
fn default_collection_due_secs() -> f64 { 4.0 * 3600.0 }
fn default_tiers() -> BTreeMap<String, HardwareProfile> {
    BTreeMap::from([
        (BASIC_TIER.to_string(), HardwareProfile::basic()),
        (PREMIUM_TIER.to_string(), HardwareProfile::premium()),
    ])
}

/// Get the config file path
pub fn get_config_path() -> PathBuf {
    CONFIG_PATH.get().cloned().unwrap_or_else(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("minebot")
            .join("config.toml")
    })
}

/// Set custom config path
pub fn set_config_path(path: &str) {
    let _ = CONFIG_PATH.set(PathBuf::from(path));
}

/// Load configuration, falling back to defaults when the file is missing
pub fn load_config() -> Result<BotConfig> {
    load_config_from(&get_config_path())
}

pub fn load_config_from(path: &Path) -> Result<BotConfig> {
    if !path.exists() {
        debug!("No configuration at {}, using defaults", path.display());
        return Ok(BotConfig::default());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: BotConfig = toml::from_str(&contents)
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    config.validate()?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &BotConfig) -> Result<()> {
    save_config_to(config, &get_config_path())
}

pub fn save_config_to(config: &BotConfig, path: &Path) -> Result<()> {
    // Create directory if it doesn't exist
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)?;
    fs::write(path, contents)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, BotConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = BotConfig::default();
        config.economy.electricity_price = 0.22;
        config.economy.accrual_mode = AccrualMode::CarryOver;
        config.tiers.insert("asic".to_string(), HardwareProfile::new("ASIC", 1e11, 3_000.0, true));

        save_config_to(&config, &path).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[economy]\nelectricity_price = 0.3\n\n[schedule]\ntick_interval_secs = 5\n").unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.economy.electricity_price, 0.3);
        assert_eq!(config.economy.difficulty, 1e12);
        assert_eq!(config.schedule_config().tick_interval, Duration::from_secs(5));
        assert_eq!(config.catalog().len(), 2);
    }

    #[test]
    fn test_rejects_non_positive_price() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[economy]\nelectricity_price = 0.0\n").unwrap();

        assert!(load_config_from(&path).is_err());
    }

    #[test]
    fn test_derived_engine_config() {
        let config = BotConfig::default();
        let accrual = config.accrual_config();
        assert_eq!(accrual.mode, AccrualMode::Truncate);
        assert_eq!(accrual.collection_due_secs, 14_400.0);
        assert_eq!(config.schedule_config().simulated_seconds_per_tick, 14_400.0);
    }
}
