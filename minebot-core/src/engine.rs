use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::hardware::HardwareProfile;
use crate::store::{MemoryUnitStore, UnitStore, UserKey};
use crate::unit::{MiningUnit, UnitStatus};

/// Hashes needed to find one coin
pub const DEFAULT_DIFFICULTY: f64 = 1e12;

/// Four hours of simulated mining
pub const DEFAULT_COLLECTION_DUE_SECS: f64 = 4.0 * 3600.0;

/// How hash progress below one coin is treated between calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccrualMode {
    /// Each call floors its own hashes; partial progress is dropped
    #[default]
    Truncate,

    /// Partial progress is carried into the next call
    CarryOver,
}

/// Configuration for the accrual engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccrualConfig {
    /// Hashes per coin
    #[serde(default = "default_difficulty")]
    pub difficulty: f64,

    /// Partial coin handling
    #[serde(default)]
    pub mode: AccrualMode,

    /// Simulated seconds after which manual hardware is due for collection
    #[serde(default = "default_collection_due_secs")]
    pub collection_due_secs: f64,
}

impl Default for AccrualConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            mode: AccrualMode::default(),
            collection_due_secs: default_collection_due_secs(),
        }
    }
}

fn default_difficulty() -> f64 { DEFAULT_DIFFICULTY }
fn default_collection_due_secs() -> f64 { DEFAULT_COLLECTION_DUE_SECS }

/// Outcome of one time advance
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvanceResult {
    /// Coins found during this advance
    pub coins_found: u64,

    /// Energy used during this advance (kWh)
    pub energy_consumed_kwh: f64,

    /// Coins were collected as part of this advance
    pub auto_collected: bool,

    /// Amount collected when `auto_collected` is set
    pub collected_coins: u64,

    /// Manual hardware has gone long enough without a collection
    pub collection_due: bool,
}

/// Outcome of a collection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollectResult {
    /// Coins drained from the buffer
    pub collected_coins: u64,

    /// Earnings right after the collection
    pub earnings: f64,
}

/// Per-user mining state machine.
///
/// Purely reactive: it never schedules anything itself. Callers decide when
/// to advance time and by how much.
pub struct AccrualEngine<S = MemoryUnitStore> {
    config: AccrualConfig,
    store: S,
}

impl AccrualEngine<MemoryUnitStore> {
    /// Create an engine with an in-memory store
    pub fn new(config: AccrualConfig) -> Self {
        Self::with_store(config, MemoryUnitStore::new())
    }
}

impl Default for AccrualEngine<MemoryUnitStore> {
    fn default() -> Self {
        Self::new(AccrualConfig::default())
    }
}

impl<S: UnitStore> AccrualEngine<S> {
    /// Create an engine over a caller-supplied store
    pub fn with_store(config: AccrualConfig, store: S) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &AccrualConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create or replace the user's unit with fresh accumulators
    pub fn select_hardware(&self, user: &UserKey, profile: Arc<HardwareProfile>, electricity_cost_per_kwh: f64) {
        let name = profile.name.clone();
        let replaced = self
            .store
            .insert(user.clone(), MiningUnit::new(profile, electricity_cost_per_kwh));

        if replaced.is_some() {
            info!("User {} replaced their miner with {} hardware", user, name);
        } else {
            info!("User {} selected {} hardware", user, name);
        }
    }

    /// Move the unit from idle to mining
    pub fn start_mining(&self, user: &UserKey) -> Result<()> {
        self.with_unit(user, |unit| {
            if unit.is_mining() {
                return Err(EngineError::AlreadyMining(user.clone()));
            }
            unit.set_mining(true);
            Ok(())
        })?
        .map(|_| info!("User {} started mining", user))
        .map_err(|e| {
            warn!("{}", e);
            e
        })
    }

    /// Accrue `elapsed_seconds` of simulated mining with the configured
    /// collection-due threshold
    pub fn advance_time(&self, user: &UserKey, elapsed_seconds: f64) -> Result<AdvanceResult> {
        self.advance_time_with_threshold(user, elapsed_seconds, self.config.collection_due_secs)
    }

    /// Accrue `elapsed_seconds` of simulated mining.
    ///
    /// Idle units return a zero result. Auto-collect hardware collects in the
    /// same step; manual hardware reports whether `collection_due_secs` of
    /// simulated time have passed since the last collection.
    pub fn advance_time_with_threshold(
        &self,
        user: &UserKey,
        elapsed_seconds: f64,
        collection_due_secs: f64,
    ) -> Result<AdvanceResult> {
        self.with_unit(user, |unit| {
            if !unit.is_mining() {
                debug!("Ignoring time advance for idle miner of user {}", user);
                return AdvanceResult::default();
            }

            let accrual = unit.accrue(elapsed_seconds, &self.config);
            let mut result = AdvanceResult {
                coins_found: accrual.coins_found,
                energy_consumed_kwh: accrual.energy_consumed_kwh,
                ..Default::default()
            };

            if unit.hardware().auto_collect {
                result.auto_collected = true;
                result.collected_coins = unit.collect();
            } else {
                result.collection_due = unit.seconds_since_collection() >= collection_due_secs;
            }

            debug!(
                "User {} mined {:.0}s: {} coins, {:.4} kWh (auto_collected={}, due={})",
                user,
                elapsed_seconds,
                result.coins_found,
                result.energy_consumed_kwh,
                result.auto_collected,
                result.collection_due,
            );

            result
        })
    }

    /// Drain the user's uncollected coins
    pub fn collect_coins(&self, user: &UserKey) -> Result<CollectResult> {
        let result = self.with_unit(user, |unit| {
            let collected_coins = unit.collect();
            CollectResult {
                collected_coins,
                earnings: unit.earnings(),
            }
        })?;

        info!("User {} collected {} coins", user, result.collected_coins);
        Ok(result)
    }

    /// Uncollected coins minus lifetime energy cost
    pub fn get_earnings(&self, user: &UserKey) -> Result<f64> {
        self.with_unit(user, |unit| unit.earnings())
    }

    /// Move the unit from mining to idle, keeping its accumulators
    pub fn stop_mining(&self, user: &UserKey) -> Result<()> {
        self.with_unit(user, |unit| {
            if !unit.is_mining() {
                return Err(EngineError::NotMining(user.clone()));
            }
            unit.set_mining(false);
            Ok(())
        })?
        .map(|_| info!("User {} stopped mining", user))
        .map_err(|e| {
            warn!("{}", e);
            e
        })
    }

    /// Snapshot of the user's unit
    pub fn unit_status(&self, user: &UserKey) -> Result<UnitStatus> {
        self.with_unit(user, |unit| unit.status())
    }

    /// Whether the user's unit is currently mining
    pub fn is_mining(&self, user: &UserKey) -> Result<bool> {
        self.with_unit(user, |unit| unit.is_mining())
    }

    /// Users whose units are mining
    pub fn active_miners(&self) -> Vec<UserKey> {
        self.store
            .keys()
            .into_iter()
            .filter(|key| self.store.with_unit(key, |unit| unit.is_mining()).unwrap_or(false))
            .collect()
    }

    fn with_unit<R>(&self, user: &UserKey, f: impl FnOnce(&mut MiningUnit) -> R) -> Result<R> {
        self.store
            .with_unit(user, f)
            .ok_or_else(|| EngineError::NoUnit(user.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with(user: &UserKey, profile: HardwareProfile) -> AccrualEngine {
        let engine = AccrualEngine::default();
        engine.select_hardware(user, Arc::new(profile), 0.15);
        engine
    }

    #[test]
    fn test_operations_without_unit() {
        let engine = AccrualEngine::default();
        let user = UserKey::from("ghost");

        assert_eq!(engine.start_mining(&user), Err(EngineError::NoUnit(user.clone())));
        assert_eq!(engine.stop_mining(&user), Err(EngineError::NoUnit(user.clone())));
        assert_eq!(engine.advance_time(&user, 60.0), Err(EngineError::NoUnit(user.clone())));
        assert_eq!(engine.collect_coins(&user).unwrap_err(), EngineError::NoUnit(user.clone()));
        assert_eq!(engine.get_earnings(&user), Err(EngineError::NoUnit(user.clone())));
        assert!(engine.unit_status(&user).is_err());
    }

    #[test]
    fn test_start_twice() {
        let user = UserKey::from("alice");
        let engine = engine_with(&user, HardwareProfile::basic());

        assert!(engine.start_mining(&user).is_ok());
        assert_eq!(engine.start_mining(&user), Err(EngineError::AlreadyMining(user.clone())));
        assert_eq!(engine.is_mining(&user), Ok(true));
    }

    #[test]
    fn test_stop_when_idle() {
        let user = UserKey::from("alice");
        let engine = engine_with(&user, HardwareProfile::basic());

        assert_eq!(engine.stop_mining(&user), Err(EngineError::NotMining(user.clone())));

        engine.start_mining(&user).unwrap();
        assert!(engine.stop_mining(&user).is_ok());
        assert_eq!(engine.is_mining(&user), Ok(false));
    }

    #[test]
    fn test_idle_advance_is_noop() {
        let user = UserKey::from("alice");
        let engine = engine_with(&user, HardwareProfile::premium());

        let result = engine.advance_time(&user, 14_400.0).unwrap();
        assert_eq!(result, AdvanceResult::default());

        let status = engine.unit_status(&user).unwrap();
        assert_eq!(status.total_energy_consumed_kwh, 0.0);
        assert_eq!(status.simulated_seconds, 0.0);
    }

    #[test]
    fn test_manual_collection_due() {
        let user = UserKey::from("alice");
        let engine = engine_with(&user, HardwareProfile::basic());
        engine.start_mining(&user).unwrap();

        assert!(!engine.advance_time(&user, 3_600.0).unwrap().collection_due);
        assert!(!engine.advance_time(&user, 7_200.0).unwrap().collection_due);
        assert!(engine.advance_time(&user, 3_600.0).unwrap().collection_due);

        engine.collect_coins(&user).unwrap();
        assert!(!engine.advance_time(&user, 3_600.0).unwrap().collection_due);

        // Caller-supplied threshold overrides the configured one
        assert!(engine.advance_time_with_threshold(&user, 0.0, 3_600.0).unwrap().collection_due);
    }

    #[test]
    fn test_stop_keeps_coins_collectible() {
        let user = UserKey::from("alice");
        let engine = engine_with(&user, HardwareProfile::new("Rig", 1e9, 500.0, false));
        engine.start_mining(&user).unwrap();
        engine.advance_time(&user, 14_400.0).unwrap();
        engine.stop_mining(&user).unwrap();

        // Stopped units stop earning
        assert_eq!(engine.advance_time(&user, 14_400.0).unwrap().coins_found, 0);

        let collected = engine.collect_coins(&user).unwrap();
        assert_eq!(collected.collected_coins, 14);
        assert!((collected.earnings + 0.30).abs() < 1e-9);
    }

    #[test]
    fn test_active_miners() {
        let engine = AccrualEngine::default();
        for name in ["carol", "alice", "bob"] {
            engine.select_hardware(&UserKey::from(name), Arc::new(HardwareProfile::basic()), 0.15);
        }
        engine.start_mining(&UserKey::from("carol")).unwrap();
        engine.start_mining(&UserKey::from("alice")).unwrap();

        assert_eq!(engine.active_miners(), vec![UserKey::from("alice"), UserKey::from("carol")]);
    }

    #[test]
    fn test_config_defaults_from_empty_json() {
        let config: AccrualConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.difficulty, DEFAULT_DIFFICULTY);
        assert_eq!(config.mode, AccrualMode::Truncate);
        assert_eq!(config.collection_due_secs, 14_400.0);

        let config: AccrualConfig = serde_json::from_str(r#"{"mode":"carry_over"}"#).unwrap();
        assert_eq!(config.mode, AccrualMode::CarryOver);
    }
}
