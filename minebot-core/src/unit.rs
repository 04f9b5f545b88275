use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::{AccrualConfig, AccrualMode};
use crate::hardware::HardwareProfile;

/// Watt-seconds per kilowatt-hour
pub const WATT_SECONDS_PER_KWH: f64 = 1000.0 * 3600.0;

/// Increments produced by one accrual step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Accrual {
    pub hashes_attempted: f64,
    pub coins_found: u64,
    pub energy_consumed_kwh: f64,
}

/// Per-user mining record.
///
/// Timestamps used for collection scheduling are measured on the unit's own
/// simulated clock, which only moves when time is accrued. Wall-clock
/// timestamps are kept for display only.
#[derive(Debug, Clone)]
pub struct MiningUnit {
    /// Shared tier definition
    hardware: Arc<HardwareProfile>,

    /// Price of energy, fixed at creation
    electricity_cost_per_kwh: f64,

    /// Coins mined but not yet collected
    uncollected_coins: u64,

    /// Lifetime energy use, never reset
    total_energy_consumed_kwh: f64,

    /// Simulated time of the last collection (or creation)
    last_collection_timestamp: f64,

    /// Simulated seconds mined so far
    simulated_seconds: f64,

    /// Whether accrual is active
    is_mining: bool,

    /// Every coin ever found
    lifetime_coins: u64,

    /// Every coin ever collected
    total_collected: u64,

    /// Hash progress below one coin, only kept in carry-over mode
    hash_carry: f64,

    created_at: DateTime<Utc>,
    last_collected_at: Option<DateTime<Utc>>,
}

impl MiningUnit {
    /// Create a fresh, idle unit
    pub fn new(hardware: Arc<HardwareProfile>, electricity_cost_per_kwh: f64) -> Self {
        Self {
            hardware,
            electricity_cost_per_kwh,
            uncollected_coins: 0,
            total_energy_consumed_kwh: 0.0,
            last_collection_timestamp: 0.0,
            simulated_seconds: 0.0,
            is_mining: false,
            lifetime_coins: 0,
            total_collected: 0,
            hash_carry: 0.0,
            created_at: Utc::now(),
            last_collected_at: None,
        }
    }

    /// Convert elapsed simulated seconds into coins and energy.
    ///
    /// Does not look at `is_mining`; the engine gates calls on it. Negative
    /// or NaN elapsed times accrue nothing.
    pub fn accrue(&mut self, elapsed_seconds: f64, config: &AccrualConfig) -> Accrual {
        let elapsed = if elapsed_seconds > 0.0 { elapsed_seconds } else { 0.0 };

        let hashes_attempted = self.hardware.hash_rate * elapsed;
        let coins_found = match config.mode {
            AccrualMode::Truncate => (hashes_attempted / config.difficulty).floor() as u64,
            AccrualMode::CarryOver => {
                let progress = self.hash_carry + hashes_attempted;
                let coins = (progress / config.difficulty).floor();
                self.hash_carry = (progress - coins * config.difficulty).max(0.0);
                coins as u64
            }
        };
        let energy_consumed_kwh = self.hardware.power_consumption * elapsed / WATT_SECONDS_PER_KWH;

        // Coin counters saturate rather than overflow on huge elapsed times
        self.uncollected_coins = self.uncollected_coins.saturating_add(coins_found);
        self.lifetime_coins = self.lifetime_coins.saturating_add(coins_found);
        self.total_energy_consumed_kwh += energy_consumed_kwh;
        self.simulated_seconds += elapsed;

        Accrual {
            hashes_attempted,
            coins_found,
            energy_consumed_kwh,
        }
    }

    /// Drain the uncollected buffer and restart the collection clock
    pub fn collect(&mut self) -> u64 {
        let collected = std::mem::take(&mut self.uncollected_coins);
        self.total_collected = self.total_collected.saturating_add(collected);
        self.last_collection_timestamp = self.simulated_seconds;
        self.last_collected_at = Some(Utc::now());
        collected
    }

    /// Uncollected coins minus the lifetime energy bill
    pub fn earnings(&self) -> f64 {
        self.uncollected_coins as f64 - self.total_energy_consumed_kwh * self.electricity_cost_per_kwh
    }

    /// Simulated seconds since the last collection
    pub fn seconds_since_collection(&self) -> f64 {
        self.simulated_seconds - self.last_collection_timestamp
    }

    pub(crate) fn set_mining(&mut self, mining: bool) {
        self.is_mining = mining;
    }

    pub fn hardware(&self) -> &Arc<HardwareProfile> {
        &self.hardware
    }

    pub fn electricity_cost_per_kwh(&self) -> f64 {
        self.electricity_cost_per_kwh
    }

    pub fn uncollected_coins(&self) -> u64 {
        self.uncollected_coins
    }

    pub fn total_energy_consumed_kwh(&self) -> f64 {
        self.total_energy_consumed_kwh
    }

    pub fn last_collection_timestamp(&self) -> f64 {
        self.last_collection_timestamp
    }

    pub fn simulated_seconds(&self) -> f64 {
        self.simulated_seconds
    }

    pub fn is_mining(&self) -> bool {
        self.is_mining
    }

    pub fn lifetime_coins(&self) -> u64 {
        self.lifetime_coins
    }

    pub fn total_collected(&self) -> u64 {
        self.total_collected
    }

    pub fn hash_carry(&self) -> f64 {
        self.hash_carry
    }

    /// Read-only snapshot for display
    pub fn status(&self) -> UnitStatus {
        UnitStatus {
            hardware: self.hardware.name.clone(),
            auto_collect: self.hardware.auto_collect,
            is_mining: self.is_mining,
            electricity_cost_per_kwh: self.electricity_cost_per_kwh,
            uncollected_coins: self.uncollected_coins,
            total_energy_consumed_kwh: self.total_energy_consumed_kwh,
            energy_cost: self.total_energy_consumed_kwh * self.electricity_cost_per_kwh,
            earnings: self.earnings(),
            lifetime_coins: self.lifetime_coins,
            total_collected: self.total_collected,
            simulated_seconds: self.simulated_seconds,
            seconds_since_collection: self.seconds_since_collection(),
            created_at: self.created_at,
            last_collected_at: self.last_collected_at,
        }
    }
}

/// Serializable view of a mining unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitStatus {
    pub hardware: String,
    pub auto_collect: bool,
    pub is_mining: bool,
    pub electricity_cost_per_kwh: f64,
    pub uncollected_coins: u64,
    pub total_energy_consumed_kwh: f64,
    pub energy_cost: f64,
    pub earnings: f64,
    pub lifetime_coins: u64,
    pub total_collected: u64,
    pub simulated_seconds: f64,
    pub seconds_since_collection: f64,
    pub created_at: DateTime<Utc>,
    pub last_collected_at: Option<DateTime<Utc>>,
}
