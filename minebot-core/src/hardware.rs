use std::collections::BTreeMap;
use std::sync::Arc;
use serde::{Deserialize, Serialize};

/// Tier key of the entry-level rig
pub const BASIC_TIER: &str = "basic";

/// Tier key of the auto-collecting rig
pub const PREMIUM_TIER: &str = "premium";

/// Immutable hardware tier definition, shared by every unit of that tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareProfile {
    /// Display label
    pub name: String,

    /// Hash attempts per second of simulated time
    pub hash_rate: f64,

    /// Power draw in watts
    pub power_consumption: f64,

    /// Collect coins the moment they are mined
    #[serde(default)]
    pub auto_collect: bool,
}

impl HardwareProfile {
    /// Create a new hardware profile
    pub fn new(name: impl Into<String>, hash_rate: f64, power_consumption: f64, auto_collect: bool) -> Self {
        Self {
            name: name.into(),
            hash_rate,
            power_consumption,
            auto_collect,
        }
    }

    pub fn basic() -> Self {
        Self::new("Basic", 10_000_000.0, 100.0, false)
    }

    pub fn premium() -> Self {
        Self::new("Premium", 1_000_000_000.0, 500.0, true)
    }
}

/// Set of recognized hardware tiers, keyed by the command that selects them
#[derive(Debug, Clone)]
pub struct HardwareCatalog {
    tiers: BTreeMap<String, Arc<HardwareProfile>>,
}

impl HardwareCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            tiers: BTreeMap::new(),
        }
    }

    /// Register (or replace) a tier
    pub fn insert(&mut self, key: impl Into<String>, profile: HardwareProfile) {
        self.tiers.insert(key.into().to_lowercase(), Arc::new(profile));
    }

    /// Look up a tier by key, case-insensitively
    pub fn get(&self, key: &str) -> Option<Arc<HardwareProfile>> {
        self.tiers.get(&key.to_lowercase()).cloned()
    }

    /// Tier keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tiers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

impl Default for HardwareCatalog {
    /// The two tiers offered by the bot out of the box
    fn default() -> Self {
        let mut catalog = Self::new();
        catalog.insert(BASIC_TIER, HardwareProfile::basic());
        catalog.insert(PREMIUM_TIER, HardwareProfile::premium());
        catalog
    }
}

impl FromIterator<(String, HardwareProfile)> for HardwareCatalog {
    fn from_iter<I: IntoIterator<Item = (String, HardwareProfile)>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for (key, profile) in iter {
            catalog.insert(key, profile);
        }
        catalog
    }
}
