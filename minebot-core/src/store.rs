use std::fmt;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::unit::MiningUnit;

/// Opaque, stable identifier of the user who owns a mining unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserKey(String);

impl UserKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for UserKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<i64> for UserKey {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<u64> for UserKey {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// Mapping from user key to mining unit, owned by one engine.
///
/// `with_unit` must give the closure exclusive access to the unit for the
/// duration of the call, so that operations on the same key never overlap.
pub trait UnitStore: Send + Sync {
    /// Insert a unit, returning the one it replaced
    fn insert(&self, key: UserKey, unit: MiningUnit) -> Option<MiningUnit>;

    /// Run `f` against the unit for `key`, if there is one
    fn with_unit<R, F>(&self, key: &UserKey, f: F) -> Option<R>
    where
        F: FnOnce(&mut MiningUnit) -> R;

    /// Keys of all stored units
    fn keys(&self) -> Vec<UserKey>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory store backed by a sharded concurrent map
#[derive(Debug, Default)]
pub struct MemoryUnitStore {
    units: DashMap<UserKey, MiningUnit>,
}

impl MemoryUnitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UnitStore for MemoryUnitStore {
    fn insert(&self, key: UserKey, unit: MiningUnit) -> Option<MiningUnit> {
        self.units.insert(key, unit)
    }

    fn with_unit<R, F>(&self, key: &UserKey, f: F) -> Option<R>
    where
        F: FnOnce(&mut MiningUnit) -> R,
    {
        // The entry guard holds the shard write lock until `f` returns
        self.units.get_mut(key).map(|mut unit| f(unit.value_mut()))
    }

    fn keys(&self) -> Vec<UserKey> {
        let mut keys: Vec<UserKey> = self.units.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }

    fn len(&self) -> usize {
        self.units.len()
    }
}
