//! MineBot mining accrual engine
//!
//! Converts elapsed simulated time into coins and energy cost for one mining
//! unit per user, with manual or automatic collection.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use minebot_core::{AccrualEngine, HardwareProfile, UserKey};
//!
//! let engine = AccrualEngine::default();
//! let user = UserKey::from(42i64);
//!
//! engine.select_hardware(&user, Arc::new(HardwareProfile::premium()), 0.15);
//! engine.start_mining(&user).unwrap();
//!
//! let result = engine.advance_time(&user, 4.0 * 3600.0).unwrap();
//! assert_eq!(result.coins_found, 14);
//! assert!(result.auto_collected);
//! ```

pub mod engine;
pub mod error;
pub mod hardware;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod unit;

// Re-export main types
pub use engine::{AccrualConfig, AccrualEngine, AccrualMode, AdvanceResult, CollectResult};
pub use error::{EngineError, Result, ServiceError};
pub use hardware::{HardwareCatalog, HardwareProfile, BASIC_TIER, PREMIUM_TIER};
pub use scheduler::{ScheduleConfig, TickReport, TickScheduler};
pub use service::MiningService;
pub use store::{MemoryUnitStore, UnitStore, UserKey};
pub use unit::{MiningUnit, UnitStatus};
