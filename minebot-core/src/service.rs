use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use crate::engine::{AccrualEngine, CollectResult};
use crate::error::{Result, ServiceError};
use crate::hardware::{HardwareCatalog, HardwareProfile};
use crate::scheduler::{ScheduleConfig, TickReport, TickScheduler};
use crate::store::{MemoryUnitStore, UnitStore, UserKey};
use crate::unit::UnitStatus;

/// Engine plus scheduler: successful starts begin a schedule, successful
/// stops cancel it, and hardware is chosen from a catalog of known tiers.
pub struct MiningService<S: UnitStore + 'static = MemoryUnitStore> {
    engine: Arc<AccrualEngine<S>>,
    scheduler: TickScheduler<S>,
    catalog: HardwareCatalog,
    electricity_price: f64,
}

impl<S: UnitStore + 'static> MiningService<S> {
    /// Create a new service and the receiver for its tick reports
    pub fn new(
        engine: AccrualEngine<S>,
        catalog: HardwareCatalog,
        electricity_price: f64,
        schedule: ScheduleConfig,
    ) -> (Self, mpsc::Receiver<TickReport>) {
        let engine = Arc::new(engine);
        let (scheduler, report_rx) = TickScheduler::new(engine.clone(), schedule);

        let service = Self {
            engine,
            scheduler,
            catalog,
            electricity_price,
        };

        (service, report_rx)
    }

    pub fn engine(&self) -> &Arc<AccrualEngine<S>> {
        &self.engine
    }

    pub fn scheduler(&self) -> &TickScheduler<S> {
        &self.scheduler
    }

    pub fn catalog(&self) -> &HardwareCatalog {
        &self.catalog
    }

    pub fn electricity_price(&self) -> f64 {
        self.electricity_price
    }

    /// Select a tier from the catalog, replacing any existing unit
    pub fn select_hardware(&self, user: &UserKey, tier: &str) -> std::result::Result<Arc<HardwareProfile>, ServiceError> {
        let profile = self
            .catalog
            .get(tier)
            .ok_or_else(|| ServiceError::UnknownTier(tier.to_string()))?;

        // The replacement unit starts idle
        self.scheduler.cancel(user);
        self.engine.select_hardware(user, profile.clone(), self.electricity_price);
        Ok(profile)
    }

    /// Start mining and begin the user's schedule
    pub fn start_mining(&self, user: &UserKey) -> Result<()> {
        self.engine.start_mining(user)?;
        self.scheduler.schedule(user);
        Ok(())
    }

    /// Stop mining and cancel the user's schedule
    pub fn stop_mining(&self, user: &UserKey) -> Result<()> {
        self.engine.stop_mining(user)?;
        self.scheduler.cancel(user);
        Ok(())
    }

    pub fn collect_coins(&self, user: &UserKey) -> Result<CollectResult> {
        self.engine.collect_coins(user)
    }

    pub fn get_earnings(&self, user: &UserKey) -> Result<f64> {
        self.engine.get_earnings(user)
    }

    pub fn unit_status(&self, user: &UserKey) -> Result<UnitStatus> {
        self.engine.unit_status(user)
    }

    /// Stop every schedule; miners keep their state
    pub async fn shutdown(&self) {
        info!("Shutting down mining service");
        self.scheduler.shutdown().await;
    }
}
