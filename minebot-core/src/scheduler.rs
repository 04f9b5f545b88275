//! Recurring time advances for actively mining users.
//!
//! The engine never keeps timers. Once a user starts mining, the scheduler
//! spawns one task for that user which advances a fixed amount of simulated
//! time on every tick and reports the outcome on a channel. The task exits
//! when it is cancelled, when the unit is no longer mining, or when nobody
//! is listening for reports any more.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::engine::{AccrualEngine, AdvanceResult};
use crate::store::{UnitStore, UserKey};

/// Configuration for the tick scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Real time between ticks
    #[serde(default = "default_tick_interval")]
    pub tick_interval: Duration,

    /// Simulated seconds mined on every tick
    #[serde(default = "default_simulated_seconds_per_tick")]
    pub simulated_seconds_per_tick: f64,

    /// Buffer size of the report channel
    #[serde(default = "default_report_buffer")]
    pub report_buffer: usize,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            tick_interval: default_tick_interval(),
            simulated_seconds_per_tick: default_simulated_seconds_per_tick(),
            report_buffer: default_report_buffer(),
        }
    }
}

// Four simulated hours every four real minutes
fn default_tick_interval() -> Duration { Duration::from_secs(4 * 60) }
fn default_simulated_seconds_per_tick() -> f64 { 4.0 * 3600.0 }
fn default_report_buffer() -> usize { 256 }

/// Outcome of one scheduled tick, for the chat layer to render
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub user: UserKey,

    /// Display name of the user's hardware
    pub hardware: String,

    pub result: AdvanceResult,

    /// Earnings after the tick
    pub earnings: f64,
}

struct ScheduledTask {
    id: u64,
    shutdown_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

type TaskMap = Arc<Mutex<HashMap<UserKey, ScheduledTask>>>;

/// One timer task per actively mining user
pub struct TickScheduler<S: UnitStore + 'static> {
    engine: Arc<AccrualEngine<S>>,
    config: ScheduleConfig,
    tasks: TaskMap,
    next_id: Mutex<u64>,
    report_tx: mpsc::Sender<TickReport>,
}

impl<S: UnitStore + 'static> TickScheduler<S> {
    /// Create a scheduler and the receiving end of its report channel
    pub fn new(engine: Arc<AccrualEngine<S>>, config: ScheduleConfig) -> (Self, mpsc::Receiver<TickReport>) {
        let (report_tx, report_rx) = mpsc::channel(config.report_buffer.max(1));

        let scheduler = Self {
            engine,
            config,
            tasks: Arc::new(Mutex::new(HashMap::new())),
            next_id: Mutex::new(0),
            report_tx,
        };

        (scheduler, report_rx)
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    /// Start ticking for `user`. Returns false if a schedule already exists.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, user: &UserKey) -> bool {
        let mut tasks = self.tasks.lock();
        if tasks.contains_key(user) {
            debug!("User {} already has a mining schedule", user);
            return false;
        }

        let id = {
            let mut next_id = self.next_id.lock();
            *next_id += 1;
            *next_id
        };

        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let handle = tokio::spawn(Self::tick_loop(
            id,
            user.clone(),
            self.engine.clone(),
            self.config.clone(),
            self.report_tx.clone(),
            shutdown_rx,
            self.tasks.clone(),
        ));

        tasks.insert(user.clone(), ScheduledTask { id, shutdown_tx, handle });
        info!(
            "Scheduled {}s of mining every {:?} for user {}",
            self.config.simulated_seconds_per_tick, self.config.tick_interval, user
        );
        true
    }

    /// Cancel the schedule for `user`. Returns false if there was none.
    pub fn cancel(&self, user: &UserKey) -> bool {
        let task = self.tasks.lock().remove(user);
        match task {
            Some(task) => {
                // Task may already be exiting on its own
                let _ = task.shutdown_tx.try_send(());
                info!("Cancelled mining schedule for user {}", user);
                true
            }
            None => false,
        }
    }

    pub fn is_scheduled(&self, user: &UserKey) -> bool {
        self.tasks.lock().contains_key(user)
    }

    pub fn scheduled_count(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Cancel every schedule and wait for the tasks to finish.
    ///
    /// Tasks are aborted as well as signalled, so a task blocked on a full
    /// report channel cannot hold shutdown up.
    pub async fn shutdown(&self) {
        let tasks: Vec<(UserKey, ScheduledTask)> = self.tasks.lock().drain().collect();
        if tasks.is_empty() {
            return;
        }

        info!("Stopping {} mining schedule(s)", tasks.len());
        for (user, task) in tasks {
            let _ = task.shutdown_tx.try_send(());
            task.handle.abort();
            match task.handle.await {
                Err(e) if !e.is_cancelled() => error!("Mining schedule for user {} failed: {}", user, e),
                _ => {}
            }
        }
    }

    async fn tick_loop(
        id: u64,
        user: UserKey,
        engine: Arc<AccrualEngine<S>>,
        config: ScheduleConfig,
        report_tx: mpsc::Sender<TickReport>,
        mut shutdown_rx: mpsc::Receiver<()>,
        tasks: TaskMap,
    ) {
        let mut interval = interval_at(Instant::now() + config.tick_interval, config.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    debug!("Mining schedule for user {} received shutdown", user);
                    break;
                }
                _ = interval.tick() => {}
            }

            match engine.is_mining(&user) {
                Ok(true) => {}
                Ok(false) => {
                    debug!("User {} is no longer mining, ending schedule", user);
                    break;
                }
                Err(e) => {
                    debug!("Ending schedule: {}", e);
                    break;
                }
            }

            let result = match engine.advance_time(&user, config.simulated_seconds_per_tick) {
                Ok(result) => result,
                Err(e) => {
                    error!("Failed to advance time: {}", e);
                    break;
                }
            };

            let status = match engine.unit_status(&user) {
                Ok(status) => status,
                Err(e) => {
                    error!("Failed to read miner status: {}", e);
                    break;
                }
            };

            let report = TickReport {
                user: user.clone(),
                hardware: status.hardware,
                result,
                earnings: status.earnings,
            };

            if report_tx.send(report).await.is_err() {
                debug!("Report channel closed, ending schedule for user {}", user);
                break;
            }
        }

        // Only remove our own entry; the user may have been rescheduled
        let mut tasks = tasks.lock();
        if tasks.get(&user).map(|task| task.id) == Some(id) {
            tasks.remove(&user);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::HardwareProfile;

    fn setup(profile: HardwareProfile) -> (Arc<AccrualEngine>, TickScheduler<crate::store::MemoryUnitStore>, mpsc::Receiver<TickReport>, UserKey) {
        let engine = Arc::new(AccrualEngine::default());
        let user = UserKey::from("alice");
        engine.select_hardware(&user, Arc::new(profile), 0.15);
        engine.start_mining(&user).unwrap();

        let (scheduler, rx) = TickScheduler::new(engine.clone(), ScheduleConfig::default());
        (engine, scheduler, rx, user)
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_report_auto_collection() {
        let (_engine, scheduler, mut rx, user) = setup(HardwareProfile::premium());
        assert!(scheduler.schedule(&user));
        assert!(!scheduler.schedule(&user));

        let first = rx.recv().await.unwrap();
        assert_eq!(first.user, user);
        assert_eq!(first.hardware, "Premium");
        assert_eq!(first.result.coins_found, 14);
        assert!(first.result.auto_collected);
        assert_eq!(first.result.collected_coins, 14);
        assert!((first.earnings + 0.30).abs() < 1e-9);

        let second = rx.recv().await.unwrap();
        assert!((second.earnings + 0.60).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_tick_before_interval() {
        let (_engine, scheduler, mut rx, user) = setup(HardwareProfile::basic());
        scheduler.schedule(&user);

        let early = tokio::time::timeout(Duration::from_secs(239), rx.recv()).await;
        assert!(early.is_err());

        let report = rx.recv().await.unwrap();
        assert!(report.result.collection_due);
        assert_eq!(report.result.coins_found, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_reports() {
        let (engine, scheduler, mut rx, user) = setup(HardwareProfile::premium());
        scheduler.schedule(&user);
        rx.recv().await.unwrap();

        assert!(scheduler.cancel(&user));
        assert!(!scheduler.cancel(&user));
        assert!(!scheduler.is_scheduled(&user));

        let late = tokio::time::timeout(Duration::from_secs(3600), rx.recv()).await;
        assert!(late.is_err());

        // Still mining as far as the engine knows; only the schedule is gone
        assert_eq!(engine.is_mining(&user), Ok(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_ends_when_mining_stops() {
        let (engine, scheduler, mut rx, user) = setup(HardwareProfile::premium());
        scheduler.schedule(&user);
        engine.stop_mining(&user).unwrap();

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert!(!scheduler.is_scheduled(&user));
        assert!(rx.try_recv().is_err());
        assert_eq!(engine.get_earnings(&user), Ok(0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_drains_tasks() {
        let (_engine, scheduler, _rx, user) = setup(HardwareProfile::premium());
        scheduler.schedule(&user);
        assert_eq!(scheduler.scheduled_count(), 1);

        scheduler.shutdown().await;
        assert_eq!(scheduler.scheduled_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_with_full_report_channel() {
        let engine = Arc::new(AccrualEngine::default());
        let user = UserKey::from("alice");
        engine.select_hardware(&user, Arc::new(HardwareProfile::premium()), 0.15);
        engine.start_mining(&user).unwrap();

        let config = ScheduleConfig {
            report_buffer: 1,
            ..Default::default()
        };
        let (scheduler, mut rx) = TickScheduler::new(engine.clone(), config);
        scheduler.schedule(&user);

        // First report fills the buffer, the second tick blocks on send
        tokio::time::sleep(Duration::from_secs(3 * 240)).await;
        assert_eq!(engine.unit_status(&user).unwrap().lifetime_coins, 28);

        let stopped = tokio::time::timeout(Duration::from_secs(60), scheduler.shutdown()).await;
        assert!(stopped.is_ok());
        assert_eq!(scheduler.scheduled_count(), 0);

        // The blocked second report was dropped with its task
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }
}
