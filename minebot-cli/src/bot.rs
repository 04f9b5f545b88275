use anyhow::Result;
use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use minebot_core::{EngineError, MiningService, ServiceError, TickReport, UnitStore, UserKey};

use crate::chat::{ChatCommand, ChatMessage};
use crate::replies;

/// Chat front end for the mining service
pub struct ChatBot<S: UnitStore + 'static> {
    service: MiningService<S>,
}

impl<S: UnitStore + 'static> ChatBot<S> {
    pub fn new(service: MiningService<S>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &MiningService<S> {
        &self.service
    }

    /// Handle one command and return the reply text
    pub fn handle(&self, message: &ChatMessage) -> String {
        let user = &message.user;
        debug!("User {} sent {:?}", user, message.command);

        match &message.command {
            ChatCommand::Start | ChatCommand::Help => replies::welcome(self.service.catalog()),
            ChatCommand::SelectTier(tier) => match self.service.select_hardware(user, tier) {
                Ok(profile) => replies::hardware_selected(&profile.name),
                Err(ServiceError::UnknownTier(_)) => replies::unknown_command(self.service.catalog()),
                Err(ServiceError::Engine(e)) => self.engine_error(e),
            },
            ChatCommand::Mine => match self.service.start_mining(user) {
                Ok(()) => replies::mining_started(self.service.scheduler().config().simulated_seconds_per_tick),
                Err(e) => self.engine_error(e),
            },
            ChatCommand::Collect => self.collect(user),
            ChatCommand::Stop => match self.service.stop_mining(user) {
                Ok(()) => replies::mining_stopped(),
                Err(EngineError::NoUnit(_)) | Err(EngineError::NotMining(_)) => replies::no_mining(),
                Err(e) => self.engine_error(e),
            },
            ChatCommand::Earnings => match self.service.get_earnings(user) {
                Ok(earnings) => replies::earnings(earnings),
                Err(e) => self.engine_error(e),
            },
            ChatCommand::Status => match self.service.unit_status(user) {
                Ok(status) => replies::status(&status),
                Err(e) => self.engine_error(e),
            },
        }
    }

    fn collect(&self, user: &UserKey) -> String {
        let status = match self.service.unit_status(user) {
            Ok(status) => status,
            Err(e) => return self.engine_error(e),
        };

        if status.auto_collect {
            return replies::auto_collect_only(&status.hardware);
        }

        match self.service.collect_coins(user) {
            Ok(result) => replies::collected(&status.hardware, result.collected_coins, result.earnings),
            Err(e) => self.engine_error(e),
        }
    }

    fn engine_error(&self, error: EngineError) -> String {
        match error {
            EngineError::NoUnit(_) => replies::select_hardware_first(self.service.catalog()),
            EngineError::AlreadyMining(_) => replies::already_mining(),
            EngineError::NotMining(_) => replies::no_mining(),
        }
    }

    /// Serve chat lines from `reader` and scheduler reports until the input
    /// ends or `shutdown` completes, writing replies to `writer`
    pub async fn run<R, W, F>(
        &self,
        reader: R,
        mut writer: W,
        mut reports: mpsc::Receiver<TickReport>,
        shutdown: F,
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        F: Future<Output = ()>,
    {
        let mut lines = reader.lines();
        tokio::pin!(shutdown);

        info!("Mining bot is running");
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        info!("Chat input closed");
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }

                    match line.parse::<ChatMessage>() {
                        Ok(message) => {
                            let reply = self.handle(&message);
                            write_reply(&mut writer, &message.user, &reply).await?;
                        }
                        Err(e) => warn!("Ignoring message {:?}: {}", line, e),
                    }
                }
                Some(report) = reports.recv() => {
                    if let Some(text) = replies::tick(&report) {
                        write_reply(&mut writer, &report.user, &text).await?;
                    }
                }
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
            }
        }

        // Unblock schedules waiting on a full report channel
        drop(reports);
        self.service.shutdown().await;
        writer.flush().await?;
        Ok(())
    }
}

async fn write_reply<W: AsyncWrite + Unpin>(writer: &mut W, user: &UserKey, text: &str) -> Result<()> {
    writer.write_all(format!("[{}] {}\n", user, text).as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
