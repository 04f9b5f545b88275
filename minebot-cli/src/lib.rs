pub mod bot;
pub mod chat;
pub mod commands;
pub mod config;
pub mod logging;
pub mod replies;

// Re-export commonly used types
pub use bot::ChatBot;
pub use chat::{ChatCommand, ChatMessage, CommandParseError};
pub use config::{BotConfig, EconomyConfig, ScheduleSettings};
