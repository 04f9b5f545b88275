//! Chat command surface.
//!
//! Every inbound line carries the sender's user id followed by a slash
//! command, e.g. `1001 /mine`. Bot-name suffixes (`/mine@MineBot`) are
//! accepted and ignored.

use std::str::FromStr;
use thiserror::Error;

use minebot_core::UserKey;

/// Command parse errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("empty message")]
    Empty,

    #[error("missing command after user id")]
    MissingCommand,

    #[error("not a command: {0}")]
    NotACommand(String),
}

/// A command sent by a chat user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Welcome message with the tier menu
    Start,

    /// Select a hardware tier by key
    SelectTier(String),

    Mine,
    Collect,
    Stop,
    Earnings,
    Status,
    Help,
}

impl FromStr for ChatCommand {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let word = s.trim();
        let name = word
            .strip_prefix('/')
            .ok_or_else(|| CommandParseError::NotACommand(word.to_string()))?;
        let name = name.split('@').next().unwrap_or_default().to_lowercase();

        let command = match name.as_str() {
            "" => return Err(CommandParseError::NotACommand(word.to_string())),
            "start" => ChatCommand::Start,
            "mine" => ChatCommand::Mine,
            "collect" => ChatCommand::Collect,
            "stop" => ChatCommand::Stop,
            "earnings" => ChatCommand::Earnings,
            "status" => ChatCommand::Status,
            "help" => ChatCommand::Help,
            tier => ChatCommand::SelectTier(tier.to_string()),
        };

        Ok(command)
    }
}

/// One inbound chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub user: UserKey,
    pub command: ChatCommand,
}

impl FromStr for ChatMessage {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let user = parts.next().ok_or(CommandParseError::Empty)?;
        let command = parts.next().ok_or(CommandParseError::MissingCommand)?;

        Ok(Self {
            user: UserKey::from(user),
            command: command.parse()?,
        })
    }
}
