use thiserror::Error;

use crate::store::UserKey;

/// Accrual engine error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("No mining hardware selected for user {0}")]
    NoUnit(UserKey),

    #[error("Mining is already in progress for user {0}")]
    AlreadyMining(UserKey),

    #[error("Mining is not in progress for user {0}")]
    NotMining(UserKey),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised by the mining service on top of the engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Unknown hardware tier: {0}")]
    UnknownTier(String),
}
