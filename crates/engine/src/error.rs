//! The module contains the errors the engine can throw.
//!
//! Partial funding is not an error: a campaign funded for fewer recipients
//! than requested is a successful outcome and is reported through
//! [`FundingOutcome`].
//!
//! [`FundingOutcome`]: crate::FundingOutcome
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Balance changed concurrently: {0}")]
    BalanceConflict(String),
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidArgument(a), Self::InvalidArgument(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InsufficientBalance(a), Self::InsufficientBalance(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::BalanceConflict(a), Self::BalanceConflict(b)) => a == b,
            (Self::InvalidCursor(a), Self::InvalidCursor(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
