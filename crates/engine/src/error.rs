//! The module contains the errors the engine and its stores can throw.
//!
//! The errors split into two layers:
//!
//! - [`StoreError`] is what the balance/transaction stores report. The
//!   engine must be able to tell "no such account" apart from "store
//!   unavailable", so they are distinct variants.
//! - [`EngineError`] is the outcome classification callers branch on:
//!   validation failures, insufficient funds, or an internal database
//!   failure.
use sea_orm::DbErr;
use thiserror::Error;

/// Failures reported by the balance and transaction stores.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No account row exists for the requested user id.
    #[error("this user doesn't exist")]
    AccountNotFound,
    /// The store-side balance guard rejected the write; the engine's
    /// pre-check went stale under a concurrent writer.
    #[error("you don't have enough funds")]
    InsufficientFunds,
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Engine custom errors.
///
/// The first three variants are validation failures (the request was
/// malformed), [`InsufficientFunds`] is a well-formed request blocked by
/// the balance rule, and [`Database`] is an internal failure.
///
/// [`InsufficientFunds`]: EngineError::InsufficientFunds
/// [`Database`]: EngineError::Database
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{0}")]
    InvalidAmount(String),
    #[error("{0}")]
    InvalidUser(String),
    #[error("wrong sort param \"{0}\"")]
    WrongSortParam(String),
    #[error("{0}")]
    InsufficientFunds(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Returns `true` when the error is the caller's fault.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount(_) | Self::InvalidUser(_) | Self::WrongSortParam(_)
        )
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AccountNotFound => Self::InvalidUser(err.to_string()),
            StoreError::InsufficientFunds => Self::InsufficientFunds(err.to_string()),
            StoreError::Database(db_err) => Self::Database(db_err),
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidUser(a), Self::InvalidUser(b)) => a == b,
            (Self::WrongSortParam(a), Self::WrongSortParam(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
