//! Distribution Errors
//!
//! Only [`DistributionError`] ever escapes `DistributionExecutor::execute`.
//! Collaborator errors ([`LedgerError`], [`TransferError`], [`MintError`]) are
//! caught at the leg boundary and recorded as outcomes.

use thiserror::Error;

use crate::amount::UsdAmount;

/// Fatal error for a whole payment event
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DistributionError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Reconciliation failed: {0}")]
    Reconciliation(#[from] ReconciliationError),
}

/// Fee schedule configuration bug detected before any transfer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationError {
    #[error("Schedule '{schedule}': processing sub-shares sum to {total_bps} bp, expected 10000")]
    SharesIncomplete { schedule: String, total_bps: u32 },

    #[error("Schedule '{schedule}': processing fee is non-zero but has no sub-shares")]
    EmptyShares { schedule: String },

    #[error("Schedule '{schedule}': fee rates sum to {total_bps} bp, exceeding 10000")]
    RatesExceedWhole { schedule: String, total_bps: u32 },

    #[error("Distributed {distributed} does not reconstruct net amount {expected}")]
    TotalMismatch {
        expected: UsdAmount,
        distributed: UsdAmount,
    },

    #[error("Arithmetic overflow while summing legs")]
    Overflow,
}

/// Balance query failure reported by a [`crate::LedgerClient`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Balance query failed: {message}")]
pub struct LedgerError {
    pub message: String,
}

impl LedgerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Settlement-asset transfer failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Transfer failed: {message}")]
pub struct TransferError {
    pub message: String,
}

impl TransferError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Community token issuance failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Mint failed: {message}")]
pub struct MintError {
    pub message: String,
}

impl MintError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Account address rejected at parse time
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Address is empty")]
    Empty,

    #[error("Address '{0}' must start with 0x")]
    MissingPrefix(String),

    #[error("Address '{address}' has {len} hex digits, expected 40")]
    WrongLength { address: String, len: usize },

    #[error("Address '{0}' contains non-hex characters")]
    NotHex(String),
}

/// Processed-event store failure in the delivery de-duplication layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdempotencyError {
    #[error("Event store error: {0}")]
    Store(String),

    #[error("Event '{0}' was never claimed")]
    NotClaimed(String),
}

/// Failure of a de-duplicated delivery
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error(transparent)]
    Distribution(#[from] DistributionError),

    #[error(transparent)]
    Idempotency(#[from] IdempotencyError),
}
