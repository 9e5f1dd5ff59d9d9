//! Collaborator interfaces
//!
//! The executor only talks to the chain through these traits. Implementations
//! are built by the caller's bootstrap code from explicit configuration and
//! injected as `Arc<dyn ...>`; see [`crate::testing`] for in-memory versions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::amount::UsdAmount;
use crate::errors::{LedgerError, MintError, TransferError};
use crate::registry::AccountAddress;

/// Opaque handle to a submitted on-chain operation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferReference {
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
}

impl TransferReference {
    pub fn new(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            block_number: None,
        }
    }

    pub fn with_block(mut self, block_number: u64) -> Self {
        self.block_number = Some(block_number);
        self
    }
}

impl fmt::Display for TransferReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.block_number {
            Some(block) => write!(f, "{} (block {})", self.hash, block),
            None => f.write_str(&self.hash),
        }
    }
}

/// Settlement-asset account held by the distribution signer
///
/// Implementations sign every transfer with one identity, so calls against a
/// single client must not interleave.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Spendable settlement-asset balance of the signer
    async fn available_balance(&self) -> Result<UsdAmount, LedgerError>;

    /// Send `amount` of the settlement asset to `destination`
    async fn transfer(
        &self,
        destination: &AccountAddress,
        amount: UsdAmount,
    ) -> Result<TransferReference, TransferError>;
}

/// Issuer of the community token
#[async_trait]
pub trait MintClient: Send + Sync {
    /// Mint tokens worth `amount` USD (1 token per dollar) to `destination`
    async fn mint(
        &self,
        destination: &AccountAddress,
        amount: UsdAmount,
    ) -> Result<TransferReference, MintError>;
}
