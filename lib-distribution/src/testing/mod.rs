//! In-memory collaborators
//!
//! Used by the test suites and by the CLI's dry-run simulation. The ledger
//! keeps a real balance and refuses transfers it cannot cover, so a run with
//! insufficient funds shows which legs would have bounced.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::amount::UsdAmount;
use crate::clients::{LedgerClient, MintClient, TransferReference};
use crate::errors::{LedgerError, MintError, TransferError};
use crate::registry::AccountAddress;

/// A transfer or mint the in-memory clients accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub destination: AccountAddress,
    pub amount: UsdAmount,
    pub reference: TransferReference,
}

fn next_reference(counter: &AtomicU64, prefix: u8) -> TransferReference {
    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
    TransferReference::new(format!("0x{:02x}{:062x}", prefix, n)).with_block(1_000 + n)
}

/// Settlement-asset ledger held in memory
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    balance: Mutex<u64>,
    balance_error: Mutex<Option<String>>,
    failing_addresses: Mutex<HashSet<AccountAddress>>,
    failing_calls: Mutex<HashMap<usize, String>>,
    delay: Mutex<Option<Duration>>,
    transfers: Mutex<Vec<RecordedCall>>,
    attempts: AtomicUsize,
    balance_queries: AtomicUsize,
    counter: AtomicU64,
}

impl InMemoryLedger {
    pub fn with_balance(balance: UsdAmount) -> Self {
        let ledger = Self::default();
        *lock(&ledger.balance) = balance.micros();
        ledger
    }

    /// Every balance query fails with `message`
    pub fn fail_balance_queries(&self, message: impl Into<String>) {
        *lock(&self.balance_error) = Some(message.into());
    }

    /// Transfers to `address` revert
    pub fn fail_transfers_to(&self, address: AccountAddress) {
        lock(&self.failing_addresses).insert(address);
    }

    /// The `n`th transfer attempt (1-based) reverts with `message`
    pub fn fail_attempt(&self, n: usize, message: impl Into<String>) {
        lock(&self.failing_calls).insert(n, message.into());
    }

    /// Every call sleeps this long before answering
    pub fn set_delay(&self, delay: Duration) {
        *lock(&self.delay) = Some(delay);
    }

    pub fn balance(&self) -> UsdAmount {
        UsdAmount::from_micros(*lock(&self.balance))
    }

    /// Successful transfers in order
    pub fn transfers(&self) -> Vec<RecordedCall> {
        lock(&self.transfers).clone()
    }

    /// Transfer calls received, successful or not
    pub fn transfer_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn balance_queries(&self) -> usize {
        self.balance_queries.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        let delay = *lock(&self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn available_balance(&self) -> Result<UsdAmount, LedgerError> {
        self.balance_queries.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if let Some(message) = lock(&self.balance_error).clone() {
            return Err(LedgerError::new(message));
        }
        Ok(self.balance())
    }

    async fn transfer(
        &self,
        destination: &AccountAddress,
        amount: UsdAmount,
    ) -> Result<TransferReference, TransferError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        self.pause().await;

        if let Some(message) = lock(&self.failing_calls).get(&attempt).cloned() {
            return Err(TransferError::new(message));
        }
        if lock(&self.failing_addresses).contains(destination) {
            return Err(TransferError::new(format!("execution reverted for {}", destination)));
        }

        let reference = {
            let mut balance = lock(&self.balance);
            if *balance < amount.micros() {
                return Err(TransferError::new(format!(
                    "transfer amount {} exceeds balance {}",
                    amount,
                    UsdAmount::from_micros(*balance)
                )));
            }
            *balance -= amount.micros();
            next_reference(&self.counter, 0xa0)
        };

        lock(&self.transfers).push(RecordedCall {
            destination: destination.clone(),
            amount,
            reference: reference.clone(),
        });
        Ok(reference)
    }
}

/// Community token issuer held in memory
#[derive(Debug, Default)]
pub struct InMemoryMint {
    failure: Mutex<Option<String>>,
    mints: Mutex<Vec<RecordedCall>>,
    attempts: AtomicUsize,
    counter: AtomicU64,
}

impl InMemoryMint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every mint fails with `message`
    pub fn fail_with(&self, message: impl Into<String>) {
        *lock(&self.failure) = Some(message.into());
    }

    pub fn mints(&self) -> Vec<RecordedCall> {
        lock(&self.mints).clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MintClient for InMemoryMint {
    async fn mint(
        &self,
        destination: &AccountAddress,
        amount: UsdAmount,
    ) -> Result<TransferReference, MintError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = lock(&self.failure).clone() {
            return Err(MintError::new(message));
        }
        let reference = next_reference(&self.counter, 0xb0);
        lock(&self.mints).push(RecordedCall {
            destination: destination.clone(),
            amount,
            reference: reference.clone(),
        });
        Ok(reference)
    }
}

/// Poisoning only happens if a test panicked mid-call; keep the data
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
