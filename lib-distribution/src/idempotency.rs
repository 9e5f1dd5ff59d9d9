//! Delivery de-duplication
//!
//! The executor is stateless per call, so a payment provider that redelivers
//! a webhook would pay every treasury twice. [`IdempotentDistributor`] sits in
//! front of the executor and claims the provider event id in a
//! [`ProcessedEventStore`] before anything moves:
//!
//! - first delivery: claim succeeds, the event is executed and its result stored
//! - redelivery after completion: the stored result is returned, nothing runs
//! - redelivery while the first is still running: reported as in flight
//!
//! A run rejected before distribution (bad amount, bad schedule) releases its
//! claim, since nothing was paid out and a later redelivery may succeed.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::errors::{DeliveryError, IdempotencyError};
use crate::executor::{DistributionExecutor, PaymentConfirmation};
use crate::outcome::DistributionResult;

/// State of an event id in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// The caller now owns the event and must complete or release it
    Claimed,
    /// Another delivery owns the event and has not finished
    InFlight,
    /// The event already ran
    Completed(Box<DistributionResult>),
}

/// Persistence for processed provider events
#[async_trait]
pub trait ProcessedEventStore: Send + Sync {
    /// Atomically claim `event_id` unless it is already known
    async fn claim(&self, event_id: &str) -> Result<Claim, IdempotencyError>;

    /// Record the result of a claimed event
    async fn complete(&self, event_id: &str, result: &DistributionResult) -> Result<(), IdempotencyError>;

    /// Drop a claim so the event can be delivered again
    async fn release(&self, event_id: &str) -> Result<(), IdempotencyError>;
}

#[derive(Debug, Clone)]
enum EventState {
    InFlight,
    Completed(Box<DistributionResult>),
}

/// Process-local store; forgets everything on restart.
///
/// Limits:
/// - entries are never evicted, so memory grows with every distinct event id
/// - an event whose `complete` failed stays `InFlight` until the process
///   restarts; redeliveries of it are reported as in flight and never re-run
///
/// [`InMemoryEventStore::forget`] clears a stuck entry by hand. Long-running
/// services should back [`ProcessedEventStore`] with durable, expiring storage.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: Mutex<HashMap<String, EventState>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.events.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.lock().await.is_empty()
    }

    /// Drop an event regardless of its state, e.g. to clear a stuck claim
    pub async fn forget(&self, event_id: &str) -> bool {
        self.events.lock().await.remove(event_id).is_some()
    }
}

#[async_trait]
impl ProcessedEventStore for InMemoryEventStore {
    async fn claim(&self, event_id: &str) -> Result<Claim, IdempotencyError> {
        let mut events = self.events.lock().await;
        match events.get(event_id) {
            Some(EventState::InFlight) => Ok(Claim::InFlight),
            Some(EventState::Completed(result)) => Ok(Claim::Completed(result.clone())),
            None => {
                events.insert(event_id.to_string(), EventState::InFlight);
                Ok(Claim::Claimed)
            }
        }
    }

    async fn complete(&self, event_id: &str, result: &DistributionResult) -> Result<(), IdempotencyError> {
        let mut events = self.events.lock().await;
        match events.get_mut(event_id) {
            Some(state) => {
                *state = EventState::Completed(Box::new(result.clone()));
                Ok(())
            }
            None => Err(IdempotencyError::NotClaimed(event_id.to_string())),
        }
    }

    async fn release(&self, event_id: &str) -> Result<(), IdempotencyError> {
        self.events.lock().await.remove(event_id);
        Ok(())
    }
}

/// What happened to one delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Executed(DistributionResult),
    Duplicate(DistributionResult),
    InFlight,
}

impl Delivery {
    /// The result this delivery produced or replayed
    pub fn result(&self) -> Option<&DistributionResult> {
        match self {
            Delivery::Executed(result) | Delivery::Duplicate(result) => Some(result),
            Delivery::InFlight => None,
        }
    }
}

/// Executor wrapper that runs each provider event at most once
pub struct IdempotentDistributor {
    executor: Arc<DistributionExecutor>,
    store: Arc<dyn ProcessedEventStore>,
}

impl IdempotentDistributor {
    pub fn new(executor: Arc<DistributionExecutor>, store: Arc<dyn ProcessedEventStore>) -> Self {
        Self { executor, store }
    }

    pub fn executor(&self) -> &DistributionExecutor {
        &self.executor
    }

    pub async fn deliver(&self, payment: &PaymentConfirmation) -> Result<Delivery, DeliveryError> {
        let Some(event_id) = payment.event_id.as_deref() else {
            warn!("Payment has no event id; executing without de-duplication");
            return Ok(Delivery::Executed(self.executor.execute(payment).await?));
        };

        match self.store.claim(event_id).await? {
            Claim::Completed(previous) => {
                info!(event_id, "Duplicate delivery, returning recorded result");
                return Ok(Delivery::Duplicate(*previous));
            }
            Claim::InFlight => {
                warn!(event_id, "Delivery already in flight, ignoring");
                return Ok(Delivery::InFlight);
            }
            Claim::Claimed => {}
        }

        let result = match self.executor.execute(payment).await {
            Ok(result) => result,
            Err(e) => {
                if let Err(release_err) = self.store.release(event_id).await {
                    error!(event_id, "Failed to release claim: {}", release_err);
                }
                return Err(e.into());
            }
        };

        // Funds have moved; a store failure here must not turn into a retry
        if let Err(e) = self.store.complete(event_id, &result).await {
            error!(event_id, "Failed to record completed event, claim left in flight: {}", e);
        }

        Ok(Delivery::Executed(result))
    }
}
