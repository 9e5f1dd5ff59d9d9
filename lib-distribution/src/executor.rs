//! Distribution executor
//!
//! Drives one payment event through
//! `Received → BalanceChecked → Distributing → (Minting | Skipped) → Completed`.
//!
//! Only an invalid amount or a schedule that fails reconciliation aborts a
//! run, and both are detected before any collaborator is called. Everything
//! after that is best effort: each balance query, transfer and mint is
//! bounded by `ExecutorConfig::call_timeout` and its error (or timeout) is
//! recorded on the result instead of propagating. There is no retry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::amount::UsdAmount;
use crate::calculator::{calculate_plan, DistributionPlan};
use crate::clients::{LedgerClient, MintClient};
use crate::errors::DistributionError;
use crate::fee_schedule::FeeSchedule;
use crate::outcome::{
    BalanceCheck, DistributionResult, MintOutcome, OutcomeStatus, SkipReason, TransferOutcome,
};
use crate::registry::{AccountAddress, DestinationRegistry};

/// Default bound on each collaborator call
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Verified payment handed over by the payment-provider layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    /// Provider event or charge id, used for de-duplication
    #[serde(default)]
    pub event_id: Option<String>,
    pub net_amount: UsdAmount,
    pub payer_email: String,
    #[serde(default)]
    pub payer_wallet: Option<String>,
}

impl PaymentConfirmation {
    pub fn new(net_amount: UsdAmount, payer_email: impl Into<String>) -> Self {
        Self {
            event_id: None,
            net_amount,
            payer_email: payer_email.into(),
            payer_wallet: None,
        }
    }

    pub fn with_wallet(mut self, wallet: impl Into<String>) -> Self {
        self.payer_wallet = Some(wallet.into());
        self
    }

    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }
}

/// Executor tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// `None` leaves collaborator calls unbounded
    pub call_timeout: Option<Duration>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            call_timeout: Some(DEFAULT_CALL_TIMEOUT),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Received,
    BalanceChecked,
    Distributing,
    Minting,
    MintSkipped,
    Completed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Received => "received",
            RunState::BalanceChecked => "balance_checked",
            RunState::Distributing => "distributing",
            RunState::Minting => "minting",
            RunState::MintSkipped => "mint_skipped",
            RunState::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Executes distribution plans against live collaborators
pub struct DistributionExecutor {
    schedule: FeeSchedule,
    registry: DestinationRegistry,
    ledger: Arc<dyn LedgerClient>,
    minter: Arc<dyn MintClient>,
    config: ExecutorConfig,
    /// Held from the balance check until minting finishes; the ledger signs
    /// every transfer with one identity and nonces must not interleave.
    signer_lock: Mutex<()>,
}

impl DistributionExecutor {
    pub fn new(
        schedule: FeeSchedule,
        registry: DestinationRegistry,
        ledger: Arc<dyn LedgerClient>,
        minter: Arc<dyn MintClient>,
        config: ExecutorConfig,
    ) -> Self {
        let missing = registry.missing_for(&schedule);
        if !missing.is_empty() {
            warn!(
                schedule = %schedule.name,
                missing = ?missing,
                "Destinations without an address will be skipped"
            );
        }

        Self {
            schedule,
            registry,
            ledger,
            minter,
            config,
            signer_lock: Mutex::new(()),
        }
    }

    pub fn schedule(&self) -> &FeeSchedule {
        &self.schedule
    }

    pub fn registry(&self) -> &DestinationRegistry {
        &self.registry
    }

    /// Plan without executing
    pub fn plan(&self, net_amount: UsdAmount) -> Result<DistributionPlan, DistributionError> {
        calculate_plan(net_amount, &self.schedule)
    }

    /// Run one payment event to completion
    ///
    /// # Errors
    ///
    /// Only `InvalidAmount` and `Reconciliation`, both raised before any
    /// collaborator is called. Per-leg failures are recorded on the result.
    pub async fn execute(
        &self,
        payment: &PaymentConfirmation,
    ) -> Result<DistributionResult, DistributionError> {
        info!(
            event_id = payment.event_id.as_deref().unwrap_or("-"),
            amount = %payment.net_amount,
            payer = %payment.payer_email,
            "Processing payment"
        );
        self.trace_state(RunState::Received);

        let plan = self.plan(payment.net_amount).map_err(|e| {
            error!("Rejected payment before distribution: {}", e);
            e
        })?;
        debug!("{}", plan);

        let _signer = self.signer_lock.lock().await;

        let balance_check = self.check_balance(plan.net_amount()).await;
        self.trace_state(RunState::BalanceChecked);

        self.trace_state(RunState::Distributing);
        let transfers = self.distribute(&plan).await;

        let mint = self
            .mint_for_payer(payment.payer_wallet.as_deref(), plan.settlement_amount())
            .await;

        let result = DistributionResult {
            event_id: payment.event_id.clone(),
            timestamp: chrono::Utc::now(),
            schedule: plan.schedule().to_string(),
            net_amount: plan.net_amount(),
            payer_email: payment.payer_email.clone(),
            payer_wallet: payment.payer_wallet.clone(),
            balance_check,
            transfers,
            mint,
        };
        self.trace_state(RunState::Completed);

        let summary = result.summary();
        info!(
            status = %result.status(),
            successful = summary.successful_operations,
            failed = summary.failed_operations,
            skipped = summary.skipped_operations,
            "Distribution finished"
        );

        Ok(result)
    }

    async fn check_balance(&self, required: UsdAmount) -> BalanceCheck {
        match self
            .bounded("balance query", self.ledger.available_balance())
            .await
        {
            Ok(available) if available >= required => {
                debug!(%available, %required, "Settlement balance sufficient");
                BalanceCheck::Sufficient { available }
            }
            Ok(available) => {
                warn!(
                    %available,
                    %required,
                    "Insufficient settlement balance, continuing distribution"
                );
                BalanceCheck::Insufficient { available, required }
            }
            Err(error) => {
                warn!("Could not verify settlement balance, continuing distribution: {}", error);
                BalanceCheck::Unverified { error }
            }
        }
    }

    /// Strictly sequential; one leg's failure never stops the next
    async fn distribute(&self, plan: &DistributionPlan) -> Vec<TransferOutcome> {
        let mut outcomes = Vec::with_capacity(plan.legs().len());

        for leg in plan.legs() {
            let address = self.registry.resolve(&leg.destination).cloned();

            let status = if leg.amount.is_zero() {
                debug!(destination = %leg.destination, "Skipping leg: zero amount");
                OutcomeStatus::Skipped { reason: SkipReason::ZeroAmount }
            } else if let Some(address) = &address {
                match self
                    .bounded("transfer", self.ledger.transfer(address, leg.amount))
                    .await
                {
                    Ok(reference) => {
                        info!(
                            destination = %leg.destination,
                            kind = %leg.kind,
                            amount = %leg.amount,
                            reference = %reference,
                            "Transfer confirmed"
                        );
                        OutcomeStatus::Succeeded { reference }
                    }
                    Err(error) => {
                        error!(
                            destination = %leg.destination,
                            amount = %leg.amount,
                            "Transfer failed: {}",
                            error
                        );
                        OutcomeStatus::Failed { error }
                    }
                }
            } else {
                warn!(destination = %leg.destination, amount = %leg.amount, "Skipping leg: no address configured");
                OutcomeStatus::Skipped { reason: SkipReason::MissingDestination }
            };

            outcomes.push(TransferOutcome {
                kind: leg.kind,
                destination: leg.destination.clone(),
                address,
                amount: leg.amount,
                status,
            });
        }

        outcomes
    }

    async fn mint_for_payer(&self, wallet: Option<&str>, settlement: UsdAmount) -> MintOutcome {
        let Some(raw_wallet) = wallet else {
            self.trace_state(RunState::MintSkipped);
            debug!("No payer wallet, skipping mint");
            return MintOutcome {
                address: None,
                amount: settlement,
                status: OutcomeStatus::Skipped { reason: SkipReason::NoDestination },
            };
        };

        let address = match AccountAddress::parse(raw_wallet) {
            Ok(address) => address,
            Err(e) => {
                self.trace_state(RunState::MintSkipped);
                error!("Cannot mint to payer wallet: {}", e);
                return MintOutcome {
                    address: None,
                    amount: settlement,
                    status: OutcomeStatus::Failed {
                        error: format!("Invalid payer wallet: {}", e),
                    },
                };
            }
        };

        if settlement.is_zero() {
            self.trace_state(RunState::MintSkipped);
            return MintOutcome {
                address: Some(address),
                amount: settlement,
                status: OutcomeStatus::Skipped { reason: SkipReason::ZeroAmount },
            };
        }

        self.trace_state(RunState::Minting);
        let status = match self
            .bounded("mint", self.minter.mint(&address, settlement))
            .await
        {
            Ok(reference) => {
                info!(wallet = %address, amount = %settlement, reference = %reference, "Community tokens minted");
                OutcomeStatus::Succeeded { reference }
            }
            Err(error) => {
                error!(wallet = %address, amount = %settlement, "Mint failed: {}", error);
                OutcomeStatus::Failed { error }
            }
        };

        MintOutcome {
            address: Some(address),
            amount: settlement,
            status,
        }
    }

    /// Apply the configured timeout and flatten the error to its message
    async fn bounded<T, E, F>(&self, operation: &str, call: F) -> Result<T, String>
    where
        E: fmt::Display,
        F: Future<Output = Result<T, E>>,
    {
        match self.config.call_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(_) => Err(format!("{} timed out after {}ms", operation, limit.as_millis())),
            },
            None => call.await.map_err(|e| e.to_string()),
        }
    }

    fn trace_state(&self, state: RunState) {
        debug!(schedule = %self.schedule.name, state = %state, "Distribution state");
    }
}

impl fmt::Debug for DistributionExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistributionExecutor")
            .field("schedule", &self.schedule.name)
            .field("destinations", &self.registry.len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::LegKind;
    use crate::testing::{InMemoryLedger, InMemoryMint};

    #[test]
    fn test_payment_confirmation_from_provider_json() {
        let json = r#"{"event_id": "ch_1", "net_amount": 1.4, "payer_email": "a@b.c"}"#;
        let payment: PaymentConfirmation = serde_json::from_str(json).unwrap();
        assert_eq!(payment.net_amount.micros(), 1_400_000);
        assert_eq!(payment.payer_wallet, None);
    }

    #[test]
    fn test_default_timeout_is_bounded() {
        assert_eq!(ExecutorConfig::default().call_timeout, Some(DEFAULT_CALL_TIMEOUT));
    }

    #[tokio::test]
    async fn test_invalid_amount_touches_nothing() {
        let ledger = Arc::new(InMemoryLedger::with_balance(UsdAmount::from_micros(10)));
        let mint = Arc::new(InMemoryMint::new());
        let executor = DistributionExecutor::new(
            FeeSchedule::standard(),
            DestinationRegistry::new(),
            ledger.clone(),
            mint.clone(),
            ExecutorConfig::default(),
        );

        let payment = PaymentConfirmation::new(UsdAmount::ZERO, "a@b.c");
        assert!(matches!(
            executor.execute(&payment).await,
            Err(DistributionError::InvalidAmount(_))
        ));
        assert_eq!(ledger.balance_queries(), 0);
        assert!(ledger.transfers().is_empty());
        assert!(mint.mints().is_empty());
    }

    #[tokio::test]
    async fn test_zero_settlement_skips_mint() {
        let ledger = Arc::new(InMemoryLedger::with_balance(UsdAmount::from_micros(10_000_000)));
        let mint = Arc::new(InMemoryMint::new());
        let executor = DistributionExecutor::new(
            FeeSchedule::net_split(),
            DestinationRegistry::new(),
            ledger,
            mint.clone(),
            ExecutorConfig::default(),
        );

        let payment = PaymentConfirmation::new("1.00".parse().unwrap(), "a@b.c")
            .with_wallet("0x2222222222222222222222222222222222222222");
        let result = executor.execute(&payment).await.unwrap();

        assert_eq!(result.mint.status, OutcomeStatus::Skipped { reason: SkipReason::ZeroAmount });
        assert!(mint.mints().is_empty());
        assert_eq!(result.transfers[0].kind, LegKind::Settlement);
    }
}
