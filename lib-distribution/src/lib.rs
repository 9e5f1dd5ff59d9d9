//! MountainShares Payment Distribution
//!
//! Turns a confirmed fiat payment into treasury transfers and community
//! token issuance.
//!
//! # Pipeline
//!
//! 1. [`calculate_plan`] splits the net amount under a [`FeeSchedule`] into a
//!    reconciled [`DistributionPlan`] (pure, integer micro-dollar math)
//! 2. [`DistributionExecutor`] checks settlement liquidity, sends each leg
//!    through a [`LedgerClient`], mints for the payer through a
//!    [`MintClient`] and returns a [`DistributionResult`]
//! 3. [`IdempotentDistributor`] optionally wraps the executor so a redelivered
//!    provider event never pays out twice
//!
//! # Usage
//!
//! ```ignore
//! use lib_distribution::*;
//!
//! let executor = DistributionExecutor::new(
//!     FeeSchedule::standard(),
//!     registry,
//!     ledger,
//!     minter,
//!     ExecutorConfig::default(),
//! );
//! let payment = PaymentConfirmation::new("1.37".parse()?, "payer@example.com")
//!     .with_wallet("0x...");
//! let result = executor.execute(&payment).await?;
//! if result.status() == RunStatus::Degraded { /* report partial success */ }
//! ```

pub mod amount;
pub mod calculator;
pub mod clients;
pub mod errors;
pub mod executor;
pub mod fee_schedule;
pub mod idempotency;
pub mod outcome;
pub mod registry;
pub mod testing;

pub use amount::UsdAmount;
pub use calculator::{calculate_plan, DistributionPlan, LegKind, PlanLeg};
pub use clients::{LedgerClient, MintClient, TransferReference};
pub use errors::*;
pub use executor::{DistributionExecutor, ExecutorConfig, PaymentConfirmation};
pub use fee_schedule::{FeeSchedule, FeeShare, SchedulePreset};
pub use idempotency::{
    Claim, Delivery, IdempotentDistributor, InMemoryEventStore, ProcessedEventStore,
};
pub use outcome::{
    BalanceCheck, DistributionResult, DistributionSummary, MintOutcome, OutcomeStatus, RunStatus,
    SkipReason, TransferOutcome,
};
pub use registry::{AccountAddress, DestinationKey, DestinationRegistry};
