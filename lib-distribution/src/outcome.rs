//! Execution records
//!
//! Everything the executor learns about a run ends up in a
//! [`DistributionResult`]: the balance precondition, one [`TransferOutcome`]
//! per plan leg and a [`MintOutcome`]. Records are immutable once built and
//! serialize to JSON for the caller to log or persist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::amount::UsdAmount;
use crate::calculator::LegKind;
use crate::clients::TransferReference;
use crate::registry::{AccountAddress, DestinationKey};

/// Why a leg or mint was not attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Computed amount rounded to zero
    ZeroAmount,
    /// Destination key has no configured address
    MissingDestination,
    /// No payer wallet was supplied, so there is nothing to mint to
    NoDestination,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::ZeroAmount => "zero amount",
            SkipReason::MissingDestination => "missing destination address",
            SkipReason::NoDestination => "no payer wallet address",
        };
        f.write_str(text)
    }
}

/// Result of one external call, or the reason it was not made
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Succeeded { reference: TransferReference },
    Failed { error: String },
    Skipped { reason: SkipReason },
}

impl OutcomeStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, OutcomeStatus::Succeeded { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, OutcomeStatus::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, OutcomeStatus::Skipped { .. })
    }

    pub fn reference(&self) -> Option<&TransferReference> {
        match self {
            OutcomeStatus::Succeeded { reference } => Some(reference),
            _ => None,
        }
    }
}

/// One distribution leg
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub kind: LegKind,
    pub destination: DestinationKey,
    pub address: Option<AccountAddress>,
    pub amount: UsdAmount,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

/// Community token issuance for the payer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintOutcome {
    pub address: Option<AccountAddress>,
    pub amount: UsdAmount,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

/// Settlement-asset liquidity check made before distributing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum BalanceCheck {
    Sufficient { available: UsdAmount },
    Insufficient { available: UsdAmount, required: UsdAmount },
    /// The balance query itself failed or timed out
    Unverified { error: String },
}

impl BalanceCheck {
    pub fn is_sufficient(&self) -> bool {
        matches!(self, BalanceCheck::Sufficient { .. })
    }
}

/// Overall verdict a webhook layer reports upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Balance verified, every funded leg resolved, no transfer or mint failed
    Completed,
    /// Unmet or unverified balance, an unconfigured destination, or a failure
    Degraded,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Completed => f.write_str("completed"),
            RunStatus::Degraded => f.write_str("degraded"),
        }
    }
}

/// Operation counts for storage alongside the provider charge id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub total_operations: usize,
    pub successful_operations: usize,
    pub failed_operations: usize,
    pub skipped_operations: usize,
}

/// Aggregate record of one payment event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub schedule: String,
    pub net_amount: UsdAmount,
    pub payer_email: String,
    pub payer_wallet: Option<String>,
    pub balance_check: BalanceCheck,
    pub transfers: Vec<TransferOutcome>,
    pub mint: MintOutcome,
}

impl DistributionResult {
    /// Transfers plus the mint, each counted once
    pub fn summary(&self) -> DistributionSummary {
        let statuses = self
            .transfers
            .iter()
            .map(|t| &t.status)
            .chain(std::iter::once(&self.mint.status));

        let mut summary = DistributionSummary::default();
        for status in statuses {
            summary.total_operations += 1;
            match status {
                OutcomeStatus::Succeeded { .. } => summary.successful_operations += 1,
                OutcomeStatus::Failed { .. } => summary.failed_operations += 1,
                OutcomeStatus::Skipped { .. } => summary.skipped_operations += 1,
            }
        }
        summary
    }

    /// True when the balance precondition was not confirmed
    pub fn insufficient_balance(&self) -> bool {
        !self.balance_check.is_sufficient()
    }

    pub fn has_failures(&self) -> bool {
        self.transfers.iter().any(|t| t.status.is_failure()) || self.mint.status.is_failure()
    }

    /// The settlement leg went through (or was legitimately zero)
    pub fn settlement_succeeded(&self) -> bool {
        self.transfers
            .iter()
            .filter(|t| t.kind == LegKind::Settlement)
            .all(|t| {
                t.status.is_success()
                    || t.status == OutcomeStatus::Skipped { reason: SkipReason::ZeroAmount }
            })
    }

    /// A leg was skipped because its destination has no address
    pub fn has_unresolved_destinations(&self) -> bool {
        self.transfers.iter().any(|t| {
            t.status == OutcomeStatus::Skipped { reason: SkipReason::MissingDestination }
        })
    }

    pub fn status(&self) -> RunStatus {
        if self.insufficient_balance() || self.has_failures() || self.has_unresolved_destinations() {
            RunStatus::Degraded
        } else {
            RunStatus::Completed
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({ "error": format!("result serialization failed: {}", e) })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(kind: LegKind, status: OutcomeStatus) -> TransferOutcome {
        TransferOutcome {
            kind,
            destination: "settlementReserve".into(),
            address: None,
            amount: UsdAmount::from_micros(1),
            status,
        }
    }

    fn result(balance_check: BalanceCheck, transfers: Vec<TransferOutcome>, mint: OutcomeStatus) -> DistributionResult {
        DistributionResult {
            event_id: Some("evt_1".to_string()),
            timestamp: Utc::now(),
            schedule: "standard".to_string(),
            net_amount: UsdAmount::from_micros(1),
            payer_email: "payer@example.com".to_string(),
            payer_wallet: None,
            balance_check,
            transfers,
            mint: MintOutcome {
                address: None,
                amount: UsdAmount::from_micros(1),
                status: mint,
            },
        }
    }

    fn ok() -> OutcomeStatus {
        OutcomeStatus::Succeeded {
            reference: TransferReference::new("0xabc"),
        }
    }

    #[test]
    fn test_completed_when_everything_succeeds() {
        let r = result(
            BalanceCheck::Sufficient { available: UsdAmount::from_micros(5) },
            vec![outcome(LegKind::Settlement, ok())],
            OutcomeStatus::Skipped { reason: SkipReason::NoDestination },
        );
        assert_eq!(r.status(), RunStatus::Completed);
        assert!(r.settlement_succeeded());
    }

    #[test]
    fn test_insufficient_balance_is_degraded_even_without_failures() {
        let r = result(
            BalanceCheck::Insufficient {
                available: UsdAmount::ZERO,
                required: UsdAmount::from_micros(1),
            },
            vec![outcome(LegKind::Settlement, ok())],
            ok(),
        );
        assert!(!r.has_failures());
        assert_eq!(r.status(), RunStatus::Degraded);
    }

    #[test]
    fn test_failed_mint_is_degraded() {
        let r = result(
            BalanceCheck::Sufficient { available: UsdAmount::from_micros(5) },
            vec![outcome(LegKind::Settlement, ok())],
            OutcomeStatus::Failed { error: "reverted".to_string() },
        );
        assert_eq!(r.status(), RunStatus::Degraded);
        assert!(r.settlement_succeeded());
    }

    #[test]
    fn test_missing_destination_degrades_but_zero_amount_does_not() {
        let sufficient = || BalanceCheck::Sufficient { available: UsdAmount::from_micros(5) };
        let zero_skip = OutcomeStatus::Skipped { reason: SkipReason::ZeroAmount };
        let missing_skip = OutcomeStatus::Skipped { reason: SkipReason::MissingDestination };

        let rounded_away = result(
            sufficient(),
            vec![outcome(LegKind::Settlement, ok()), outcome(LegKind::Reinforcement, zero_skip)],
            ok(),
        );
        assert_eq!(rounded_away.status(), RunStatus::Completed);

        let unresolved = result(
            sufficient(),
            vec![outcome(LegKind::Settlement, ok()), outcome(LegKind::ProcessingShare, missing_skip)],
            ok(),
        );
        assert!(!unresolved.has_failures());
        assert!(unresolved.has_unresolved_destinations());
        assert_eq!(unresolved.status(), RunStatus::Degraded);
    }

    #[test]
    fn test_summary_counts() {
        let r = result(
            BalanceCheck::Sufficient { available: UsdAmount::from_micros(5) },
            vec![
                outcome(LegKind::Settlement, ok()),
                outcome(LegKind::ProcessingShare, OutcomeStatus::Failed { error: "x".to_string() }),
                outcome(LegKind::Reinforcement, OutcomeStatus::Skipped { reason: SkipReason::ZeroAmount }),
            ],
            OutcomeStatus::Skipped { reason: SkipReason::NoDestination },
        );
        assert_eq!(
            r.summary(),
            DistributionSummary {
                total_operations: 4,
                successful_operations: 1,
                failed_operations: 1,
                skipped_operations: 2,
            }
        );
    }

    #[test]
    fn test_json_shape() {
        let r = result(
            BalanceCheck::Unverified { error: "rpc down".to_string() },
            vec![outcome(LegKind::Settlement, OutcomeStatus::Skipped { reason: SkipReason::MissingDestination })],
            OutcomeStatus::Skipped { reason: SkipReason::NoDestination },
        );
        let json = r.to_json();
        assert_eq!(json["balance_check"]["result"], "unverified");
        assert_eq!(json["transfers"][0]["status"], "skipped");
        assert_eq!(json["transfers"][0]["reason"], "missing_destination");
        assert_eq!(json["transfers"][0]["kind"], "settlement");
        assert_eq!(json["mint"]["reason"], "no_destination");
        assert_eq!(json["net_amount"], "0.000001");
    }
}
