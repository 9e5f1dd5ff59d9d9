//! Distribution calculator
//!
//! Pure mapping `net amount × FeeSchedule → DistributionPlan`. No state,
//! no wallets, no transfers.
//!
//! # Integer Math
//!
//! All amounts are micro-dollars and all rates basis points:
//!
//! 1. `processing = floor(net * processing_bps / 10_000)`
//! 2. `reinforcement = floor(net * reinforcement_bps / 10_000)`
//! 3. `settlement = net - processing - reinforcement` (absorbs top-level rounding)
//! 4. `share[i] = floor(processing * share_bps[i] / 10_000)`; the remainder of
//!    the split goes to `share[0]`
//! 5. `sum(legs) == net` or the plan is rejected
//!
//! Zero-amount legs stay in the plan so the reconciliation sum always covers
//! every destination the schedule names.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::amount::UsdAmount;
use crate::errors::{DistributionError, ReconciliationError};
use crate::fee_schedule::FeeSchedule;
use crate::registry::DestinationKey;

/// Which bucket a leg was drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegKind {
    Settlement,
    ProcessingShare,
    Reinforcement,
}

impl fmt::Display for LegKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LegKind::Settlement => "settlement",
            LegKind::ProcessingShare => "processing",
            LegKind::Reinforcement => "reinforcement",
        };
        f.write_str(label)
    }
}

/// One destination-amount pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanLeg {
    pub kind: LegKind,
    pub destination: DestinationKey,
    pub amount: UsdAmount,
}

/// Reconciled breakdown of one payment
///
/// # Invariants
///
/// - `total_distributed == net_amount`
/// - `settlement_amount + processing_fee_total + reinforcement_fee == net_amount`
/// - sum of processing-share legs == `processing_fee_total`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DistributionPlan {
    schedule: String,
    net_amount: UsdAmount,
    processing_fee_total: UsdAmount,
    reinforcement_fee: UsdAmount,
    settlement_amount: UsdAmount,
    legs: Vec<PlanLeg>,
    total_distributed: UsdAmount,
}

impl DistributionPlan {
    pub fn schedule(&self) -> &str {
        &self.schedule
    }

    pub const fn net_amount(&self) -> UsdAmount {
        self.net_amount
    }

    pub const fn processing_fee_total(&self) -> UsdAmount {
        self.processing_fee_total
    }

    pub const fn reinforcement_fee(&self) -> UsdAmount {
        self.reinforcement_fee
    }

    pub const fn settlement_amount(&self) -> UsdAmount {
        self.settlement_amount
    }

    /// Settlement first, then processing shares in schedule order, then reinforcement
    pub fn legs(&self) -> &[PlanLeg] {
        &self.legs
    }

    pub const fn total_distributed(&self) -> UsdAmount {
        self.total_distributed
    }

    /// Amount planned for a destination, summed over every leg that targets it
    pub fn amount_for(&self, destination: &DestinationKey) -> UsdAmount {
        self.legs
            .iter()
            .filter(|leg| &leg.destination == destination)
            .fold(UsdAmount::ZERO, |acc, leg| {
                acc.checked_add(leg.amount).unwrap_or(acc)
            })
    }
}

impl fmt::Display for DistributionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DistributionPlan {{schedule: {}, net: {}, processing: {}, reinforcement: {}, settlement: {}, legs: {}}}",
            self.schedule,
            self.net_amount,
            self.processing_fee_total,
            self.reinforcement_fee,
            self.settlement_amount,
            self.legs.len()
        )
    }
}

/// Compute the reconciled plan for a net payment
///
/// # Errors
///
/// * `DistributionError::InvalidAmount` - net amount is zero
/// * `DistributionError::Reconciliation` - the schedule cannot reconstruct the amount
pub fn calculate_plan(
    net_amount: UsdAmount,
    schedule: &FeeSchedule,
) -> Result<DistributionPlan, DistributionError> {
    if net_amount.is_zero() {
        return Err(DistributionError::InvalidAmount(
            "net amount must be greater than zero".to_string(),
        ));
    }

    schedule.validate()?;

    let processing_fee_total = net_amount.apply_bps(schedule.processing_fee_bps);
    let reinforcement_fee = net_amount.apply_bps(schedule.reinforcement_fee_bps);
    let settlement_amount = net_amount
        .checked_sub(processing_fee_total)
        .and_then(|rest| rest.checked_sub(reinforcement_fee))
        .ok_or(ReconciliationError::Overflow)?;

    let mut share_amounts: Vec<UsdAmount> = schedule
        .processing_shares
        .iter()
        .map(|share| processing_fee_total.apply_bps(share.share_bps))
        .collect();

    let shares_sum = sum_amounts(share_amounts.iter().copied())?;
    // Validation guarantees the shares total 100%, so the gap is pure rounding.
    // A 0 bp share never receives it.
    let funded_share = schedule
        .processing_shares
        .iter()
        .position(|share| share.share_bps > 0);
    if let Some(index) = funded_share {
        let remainder = processing_fee_total.saturating_sub(shares_sum);
        let target = &mut share_amounts[index];
        *target = target.checked_add(remainder).ok_or(ReconciliationError::Overflow)?;
    }

    let mut legs = Vec::with_capacity(schedule.processing_shares.len() + 2);
    legs.push(PlanLeg {
        kind: LegKind::Settlement,
        destination: schedule.settlement_destination.clone(),
        amount: settlement_amount,
    });
    legs.extend(
        schedule
            .processing_shares
            .iter()
            .zip(share_amounts)
            .map(|(share, amount)| PlanLeg {
                kind: LegKind::ProcessingShare,
                destination: share.destination.clone(),
                amount,
            }),
    );
    legs.push(PlanLeg {
        kind: LegKind::Reinforcement,
        destination: schedule.reinforcement_destination.clone(),
        amount: reinforcement_fee,
    });

    let total_distributed = sum_amounts(legs.iter().map(|leg| leg.amount))?;
    if total_distributed != net_amount {
        return Err(ReconciliationError::TotalMismatch {
            expected: net_amount,
            distributed: total_distributed,
        }
        .into());
    }

    Ok(DistributionPlan {
        schedule: schedule.name.clone(),
        net_amount,
        processing_fee_total,
        reinforcement_fee,
        settlement_amount,
        legs,
        total_distributed,
    })
}

fn sum_amounts(mut amounts: impl Iterator<Item = UsdAmount>) -> Result<UsdAmount, ReconciliationError> {
    amounts.try_fold(UsdAmount::ZERO, |acc, amount| {
        acc.checked_add(amount).ok_or(ReconciliationError::Overflow)
    })
}
