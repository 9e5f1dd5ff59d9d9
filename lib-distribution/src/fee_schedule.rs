//! Fee schedules
//!
//! A [`FeeSchedule`] names every rate that governs how a net payment is split:
//!
//! - processing fee: `processing_fee_bps` of the net amount, split across
//!   sub-destinations by `processing_shares` (which must total 10 000 bp)
//! - reinforcement fee: `reinforcement_fee_bps` of the net amount, sent to a
//!   single destination
//! - settlement: whatever remains, sent to the settlement reserve and minted
//!   1:1 for the payer
//!
//! The payment handlers that preceded this crate each hard-coded a slightly
//! different rate set. Each of those variants survives as a [`SchedulePreset`]
//! so old behavior can be reproduced without a separate code path.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::amount::BASIS_POINTS_WHOLE;
use crate::errors::ReconciliationError;
use crate::registry::DestinationKey;

pub const SETTLEMENT_RESERVE: &str = "settlementReserve";
pub const H4H_NONPROFIT: &str = "h4hNonprofit";
pub const H4H_TREASURY_RESERVE: &str = "h4hTreasuryReserve";
pub const H4H_COMMUNITY_PROGRAMS: &str = "h4hCommunityPrograms";
pub const H4H_TREASURY: &str = "h4hTreasury";
pub const H4H_GOVERNANCE: &str = "h4hGovernance";
pub const TREASURY_REINFORCEMENT: &str = "treasuryReinforcement";
pub const DEVELOPMENT: &str = "development";

/// One sub-destination of the processing fee
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeeShare {
    pub destination: DestinationKey,
    pub share_bps: u32,
}

impl FeeShare {
    pub fn new(destination: &str, share_bps: u32) -> Self {
        Self {
            destination: DestinationKey::new(destination),
            share_bps,
        }
    }
}

/// Immutable rate configuration for one run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub name: String,
    pub processing_fee_bps: u32,
    pub reinforcement_fee_bps: u32,
    /// Ordered; the first share also absorbs the rounding remainder of the split
    pub processing_shares: Vec<FeeShare>,
    pub reinforcement_destination: DestinationKey,
    pub settlement_destination: DestinationKey,
}

impl FeeSchedule {
    /// 2% processing + 0.5% reinforcement, processing split 30/30/15/15/10
    pub fn standard() -> Self {
        Self {
            name: SchedulePreset::Standard.name().to_string(),
            processing_fee_bps: 200,
            reinforcement_fee_bps: 50,
            processing_shares: vec![
                FeeShare::new(H4H_NONPROFIT, 3_000),
                FeeShare::new(H4H_TREASURY_RESERVE, 3_000),
                FeeShare::new(H4H_COMMUNITY_PROGRAMS, 1_500),
                FeeShare::new(DEVELOPMENT, 1_500),
                FeeShare::new(H4H_GOVERNANCE, 1_000),
            ],
            reinforcement_destination: DestinationKey::new(H4H_TREASURY_RESERVE),
            settlement_destination: DestinationKey::new(SETTLEMENT_RESERVE),
        }
    }

    /// 1.25% fee split 40/20/15/10/8/4/3 across seven treasuries
    pub fn fee_split() -> Self {
        Self {
            name: SchedulePreset::FeeSplit.name().to_string(),
            processing_fee_bps: 125,
            reinforcement_fee_bps: 0,
            processing_shares: seven_way_shares(),
            reinforcement_destination: DestinationKey::new(TREASURY_REINFORCEMENT),
            settlement_destination: DestinationKey::new(SETTLEMENT_RESERVE),
        }
    }

    /// Entire net amount split 40/20/15/10/8/4/3; nothing is left for settlement.
    ///
    /// Payer tokens are minted 1:1 against the settlement amount, so under
    /// this preset the payer receives nothing (the mint is skipped as
    /// `zero_amount`). The converter-era handler minted the full charge to the
    /// customer instead; use `fee-split` or `standard` where the payer must
    /// be minted.
    pub fn net_split() -> Self {
        Self {
            name: SchedulePreset::NetSplit.name().to_string(),
            processing_fee_bps: BASIS_POINTS_WHOLE,
            reinforcement_fee_bps: 0,
            processing_shares: seven_way_shares(),
            reinforcement_destination: DestinationKey::new(TREASURY_REINFORCEMENT),
            settlement_destination: DestinationKey::new(SETTLEMENT_RESERVE),
        }
    }

    /// Sum of all processing sub-shares in basis points
    pub fn total_share_bps(&self) -> u32 {
        self.processing_shares
            .iter()
            .fold(0u32, |acc, share| acc.saturating_add(share.share_bps))
    }

    /// Check the schedule can reconstruct any amount exactly
    pub fn validate(&self) -> Result<(), ReconciliationError> {
        let total_rate = self
            .processing_fee_bps
            .saturating_add(self.reinforcement_fee_bps);
        if total_rate > BASIS_POINTS_WHOLE {
            return Err(ReconciliationError::RatesExceedWhole {
                schedule: self.name.clone(),
                total_bps: total_rate,
            });
        }

        if self.processing_fee_bps > 0 {
            if self.processing_shares.is_empty() {
                return Err(ReconciliationError::EmptyShares {
                    schedule: self.name.clone(),
                });
            }
            let total_bps = self.total_share_bps();
            if total_bps != BASIS_POINTS_WHOLE {
                return Err(ReconciliationError::SharesIncomplete {
                    schedule: self.name.clone(),
                    total_bps,
                });
            }
        }

        Ok(())
    }

    /// Destinations that can receive a non-zero amount under this schedule
    pub fn funded_destinations(&self) -> Vec<DestinationKey> {
        let mut keys = Vec::new();
        let fees_take_all =
            self.processing_fee_bps.saturating_add(self.reinforcement_fee_bps) >= BASIS_POINTS_WHOLE;
        // Two floored fee buckets can leave a rounding remainder for settlement
        let split_between_fees = self.processing_fee_bps > 0 && self.reinforcement_fee_bps > 0;
        if !fees_take_all || split_between_fees {
            keys.push(self.settlement_destination.clone());
        }
        if self.processing_fee_bps > 0 {
            keys.extend(
                self.processing_shares
                    .iter()
                    .filter(|share| share.share_bps > 0)
                    .map(|share| share.destination.clone()),
            );
        }
        if self.reinforcement_fee_bps > 0 {
            keys.push(self.reinforcement_destination.clone());
        }
        keys
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::standard()
    }
}

fn seven_way_shares() -> Vec<FeeShare> {
    vec![
        FeeShare::new(SETTLEMENT_RESERVE, 4_000),
        FeeShare::new(TREASURY_REINFORCEMENT, 2_000),
        FeeShare::new(H4H_NONPROFIT, 1_500),
        FeeShare::new(H4H_COMMUNITY_PROGRAMS, 1_000),
        FeeShare::new(H4H_TREASURY, 800),
        FeeShare::new(H4H_GOVERNANCE, 400),
        FeeShare::new(DEVELOPMENT, 300),
    ]
}

/// Named historical rate sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchedulePreset {
    Standard,
    FeeSplit,
    NetSplit,
}

impl SchedulePreset {
    pub const ALL: &'static [SchedulePreset] = &[
        SchedulePreset::Standard,
        SchedulePreset::FeeSplit,
        SchedulePreset::NetSplit,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SchedulePreset::Standard => "standard",
            SchedulePreset::FeeSplit => "fee-split",
            SchedulePreset::NetSplit => "net-split",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SchedulePreset::Standard => "2% processing (30/30/15/15/10) + 0.5% reinforcement, 97.5% settlement",
            SchedulePreset::FeeSplit => "1.25% fee split 40/20/15/10/8/4/3, 98.75% settlement",
            SchedulePreset::NetSplit => "100% of net split 40/20/15/10/8/4/3, no settlement",
        }
    }

    pub fn schedule(&self) -> FeeSchedule {
        match self {
            SchedulePreset::Standard => FeeSchedule::standard(),
            SchedulePreset::FeeSplit => FeeSchedule::fee_split(),
            SchedulePreset::NetSplit => FeeSchedule::net_split(),
        }
    }
}

impl fmt::Display for SchedulePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SchedulePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SchedulePreset::ALL
            .iter()
            .copied()
            .find(|preset| preset.name() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = SchedulePreset::ALL.iter().map(|p| p.name()).collect();
                format!("Unknown fee schedule preset '{}' (known: {})", s, known.join(", "))
            })
    }
}
