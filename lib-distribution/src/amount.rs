//! Fixed-point USD amounts
//!
//! Every amount in the pipeline is an integer count of micro-dollars
//! (10^-6 USD), which is exactly the settlement asset's 6-decimal precision.
//! Floats only appear at the provider boundary ([`UsdAmount::from_f64`]).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::errors::DistributionError;

/// Micro-dollars per dollar
pub const MICROS_PER_USD: u64 = 1_000_000;

/// Micro-dollars per cent
pub const MICROS_PER_CENT: u64 = 10_000;

/// Basis points in one whole (100%)
pub const BASIS_POINTS_WHOLE: u32 = 10_000;

/// Largest accepted payment: $1 trillion. Keeps `micros * bps` well inside u128
/// and the micro count inside u64.
pub const MAX_USD: u64 = 1_000_000_000_000;

/// A non-negative USD amount in micro-dollars
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UsdAmount(u64);

impl UsdAmount {
    pub const ZERO: UsdAmount = UsdAmount(0);

    pub const fn from_micros(micros: u64) -> Self {
        UsdAmount(micros)
    }

    pub const fn micros(&self) -> u64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Amount from provider cents (e.g. a card charge of 140 = $1.40)
    pub fn from_cents(cents: u64) -> Result<Self, DistributionError> {
        cents
            .checked_mul(MICROS_PER_CENT)
            .filter(|micros| *micros <= MAX_USD * MICROS_PER_USD)
            .map(UsdAmount)
            .ok_or_else(|| DistributionError::InvalidAmount(format!("{} cents is out of range", cents)))
    }

    /// Amount from a provider-supplied float, rounded to the nearest micro-dollar
    pub fn from_f64(usd: f64) -> Result<Self, DistributionError> {
        if !usd.is_finite() {
            return Err(DistributionError::InvalidAmount(format!("{} is not finite", usd)));
        }
        if usd < 0.0 {
            return Err(DistributionError::InvalidAmount(format!("{} is negative", usd)));
        }
        if usd > MAX_USD as f64 {
            return Err(DistributionError::InvalidAmount(format!("{} exceeds maximum", usd)));
        }
        Ok(UsdAmount((usd * MICROS_PER_USD as f64).round() as u64))
    }

    /// Lossy conversion for display and logging only
    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / MICROS_PER_USD as f64
    }

    /// `floor(self * bps / 10_000)`
    pub fn apply_bps(&self, bps: u32) -> UsdAmount {
        let scaled = self.0 as u128 * bps as u128 / BASIS_POINTS_WHOLE as u128;
        // bps <= 10_000 for every validated schedule, so this never exceeds self
        UsdAmount(u64::try_from(scaled).unwrap_or(u64::MAX))
    }

    pub fn checked_add(self, other: UsdAmount) -> Option<UsdAmount> {
        self.0.checked_add(other.0).map(UsdAmount)
    }

    pub fn checked_sub(self, other: UsdAmount) -> Option<UsdAmount> {
        self.0.checked_sub(other.0).map(UsdAmount)
    }

    pub fn saturating_sub(self, other: UsdAmount) -> UsdAmount {
        UsdAmount(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for UsdAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.0 / MICROS_PER_USD, self.0 % MICROS_PER_USD)
    }
}

impl FromStr for UsdAmount {
    type Err = DistributionError;

    /// Parses `"1.37"`, `"$1.37"`, `"12"`. At most 6 fractional digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| DistributionError::InvalidAmount(format!("'{}': {}", s, reason));

        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('$').unwrap_or(trimmed);
        if digits.is_empty() {
            return Err(invalid("empty"));
        }
        if digits.starts_with('-') {
            return Err(invalid("negative"));
        }

        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("no digits"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("not a decimal number"));
        }
        if frac.len() > 6 {
            return Err(invalid("more than 6 fractional digits"));
        }

        let whole_usd: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("out of range"))?
        };
        if whole_usd > MAX_USD {
            return Err(invalid("exceeds maximum"));
        }

        let frac_micros: u64 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{:0<6}", frac);
            padded.parse().map_err(|_| invalid("bad fraction"))?
        };

        Ok(UsdAmount(whole_usd * MICROS_PER_USD + frac_micros))
    }
}

impl Serialize for UsdAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for UsdAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(f64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
            Raw::Number(n) => UsdAmount::from_f64(n).map_err(serde::de::Error::custom),
        }
    }
}
