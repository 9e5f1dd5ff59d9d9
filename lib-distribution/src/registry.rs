//! Destination registry
//!
//! Maps symbolic destination keys (`settlementReserve`, `h4hGovernance`, ...)
//! to on-chain accounts. A key with no address is not an error here; the
//! executor records the leg as skipped.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::AddressError;
use crate::fee_schedule::FeeSchedule;

/// Symbolic name of a distribution destination
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationKey(String);

impl DestinationKey {
    pub fn new(key: impl Into<String>) -> Self {
        DestinationKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DestinationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DestinationKey {
    fn from(key: &str) -> Self {
        DestinationKey::new(key)
    }
}

/// EVM account address: `0x` followed by 40 hex digits.
/// Stored as given; comparisons are case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct AccountAddress(String);

impl AccountAddress {
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AddressError::Empty);
        }
        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| AddressError::MissingPrefix(trimmed.to_string()))?;
        if hex.len() != 40 {
            return Err(AddressError::WrongLength {
                address: trimmed.to_string(),
                len: hex.len(),
            });
        }
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressError::NotHex(trimmed.to_string()));
        }
        Ok(AccountAddress(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AccountAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountAddress::parse(s)
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for AccountAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        AccountAddress::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Destination key → account address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationRegistry {
    addresses: BTreeMap<DestinationKey, AccountAddress>,
}

impl DestinationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(key, address)` pairs, rejecting the first malformed address
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, AddressError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut registry = Self::new();
        for (key, address) in pairs {
            registry.insert(DestinationKey::new(key), AccountAddress::parse(address)?);
        }
        Ok(registry)
    }

    /// Returns the previous address for the key, if any
    pub fn insert(&mut self, key: DestinationKey, address: AccountAddress) -> Option<AccountAddress> {
        self.addresses.insert(key, address)
    }

    pub fn resolve(&self, key: &DestinationKey) -> Option<&AccountAddress> {
        self.addresses.get(key)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DestinationKey, &AccountAddress)> {
        self.addresses.iter()
    }

    /// Keys the schedule can send a non-zero amount to that have no address.
    /// Sorted and de-duplicated.
    pub fn missing_for(&self, schedule: &FeeSchedule) -> Vec<DestinationKey> {
        let mut missing: Vec<DestinationKey> = schedule
            .funded_destinations()
            .into_iter()
            .filter(|key| !self.addresses.contains_key(key))
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }
}
