//! Distribution configuration
//!
//! A deployment is described by one TOML file:
//!
//! ```toml
//! [distribution]
//! preset = "standard"        # standard | fee-split | net-split
//! call_timeout_secs = 60     # 0 leaves collaborator calls unbounded
//!
//! # Optional; replaces the preset entirely
//! [schedule]
//! name = "custom"
//! processing_fee_bps = 200
//! ...
//!
//! [destinations]
//! settlementReserve = "0x..."
//! h4hNonprofit = "0x..."
//! ```

use lib_distribution::{
    DestinationKey, DestinationRegistry, ExecutorConfig, FeeSchedule, ReconciliationError,
    SchedulePreset,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration loading and validation error
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("Configuration parsing error: {0}")]
    Parsing(#[from] toml::de::Error),

    #[error("{0}")]
    UnknownPreset(String),

    #[error("Invalid fee schedule: {0}")]
    InvalidSchedule(#[from] ReconciliationError),

    #[error("No address configured for: {}", .0.join(", "))]
    MissingDestinations(Vec<String>),
}

/// `[distribution]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionSection {
    pub preset: String,
    pub call_timeout_secs: u64,
}

impl Default for DistributionSection {
    fn default() -> Self {
        Self {
            preset: SchedulePreset::Standard.name().to_string(),
            call_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionConfig {
    #[serde(default)]
    pub distribution: DistributionSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<FeeSchedule>,
    #[serde(default)]
    pub destinations: DestinationRegistry,
}

/// Outcome of a successful validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub schedule: FeeSchedule,
    /// Funded destinations with no address; their legs would be skipped
    pub missing: Vec<DestinationKey>,
}

impl DistributionConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse the file at `path`
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading distribution configuration from {}", path.display());
        let content = tokio::fs::read_to_string(path).await?;
        let config = Self::from_toml_str(&content)?;
        debug!(
            preset = %config.distribution.preset,
            custom_schedule = config.schedule.is_some(),
            destinations = config.destinations.len(),
            "Configuration parsed"
        );
        Ok(config)
    }

    /// Load from `path` when given, otherwise fall back to defaults
    pub async fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path).await,
            None => {
                info!("No configuration file given; using the standard preset with no destinations");
                Ok(Self::default())
            }
        }
    }

    /// The custom `[schedule]` when present, otherwise the named preset
    pub fn schedule(&self) -> Result<FeeSchedule, ConfigError> {
        if let Some(schedule) = &self.schedule {
            return Ok(schedule.clone());
        }
        let preset: SchedulePreset = self
            .distribution
            .preset
            .parse()
            .map_err(ConfigError::UnknownPreset)?;
        Ok(preset.schedule())
    }

    pub fn executor_config(&self) -> ExecutorConfig {
        let call_timeout = match self.distribution.call_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        ExecutorConfig { call_timeout }
    }

    /// Check the schedule and the destination table.
    ///
    /// Missing destinations are warnings unless `strict`, matching the
    /// executor which skips legs it cannot resolve.
    pub fn validate(&self, strict: bool) -> Result<ValidationReport, ConfigError> {
        let schedule = self.schedule()?;
        schedule.validate()?;

        let missing = self.destinations.missing_for(&schedule);
        if !missing.is_empty() {
            if strict {
                return Err(ConfigError::MissingDestinations(
                    missing.iter().map(|key| key.to_string()).collect(),
                ));
            }
            warn!(missing = ?missing, "Funded destinations have no address configured");
        }

        Ok(ValidationReport { schedule, missing })
    }
}
