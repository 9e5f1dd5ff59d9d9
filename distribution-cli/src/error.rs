//! Structured error types for the distribution CLI

use lib_distribution::{AddressError, DistributionError};
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Distribution failed: {0}")]
    Distribution(#[from] DistributionError),

    #[error("Invalid address: {0}")]
    Address(#[from] AddressError),

    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use lib_distribution::ReconciliationError;

    #[test]
    fn test_invalid_argument_message() {
        let err = CliError::InvalidArgument {
            name: "amount".to_string(),
            reason: "must be positive".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid argument 'amount': must be positive");
    }

    #[test]
    fn test_distribution_error_wraps_source() {
        let err: CliError = DistributionError::from(ReconciliationError::Overflow).into();
        assert!(err.to_string().starts_with("Distribution failed:"));
    }
}
