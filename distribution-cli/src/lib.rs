//! MountainShares Distribution CLI
//!
//! Operator tooling around `lib-distribution`: preview a payment's split,
//! check a deployment's configuration and dry-run a distribution against
//! in-memory collaborators.
//!
//! Commands keep their pure formatting logic separate from printing; all
//! printing goes through the [`Output`] trait so handlers can be tested.

pub mod argument_parsing;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use argument_parsing::{run_cli, DistributionCli, DistributionCommand, OutputFormat};
pub use config::{ConfigError, DistributionConfig};
pub use error::{CliError, CliResult};
pub use output::Output;

/// CLI version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
