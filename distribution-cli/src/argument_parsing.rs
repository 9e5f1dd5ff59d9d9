//! Command-line arguments and dispatch

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::commands;
use crate::config::DistributionConfig;
use crate::error::CliResult;

/// MountainShares payment distribution tooling
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(name = "ms-distribution")]
pub struct DistributionCli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "MS_DISTRIBUTION_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Log filter (overrides RUST_LOG), e.g. `debug` or `lib_distribution=trace`
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: DistributionCommand,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand, Debug, Clone)]
pub enum DistributionCommand {
    /// Show how a net payment amount would be split
    Plan(PlanArgs),

    /// List the built-in fee schedules
    Presets,

    /// Check the configured schedule and destination table
    Validate(ValidateArgs),

    /// Dry-run a full distribution against in-memory ledger and mint
    Simulate(SimulateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    /// Net USD amount, e.g. `1.37`
    pub amount: String,

    /// Use this preset instead of the configured schedule
    #[arg(long)]
    pub preset: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Treat funded destinations without an address as errors
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Net USD amount, e.g. `1.37`
    pub amount: String,

    /// Use this preset instead of the configured schedule
    #[arg(long)]
    pub preset: Option<String>,

    #[arg(long, default_value = "payer@example.com")]
    pub email: String,

    /// Payer wallet to mint community tokens to
    #[arg(long)]
    pub wallet: Option<String>,

    /// Settlement balance of the simulated ledger (defaults to the net amount)
    #[arg(long)]
    pub balance: Option<String>,

    /// Destination key whose transfers should revert; repeatable
    #[arg(long = "fail-destination")]
    pub fail_destinations: Vec<String>,

    /// Make every mint fail with this message
    #[arg(long)]
    pub fail_mint: Option<String>,

    /// Fill unconfigured destinations with placeholder addresses
    #[arg(long)]
    pub placeholders: bool,
}

impl DistributionCli {
    /// Configuration from `--config` / `MS_DISTRIBUTION_CONFIG`, or defaults
    pub async fn load_config(&self) -> CliResult<DistributionConfig> {
        Ok(DistributionConfig::resolve(self.config.as_deref()).await?)
    }
}

fn init_logging(cli: &DistributionCli) {
    let filter = cli
        .log_level
        .clone()
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "warn".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub async fn run_cli() -> Result<()> {
    let cli = DistributionCli::parse();
    init_logging(&cli);

    match &cli.command {
        DistributionCommand::Plan(args) => commands::plan::handle_plan_command(args.clone(), &cli).await?,
        DistributionCommand::Presets => commands::presets::handle_presets_command(&cli).await?,
        DistributionCommand::Validate(args) => commands::validate::handle_validate_command(args.clone(), &cli).await?,
        DistributionCommand::Simulate(args) => commands::simulate::handle_simulate_command(args.clone(), &cli).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        DistributionCli::command().debug_assert();
    }

    #[test]
    fn test_parse_plan_with_global_flags_after_subcommand() {
        let cli = DistributionCli::try_parse_from([
            "ms-distribution",
            "plan",
            "1.37",
            "--preset",
            "fee-split",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            DistributionCommand::Plan(args) => {
                assert_eq!(args.amount, "1.37");
                assert_eq!(args.preset.as_deref(), Some("fee-split"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_simulate_repeated_failures() {
        let cli = DistributionCli::try_parse_from([
            "ms-distribution",
            "--config",
            "/etc/ms/distribution.toml",
            "simulate",
            "5",
            "--fail-destination",
            "h4hNonprofit",
            "--fail-destination",
            "development",
            "--placeholders",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/etc/ms/distribution.toml")));
        match cli.command {
            DistributionCommand::Simulate(args) => {
                assert_eq!(args.fail_destinations, vec!["h4hNonprofit", "development"]);
                assert!(args.placeholders);
                assert_eq!(args.email, "payer@example.com");
                assert!(args.wallet.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_unknown_format_rejected() {
        let result = DistributionCli::try_parse_from(["ms-distribution", "--format", "yaml", "presets"]);
        assert!(result.is_err());
    }
}
