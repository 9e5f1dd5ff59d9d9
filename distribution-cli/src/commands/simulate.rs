//! `simulate`: dry-run a full distribution
//!
//! Runs the real executor against the in-memory ledger and mint from
//! `lib_distribution::testing`, so operators can see balance shortfalls,
//! unconfigured destinations and isolated leg failures before going live.

use std::sync::Arc;

use lib_distribution::testing::{InMemoryLedger, InMemoryMint};
use lib_distribution::{
    AccountAddress, BalanceCheck, DestinationKey, DestinationRegistry, DistributionExecutor,
    DistributionResult, FeeSchedule, OutcomeStatus, PaymentConfirmation, RunStatus, UsdAmount,
};
use tracing::info;

use crate::argument_parsing::{DistributionCli, OutputFormat, SimulateArgs};
use crate::config::DistributionConfig;
use crate::error::{CliError, CliResult};
use crate::output::{ConsoleOutput, Output};

// ============================================================================
// PURE LOGIC
// ============================================================================

/// Configured destinations, plus deterministic placeholders for any funded
/// key without an address when `placeholders` is set
pub fn simulation_registry(
    configured: &DestinationRegistry,
    schedule: &FeeSchedule,
    placeholders: bool,
) -> CliResult<DestinationRegistry> {
    let mut registry = configured.clone();
    if placeholders {
        for (index, key) in configured.missing_for(schedule).into_iter().enumerate() {
            let address = AccountAddress::parse(&format!("0x{:040x}", 0xd15_0000 + index))?;
            registry.insert(key, address);
        }
    }
    Ok(registry)
}

pub fn status_text(status: &OutcomeStatus) -> String {
    match status {
        OutcomeStatus::Succeeded { reference } => format!("ok {}", reference),
        OutcomeStatus::Failed { error } => format!("FAILED: {}", error),
        OutcomeStatus::Skipped { reason } => format!("skipped ({})", reason),
    }
}

pub fn balance_text(check: &BalanceCheck) -> String {
    match check {
        BalanceCheck::Sufficient { available } => format!("sufficient (available {})", available),
        BalanceCheck::Insufficient { available, required } => {
            format!("INSUFFICIENT (available {}, required {})", available, required)
        }
        BalanceCheck::Unverified { error } => format!("unverified ({})", error),
    }
}

pub fn result_lines(result: &DistributionResult) -> Vec<String> {
    let mut lines = vec![format!("balance check: {}", balance_text(&result.balance_check))];
    lines.extend(result.transfers.iter().map(|transfer| {
        format!(
            "{:<14} {:<24} {:>16}  {}",
            transfer.kind.to_string(),
            transfer.destination.to_string(),
            transfer.amount.to_string(),
            status_text(&transfer.status)
        )
    }));
    lines.push(format!(
        "{:<14} {:<24} {:>16}  {}",
        "mint",
        result.payer_wallet.as_deref().unwrap_or("-"),
        result.mint.amount.to_string(),
        status_text(&result.mint.status)
    ));

    let summary = result.summary();
    lines.push(format!(
        "{} succeeded, {} failed, {} skipped of {} operations",
        summary.successful_operations,
        summary.failed_operations,
        summary.skipped_operations,
        summary.total_operations
    ));
    lines
}

// ============================================================================
// IMPERATIVE SHELL
// ============================================================================

pub async fn handle_simulate_command(args: SimulateArgs, cli: &DistributionCli) -> CliResult<()> {
    let config = cli.load_config().await?;
    handle_simulate_command_impl(args, &config, cli.format, &ConsoleOutput).await
}

async fn handle_simulate_command_impl(
    args: SimulateArgs,
    config: &DistributionConfig,
    format: OutputFormat,
    output: &dyn Output,
) -> CliResult<()> {
    let result = run_simulation(&args, config).await?;

    match format {
        OutputFormat::Json => output.print_json(&result.to_json())?,
        OutputFormat::Table => {
            output.header(&format!(
                "Simulated distribution of ${} under '{}'",
                result.net_amount, result.schedule
            ))?;
            for line in result_lines(&result) {
                output.print(&line)?;
            }
            match result.status() {
                RunStatus::Completed => output.success("Run completed")?,
                RunStatus::Degraded => output.warning("Run degraded")?,
            }
        }
    }
    Ok(())
}

async fn run_simulation(args: &SimulateArgs, config: &DistributionConfig) -> CliResult<DistributionResult> {
    let net: UsdAmount = args.amount.parse()?;
    let schedule = super::select_schedule(args.preset.as_deref(), config)?;
    let registry = simulation_registry(&config.destinations, &schedule, args.placeholders)?;

    let balance = match &args.balance {
        Some(raw) => raw.parse()?,
        None => net,
    };
    let ledger = Arc::new(InMemoryLedger::with_balance(balance));
    for key in &args.fail_destinations {
        let address = registry
            .resolve(&DestinationKey::new(key.as_str()))
            .ok_or_else(|| CliError::InvalidArgument {
                name: "fail-destination".to_string(),
                reason: format!("'{}' has no configured address", key),
            })?;
        ledger.fail_transfers_to(address.clone());
    }

    let minter = Arc::new(InMemoryMint::new());
    if let Some(message) = &args.fail_mint {
        minter.fail_with(message.as_str());
    }

    let executor = DistributionExecutor::new(
        schedule,
        registry,
        ledger.clone(),
        minter,
        config.executor_config(),
    );

    let mut payment = PaymentConfirmation::new(net, args.email.as_str());
    if let Some(wallet) = &args.wallet {
        payment = payment.with_wallet(wallet.as_str());
    }

    let result = executor.execute(&payment).await?;
    info!(
        status = %result.status(),
        remaining_balance = %ledger.balance(),
        "Simulation finished"
    );
    Ok(result)
}
