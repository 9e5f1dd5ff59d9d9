//! `plan`: preview how a net amount is split
//!
//! Pure: [`build_plan`] and [`plan_lines`]. Shell: config loading and printing.

use lib_distribution::{calculate_plan, DistributionPlan, FeeSchedule, UsdAmount};

use crate::argument_parsing::{DistributionCli, OutputFormat, PlanArgs};
use crate::error::CliResult;
use crate::output::{ConsoleOutput, Output};

// ============================================================================
// PURE LOGIC
// ============================================================================

pub fn build_plan(amount: &str, schedule: &FeeSchedule) -> CliResult<DistributionPlan> {
    let net: UsdAmount = amount.parse()?;
    Ok(calculate_plan(net, schedule)?)
}

/// One aligned row per leg followed by the bucket totals
pub fn plan_lines(plan: &DistributionPlan) -> Vec<String> {
    let mut lines: Vec<String> = plan
        .legs()
        .iter()
        .map(|leg| {
            format!(
                "{:<14} {:<24} {:>16}",
                leg.kind.to_string(),
                leg.destination.to_string(),
                leg.amount.to_string()
            )
        })
        .collect();

    lines.push(String::new());
    lines.push(format!("{:<39} {:>16}", "processing fee", plan.processing_fee_total().to_string()));
    lines.push(format!("{:<39} {:>16}", "reinforcement fee", plan.reinforcement_fee().to_string()));
    lines.push(format!("{:<39} {:>16}", "settlement", plan.settlement_amount().to_string()));
    lines.push(format!("{:<39} {:>16}", "total distributed", plan.total_distributed().to_string()));
    lines
}

// ============================================================================
// IMPERATIVE SHELL
// ============================================================================

pub async fn handle_plan_command(args: PlanArgs, cli: &DistributionCli) -> CliResult<()> {
    let config = cli.load_config().await?;
    let schedule = super::select_schedule(args.preset.as_deref(), &config)?;
    handle_plan_command_impl(&args.amount, &schedule, cli.format, &ConsoleOutput)
}

fn handle_plan_command_impl(
    amount: &str,
    schedule: &FeeSchedule,
    format: OutputFormat,
    output: &dyn Output,
) -> CliResult<()> {
    let plan = build_plan(amount, schedule)?;

    match format {
        OutputFormat::Json => output.print_json(&serde_json::to_value(&plan)?),
        OutputFormat::Table => {
            output.header(&format!("Distribution of ${} under '{}'", plan.net_amount(), plan.schedule()))?;
            for line in plan_lines(&plan) {
                output.print(&line)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use crate::output::testing::MockOutput;
    use lib_distribution::DistributionError;

    #[test]
    fn test_table_shows_every_leg_and_total() {
        let output = MockOutput::new();
        handle_plan_command_impl("1.37", &FeeSchedule::standard(), OutputFormat::Table, &output).unwrap();

        output.assert_contains_message("Distribution of $1.370000 under 'standard'");
        output.assert_contains_message("settlementReserve");
        output.assert_contains_message("1.335750");
        output.assert_contains_message("0.008220");
        output.assert_contains_message("0.006850");

        let total = output
            .get_messages()
            .into_iter()
            .find(|line| line.starts_with("total distributed"))
            .unwrap();
        assert!(total.ends_with("1.370000"));
    }

    #[test]
    fn test_json_is_the_serialized_plan() {
        let output = MockOutput::new();
        handle_plan_command_impl("10", &FeeSchedule::fee_split(), OutputFormat::Json, &output).unwrap();

        let printed: serde_json::Value = serde_json::from_str(&output.get_messages()[0]).unwrap();
        assert_eq!(printed["schedule"], "fee-split");
        assert_eq!(printed["legs"].as_array().unwrap().len(), 9);
    }

    #[test]
    fn test_zero_amount_rejected() {
        let output = MockOutput::new();
        let err = handle_plan_command_impl("0", &FeeSchedule::standard(), OutputFormat::Table, &output)
            .unwrap_err();
        assert!(matches!(err, CliError::Distribution(DistributionError::InvalidAmount(_))));
        assert!(output.get_messages().is_empty());
    }

    #[test]
    fn test_plan_lines_order() {
        let plan = build_plan("2", &FeeSchedule::standard()).unwrap();
        let lines = plan_lines(&plan);
        assert!(lines[0].starts_with("settlement"));
        assert!(lines[6].starts_with("reinforcement"));
        assert!(lines[7].is_empty());
    }
}
