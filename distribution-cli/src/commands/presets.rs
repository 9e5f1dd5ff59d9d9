//! `presets`: list the built-in fee schedules

use lib_distribution::{FeeSchedule, SchedulePreset};
use serde_json::json;

use crate::argument_parsing::{DistributionCli, OutputFormat};
use crate::error::CliResult;
use crate::output::{ConsoleOutput, Output};

/// Basis points as a percentage with two decimals, `125` -> `1.25%`
pub fn format_bps(bps: u32) -> String {
    format!("{}.{:02}%", bps / 100, bps % 100)
}

/// Human-readable split of one schedule
pub fn describe_schedule(schedule: &FeeSchedule) -> Vec<String> {
    let mut lines = vec![
        format!("  processing fee:    {}", format_bps(schedule.processing_fee_bps)),
        format!(
            "  reinforcement fee: {} -> {}",
            format_bps(schedule.reinforcement_fee_bps),
            schedule.reinforcement_destination
        ),
        format!("  settlement:        {}", schedule.settlement_destination),
    ];
    lines.extend(schedule.processing_shares.iter().map(|share| {
        format!("    {:>7} {}", format_bps(share.share_bps), share.destination)
    }));
    lines
}

pub async fn handle_presets_command(cli: &DistributionCli) -> CliResult<()> {
    handle_presets_command_impl(cli.format, &ConsoleOutput)
}

fn handle_presets_command_impl(format: OutputFormat, output: &dyn Output) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let presets: Vec<_> = SchedulePreset::ALL
                .iter()
                .map(|preset| {
                    json!({
                        "name": preset.name(),
                        "description": preset.description(),
                        "schedule": preset.schedule(),
                    })
                })
                .collect();
            output.print_json(&serde_json::Value::Array(presets))
        }
        OutputFormat::Table => {
            output.header("Fee schedule presets")?;
            for preset in SchedulePreset::ALL {
                output.print(&format!("{}: {}", preset.name(), preset.description()))?;
                for line in describe_schedule(&preset.schedule()) {
                    output.print(&line)?;
                }
            }
            Ok(())
        }
    }
}
