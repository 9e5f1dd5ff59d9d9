//! `validate`: check a deployment's schedule and destination table

use serde_json::json;

use crate::argument_parsing::{DistributionCli, OutputFormat, ValidateArgs};
use crate::config::DistributionConfig;
use crate::error::CliResult;
use crate::output::{ConsoleOutput, Output};

pub async fn handle_validate_command(args: ValidateArgs, cli: &DistributionCli) -> CliResult<()> {
    let config = cli.load_config().await?;
    handle_validate_command_impl(&config, args.strict, cli.format, &ConsoleOutput)
}

fn handle_validate_command_impl(
    config: &DistributionConfig,
    strict: bool,
    format: OutputFormat,
    output: &dyn Output,
) -> CliResult<()> {
    let report = config.validate(strict)?;

    match format {
        OutputFormat::Json => output.print_json(&json!({
            "schedule": report.schedule.name,
            "valid": true,
            "destinations": config.destinations.len(),
            "missing": report.missing,
        })),
        OutputFormat::Table => {
            output.success(&format!(
                "Schedule '{}' is valid ({} destinations configured)",
                report.schedule.name,
                config.destinations.len()
            ))?;
            for key in &report.missing {
                output.warning(&format!("No address for '{}'; its legs will be skipped", key))?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::error::CliError;
    use crate::output::testing::MockOutput;

    #[test]
    fn test_lenient_validation_warns_per_missing_key() {
        let config = DistributionConfig::from_toml_str(
            "[destinations]\nsettlementReserve = \"0x1111111111111111111111111111111111111111\"\n",
        )
        .unwrap();
        let output = MockOutput::new();

        handle_validate_command_impl(&config, false, OutputFormat::Table, &output).unwrap();

        output.assert_contains_message("Schedule 'standard' is valid (1 destinations configured)");
        output.assert_contains_message("No address for 'h4hNonprofit'");
        assert_eq!(output.get_messages().len(), 6);
    }

    #[test]
    fn test_strict_validation_fails() {
        let output = MockOutput::new();
        let err = handle_validate_command_impl(
            &DistributionConfig::default(),
            true,
            OutputFormat::Table,
            &output,
        )
        .unwrap_err();

        assert!(matches!(err, CliError::Config(ConfigError::MissingDestinations(_))));
        assert!(output.get_messages().is_empty());
    }

    #[test]
    fn test_json_report() {
        let output = MockOutput::new();
        handle_validate_command_impl(&DistributionConfig::default(), false, OutputFormat::Json, &output)
            .unwrap();

        let printed: serde_json::Value = serde_json::from_str(&output.get_messages()[0]).unwrap();
        assert_eq!(printed["valid"], true);
        assert_eq!(printed["missing"].as_array().unwrap().len(), 6);
    }
}
