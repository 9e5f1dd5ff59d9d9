//! Command handlers
//!
//! Each handler takes its parsed arguments plus an [`crate::output::Output`]
//! so it can run against captured output in tests.

pub mod plan;
pub mod presets;
pub mod simulate;
pub mod validate;

use lib_distribution::{FeeSchedule, SchedulePreset};

use crate::config::{ConfigError, DistributionConfig};
use crate::error::CliResult;

/// `--preset` when given, otherwise whatever the configuration selects
pub(crate) fn select_schedule(
    preset: Option<&str>,
    config: &DistributionConfig,
) -> CliResult<FeeSchedule> {
    match preset {
        Some(name) => {
            let preset: SchedulePreset = name.parse().map_err(ConfigError::UnknownPreset)?;
            Ok(preset.schedule())
        }
        None => Ok(config.schedule()?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;

    #[test]
    fn test_preset_flag_wins_over_config() {
        let config = DistributionConfig::default();
        let schedule = select_schedule(Some("net-split"), &config).unwrap();
        assert_eq!(schedule, FeeSchedule::net_split());
        assert_eq!(select_schedule(None, &config).unwrap(), FeeSchedule::standard());
    }

    #[test]
    fn test_unknown_preset_flag() {
        let err = select_schedule(Some("triple"), &DistributionConfig::default()).unwrap_err();
        assert!(matches!(err, CliError::Config(ConfigError::UnknownPreset(_))));
    }
}
