//! Application-level configuration loading, including the default fixture scheduling rules.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::services::weekday::WeekdayMask;

/// Default location on disk where the library looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "VOLLEY_LEAGUE_CONFIG_PATH";

/// Scheduling parameters used when a fixture request leaves them unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulingDefaults {
    pub matches_per_period: u32,
    pub period_weeks: u32,
    pub allowed_weekdays: WeekdayMask,
}

impl Default for SchedulingDefaults {
    fn default() -> Self {
        Self {
            matches_per_period: 1,
            period_weeks: 1,
            allowed_weekdays: WeekdayMask::all(),
        }
    }
}

#[derive(Debug, Clone, Default)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    scheduling: SchedulingDefaults,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        matches_per_period = app_config.scheduling.matches_per_period,
                        period_weeks = app_config.scheduling.period_weeks,
                        "loaded scheduling defaults from config"
                    );
                    app_config
                }
                Err(message) => {
                    warn!(
                        path = %path.display(),
                        error = %message,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON document, validating the weekday allow-list it carries.
    pub fn from_json(contents: &str) -> Result<Self, String> {
        let raw = serde_json::from_str::<RawConfig>(contents).map_err(|err| err.to_string())?;
        raw.try_into()
    }

    pub fn scheduling(&self) -> &SchedulingDefaults {
        &self.scheduling
    }

    pub fn with_scheduling(scheduling: SchedulingDefaults) -> Self {
        Self { scheduling }
    }
}

#[derive(Debug, Default, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    scheduling: RawScheduling,
}

#[derive(Debug, Default, Deserialize)]
struct RawScheduling {
    matches_per_period: Option<u32>,
    period_weeks: Option<u32>,
    allowed_weekdays: Option<Vec<bool>>,
}

impl TryFrom<RawConfig> for AppConfig {
    type Error = String;

    fn try_from(value: RawConfig) -> Result<Self, Self::Error> {
        let defaults = SchedulingDefaults::default();
        let raw = value.scheduling;
        let allowed_weekdays = match raw.allowed_weekdays {
            Some(flags) => WeekdayMask::try_from(flags.as_slice()).map_err(|err| err.to_string())?,
            None => defaults.allowed_weekdays,
        };
        let period_weeks = raw.period_weeks.unwrap_or(defaults.period_weeks);
        if period_weeks == 0 {
            return Err("scheduling.period_weeks must be at least 1".into());
        }

        Ok(Self {
            scheduling: SchedulingDefaults {
                matches_per_period: raw
                    .matches_per_period
                    .unwrap_or(defaults.matches_per_period),
                period_weeks,
                allowed_weekdays,
            },
        })
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config.scheduling(), &SchedulingDefaults::default());
    }

    #[test]
    fn scheduling_section_overrides_defaults() {
        let config = AppConfig::from_json(
            r#"{"scheduling": {"matches_per_period": 2, "period_weeks": 2,
                "allowed_weekdays": [false, false, false, false, false, true, true]}}"#,
        )
        .unwrap();

        let scheduling = config.scheduling();
        assert_eq!(scheduling.matches_per_period, 2);
        assert_eq!(scheduling.period_weeks, 2);
        assert!(!scheduling.allowed_weekdays.allows(time::Weekday::Monday));
        assert!(scheduling.allowed_weekdays.allows(time::Weekday::Sunday));
    }

    #[test]
    fn malformed_weekdays_are_rejected() {
        assert!(AppConfig::from_json(r#"{"scheduling": {"allowed_weekdays": [true]}}"#).is_err());
        assert!(
            AppConfig::from_json(r#"{"scheduling": {"allowed_weekdays": [false, false, false, false, false, false, false]}}"#)
                .is_err()
        );
        assert!(AppConfig::from_json(r#"{"scheduling": {"period_weeks": 0}}"#).is_err());
    }
}
