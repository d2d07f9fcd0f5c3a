//! Configuration loading and representation.

use std::env;

use thiserror::Error;

use hotelsupply_observability::TelemetryConfig;

pub const RESERVATION_RETRIES_VAR: &str = "HOTELSUPPLY_RESERVATION_RETRIES";
pub const LOG_LEVEL_VAR: &str = "HOTELSUPPLY_LOG_LEVEL";
pub const LOG_JSON_VAR: &str = "HOTELSUPPLY_LOG_JSON";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a non-negative integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} must be true or false, got '{value}'")]
    InvalidBool { key: &'static str, value: String },
}

/// Settings for the contract and reservation services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfraConfig {
    /// How many times a reservation is replanned after losing an optimistic commit.
    pub reservation_retry_limit: u32,
    pub telemetry: TelemetryConfig,
}

impl Default for InfraConfig {
    fn default() -> Self {
        Self {
            reservation_retry_limit: 3,
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl InfraConfig {
    /// Read settings from the process environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup` (a variable name to value function).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let reservation_retry_limit = match lookup(RESERVATION_RETRIES_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidNumber {
                    key: RESERVATION_RETRIES_VAR,
                    value: raw.clone(),
                })?,
            None => defaults.reservation_retry_limit,
        };

        let log_level = lookup(LOG_LEVEL_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.telemetry.log_level);

        let json = match lookup(LOG_JSON_VAR) {
            Some(raw) => parse_bool(LOG_JSON_VAR, &raw)?,
            None => defaults.telemetry.json,
        };

        Ok(Self {
            reservation_retry_limit,
            telemetry: TelemetryConfig { log_level, json },
        })
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = InfraConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, InfraConfig::default());
        assert_eq!(config.reservation_retry_limit, 3);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.telemetry.json);
    }

    #[test]
    fn values_are_read_from_lookup() {
        let config = InfraConfig::from_lookup(lookup(&[
            (RESERVATION_RETRIES_VAR, " 7 "),
            (LOG_LEVEL_VAR, "hotelsupply_infra=debug"),
            (LOG_JSON_VAR, "off"),
        ]))
        .unwrap();

        assert_eq!(config.reservation_retry_limit, 7);
        assert_eq!(config.telemetry.log_level, "hotelsupply_infra=debug");
        assert!(!config.telemetry.json);
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = InfraConfig::from_lookup(lookup(&[(RESERVATION_RETRIES_VAR, "-1")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                key: RESERVATION_RETRIES_VAR,
                value: "-1".to_string()
            }
        );

        let err = InfraConfig::from_lookup(lookup(&[(LOG_JSON_VAR, "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBool { .. }));
    }
}
