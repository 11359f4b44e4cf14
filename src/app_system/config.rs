use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("{key} has an invalid value: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Request buffer of each store actor.
    pub actor_buffer: usize,
    /// Default cap for ride history queries.
    pub history_limit: usize,
    /// How often the reconciler sweeps the two stores.
    pub reconcile_interval: Duration,
    /// Prefix for local phone numbers.
    pub country_code: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            actor_buffer: 32,
            history_limit: 50,
            reconcile_interval: Duration::from_secs(30),
            country_code: "+966".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            actor_buffer: parse_or(&lookup, "RIDE_ACTOR_BUFFER", defaults.actor_buffer)?,
            history_limit: parse_or(&lookup, "RIDE_HISTORY_LIMIT", defaults.history_limit)?,
            reconcile_interval: Duration::from_secs(parse_or(
                &lookup,
                "RIDE_RECONCILE_INTERVAL_SECS",
                defaults.reconcile_interval.as_secs(),
            )?),
            country_code: lookup("RIDE_COUNTRY_CODE").unwrap_or(defaults.country_code),
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}
