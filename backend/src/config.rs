use std::{env, fmt::Display, str::FromStr};

use thiserror::Error;
use tracing::info;

pub const DEFAULT_PORT: &str = "5000";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://user-form.db?mode=rwc";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid {key} value {value:?}: {reason}")]
pub struct ConfigError {
    pub key: String,
    pub value: String,
    pub reason: String,
}

impl Config {
    /// Reads `HOST`, `PORT` and `DATABASE_URL`, falling back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            host: try_load(&lookup, "HOST", DEFAULT_HOST)?,
            port: try_load(&lookup, "PORT", DEFAULT_PORT)?,
            database_url: try_load(&lookup, "DATABASE_URL", DEFAULT_DATABASE_URL)?,
        })
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value.parse().map_err(|e: T::Err| ConfigError {
        key: key.to_string(),
        value: value.clone(),
        reason: e.to_string(),
    })
}
