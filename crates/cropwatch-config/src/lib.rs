use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

// ─────────────────────────────────────────────────────────────────────────────
// Error
// ─────────────────────────────────────────────────────────────────────────────

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ─────────────────────────────────────────────────────────────────────────────
// Defaults
// ─────────────────────────────────────────────────────────────────────────────

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DATABASE_PATH: &str = "data/cropwatch.db";
pub const DEFAULT_PREDICTION_URL: &str = "http://www.psc-s.com/store/machinemodel/";
pub const DEFAULT_PREDICTION_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PREDICTION_MAX_RETRIES: u32 = 2;

// ─────────────────────────────────────────────────────────────────────────────
// Config Structs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub jwt_secret: String,
    pub prediction: PredictionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionConfig {
    pub url: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_PREDICTION_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_PREDICTION_TIMEOUT_SECS),
            max_retries: DEFAULT_PREDICTION_MAX_RETRIES,
        }
    }
}

impl ServerConfig {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let timeout_secs: u64 = parse_or(&lookup, "PREDICTION_TIMEOUT_SECS", DEFAULT_PREDICTION_TIMEOUT_SECS)?;

        Ok(Self {
            host: lookup("CROPWATCH_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(&lookup, "CROPWATCH_PORT", DEFAULT_PORT)?,
            database_path: lookup("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            jwt_secret,
            prediction: PredictionConfig {
                url: lookup("PREDICTION_URL").unwrap_or_else(|| DEFAULT_PREDICTION_URL.to_string()),
                timeout: Duration::from_secs(timeout_secs),
                max_retries: parse_or(&lookup, "PREDICTION_MAX_RETRIES", DEFAULT_PREDICTION_MAX_RETRIES)?,
            },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        info!("{key} not set, using default: {default}");
        return Ok(default);
    };

    raw.trim().parse::<T>().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = ServerConfig::from_lookup(lookup_from(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
        assert_eq!(config.database_path, DEFAULT_DATABASE_PATH);
        assert_eq!(config.prediction, PredictionConfig::default());
    }

    #[test]
    fn test_overrides_read() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("CROPWATCH_HOST", "127.0.0.1"),
            ("CROPWATCH_PORT", "9100"),
            ("DATABASE_PATH", "/tmp/farms.db"),
            ("PREDICTION_URL", "http://camera.local/predictions/"),
            ("PREDICTION_TIMEOUT_SECS", "3"),
            ("PREDICTION_MAX_RETRIES", "0"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr(), "127.0.0.1:9100");
        assert_eq!(config.database_path, "/tmp/farms.db");
        assert_eq!(config.prediction.url, "http://camera.local/predictions/");
        assert_eq!(config.prediction.timeout, Duration::from_secs(3));
        assert_eq!(config.prediction.max_retries, 0);
    }

    #[test]
    fn test_missing_secret_rejected() {
        let err = ServerConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));

        let err = ServerConfig::from_lookup(lookup_from(&[("JWT_SECRET", "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));
    }

    #[test]
    fn test_invalid_port_rejected() {
        let err = ServerConfig::from_lookup(lookup_from(&[("JWT_SECRET", "s3cret"), ("CROPWATCH_PORT", "http")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "CROPWATCH_PORT", .. }));
    }
}
