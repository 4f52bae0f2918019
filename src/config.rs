//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::domain::Credentials;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Base URL of the third-party financial-data API
    pub upstream_base_url: String,

    /// Credentials exchanged for upstream access tokens
    pub upstream_credentials: Credentials,

    /// Access token to start with, before any credential exchange
    pub upstream_token: Option<String>,

    /// Per-request timeout for upstream calls; `None` means no timeout
    pub upstream_timeout: Option<Duration>,

    /// Maximum in-flight per-user queries during aggregation (0 = unbounded)
    pub aggregation_concurrency: usize,

    /// Browser origin allowed by CORS; any origin when unset
    pub cors_allowed_origin: Option<String>,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &'static str| var(key).ok_or(ConfigError::MissingEnv(key));

        let host = var("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = var("PORT")
            .unwrap_or_else(|| "5000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let upstream_base_url = required("UPSTREAM_BASE_URL")?;
        let upstream_credentials = Credentials::new(
            required("UPSTREAM_USERNAME")?,
            required("UPSTREAM_PASSWORD")?,
        );
        let upstream_token = var("UPSTREAM_TOKEN");

        let upstream_timeout = var("UPSTREAM_TIMEOUT_SECS")
            .map(|secs| {
                secs.parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs)
                    .ok_or(ConfigError::InvalidValue("UPSTREAM_TIMEOUT_SECS"))
            })
            .transpose()?;

        let aggregation_concurrency = var("AGGREGATION_CONCURRENCY")
            .unwrap_or_else(|| "0".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("AGGREGATION_CONCURRENCY"))?;

        let cors_allowed_origin = var("CORS_ALLOWED_ORIGIN");

        let environment = var("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        Ok(Self {
            host,
            port,
            upstream_base_url,
            upstream_credentials,
            upstream_token,
            upstream_timeout,
            aggregation_concurrency,
            cors_allowed_origin,
            environment,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("UPSTREAM_BASE_URL", "https://api.example.com"),
        ("UPSTREAM_USERNAME", "gateway"),
        ("UPSTREAM_PASSWORD", "secret"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(REQUIRED).unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 5000);
        assert_eq!(config.upstream_base_url, "https://api.example.com");
        assert_eq!(config.upstream_credentials.username(), "gateway");
        assert!(config.upstream_token.is_none());
        assert!(config.upstream_timeout.is_none());
        assert_eq!(config.aggregation_concurrency, 0);
        assert!(config.cors_allowed_origin.is_none());
        assert!(!config.is_production());
    }

    #[test]
    fn test_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("PORT", "8080"),
            ("UPSTREAM_TOKEN", "seed"),
            ("UPSTREAM_TIMEOUT_SECS", "15"),
            ("AGGREGATION_CONCURRENCY", "4"),
            ("ENVIRONMENT", "production"),
        ]);

        let config = load(&vars).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.upstream_token.as_deref(), Some("seed"));
        assert_eq!(config.upstream_timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.aggregation_concurrency, 4);
        assert!(config.is_production());
    }

    #[test]
    fn test_missing_required_variable() {
        let err = load(&REQUIRED[..2]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv("UPSTREAM_PASSWORD")));
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let mut vars = REQUIRED.to_vec();
        vars[0] = ("UPSTREAM_BASE_URL", "  ");

        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv("UPSTREAM_BASE_URL")));
    }

    #[test]
    fn test_invalid_values() {
        for (key, value) in [
            ("PORT", "eighty"),
            ("UPSTREAM_TIMEOUT_SECS", "0"),
            ("AGGREGATION_CONCURRENCY", "-1"),
        ] {
            let mut vars = REQUIRED.to_vec();
            vars.push((key, value));

            let err = load(&vars).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue(k) if k == key),
                "{} = {} should be invalid",
                key,
                value
            );
        }
    }
}
