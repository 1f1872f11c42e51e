//! Broadcast Controller configuration.
//!
//! Loaded from environment variables; sensitive fields are wrapped in
//! `SecretString` and redacted in Debug output.

use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default bind address for the HTTP/WebSocket server.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default clock skew allowance for token `iat` validation, in seconds.
pub const DEFAULT_JWT_CLOCK_SKEW_SECONDS: u64 = 300;

/// Default instance id prefix.
pub const DEFAULT_INSTANCE_ID_PREFIX: &str = "bc";

/// Broadcast Controller configuration.
#[derive(Clone)]
pub struct Config {
    /// Redis connection URL for the session store.
    /// Protected by `SecretString`: URLs can embed credentials.
    pub redis_url: SecretString,

    /// Shared HS256 secret for participant tokens.
    pub jwt_secret: SecretString,

    /// HTTP/WebSocket bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Clock skew allowance for token `iat` validation, in seconds.
    pub jwt_clock_skew_seconds: u64,

    /// Unique identifier for this instance, used for log correlation.
    pub instance_id: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("redis_url", &"[REDACTED]")
            .field("jwt_secret", &"[REDACTED]")
            .field("bind_address", &self.bind_address)
            .field("jwt_clock_skew_seconds", &self.jwt_clock_skew_seconds)
            .field("instance_id", &self.instance_id)
            .finish()
    }
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let redis_url = SecretString::from(
            vars.get("REDIS_URL")
                .ok_or_else(|| ConfigError::MissingEnvVar("REDIS_URL".to_string()))?
                .clone(),
        );

        let jwt_secret = SecretString::from(
            vars.get("BC_JWT_SECRET")
                .ok_or_else(|| ConfigError::MissingEnvVar("BC_JWT_SECRET".to_string()))?
                .clone(),
        );

        let bind_address = vars
            .get("BC_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let jwt_clock_skew_seconds = match vars.get("BC_JWT_CLOCK_SKEW_SECONDS") {
            Some(raw) => raw.parse().map_err(|_| {
                ConfigError::InvalidValue(format!(
                    "BC_JWT_CLOCK_SKEW_SECONDS must be an integer, got {raw:?}"
                ))
            })?,
            None => DEFAULT_JWT_CLOCK_SKEW_SECONDS,
        };

        let instance_id = vars.get("BC_INSTANCE_ID").cloned().unwrap_or_else(|| {
            let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string());
            let uuid_suffix = uuid::Uuid::new_v4().to_string();
            let short_suffix = uuid_suffix.get(..8).unwrap_or("00000000");
            format!("{DEFAULT_INSTANCE_ID_PREFIX}-{hostname}-{short_suffix}")
        });

        Ok(Config {
            redis_url,
            jwt_secret,
            bind_address,
            jwt_clock_skew_seconds,
            instance_id,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use common::secret::ExposeSecret;

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([
            (
                "REDIS_URL".to_string(),
                "redis://localhost:6379".to_string(),
            ),
            (
                "BC_JWT_SECRET".to_string(),
                "test-signing-secret".to_string(),
            ),
        ])
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(&base_vars()).unwrap();
        assert_eq!(config.redis_url.expose_secret(), "redis://localhost:6379");
        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(
            config.jwt_clock_skew_seconds,
            DEFAULT_JWT_CLOCK_SKEW_SECONDS
        );
        assert!(config.instance_id.starts_with("bc-"));
    }

    #[test]
    fn test_custom_values() {
        let mut vars = base_vars();
        vars.insert("BC_BIND_ADDRESS".to_string(), "127.0.0.1:9090".to_string());
        vars.insert("BC_JWT_CLOCK_SKEW_SECONDS".to_string(), "60".to_string());
        vars.insert("BC_INSTANCE_ID".to_string(), "bc-custom-001".to_string());

        let config = Config::from_vars(&vars).unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:9090");
        assert_eq!(config.jwt_clock_skew_seconds, 60);
        assert_eq!(config.instance_id, "bc-custom-001");
    }

    #[test]
    fn test_missing_redis_url() {
        let mut vars = base_vars();
        vars.remove("REDIS_URL");
        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "REDIS_URL"));
    }

    #[test]
    fn test_missing_jwt_secret() {
        let mut vars = base_vars();
        vars.remove("BC_JWT_SECRET");
        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "BC_JWT_SECRET"));
    }

    #[test]
    fn test_invalid_clock_skew_rejected() {
        let mut vars = base_vars();
        vars.insert(
            "BC_JWT_CLOCK_SKEW_SECONDS".to_string(),
            "not-a-number".to_string(),
        );
        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config::from_vars(&base_vars()).unwrap();
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("redis://"));
        assert!(!debug.contains("test-signing-secret"));
    }
}
