//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports from the [`secrecy`] crate, used for every sensitive value the
//! services hold: the JWT signing secret, the Redis connection URL, and any
//! credential that passes through configuration.
//!
//! `SecretString` implements `Debug` with redaction, so a struct that derives
//! `Debug` while holding one cannot leak it through `{:?}` or a tracing
//! field. Values are zeroized on drop.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct Config {
//!     bind_address: String,
//!     jwt_secret: SecretString,
//! }
//!
//! let config = Config {
//!     bind_address: "0.0.0.0:8080".to_string(),
//!     jwt_secret: SecretString::from("hunter2"),
//! };
//!
//! // Redacted: the secret never appears in Debug output.
//! assert!(!format!("{config:?}").contains("hunter2"));
//!
//! // Access requires an explicit expose_secret() call.
//! let secret: &str = config.jwt_secret.expose_secret();
//! ```

pub use secrecy::{ExposeSecret, SecretBox, SecretString};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretString::from("signing-key-bytes");
        let debug = format!("{secret:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("signing-key-bytes"));
    }

    #[test]
    fn test_expose_secret_returns_inner_value() {
        let secret = SecretString::from("redis://user:pw@localhost:6379");
        assert_eq!(secret.expose_secret(), "redis://user:pw@localhost:6379");
    }

    #[test]
    fn test_deserializes_from_config_json() {
        #[derive(Debug, Deserialize)]
        struct Creds {
            name: String,
            token: SecretString,
        }

        let json = r#"{"name": "podium", "token": "abc-123"}"#;
        let creds: Creds = serde_json::from_str(json).unwrap();

        assert_eq!(creds.name, "podium");
        assert_eq!(creds.token.expose_secret(), "abc-123");
        assert!(!format!("{creds:?}").contains("abc-123"));
    }

    #[test]
    fn test_clone_preserves_value() {
        let secret = SecretString::from("cloneable");
        assert_eq!(secret.clone().expose_secret(), "cloneable");
    }
}
