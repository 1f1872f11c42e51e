//! Broadcast Controller error types.
//!
//! Every failed intent is reported to the requesting connection as a
//! structured `error{message}` event built from [`BcError::client_message`].
//! Internal details (store backends, channel failures) are logged server-side
//! and never exposed to clients.

use thiserror::Error;

/// Broadcast Controller error type.
#[derive(Debug, Error)]
pub enum BcError {
    /// Credential missing, malformed, or failed validation.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Wrong role, or not the registered host of the session.
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// No session or room matching the request.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request conflicts with current room state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The request is structurally valid but semantically impossible.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Session store operation failed.
    #[error("Session store error: {0}")]
    Store(String),

    /// Internal error (actor channel failures and the like).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BcError {
    /// Returns a client-safe error message (no internal details).
    pub fn client_message(&self) -> String {
        match self {
            BcError::Authentication(msg)
            | BcError::Authorization(msg)
            | BcError::NotFound(msg)
            | BcError::Conflict(msg)
            | BcError::InvalidRequest(msg) => msg.clone(),
            BcError::Store(_) | BcError::Internal(_) => "An internal error occurred".to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_pass_message_through() {
        assert_eq!(
            BcError::NotFound("Webinar is not live".to_string()).client_message(),
            "Webinar is not live"
        );
        assert_eq!(
            BcError::Conflict("Stream is already live".to_string()).client_message(),
            "Stream is already live"
        );
        assert_eq!(
            BcError::Authorization("Not authorized to host this webinar".to_string())
                .client_message(),
            "Not authorized to host this webinar"
        );
    }

    #[test]
    fn test_internal_errors_are_sanitized() {
        let store_err = BcError::Store("redis://10.0.0.5:6379 connection refused".to_string());
        assert_eq!(store_err.client_message(), "An internal error occurred");
        assert!(!store_err.client_message().contains("10.0.0.5"));

        let internal = BcError::Internal("channel send failed".to_string());
        assert_eq!(internal.client_message(), "An internal error occurred");
    }

    #[test]
    fn test_display_keeps_detail_for_logs() {
        let err = BcError::Store("timeout".to_string());
        assert_eq!(format!("{err}"), "Session store error: timeout");
    }
}
