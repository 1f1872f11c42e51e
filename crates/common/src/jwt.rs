//! JWT utilities shared across Podium services.
//!
//! This module provides the claims structure carried by participant access
//! tokens and the validation helpers services use before trusting one:
//! - Size limits for DoS prevention
//! - HS256 signature and expiry validation
//! - `iat` clock-skew validation
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Only HS256 is accepted; the algorithm list is pinned
//! - Generic error messages prevent information leakage
//! - The `sub` field in claims is redacted in Debug output

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Maximum allowed JWT size in bytes (8KB).
///
/// Tokens larger than this are rejected BEFORE any base64 decoding or
/// signature verification. Typical participant tokens are 200-400 bytes;
/// anything near this limit is abuse, not expansion.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Default clock skew tolerance for `iat` validation (5 minutes).
///
/// Tokens whose issued-at timestamp is further than this in the future
/// are rejected.
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(300);

/// Errors that can occur during token validation.
///
/// Messages are intentionally generic; the precise cause is logged at debug
/// level by the caller, never surfaced to clients.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds [`MAX_JWT_SIZE_BYTES`].
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Signature, structure, or expiry check failed.
    #[error("The access token is invalid or expired")]
    InvalidToken,

    /// Token `iat` claim is too far in the future.
    #[error("The access token is invalid or expired")]
    IatTooFarInFuture,
}

/// Role carried in a participant token.
///
/// A closed variant set: every consumer matches exhaustively, so an
/// unrecognized role string fails at deserialization rather than slipping
/// through a string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May originate a broadcast for sessions they own.
    Host,
    /// May join live broadcasts as a receiver.
    Viewer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Host => write!(f, "host"),
            Role::Viewer => write!(f, "viewer"),
        }
    }
}

/// Participant token claims.
///
/// # Fields
///
/// - `sub`: user identifier, redacted in Debug output
/// - `role`: participant role (host or viewer)
/// - `exp`: expiration timestamp (Unix epoch seconds)
/// - `iat`: issued-at timestamp (Unix epoch seconds)
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    /// Subject (user identifier) - redacted in Debug output.
    pub sub: String,

    /// Participant role.
    pub role: Role,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Issued-at timestamp (Unix epoch seconds).
    pub iat: i64,
}

impl fmt::Debug for UserClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserClaims")
            .field("sub", &"[REDACTED]")
            .field("role", &self.role)
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .finish()
    }
}

/// Validate `iat` against the allowed clock skew.
///
/// Rejects tokens issued further in the future than `clock_skew` allows.
/// Tokens issued in the past are fine; `exp` bounds their lifetime.
pub fn validate_iat(iat: i64, clock_skew: Duration) -> Result<(), JwtValidationError> {
    let now = Utc::now().timestamp();
    let skew = i64::try_from(clock_skew.as_secs()).unwrap_or(i64::MAX);
    if iat > now + skew {
        return Err(JwtValidationError::IatTooFarInFuture);
    }
    Ok(())
}

/// Validate a participant token end to end.
///
/// Order matters: the size cap runs before any parsing, then signature and
/// `exp` via HS256, then the explicit `iat` skew check.
pub fn validate_user_token(
    token: &str,
    secret: &[u8],
    clock_skew: Duration,
) -> Result<UserClaims, JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        return Err(JwtValidationError::TokenTooLarge);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["exp"]);

    let data = jsonwebtoken::decode::<UserClaims>(
        token,
        &DecodingKey::from_secret(secret),
        &validation,
    )
    .map_err(|_| JwtValidationError::InvalidToken)?;

    validate_iat(data.claims.iat, clock_skew)?;

    Ok(data.claims)
}
