//! Credential verification.
//!
//! The controller never looks at a raw credential; it goes through an
//! [`IdentityVerifier`] which resolves it to a [`Principal`] exactly once.
//! The production implementation validates HS256 participant tokens; tests
//! substitute their own issuers behind the same trait.

use crate::errors::BcError;
use common::jwt::{self, Role};
use common::secret::{ExposeSecret, SecretString};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// The authenticated identity behind an intent.
#[derive(Clone, PartialEq, Eq)]
pub struct Principal {
    /// User identifier from the token subject.
    pub user_id: String,
    /// Participant role.
    pub role: Role,
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("user_id", &"[REDACTED]")
            .field("role", &self.role)
            .finish()
    }
}

/// Resolves a bearer credential to a [`Principal`].
pub trait IdentityVerifier: Send + Sync {
    /// Validate `credential` and return the principal it identifies.
    fn verify(&self, credential: &str) -> Result<Principal, BcError>;
}

/// HS256 participant-token verifier.
pub struct JwtVerifier {
    secret: SecretString,
    clock_skew: Duration,
}

impl JwtVerifier {
    /// Create a verifier from the shared signing secret.
    #[must_use]
    pub fn new(secret: SecretString, clock_skew: Duration) -> Self {
        Self { secret, clock_skew }
    }
}

impl IdentityVerifier for JwtVerifier {
    fn verify(&self, credential: &str) -> Result<Principal, BcError> {
        let claims = jwt::validate_user_token(
            credential,
            self.secret.expose_secret().as_bytes(),
            self.clock_skew,
        )
        .map_err(|e| {
            debug!(target: "bc.auth", error = ?e, "Credential rejected");
            BcError::Authentication(e.to_string())
        })?;

        Ok(Principal {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}
