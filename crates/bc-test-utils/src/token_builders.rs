//! Builders for signed test tokens.
//!
//! Tokens are really signed (HS256 against [`TEST_JWT_SECRET`]) so tests
//! exercise the production verification path end to end.

use chrono::{Duration, Utc};
use common::jwt::{Role, UserClaims};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

/// Shared signing secret for test tokens. Verifiers under test must be
/// constructed with the same value.
pub const TEST_JWT_SECRET: &str = "podium-test-signing-secret";

/// Fluent builder for participant test tokens.
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_user("alice")
///     .with_role(Role::Host)
///     .expires_in(3600)
///     .build();
/// ```
pub struct TestTokenBuilder {
    sub: String,
    role: Role,
    exp: i64,
    iat: i64,
    secret: String,
}

impl TestTokenBuilder {
    /// Create a builder with defaults: a viewer token for "test-user",
    /// valid for an hour, signed with [`TEST_JWT_SECRET`].
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: "test-user".to_string(),
            role: Role::Viewer,
            exp: (now + Duration::seconds(3600)).timestamp(),
            iat: now.timestamp(),
            secret: TEST_JWT_SECRET.to_string(),
        }
    }

    /// Set the subject (user id).
    pub fn for_user(mut self, subject: &str) -> Self {
        self.sub = subject.to_string();
        self
    }

    /// Set the role claim.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Set expiration in seconds from now (negative for already-expired).
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    /// Set the issued-at timestamp.
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = timestamp;
        self
    }

    /// Sign with a different secret (for invalid-signature tests).
    pub fn signed_with(mut self, secret: &str) -> Self {
        self.secret = secret.to_string();
        self
    }

    /// Build the signed token.
    pub fn build(self) -> String {
        let claims = UserClaims {
            sub: self.sub,
            role: self.role,
            exp: self.exp,
            iat: self.iat,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .expect("test token encoding should not fail")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A valid host token for `user_id`.
pub fn host_token(user_id: &str) -> String {
    TestTokenBuilder::new()
        .for_user(user_id)
        .with_role(Role::Host)
        .build()
}

/// A valid viewer token for `user_id`.
pub fn viewer_token(user_id: &str) -> String {
    TestTokenBuilder::new()
        .for_user(user_id)
        .with_role(Role::Viewer)
        .build()
}
