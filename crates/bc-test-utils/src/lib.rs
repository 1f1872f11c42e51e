//! # BC Test Utilities
//!
//! Shared test utilities for the Broadcast Controller service: an in-memory
//! session store with failure injection, and signed participant tokens for
//! exercising the real JWT verification path.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bc_test_utils::{host_token, MockSessionStore};
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let store = MockSessionStore::new().with_session("S1", "alice", "Intro to Rust");
//!
//!     // Drive the controller with a real signed token...
//!     let credential = host_token("alice");
//!
//!     // ...and assert against the store afterwards.
//!     assert!(store.record("S1").unwrap().live);
//! }
//! ```

pub mod mock_store;
pub mod token_builders;

pub use mock_store::MockSessionStore;
pub use token_builders::{host_token, viewer_token, TestTokenBuilder, TEST_JWT_SECRET};
