//! Session store interface.
//!
//! The persisted record for a broadcast session lives outside this service;
//! the controller consumes it through the [`SessionStore`] trait. The
//! production implementation is Redis-backed ([`redis::RedisSessionStore`]);
//! tests substitute an in-memory mock behind the same trait.
//!
//! Room state itself is never persisted here - rooms are process memory and
//! vanish on restart. Only the session's `live` flag and room correlation id
//! are written back, so late joiners and other services can see whether a
//! broadcast is running.

pub mod redis;

pub use self::redis::RedisSessionStore;

use async_trait::async_trait;
use thiserror::Error;

/// A session's persisted record, as this service sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// User id of the session's registered owner.
    pub owner_id: String,
    /// Session title, echoed in start/join notifications.
    pub title: String,
    /// Whether the session is currently flagged live.
    pub live: bool,
    /// Correlation id of the live room, if any.
    pub room_id: Option<String>,
}

/// Errors from session store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record for the requested session.
    #[error("Session not found")]
    NotFound,

    /// Backend failure (connectivity, protocol, corrupt record).
    #[error("Session store backend error: {0}")]
    Backend(String),
}

/// Persisted session state consumed by the lifecycle controller.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch a session's record.
    async fn get_session(&self, session_id: &str) -> Result<SessionRecord, StoreError>;

    /// Flag a session live and record its room correlation id.
    async fn mark_live(&self, session_id: &str, room_id: &str) -> Result<(), StoreError>;

    /// Clear a session's live flag and room correlation id.
    async fn clear_live(&self, session_id: &str) -> Result<(), StoreError>;
}
