//! In-memory session store for controller testing.
//!
//! Implements the real `SessionStore` trait over a shared `HashMap`, with
//! failure injection for the store-atomicity tests and per-session write
//! counters for at-most-one-teardown assertions.

use async_trait::async_trait;
use broadcast_controller::store::{SessionRecord, SessionStore, StoreError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Inner {
    sessions: HashMap<String, SessionRecord>,
    fail_mark_live: bool,
    fail_clear_live: bool,
    clear_live_calls: HashMap<String, usize>,
}

/// Mock session store with builder-style seeding.
#[derive(Debug, Clone, Default)]
pub struct MockSessionStore {
    inner: Arc<Mutex<Inner>>,
}

impl MockSessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a session record (not live).
    #[must_use]
    pub fn with_session(self, session_id: &str, owner_id: &str, title: &str) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.sessions.insert(
                session_id.to_string(),
                SessionRecord {
                    owner_id: owner_id.to_string(),
                    title: title.to_string(),
                    live: false,
                    room_id: None,
                },
            );
        }
        self
    }

    /// Make subsequent `mark_live` calls fail.
    pub fn fail_mark_live(&self, fail: bool) {
        self.inner.lock().unwrap().fail_mark_live = fail;
    }

    /// Make subsequent `clear_live` calls fail.
    pub fn fail_clear_live(&self, fail: bool) {
        self.inner.lock().unwrap().fail_clear_live = fail;
    }

    /// Current record for a session, if any.
    pub fn record(&self, session_id: &str) -> Option<SessionRecord> {
        self.inner.lock().unwrap().sessions.get(session_id).cloned()
    }

    /// Number of `clear_live` calls seen for a session (failed ones included).
    pub fn clear_live_calls(&self, session_id: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .clear_live_calls
            .get(session_id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl SessionStore for MockSessionStore {
    async fn get_session(&self, session_id: &str) -> Result<SessionRecord, StoreError> {
        self.inner
            .lock()
            .unwrap()
            .sessions
            .get(session_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn mark_live(&self, session_id: &str, room_id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_mark_live {
            return Err(StoreError::Backend("injected mark_live failure".to_string()));
        }
        let record = inner
            .sessions
            .get_mut(session_id)
            .ok_or(StoreError::NotFound)?;
        record.live = true;
        record.room_id = Some(room_id.to_string());
        Ok(())
    }

    async fn clear_live(&self, session_id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        *inner
            .clear_live_calls
            .entry(session_id.to_string())
            .or_insert(0) += 1;
        if inner.fail_clear_live {
            return Err(StoreError::Backend(
                "injected clear_live failure".to_string(),
            ));
        }
        let record = inner
            .sessions
            .get_mut(session_id)
            .ok_or(StoreError::NotFound)?;
        record.live = false;
        record.room_id = None;
        Ok(())
    }
}
