//! Redis-backed session store.
//!
//! # Key Patterns
//!
//! - `session:{id}` - session record (HASH with fields `owner`, `title`,
//!   `live` as "0"/"1", and `room`)
//!
//! The hash is written by the platform's CRUD surface; this service reads it
//! and flips the live fields.
//!
//! # Connection Pattern
//!
//! The redis-rs `MultiplexedConnection` is cheap to clone and safe to use
//! concurrently, so each operation clones it instead of locking.

use super::{SessionRecord, SessionStore, StoreError};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use std::collections::HashMap;
use tracing::{debug, error};

fn session_key(session_id: &str) -> String {
    format!("session:{session_id}")
}

/// Session store over a shared multiplexed Redis connection.
#[derive(Clone)]
pub struct RedisSessionStore {
    connection: MultiplexedConnection,
}

impl RedisSessionStore {
    /// Connect to Redis and return a ready store.
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        // Do NOT log redis_url: it may embed credentials.
        let client = Client::open(redis_url).map_err(|e| {
            error!(target: "bc.store", error = %e, "Failed to open Redis client");
            StoreError::Backend(format!("Failed to open Redis client: {e}"))
        })?;

        let connection = client.get_multiplexed_async_connection().await.map_err(|e| {
            error!(target: "bc.store", error = %e, "Failed to connect to Redis");
            StoreError::Backend(format!("Failed to connect to Redis: {e}"))
        })?;

        Ok(Self { connection })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get_session(&self, session_id: &str) -> Result<SessionRecord, StoreError> {
        let mut conn = self.connection.clone();
        let key = session_key(session_id);

        let fields: HashMap<String, String> = conn.hgetall(&key).await.map_err(|e| {
            error!(target: "bc.store", session_id = %session_id, error = %e, "Failed to read session hash");
            StoreError::Backend(format!("Failed to read session: {e}"))
        })?;

        if fields.is_empty() {
            return Err(StoreError::NotFound);
        }

        let owner_id = fields
            .get("owner")
            .cloned()
            .ok_or_else(|| StoreError::Backend("session hash missing owner field".to_string()))?;

        Ok(SessionRecord {
            owner_id,
            title: fields.get("title").cloned().unwrap_or_default(),
            live: fields.get("live").is_some_and(|v| v == "1"),
            room_id: fields.get("room").cloned(),
        })
    }

    async fn mark_live(&self, session_id: &str, room_id: &str) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let key = session_key(session_id);

        // Only flag sessions that exist; this service never creates records.
        let exists: bool = conn.exists(&key).await.map_err(|e| {
            error!(target: "bc.store", session_id = %session_id, error = %e, "Failed to check session existence");
            StoreError::Backend(format!("Failed to check session: {e}"))
        })?;
        if !exists {
            return Err(StoreError::NotFound);
        }

        let _: () = conn
            .hset_multiple(&key, &[("live", "1"), ("room", room_id)])
            .await
            .map_err(|e| {
                error!(target: "bc.store", session_id = %session_id, error = %e, "Failed to mark session live");
                StoreError::Backend(format!("Failed to mark session live: {e}"))
            })?;

        debug!(target: "bc.store", session_id = %session_id, room_id = %room_id, "Session marked live");
        Ok(())
    }

    async fn clear_live(&self, session_id: &str) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let key = session_key(session_id);

        let exists: bool = conn.exists(&key).await.map_err(|e| {
            error!(target: "bc.store", session_id = %session_id, error = %e, "Failed to check session existence");
            StoreError::Backend(format!("Failed to check session: {e}"))
        })?;
        if !exists {
            return Err(StoreError::NotFound);
        }

        // One atomic round trip: flip the flag and drop the correlation id.
        let _: () = redis::pipe()
            .atomic()
            .hset(&key, "live", "0")
            .ignore()
            .hdel(&key, "room")
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                error!(target: "bc.store", session_id = %session_id, error = %e, "Failed to clear session live flag");
                StoreError::Backend(format!("Failed to clear session live flag: {e}"))
            })?;

        debug!(target: "bc.store", session_id = %session_id, "Session live flag cleared");
        Ok(())
    }
}
