//! `BroadcastControllerActor` - the lifecycle state machine for rooms.
//!
//! A single actor task owns the room directory (sessionId -> Room) and is
//! the only code that mutates it. Each mailbox message is handled to
//! completion - including awaits on the session store - before the next one
//! is dequeued, so every per-room sequence (start, joins, end or
//! host-disconnect) is serialized without any further locking: two racing
//! `start`s for one session resolve to exactly one winner, and the loser
//! observes the `Live` state.
//!
//! Per session the state machine is `NonExistent` <-> `Live`: an entry in
//! the directory is the `Live` state, its absence is `NonExistent`. Store
//! writes and directory mutations are treated as a unit - the directory is
//! only touched after `mark_live`/`clear_live` succeeds, so a store failure
//! can never strand a room without its persisted flag.

use crate::auth::IdentityVerifier;
use crate::errors::BcError;
use crate::protocol::ServerEvent;
use crate::registry::{ConnectionId, ConnectionRegistry};
use crate::store::{SessionStore, StoreError};

use super::messages::{
    ControllerMessage, ControllerStatus, JoinResult, RoomSnapshot, StartResult,
};
use super::metrics::MailboxMonitor;

use common::jwt::Role;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Buffer size for the controller mailbox.
const CONTROLLER_CHANNEL_BUFFER: usize = 1000;

/// Teardown reason when the host ends the stream explicitly.
pub const REASON_HOST_ENDED: &str = "Host ended the stream";
/// Teardown reason when the host's connection drops.
pub const REASON_HOST_DISCONNECTED: &str = "Host disconnected";
/// Teardown reason when the process drains on shutdown.
pub const REASON_SERVER_SHUTDOWN: &str = "Server shutting down";

/// Handle to the `BroadcastControllerActor`.
///
/// Cloneable; all methods are async and respond via oneshot channels.
#[derive(Clone)]
pub struct BroadcastControllerHandle {
    sender: mpsc::Sender<ControllerMessage>,
    cancel_token: CancellationToken,
}

impl BroadcastControllerHandle {
    /// Spawn the controller actor and return a handle to it.
    #[must_use]
    pub fn new(
        instance_id: String,
        verifier: Arc<dyn IdentityVerifier>,
        store: Arc<dyn SessionStore>,
        registry: Arc<ConnectionRegistry>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(CONTROLLER_CHANNEL_BUFFER);
        let cancel_token = CancellationToken::new();

        let actor = BroadcastControllerActor {
            instance_id: instance_id.clone(),
            receiver,
            cancel_token: cancel_token.clone(),
            rooms: HashMap::new(),
            verifier,
            store,
            registry,
            mailbox: MailboxMonitor::new(instance_id),
        };

        tokio::spawn(actor.run());

        Self {
            sender,
            cancel_token,
        }
    }

    /// Start broadcasting a session.
    pub async fn start_stream(
        &self,
        session_id: String,
        credential: String,
        connection_id: ConnectionId,
    ) -> Result<StartResult, BcError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(ControllerMessage::StartStream {
                session_id,
                credential,
                connection_id,
                respond_to: tx,
            })
            .await
            .map_err(|e| BcError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| BcError::Internal(format!("response receive failed: {e}")))?
    }

    /// Join a live session as a viewer.
    pub async fn join_stream(
        &self,
        session_id: String,
        credential: String,
        connection_id: ConnectionId,
    ) -> Result<JoinResult, BcError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(ControllerMessage::JoinStream {
                session_id,
                credential,
                connection_id,
                respond_to: tx,
            })
            .await
            .map_err(|e| BcError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| BcError::Internal(format!("response receive failed: {e}")))?
    }

    /// End a live session.
    pub async fn end_stream(
        &self,
        session_id: String,
        credential: String,
        connection_id: ConnectionId,
    ) -> Result<(), BcError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(ControllerMessage::EndStream {
                session_id,
                credential,
                connection_id,
                respond_to: tx,
            })
            .await
            .map_err(|e| BcError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| BcError::Internal(format!("response receive failed: {e}")))?
    }

    /// Notify the controller that a connection has gone away.
    pub async fn connection_closed(&self, connection_id: ConnectionId) -> Result<(), BcError> {
        self.sender
            .send(ControllerMessage::ConnectionClosed { connection_id })
            .await
            .map_err(|e| BcError::Internal(format!("channel send failed: {e}")))
    }

    /// Snapshot a room's state, if it exists.
    pub async fn room(&self, session_id: String) -> Result<Option<RoomSnapshot>, BcError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(ControllerMessage::GetRoom {
                session_id,
                respond_to: tx,
            })
            .await
            .map_err(|e| BcError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| BcError::Internal(format!("response receive failed: {e}")))
    }

    /// Current controller status.
    pub async fn status(&self) -> Result<ControllerStatus, BcError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(ControllerMessage::GetStatus { respond_to: tx })
            .await
            .map_err(|e| BcError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| BcError::Internal(format!("response receive failed: {e}")))
    }

    /// Cancel the actor, draining every live room first.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Check if the actor is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Get a child token tied to the actor's lifetime.
    #[must_use]
    pub fn child_token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }
}

/// One live room: a session's host connection and viewer set.
#[derive(Debug)]
struct Room {
    /// Session id the room correlates to (also the room id).
    session_id: String,
    /// The host's connection. Always live: host disconnect tears the room down.
    host: ConnectionId,
    /// User recorded as host at start time, checked again on end.
    host_user_id: String,
    /// Session title, echoed to joiners.
    title: String,
    /// Viewer connections. Never contains `host`.
    viewers: HashSet<ConnectionId>,
    /// Creation timestamp (Unix epoch seconds).
    created_at: i64,
}

impl Room {
    fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            session_id: self.session_id.clone(),
            host: self.host,
            host_user_id: self.host_user_id.clone(),
            title: self.title.clone(),
            viewers: self.viewers.iter().copied().collect(),
            created_at: self.created_at,
        }
    }
}

/// The `BroadcastControllerActor` implementation.
pub struct BroadcastControllerActor {
    /// Instance id for log correlation.
    instance_id: String,
    /// Message receiver.
    receiver: mpsc::Receiver<ControllerMessage>,
    /// Root cancellation token.
    cancel_token: CancellationToken,
    /// The room directory: sessionId -> Room. Exclusively owned here.
    rooms: HashMap<String, Room>,
    /// Credential verifier.
    verifier: Arc<dyn IdentityVerifier>,
    /// Persisted session records.
    store: Arc<dyn SessionStore>,
    /// Connection registry for outbound notifications.
    registry: Arc<ConnectionRegistry>,
    /// Mailbox monitor.
    mailbox: MailboxMonitor,
}

fn map_store_error(e: StoreError) -> BcError {
    match e {
        StoreError::NotFound => BcError::NotFound("Webinar not found".to_string()),
        StoreError::Backend(msg) => BcError::Store(msg),
    }
}

impl BroadcastControllerActor {
    /// Run the actor message loop.
    #[instrument(skip_all, name = "bc.actor.controller", fields(instance_id = %self.instance_id))]
    async fn run(mut self) {
        info!(
            target: "bc.actor.controller",
            instance_id = %self.instance_id,
            "BroadcastControllerActor started"
        );

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "bc.actor.controller",
                        instance_id = %self.instance_id,
                        "BroadcastControllerActor received cancellation signal"
                    );
                    self.graceful_shutdown().await;
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => {
                            self.mailbox.record_enqueue();
                            self.handle_message(message).await;
                            self.mailbox.record_dequeue();
                        }
                        None => {
                            info!(
                                target: "bc.actor.controller",
                                instance_id = %self.instance_id,
                                "BroadcastControllerActor channel closed, exiting"
                            );
                            break;
                        }
                    }
                }
            }
        }

        info!(
            target: "bc.actor.controller",
            instance_id = %self.instance_id,
            rooms_remaining = self.rooms.len(),
            messages_processed = self.mailbox.messages_processed(),
            "BroadcastControllerActor stopped"
        );
    }

    /// Handle a single message.
    async fn handle_message(&mut self, message: ControllerMessage) {
        match message {
            ControllerMessage::StartStream {
                session_id,
                credential,
                connection_id,
                respond_to,
            } => {
                let result = self
                    .handle_start(&session_id, &credential, connection_id)
                    .await;
                let _ = respond_to.send(result);
            }

            ControllerMessage::JoinStream {
                session_id,
                credential,
                connection_id,
                respond_to,
            } => {
                let result = self
                    .handle_join(&session_id, &credential, connection_id)
                    .await;
                let _ = respond_to.send(result);
            }

            ControllerMessage::EndStream {
                session_id,
                credential,
                connection_id,
                respond_to,
            } => {
                let result = self
                    .handle_end(&session_id, &credential, connection_id)
                    .await;
                let _ = respond_to.send(result);
            }

            ControllerMessage::ConnectionClosed { connection_id } => {
                self.handle_connection_closed(connection_id).await;
            }

            ControllerMessage::GetRoom {
                session_id,
                respond_to,
            } => {
                let snapshot = self.rooms.get(&session_id).map(Room::snapshot);
                let _ = respond_to.send(snapshot);
            }

            ControllerMessage::GetStatus { respond_to } => {
                let status = ControllerStatus {
                    room_count: self.rooms.len(),
                    viewer_count: self.rooms.values().map(|r| r.viewers.len()).sum(),
                    mailbox_depth: self.mailbox.current_depth(),
                };
                let _ = respond_to.send(status);
            }
        }
    }

    /// Handle a start-stream intent: `NonExistent -> Live`.
    #[instrument(skip_all, fields(instance_id = %self.instance_id, session_id = %session_id))]
    async fn handle_start(
        &mut self,
        session_id: &str,
        credential: &str,
        connection_id: ConnectionId,
    ) -> Result<StartResult, BcError> {
        let principal = self.verifier.verify(credential)?;
        match principal.role {
            Role::Host => {}
            Role::Viewer => {
                return Err(BcError::Authorization(
                    "Only hosts can start a stream".to_string(),
                ));
            }
        }

        let record = self
            .store
            .get_session(session_id)
            .await
            .map_err(map_store_error)?;

        if record.owner_id != principal.user_id {
            return Err(BcError::Authorization(
                "Not authorized to host this webinar".to_string(),
            ));
        }

        // A live room is never silently replaced; the host must end it first.
        if self.rooms.contains_key(session_id) {
            return Err(BcError::Conflict("Stream is already live".to_string()));
        }

        // A connection hosts at most one room at a time.
        if self.rooms.values().any(|r| r.host == connection_id) {
            return Err(BcError::Conflict(
                "Connection is already hosting a stream".to_string(),
            ));
        }

        // Room id is the session id: the correlation is 1:1 while live.
        let room_id = session_id.to_string();

        // Persist the live flag before touching the directory. On failure
        // nothing was inserted, so state is unchanged.
        self.store
            .mark_live(session_id, &room_id)
            .await
            .map_err(map_store_error)?;

        self.rooms.insert(
            room_id.clone(),
            Room {
                session_id: session_id.to_string(),
                host: connection_id,
                host_user_id: principal.user_id,
                title: record.title.clone(),
                viewers: HashSet::new(),
                created_at: chrono::Utc::now().timestamp(),
            },
        );

        metrics::gauge!("bc_active_rooms").increment(1.0);
        metrics::counter!("bc_rooms_started_total").increment(1);

        info!(
            target: "bc.actor.controller",
            host = %connection_id,
            total_rooms = self.rooms.len(),
            "Stream started"
        );

        Ok(StartResult {
            room_id,
            session_id: session_id.to_string(),
            title: record.title,
        })
    }

    /// Handle a join-stream intent. The room stays `Live`.
    #[instrument(skip_all, fields(instance_id = %self.instance_id, session_id = %session_id))]
    async fn handle_join(
        &mut self,
        session_id: &str,
        credential: &str,
        connection_id: ConnectionId,
    ) -> Result<JoinResult, BcError> {
        let principal = self.verifier.verify(credential)?;
        match principal.role {
            Role::Viewer => {}
            Role::Host => {
                return Err(BcError::Authorization(
                    "Only viewers can join a stream".to_string(),
                ));
            }
        }

        let record = self
            .store
            .get_session(session_id)
            .await
            .map_err(map_store_error)?;

        if !record.live {
            return Err(BcError::NotFound("Webinar is not live".to_string()));
        }

        // Re-validate against the directory after the store await: the room
        // may have been torn down while the read was in flight.
        let room = self
            .rooms
            .get_mut(session_id)
            .ok_or_else(|| BcError::NotFound("Stream not found".to_string()))?;

        if room.host == connection_id {
            return Err(BcError::InvalidRequest(
                "Host cannot join their own stream as a viewer".to_string(),
            ));
        }

        // Set semantics: a repeated join is success, not a duplicate.
        let newly_joined = room.viewers.insert(connection_id);
        let host = room.host;
        let room_id = room.session_id.clone();
        let title = room.title.clone();
        let viewer_count = room.viewers.len();

        if newly_joined {
            metrics::gauge!("bc_active_viewers").increment(1.0);

            // Host is told before the joiner gets its acknowledgment.
            if !self
                .registry
                .send(&host, ServerEvent::NewViewer { connection_id })
                .await
            {
                debug!(
                    target: "bc.actor.controller",
                    host = %host,
                    "Host connection unreachable for new-viewer notification"
                );
            }

            info!(
                target: "bc.actor.controller",
                viewer = %connection_id,
                viewers = viewer_count,
                "Viewer joined stream"
            );
        }

        Ok(JoinResult {
            room_id,
            host_id: host,
            session_id: session_id.to_string(),
            title,
        })
    }

    /// Handle an end-stream intent: `Live -> NonExistent`.
    #[instrument(skip_all, fields(instance_id = %self.instance_id, session_id = %session_id))]
    async fn handle_end(
        &mut self,
        session_id: &str,
        credential: &str,
        connection_id: ConnectionId,
    ) -> Result<(), BcError> {
        let principal = self.verifier.verify(credential)?;
        match principal.role {
            Role::Host => {}
            Role::Viewer => {
                return Err(BcError::Authorization(
                    "Only hosts can end a stream".to_string(),
                ));
            }
        }

        let room = self
            .rooms
            .get(session_id)
            .ok_or_else(|| BcError::NotFound("Stream not found".to_string()))?;

        if room.host != connection_id || room.host_user_id != principal.user_id {
            return Err(BcError::Authorization(
                "Not authorized to end this stream".to_string(),
            ));
        }

        // Clear the persisted flag first; on failure the room stays live and
        // store + directory remain consistent.
        self.store
            .clear_live(session_id)
            .await
            .map_err(map_store_error)?;

        if let Some(room) = self.rooms.remove(session_id) {
            self.notify_room_closed(&room, REASON_HOST_ENDED, true).await;
            self.record_room_closed(&room, REASON_HOST_ENDED);
        }

        Ok(())
    }

    /// Handle a transport-level disconnect.
    ///
    /// A host connection tears its room down (no re-verification - the
    /// connection is already gone); a viewer connection is removed from every
    /// room holding it. A connection absent from all rooms is a no-op.
    #[instrument(skip_all, fields(instance_id = %self.instance_id, connection_id = %connection_id))]
    async fn handle_connection_closed(&mut self, connection_id: ConnectionId) {
        // Host teardown. The directory invariant allows at most one hosted
        // room per connection; collect rather than assume.
        let hosted: Vec<String> = self
            .rooms
            .iter()
            .filter(|(_, room)| room.host == connection_id)
            .map(|(session_id, _)| session_id.clone())
            .collect();

        for session_id in hosted {
            // The host is gone, so the room comes down regardless; a failed
            // clear leaves a stale flag in the store, which the next join
            // surfaces as "Stream not found".
            if let Err(e) = self.store.clear_live(&session_id).await {
                warn!(
                    target: "bc.actor.controller",
                    session_id = %session_id,
                    error = %e,
                    "Failed to clear live flag during host disconnect"
                );
            }

            if let Some(room) = self.rooms.remove(&session_id) {
                self.notify_room_closed(&room, REASON_HOST_DISCONNECTED, false)
                    .await;
                self.record_room_closed(&room, REASON_HOST_DISCONNECTED);
            }
        }

        // Viewer removal. The room stays live; only its host is told.
        let mut hosts_to_notify = Vec::new();
        for room in self.rooms.values_mut() {
            if room.viewers.remove(&connection_id) {
                hosts_to_notify.push(room.host);
                metrics::gauge!("bc_active_viewers").decrement(1.0);
            }
        }

        for host in hosts_to_notify {
            if !self
                .registry
                .send(&host, ServerEvent::ViewerLeft { connection_id })
                .await
            {
                debug!(
                    target: "bc.actor.controller",
                    host = %host,
                    "Host connection unreachable for viewer-left notification"
                );
            }
        }
    }

    /// Broadcast `stream-ended` to a closed room's members.
    async fn notify_room_closed(&self, room: &Room, reason: &str, include_host: bool) {
        let event = ServerEvent::StreamEnded {
            reason: reason.to_string(),
        };

        for viewer in &room.viewers {
            if !self.registry.send(viewer, event.clone()).await {
                debug!(
                    target: "bc.actor.controller",
                    viewer = %viewer,
                    "Viewer connection unreachable for stream-ended notification"
                );
            }
        }

        if include_host && !self.registry.send(&room.host, event).await {
            debug!(
                target: "bc.actor.controller",
                host = %room.host,
                "Host connection unreachable for stream-ended notification"
            );
        }
    }

    /// Account for a room leaving the directory.
    fn record_room_closed(&self, room: &Room, reason: &str) {
        metrics::gauge!("bc_active_rooms").decrement(1.0);
        metrics::gauge!("bc_active_viewers").decrement(room.viewers.len() as f64);
        metrics::counter!("bc_rooms_ended_total", "reason" => reason.to_string()).increment(1);

        info!(
            target: "bc.actor.controller",
            session_id = %room.session_id,
            viewers = room.viewers.len(),
            reason = %reason,
            total_rooms = self.rooms.len(),
            "Stream ended"
        );
    }

    /// Drain every live room on shutdown.
    async fn graceful_shutdown(&mut self) {
        info!(
            target: "bc.actor.controller",
            instance_id = %self.instance_id,
            rooms = self.rooms.len(),
            "Draining live rooms"
        );

        let rooms: Vec<(String, Room)> = self.rooms.drain().collect();
        for (session_id, room) in rooms {
            if let Err(e) = self.store.clear_live(&session_id).await {
                warn!(
                    target: "bc.actor.controller",
                    session_id = %session_id,
                    error = %e,
                    "Failed to clear live flag during shutdown"
                );
            }
            self.notify_room_closed(&room, REASON_SERVER_SHUTDOWN, true)
                .await;
            self.record_room_closed(&room, REASON_SERVER_SHUTDOWN);
        }

        info!(
            target: "bc.actor.controller",
            instance_id = %self.instance_id,
            "Graceful shutdown complete"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::auth::JwtVerifier;
    use bc_test_utils::{host_token, viewer_token, MockSessionStore, TEST_JWT_SECRET};
    use common::jwt::DEFAULT_CLOCK_SKEW;
    use common::secret::SecretString;

    fn spawn_controller(
        store: MockSessionStore,
    ) -> (BroadcastControllerHandle, Arc<ConnectionRegistry>) {
        let registry = Arc::new(ConnectionRegistry::new());
        let verifier = Arc::new(JwtVerifier::new(
            SecretString::from(TEST_JWT_SECRET),
            DEFAULT_CLOCK_SKEW,
        ));
        let handle = BroadcastControllerHandle::new(
            "bc-unit-test".to_string(),
            verifier,
            Arc::new(store),
            Arc::clone(&registry),
        );
        (handle, registry)
    }

    #[tokio::test]
    async fn test_start_creates_room() {
        let store = MockSessionStore::new().with_session("S1", "alice", "Intro");
        let (handle, _registry) = spawn_controller(store.clone());
        let host = ConnectionId::new();

        let result = handle
            .start_stream("S1".to_string(), host_token("alice"), host)
            .await
            .unwrap();

        assert_eq!(result.room_id, "S1");
        assert_eq!(result.title, "Intro");

        let snapshot = handle.room("S1".to_string()).await.unwrap().unwrap();
        assert_eq!(snapshot.host, host);
        assert!(snapshot.viewers.is_empty());
        assert!(store.record("S1").unwrap().live);

        handle.cancel();
    }

    #[tokio::test]
    async fn test_duplicate_start_is_conflict() {
        let store = MockSessionStore::new().with_session("S1", "alice", "Intro");
        let (handle, _registry) = spawn_controller(store);
        let first = ConnectionId::new();

        handle
            .start_stream("S1".to_string(), host_token("alice"), first)
            .await
            .unwrap();

        let result = handle
            .start_stream("S1".to_string(), host_token("alice"), ConnectionId::new())
            .await;
        assert!(matches!(result, Err(BcError::Conflict(_))));

        // The existing room is untouched.
        let snapshot = handle.room("S1".to_string()).await.unwrap().unwrap();
        assert_eq!(snapshot.host, first);

        handle.cancel();
    }

    #[tokio::test]
    async fn test_viewer_cannot_start() {
        let store = MockSessionStore::new().with_session("S1", "alice", "Intro");
        let (handle, _registry) = spawn_controller(store);

        let result = handle
            .start_stream("S1".to_string(), viewer_token("bob"), ConnectionId::new())
            .await;
        assert!(matches!(result, Err(BcError::Authorization(_))));

        assert!(handle.room("S1".to_string()).await.unwrap().is_none());
        handle.cancel();
    }

    #[tokio::test]
    async fn test_non_owner_cannot_start() {
        let store = MockSessionStore::new().with_session("S1", "alice", "Intro");
        let (handle, _registry) = spawn_controller(store);

        let result = handle
            .start_stream("S1".to_string(), host_token("mallory"), ConnectionId::new())
            .await;
        assert!(matches!(result, Err(BcError::Authorization(_))));
        handle.cancel();
    }

    #[tokio::test]
    async fn test_connection_cannot_host_two_rooms() {
        let store = MockSessionStore::new()
            .with_session("S1", "alice", "One")
            .with_session("S2", "alice", "Two");
        let (handle, _registry) = spawn_controller(store);
        let host = ConnectionId::new();

        handle
            .start_stream("S1".to_string(), host_token("alice"), host)
            .await
            .unwrap();

        let result = handle
            .start_stream("S2".to_string(), host_token("alice"), host)
            .await;
        assert!(matches!(result, Err(BcError::Conflict(_))));
        handle.cancel();
    }

    #[tokio::test]
    async fn test_join_unknown_session_is_not_found() {
        let store = MockSessionStore::new();
        let (handle, _registry) = spawn_controller(store);

        let result = handle
            .join_stream("S9".to_string(), viewer_token("bob"), ConnectionId::new())
            .await;
        assert!(matches!(result, Err(BcError::NotFound(_))));
        handle.cancel();
    }

    #[tokio::test]
    async fn test_join_before_start_is_not_live() {
        let store = MockSessionStore::new().with_session("S1", "alice", "Intro");
        let (handle, _registry) = spawn_controller(store);

        let result = handle
            .join_stream("S1".to_string(), viewer_token("bob"), ConnectionId::new())
            .await;
        match result {
            Err(e @ BcError::NotFound(_)) => {
                assert_eq!(e.client_message(), "Webinar is not live");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        handle.cancel();
    }

    #[tokio::test]
    async fn test_rejoin_is_idempotent() {
        let store = MockSessionStore::new().with_session("S1", "alice", "Intro");
        let (handle, registry) = spawn_controller(store);

        let (host_tx, _host_rx) = tokio::sync::mpsc::channel(16);
        let host = registry.register(host_tx).await;
        handle
            .start_stream("S1".to_string(), host_token("alice"), host)
            .await
            .unwrap();

        let viewer = ConnectionId::new();
        let first = handle
            .join_stream("S1".to_string(), viewer_token("bob"), viewer)
            .await
            .unwrap();
        let second = handle
            .join_stream("S1".to_string(), viewer_token("bob"), viewer)
            .await
            .unwrap();

        assert_eq!(first, second);
        let snapshot = handle.room("S1".to_string()).await.unwrap().unwrap();
        assert_eq!(snapshot.viewers, vec![viewer]);
        handle.cancel();
    }

    #[tokio::test]
    async fn test_host_cannot_join_own_room() {
        let store = MockSessionStore::new().with_session("S1", "alice", "Intro");
        let (handle, _registry) = spawn_controller(store);
        let host = ConnectionId::new();

        handle
            .start_stream("S1".to_string(), host_token("alice"), host)
            .await
            .unwrap();

        let result = handle
            .join_stream("S1".to_string(), viewer_token("alice"), host)
            .await;
        assert!(matches!(result, Err(BcError::InvalidRequest(_))));
        handle.cancel();
    }

    #[tokio::test]
    async fn test_store_failure_on_start_leaves_state_unchanged() {
        let store = MockSessionStore::new().with_session("S1", "alice", "Intro");
        store.fail_mark_live(true);
        let (handle, _registry) = spawn_controller(store.clone());

        let result = handle
            .start_stream("S1".to_string(), host_token("alice"), ConnectionId::new())
            .await;
        assert!(matches!(result, Err(BcError::Store(_))));

        // No room registered, no live flag persisted.
        assert!(handle.room("S1".to_string()).await.unwrap().is_none());
        assert!(!store.record("S1").unwrap().live);
        handle.cancel();
    }

    #[tokio::test]
    async fn test_store_failure_on_end_keeps_room_live() {
        let store = MockSessionStore::new().with_session("S1", "alice", "Intro");
        let (handle, _registry) = spawn_controller(store.clone());
        let host = ConnectionId::new();

        handle
            .start_stream("S1".to_string(), host_token("alice"), host)
            .await
            .unwrap();
        store.fail_clear_live(true);

        let result = handle
            .end_stream("S1".to_string(), host_token("alice"), host)
            .await;
        assert!(matches!(result, Err(BcError::Store(_))));

        // Room and persisted flag are both still live.
        assert!(handle.room("S1".to_string()).await.unwrap().is_some());
        assert!(store.record("S1").unwrap().live);
        handle.cancel();
    }

    #[tokio::test]
    async fn test_disconnect_of_unknown_connection_is_noop() {
        let store = MockSessionStore::new().with_session("S1", "alice", "Intro");
        let (handle, _registry) = spawn_controller(store);

        handle
            .start_stream("S1".to_string(), host_token("alice"), ConnectionId::new())
            .await
            .unwrap();

        handle.connection_closed(ConnectionId::new()).await.unwrap();

        // Room unaffected.
        assert!(handle.room("S1".to_string()).await.unwrap().is_some());
        handle.cancel();
    }

    #[tokio::test]
    async fn test_status_counts_rooms_and_viewers() {
        let store = MockSessionStore::new()
            .with_session("S1", "alice", "One")
            .with_session("S2", "carol", "Two");
        let (handle, _registry) = spawn_controller(store);

        handle
            .start_stream("S1".to_string(), host_token("alice"), ConnectionId::new())
            .await
            .unwrap();
        handle
            .start_stream("S2".to_string(), host_token("carol"), ConnectionId::new())
            .await
            .unwrap();
        handle
            .join_stream("S1".to_string(), viewer_token("bob"), ConnectionId::new())
            .await
            .unwrap();

        let status = handle.status().await.unwrap();
        assert_eq!(status.room_count, 2);
        assert_eq!(status.viewer_count, 1);
        handle.cancel();
    }
}
