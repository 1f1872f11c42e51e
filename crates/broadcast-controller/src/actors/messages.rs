//! Message types for the controller mailbox.
//!
//! Every connection intent reaches the controller as a typed message over
//! `tokio::sync::mpsc`; request-reply pairs use `tokio::sync::oneshot`.
//! There are no callback closures anywhere in the lifecycle path.

use crate::errors::BcError;
use crate::registry::ConnectionId;
use tokio::sync::oneshot;

/// Messages sent to the `BroadcastControllerActor`.
#[derive(Debug)]
pub enum ControllerMessage {
    /// A host connection wants to start broadcasting a session.
    StartStream {
        session_id: String,
        credential: String,
        connection_id: ConnectionId,
        /// Response channel for the start result or error.
        respond_to: oneshot::Sender<Result<StartResult, BcError>>,
    },

    /// A viewer connection wants to join a live session.
    JoinStream {
        session_id: String,
        credential: String,
        connection_id: ConnectionId,
        /// Response channel for the join result or error.
        respond_to: oneshot::Sender<Result<JoinResult, BcError>>,
    },

    /// The host wants to end its live session.
    EndStream {
        session_id: String,
        credential: String,
        connection_id: ConnectionId,
        /// Response channel for confirmation.
        respond_to: oneshot::Sender<Result<(), BcError>>,
    },

    /// A transport connection has gone away (no credential - the link itself
    /// is the evidence). Idempotent: a connection absent from every room is
    /// a silent no-op.
    ConnectionClosed { connection_id: ConnectionId },

    /// Snapshot one room's state (tests, debugging).
    GetRoom {
        session_id: String,
        respond_to: oneshot::Sender<Option<RoomSnapshot>>,
    },

    /// Current controller status.
    GetStatus {
        respond_to: oneshot::Sender<ControllerStatus>,
    },
}

/// Result of a successful start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartResult {
    /// Room correlation id (equals the session id).
    pub room_id: String,
    /// Session id the room correlates to.
    pub session_id: String,
    /// Session title from the store.
    pub title: String,
}

/// Result of a successful join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinResult {
    /// Room correlation id.
    pub room_id: String,
    /// The host's connection id, for subsequent signaling.
    pub host_id: ConnectionId,
    /// Session id the room correlates to.
    pub session_id: String,
    /// Session title from the store.
    pub title: String,
}

/// Point-in-time view of one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    /// Session id the room correlates to.
    pub session_id: String,
    /// Host connection.
    pub host: ConnectionId,
    /// User id recorded as host at start time.
    pub host_user_id: String,
    /// Session title.
    pub title: String,
    /// Current viewer connections.
    pub viewers: Vec<ConnectionId>,
    /// Room creation timestamp (Unix epoch seconds).
    pub created_at: i64,
}

/// Status of the controller actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerStatus {
    /// Live rooms.
    pub room_count: usize,
    /// Viewers across all rooms.
    pub viewer_count: usize,
    /// Current mailbox depth.
    pub mailbox_depth: usize,
}
