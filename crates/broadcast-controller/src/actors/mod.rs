//! Actor model for room lifecycle.
//!
//! One `BroadcastControllerActor` task owns all room state; everything else
//! talks to it through typed messages on its mailbox.

pub mod controller;
pub mod messages;
pub mod metrics;

pub use controller::{
    BroadcastControllerHandle, REASON_HOST_DISCONNECTED, REASON_HOST_ENDED,
    REASON_SERVER_SHUTDOWN,
};
pub use messages::{ControllerStatus, JoinResult, RoomSnapshot, StartResult};
pub use metrics::MailboxMonitor;
