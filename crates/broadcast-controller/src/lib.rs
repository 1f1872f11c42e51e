//! Broadcast Controller (BC) Service Library
//!
//! The stateful WebSocket signaling server behind Podium's live webinars:
//!
//! - Authenticates participants and authorizes roles (host vs. viewer)
//! - Tracks ephemeral room membership (one host, many viewers)
//! - Relays opaque negotiation payloads between host and viewers
//! - Tears rooms down deterministically on end-stream or disconnect
//!
//! # Architecture
//!
//! ```text
//! WebSocket task (one per connection)
//! ├── registers an outbound channel with the ConnectionRegistry
//! ├── forwards start/join/end intents to the BroadcastControllerActor
//! └── forwards signal intents to the SignalRelay
//!
//! BroadcastControllerActor (singleton)
//! ├── owns the room directory (sessionId -> Room)
//! ├── consults the IdentityVerifier and SessionStore
//! └── pushes notifications through the ConnectionRegistry
//! ```
//!
//! # Key Design Decisions
//!
//! - **Single-owner room state**: all room mutation happens inside one actor
//!   task; each intent is handled to completion before the next, which is
//!   what serializes racing starts for the same session.
//! - **Rooms are process memory**: nothing about a room survives a restart;
//!   only the session's `live` flag is persisted, via the SessionStore.
//! - **Best-effort signaling**: the relay drops payloads for unregistered
//!   targets silently; the protocol promises no delivery guarantee.
//!
//! # Modules
//!
//! - [`actors`] - room lifecycle actor and its messages
//! - [`auth`] - credential verification
//! - [`config`] - service configuration from environment
//! - [`errors`] - error taxonomy with client-safe messages
//! - [`observability`] - health probes
//! - [`protocol`] - wire events
//! - [`registry`] - connection registry
//! - [`relay`] - opaque signal relay
//! - [`store`] - session store interface and Redis adapter
//! - [`transport`] - WebSocket endpoint

pub mod actors;
pub mod auth;
pub mod config;
pub mod errors;
pub mod observability;
pub mod protocol;
pub mod registry;
pub mod relay;
pub mod store;
pub mod transport;
