//! WebSocket transport.
//!
//! `GET /ws` upgrades to the signaling connection. Each socket task registers
//! with the connection registry, then runs a single select loop joining the
//! connection's outbound event channel and the inbound frames. Text frames
//! parse as [`ClientEvent`]; malformed or unrecognized frames are ignored
//! with a debug log, per the protocol's "no reply to garbage" rule.
//!
//! The socket task is the only writer to its socket, so per-connection event
//! order is exactly enqueue order.

use crate::actors::BroadcastControllerHandle;
use crate::errors::BcError;
use crate::protocol::{ClientEvent, ServerEvent};
use crate::registry::{ConnectionId, ConnectionRegistry, CONNECTION_CHANNEL_BUFFER};
use crate::relay::SignalRelay;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Shared state for the signaling routes.
#[derive(Clone)]
pub struct AppState {
    /// Live connection registry.
    pub registry: Arc<ConnectionRegistry>,
    /// Lifecycle controller handle.
    pub controller: BroadcastControllerHandle,
    /// Signal relay.
    pub relay: SignalRelay,
}

/// Router exposing the signaling WebSocket endpoint.
pub fn signaling_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one signaling connection from upgrade to close.
async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(CONNECTION_CHANNEL_BUFFER);
    let connection_id = state.registry.register(tx).await;

    debug!(target: "bc.transport", connection_id = %connection_id, "Signaling connection established");

    loop {
        tokio::select! {
            // Outbound: drain the connection's event channel into the socket.
            outbound = rx.recv() => {
                match outbound {
                    Some(event) => {
                        let frame = match serde_json::to_string(&event) {
                            Ok(json) => json,
                            Err(e) => {
                                warn!(
                                    target: "bc.transport",
                                    connection_id = %connection_id,
                                    error = %e,
                                    "Failed to serialize outbound event"
                                );
                                continue;
                            }
                        };
                        if socket.send(Message::Text(frame)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            // Inbound: client frames.
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        handle_client_frame(&state, connection_id, &text).await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(
                            target: "bc.transport",
                            connection_id = %connection_id,
                            error = %e,
                            "Socket error"
                        );
                        break;
                    }
                    Some(Ok(_)) => {
                        // Binary and pong frames carry nothing for us.
                    }
                }
            }
        }
    }

    // Registry first, so teardown broadcasts skip the dead connection.
    state.registry.unregister(&connection_id).await;
    if let Err(e) = state.controller.connection_closed(connection_id).await {
        warn!(
            target: "bc.transport",
            connection_id = %connection_id,
            error = %e,
            "Failed to notify controller of disconnect"
        );
    }

    debug!(target: "bc.transport", connection_id = %connection_id, "Signaling connection closed");
}

/// Parse and dispatch one inbound frame.
async fn handle_client_frame(state: &AppState, connection_id: ConnectionId, text: &str) {
    let event: ClientEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            debug!(
                target: "bc.transport",
                connection_id = %connection_id,
                error = %e,
                "Ignoring malformed client frame"
            );
            return;
        }
    };

    match event {
        ClientEvent::StartStream {
            session_id,
            credential,
        } => {
            let result = state
                .controller
                .start_stream(session_id, credential, connection_id)
                .await
                .map(|r| ServerEvent::StreamStarted {
                    room_id: r.room_id,
                    session_id: r.session_id,
                    title: r.title,
                });
            respond(state, connection_id, result).await;
        }

        ClientEvent::JoinStream {
            session_id,
            credential,
        } => {
            let result = state
                .controller
                .join_stream(session_id, credential, connection_id)
                .await
                .map(|r| ServerEvent::StreamJoined {
                    room_id: r.room_id,
                    host_id: r.host_id,
                    session_id: r.session_id,
                    title: r.title,
                });
            respond(state, connection_id, result).await;
        }

        ClientEvent::EndStream {
            session_id,
            credential,
        } => {
            let result = state
                .controller
                .end_stream(session_id, credential, connection_id)
                .await
                .map(|()| ServerEvent::StreamEndConfirmed);
            respond(state, connection_id, result).await;
        }

        ClientEvent::Signal { to, signal } => {
            // Fire-and-forget: the relay never reports back to the sender.
            state.relay.relay(connection_id, to, signal).await;
        }
    }
}

/// Deliver an intent's outcome to the requester.
///
/// Failures become a sanitized `error{message}` event. The controller has
/// already enqueued any side notifications, so the acknowledgment lands
/// after them.
async fn respond(
    state: &AppState,
    connection_id: ConnectionId,
    result: Result<ServerEvent, BcError>,
) {
    let event = match result {
        Ok(event) => event,
        Err(e) => {
            debug!(
                target: "bc.transport",
                connection_id = %connection_id,
                error = %e,
                "Intent failed"
            );
            ServerEvent::Error {
                message: e.client_message(),
            }
        }
    };

    if !state.registry.send(&connection_id, event).await {
        debug!(
            target: "bc.transport",
            connection_id = %connection_id,
            "Requester disconnected before response"
        );
    }
}
