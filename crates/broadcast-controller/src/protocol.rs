//! Wire protocol for the signaling connection.
//!
//! Every frame is a JSON object of the form `{"event": ..., "data": ...}`
//! with kebab-case event names and camelCase payload fields. The `signal`
//! payload is opaque: it is carried as raw JSON and relayed verbatim,
//! never inspected or transformed.

use crate::registry::ConnectionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Intents a client may submit over its connection.
///
/// Frames that fail to parse into one of these variants are ignored by the
/// transport (logged at debug level, no error event is sent).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Host requests to start broadcasting a session they own.
    StartStream {
        session_id: String,
        credential: String,
    },

    /// Viewer requests to join a live session.
    JoinStream {
        session_id: String,
        credential: String,
    },

    /// Forward an opaque negotiation payload to another connection.
    Signal { to: ConnectionId, signal: Value },

    /// Host requests to end their live session.
    EndStream {
        session_id: String,
        credential: String,
    },
}

/// Events the server pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// To the requester after a successful start.
    StreamStarted {
        room_id: String,
        session_id: String,
        title: String,
    },

    /// To the requester after a successful join.
    StreamJoined {
        room_id: String,
        host_id: ConnectionId,
        session_id: String,
        title: String,
    },

    /// To the host when a viewer joins its room.
    NewViewer { connection_id: ConnectionId },

    /// To the host when a viewer leaves its room.
    ViewerLeft { connection_id: ConnectionId },

    /// Relayed negotiation payload, forwarded verbatim.
    Signal { from: ConnectionId, signal: Value },

    /// To every room member when the room is torn down.
    StreamEnded { reason: String },

    /// To the requester after a successful end.
    StreamEndConfirmed,

    /// To the requester when an intent fails.
    Error { message: String },
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_start_stream_parses() {
        let frame = r#"{"event":"start-stream","data":{"sessionId":"S1","credential":"tok"}}"#;
        let event: ClientEvent = serde_json::from_str(frame).unwrap();
        assert_eq!(
            event,
            ClientEvent::StartStream {
                session_id: "S1".to_string(),
                credential: "tok".to_string(),
            }
        );
    }

    #[test]
    fn test_signal_preserves_arbitrary_payload() {
        let to = ConnectionId::new();
        let frame = format!(
            r#"{{"event":"signal","data":{{"to":"{to}","signal":{{"type":"offer","sdp":"v=0","nested":[1,2,3]}}}}}}"#
        );
        let event: ClientEvent = serde_json::from_str(&frame).unwrap();
        match event {
            ClientEvent::Signal { to: target, signal } => {
                assert_eq!(target, to);
                assert_eq!(
                    signal,
                    json!({"type": "offer", "sdp": "v=0", "nested": [1, 2, 3]})
                );
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_event_fails_parse() {
        let frame = r#"{"event":"mute-audio","data":{}}"#;
        assert!(serde_json::from_str::<ClientEvent>(frame).is_err());
    }

    #[test]
    fn test_malformed_target_fails_parse() {
        let frame = r#"{"event":"signal","data":{"to":"not-a-uuid","signal":{}}}"#;
        assert!(serde_json::from_str::<ClientEvent>(frame).is_err());
    }

    #[test]
    fn test_stream_started_serializes_camel_case() {
        let event = ServerEvent::StreamStarted {
            room_id: "S1".to_string(),
            session_id: "S1".to_string(),
            title: "Intro to Rust".to_string(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "event": "stream-started",
                "data": {"roomId": "S1", "sessionId": "S1", "title": "Intro to Rust"}
            })
        );
    }

    #[test]
    fn test_stream_end_confirmed_has_no_data() {
        let value = serde_json::to_value(&ServerEvent::StreamEndConfirmed).unwrap();
        assert_eq!(value, json!({"event": "stream-end-confirmed"}));
    }

    #[test]
    fn test_error_event_shape() {
        let event = ServerEvent::Error {
            message: "Webinar is not live".to_string(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({"event": "error", "data": {"message": "Webinar is not live"}})
        );
    }

    #[test]
    fn test_relayed_signal_shape() {
        let from = ConnectionId::new();
        let event = ServerEvent::Signal {
            from,
            signal: json!({"candidate": "udp 1 2"}),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "event": "signal",
                "data": {"from": from.to_string(), "signal": {"candidate": "udp 1 2"}}
            })
        );
    }
}
