//! Message envelopes exchanged over the WebSocket transport

use serde::{Deserialize, Serialize};

use crate::utils::time::rfc3339_now;

/// Display name used when a sender supplies no name
pub const ANONYMOUS_USER: &str = "Anonymous";

/// Frame sent by a client to the server.
///
/// `user` and `clientId` are optional on the wire; any client-supplied
/// timestamp is ignored (the server stamps envelopes itself).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientFrame {
    /// Display name of the sender
    #[serde(default)]
    pub user: Option<String>,

    /// Chat message body
    pub message: String,

    /// Opaque per-session sender identifier, used for echo suppression
    #[serde(rename = "clientId", default)]
    pub client_id: Option<String>,
}

impl ClientFrame {
    /// Display name with the anonymous fallback applied
    pub fn display_user(&self) -> String {
        match self.user.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => ANONYMOUS_USER.to_string(),
        }
    }
}

/// Envelope sent by the server to clients, discriminated by `type`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerEnvelope {
    /// Server-originated notice (welcome, join, leave)
    System {
        /// Notice text
        message: String,
        /// Server-assigned RFC 3339 timestamp
        timestamp: String,
    },

    /// Relayed chat message
    Message {
        /// Display name of the sender
        user: String,
        /// Chat message body
        message: String,
        /// Server-assigned RFC 3339 timestamp
        timestamp: String,
        /// Sender identifier carried through unchanged (`null` when absent)
        #[serde(rename = "clientId")]
        client_id: Option<String>,
    },
}

impl ServerEnvelope {
    /// Build a `system` envelope stamped with the current time
    pub fn system(message: impl Into<String>) -> Self {
        Self::System {
            message: message.into(),
            timestamp: rfc3339_now(),
        }
    }

    /// Build a `message` envelope from an inbound client frame.
    ///
    /// The timestamp is server-assigned; the client identifier is carried
    /// through unchanged.
    pub fn chat(frame: ClientFrame) -> Self {
        Self::Message {
            user: frame.display_user(),
            message: frame.message,
            timestamp: rfc3339_now(),
            client_id: frame.client_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_envelope_wire_format() {
        let envelope = ServerEnvelope::system("Welcome to the chat!");
        let json = serde_json::to_string(&envelope).unwrap();

        assert!(json.contains(r#""type":"system""#));
        assert!(json.contains(r#""message":"Welcome to the chat!""#));
        assert!(json.contains(r#""timestamp""#));
    }

    #[test]
    fn test_message_envelope_carries_client_id() {
        let frame = ClientFrame {
            user: Some("Alice".to_string()),
            message: "hi".to_string(),
            client_id: Some("client-x4f9k2p1q".to_string()),
        };
        let envelope = ServerEnvelope::chat(frame);
        let json = serde_json::to_string(&envelope).unwrap();

        assert!(json.contains(r#""type":"message""#));
        assert!(json.contains(r#""user":"Alice""#));
        assert!(json.contains(r#""clientId":"client-x4f9k2p1q""#));
    }

    #[test]
    fn test_message_envelope_null_client_id() {
        let frame = ClientFrame {
            user: None,
            message: "hi".to_string(),
            client_id: None,
        };
        let json = serde_json::to_string(&ServerEnvelope::chat(frame)).unwrap();

        // Absent identifiers serialize as explicit null, not omitted
        assert!(json.contains(r#""clientId":null"#));
    }

    #[test]
    fn test_anonymous_fallback() {
        let blank = ClientFrame {
            user: Some("   ".to_string()),
            message: "hi".to_string(),
            client_id: None,
        };
        assert_eq!(blank.display_user(), ANONYMOUS_USER);

        let missing = ClientFrame {
            user: None,
            message: "hi".to_string(),
            client_id: None,
        };
        assert_eq!(missing.display_user(), ANONYMOUS_USER);

        let named = ClientFrame {
            user: Some(" Alice ".to_string()),
            message: "hi".to_string(),
            client_id: None,
        };
        assert_eq!(named.display_user(), "Alice");
    }

    #[test]
    fn test_client_frame_parsing_defaults() {
        let frame: ClientFrame = serde_json::from_str(r#"{"message":"hello"}"#).unwrap();
        assert_eq!(frame.message, "hello");
        assert!(frame.user.is_none());
        assert!(frame.client_id.is_none());
    }

    #[test]
    fn test_server_envelope_round_trip() {
        let json = r#"{"type":"message","user":"Bob","message":"hey","timestamp":"2024-01-01T00:00:00.000Z","clientId":"client-abc123def"}"#;
        let envelope: ServerEnvelope = serde_json::from_str(json).unwrap();

        match envelope {
            ServerEnvelope::Message {
                user, client_id, ..
            } => {
                assert_eq!(user, "Bob");
                assert_eq!(client_id.as_deref(), Some("client-abc123def"));
            }
            ServerEnvelope::System { .. } => panic!("expected message envelope"),
        }
    }
}
