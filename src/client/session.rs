//! Client chat session
//!
//! Mediates between the UI boundary and the wire: send gating, optimistic
//! local echo, clientId-based echo suppression, and rendering through a
//! pluggable sink. Session state needs no synchronization; all callbacks are
//! funneled through the transport driver's single control flow.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::json;
use tracing::warn;

use super::state::{ConnAction, ConnEvent, ConnectionMachine};
use crate::types::{ServerEnvelope, ANONYMOUS_USER};

/// Length of the random suffix in a generated client id
const CLIENT_ID_SUFFIX_LEN: usize = 9;

/// Origin tag attached to a rendered entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderTag {
    /// Sent by this session (optimistic local echo)
    SelfMessage,
    /// Sent by another participant
    OtherMessage,
    /// Server- or session-originated notice
    System,
}

/// One visual entry for the UI boundary to append and scroll to.
///
/// The body is untrusted text; sinks must neutralize it for their display
/// surface (HTML escaping, control-character stripping) before showing it.
#[derive(Clone, Debug)]
pub struct RenderEntry {
    /// Display name of the originator
    pub user: String,
    /// Message body, unsanitized
    pub body: String,
    /// RFC 3339 timestamp
    pub timestamp: String,
    /// Origin tag
    pub tag: RenderTag,
}

/// Connection status surfaced to the UI boundary's status indicator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnStatus {
    /// Transport open
    Connected,
    /// Transport closed
    Disconnected,
    /// Transport error
    Error,
}

/// UI boundary: a passive consumer of rendered entries and status changes.
pub trait RenderSink {
    /// Append a visual entry and scroll to it
    fn render(&mut self, entry: RenderEntry);

    /// Update the connection status indicator
    fn status_changed(&mut self, _status: ConnStatus) {}
}

/// Generate a session-stable random client id, e.g. `client-x4f9k2p1q`.
pub fn generate_client_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CLIENT_ID_SUFFIX_LEN)
        .map(char::from)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    format!("client-{suffix}")
}

/// Replace control characters so untrusted text cannot inject terminal
/// escapes. Sinks rendering to a terminal call this before display.
pub fn sanitize_text(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// One logical chat session: connection state machine, session-stable client
/// id, and the render sink it reports to.
pub struct ChatSession<S: RenderSink> {
    machine: ConnectionMachine,
    client_id: String,
    sink: S,
}

impl<S: RenderSink> ChatSession<S> {
    /// New session with a freshly generated client id
    pub fn new(sink: S) -> Self {
        Self::with_client_id(sink, generate_client_id())
    }

    /// New session with an explicit client id
    pub fn with_client_id(sink: S, client_id: String) -> Self {
        Self {
            machine: ConnectionMachine::new(),
            client_id,
            sink,
        }
    }

    /// This session's client id (stable for the session lifetime)
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Whether the transport is currently open
    pub fn is_connected(&self) -> bool {
        self.machine.is_connected()
    }

    /// Current reconnect attempt count
    pub fn attempts(&self) -> u32 {
        self.machine.attempts()
    }

    /// The render sink (used by tests to inspect output)
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Feed a connection event through the state machine, updating the
    /// status indicator on transitions the UI should see.
    pub fn handle_event(&mut self, event: ConnEvent) -> ConnAction {
        let action = self.machine.on_event(event);
        match event {
            ConnEvent::TransportOpened => self.sink.status_changed(ConnStatus::Connected),
            ConnEvent::TransportClosed { .. } => {
                self.sink.status_changed(ConnStatus::Disconnected);
            }
            _ => {}
        }
        action
    }

    /// Surface a transport error on the status indicator. Errors do not
    /// themselves schedule reconnection; the close that follows does.
    pub fn transport_error(&mut self) {
        self.sink.status_changed(ConnStatus::Error);
    }

    /// Compose an outbound frame.
    ///
    /// No-op (returns `None`) unless connected and the body trims non-empty.
    /// On success the message is rendered immediately as self-originated
    /// (optimistic local echo, not waiting for server fan-out) and the JSON
    /// frame to transmit is returned; the caller then clears its input
    /// buffer.
    pub fn send(&mut self, user: &str, body: &str) -> Option<String> {
        let body = body.trim();
        if !self.machine.is_connected() || body.is_empty() {
            return None;
        }

        let user = user.trim();
        let user = if user.is_empty() { ANONYMOUS_USER } else { user };

        let frame = json!({
            "user": user,
            "message": body,
            "clientId": self.client_id,
        })
        .to_string();

        self.sink.render(RenderEntry {
            user: user.to_string(),
            body: body.to_string(),
            timestamp: crate::utils::time::rfc3339_now(),
            tag: RenderTag::SelfMessage,
        });

        Some(frame)
    }

    /// Report a failed transmit as a locally rendered system notice.
    pub fn send_failed(&mut self) {
        self.notice("Failed to send message");
    }

    /// Render a locally originated system notice.
    pub fn notice(&mut self, text: &str) {
        self.sink.render(RenderEntry {
            user: "System".to_string(),
            body: text.to_string(),
            timestamp: crate::utils::time::rfc3339_now(),
            tag: RenderTag::System,
        });
    }

    /// Handle one inbound frame from the server.
    ///
    /// Malformed payloads are logged and dropped. A `message` envelope whose
    /// clientId matches this session is suppressed: it was already rendered
    /// optimistically at send time.
    pub fn on_receive(&mut self, raw: &str) {
        let envelope: ServerEnvelope = match serde_json::from_str(raw) {
            Ok(envelope) => envelope,
            Err(error) => {
                warn!(%error, "dropping malformed server frame");
                return;
            }
        };

        match envelope {
            ServerEnvelope::System { message, timestamp } => {
                self.sink.render(RenderEntry {
                    user: "System".to_string(),
                    body: message,
                    timestamp,
                    tag: RenderTag::System,
                });
            }
            ServerEnvelope::Message {
                user,
                message,
                timestamp,
                client_id,
            } => {
                if client_id.as_deref() == Some(self.client_id.as_str()) {
                    return; // Own message, already rendered at send time
                }
                self.sink.render(RenderEntry {
                    user,
                    body: message,
                    timestamp,
                    tag: RenderTag::OtherMessage,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct TestSink {
        entries: Vec<RenderEntry>,
        statuses: Vec<ConnStatus>,
    }

    impl RenderSink for TestSink {
        fn render(&mut self, entry: RenderEntry) {
            self.entries.push(entry);
        }

        fn status_changed(&mut self, status: ConnStatus) {
            self.statuses.push(status);
        }
    }

    fn connected_session() -> ChatSession<TestSink> {
        let mut session =
            ChatSession::with_client_id(TestSink::default(), "client-test00001".to_string());
        session.handle_event(ConnEvent::ConnectRequested);
        session.handle_event(ConnEvent::TransportOpened);
        session
    }

    #[test]
    fn test_generated_client_id_shape() {
        let id = generate_client_id();
        assert!(id.starts_with("client-"));
        assert_eq!(id.len(), "client-".len() + 9);
        assert_ne!(id, generate_client_id());
    }

    #[test]
    fn test_send_produces_frame_and_echo() {
        let mut session = connected_session();
        let frame = session.send("Alice", "hi").unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(parsed["user"], "Alice");
        assert_eq!(parsed["message"], "hi");
        assert_eq!(parsed["clientId"], "client-test00001");

        // Optimistic local echo, tagged as self-originated
        let entries = &session.sink().entries;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tag, RenderTag::SelfMessage);
        assert_eq!(entries[0].body, "hi");
    }

    #[test]
    fn test_send_gated_when_disconnected() {
        let mut session =
            ChatSession::with_client_id(TestSink::default(), "client-test00001".to_string());
        assert!(session.send("Alice", "hi").is_none());
        assert!(session.sink().entries.is_empty());
    }

    #[test]
    fn test_empty_body_is_noop() {
        let mut session = connected_session();
        assert!(session.send("Alice", "   ").is_none());
        assert!(session.send("Alice", "").is_none());
        assert!(session.sink().entries.is_empty());
    }

    #[test]
    fn test_blank_user_defaults_to_anonymous() {
        let mut session = connected_session();
        let frame = session.send("  ", "hi").unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(parsed["user"], ANONYMOUS_USER);
    }

    #[test]
    fn test_own_echo_is_suppressed() {
        let mut session = connected_session();
        session.send("Alice", "hi").unwrap();

        // The server fans the message back, clientId intact
        session.on_receive(
            r#"{"type":"message","user":"Alice","message":"hi","timestamp":"2024-01-01T00:00:00.000Z","clientId":"client-test00001"}"#,
        );

        // Exactly one render: the optimistic copy
        assert_eq!(session.sink().entries.len(), 1);
        assert_eq!(session.sink().entries[0].tag, RenderTag::SelfMessage);
    }

    #[test]
    fn test_other_message_is_rendered() {
        let mut session = connected_session();
        session.on_receive(
            r#"{"type":"message","user":"Bob","message":"hey","timestamp":"2024-01-01T00:00:00.000Z","clientId":"client-someoneels"}"#,
        );

        let entries = &session.sink().entries;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tag, RenderTag::OtherMessage);
        assert_eq!(entries[0].user, "Bob");
    }

    #[test]
    fn test_null_client_id_is_rendered() {
        let mut session = connected_session();
        session.on_receive(
            r#"{"type":"message","user":"Bob","message":"hey","timestamp":"2024-01-01T00:00:00.000Z","clientId":null}"#,
        );
        assert_eq!(session.sink().entries.len(), 1);
    }

    #[test]
    fn test_system_envelope_rendered_as_system() {
        let mut session = connected_session();
        session.on_receive(
            r#"{"type":"system","message":"A new user joined the chat","timestamp":"2024-01-01T00:00:00.000Z"}"#,
        );

        let entries = &session.sink().entries;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tag, RenderTag::System);
    }

    #[test]
    fn test_malformed_frame_dropped() {
        let mut session = connected_session();
        session.on_receive("not-json");
        session.on_receive(r#"{"type":"unknown","message":"x"}"#);
        assert!(session.sink().entries.is_empty());
    }

    #[test]
    fn test_status_transitions_reach_sink() {
        let mut session = connected_session();
        session.transport_error();
        session.handle_event(ConnEvent::TransportClosed { code: Some(1006) });

        assert_eq!(
            session.sink().statuses,
            vec![
                ConnStatus::Connected,
                ConnStatus::Error,
                ConnStatus::Disconnected
            ]
        );
    }

    #[test]
    fn test_send_failed_renders_notice() {
        let mut session = connected_session();
        session.send_failed();
        let entries = &session.sink().entries;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tag, RenderTag::System);
        assert_eq!(entries[0].body, "Failed to send message");
    }

    #[test]
    fn test_sanitize_strips_control_characters() {
        assert_eq!(sanitize_text("hi\x1b[31mred"), "hi [31mred");
        assert_eq!(sanitize_text("plain text"), "plain text");
    }
}
