//! Connection registry and broadcast fan-out
//!
//! The registry is the server's only durable state: the set of currently
//! open connections, keyed by a process-unique id. It is owned by the
//! composition root and passed to the handlers by reference, never held as
//! ambient global state.
//!
//! # Invariant
//!
//! A connection appears in the registry iff the server considers its
//! transport open. The set is mutated only by [`Registry::join`] and
//! [`Registry::leave`], never by [`Registry::broadcast`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::Message;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::types::ServerEnvelope;

/// Process-unique identifier for one open connection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Outbound channel to one connection's socket task
pub type ConnectionSender = mpsc::UnboundedSender<Message>;

/// The set of currently open connections.
///
/// Fan-out is fire-and-forget: a send to a connection whose socket task has
/// already gone away is silently skipped. No retry, no delivery confirmation,
/// no flow control beyond the unbounded per-connection channel.
#[derive(Default)]
pub struct Registry {
    connections: RwLock<HashMap<ConnectionId, ConnectionSender>>,
    next_id: AtomicU64,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly accepted connection and return its id.
    pub fn join(&self, sender: ConnectionSender) -> ConnectionId {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.connections.write().insert(id, sender);
        debug!(%id, connections = self.len(), "connection joined");
        id
    }

    /// Remove a connection. Idempotent: returns `false` when the connection
    /// was already absent, so a close following an error never produces a
    /// duplicate departure notice.
    pub fn leave(&self, id: ConnectionId) -> bool {
        let removed = self.connections.write().remove(&id).is_some();
        if removed {
            debug!(%id, connections = self.len(), "connection left");
        }
        removed
    }

    /// Number of currently open connections (reported by `/health`)
    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    /// Whether the registry holds no connections
    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }

    /// Deliver an envelope to every registered connection, skipping
    /// `exclude` when given. Returns the number of connections the envelope
    /// was handed to.
    ///
    /// A connection whose socket task has dropped its receiver between
    /// registry read and send is skipped, not an error; its own close path
    /// removes it from the set.
    pub fn broadcast(&self, envelope: &ServerEnvelope, exclude: Option<ConnectionId>) -> usize {
        let json = match serde_json::to_string(envelope) {
            Ok(json) => json,
            Err(error) => {
                warn!(%error, "failed to serialize envelope, dropping broadcast");
                return 0;
            }
        };

        let connections = self.connections.read();
        let mut delivered = 0;
        for (id, sender) in connections.iter() {
            if Some(*id) == exclude {
                continue;
            }
            if sender.send(Message::Text(json.clone())).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Deliver an envelope to a single connection. Used for the welcome
    /// notice sent directly to a newly accepted connection.
    pub fn send_to(&self, id: ConnectionId, envelope: &ServerEnvelope) {
        let json = match serde_json::to_string(envelope) {
            Ok(json) => json,
            Err(error) => {
                warn!(%error, "failed to serialize envelope, dropping send");
                return;
            }
        };

        if let Some(sender) = self.connections.read().get(&id) {
            let _ = sender.send(Message::Text(json));
        }
    }
}
