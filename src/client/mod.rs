//! Client-side connection manager
//!
//! Owns a single logical connection to the relay: the state machine tracks
//! connection status and reconnect backoff, the session handles send gating
//! and echo suppression, and the transport driver binds both to a real
//! WebSocket.

pub mod session;
pub mod state;
pub mod transport;

pub use session::{
    generate_client_id, sanitize_text, ChatSession, ConnStatus, RenderEntry, RenderSink,
    RenderTag,
};
pub use state::{
    ConnAction, ConnEvent, ConnState, ConnectionMachine, BASE_RECONNECT_DELAY,
    MAX_RECONNECT_ATTEMPTS, NORMAL_CLOSURE_CODE,
};
pub use transport::ClientCommand;
