//! Wire types for the chat relay
//!
//! One JSON object per WebSocket text frame, in both directions.

mod envelope;

pub use envelope::{ClientFrame, ServerEnvelope, ANONYMOUS_USER};

/// Result type for relay operations
pub type RelayResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;
