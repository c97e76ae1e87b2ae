//! WebSocket connection handling
//!
//! One task per connection: accepted sockets join the [`Registry`], inbound
//! chat frames are fanned out to every registered connection, and the close
//! path (transport close or error, one shared route) removes the connection
//! and announces the departure.
//!
//! [`Registry`]: crate::registry::Registry

pub mod handler;

pub use handler::ws_handler;
