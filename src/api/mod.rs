//! HTTP and WebSocket endpoints
//!
//! The WebSocket upgrade, the health check, and the static web UI all share
//! one port.

pub mod http;
pub mod websocket;
