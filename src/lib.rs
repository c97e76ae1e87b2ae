//! Chat Relay
//!
//! A minimal real-time chat relay over WebSockets: the server fans each
//! inbound message out to every connected participant, and the client keeps a
//! single logical connection alive with exponential-backoff reconnection.
//!
//! # Modules
//!
//! - `types`: Wire envelope types (client frames, server envelopes)
//! - `config`: Server configuration (port, static asset directory)
//! - `registry`: Connection registry and broadcast fan-out
//! - `api`: HTTP router and WebSocket connection handler
//! - `client`: Connection-manager state machine, chat session, transport
//! - `utils`: Utility functions (timestamps)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chat_relay::api::http::create_router;
//! use chat_relay::{Registry, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig::from_env();
//!     let registry = Arc::new(Registry::new());
//!     let app = create_router(registry, &config.static_dir);
//!     let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
//!         .await
//!         .unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod registry;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::ServerConfig;
pub use registry::{ConnectionId, Registry};
pub use types::{ClientFrame, RelayResult, ServerEnvelope};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
