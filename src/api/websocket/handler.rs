//! WebSocket connection handler

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::registry::{ConnectionId, Registry};
use crate::types::{ClientFrame, ServerEnvelope};

/// Welcome notice sent directly to a newly accepted connection
const WELCOME_NOTICE: &str = "Welcome to the WebSocket chat!";

/// Notice broadcast to the other connections when someone joins
const JOINED_NOTICE: &str = "A new user joined the chat";

/// Notice broadcast to the remaining connections when someone leaves
const LEFT_NOTICE: &str = "A user left the chat";

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(registry): State<Arc<Registry>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, registry))
}

/// Handle an individual WebSocket connection from accept to close.
async fn handle_socket(mut socket: WebSocket, registry: Arc<Registry>) {
    // Register and greet; the welcome and all fan-out reach this socket
    // through the outbound channel drained by the loop below.
    let (tx, mut rx) = mpsc::unbounded_channel();
    let id = registry.join(tx);
    info!(%id, "client connected");

    registry.send_to(id, &ServerEnvelope::system(WELCOME_NOTICE));
    registry.broadcast(&ServerEnvelope::system(JOINED_NOTICE), Some(id));

    loop {
        tokio::select! {
            // Outbound: envelopes fanned out to this connection
            Some(outbound) = rx.recv() => {
                if socket.send(outbound).await.is_err() {
                    break; // Client disconnected
                }
            }

            // Inbound: frames from this client
            result = socket.recv() => {
                match result {
                    Some(Ok(frame)) => {
                        if !handle_frame(frame, id, &registry, &mut socket).await {
                            break; // Client requested close
                        }
                    }
                    Some(Err(error)) => {
                        // Transport error: same path as a close, no crash
                        warn!(%id, %error, "websocket error");
                        break;
                    }
                    None => break, // Client disconnected
                }
            }
        }
    }

    // Single idempotent close path for close and error alike
    if registry.leave(id) {
        info!(%id, "client disconnected");
        registry.broadcast(&ServerEnvelope::system(LEFT_NOTICE), None);
    }
}

/// Handle one inbound frame. Returns `false` when the connection should be
/// closed.
async fn handle_frame(
    frame: Message,
    id: ConnectionId,
    registry: &Registry,
    socket: &mut WebSocket,
) -> bool {
    match frame {
        Message::Text(text) => {
            match serde_json::from_str::<ClientFrame>(&text) {
                Ok(client_frame) => {
                    debug!(%id, user = %client_frame.display_user(), "received message");
                    // Fan out to all connections, sender included; the
                    // sender suppresses its own echo by clientId.
                    registry.broadcast(&ServerEnvelope::chat(client_frame), None);
                }
                Err(error) => {
                    // Malformed payload: logged and dropped, connection stays open
                    warn!(%id, %error, "dropping malformed frame");
                }
            }
            true
        }
        Message::Binary(_) => true, // Ignore binary frames
        Message::Ping(data) => {
            let _ = socket.send(Message::Pong(data)).await;
            true
        }
        Message::Pong(_) => true,   // Ignore pong responses
        Message::Close(_) => false, // Client requested close
    }
}
