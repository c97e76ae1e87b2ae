//! WebSocket transport driver for the chat session
//!
//! Owns one transport handle at a time and feeds the session's state machine
//! with transport open/close, timer-fire, and visibility events, executing
//! whatever action each transition returns. Delays come from the machine,
//! never from the driver. An abandoned stream is simply dropped before a
//! reconnect dials a new one; no connect timeout is applied beyond the
//! transport's own.

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use super::session::{ChatSession, RenderSink};
use super::state::{ConnAction, ConnEvent};
use crate::types::RelayResult;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Command from the UI boundary into the driver's single control flow.
#[derive(Clone, Debug)]
pub enum ClientCommand {
    /// Send a chat message with the given body
    Send(String),
    /// The UI became visible/foregrounded
    VisibilityGained,
    /// End the session with a normal closure
    Shutdown,
}

/// Outcome of driving one open connection
enum Drive {
    /// The transport closed with the given close code
    Closed(Option<u16>),
    /// The user ended the session
    Shutdown,
}

/// Run the connection manager until the user shuts it down or reconnection
/// is exhausted with no way back (commands channel closed).
pub async fn run<S>(
    url: &str,
    user: &str,
    mut commands: mpsc::UnboundedReceiver<ClientCommand>,
    sink: S,
) -> RelayResult<()>
where
    S: RenderSink + Send,
{
    let mut session = ChatSession::new(sink);
    info!(client_id = session.client_id(), %url, "starting chat session");

    let mut action = session.handle_event(ConnEvent::ConnectRequested);

    loop {
        match action {
            ConnAction::Connect => {
                action = match connect_async(url).await {
                    Ok((stream, _)) => {
                        debug!(%url, "websocket connected");
                        session.handle_event(ConnEvent::TransportOpened);
                        match drive_connection(stream, &mut session, user, &mut commands).await {
                            Drive::Shutdown => return Ok(()),
                            Drive::Closed(code) => {
                                session.handle_event(ConnEvent::TransportClosed { code })
                            }
                        }
                    }
                    Err(error) => {
                        warn!(%error, "websocket connect failed");
                        session.transport_error();
                        session.handle_event(ConnEvent::TransportClosed { code: None })
                    }
                };
            }

            ConnAction::ScheduleReconnect(delay) => {
                debug!(?delay, attempt = session.attempts(), "reconnect scheduled");
                match await_timer(delay, &mut session, &mut commands).await {
                    Some(next) => action = next,
                    None => return Ok(()),
                }
            }

            ConnAction::None => {
                // Disconnected with nothing pending: only a visibility event
                // can revive the session now.
                match commands.recv().await {
                    Some(ClientCommand::VisibilityGained) => {
                        action = session.handle_event(ConnEvent::VisibilityGained);
                    }
                    Some(ClientCommand::Send(_)) => {} // Gated while disconnected
                    Some(ClientCommand::Shutdown) | None => return Ok(()),
                }
            }
        }
    }
}

/// Wait out a reconnect delay. A visibility event preempts the timer; the
/// timer itself may be stale by the time it fires, which the state machine
/// detects. Returns `None` on shutdown.
async fn await_timer<S: RenderSink>(
    delay: std::time::Duration,
    session: &mut ChatSession<S>,
    commands: &mut mpsc::UnboundedReceiver<ClientCommand>,
) -> Option<ConnAction> {
    let timer = tokio::time::sleep(delay);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            () = &mut timer => {
                return Some(session.handle_event(ConnEvent::TimerFired));
            }
            command = commands.recv() => match command {
                Some(ClientCommand::VisibilityGained) => {
                    return Some(session.handle_event(ConnEvent::VisibilityGained));
                }
                Some(ClientCommand::Send(_)) => {} // Gated while disconnected
                Some(ClientCommand::Shutdown) | None => return None,
            },
        }
    }
}

/// Drive one open connection: relay inbound frames into the session and
/// outbound commands onto the wire.
async fn drive_connection<S: RenderSink>(
    stream: WsStream,
    session: &mut ChatSession<S>,
    user: &str,
    commands: &mut mpsc::UnboundedReceiver<ClientCommand>,
) -> Drive {
    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            inbound = read.next() => match inbound {
                Some(Ok(Message::Text(text))) => session.on_receive(&text),
                Some(Ok(Message::Ping(data))) => {
                    let _ = write.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(frame))) => {
                    let code = frame.map(|f| u16::from(f.code));
                    debug!(?code, "websocket closed by server");
                    return Drive::Closed(code);
                }
                Some(Ok(_)) => {} // Ignore binary and pong frames
                Some(Err(error)) => {
                    // Errors surface on the status indicator; the close
                    // that ends the stream drives reconnection.
                    warn!(%error, "websocket read error");
                    session.transport_error();
                    return Drive::Closed(None);
                }
                None => return Drive::Closed(None),
            },

            command = commands.recv() => match command {
                Some(ClientCommand::Send(body)) => {
                    if let Some(frame) = session.send(user, &body) {
                        if write.send(Message::Text(frame)).await.is_err() {
                            session.send_failed();
                        }
                    }
                }
                Some(ClientCommand::VisibilityGained) => {} // Already connected
                Some(ClientCommand::Shutdown) | None => {
                    let _ = write.send(Message::Close(None)).await;
                    return Drive::Shutdown;
                }
            },
        }
    }
}
