//! Terminal chat client
//!
//! Connects to a chat relay, prints incoming messages, and sends each stdin
//! line as a chat message. `/reconnect` forces an immediate reconnect (the
//! terminal analog of the page regaining visibility); `/quit` ends the
//! session with a normal closure.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use chat_relay::client::{
    sanitize_text, ClientCommand, ConnStatus, RenderEntry, RenderSink, RenderTag,
};
use chat_relay::types::RelayResult;

/// Renders entries as plain lines on stdout.
struct TerminalSink;

impl RenderSink for TerminalSink {
    fn render(&mut self, entry: RenderEntry) {
        let user = sanitize_text(&entry.user);
        let body = sanitize_text(&entry.body);
        let marker = match entry.tag {
            RenderTag::SelfMessage => "you",
            RenderTag::OtherMessage => "them",
            RenderTag::System => "sys",
        };
        println!("[{}] {} <{}>: {}", entry.timestamp, marker, user, body);
    }

    fn status_changed(&mut self, status: ConnStatus) {
        let label = match status {
            ConnStatus::Connected => "Connected",
            ConnStatus::Disconnected => "Disconnected",
            ConnStatus::Error => "Error",
        };
        println!("* {label}");
    }
}

#[tokio::main]
async fn main() -> RelayResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let url = args
        .next()
        .unwrap_or_else(|| "ws://localhost:3000/ws".to_string());
    let user = args
        .next()
        .or_else(|| std::env::var("USER").ok())
        .unwrap_or_default();

    let (commands_tx, commands_rx) = mpsc::unbounded_channel();

    // Stdin loop feeding the driver's single control flow
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let command = match line.trim() {
                "/quit" => ClientCommand::Shutdown,
                "/reconnect" => ClientCommand::VisibilityGained,
                _ => ClientCommand::Send(line),
            };
            let shutdown = matches!(command, ClientCommand::Shutdown);
            if commands_tx.send(command).is_err() || shutdown {
                break;
            }
        }
        // Stdin closed: end the session
        let _ = commands_tx.send(ClientCommand::Shutdown);
    });

    chat_relay::client::transport::run(&url, &user, commands_rx, TerminalSink).await
}
