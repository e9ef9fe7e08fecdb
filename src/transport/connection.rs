//! WebSocket connection and event loop.
//!
//! The connection spawns one tokio task per socket. That task is the only
//! reader of the socket: every text frame is decoded and fed to the shared
//! [`SessionCell`] in arrival order, each under a single write lock, so
//! handlers never interleave.
//!
//! # Event Loop
//!
//! - Incoming text frames → [`Input::Event`]
//! - Close frame, socket error or end of stream → [`Input::Closed`]
//! - Outgoing commands from the client handle → serialized and written
//! - Shutdown → close handshake, no further dispatch

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use serde_json::to_string;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::{ClientCommand, ServerEvent};

use super::machine::{Epoch, Input, SessionCell};

// ============================================================================
// Types
// ============================================================================

/// Session state shared between the client handle and the event loop.
pub type SharedCell = Arc<RwLock<SessionCell>>;

/// Client-side socket as returned by [`open_socket`].
pub type ClientSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Write a command to the socket.
    Send(ClientCommand),
    /// Close the socket and stop dispatching.
    Shutdown,
}

// ============================================================================
// open_socket
// ============================================================================

/// Performs the WebSocket handshake with the game engine.
///
/// # Errors
///
/// [`Error::Connection`] if the TCP connect or upgrade fails.
pub async fn open_socket(url: &Url) -> Result<ClientSocket> {
    let (ws_stream, response) = connect_async(url.as_str())
        .await
        .map_err(|e| Error::connection(format!("WebSocket handshake with {url} failed: {e}")))?;

    debug!(%url, status = %response.status(), "WebSocket handshake completed");
    Ok(ws_stream)
}

// ============================================================================
// Connection
// ============================================================================

/// Handle to a running event loop.
///
/// Dropping the handle closes the command channel, which ends the loop.
#[derive(Debug)]
pub struct Connection {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// Generation this connection belongs to.
    epoch: Epoch,
}

impl Connection {
    /// Spawns the event loop for an established socket.
    ///
    /// Must be called inside a tokio runtime.
    pub fn spawn<S>(ws_stream: WebSocketStream<S>, epoch: Epoch, cell: SharedCell) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        tokio::spawn(Self::run_event_loop(ws_stream, command_rx, epoch, cell));

        Self { command_tx, epoch }
    }

    /// Connection generation.
    #[inline]
    #[must_use]
    pub const fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Queues a command for the socket writer.
    ///
    /// Returns `false` if the event loop has already stopped; the command is
    /// dropped in that case.
    pub fn send(&self, command: ClientCommand) -> bool {
        self.command_tx.send(ConnectionCommand::Send(command)).is_ok()
    }

    /// Closes the socket.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }

    /// Returns `true` while the event loop is running.
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.command_tx.is_closed()
    }

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop<S>(
        ws_stream: WebSocketStream<S>,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        epoch: Epoch,
        cell: SharedCell,
    ) where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                // Incoming frames from the engine
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            let event = ServerEvent::decode(&text);
                            Self::notify(&cell, Input::Event { epoch, event });
                        }

                        Some(Ok(Message::Close(frame))) => {
                            debug!(epoch, ?frame, "WebSocket closed by remote");
                            Self::notify(&cell, Input::Closed { epoch });
                            break;
                        }

                        Some(Err(e)) => {
                            warn!(epoch, error = %e, "WebSocket error");
                            Self::notify(&cell, Input::Closed { epoch });
                            break;
                        }

                        None => {
                            debug!(epoch, "WebSocket stream ended");
                            Self::notify(&cell, Input::Closed { epoch });
                            break;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                // Commands from the client handle
                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send(command)) => {
                            Self::handle_send_command(command, &mut ws_write).await;
                        }

                        Some(ConnectionCommand::Shutdown) => {
                            debug!(epoch, "Shutdown command received");
                            let _ = ws_write.close().await;
                            break;
                        }

                        None => {
                            debug!(epoch, "Command channel closed");
                            let _ = ws_write.close().await;
                            break;
                        }
                    }
                }
            }
        }

        debug!(epoch, "Event loop terminated");
    }

    /// Feeds an I/O notification to the machine.
    fn notify(cell: &SharedCell, input: Input) {
        if let Err(e) = cell.write().apply(input) {
            warn!(error = %e, "Notification rejected");
        }
    }

    /// Serializes and writes one command.
    async fn handle_send_command<S>(
        command: ClientCommand,
        ws_write: &mut SplitSink<WebSocketStream<S>, Message>,
    ) where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let kind = command.kind();

        let json = match to_string(&command) {
            Ok(json) => json,
            Err(e) => {
                warn!(kind, error = %e, "Failed to serialize command");
                return;
            }
        };

        if let Err(e) = ws_write.send(Message::Text(json.into())).await {
            warn!(kind, error = %e, "Failed to send command");
            return;
        }

        trace!(kind, "Command sent");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use tokio::net::TcpListener;
    use tokio::time::{sleep, timeout};
    use tokio_tungstenite::accept_async;

    use crate::state::NarrativeKind;
    use crate::transport::machine::Effect;

    /// Binds a local engine stand-in and returns its address.
    async fn bind() -> (TcpListener, Url) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        let url = Url::parse(&format!("ws://127.0.0.1:{port}/api/game/s1/ws")).expect("url");
        (listener, url)
    }

    /// Drives a cell to `Open` the same way the client does.
    fn open_cell(url: &Url) -> (SharedCell, Epoch) {
        let cell: SharedCell = Arc::new(RwLock::new(SessionCell::new()));
        let effect = cell
            .write()
            .apply(Input::Connect {
                session_id: "s1".into(),
                url: url.clone(),
            })
            .expect("connect");
        let Some(Effect::Open { epoch, .. }) = effect else {
            panic!("expected Open effect");
        };
        cell.write().apply(Input::Opened { epoch }).expect("opened");
        (cell, epoch)
    }

    async fn wait_until(cell: &SharedCell, check: impl Fn(&SessionCell) -> bool) {
        timeout(Duration::from_secs(5), async {
            while !check(&cell.read()) {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test]
    async fn test_frames_dispatched_in_order() {
        let (listener, url) = bind().await;

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut ws = accept_async(stream).await.expect("upgrade");
            for frame in [
                r#"{"type":"narrative","content":"one"}"#,
                r#"{"type":"unknown_frame"}"#,
                r#"{"type":"system","content":"two"}"#,
                r#"{"type":"narrative","content":"three"}"#,
            ] {
                ws.send(Message::Text(frame.into())).await.expect("send");
            }
            ws.close(None).await.expect("close");
        });

        let socket = open_socket(&url).await.expect("open socket");
        let (cell, epoch) = open_cell(&url);
        let connection = Connection::spawn(socket, epoch, Arc::clone(&cell));
        assert_eq!(connection.epoch(), epoch);

        wait_until(&cell, |c| !c.store().is_connected()).await;
        server.await.expect("server task");

        let cell = cell.read();
        let contents: Vec<_> = cell
            .store()
            .narrative_log()
            .iter()
            .map(|e| (e.kind(), e.content().to_string()))
            .collect();
        assert_eq!(
            contents,
            vec![
                (NarrativeKind::Narrative, "one".to_string()),
                (NarrativeKind::System, "two".to_string()),
                (NarrativeKind::Narrative, "three".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_commands_written_as_json() {
        let (listener, url) = bind().await;

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut ws = accept_async(stream).await.expect("upgrade");
            let mut received = Vec::new();
            while let Some(Ok(message)) = ws.next().await {
                if let Message::Text(text) = message {
                    received.push(text.to_string());
                }
                if received.len() == 2 {
                    break;
                }
            }
            received
        });

        let socket = open_socket(&url).await.expect("open socket");
        let (cell, epoch) = open_cell(&url);
        let connection = Connection::spawn(socket, epoch, cell);

        assert!(connection.send(ClientCommand::player_action("a", "hide")));
        assert!(connection.send(ClientCommand::save_game(None)));

        let received = timeout(Duration::from_secs(5), server)
            .await
            .expect("server timed out")
            .expect("server task");
        assert_eq!(
            received,
            vec![
                r#"{"type":"player_action","character_id":"a","content":"hide"}"#,
                r#"{"type":"save_game","slot":"manual"}"#,
            ]
        );
        connection.shutdown();
    }

    #[tokio::test]
    async fn test_shutdown_stops_loop() {
        let (listener, url) = bind().await;

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut ws = accept_async(stream).await.expect("upgrade");
            while let Some(Ok(_)) = ws.next().await {}
        });

        let socket = open_socket(&url).await.expect("open socket");
        let (cell, epoch) = open_cell(&url);
        let connection = Connection::spawn(socket, epoch, cell);
        assert!(connection.is_running());

        connection.shutdown();
        timeout(Duration::from_secs(5), async {
            while connection.is_running() {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("loop did not stop");
        assert!(!connection.send(ClientCommand::Ping));
    }

    #[tokio::test]
    async fn test_open_socket_refused() {
        let (listener, url) = bind().await;
        drop(listener);

        let err = open_socket(&url).await.expect_err("nothing listening");
        assert!(err.is_connection_error());
    }
}
