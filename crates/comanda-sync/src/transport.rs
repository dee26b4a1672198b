//! # WebSocket Transport
//!
//! WebSocket client with automatic reconnection and backoff, owned by
//! the [`EventBridge`](crate::bridge::EventBridge).
//!
//! ## Connection Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                  WebSocket Connection States                        │
//! │                                                                     │
//! │  ┌────────────┐   connect()    ┌────────────┐                       │
//! │  │Disconnected│ ─────────────► │ Connecting │                       │
//! │  └────────────┘                └─────┬──────┘                       │
//! │        ▲                             │                              │
//! │        │                   success   │   failure                    │
//! │        │                       ┌─────┴─────┐                        │
//! │        │                       ▼           ▼                        │
//! │        │             ┌────────────┐  ┌────────────┐                 │
//! │        │             │ Connected  │  │ Backoff    │                 │
//! │        │             └─────┬──────┘  └─────┬──────┘                 │
//! │        │                   │               │                        │
//! │        │             disconnect/error      │ timer expired          │
//! │        │                   │               │                        │
//! │        │                   ▼               ▼                        │
//! │        └─────────────── (reconnect loop resumes) ─────              │
//! │                                                                     │
//! │  Every successful connect emits TransportEvent::Connected so the    │
//! │  bridge can re-issue its subscribe intent: the server forgets       │
//! │  subscriptions across connections.                                  │
//! │                                                                     │
//! │  BACKOFF: exponential, 500ms initial, 60s cap, reset on success.    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Inbound messages are forwarded strictly in delivery order; the
//! transport never reorders or coalesces. Frames that fail to parse are
//! logged and skipped.

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, RwLock};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use crate::error::{SyncError, SyncResult};
use crate::protocol::PushMessage;

// =============================================================================
// Transport State
// =============================================================================

/// Connection state of the WebSocket transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected.
    Disconnected,
    /// Attempting to connect.
    Connecting,
    /// Connected and ready.
    Connected,
    /// Waiting before the next reconnection attempt.
    Backoff,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Backoff => write!(f, "backoff"),
        }
    }
}

// =============================================================================
// Transport Events
// =============================================================================

/// What the transport reports upward to the bridge.
///
/// Connection transitions are part of the stream so the bridge can
/// resubscribe per connection without polling.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A connection was established (first connect or reconnect).
    Connected,

    /// The connection dropped; the reconnect loop is taking over.
    Disconnected,

    /// An inbound channel message, in delivery order.
    Message(PushMessage),
}

// =============================================================================
// Transport Configuration
// =============================================================================

/// Configuration for the WebSocket transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// WebSocket URL of the push channel.
    pub url: String,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Initial backoff duration.
    pub initial_backoff: Duration,

    /// Maximum backoff duration.
    pub max_backoff: Duration,

    /// Maximum reconnection attempts (0 = infinite).
    pub max_retries: u32,

    /// Ping interval for keepalive.
    pub ping_interval: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            url: String::new(),
            connect_timeout: Duration::from_secs(10),
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(60),
            max_retries: 0, // Infinite
            ping_interval: Duration::from_secs(30),
        }
    }
}

// =============================================================================
// Transport Handle
// =============================================================================

/// Handle for interacting with the transport from the bridge.
#[derive(Clone)]
pub struct TransportHandle {
    /// Sender for outgoing messages.
    outgoing_tx: mpsc::Sender<PushMessage>,

    /// Current connection state.
    state: Arc<RwLock<ConnectionState>>,

    /// Shutdown signal.
    shutdown_tx: mpsc::Sender<()>,
}

impl TransportHandle {
    /// Sends a message through the transport.
    ///
    /// The message is queued if the connection is mid-reconnect and
    /// flushed once it is back.
    pub async fn send(&self, message: PushMessage) -> SyncResult<()> {
        self.outgoing_tx
            .send(message)
            .await
            .map_err(|_| SyncError::ChannelError("transport task stopped".into()))
    }

    /// Non-blocking send for synchronous release paths (RAII guards).
    pub fn try_send(&self, message: PushMessage) -> SyncResult<()> {
        self.outgoing_tx
            .try_send(message)
            .map_err(|_| SyncError::ChannelError("transport task stopped or busy".into()))
    }

    /// Returns the current connection state.
    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Returns true if currently connected.
    pub async fn is_connected(&self) -> bool {
        *self.state.read().await == ConnectionState::Connected
    }

    /// Triggers graceful shutdown.
    pub async fn shutdown(&self) -> SyncResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| SyncError::ChannelError("transport already stopped".into()))
    }

    /// Non-blocking shutdown for synchronous release paths.
    pub fn try_shutdown(&self) -> SyncResult<()> {
        self.shutdown_tx
            .try_send(())
            .map_err(|_| SyncError::ChannelError("transport already stopped".into()))
    }
}

// =============================================================================
// WebSocket Transport
// =============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket transport with automatic reconnection.
///
/// ## Usage
/// ```rust,ignore
/// let config = TransportConfig {
///     url: "ws://localhost:3000/channel".into(),
///     ..Default::default()
/// };
///
/// let (handle, mut events) = Transport::spawn(config);
///
/// while let Some(event) = events.recv().await {
///     match event {
///         TransportEvent::Connected => { /* subscribe */ }
///         TransportEvent::Message(msg) => { /* route */ }
///         TransportEvent::Disconnected => { /* wait for reconnect */ }
///     }
/// }
/// ```
pub struct Transport {
    config: TransportConfig,
    state: Arc<RwLock<ConnectionState>>,
    outgoing_rx: mpsc::Receiver<PushMessage>,
    events_tx: mpsc::Sender<TransportEvent>,
    shutdown_rx: mpsc::Receiver<()>,
}

impl Transport {
    /// Creates a new transport and spawns its background task.
    ///
    /// Returns a handle for sending messages and the event stream.
    pub fn spawn(config: TransportConfig) -> (TransportHandle, mpsc::Receiver<TransportEvent>) {
        let (outgoing_tx, outgoing_rx) = mpsc::channel::<PushMessage>(100);
        let (events_tx, events_rx) = mpsc::channel::<TransportEvent>(100);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
        let state = Arc::new(RwLock::new(ConnectionState::Disconnected));

        let transport = Transport {
            config,
            state: state.clone(),
            outgoing_rx,
            events_tx,
            shutdown_rx,
        };

        tokio::spawn(transport.run());

        let handle = TransportHandle {
            outgoing_tx,
            state,
            shutdown_tx,
        };

        (handle, events_rx)
    }

    /// Main transport loop: connect, pump, back off, repeat.
    async fn run(mut self) {
        info!(url = %self.config.url, "transport starting");

        let mut backoff = self.create_backoff();
        let mut retry_count = 0u32;

        loop {
            if self.shutdown_rx.try_recv().is_ok() {
                info!("transport received shutdown signal");
                break;
            }

            *self.state.write().await = ConnectionState::Connecting;

            match self.connect_with_timeout().await {
                Ok(ws_stream) => {
                    info!("push channel connected");
                    *self.state.write().await = ConnectionState::Connected;

                    // Reset backoff on successful connection
                    backoff.reset();
                    retry_count = 0;

                    if self.events_tx.send(TransportEvent::Connected).await.is_err() {
                        warn!("event receiver dropped; stopping transport");
                        break;
                    }

                    match self.connection_loop(ws_stream).await {
                        Ok(()) => {
                            // Graceful close requested from our side
                            break;
                        }
                        Err(e) => {
                            warn!(error = %e, "connection lost");
                            if self.events_tx.send(TransportEvent::Disconnected).await.is_err() {
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    error!(error = %e, "failed to connect");
                }
            }

            *self.state.write().await = ConnectionState::Backoff;

            if self.config.max_retries > 0 {
                retry_count += 1;
                if retry_count >= self.config.max_retries {
                    error!(
                        max_retries = self.config.max_retries,
                        "max reconnection attempts reached"
                    );
                    break;
                }
            }

            let Some(duration) = backoff.next_backoff() else {
                error!("backoff exhausted");
                break;
            };
            debug!(?duration, attempt = retry_count, "waiting before reconnect");

            tokio::select! {
                _ = tokio::time::sleep(duration) => {}
                _ = self.shutdown_rx.recv() => {
                    info!("shutdown during backoff");
                    break;
                }
            }
        }

        *self.state.write().await = ConnectionState::Disconnected;
        info!("transport stopped");
    }

    /// Connects with timeout.
    async fn connect_with_timeout(&self) -> SyncResult<WsStream> {
        let connect_future = connect_async(&self.config.url);

        match timeout(self.config.connect_timeout, connect_future).await {
            Ok(Ok((ws_stream, response))) => {
                debug!(status = ?response.status(), "websocket handshake complete");
                Ok(ws_stream)
            }
            Ok(Err(e)) => Err(SyncError::from(e)),
            Err(_) => Err(SyncError::Timeout(self.config.connect_timeout.as_secs())),
        }
    }

    /// Pump loop for one live connection.
    ///
    /// Returns Ok(()) only for a shutdown requested on our side; every
    /// other exit is an error that sends the run loop into backoff.
    async fn connection_loop(&mut self, ws_stream: WsStream) -> SyncResult<()> {
        let (mut write, mut read) = ws_stream.split();

        let mut ping_interval = tokio::time::interval(self.config.ping_interval);
        ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately; skip it
        ping_interval.tick().await;

        loop {
            tokio::select! {
                // Outgoing messages (subscribe/unsubscribe intents)
                Some(msg) = self.outgoing_rx.recv() => {
                    let json = msg.to_json()?;
                    debug!(msg_type = %msg.type_name(), "sending message");
                    write.send(WsMessage::Text(json.into())).await?;
                }

                // Inbound frames, forwarded in delivery order
                Some(result) = read.next() => {
                    match result {
                        Ok(WsMessage::Text(text)) => {
                            match PushMessage::from_json(&text) {
                                Ok(PushMessage::Ping { timestamp }) => {
                                    // Protocol-level keepalive; answered here,
                                    // never surfaced to the bridge
                                    let pong = PushMessage::pong(&timestamp).to_json()?;
                                    write.send(WsMessage::Text(pong.into())).await?;
                                }
                                Ok(msg) => {
                                    debug!(msg_type = %msg.type_name(), "received message");
                                    if self.events_tx.send(TransportEvent::Message(msg)).await.is_err() {
                                        warn!("event receiver dropped");
                                        return Err(SyncError::ChannelError("receiver dropped".into()));
                                    }
                                }
                                Err(e) => {
                                    warn!(error = %e, "failed to parse frame; skipping");
                                }
                            }
                        }
                        Ok(WsMessage::Ping(data)) => {
                            write.send(WsMessage::Pong(data)).await?;
                        }
                        Ok(WsMessage::Pong(_)) => {
                            debug!("received pong");
                        }
                        Ok(WsMessage::Close(frame)) => {
                            info!(?frame, "server closed the connection");
                            return Err(SyncError::Disconnected);
                        }
                        Ok(WsMessage::Binary(_)) => {
                            warn!("unexpected binary frame; skipping");
                        }
                        Ok(WsMessage::Frame(_)) => {
                            // Raw frame, ignore
                        }
                        Err(e) => {
                            return Err(SyncError::from(e));
                        }
                    }
                }

                // Periodic keepalive pings
                _ = ping_interval.tick() => {
                    write.send(WsMessage::Ping(Vec::new().into())).await?;
                    debug!("sent ping");
                }

                // Graceful shutdown: flush queued intents (the
                // teardown unsubscribe rides here) before closing
                _ = self.shutdown_rx.recv() => {
                    info!("shutdown signal received; closing connection");
                    while let Ok(msg) = self.outgoing_rx.try_recv() {
                        if let Ok(json) = msg.to_json() {
                            let _ = write.send(WsMessage::Text(json.into())).await;
                        }
                    }
                    let _ = write.send(WsMessage::Close(None)).await;
                    return Ok(());
                }
            }
        }
    }

    /// Creates the exponential backoff schedule.
    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.config.initial_backoff,
            max_interval: self.config.max_backoff,
            multiplier: 2.0,
            max_elapsed_time: None, // No limit on total time
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_display() {
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
        assert_eq!(ConnectionState::Backoff.to_string(), "backoff");
    }

    #[test]
    fn test_transport_config_default() {
        let config = TransportConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.initial_backoff, Duration::from_millis(500));
        assert_eq!(config.max_retries, 0); // Infinite
    }

    #[tokio::test]
    async fn test_handle_reports_stopped_transport() {
        // A transport pointed at nothing, shut down immediately
        let (handle, mut events) = Transport::spawn(TransportConfig {
            url: "ws://127.0.0.1:1/unreachable".into(),
            connect_timeout: Duration::from_millis(50),
            max_retries: 1,
            ..Default::default()
        });

        // Drain events until the task stops
        while events.recv().await.is_some() {}

        // The task dropped its receiver; sends must now fail
        assert!(handle.send(PushMessage::ping()).await.is_err());
        assert_eq!(handle.state().await, ConnectionState::Disconnected);
    }
}
