mod codec;
pub use codec::{decode_label, GestureCodec};
mod connection;
pub use connection::ActiveConnection;
mod dispatcher;
pub use dispatcher::{LinkDispatcher, MainLoopDispatcher, PendingAction};
mod display;
pub use display::{DisplayFrame, DisplaySink, GestureHost};
mod error;
pub use error::{ConnectError, LinkError};
mod reader;
pub use reader::StreamReader;
mod settings;
pub use settings::{Settings, SETTINGS};
mod state;
pub use state::{ConnectionState, LinkState, ReconnectTimer};

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Value of the gesture label before anything has been received.
pub const BLANK_GESTURE: &str = " ";

/// Keeps a TCP link to the gesture producer alive and exposes the latest
/// gesture label to a single-threaded host.
///
/// The host calls [`ConnectionManager::tick`] once per frame. Background
/// readers never touch the connection state directly; they queue transitions
/// on the dispatcher, and `tick` applies them.
///
/// # Logging
///
/// This library uses the `tracing` crate for logging. To enable logs, you'll need to
/// initialize a tracing subscriber in your application.
///
/// Example using `tracing_subscriber`:
/// ```no_run
/// use tracing::Level;
/// use tracing_subscriber::FmtSubscriber;
///
/// let subscriber = FmtSubscriber::builder()
///     .with_max_level(Level::DEBUG) // Set to DEBUG, INFO, WARN, or ERROR
///     .finish();
///
/// tracing::subscriber::set_global_default(subscriber)
///     .expect("Failed to set tracing subscriber");
/// ```
///
/// The log levels control what information is displayed:
/// - `TRACE`: every gesture label received
/// - `DEBUG`: teardown steps and ignored stale reports
/// - `INFO`: connect attempts, established connections, shutdown
/// - `WARN`: failed connects and lost connections
/// - `ERROR`: read failures
pub struct ConnectionManager {
    settings: Settings,
    link: LinkState,
    connection: Option<ActiveConnection>,
    next_connection_id: u64,
    dispatcher: Arc<LinkDispatcher>,
    // Shared with every reader; only the live one writes
    gesture_tx: Arc<watch::Sender<String>>,
    gesture_rx: watch::Receiver<String>,
    state_tx: watch::Sender<ConnectionState>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl ConnectionManager {
    /// Create a manager with its own dispatcher.
    pub fn new(settings: Settings) -> Self {
        Self::with_dispatcher(settings, Arc::new(MainLoopDispatcher::new()))
    }

    /// Create a manager from the environment-backed [`SETTINGS`].
    pub fn from_env() -> Self {
        Self::new(SETTINGS.clone())
    }

    /// Create a manager that drains `dispatcher`, e.g. [`MainLoopDispatcher::shared`].
    pub fn with_dispatcher(settings: Settings, dispatcher: Arc<LinkDispatcher>) -> Self {
        let (gesture_tx, gesture_rx) = watch::channel(BLANK_GESTURE.to_string());
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

        Self {
            link: LinkState::new(settings.reconnect_interval),
            settings,
            connection: None,
            next_connection_id: 1,
            dispatcher,
            gesture_tx: Arc::new(gesture_tx),
            gesture_rx,
            state_tx,
            state_rx,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn dispatcher(&self) -> &Arc<LinkDispatcher> {
        &self.dispatcher
    }

    pub fn state(&self) -> &ConnectionState {
        &self.link.state
    }

    pub fn status_text(&self) -> String {
        self.link.state.to_string()
    }

    /// Latest label published by the reader. Survives disconnects.
    pub fn current_gesture(&self) -> String {
        self.gesture_rx.borrow().clone()
    }

    pub fn subscribe_gesture(&self) -> watch::Receiver<String> {
        self.gesture_rx.clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    pub fn is_reconnect_pending(&self) -> bool {
        self.link.reconnect.is_pending()
    }

    pub fn link(&self) -> &LinkState {
        &self.link
    }

    pub fn active_connection(&self) -> Option<&ActiveConnection> {
        self.connection.as_ref()
    }

    pub fn frame(&self) -> DisplayFrame {
        DisplayFrame {
            gesture: self.current_gesture(),
            status: self.status_text(),
        }
    }

    fn set_state(&mut self, state: ConnectionState) {
        self.link.state = state;
        self.publish_state();
    }

    fn publish_state(&self) {
        let current = &self.link.state;
        self.state_tx.send_if_modified(|prev| {
            if prev != current {
                *prev = current.clone();
                true
            } else {
                false
            }
        });
    }

    /// First connection attempt. A failure is not returned; it leaves the
    /// manager in the error state with a retry scheduled.
    pub async fn start(&mut self) {
        info!("Starting gesture client for {}", self.settings.address());
        self.link.now = Instant::now();
        let _ = self.connect().await;
    }

    /// Tear down any stale connection, then connect and spawn one reader.
    pub async fn connect(&mut self) -> Result<&ActiveConnection, ConnectError> {
        self.teardown().await;

        let now = self.link.now.max(Instant::now());
        self.link.now = now;
        self.link.reconnect.record_attempt(now);
        self.set_state(ConnectionState::Connecting);

        let addr = self.settings.address();
        info!("Connecting to {}...", addr);

        match connection::open(&addr, self.settings.connect_timeout).await {
            Ok(stream) => {
                let id = self.next_connection_id;
                self.next_connection_id += 1;

                let peer_addr = stream.peer_addr().ok();
                let reader = StreamReader::new(
                    id,
                    self.gesture_tx.clone(),
                    self.dispatcher.clone(),
                    self.settings.read_buffer_size,
                );
                let handle = reader.spawn(stream);

                self.link.connection_id = Some(id);
                self.link.reconnect.disarm();
                self.set_state(ConnectionState::Connected);
                info!(connection_id = id, "Connection established");

                let connection: &ActiveConnection = self
                    .connection
                    .insert(ActiveConnection::new(id, peer_addr, handle));
                Ok(connection)
            }
            Err(e) => {
                warn!(%addr, error = %e, "Error connecting");
                self.set_state(ConnectionState::Error(e.to_string()));
                self.link.reconnect.arm(now);
                Err(e)
            }
        }
    }

    /// Stop the reader, wait for it, and close its socket. Safe to call repeatedly.
    pub async fn teardown(&mut self) {
        self.link.connection_id = None;

        if let Some(connection) = self.connection.take() {
            let id = connection.id();
            debug!(connection_id = id, "Tearing down connection");
            if let Err(e) = connection.close().await {
                warn!(connection_id = id, error = %e, "Reader did not exit cleanly");
            }
        }

        if self.link.state.is_connected() || self.link.state == ConnectionState::Connecting {
            self.set_state(ConnectionState::Disconnected);
        }
    }

    /// Tear down and stop retrying. `start` brings the client back.
    pub async fn shutdown(&mut self) {
        info!("Shutting down gesture client");
        if self.link.state.awaits_retry() {
            debug!(status = %self.link.state, "Cancelling pending reconnect");
        }
        self.teardown().await;
        self.link.reconnect.disarm();
        self.set_state(ConnectionState::Disconnected);
    }

    /// Once per host frame: apply queued transitions, then retry if due.
    pub async fn tick(&mut self, now: Instant) {
        self.link.now = now;
        self.dispatcher.drain(&mut self.link);
        self.publish_state();

        if self.link.reconnect.is_due(now) {
            debug!("Reconnect interval elapsed");
            let _ = self.connect().await;
        }
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("address", &self.settings.address())
            .field("state", &self.link.state)
            .field("connection", &self.connection)
            .finish()
    }
}

// Make sure the reader stops when the manager goes away
impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(connection) = &self.connection {
            info!(
                connection_id = connection.id(),
                "Dropping ConnectionManager, signaling reader to stop."
            );
            connection.signal_stop();
        }
    }
}
