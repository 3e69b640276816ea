use std::fmt;
use std::time::{Duration, Instant};

use tracing::debug;

/// Connection status as shown to the host.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// Connection was lost; a retry is scheduled
    Reconnecting,
    /// Last connect attempt failed; a retry is scheduled
    Error(String),
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// Both Error and Reconnecting lead back into Connecting.
    pub fn awaits_retry(&self) -> bool {
        matches!(self, ConnectionState::Reconnecting | ConnectionState::Error(_))
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Connecting => write!(f, "Connecting..."),
            ConnectionState::Connected => write!(f, "Connected"),
            ConnectionState::Reconnecting => write!(f, "Reconnecting..."),
            ConnectionState::Error(message) => write!(f, "Error: {}", message),
        }
    }
}

/// Throttles reconnect attempts to one per interval.
#[derive(Debug, Clone)]
pub struct ReconnectTimer {
    last_attempt: Option<Instant>,
    interval: Duration,
    pending: bool,
}

impl ReconnectTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            last_attempt: None,
            interval,
            pending: false,
        }
    }

    /// Request a reconnect no sooner than one interval after `now`.
    pub fn arm(&mut self, now: Instant) {
        self.pending = true;
        self.last_attempt = Some(now);
    }

    pub fn disarm(&mut self) {
        self.pending = false;
    }

    pub fn record_attempt(&mut self, now: Instant) {
        self.last_attempt = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_attempt(&self) -> Option<Instant> {
        self.last_attempt
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.pending
            && self
                .last_attempt
                .map_or(true, |last| now.saturating_duration_since(last) >= self.interval)
    }
}

/// Consumer-side link state. Dispatched actions mutate this and nothing else.
#[derive(Debug, Clone)]
pub struct LinkState {
    pub(crate) state: ConnectionState,
    pub(crate) reconnect: ReconnectTimer,
    pub(crate) connection_id: Option<u64>,
    // time of the tick currently being processed
    pub(crate) now: Instant,
}

impl LinkState {
    pub fn new(reconnect_interval: Duration) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            reconnect: ReconnectTimer::new(reconnect_interval),
            connection_id: None,
            now: Instant::now(),
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn reconnect(&self) -> &ReconnectTimer {
        &self.reconnect
    }

    pub fn connection_id(&self) -> Option<u64> {
        self.connection_id
    }

    /// Applied on the consumer tick after a reader lost its connection.
    /// Reports from a connection that is no longer live are dropped.
    pub fn mark_lost(&mut self, connection_id: u64) -> bool {
        if self.connection_id != Some(connection_id) {
            debug!(
                connection_id,
                live = ?self.connection_id,
                "Ignoring loss report from stale connection"
            );
            return false;
        }
        self.state = ConnectionState::Reconnecting;
        self.reconnect.arm(self.now);
        true
    }
}
