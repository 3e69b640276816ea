use once_cell::sync::Lazy;
use std::{env, time::Duration};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 12345;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(2000);
// Fixed retry interval; the producer is a local process that recovers quickly.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024;

/// Holds all tunables. Defaults can be overridden from ENV or with the `with_*` builders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub connect_timeout: Duration,
    pub reconnect_interval: Duration,
    pub read_buffer_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

impl Settings {
    /// Read settings from the process environment, loading `.env` first if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Build settings from an arbitrary variable lookup, falling back to defaults
    /// for anything missing or unparsable.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();

        // helper to parse an unsigned integer
        let parse = |var: &str| lookup(var).and_then(|v| v.trim().parse::<u64>().ok());

        Settings {
            host: lookup("GESTURE_HOST")
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
                .unwrap_or(defaults.host),
            port: lookup("GESTURE_PORT")
                .and_then(|v| v.trim().parse::<u16>().ok())
                .unwrap_or(defaults.port),
            connect_timeout: parse("GESTURE_CONNECT_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.connect_timeout),
            reconnect_interval: parse("GESTURE_RECONNECT_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.reconnect_interval),
            read_buffer_size: parse("GESTURE_READ_BUFFER_SIZE")
                .map(|n| n as usize)
                .filter(|n| *n > 0)
                .unwrap_or(defaults.read_buffer_size),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(1);
        self
    }

    /// `host:port` as passed to the socket connect call.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Global settings instance, read once from the environment.
pub static SETTINGS: Lazy<Settings> = Lazy::new(Settings::from_env);
