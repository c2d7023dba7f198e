//! Client configuration.
//!
//! Fixed at construction and never mutated afterwards. Request/reply logging
//! is opted into here rather than through process-wide switches.

use std::time::Duration;

pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_MAX_RESPONSE_SIZE: usize = 32 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub(crate) port: Option<u16>,
    pub(crate) read_timeout: Duration,
    pub(crate) max_response_size: usize,
    pub(crate) log_requests: bool,
    pub(crate) log_replies: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            port: None,
            read_timeout: DEFAULT_READ_TIMEOUT,
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
            log_requests: false,
            log_replies: false,
        }
    }
}

impl ClientConfig {
    /// Port to use regardless of what the host specifier embeds.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Receive timeout applied before reading. Zero disables it.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Receive timeout given as seconds plus microseconds.
    pub fn read_timeout_parts(self, secs: u64, micros: u32) -> Self {
        self.read_timeout(Duration::from_secs(secs) + Duration::from_micros(u64::from(micros)))
    }

    pub fn max_response_size(mut self, limit: usize) -> Self {
        self.max_response_size = limit;
        self
    }

    /// Log each outgoing request's method, path and body at info level.
    pub fn log_requests(mut self, enable: bool) -> Self {
        self.log_requests = enable;
        self
    }

    /// Log each received status and body at info level.
    pub fn log_replies(mut self, enable: bool) -> Self {
        self.log_replies = enable;
        self
    }

    pub fn get_read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub fn get_max_response_size(&self) -> usize {
        self.max_response_size
    }
}
