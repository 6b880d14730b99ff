//! Console connection configuration.

use std::time::Duration;

use crate::platform::redboot;

/// Console connection configuration.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// Console port (default: 9000).
    pub port: u16,

    /// Overall session timeout, covering connect and every step.
    pub timeout: Duration,

    /// How many bytes of recent output are searched for prompts.
    pub search_depth: usize,
}

impl ConsoleConfig {
    /// Create a configuration for `host` with the RedBoot defaults.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: redboot::CONSOLE_PORT,
            timeout: redboot::SESSION_TIMEOUT,
            search_depth: 1000,
        }
    }

    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The instant a session starting now must be finished by.
    ///
    /// Taken once before connecting, so the connect attempt and every step
    /// share the same `timeout`.
    pub fn deadline_from_now(&self) -> tokio::time::Instant {
        tokio::time::Instant::now() + self.timeout
    }
}
