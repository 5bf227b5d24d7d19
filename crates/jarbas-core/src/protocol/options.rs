//! Tunables for tool protocol clients

use std::time::Duration;

/// Protocol version announced during the handshake
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Client name announced during the handshake
pub const CLIENT_NAME: &str = "jarbas";

/// Per-server client settings
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Timeout applied to every request after the handshake
    pub request_timeout: Duration,
    /// Timeout for the `initialize` exchange
    pub handshake_timeout: Duration,
    /// Maximum concurrent sessions per server
    pub pool_size: usize,
    pub protocol_version: String,
    pub client_name: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            handshake_timeout: Duration::from_secs(10),
            pool_size: 4,
            protocol_version: PROTOCOL_VERSION.to_string(),
            client_name: CLIENT_NAME.to_string(),
        }
    }
}

impl ClientOptions {
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Clamped to at least one session
    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool_size = size.max(1);
        self
    }
}
