//! Builder pattern for constructing an [`EventClient`].

use std::sync::Arc;
use std::time::Duration;

use crate::client::EventClient;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::handler::EventHandler;

/// Fluent builder for [`EventClient`].
///
/// # Example
///
/// ```rust,no_run
/// # use tether_client::{ClientBuilder, NoopHandler};
/// let client = ClientBuilder::new()
///     .host("192.168.1.10")
///     .port(20024)
///     .reconnect_interval(std::time::Duration::from_secs(5))
///     .max_reconnect_attempts(5)
///     .build(NoopHandler)
///     .unwrap();
/// client.connect();
/// ```
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    // ── Endpoint ─────────────────────────────────────────────────────

    /// Set the dev-server hostname (default `localhost`).
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the dev-server port (default 20024).
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Use `wss://` instead of `ws://`.
    pub fn wss(mut self, wss: bool) -> Self {
        self.config.wss = wss;
        self
    }

    // ── Behavior ─────────────────────────────────────────────────────

    /// Override the fixed delay between reconnect attempts (default 5s).
    pub fn reconnect_interval(mut self, interval: Duration) -> Self {
        self.config.reconnect.interval = interval;
        self
    }

    /// Override the reconnect budget (default 5; `0` for unlimited).
    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.config.reconnect.max_attempts = attempts;
        self
    }

    /// Override the pending-queue cap (default 10 000; `0` disables it).
    pub fn max_pending_events(mut self, max: usize) -> Self {
        self.config.max_pending_events = max;
        self
    }

    /// Build the [`EventClient`] without dialing; call
    /// [`connect`](EventClient::connect) to start.
    pub fn build(self, handler: impl EventHandler) -> Result<EventClient, ClientError> {
        if self.config.host.is_empty() {
            return Err(ClientError::Config("host is required".into()));
        }
        Ok(EventClient::new(self.config, Arc::new(handler)))
    }

    /// Build and immediately start the connection task.
    pub fn connect(self, handler: impl EventHandler) -> Result<EventClient, ClientError> {
        let client = self.build(handler)?;
        client.connect();
        Ok(client)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
