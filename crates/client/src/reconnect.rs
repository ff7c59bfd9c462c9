//! Reconnect policy: fixed delay between attempts, bounded attempt budget.
//!
//! The delay is deliberately not exponential — the transport talks to a
//! dev server on the local network, where a constant retry cadence keeps
//! reconnection predictable for whoever is watching the status indicator.

use std::time::Duration;

/// Controls how the client reconnects after a connection drop.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    /// Fixed delay between reconnect attempts.
    pub interval: Duration,
    /// Maximum number of consecutive failures before giving up.
    /// `0` means unlimited retries.
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(5000),
            max_attempts: 5,
        }
    }
}

impl ReconnectPolicy {
    /// Whether the given attempt count exhausts the budget.
    pub fn should_give_up(&self, attempt: u32) -> bool {
        self.max_attempts > 0 && attempt >= self.max_attempts
    }
}
