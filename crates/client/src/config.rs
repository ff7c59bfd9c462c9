//! Transport configuration and dev-server host resolution.

use std::sync::OnceLock;

use regex::Regex;
use tether_protocol::DEFAULT_PORT;

use crate::reconnect::ReconnectPolicy;

/// Configuration for one [`EventClient`](crate::EventClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Dev-server hostname (default `localhost`).
    pub host: String,
    /// Dev-server port (default 20024).
    pub port: u16,
    /// Use `wss://` instead of `ws://`.
    pub wss: bool,
    /// Fixed-interval reconnect policy.
    pub reconnect: ReconnectPolicy,
    /// Pending-queue capacity; `0` disables the cap.
    pub max_pending_events: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: DEFAULT_PORT,
            wss: false,
            reconnect: ReconnectPolicy::default(),
            max_pending_events: 10_000,
        }
    }
}

impl ClientConfig {
    /// The full connection URL.
    pub fn url(&self) -> String {
        let scheme = if self.wss { "wss" } else { "ws" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }
}

/// Extract the host from a bundler/script URL.
///
/// Accepts an optional `http(s)://` scheme, a bracketed IPv6 literal or a
/// plain hostname, and strips any port, path, query, or fragment.  Returns
/// `None` when no host can be found.  Callers typically feed in the URL the
/// app was served from so the transport dials the same machine.
pub fn host_from_url(url: &str) -> Option<String> {
    static HOST_RE: OnceLock<Regex> = OnceLock::new();
    let re = HOST_RE.get_or_init(|| {
        Regex::new(r"^(?:https?://)?(\[[^\]]+\]|[^/:\s]+)(?::\d+)?(?:[/?#]|$)")
            .expect("host regex is valid")
    });
    re.captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_dials_localhost() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.url(), "ws://localhost:20024");
    }

    #[test]
    fn wss_changes_scheme() {
        let cfg = ClientConfig {
            wss: true,
            host: "dev.example.com".into(),
            port: 443,
            ..Default::default()
        };
        assert_eq!(cfg.url(), "wss://dev.example.com:443");
    }

    #[test]
    fn host_from_full_url() {
        assert_eq!(
            host_from_url("http://192.168.1.10:8081/index.bundle?platform=ios"),
            Some("192.168.1.10".into())
        );
    }

    #[test]
    fn host_without_scheme_or_port() {
        assert_eq!(host_from_url("devbox/index.bundle"), Some("devbox".into()));
        assert_eq!(host_from_url("localhost"), Some("localhost".into()));
    }

    #[test]
    fn host_ipv6_bracketed() {
        assert_eq!(
            host_from_url("http://[::1]:8081/index.bundle"),
            Some("[::1]".into())
        );
    }

    #[test]
    fn host_missing() {
        assert_eq!(host_from_url(""), None);
        assert_eq!(host_from_url("://"), None);
    }
}
