//! Runtime configuration for the server and viewer binaries.
//!
//! Defaults are suitable for local use and every field can be overridden
//! through `TERMFEED_*` environment variables:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `TERMFEED_INGEST_ADDR` | `127.0.0.1:1337` | TCP ingest listen address |
//! | `TERMFEED_WS_ADDR` | `127.0.0.1:8080` | WebSocket fan-out listen address |
//! | `TERMFEED_PUBLIC_HOST` | `127.0.0.1:8080` | Host shown to producers in the greeting |
//! | `TERMFEED_MAX_PEERS_PER_FEED` | `3` | Concurrent viewers per feed |
//! | `TERMFEED_MAX_CLIENTS_PER_IP` | `5` | Concurrent producers per IP |
//! | `TERMFEED_HOST` | `127.0.0.1:8080` | Host the viewer connects to |
//! | `TERMFEED_SECURE` | `false` | Use `wss://` instead of `ws://` |
//!
//! The resolved configuration is logged at startup as JSON via the
//! [`std::fmt::Display`] impl.

// ============================================================================
// Imports
// ============================================================================

use std::env;
use std::fmt;

use serde::Serialize;
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::WEBSOCKET_PATH;

// ============================================================================
// Defaults
// ============================================================================

const DEFAULT_INGEST_ADDR: &str = "127.0.0.1:1337";
const DEFAULT_WS_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_MAX_PEERS_PER_FEED: usize = 3;
const DEFAULT_MAX_CLIENTS_PER_IP: usize = 5;

// ============================================================================
// ServerConfig
// ============================================================================

/// Feed-server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerConfig {
    /// Listen address for the TCP ingest server.
    pub ingest_addr: String,

    /// Listen address for the WebSocket fan-out server.
    pub ws_addr: String,

    /// Externally reachable host, used in producer greetings.
    pub public_host: String,

    /// Maximum concurrent viewers per feed.
    pub max_peers_per_feed: usize,

    /// Maximum concurrent producers per source IP.
    pub max_clients_per_ip: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ingest_addr: DEFAULT_INGEST_ADDR.to_string(),
            ws_addr: DEFAULT_WS_ADDR.to_string(),
            public_host: DEFAULT_WS_ADDR.to_string(),
            max_peers_per_feed: DEFAULT_MAX_PEERS_PER_FEED,
            max_clients_per_ip: DEFAULT_MAX_CLIENTS_PER_IP,
        }
    }
}

impl ServerConfig {
    /// Sets the TCP ingest listen address.
    #[inline]
    #[must_use]
    pub fn with_ingest_addr(mut self, addr: impl Into<String>) -> Self {
        self.ingest_addr = addr.into();
        self
    }

    /// Sets the WebSocket fan-out listen address.
    #[inline]
    #[must_use]
    pub fn with_ws_addr(mut self, addr: impl Into<String>) -> Self {
        self.ws_addr = addr.into();
        self
    }

    /// Sets the externally reachable host.
    #[inline]
    #[must_use]
    pub fn with_public_host(mut self, host: impl Into<String>) -> Self {
        self.public_host = host.into();
        self
    }

    /// Sets the concurrent-viewer cap per feed.
    #[inline]
    #[must_use]
    pub fn with_max_peers_per_feed(mut self, max: usize) -> Self {
        self.max_peers_per_feed = max;
        self
    }

    /// Sets the concurrent-producer cap per IP.
    #[inline]
    #[must_use]
    pub fn with_max_clients_per_ip(mut self, max: usize) -> Self {
        self.max_clients_per_ip = max;
        self
    }
}

// ============================================================================
// ViewerConfig
// ============================================================================

/// Viewer-side connection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewerConfig {
    /// Host (and optional port) of the feed server.
    pub host: String,

    /// Use the TLS scheme (`wss://`) instead of plain `ws://`.
    pub secure: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_WS_ADDR.to_string(),
            secure: false,
        }
    }
}

impl ViewerConfig {
    /// Sets the server host.
    #[inline]
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Selects the TLS scheme.
    #[inline]
    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Builds the WebSocket endpoint URL for this host.
    ///
    /// The path is fixed: the endpoint always lives at
    /// [`WEBSOCKET_PATH`] on the configured host.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UrlParse`] if the host does not form a valid URL.
    pub fn endpoint(&self) -> Result<Url> {
        let scheme = if self.secure { "wss" } else { "ws" };
        let url = Url::parse(&format!("{scheme}://{}{WEBSOCKET_PATH}", self.host))?;
        Ok(url)
    }
}

// ============================================================================
// Config
// ============================================================================

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Config {
    /// Server-side settings.
    pub server: ServerConfig,

    /// Viewer-side settings.
    pub viewer: ViewerConfig,
}

impl Config {
    /// Returns the default configuration merged with environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if an override variable is set but cannot
    /// be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Like [`Config::from_env`] but with an injected variable lookup,
    /// so resolution is testable without touching process state.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut cfg = Self::default();
        if let Some(v) = lookup("TERMFEED_INGEST_ADDR") {
            cfg.server.ingest_addr = v;
        }
        if let Some(v) = lookup("TERMFEED_WS_ADDR") {
            cfg.server.ws_addr = v;
        }
        if let Some(v) = lookup("TERMFEED_PUBLIC_HOST") {
            cfg.server.public_host = v;
        }
        if let Some(v) = lookup("TERMFEED_MAX_PEERS_PER_FEED") {
            cfg.server.max_peers_per_feed = parse_count("TERMFEED_MAX_PEERS_PER_FEED", &v)?;
        }
        if let Some(v) = lookup("TERMFEED_MAX_CLIENTS_PER_IP") {
            cfg.server.max_clients_per_ip = parse_count("TERMFEED_MAX_CLIENTS_PER_IP", &v)?;
        }
        if let Some(v) = lookup("TERMFEED_HOST") {
            cfg.viewer.host = v;
        }
        if let Some(v) = lookup("TERMFEED_SECURE") {
            cfg.viewer.secure = parse_bool("TERMFEED_SECURE", &v)?;
        }
        Ok(cfg)
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let raw = serde_json::to_string_pretty(self).map_err(|_| fmt::Error)?;
        f.write_str(&raw)
    }
}

// ============================================================================
// Parsing Helpers
// ============================================================================

fn parse_count(name: &str, value: &str) -> Result<usize> {
    let count: usize = value
        .parse()
        .map_err(|_| Error::config(format!("{name} invalid: {value}")))?;
    if count == 0 {
        return Err(Error::config(format!("{name} must be at least 1")));
    }
    Ok(count)
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(Error::config(format!("{name} invalid: {other}"))),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.server.ingest_addr, "127.0.0.1:1337");
        assert_eq!(cfg.server.ws_addr, "127.0.0.1:8080");
        assert_eq!(cfg.server.max_peers_per_feed, 3);
        assert_eq!(cfg.server.max_clients_per_ip, 5);
        assert!(!cfg.viewer.secure);
    }

    #[test]
    fn test_lookup_overrides() {
        let cfg = Config::from_lookup(|name| match name {
            "TERMFEED_WS_ADDR" => Some("0.0.0.0:9000".to_string()),
            "TERMFEED_MAX_PEERS_PER_FEED" => Some("8".to_string()),
            "TERMFEED_SECURE" => Some("true".to_string()),
            _ => None,
        })
        .expect("valid overrides");

        assert_eq!(cfg.server.ws_addr, "0.0.0.0:9000");
        assert_eq!(cfg.server.max_peers_per_feed, 8);
        assert!(cfg.viewer.secure);
        // Untouched fields keep their defaults.
        assert_eq!(cfg.server.ingest_addr, "127.0.0.1:1337");
    }

    #[test]
    fn test_invalid_count_rejected() {
        let result = Config::from_lookup(|name| {
            (name == "TERMFEED_MAX_PEERS_PER_FEED").then(|| "many".to_string())
        });
        assert!(result.is_err());

        let result = Config::from_lookup(|name| {
            (name == "TERMFEED_MAX_PEERS_PER_FEED").then(|| "0".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_bool_rejected() {
        let result =
            Config::from_lookup(|name| (name == "TERMFEED_SECURE").then(|| "maybe".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_endpoint_url() {
        let viewer = ViewerConfig::default().with_host("example.com:8080");
        let url = viewer.endpoint().expect("valid endpoint");
        assert_eq!(url.as_str(), "ws://example.com:8080/websocket");

        let secure = viewer.with_secure(true);
        let url = secure.endpoint().expect("valid endpoint");
        assert_eq!(url.as_str(), "wss://example.com:8080/websocket");
    }

    #[test]
    fn test_display_is_json() {
        let cfg = Config::default();
        let dump = cfg.to_string();
        let parsed: serde_json::Value = serde_json::from_str(&dump).expect("valid JSON");
        assert_eq!(parsed["server"]["max_peers_per_feed"], 3);
    }

    #[test]
    fn test_builder_methods() {
        let server = ServerConfig::default()
            .with_ingest_addr("0.0.0.0:2000")
            .with_max_peers_per_feed(1);
        assert_eq!(server.ingest_addr, "0.0.0.0:2000");
        assert_eq!(server.max_peers_per_feed, 1);
    }
}
