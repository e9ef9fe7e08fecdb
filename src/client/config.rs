//! Client configuration.
//!
//! The only environment-specific setting is the base address of the game
//! engine's WebSocket endpoint. Session endpoints are derived from it as
//! `{base}/api/game/{session_id}/ws`.

// ============================================================================
// Imports
// ============================================================================

use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::SessionId;

// ============================================================================
// Constants
// ============================================================================

/// Base address used when none is configured.
pub const DEFAULT_WS_BASE: &str = "ws://localhost:8000";

// ============================================================================
// ClientConfig
// ============================================================================

/// Validated client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// WebSocket base address (`ws` or `wss`).
    ws_base: Url,
}

impl ClientConfig {
    /// Parses and validates a base address.
    ///
    /// # Errors
    ///
    /// - [`Error::Url`] if the address does not parse
    /// - [`Error::Config`] if the scheme is not `ws`/`wss` or the address
    ///   carries a query or fragment
    pub fn new(ws_base: &str) -> Result<Self> {
        let ws_base = Url::parse(ws_base)?;

        if !matches!(ws_base.scheme(), "ws" | "wss") {
            return Err(Error::config(format!(
                "WebSocket base must use ws or wss, got {}",
                ws_base.scheme()
            )));
        }

        if ws_base.query().is_some() || ws_base.fragment().is_some() {
            return Err(Error::config(format!(
                "WebSocket base must not carry a query or fragment: {ws_base}"
            )));
        }

        Ok(Self { ws_base })
    }

    /// Configured base address.
    #[inline]
    #[must_use]
    pub fn ws_base(&self) -> &Url {
        &self.ws_base
    }

    /// Builds the endpoint for a session.
    ///
    /// The session ID is percent-encoded as a single path segment.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the session ID is empty.
    pub fn endpoint(&self, session_id: &SessionId) -> Result<Url> {
        if session_id.is_empty() {
            return Err(Error::config("session id must not be empty"));
        }

        let base = self.ws_base.as_str().trim_end_matches('/');
        let segment = urlencoding::encode(session_id.as_str());
        Ok(Url::parse(&format!("{base}/api/game/{segment}/ws"))?)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_format() {
        let config = ClientConfig::new(DEFAULT_WS_BASE).expect("valid base");
        let url = config.endpoint(&SessionId::new("a1b2c3")).expect("endpoint");
        assert_eq!(url.as_str(), "ws://localhost:8000/api/game/a1b2c3/ws");
    }

    #[test]
    fn test_endpoint_with_base_path() {
        let config = ClientConfig::new("wss://play.example.com/trpg/").expect("valid base");
        let url = config.endpoint(&SessionId::new("s1")).expect("endpoint");
        assert_eq!(url.as_str(), "wss://play.example.com/trpg/api/game/s1/ws");
    }

    #[test]
    fn test_endpoint_encodes_session_id() {
        let config = ClientConfig::new(DEFAULT_WS_BASE).expect("valid base");
        let url = config.endpoint(&SessionId::new("a/b c")).expect("endpoint");
        assert_eq!(url.path(), "/api/game/a%2Fb%20c/ws");
    }

    #[test]
    fn test_empty_session_rejected() {
        let config = ClientConfig::new(DEFAULT_WS_BASE).expect("valid base");
        let err = config.endpoint(&SessionId::default()).expect_err("empty id");
        assert!(err.is_config_error());
    }

    #[test]
    fn test_http_scheme_rejected() {
        let err = ClientConfig::new("http://localhost:8000").expect_err("http base");
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_query_rejected() {
        let err = ClientConfig::new("ws://localhost:8000/?token=x").expect_err("query");
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_unparseable_base() {
        let err = ClientConfig::new("localhost:8000 nope").expect_err("garbage");
        assert!(err.is_config_error());
    }
}
