//! Builder pattern for client configuration.
//!
//! # Example
//!
//! ```no_run
//! use trpg_session::SessionClient;
//!
//! # fn example() -> trpg_session::Result<()> {
//! let client = SessionClient::builder()
//!     .ws_base("wss://play.example.com")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use crate::error::Result;
use crate::lifecycle::ShutdownNotifier;

use super::config::{ClientConfig, DEFAULT_WS_BASE};
use super::core::SessionClient;

// ============================================================================
// SessionClientBuilder
// ============================================================================

/// Builder for a [`SessionClient`].
///
/// Use [`SessionClient::builder()`] to create a new builder.
#[derive(Debug, Default, Clone)]
pub struct SessionClientBuilder {
    /// WebSocket base address.
    ws_base: Option<String>,
    /// Host shutdown notifier.
    notifier: Option<ShutdownNotifier>,
}

impl SessionClientBuilder {
    /// Creates a builder with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the WebSocket base address, e.g. `"ws://localhost:8000"`.
    #[inline]
    #[must_use]
    pub fn ws_base(mut self, ws_base: impl Into<String>) -> Self {
        self.ws_base = Some(ws_base.into());
        self
    }

    /// Sets the notifier whose `fire` triggers the shutdown auto-save.
    ///
    /// Without one the client gets a private notifier, reachable through
    /// [`SessionClient::shutdown_notifier`].
    #[inline]
    #[must_use]
    pub fn shutdown_notifier(mut self, notifier: ShutdownNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Builds the client with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Url`](crate::Error::Url) if the base address does not parse
    /// - [`Error::Config`](crate::Error::Config) if the base address is not a
    ///   plain `ws`/`wss` address
    pub fn build(self) -> Result<SessionClient> {
        let config = ClientConfig::new(self.ws_base.as_deref().unwrap_or(DEFAULT_WS_BASE))?;
        let notifier = self.notifier.unwrap_or_default();
        Ok(SessionClient::new(config, notifier))
    }
}

// ============================================================================
// Tests
// ============================================================================
