//! Session client, builder and configuration.
//!
//! Use [`SessionClient::builder()`] to create a configured client.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `builder` | Fluent configuration |
//! | `config` | Validated base address and endpoint derivation |
//! | `core` | [`SessionClient`] handle |

// ============================================================================
// Submodules
// ============================================================================

/// Builder pattern for client configuration.
pub mod builder;

/// Client configuration.
pub mod config;

/// Session client handle.
pub mod core;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::SessionClientBuilder;
pub use config::{ClientConfig, DEFAULT_WS_BASE};
pub use core::SessionClient;
