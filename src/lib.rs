//! TRPG Session - real-time client for a turn-based tabletop RPG engine.
//!
//! A single WebSocket per game session delivers narrative, dice results and
//! world-state updates from the remote game engine; the client pushes player
//! actions and save requests back over the same channel.
//!
//! # Architecture
//!
//! The crate splits into a transport and a passive state store:
//!
//! - **Transport**: owns the socket, frames outbound commands, decodes
//!   inbound frames and applies them to the store in arrival order
//! - **Store**: authoritative client-side view of the session (party,
//!   narrative log, clues, phase, atmosphere, connectivity)
//!
//! Key design principles:
//!
//! - The state machine is pure; a small async adapter performs its effects
//! - Inbound decoding is total: unknown frames are ignored, never errors
//! - Commands issued while the channel is not open are dropped, not queued
//! - The shutdown auto-save hook is registered and unregistered explicitly
//!
//! # Quick Start
//!
//! ```no_run
//! use trpg_session::{Result, SessionClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut client = SessionClient::builder()
//!         .ws_base("ws://localhost:8000")
//!         .build()?;
//!
//!     client.connect("a1b2c3").await?;
//!     client.send_action("I light the lantern and step inside");
//!
//!     for entry in client.store().narrative_log() {
//!         println!("[{}] {}", entry.kind(), entry.content());
//!     }
//!
//!     client.disconnect();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`SessionClient`], builder and configuration |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`lifecycle`] | Host shutdown hooks |
//! | [`protocol`] | Wire message types |
//! | [`state`] | [`SessionStore`] and its models |
//! | [`transport`] | State machine and WebSocket event loop |

// ============================================================================
// Modules
// ============================================================================

/// Session client, builder and configuration.
pub mod client;

/// Error types and result aliases.
///
/// Only setup paths are fallible; see [`Error`].
pub mod error;

/// Type-safe identifiers for session entities.
pub mod identifiers;

/// Host shutdown notifications.
pub mod lifecycle;

/// Wire protocol message types.
pub mod protocol;

/// Session state container and its models.
pub mod state;

/// Session transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{ClientConfig, SessionClient, SessionClientBuilder};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{CharacterId, HookId, SessionId};

// Lifecycle types
pub use lifecycle::{ShutdownHook, ShutdownNotifier};

// Protocol types
pub use protocol::{ClientCommand, ServerEvent};

// State types
pub use state::{Character, NarrativeEntry, NarrativeKind, SessionStore, TurnState};

// Transport types
pub use transport::LinkState;
