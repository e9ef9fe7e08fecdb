//! Session transport layer.
//!
//! Owns the WebSocket to the game engine, frames outbound commands, decodes
//! inbound frames and applies them to the session store.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                          ┌──────────────────┐
//! │  SessionClient   │                          │   Game engine    │
//! │                  │        WebSocket         │                  │
//! │  SessionMachine  │◄────────────────────────►│  /api/game/{id}  │
//! │  → Connection    │   {base}/api/game/{id}/ws│       /ws        │
//! │  → SessionStore  │                          │                  │
//! └──────────────────┘                          └──────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `SessionMachine` accepts `Connect` and emits `Effect::Open`
//! 2. [`open_socket`] performs the handshake
//! 3. `Opened` moves the machine to `Open`, connectivity becomes true
//! 4. [`Connection`] event loop dispatches frames until the socket closes
//! 5. `Closed` (or `Disconnect`) drops connectivity
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | WebSocket connection and event loop |
//! | `machine` | Pure state machine and frame dispatch |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

/// Connection state machine and inbound dispatch.
pub mod machine;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{ClientSocket, Connection, SharedCell, open_socket};
pub use machine::{Effect, Epoch, Input, LinkState, SessionCell, SessionMachine, dispatch};
