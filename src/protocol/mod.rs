//! Wire protocol message types.
//!
//! All frames are JSON text over a single WebSocket per session.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | [`ServerEvent`] | Engine → Client | Narrative, dice, clues, world state |
//! | [`ClientCommand`] | Client → Engine | Player actions, saves, keepalive |
//!
//! Every message is an object with a `type` discriminator. Inbound decoding
//! is permissive: unrecognized types decode to [`ServerEvent::Unknown`] so the
//! client keeps working when the engine adds new frames.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Outbound commands |
//! | `event` | Inbound frames and their typed variants |

// ============================================================================
// Submodules
// ============================================================================

/// Outbound command definitions.
pub mod command;

/// Inbound frame types.
pub mod event;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{AUTO_SLOT, ClientCommand, MANUAL_SLOT};
pub use event::{Frame, ServerEvent};
