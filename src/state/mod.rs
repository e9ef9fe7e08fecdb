//! Session state container and its models.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `character` | Party member model |
//! | `narrative` | Narrative log entries |
//! | `store` | [`SessionStore`] mutations and accessors |
//! | `turn` | Turn order snapshot |

// ============================================================================
// Submodules
// ============================================================================

/// Party member model.
pub mod character;

/// Narrative log entries.
pub mod narrative;

/// Session state container.
pub mod store;

/// Turn order snapshot.
pub mod turn;

// ============================================================================
// Re-exports
// ============================================================================

pub use character::{Character, Characteristics, DerivedStats, Skill};
pub use narrative::{NarrativeEntry, NarrativeKind};
pub use store::{INITIAL_ATMOSPHERE, INITIAL_PHASE, SessionStore};
pub use turn::TurnState;
