//! Inbound frame types.
//!
//! Frames are JSON objects pushed by the game engine. Every frame carries a
//! `type` discriminator; the remaining fields depend on the type.
//!
//! # Frame Types
//!
//! | `type` | Fields |
//! |--------|--------|
//! | `narrative` | `content` |
//! | `dice_result` | `description`?, `roll`, `target` |
//! | `npc_action` | `npc_id`, `content` |
//! | `clue_discovered` | `clue_id`, `description`? |
//! | `state_update` | `phase`?, `atmosphere`?, `turn_state`? |
//! | `system` | `content` |
//! | `error` | `content` |
//! | `turn_update` | `turn_state` |
//! | `pong` | |
//!
//! Decoding is total: anything else, including text that is not JSON at all,
//! becomes [`ServerEvent::Unknown`].

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::{Map, Number, Value, from_str, from_value};
use tracing::trace;

use crate::state::TurnState;

/// Largest magnitude below which every integer is exactly representable as `f64`.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

// ============================================================================
// Frame
// ============================================================================

/// A raw inbound frame before classification.
///
/// # Format
///
/// ```json
/// {
///   "type": "dice_result",
///   "description": "Spot Hidden: success",
///   "roll": 23,
///   "target": 60
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Frame {
    /// Frame discriminator.
    #[serde(rename = "type")]
    pub frame_type: String,

    /// Type-specific fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Frame {
    /// Classifies the frame into a typed variant.
    #[must_use]
    pub fn parse(&self) -> ServerEvent {
        match self.frame_type.as_str() {
            "narrative" => ServerEvent::Narrative {
                content: self.get_string("content"),
            },

            "dice_result" => ServerEvent::DiceResult {
                description: self.get_non_empty_string("description"),
                roll: self.get_number("roll"),
                target: self.get_number("target"),
            },

            "npc_action" => ServerEvent::NpcAction {
                npc_id: self.get_string("npc_id"),
                content: self.get_string("content"),
            },

            "clue_discovered" => ServerEvent::ClueDiscovered {
                clue_id: self.get_string("clue_id"),
                description: self.get_non_empty_string("description"),
            },

            "state_update" => ServerEvent::StateUpdate {
                phase: self.get_non_empty_string("phase"),
                atmosphere: self.get_non_empty_string("atmosphere"),
                turn_state: self.get_turn_state(),
            },

            "system" => ServerEvent::System {
                content: self.get_string("content"),
            },

            "error" => ServerEvent::Error {
                content: self.get_string("content"),
            },

            "turn_update" => match self.get_turn_state() {
                Some(turn_state) => ServerEvent::TurnUpdate { turn_state },
                None => self.unknown(),
            },

            "pong" => ServerEvent::Pong,

            _ => self.unknown(),
        }
    }

    fn unknown(&self) -> ServerEvent {
        ServerEvent::Unknown {
            frame_type: Some(self.frame_type.clone()),
        }
    }

    // ========================================================================
    // Field Helpers
    // ========================================================================

    /// Gets a string field, empty if missing or not a string.
    #[inline]
    fn get_string(&self, key: &str) -> String {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// Gets a string field, treating an empty string as absent.
    #[inline]
    fn get_non_empty_string(&self, key: &str) -> Option<String> {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Gets a numeric field as sent, zero if missing or not a number.
    ///
    /// Integral floats collapse to integers so `42.0` renders as `42`.
    fn get_number(&self, key: &str) -> Number {
        let Some(Value::Number(number)) = self.fields.get(key) else {
            return Number::from(0);
        };

        match number.as_f64() {
            Some(f) if number.is_f64() && f.fract() == 0.0 && f.abs() <= MAX_EXACT_FLOAT => {
                Number::from(f as i64)
            }
            _ => number.clone(),
        }
    }

    /// Decodes the `turn_state` object, if present and well-formed.
    fn get_turn_state(&self) -> Option<TurnState> {
        let value = self.fields.get("turn_state")?;
        if value.is_null() {
            return None;
        }

        match from_value::<TurnState>(value.clone()) {
            Ok(turn_state) => Some(turn_state),
            Err(e) => {
                trace!(error = %e, "Discarding malformed turn_state");
                None
            }
        }
    }
}

// ============================================================================
// ServerEvent
// ============================================================================

/// Typed inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// Narrative text from the keeper.
    Narrative {
        /// Narrative text.
        content: String,
    },

    /// Outcome of a dice roll.
    DiceResult {
        /// Human-readable outcome, if the engine supplied one.
        description: Option<String>,
        /// Rolled value, as sent.
        roll: Number,
        /// Target value, as sent.
        target: Number,
    },

    /// Something an NPC did or said.
    NpcAction {
        /// Acting NPC.
        npc_id: String,
        /// What happened.
        content: String,
    },

    /// A clue was uncovered.
    ClueDiscovered {
        /// Scenario clue identifier.
        clue_id: String,
        /// Clue text, if the engine supplied one.
        description: Option<String>,
    },

    /// Partial world-state update. Absent fields are left unchanged.
    StateUpdate {
        /// New phase.
        phase: Option<String>,
        /// New atmosphere.
        atmosphere: Option<String>,
        /// New turn snapshot.
        turn_state: Option<TurnState>,
    },

    /// System notice.
    System {
        /// Notice text.
        content: String,
    },

    /// Engine-side error report.
    Error {
        /// Error text.
        content: String,
    },

    /// Turn order snapshot.
    TurnUpdate {
        /// Current turn state.
        turn_state: TurnState,
    },

    /// Keepalive reply.
    Pong,

    /// Unrecognized or malformed frame.
    Unknown {
        /// Discriminator, if the frame had a readable one.
        frame_type: Option<String>,
    },
}

impl ServerEvent {
    /// Decodes raw frame text. Never fails.
    #[must_use]
    pub fn decode(text: &str) -> Self {
        match from_str::<Frame>(text) {
            Ok(frame) => frame.parse(),
            Err(e) => {
                trace!(error = %e, "Frame is not a typed JSON object");
                Self::Unknown { frame_type: None }
            }
        }
    }

    /// Returns `true` for [`ServerEvent::Unknown`].
    #[inline]
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
