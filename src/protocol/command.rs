//! Outbound command definitions.
//!
//! Commands are serialized as JSON objects tagged by `type`:
//!
//! | `type` | Fields |
//! |--------|--------|
//! | `player_action` | `character_id`, `content` |
//! | `save_game` | `slot` |
//! | `ping` | |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Save slot used when the caller does not name one.
pub const MANUAL_SLOT: &str = "manual";

/// Save slot reserved for saves triggered on shutdown.
pub const AUTO_SLOT: &str = "auto";

// ============================================================================
// ClientCommand
// ============================================================================

/// A command from the client to the game engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Free-form player action on behalf of a character.
    PlayerAction {
        /// Acting character, empty when no character is active.
        character_id: String,
        /// What the player wants to do.
        content: String,
    },

    /// Persist the session to a save slot.
    SaveGame {
        /// Slot label.
        slot: String,
    },

    /// Keepalive; answered with `pong`.
    Ping,
}

impl ClientCommand {
    /// Creates a player action command.
    #[inline]
    #[must_use]
    pub fn player_action(character_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::PlayerAction {
            character_id: character_id.into(),
            content: content.into(),
        }
    }

    /// Creates a save command, defaulting to the manual slot.
    #[inline]
    #[must_use]
    pub fn save_game(slot: Option<&str>) -> Self {
        Self::SaveGame {
            slot: slot.unwrap_or(MANUAL_SLOT).to_string(),
        }
    }

    /// Creates the save command sent on shutdown.
    #[inline]
    #[must_use]
    pub fn auto_save() -> Self {
        Self::save_game(Some(AUTO_SLOT))
    }

    /// Returns the wire discriminator.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::PlayerAction { .. } => "player_action",
            Self::SaveGame { .. } => "save_game",
            Self::Ping => "ping",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::{Value, json};

    fn to_value(command: &ClientCommand) -> Value {
        serde_json::to_value(command).expect("serialize")
    }

    #[test]
    fn test_player_action_format() {
        let command = ClientCommand::player_action("inv-01", "I open the door");
        assert_eq!(
            to_value(&command),
            json!({
                "type": "player_action",
                "character_id": "inv-01",
                "content": "I open the door"
            })
        );
    }

    #[test]
    fn test_save_game_default_slot() {
        let command = ClientCommand::save_game(None);
        assert_eq!(to_value(&command), json!({ "type": "save_game", "slot": "manual" }));
    }

    #[test]
    fn test_auto_save_slot() {
        let command = ClientCommand::auto_save();
        assert_eq!(to_value(&command), json!({ "type": "save_game", "slot": "auto" }));
    }

    #[test]
    fn test_ping_format() {
        assert_eq!(to_value(&ClientCommand::Ping), json!({ "type": "ping" }));
    }

    #[test]
    fn test_kind_matches_tag() {
        for command in [
            ClientCommand::player_action("", "x"),
            ClientCommand::save_game(Some("slot-2")),
            ClientCommand::Ping,
        ] {
            assert_eq!(to_value(&command)["type"], command.kind());
        }
    }
}
