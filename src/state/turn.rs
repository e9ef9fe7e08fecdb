//! Turn order snapshot pushed by the engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::identifiers::CharacterId;

/// Who acts next and how many actions remain.
///
/// Purely informational on the client: it never moves the locally selected
/// active character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnState {
    /// Turn mode, e.g. `"exploration"` or `"combat"`.
    pub mode: String,
    /// Acting order.
    pub turn_queue: Vec<CharacterId>,
    /// Index into `turn_queue` of the character whose turn it is.
    pub current_index: usize,
    /// Remaining actions per character this round.
    pub actions_remaining: BTreeMap<CharacterId, u32>,
    /// Combat round counter.
    pub round_number: u32,
    /// Character the engine considers active.
    pub active_character_id: Option<CharacterId>,
}

impl Default for TurnState {
    fn default() -> Self {
        Self {
            mode: "exploration".to_string(),
            turn_queue: Vec::new(),
            current_index: 0,
            actions_remaining: BTreeMap::new(),
            round_number: 0,
            active_character_id: None,
        }
    }
}

impl TurnState {
    /// Character whose turn it is according to the queue.
    #[must_use]
    pub fn current(&self) -> Option<&CharacterId> {
        self.turn_queue.get(self.current_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default() {
        let state: TurnState = serde_json::from_str("{}").expect("parse");
        assert_eq!(state, TurnState::default());
        assert!(state.current().is_none());
    }

    #[test]
    fn test_current_follows_index() {
        let state: TurnState =
            serde_json::from_str(r#"{"turn_queue":["a","b","c"],"current_index":2}"#)
                .expect("parse");
        assert_eq!(state.current().map(CharacterId::as_str), Some("c"));
    }
}
