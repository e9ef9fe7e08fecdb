//! Client-side session state.
//!
//! [`SessionStore`] is a plain container with named mutations and read
//! accessors. It performs no I/O and knows nothing about the wire format;
//! the transport translates inbound frames into calls on this API.
//!
//! # Invariants
//!
//! - The party never holds two characters with the same id.
//! - Upserting an existing id replaces the entry in place.
//! - The active reference is set once from the first character added and
//!   afterwards only by [`SessionStore::select_character`].
//! - The narrative log is append-only and the clue list has no duplicates.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use tracing::trace;

use crate::identifiers::{CharacterId, SessionId};

use super::character::Character;
use super::narrative::{NarrativeEntry, NarrativeKind};
use super::turn::TurnState;

// ============================================================================
// Constants
// ============================================================================

/// Phase before the engine reports one.
pub const INITIAL_PHASE: &str = "lobby";

/// Atmosphere before the engine reports one.
pub const INITIAL_ATMOSPHERE: &str = "calm";

// ============================================================================
// SessionStore
// ============================================================================

/// Authoritative client-side view of one game session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStore {
    session_id: SessionId,
    scenario_title: String,
    phase: String,
    atmosphere: String,
    connected: bool,
    party: Vec<Character>,
    active_character_id: Option<CharacterId>,
    narrative_log: Vec<NarrativeEntry>,
    clues: Vec<String>,
    turn_state: Option<TurnState>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self {
            session_id: SessionId::default(),
            scenario_title: String::new(),
            phase: INITIAL_PHASE.to_string(),
            atmosphere: INITIAL_ATMOSPHERE.to_string(),
            connected: false,
            party: Vec::new(),
            active_character_id: None,
            narrative_log: Vec::new(),
            clues: Vec::new(),
            turn_state: None,
        }
    }
}

// ============================================================================
// SessionStore - Mutations
// ============================================================================

impl SessionStore {
    /// Creates an empty store.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the session identity and scenario title.
    pub fn set_session(&mut self, session_id: impl Into<SessionId>, title: impl Into<String>) {
        self.session_id = session_id.into();
        self.scenario_title = title.into();
    }

    /// Replaces the whole party.
    ///
    /// Entries are applied as successive upserts, so a repeated id keeps the
    /// position of its first occurrence. The active reference is initialised
    /// to the first member only if it was never set.
    pub fn set_party(&mut self, party: impl IntoIterator<Item = Character>) {
        self.party.clear();
        for character in party {
            self.upsert_character(character);
        }
    }

    /// Replaces the character with the same id in place, or appends it.
    pub fn upsert_character(&mut self, character: Character) {
        if self.active_character_id.is_none() {
            self.active_character_id = Some(character.id.clone());
        }

        match self.party.iter_mut().find(|c| c.id == character.id) {
            Some(existing) => *existing = character,
            None => self.party.push(character),
        }
    }

    /// Selects the active character explicitly.
    pub fn select_character(&mut self, id: impl Into<CharacterId>) {
        self.active_character_id = Some(id.into());
    }

    /// Appends a narrative entry stamped with the current time.
    pub fn push_narrative(&mut self, kind: NarrativeKind, content: impl Into<String>) {
        let entry = NarrativeEntry::now(kind, content);
        trace!(kind = %entry.kind(), "Narrative entry appended");
        self.narrative_log.push(entry);
    }

    /// Adds a clue unless an identical one is already known.
    ///
    /// Returns `true` if the clue was new.
    pub fn add_clue(&mut self, clue: impl Into<String>) -> bool {
        let clue = clue.into();
        if self.clues.contains(&clue) {
            return false;
        }
        self.clues.push(clue);
        true
    }

    /// Sets the current atmosphere.
    pub fn set_atmosphere(&mut self, atmosphere: impl Into<String>) {
        self.atmosphere = atmosphere.into();
    }

    /// Sets the current phase.
    pub fn set_phase(&mut self, phase: impl Into<String>) {
        self.phase = phase.into();
    }

    /// Sets the connectivity flag.
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Replaces the turn snapshot.
    pub fn set_turn_state(&mut self, turn_state: TurnState) {
        self.turn_state = Some(turn_state);
    }
}

// ============================================================================
// SessionStore - Accessors
// ============================================================================

impl SessionStore {
    /// Session identifier.
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Scenario title.
    #[inline]
    #[must_use]
    pub fn scenario_title(&self) -> &str {
        &self.scenario_title
    }

    /// Current phase tag.
    #[inline]
    #[must_use]
    pub fn phase(&self) -> &str {
        &self.phase
    }

    /// Current atmosphere tag.
    #[inline]
    #[must_use]
    pub fn atmosphere(&self) -> &str {
        &self.atmosphere
    }

    /// Whether the channel is currently open.
    #[inline]
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    /// Party members in order.
    #[inline]
    #[must_use]
    pub fn party(&self) -> &[Character] {
        &self.party
    }

    /// Raw active reference, which may name a character not in the party.
    #[inline]
    #[must_use]
    pub fn active_character_id(&self) -> Option<&CharacterId> {
        self.active_character_id.as_ref()
    }

    /// Resolves the active character.
    ///
    /// The referenced character if present in the party, else the first
    /// member, else `None`. Computed on every call.
    #[must_use]
    pub fn active_character(&self) -> Option<&Character> {
        self.active_character_id
            .as_ref()
            .and_then(|id| self.character(id))
            .or_else(|| self.party.first())
    }

    /// Looks up a party member by id.
    #[must_use]
    pub fn character(&self, id: &CharacterId) -> Option<&Character> {
        self.party.iter().find(|c| &c.id == id)
    }

    /// Narrative log, oldest first.
    #[inline]
    #[must_use]
    pub fn narrative_log(&self) -> &[NarrativeEntry] {
        &self.narrative_log
    }

    /// Discovered clues in discovery order.
    #[inline]
    #[must_use]
    pub fn clues(&self) -> &[String] {
        &self.clues
    }

    /// Latest turn snapshot, if the engine sent one.
    #[inline]
    #[must_use]
    pub fn turn_state(&self) -> Option<&TurnState> {
        self.turn_state.as_ref()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn party(ids: &[&str]) -> Vec<Character> {
        ids.iter().map(|id| Character::new(*id, id.to_uppercase())).collect()
    }

    fn ids(store: &SessionStore) -> Vec<&str> {
        store.party().iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_defaults() {
        let store = SessionStore::new();
        assert_eq!(store.phase(), "lobby");
        assert_eq!(store.atmosphere(), "calm");
        assert!(!store.is_connected());
        assert!(store.active_character().is_none());
        assert!(store.turn_state().is_none());
    }

    #[test]
    fn test_set_session() {
        let mut store = SessionStore::new();
        store.set_session("s-1", "The Haunting");
        assert_eq!(store.session_id().as_str(), "s-1");
        assert_eq!(store.scenario_title(), "The Haunting");
    }

    #[test]
    fn test_first_party_sets_active() {
        let mut store = SessionStore::new();
        store.set_party(party(&["a", "b"]));
        assert_eq!(store.active_character_id().map(CharacterId::as_str), Some("a"));

        store.set_party(party(&["c", "d"]));
        assert_eq!(store.active_character_id().map(CharacterId::as_str), Some("a"));
        // "a" left the party, so resolution falls back to the first member.
        assert_eq!(store.active_character().map(|c| c.id.as_str()), Some("c"));
    }

    #[test]
    fn test_empty_party_leaves_active_unset() {
        let mut store = SessionStore::new();
        store.set_party(Vec::new());
        assert!(store.active_character_id().is_none());
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut store = SessionStore::new();
        store.set_party(party(&["a", "b", "c"]));

        let mut wounded = Character::new("b", "B");
        wounded.derived.hp = 3;
        store.upsert_character(wounded);

        assert_eq!(ids(&store), vec!["a", "b", "c"]);
        assert_eq!(store.party()[1].derived.hp, 3);
    }

    #[test]
    fn test_upsert_new_appends() {
        let mut store = SessionStore::new();
        store.set_party(party(&["a"]));
        store.upsert_character(Character::new("z", "Z"));
        assert_eq!(ids(&store), vec!["a", "z"]);
    }

    #[test]
    fn test_upsert_sets_active_when_unset() {
        let mut store = SessionStore::new();
        store.upsert_character(Character::new("x", "X"));
        store.upsert_character(Character::new("y", "Y"));
        assert_eq!(store.active_character().map(|c| c.id.as_str()), Some("x"));
    }

    #[test]
    fn test_set_party_dedups_ids() {
        let mut store = SessionStore::new();
        let mut later = Character::new("a", "Second");
        later.is_npc = true;
        store.set_party(vec![Character::new("a", "First"), Character::new("b", "B"), later]);

        assert_eq!(ids(&store), vec!["a", "b"]);
        assert!(store.party()[0].is_npc);
    }

    #[test]
    fn test_select_character() {
        let mut store = SessionStore::new();
        store.set_party(party(&["a", "b"]));
        store.select_character("b");
        assert_eq!(store.active_character().map(|c| c.id.as_str()), Some("b"));

        store.set_party(party(&["b", "a"]));
        assert_eq!(store.active_character().map(|c| c.id.as_str()), Some("b"));
    }

    #[test]
    fn test_select_missing_character_falls_back() {
        let mut store = SessionStore::new();
        store.set_party(party(&["a", "b"]));
        store.select_character("ghost");
        assert_eq!(store.active_character().map(|c| c.id.as_str()), Some("a"));
    }

    #[test]
    fn test_clue_dedup_preserves_order() {
        let mut store = SessionStore::new();
        assert!(store.add_clue("bloody_key"));
        assert!(store.add_clue("torn letter"));
        assert!(!store.add_clue("bloody_key"));
        assert_eq!(store.clues(), ["bloody_key", "torn letter"]);
    }

    #[test]
    fn test_narrative_append_only() {
        let mut store = SessionStore::new();
        store.push_narrative(NarrativeKind::Narrative, "one");
        store.push_narrative(NarrativeKind::System, "two");

        let log = store.narrative_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].content(), "one");
        assert_eq!(log[1].kind(), NarrativeKind::System);
        assert!(log[0].timestamp() <= log[1].timestamp());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn party_ids_stay_unique(ops in proptest::collection::vec(0u8..6, 0..40)) {
                let mut store = SessionStore::new();
                for op in ops {
                    store.upsert_character(Character::new(format!("c{op}"), "x"));
                }
                let mut seen = std::collections::HashSet::new();
                for character in store.party() {
                    prop_assert!(seen.insert(character.id.clone()));
                }
            }

            #[test]
            fn upsert_existing_keeps_shape(
                count in 1usize..8,
                pick in 0usize..8,
                hp in -5i32..20,
            ) {
                let pick = pick % count;
                let mut store = SessionStore::new();
                store.set_party((0..count).map(|i| Character::new(format!("c{i}"), "x")));

                let mut updated = Character::new(format!("c{pick}"), "y");
                updated.derived.hp = hp;
                store.upsert_character(updated);

                prop_assert_eq!(store.party().len(), count);
                prop_assert_eq!(store.party()[pick].derived.hp, hp);
                prop_assert_eq!(store.party()[pick].name.as_str(), "y");
            }

            #[test]
            fn clues_never_duplicate(clues in proptest::collection::vec("[a-c]{1,2}", 0..30)) {
                let mut store = SessionStore::new();
                for clue in &clues {
                    store.add_clue(clue.clone());
                }

                let mut expected: Vec<String> = Vec::new();
                for clue in clues {
                    if !expected.contains(&clue) {
                        expected.push(clue);
                    }
                }
                prop_assert_eq!(store.clues(), expected.as_slice());
            }
        }
    }
}
