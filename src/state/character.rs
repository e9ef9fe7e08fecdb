//! Party member model.
//!
//! Mirrors the engine's character schema closely enough to deserialize it
//! directly. Rules computation stays on the engine side; the client only
//! displays what it is sent.

// ============================================================================
// Imports
// ============================================================================

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::identifiers::CharacterId;

// ============================================================================
// Character
// ============================================================================

/// A player character or NPC.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Character {
    /// Unique within the party.
    pub id: CharacterId,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Whether the keeper controls this character.
    #[serde(default)]
    pub is_npc: bool,

    /// Occupation, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,

    /// Characteristic scores.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characteristics: Option<Characteristics>,

    /// Derived statistics.
    #[serde(default)]
    pub derived: DerivedStats,

    /// Skills keyed by skill name.
    #[serde(default)]
    pub skills: BTreeMap<String, Skill>,

    /// Carried items, in order.
    #[serde(default)]
    pub inventory: Vec<String>,

    /// Active condition tags.
    #[serde(default)]
    pub conditions: BTreeSet<String>,
}

impl Character {
    /// Creates a character with only identity fields set.
    #[must_use]
    pub fn new(id: impl Into<CharacterId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Returns `true` if the condition tag is active.
    #[inline]
    #[must_use]
    pub fn has_condition(&self, tag: &str) -> bool {
        self.conditions.contains(tag)
    }
}

// ============================================================================
// Characteristics
// ============================================================================

/// The eight characteristic scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Characteristics {
    #[serde(rename = "STR")]
    pub strength: i32,
    #[serde(rename = "CON")]
    pub constitution: i32,
    #[serde(rename = "SIZ")]
    pub size: i32,
    #[serde(rename = "DEX")]
    pub dexterity: i32,
    #[serde(rename = "APP")]
    pub appearance: i32,
    #[serde(rename = "INT")]
    pub intelligence: i32,
    #[serde(rename = "POW")]
    pub power: i32,
    #[serde(rename = "EDU")]
    pub education: i32,
}

// ============================================================================
// DerivedStats
// ============================================================================

/// Current and maximum pools plus combat values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivedStats {
    /// Hit points.
    pub hp: i32,
    /// Maximum hit points.
    pub hp_max: i32,
    /// Sanity.
    pub san: i32,
    /// Maximum sanity.
    pub san_max: i32,
    /// Magic points.
    pub mp: i32,
    /// Maximum magic points.
    pub mp_max: i32,
    /// Luck.
    pub luck: i32,
    /// Damage bonus expression, e.g. `"+1D4"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage_bonus: Option<String>,
    /// Build.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<i32>,
    /// Movement rate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_rate: Option<i32>,
}

// ============================================================================
// Skill
// ============================================================================

/// A single skill entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    /// Display name.
    pub name: String,
    /// Starting value.
    pub base_value: i32,
    /// Value after improvement and modifiers.
    pub current_value: i32,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_engine_character() {
        let json_str = r#"{
            "id": "a1b2c3d4",
            "name": "Harvey Walters",
            "is_npc": false,
            "occupation": "Journalist",
            "age": 42,
            "characteristics": {
                "STR": 50, "CON": 60, "SIZ": 65, "DEX": 55,
                "APP": 40, "INT": 80, "POW": 70, "EDU": 85
            },
            "derived": {
                "hp": 12, "hp_max": 12, "san": 70, "san_max": 99,
                "mp": 14, "mp_max": 14, "luck": 45,
                "damage_bonus": "0", "build": 0, "move_rate": 7
            },
            "skills": {
                "spot_hidden": { "name": "Spot Hidden", "base_value": 25, "current_value": 60 }
            },
            "inventory": ["notebook", "camera"],
            "conditions": ["shaken"]
        }"#;

        let character: Character = serde_json::from_str(json_str).expect("parse character");
        assert_eq!(character.id.as_str(), "a1b2c3d4");
        assert_eq!(character.occupation.as_deref(), Some("Journalist"));
        assert_eq!(character.characteristics.map(|c| c.education), Some(85));
        assert_eq!(character.derived.move_rate, Some(7));
        assert_eq!(character.skills["spot_hidden"].current_value, 60);
        assert_eq!(character.inventory, vec!["notebook", "camera"]);
        assert!(character.has_condition("shaken"));
    }

    #[test]
    fn test_deserialize_minimal_npc() {
        let character: Character =
            serde_json::from_str(r#"{"id":"keeper","is_npc":true}"#).expect("parse npc");
        assert!(character.is_npc);
        assert!(character.characteristics.is_none());
        assert_eq!(character.derived, DerivedStats::default());
    }

    #[test]
    fn test_new_sets_identity_only() {
        let character = Character::new("inv-1", "Harvey Walters");
        assert_eq!(character.id.as_str(), "inv-1");
        assert_eq!(character.name, "Harvey Walters");
        assert!(!character.is_npc);
        assert!(character.skills.is_empty());
    }
}
