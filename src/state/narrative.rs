//! Narrative log entries.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// NarrativeKind
// ============================================================================

/// Category of a narrative entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeKind {
    /// Story text, including NPC actions.
    Narrative,
    /// Dice outcome.
    DiceResult,
    /// System notices and engine errors.
    System,
}

impl NarrativeKind {
    /// Returns the wire name of the kind.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Narrative => "narrative",
            Self::DiceResult => "dice_result",
            Self::System => "system",
        }
    }
}

impl fmt::Display for NarrativeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// NarrativeEntry
// ============================================================================

/// One immutable line of the session log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeEntry {
    kind: NarrativeKind,
    content: String,
    timestamp: DateTime<Utc>,
}

impl NarrativeEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn now(kind: NarrativeKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Entry category.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> NarrativeKind {
        self.kind
    }

    /// Entry text.
    #[inline]
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// When the entry was created.
    #[inline]
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_serializes_kind_snake_case() {
        let entry = NarrativeEntry::now(NarrativeKind::DiceResult, "Roll: 12/50");
        let json = serde_json::to_value(&entry).expect("serialize");
        assert_eq!(json["kind"], "dice_result");
        assert_eq!(json["content"], "Roll: 12/50");
    }

    #[test]
    fn test_timestamp_is_creation_time() {
        let before = Utc::now();
        let entry = NarrativeEntry::now(NarrativeKind::System, "saved");
        let after = Utc::now();
        assert!(entry.timestamp() >= before && entry.timestamp() <= after);
    }
}
