// Normalized identity keys for teams and pitchers.
//
// Box scores and schedules spell the same name in slightly different ways
// (trailing spaces, doubled spaces, case). Keys are normalized once, where
// records enter the system, and only keys are compared afterwards.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Placeholder the schedule feed uses when no probable pitcher is announced.
const UNKNOWN_PLACEHOLDER: &str = "unknown";

/// Trim, collapse internal whitespace, and lowercase (ASCII only).
pub fn normalize_key(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

/// Stable identity for a club.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TeamId(String);

impl TeamId {
    pub fn new(display_name: &str) -> Self {
        Self(normalize_key(display_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable identity for a pitcher.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PitcherId(String);

impl PitcherId {
    /// Returns `None` for blank names and the feed's "Unknown" placeholder.
    pub fn new(display_name: &str) -> Option<Self> {
        let key = normalize_key(display_name);
        if key.is_empty() || key == UNKNOWN_PLACEHOLDER {
            None
        } else {
            Some(Self(key))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PitcherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Deserialization goes through `new`: keys are normalized and placeholder
// pitchers are refused.

impl<'de> Deserialize<'de> for TeamId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(TeamId::new(&raw))
    }
}

impl<'de> Deserialize<'de> for PitcherId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        PitcherId::new(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("\"{raw}\" does not name a pitcher"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spelling_variants_share_a_key() {
        assert_eq!(TeamId::new("New York Yankees"), TeamId::new("  new york  Yankees "));
        assert_eq!(
            PitcherId::new("Gerrit Cole"),
            PitcherId::new("gerrit\tcole")
        );
    }

    #[test]
    fn placeholder_pitchers_have_no_identity() {
        assert_eq!(PitcherId::new("Unknown"), None);
        assert_eq!(PitcherId::new(""), None);
        assert_eq!(PitcherId::new("   "), None);
    }

    #[test]
    fn keys_serialize_as_plain_strings() {
        let id = TeamId::new("Boston Red Sox");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"boston red sox\"");
    }

    #[test]
    fn deserialized_keys_are_normalized() {
        let team: TeamId = serde_json::from_str("\" Boston  Red Sox\"").unwrap();
        assert_eq!(team, TeamId::new("boston red sox"));
        let pitcher: PitcherId = serde_json::from_str("\"Gerrit  COLE \"").unwrap();
        assert_eq!(pitcher.as_str(), "gerrit cole");
    }

    #[test]
    fn placeholder_pitchers_do_not_deserialize() {
        assert!(serde_json::from_str::<PitcherId>("\"Unknown\"").is_err());
        assert!(serde_json::from_str::<PitcherId>("\"  \"").is_err());
        let none: Option<PitcherId> = serde_json::from_str("null").unwrap();
        assert_eq!(none, None);
    }
}
