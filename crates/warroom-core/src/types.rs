use crate::error::WarRoomError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Pipeline phase of a deal. Declaration order is the canonical board order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Stage {
    #[default]
    Target,
    Applied,
    #[serde(alias = "Interviewing")]
    Interview,
    Offer,
    Closed,
}

impl Stage {
    pub fn all() -> &'static [Stage] {
        &[
            Stage::Target,
            Stage::Applied,
            Stage::Interview,
            Stage::Offer,
            Stage::Closed,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Target => "Target",
            Stage::Applied => "Applied",
            Stage::Interview => "Interview",
            Stage::Offer => "Offer",
            Stage::Closed => "Closed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = WarRoomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "target" => Ok(Stage::Target),
            "applied" => Ok(Stage::Applied),
            "interview" | "interviewing" => Ok(Stage::Interview),
            "offer" => Ok(Stage::Offer),
            "closed" => Ok(Stage::Closed),
            _ => Err(WarRoomError::InvalidStage(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    #[default]
    P1,
    P2,
    P3,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::P1 => "P1",
            Priority::P2 => "P2",
            Priority::P3 => "P3",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = WarRoomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "P1" | "1" => Ok(Priority::P1),
            "P2" | "2" => Ok(Priority::P2),
            "P3" | "3" => Ok(Priority::P3),
            _ => Err(WarRoomError::InvalidPriority(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tier
// ---------------------------------------------------------------------------

/// Manual 1–3 ranking of a contact. Serialized as the strings "1", "2", "3".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    #[default]
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
}

impl Tier {
    pub fn all() -> &'static [Tier] {
        &[Tier::One, Tier::Two, Tier::Three]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::One => "1",
            Tier::Two => "2",
            Tier::Three => "3",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = WarRoomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let digits = lowered
            .strip_prefix("tier")
            .or_else(|| lowered.strip_prefix('t'))
            .unwrap_or(&lowered)
            .trim();
        match digits {
            "1" => Ok(Tier::One),
            "2" => Ok(Tier::Two),
            "3" => Ok(Tier::Three),
            _ => Err(WarRoomError::InvalidTier(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ContactStatus
// ---------------------------------------------------------------------------

/// Relationship status of a contact.
///
/// Stored documents historically held free-form strings here. Deserialization
/// is lenient: matching is case-insensitive and anything unrecognized lands on
/// [`ContactStatus::Active`], so a hand-edited or imported document never fails
/// to load because of this field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContactStatus {
    #[default]
    Active,
    Warm,
    Cold,
    Revived,
    Nurture,
    Scheduling,
    Stalled,
    Closed,
    Passive,
    Champion,
}

impl ContactStatus {
    pub fn all() -> &'static [ContactStatus] {
        &[
            ContactStatus::Active,
            ContactStatus::Warm,
            ContactStatus::Cold,
            ContactStatus::Revived,
            ContactStatus::Nurture,
            ContactStatus::Scheduling,
            ContactStatus::Stalled,
            ContactStatus::Closed,
            ContactStatus::Passive,
            ContactStatus::Champion,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContactStatus::Active => "ACTIVE",
            ContactStatus::Warm => "WARM",
            ContactStatus::Cold => "COLD",
            ContactStatus::Revived => "REVIVED",
            ContactStatus::Nurture => "NURTURE",
            ContactStatus::Scheduling => "SCHEDULING",
            ContactStatus::Stalled => "STALLED",
            ContactStatus::Closed => "CLOSED",
            ContactStatus::Passive => "PASSIVE",
            ContactStatus::Champion => "CHAMPION",
        }
    }

    /// Strict lookup, used where user input should be rejected rather than coerced.
    pub fn parse(s: &str) -> Option<ContactStatus> {
        let upper = s.trim().to_ascii_uppercase();
        Self::all().iter().copied().find(|st| st.as_str() == upper)
    }
}

impl From<String> for ContactStatus {
    fn from(s: String) -> Self {
        ContactStatus::parse(&s).unwrap_or_else(|| {
            if !s.trim().is_empty() {
                tracing::warn!(status = %s, "unknown contact status, normalizing to ACTIVE");
            }
            ContactStatus::Active
        })
    }
}

impl From<ContactStatus> for String {
    fn from(s: ContactStatus) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn stage_ordering_is_canonical() {
        assert!(Stage::Target < Stage::Applied);
        assert!(Stage::Interview < Stage::Offer);
        assert!(Stage::Offer < Stage::Closed);
        assert_eq!(Stage::all().last(), Some(&Stage::Closed));
    }

    #[test]
    fn stage_parses_case_insensitively() {
        assert_eq!(Stage::from_str("closed").unwrap(), Stage::Closed);
        assert_eq!(Stage::from_str("Interviewing").unwrap(), Stage::Interview);
        assert!(Stage::from_str("won").is_err());
    }

    #[test]
    fn stage_serializes_with_display_names() {
        assert_eq!(serde_json::to_string(&Stage::Interview).unwrap(), "\"Interview\"");
        let legacy: Stage = serde_json::from_str("\"Interviewing\"").unwrap();
        assert_eq!(legacy, Stage::Interview);
    }

    #[test]
    fn tier_accepts_short_forms() {
        assert_eq!(Tier::from_str("2").unwrap(), Tier::Two);
        assert_eq!(Tier::from_str("T3").unwrap(), Tier::Three);
        assert_eq!(Tier::from_str("tier1").unwrap(), Tier::One);
        assert!(Tier::from_str("4").is_err());
        assert_eq!(serde_json::to_string(&Tier::Three).unwrap(), "\"3\"");
    }

    #[test]
    fn contact_status_normalizes_unknown_values() {
        let s: ContactStatus = serde_json::from_str("\"warm\"").unwrap();
        assert_eq!(s, ContactStatus::Warm);
        let s: ContactStatus = serde_json::from_str("\"ghosted\"").unwrap();
        assert_eq!(s, ContactStatus::Active);
        assert_eq!(serde_json::to_string(&ContactStatus::Revived).unwrap(), "\"REVIVED\"");
    }

    #[test]
    fn contact_status_strict_parse_rejects_unknown() {
        assert_eq!(ContactStatus::parse("nurture"), Some(ContactStatus::Nurture));
        assert_eq!(ContactStatus::parse("ghosted"), None);
    }

    #[test]
    fn priority_parse() {
        assert_eq!(Priority::from_str("p2").unwrap(), Priority::P2);
        assert!(Priority::from_str("P9").is_err());
    }
}
