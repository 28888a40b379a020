use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Generated / Source
// ---------------------------------------------------------------------------

/// Where a capability's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Live,
    Fallback,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Live => f.write_str("live"),
            Source::Fallback => f.write_str("fallback"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generated<T> {
    pub value: T,
    pub source: Source,
}

impl<T> Generated<T> {
    pub fn live(value: T) -> Self {
        Self {
            value,
            source: Source::Live,
        }
    }

    pub fn fallback(value: T) -> Self {
        Self {
            value,
            source: Source::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == Source::Fallback
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

// ---------------------------------------------------------------------------
// Capability outputs
// ---------------------------------------------------------------------------

/// A letter grade or a numeric score; the backend returns either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Grade {
    Score(f64),
    Letter(String),
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grade::Score(s) => write!(f, "{s}"),
            Grade::Letter(l) => f.write_str(l),
        }
    }
}

/// Scored practice session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DossierReport {
    pub summary: String,
    pub conviction: Grade,
    pub clarity: Grade,
    pub star_method: Grade,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cadence_match: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wpm: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSignal {
    #[serde(default)]
    pub id: String,
    pub company: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub headline: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub impact_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub month: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiringVelocity {
    pub velocity: String,
    #[serde(default)]
    pub insight: String,
    #[serde(default)]
    pub trend: Vec<TrendPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    #[serde(default)]
    pub improvements: Vec<String>,
    #[serde(default)]
    pub bugs: Vec<String>,
    #[serde(default)]
    pub category_maturity: BTreeMap<String, f64>,
}
