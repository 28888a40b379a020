use crate::contact::Contact;
use crate::deal::Deal;
use crate::migrations::CURRENT_SCHEMA_VERSION;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Sibling collections
// ---------------------------------------------------------------------------

/// Knowledge-base fields. Only the commonly edited ones are typed; the rest of
/// the narrative sections ride along in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeuralCore {
    #[serde(default)]
    pub identity: String,
    #[serde(default)]
    pub ledger: Vec<String>,
    #[serde(default)]
    pub playbooks: Vec<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub personas: Vec<String>,
    #[serde(default)]
    pub market_thesis: String,
    #[serde(default)]
    pub roadmap: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub last_action: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentTask {
    pub id: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedAsset {
    pub id: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub style: String,
}

/// One scored practice session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub notes: String,
}

// ---------------------------------------------------------------------------
// UserState
// ---------------------------------------------------------------------------

/// The whole persisted document. Everything the app knows lives here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserState {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub xp: u64,
    #[serde(default)]
    pub day_streak: u32,
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub revenue_target: f64,
    #[serde(default)]
    pub metrics: Vec<Value>,
    #[serde(default)]
    pub neural_core: NeuralCore,
    #[serde(default)]
    pub master_resume: String,
    #[serde(default)]
    pub case_studies: String,
    #[serde(default)]
    pub portfolio: String,
    #[serde(default)]
    pub contacts: Vec<Contact>,
    #[serde(default)]
    pub pipeline: Vec<Deal>,
    #[serde(default)]
    pub assets: Vec<GeneratedAsset>,
    #[serde(default)]
    pub session_history: Vec<SessionRecord>,
    #[serde(default)]
    pub agents: Vec<Agent>,
    #[serde(default)]
    pub agent_tasks: Vec<AgentTask>,
    #[serde(default)]
    pub last_simulacrum_score: f64,
}

fn default_schema_version() -> u32 {
    CURRENT_SCHEMA_VERSION
}

fn default_level() -> u32 {
    1
}

impl Default for UserState {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            name: String::new(),
            role: String::new(),
            level: default_level(),
            xp: 0,
            day_streak: 0,
            streak: 0,
            revenue_target: 0.0,
            metrics: Vec::new(),
            neural_core: NeuralCore::default(),
            master_resume: String::new(),
            case_studies: String::new(),
            portfolio: String::new(),
            contacts: Vec::new(),
            pipeline: Vec::new(),
            assets: Vec::new(),
            session_history: Vec::new(),
            agents: Vec::new(),
            agent_tasks: Vec::new(),
            last_simulacrum_score: 0.0,
        }
    }
}

impl UserState {
    /// Shallow merge: every `Some` field of `patch` replaces the matching
    /// top-level field wholesale. Nested values are never merged, so patching
    /// `neural_core` swaps the entire knowledge base.
    pub fn merged(&self, patch: StatePatch) -> UserState {
        let mut next = self.clone();
        next.merge_in_place(patch);
        next
    }

    pub(crate) fn merge_in_place(&mut self, patch: StatePatch) {
        let StatePatch {
            name,
            role,
            level,
            xp,
            day_streak,
            streak,
            revenue_target,
            metrics,
            neural_core,
            master_resume,
            case_studies,
            portfolio,
            contacts,
            pipeline,
            assets,
            session_history,
            agents,
            agent_tasks,
            last_simulacrum_score,
        } = patch;

        replace(&mut self.name, name);
        replace(&mut self.role, role);
        replace(&mut self.level, level);
        replace(&mut self.xp, xp);
        replace(&mut self.day_streak, day_streak);
        replace(&mut self.streak, streak);
        replace(&mut self.revenue_target, revenue_target);
        replace(&mut self.metrics, metrics);
        replace(&mut self.neural_core, neural_core);
        replace(&mut self.master_resume, master_resume);
        replace(&mut self.case_studies, case_studies);
        replace(&mut self.portfolio, portfolio);
        replace(&mut self.contacts, contacts);
        replace(&mut self.pipeline, pipeline);
        replace(&mut self.assets, assets);
        replace(&mut self.session_history, session_history);
        replace(&mut self.agents, agents);
        replace(&mut self.agent_tasks, agent_tasks);
        replace(&mut self.last_simulacrum_score, last_simulacrum_score);
    }
}

fn replace<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

// ---------------------------------------------------------------------------
// StatePatch
// ---------------------------------------------------------------------------

/// A partial document. There is no `schema_version` field; only migrations
/// move it.
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    pub name: Option<String>,
    pub role: Option<String>,
    pub level: Option<u32>,
    pub xp: Option<u64>,
    pub day_streak: Option<u32>,
    pub streak: Option<u32>,
    pub revenue_target: Option<f64>,
    pub metrics: Option<Vec<Value>>,
    pub neural_core: Option<NeuralCore>,
    pub master_resume: Option<String>,
    pub case_studies: Option<String>,
    pub portfolio: Option<String>,
    pub contacts: Option<Vec<Contact>>,
    pub pipeline: Option<Vec<Deal>>,
    pub assets: Option<Vec<GeneratedAsset>>,
    pub session_history: Option<Vec<SessionRecord>>,
    pub agents: Option<Vec<Agent>>,
    pub agent_tasks: Option<Vec<AgentTask>>,
    pub last_simulacrum_score: Option<f64>,
}

impl StatePatch {
    pub fn pipeline(pipeline: Vec<Deal>) -> Self {
        Self {
            pipeline: Some(pipeline),
            ..Default::default()
        }
    }

    pub fn contacts(contacts: Vec<Contact>) -> Self {
        Self {
            contacts: Some(contacts),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
