use crate::error::{Result, WarRoomError};
use crate::types::{Priority, Stage};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Deal
// ---------------------------------------------------------------------------

/// A tracked pipeline opportunity.
///
/// `contacts` holds contact ids as a weak relation: nothing here owns those
/// contacts, and ids may dangle until the directory strips them on delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: String,
    pub company: String,
    pub role: String,
    #[serde(default)]
    pub stage: Stage,
    #[serde(default)]
    pub probability: u8,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_enriched: Option<String>,
    #[serde(default)]
    pub contacts: Vec<String>,
    /// Fields this build does not model, kept so documents round-trip intact.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Deal {
    /// `value × probability / 100`. Bounded by `[0, value]` for any valid deal.
    pub fn expected_value(&self) -> f64 {
        self.value * f64::from(self.probability) / 100.0
    }

    pub fn validate(&self) -> Result<()> {
        if self.company.trim().is_empty() || self.role.trim().is_empty() {
            return Err(WarRoomError::Validation(
                "company and role are mandatory".to_string(),
            ));
        }
        if self.probability > 100 {
            return Err(WarRoomError::Validation(format!(
                "probability must be between 0 and 100, got {}",
                self.probability
            )));
        }
        if !self.value.is_finite() || self.value < 0.0 {
            return Err(WarRoomError::Validation(format!(
                "value must be a non-negative number, got {}",
                self.value
            )));
        }
        Ok(())
    }
}

pub fn new_deal_id() -> String {
    format!("deal-{}", uuid::Uuid::new_v4().simple())
}

// ---------------------------------------------------------------------------
// DealDraft: input for creation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealDraft {
    pub company: String,
    pub role: String,
    pub stage: Option<Stage>,
    pub probability: Option<u8>,
    pub value: Option<f64>,
    pub priority: Option<Priority>,
    pub salary: Option<String>,
    pub intent: Option<String>,
    pub next_step: Option<String>,
    pub due_date: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub contacts: Vec<String>,
}

impl DealDraft {
    pub fn new(company: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            role: role.into(),
            ..Default::default()
        }
    }

    /// Materialize into a record with a fresh id. Does not validate.
    pub fn into_deal(self, id: String, default_probability: u8, enriched_at: String) -> Deal {
        Deal {
            id,
            company: self.company.trim().to_string(),
            role: self.role.trim().to_string(),
            stage: self.stage.unwrap_or_default(),
            probability: self.probability.unwrap_or(default_probability),
            value: self.value.unwrap_or(0.0),
            priority: self.priority.unwrap_or_default(),
            salary: non_empty(self.salary),
            intent: non_empty(self.intent),
            next_step: non_empty(self.next_step),
            due_date: non_empty(self.due_date),
            notes: non_empty(self.notes),
            last_enriched: Some(enriched_at),
            contacts: self.contacts,
            extra: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// DealPatch: partial edit
// ---------------------------------------------------------------------------

/// Field-level edit of a deal. `None` leaves the field alone; for optional text
/// fields an empty string clears the value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealPatch {
    pub company: Option<String>,
    pub role: Option<String>,
    pub stage: Option<Stage>,
    pub probability: Option<u8>,
    pub value: Option<f64>,
    pub priority: Option<Priority>,
    pub salary: Option<String>,
    pub intent: Option<String>,
    pub next_step: Option<String>,
    pub due_date: Option<String>,
    pub notes: Option<String>,
    pub contacts: Option<Vec<String>>,
}

impl DealPatch {
    pub fn is_empty(&self) -> bool {
        self.company.is_none()
            && self.role.is_none()
            && self.stage.is_none()
            && self.probability.is_none()
            && self.value.is_none()
            && self.priority.is_none()
            && self.salary.is_none()
            && self.intent.is_none()
            && self.next_step.is_none()
            && self.due_date.is_none()
            && self.notes.is_none()
            && self.contacts.is_none()
    }

    pub fn apply_to(self, deal: &mut Deal) {
        if let Some(v) = self.company {
            deal.company = v.trim().to_string();
        }
        if let Some(v) = self.role {
            deal.role = v.trim().to_string();
        }
        if let Some(v) = self.stage {
            deal.stage = v;
        }
        if let Some(v) = self.probability {
            deal.probability = v;
        }
        if let Some(v) = self.value {
            deal.value = v;
        }
        if let Some(v) = self.priority {
            deal.priority = v;
        }
        if self.salary.is_some() {
            deal.salary = non_empty(self.salary);
        }
        if self.intent.is_some() {
            deal.intent = non_empty(self.intent);
        }
        if self.next_step.is_some() {
            deal.next_step = non_empty(self.next_step);
        }
        if self.due_date.is_some() {
            deal.due_date = non_empty(self.due_date);
        }
        if self.notes.is_some() {
            deal.notes = non_empty(self.notes);
        }
        if let Some(v) = self.contacts {
            deal.contacts = v;
        }
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

pub fn find<'a>(deals: &'a [Deal], id: &str) -> Option<&'a Deal> {
    deals.iter().find(|d| d.id == id)
}

pub(crate) fn find_mut<'a>(deals: &'a mut [Deal], id: &str) -> Result<&'a mut Deal> {
    deals
        .iter_mut()
        .find(|d| d.id == id)
        .ok_or_else(|| WarRoomError::DealNotFound(id.to_string()))
}

pub(crate) fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
