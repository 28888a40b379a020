use crate::deal::non_empty;
use crate::error::{Result, WarRoomError};
use crate::types::{ContactStatus, Tier};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Contact
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub company: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub status: ContactStatus,
    #[serde(default)]
    pub tier: Tier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_touch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Contact {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() || self.company.trim().is_empty() {
            return Err(WarRoomError::Validation(
                "name and company are mandatory".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn new_contact_id() -> String {
    format!("contact-{}", uuid::Uuid::new_v4().simple())
}

// ---------------------------------------------------------------------------
// ContactDraft
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDraft {
    pub name: String,
    pub company: String,
    pub role: Option<String>,
    pub status: Option<ContactStatus>,
    pub tier: Option<Tier>,
    pub last_touch: Option<String>,
    pub strategy: Option<String>,
    pub notes: Option<String>,
    pub email: Option<String>,
    pub linkedin: Option<String>,
}

impl ContactDraft {
    pub fn new(name: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            company: company.into(),
            ..Default::default()
        }
    }

    pub fn into_contact(self, id: String) -> Contact {
        Contact {
            id,
            name: self.name.trim().to_string(),
            company: self.company.trim().to_string(),
            role: self.role.map(|r| r.trim().to_string()).unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            tier: self.tier.unwrap_or_default(),
            last_touch: non_empty(self.last_touch),
            strategy: non_empty(self.strategy),
            notes: non_empty(self.notes),
            email: non_empty(self.email),
            linkedin: non_empty(self.linkedin),
            extra: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// ContactPatch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPatch {
    pub name: Option<String>,
    pub company: Option<String>,
    pub role: Option<String>,
    pub status: Option<ContactStatus>,
    pub tier: Option<Tier>,
    pub last_touch: Option<String>,
    pub strategy: Option<String>,
    pub notes: Option<String>,
    pub email: Option<String>,
    pub linkedin: Option<String>,
}

impl ContactPatch {
    pub fn apply_to(self, contact: &mut Contact) {
        if let Some(v) = self.name {
            contact.name = v.trim().to_string();
        }
        if let Some(v) = self.company {
            contact.company = v.trim().to_string();
        }
        if let Some(v) = self.role {
            contact.role = v.trim().to_string();
        }
        if let Some(v) = self.status {
            contact.status = v;
        }
        if let Some(v) = self.tier {
            contact.tier = v;
        }
        if self.last_touch.is_some() {
            contact.last_touch = non_empty(self.last_touch);
        }
        if self.strategy.is_some() {
            contact.strategy = non_empty(self.strategy);
        }
        if self.notes.is_some() {
            contact.notes = non_empty(self.notes);
        }
        if self.email.is_some() {
            contact.email = non_empty(self.email);
        }
        if self.linkedin.is_some() {
            contact.linkedin = non_empty(self.linkedin);
        }
    }
}

pub fn find<'a>(contacts: &'a [Contact], id: &str) -> Option<&'a Contact> {
    contacts.iter().find(|c| c.id == id)
}

pub(crate) fn find_mut<'a>(contacts: &'a mut [Contact], id: &str) -> Result<&'a mut Contact> {
    contacts
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| WarRoomError::ContactNotFound(id.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_defaults() {
        let c = ContactDraft::new("Minh Pham", "NVIDIA").into_contact("c1".into());
        assert_eq!(c.status, ContactStatus::Active);
        assert_eq!(c.tier, Tier::One);
        assert_eq!(c.role, "");
        assert!(c.validate().is_ok());
    }

    #[test]
    fn validate_requires_name_and_company() {
        let c = ContactDraft::new("", "NVIDIA").into_contact("c1".into());
        assert!(matches!(c.validate(), Err(WarRoomError::Validation(_))));
        let c = ContactDraft::new("Minh", " ").into_contact("c2".into());
        assert!(c.validate().is_err());
    }

    #[test]
    fn legacy_record_parses_with_lenient_status() {
        let json = r#"{"id":"nc60","tier":"1","name":"Jonathan Goldberg","company":"ManTech",
            "role":"Prospect/Champion","status":"Passive","lastTouch":"2025-12-28","strategy":""}"#;
        let c: Contact = serde_json::from_str(json).unwrap();
        assert_eq!(c.status, ContactStatus::Passive);
        assert_eq!(c.last_touch.as_deref(), Some("2025-12-28"));
    }

    #[test]
    fn patch_updates_in_place() {
        let mut c = ContactDraft::new("Ed Carr", "Unknown").into_contact("c1".into());
        ContactPatch {
            company: Some("Carr Search".into()),
            tier: Some(Tier::Two),
            ..Default::default()
        }
        .apply_to(&mut c);
        assert_eq!(c.company, "Carr Search");
        assert_eq!(c.tier, Tier::Two);
        assert_eq!(c.id, "c1");
    }
}
