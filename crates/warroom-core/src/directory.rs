//! Contact directory: search, quick filters, and contact CRUD.

use crate::app::WarRoom;
use crate::board::{Confirmation, DeleteOutcome};
use crate::contact::{self, Contact, ContactDraft, ContactPatch};
use crate::error::{Result, WarRoomError};
use crate::state::StatePatch;
use crate::storage::Storage;
use crate::types::{ContactStatus, Tier};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// ContactFilter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContactFilter {
    #[default]
    All,
    Status(ContactStatus),
    Tier(Tier),
}

impl ContactFilter {
    pub fn matches(&self, contact: &Contact) -> bool {
        match self {
            ContactFilter::All => true,
            ContactFilter::Status(s) => contact.status == *s,
            ContactFilter::Tier(t) => contact.tier == *t,
        }
    }
}

impl fmt::Display for ContactFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContactFilter::All => f.write_str("ALL"),
            ContactFilter::Status(s) => write!(f, "{s}"),
            ContactFilter::Tier(t) => write!(f, "TIER{t}"),
        }
    }
}

/// Accepts `ALL`, any status name, or a tier token (`TIER1`, `T1`, `1`).
impl FromStr for ContactFilter {
    type Err = WarRoomError;

    fn from_str(s: &str) -> Result<Self> {
        let token = s.trim();
        if token.eq_ignore_ascii_case("all") || token.is_empty() {
            return Ok(ContactFilter::All);
        }
        if let Some(status) = ContactStatus::parse(token) {
            return Ok(ContactFilter::Status(status));
        }
        if let Ok(tier) = Tier::from_str(token) {
            return Ok(ContactFilter::Tier(tier));
        }
        Err(WarRoomError::InvalidFilter(s.to_string()))
    }
}

/// Case-insensitive substring match on name or company, then the filter.
/// An empty query matches everything.
pub fn filter_contacts<'a>(
    contacts: &'a [Contact],
    query: &str,
    filter: ContactFilter,
) -> Vec<&'a Contact> {
    let needle = query.trim().to_lowercase();
    contacts
        .iter()
        .filter(|c| {
            needle.is_empty()
                || c.name.to_lowercase().contains(&needle)
                || c.company.to_lowercase().contains(&needle)
        })
        .filter(|c| filter.matches(c))
        .collect()
}

// ---------------------------------------------------------------------------
// Directory controller
// ---------------------------------------------------------------------------

impl<S: Storage> WarRoom<S> {
    pub fn contact(&self, id: &str) -> Option<&Contact> {
        contact::find(&self.state().contacts, id)
    }

    pub fn view_contacts(&self, query: &str, filter: ContactFilter) -> Vec<&Contact> {
        filter_contacts(&self.state().contacts, query, filter)
    }

    pub fn create_contact(&mut self, draft: ContactDraft) -> Result<Contact> {
        let new = draft.into_contact(contact::new_contact_id());
        if let Err(e) = new.validate() {
            return Err(self.reject(e));
        }

        let mut contacts = self.state().contacts.clone();
        contacts.push(new.clone());
        self.commit(StatePatch::contacts(contacts))?;

        tracing::info!(id = %new.id, name = %new.name, "contact created");
        self.notifier
            .success("Contact Added", &format!("{} ({})", new.name, new.company));
        Ok(new)
    }

    pub fn edit_contact(&mut self, id: &str, patch: ContactPatch) -> Result<Contact> {
        let mut contacts = self.state().contacts.clone();
        let target = contact::find_mut(&mut contacts, id)?;
        patch.apply_to(target);
        if let Err(e) = target.validate() {
            return Err(self.reject(e));
        }
        let updated = target.clone();

        self.commit(StatePatch::contacts(contacts))?;
        tracing::info!(id = %updated.id, "contact updated");
        self.notifier
            .success("Contact Updated", &format!("{} saved", updated.name));
        Ok(updated)
    }

    /// Remove a contact and strip its id from every deal that referenced it,
    /// in a single write.
    pub fn delete_contact(
        &mut self,
        id: &str,
        confirmation: Confirmation,
    ) -> Result<DeleteOutcome<Contact>> {
        let Some(position) = self.state().contacts.iter().position(|c| c.id == id) else {
            return Err(WarRoomError::ContactNotFound(id.to_string()));
        };
        if confirmation == Confirmation::Pending {
            return Ok(DeleteOutcome::NeedsConfirmation);
        }

        let mut contacts = self.state().contacts.clone();
        let removed = contacts.remove(position);

        let mut patch = StatePatch::contacts(contacts);
        let referenced = self
            .state()
            .pipeline
            .iter()
            .any(|d| d.contacts.iter().any(|c| c == id));
        if referenced {
            let mut pipeline = self.state().pipeline.clone();
            for deal in &mut pipeline {
                deal.contacts.retain(|c| c != id);
            }
            patch.pipeline = Some(pipeline);
        }
        self.commit(patch)?;

        tracing::info!(id = %removed.id, stripped_refs = referenced, "contact deleted");
        self.notifier
            .warning("Contact Removed", &format!("{} removed from directory", removed.name));
        Ok(DeleteOutcome::Deleted(removed))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
