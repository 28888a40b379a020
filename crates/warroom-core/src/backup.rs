//! Whole-document export and the two import paths: restoring a full backup,
//! and appending loosely-typed records extracted from arbitrary text.

use crate::app::WarRoom;
use crate::contact::{Contact, ContactDraft};
use crate::deal::{Deal, DealDraft};
use crate::error::Result;
use crate::migrations;
use crate::paths::BACKUP_PREFIX;
use crate::state::{StatePatch, UserState};
use crate::storage::Storage;
use crate::types::{ContactStatus, Priority, Stage, Tier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

pub fn export_json(state: &UserState) -> Result<String> {
    Ok(serde_json::to_string_pretty(state)?)
}

/// `warroom_backup_2026-10-19T08-30-00Z.json`
pub fn export_filename(at: DateTime<Utc>) -> String {
    format!("{BACKUP_PREFIX}{}.json", at.format("%Y-%m-%dT%H-%M-%SZ"))
}

/// Write a backup into `dir` and return its path.
pub fn export_to(dir: &Path, state: &UserState, at: DateTime<Utc>) -> Result<PathBuf> {
    let path = dir.join(export_filename(at));
    crate::io::atomic_write(&path, export_json(state)?.as_bytes())?;
    tracing::info!(path = %path.display(), "exported backup");
    Ok(path)
}

// ---------------------------------------------------------------------------
// Full-backup parsing
// ---------------------------------------------------------------------------

/// Parse `text` as a full backup: a JSON object with at least `contacts` and
/// `pipeline` arrays. Anything else yields `None` so the caller can fall back
/// to free-form extraction.
pub fn parse_backup(text: &str) -> Option<UserState> {
    let value: Value = serde_json::from_str(text.trim()).ok()?;
    let obj = value.as_object()?;
    if !obj.get("contacts").is_some_and(Value::is_array)
        || !obj.get("pipeline").is_some_and(Value::is_array)
    {
        return None;
    }
    let migrated = match migrations::migrate_document(value) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(error = %e, "backup rejected by migrations");
            return None;
        }
    };
    match serde_json::from_value(migrated) {
        Ok(state) => Some(state),
        Err(e) => {
            tracing::debug!(error = %e, "backup does not match the document shape");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Free-form bulk records
// ---------------------------------------------------------------------------

/// Loosely-typed records pulled out of arbitrary text. Every field is
/// optional; records missing a required field are skipped on append.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkImport {
    #[serde(default)]
    pub contacts: Vec<PartialContact>,
    #[serde(default)]
    pub deals: Vec<PartialDeal>,
}

impl BulkImport {
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty() && self.deals.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialContact {
    pub name: Option<String>,
    pub company: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient_parse")]
    pub tier: Option<Tier>,
    pub last_touch: Option<String>,
    pub strategy: Option<String>,
    pub notes: Option<String>,
    pub email: Option<String>,
    pub linkedin: Option<String>,
}

impl PartialContact {
    /// `None` when name or company is missing.
    pub fn into_contact(self, id: String) -> Option<Contact> {
        let contact = ContactDraft {
            name: self.name.unwrap_or_default(),
            company: self.company.unwrap_or_default(),
            role: self.role,
            status: self.status.map(ContactStatus::from),
            tier: self.tier,
            last_touch: self.last_touch,
            strategy: self.strategy,
            notes: self.notes,
            email: self.email,
            linkedin: self.linkedin,
        }
        .into_contact(id);
        contact.validate().ok().map(|_| contact)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialDeal {
    pub company: Option<String>,
    pub role: Option<String>,
    #[serde(deserialize_with = "lenient_parse")]
    pub stage: Option<Stage>,
    #[serde(deserialize_with = "lenient_number")]
    pub probability: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub value: Option<f64>,
    #[serde(deserialize_with = "lenient_parse")]
    pub priority: Option<Priority>,
    pub salary: Option<String>,
    pub intent: Option<String>,
    pub next_step: Option<String>,
    pub due_date: Option<String>,
    pub notes: Option<String>,
}

impl PartialDeal {
    /// `None` when company or role is missing. Out-of-range numbers are
    /// clamped rather than rejected.
    pub fn into_deal(self, id: String, default_probability: u8, enriched_at: String) -> Option<Deal> {
        let probability = self
            .probability
            .filter(|p| p.is_finite())
            .map(|p| p.round().clamp(0.0, 100.0) as u8);
        let value = self.value.filter(|v| v.is_finite() && *v >= 0.0);
        let deal = DealDraft {
            company: self.company.unwrap_or_default(),
            role: self.role.unwrap_or_default(),
            stage: self.stage,
            probability,
            value,
            priority: self.priority,
            salary: self.salary,
            intent: self.intent,
            next_step: self.next_step,
            due_date: self.due_date,
            notes: self.notes,
            contacts: Vec::new(),
        }
        .into_deal(id, default_probability, enriched_at);
        deal.validate().ok().map(|_| deal)
    }
}

fn scalar_text(v: Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Accept a string or a number and parse it with `FromStr`; anything
/// unparseable becomes `None` instead of failing the whole record.
fn lenient_parse<'de, D, T>(d: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<Value>::deserialize(d)?;
    Ok(raw.and_then(scalar_text).and_then(|s| s.parse().ok()))
}

/// Numbers, or strings such as "$240,000" and "60%".
fn lenient_number<'de, D>(d: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(d)?;
    Ok(raw.and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse().ok()
        }
        _ => None,
    }))
}

pub fn new_import_id() -> String {
    format!("imp-{}", uuid::Uuid::new_v4().simple())
}

// ---------------------------------------------------------------------------
// ImportReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    /// A full backup merged by id.
    Restore,
    /// Extracted records appended under fresh ids.
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub mode: ImportMode,
    pub contacts_added: usize,
    pub contacts_replaced: usize,
    pub deals_added: usize,
    pub deals_replaced: usize,
    pub skipped: usize,
}

impl ImportReport {
    fn new(mode: ImportMode) -> Self {
        Self {
            mode,
            contacts_added: 0,
            contacts_replaced: 0,
            deals_added: 0,
            deals_replaced: 0,
            skipped: 0,
        }
    }

    pub fn contacts(&self) -> usize {
        self.contacts_added + self.contacts_replaced
    }

    pub fn deals(&self) -> usize {
        self.deals_added + self.deals_replaced
    }
}

/// Replace records whose id already exists, append the rest. Returns
/// `(added, replaced)`.
fn merge_by_id<T: Clone>(
    existing: &mut Vec<T>,
    incoming: Vec<T>,
    id: impl Fn(&T) -> &str,
) -> (usize, usize) {
    let (mut added, mut replaced) = (0, 0);
    for record in incoming {
        match existing.iter().position(|e| id(e) == id(&record)) {
            Some(i) => {
                existing[i] = record;
                replaced += 1;
            }
            None => {
                existing.push(record);
                added += 1;
            }
        }
    }
    (added, replaced)
}

// ---------------------------------------------------------------------------
// Import controller
// ---------------------------------------------------------------------------

impl<S: Storage> WarRoom<S> {
    /// Merge the contacts and pipeline of a full backup into the current
    /// document. Ids are kept, so exporting and restoring reproduces the same
    /// records. Other top-level fields are left alone.
    pub fn restore_backup(&mut self, backup: UserState) -> Result<ImportReport> {
        let mut report = ImportReport::new(ImportMode::Restore);
        let mut contacts = self.state().contacts.clone();
        let mut pipeline = self.state().pipeline.clone();

        let (valid_contacts, invalid_contacts): (Vec<Contact>, Vec<Contact>) = backup
            .contacts
            .into_iter()
            .partition(|c| c.validate().is_ok());
        let (valid_deals, invalid_deals): (Vec<Deal>, Vec<Deal>) = backup
            .pipeline
            .into_iter()
            .partition(|d| d.validate().is_ok());
        report.skipped = invalid_contacts.len() + invalid_deals.len();
        for c in &invalid_contacts {
            tracing::warn!(id = %c.id, "skipping invalid contact in backup");
        }
        for d in &invalid_deals {
            tracing::warn!(id = %d.id, "skipping invalid deal in backup");
        }

        (report.contacts_added, report.contacts_replaced) =
            merge_by_id(&mut contacts, valid_contacts, |c| c.id.as_str());
        (report.deals_added, report.deals_replaced) =
            merge_by_id(&mut pipeline, valid_deals, |d| d.id.as_str());

        self.commit(StatePatch {
            contacts: Some(contacts),
            pipeline: Some(pipeline),
            ..Default::default()
        })?;
        self.announce_import(&report);
        Ok(report)
    }

    /// Append extracted records under fresh `imp-` ids. Records missing a
    /// required field are counted in `skipped`.
    pub fn append_bulk(&mut self, bulk: BulkImport) -> Result<ImportReport> {
        let mut report = ImportReport::new(ImportMode::Append);
        let mut contacts = self.state().contacts.clone();
        let mut pipeline = self.state().pipeline.clone();
        let now = Utc::now().to_rfc3339();

        for partial in bulk.contacts {
            match partial.into_contact(new_import_id()) {
                Some(c) => {
                    contacts.push(c);
                    report.contacts_added += 1;
                }
                None => report.skipped += 1,
            }
        }
        for partial in bulk.deals {
            match partial.into_deal(new_import_id(), self.board.default_probability, now.clone()) {
                Some(d) => {
                    pipeline.push(d);
                    report.deals_added += 1;
                }
                None => report.skipped += 1,
            }
        }

        if report.contacts() + report.deals() > 0 {
            self.commit(StatePatch {
                contacts: Some(contacts),
                pipeline: Some(pipeline),
                ..Default::default()
            })?;
        }
        self.announce_import(&report);
        Ok(report)
    }

    fn announce_import(&mut self, report: &ImportReport) {
        tracing::info!(
            mode = ?report.mode,
            contacts = report.contacts(),
            deals = report.deals(),
            skipped = report.skipped,
            "import complete"
        );
        self.notifier.success(
            "Data Vault Ingestion",
            &format!(
                "Imported {} identities and {} opportunities.",
                report.contacts(),
                report.deals()
            ),
        );
        if report.skipped > 0 {
            self.notifier.warning(
                "Partial Ingestion",
                &format!("{} records were missing required fields.", report.skipped),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::notify::ManualClock;
    use crate::storage::MemoryStorage;
    use chrono::TimeZone;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn room() -> WarRoom<MemoryStorage> {
        let clock = ManualClock::new(Utc::now());
        WarRoom::open(MemoryStorage::new(), &Config::default(), Arc::new(clock)).unwrap()
    }

    fn seeded() -> WarRoom<MemoryStorage> {
        let mut room = room();
        room.create_contact(ContactDraft::new("Minh Pham", "NVIDIA"))
            .unwrap();
        room.create_deal(DealDraft {
            value: Some(240_000.0),
            probability: Some(30),
            stage: Some(Stage::Applied),
            ..DealDraft::new("eBay", "Sr Mgr")
        })
        .unwrap();
        room
    }

    #[test]
    fn filename_uses_utc_timestamp() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap();
        assert_eq!(export_filename(at), "warroom_backup_2026-10-19T08-30-00Z.json");
    }

    #[test]
    fn export_then_restore_into_empty_document_is_identical() {
        let source = seeded();
        let text = export_json(source.state()).unwrap();

        let mut target = room();
        let backup = parse_backup(&text).expect("full backup shape");
        let report = target.restore_backup(backup).unwrap();
        assert_eq!(report.mode, ImportMode::Restore);
        assert_eq!(report.contacts_added, 1);
        assert_eq!(report.deals_added, 1);

        assert_eq!(target.state().contacts, source.state().contacts);
        assert_eq!(target.state().pipeline, source.state().pipeline);
    }

    #[test]
    fn restore_replaces_matching_ids() {
        let mut room = seeded();
        let mut backup = room.state().clone();
        backup.pipeline[0].value = 1.0;

        let report = room.restore_backup(backup).unwrap();
        assert_eq!(report.deals_replaced, 1);
        assert_eq!(report.deals_added, 0);
        assert_eq!(room.state().pipeline.len(), 1);
        assert_eq!(room.state().pipeline[0].value, 1.0);
    }

    #[test]
    fn restore_counts_invalid_records_as_skipped() {
        let text = r#"{
            "contacts": [{"id": "c1", "name": "", "company": "X"}],
            "pipeline": [
                {"id": "j1", "company": "Acme"},
                {"id": "j2", "company": "Stripe", "role": "AE", "value": 1000, "probability": 20}
            ]
        }"#;
        let mut room = room();
        let report = room.restore_backup(parse_backup(text).unwrap()).unwrap();
        assert_eq!(report.deals_added, 1);
        assert_eq!(report.contacts_added, 0);
        assert_eq!(report.skipped, 2);

        let titles: Vec<&str> = room
            .notifier()
            .active()
            .iter()
            .map(|n| n.title.as_str())
            .collect();
        assert!(titles.contains(&"Partial Ingestion"));
        assert_eq!(room.state().pipeline[0].id, "j2");
    }

    #[test]
    fn export_to_writes_file() {
        let dir = TempDir::new().unwrap();
        let room = seeded();
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let path = export_to(dir.path(), room.state(), at).unwrap();
        assert!(path.ends_with("warroom_backup_2026-01-02T03-04-05Z.json"));
        let text = std::fs::read_to_string(path).unwrap();
        assert!(parse_backup(&text).is_some());
    }

    #[test]
    fn non_backup_text_is_not_a_backup() {
        assert!(parse_backup("name,company\nMinh,NVIDIA").is_none());
        assert!(parse_backup(r#"{"contacts": []}"#).is_none());
        assert!(parse_backup(r#"[1,2]"#).is_none());
        assert!(parse_backup(r#"{"contacts": [], "pipeline": []}"#).is_some());
    }

    #[test]
    fn bulk_records_parse_leniently() {
        let json = r#"{
            "contacts": [{"name": "Ed Carr", "company": "Carr Search", "tier": 2, "status": "warm"}],
            "deals": [{"company": "Stripe", "role": "AE", "value": "$180,000", "probability": "65%", "stage": "interviewing"}]
        }"#;
        let bulk: BulkImport = serde_json::from_str(json).unwrap();
        assert_eq!(bulk.contacts[0].tier, Some(Tier::Two));
        assert_eq!(bulk.deals[0].value, Some(180_000.0));
        assert_eq!(bulk.deals[0].probability, Some(65.0));
        assert_eq!(bulk.deals[0].stage, Some(Stage::Interview));
    }

    #[test]
    fn append_assigns_fresh_ids_and_skips_incomplete_records() {
        let mut room = seeded();
        let bulk = BulkImport {
            contacts: vec![
                PartialContact {
                    name: Some("Ed Carr".into()),
                    company: Some("Carr Search".into()),
                    ..Default::default()
                },
                PartialContact {
                    name: Some("No Company".into()),
                    ..Default::default()
                },
            ],
            deals: vec![PartialDeal {
                company: Some("Stripe".into()),
                role: Some("AE".into()),
                probability: Some(250.0),
                ..Default::default()
            }],
        };

        let report = room.append_bulk(bulk).unwrap();
        assert_eq!(report.mode, ImportMode::Append);
        assert_eq!(report.contacts_added, 1);
        assert_eq!(report.deals_added, 1);
        assert_eq!(report.skipped, 1);

        let state = room.state();
        assert_eq!(state.contacts.len(), 2);
        assert_eq!(state.pipeline.len(), 2);
        let imported = state.pipeline.last().unwrap();
        assert!(imported.id.starts_with("imp-"));
        assert_eq!(imported.probability, 100);
        assert_eq!(imported.stage, Stage::Target);
        assert!(state.contacts.last().unwrap().id.starts_with("imp-"));
    }

    #[test]
    fn empty_bulk_writes_nothing() {
        let mut room = seeded();
        let revision = room.store().revision();
        let report = room.append_bulk(BulkImport::default()).unwrap();
        assert_eq!(report.contacts() + report.deals(), 0);
        assert_eq!(room.store().revision(), revision);
    }
}
