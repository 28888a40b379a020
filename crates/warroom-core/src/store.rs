use crate::error::{Result, WarRoomError};
use crate::migrations;
use crate::paths::STATE_KEY;
use crate::state::{StatePatch, UserState};
use crate::storage::Storage;
use std::collections::HashSet;

/// Owner of the single in-memory [`UserState`] and its backing storage.
///
/// Every controller mutation goes through [`Store::apply`]: merge, then write
/// the whole document back. The store is a plain owned value, so one apply
/// can never interleave with another.
#[derive(Debug)]
pub struct Store<S: Storage> {
    storage: S,
    state: UserState,
    revision: u64,
    dirty: bool,
}

impl<S: Storage> Store<S> {
    /// Read the document from `storage`.
    ///
    /// An absent document yields the default one. A document that cannot be
    /// parsed is logged and replaced by the default in memory; storage is not
    /// touched until the next write. A document from a newer schema is an
    /// error, so it is never silently overwritten.
    pub fn load(storage: S) -> Result<Self> {
        let state = match storage.get(STATE_KEY) {
            Ok(None) => {
                tracing::debug!("no stored document, starting from defaults");
                UserState::default()
            }
            Ok(Some(raw)) => decode(&raw)?,
            Err(WarRoomError::Io(e)) if e.kind() == std::io::ErrorKind::InvalidData => {
                tracing::warn!(error = %e, "stored document is not valid UTF-8, using defaults");
                UserState::default()
            }
            Err(e) => return Err(e),
        };
        Ok(Self {
            storage,
            state,
            revision: 0,
            dirty: false,
        })
    }

    pub fn state(&self) -> &UserState {
        &self.state
    }

    /// Number of merges applied since load.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// True when the in-memory document holds changes the last write lost.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the full document under [`STATE_KEY`].
    pub fn persist(&mut self) -> Result<()> {
        let data = serde_json::to_string_pretty(&self.state)?;
        match self.storage.set(STATE_KEY, &data) {
            Ok(()) => {
                self.dirty = false;
                tracing::debug!(revision = self.revision, "persisted document");
                Ok(())
            }
            Err(e) => {
                self.dirty = true;
                tracing::warn!(error = %e, "failed to persist document");
                Err(e)
            }
        }
    }

    /// Merge `patch` and persist. The in-memory document keeps the merged
    /// value even when the write fails.
    pub fn apply(&mut self, patch: StatePatch) -> Result<()> {
        self.state.merge_in_place(patch);
        self.revision += 1;
        self.persist()
    }

    /// [`Store::apply`] guarded by the revision the caller last read.
    pub fn apply_at(&mut self, expected_revision: u64, patch: StatePatch) -> Result<()> {
        if expected_revision != self.revision {
            return Err(WarRoomError::StaleRevision {
                expected: expected_revision,
                actual: self.revision,
            });
        }
        self.apply(patch)
    }
}

fn decode(raw: &str) -> Result<UserState> {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "stored document is not valid JSON, using defaults");
            return Ok(UserState::default());
        }
    };

    let migrated = match migrations::migrate_document(value) {
        Ok(v) => v,
        Err(e @ WarRoomError::UnsupportedSchema(_)) => return Err(e),
        Err(e) => {
            tracing::warn!(error = %e, "stored document could not be migrated, using defaults");
            return Ok(UserState::default());
        }
    };

    match serde_json::from_value::<UserState>(migrated) {
        Ok(mut state) => {
            sanitize(&mut state);
            Ok(state)
        }
        Err(e) => {
            tracing::warn!(error = %e, "stored document has an unexpected shape, using defaults");
            Ok(UserState::default())
        }
    }
}

/// Restore the collection invariants on a freshly decoded document.
fn sanitize(state: &mut UserState) {
    let mut seen = HashSet::new();
    for deal in &mut state.pipeline {
        if deal.probability > 100 {
            tracing::warn!(id = %deal.id, probability = deal.probability, "clamping probability");
            deal.probability = 100;
        }
        if !deal.value.is_finite() || deal.value < 0.0 {
            tracing::warn!(id = %deal.id, value = deal.value, "resetting invalid value");
            deal.value = 0.0;
        }
        if !seen.insert(deal.id.clone()) {
            deal.id = crate::deal::new_deal_id();
            tracing::warn!(id = %deal.id, "regenerated duplicate deal id");
            seen.insert(deal.id.clone());
        }
    }

    seen.clear();
    for contact in &mut state.contacts {
        if !seen.insert(contact.id.clone()) {
            contact.id = crate::contact::new_contact_id();
            tracing::warn!(id = %contact.id, "regenerated duplicate contact id");
            seen.insert(contact.id.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deal::DealDraft;
    use crate::storage::{FileStorage, MemoryStorage};
    use tempfile::TempDir;

    #[test]
    fn absent_document_loads_defaults() {
        let store = Store::load(MemoryStorage::new()).unwrap();
        assert_eq!(store.state(), &UserState::default());
        assert_eq!(store.revision(), 0);
        assert!(!store.is_dirty());
    }

    #[test]
    fn corrupt_document_loads_defaults() {
        let storage = MemoryStorage::with_entry(STATE_KEY, "{not json");
        let store = Store::load(storage.clone()).unwrap();
        assert_eq!(store.state(), &UserState::default());
        // Nothing is written until the next mutation.
        assert_eq!(storage.raw(STATE_KEY).as_deref(), Some("{not json"));
    }

    #[test]
    fn wrong_shape_loads_defaults() {
        let storage = MemoryStorage::with_entry(STATE_KEY, r#"{"pipeline": 42}"#);
        let store = Store::load(storage).unwrap();
        assert!(store.state().pipeline.is_empty());
    }

    #[test]
    fn non_utf8_file_loads_defaults() {
        let dir = TempDir::new().unwrap();
        let path = crate::paths::key_path(dir.path(), STATE_KEY);
        std::fs::write(&path, [0xff, 0xfe, b'{']).unwrap();

        let store = Store::load(FileStorage::new(dir.path())).unwrap();
        assert_eq!(store.state(), &UserState::default());
        assert_eq!(std::fs::read(&path).unwrap(), vec![0xff, 0xfe, b'{']);
    }

    #[test]
    fn out_of_range_probability_keeps_the_rest_of_the_document() {
        let doc = r#"{"schemaVersion":2,"xp":900,"pipeline":[
            {"id":"d1","company":"A","role":"B","probability":300},
            {"id":"d2","company":"C","role":"D","probability":20}
        ]}"#;
        let store = Store::load(MemoryStorage::with_entry(STATE_KEY, doc)).unwrap();
        let state = store.state();
        assert_eq!(state.xp, 900);
        assert_eq!(state.pipeline.len(), 2);
        assert_eq!(state.pipeline[0].probability, 100);
        assert_eq!(state.pipeline[1].probability, 20);
    }

    #[test]
    fn newer_schema_refuses_to_load() {
        let storage = MemoryStorage::with_entry(STATE_KEY, r#"{"schemaVersion": 7}"#);
        let err = Store::load(storage).unwrap_err();
        assert!(matches!(err, WarRoomError::UnsupportedSchema(7)));
    }

    #[test]
    fn apply_persists_and_bumps_revision() {
        let storage = MemoryStorage::new();
        let mut store = Store::load(storage.clone()).unwrap();
        store
            .apply(StatePatch {
                xp: Some(50),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(store.revision(), 1);

        let reloaded = Store::load(storage).unwrap();
        assert_eq!(reloaded.state().xp, 50);
    }

    #[test]
    fn failed_write_keeps_memory_and_marks_dirty() {
        let storage = MemoryStorage::new();
        let mut store = Store::load(storage.clone()).unwrap();
        storage.fail_writes(true);

        let err = store
            .apply(StatePatch {
                name: Some("Operator".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(err.is_persistence());
        assert_eq!(store.state().name, "Operator");
        assert!(store.is_dirty());

        storage.fail_writes(false);
        store.persist().unwrap();
        assert!(!store.is_dirty());
    }

    #[test]
    fn apply_at_rejects_stale_revision() {
        let mut store = Store::load(MemoryStorage::new()).unwrap();
        let seen = store.revision();
        store.apply(StatePatch::default()).unwrap();

        let err = store.apply_at(seen, StatePatch::default()).unwrap_err();
        assert!(matches!(
            err,
            WarRoomError::StaleRevision { expected: 0, actual: 1 }
        ));
        store.apply_at(1, StatePatch::default()).unwrap();
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn file_backed_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut store = Store::load(FileStorage::new(dir.path())).unwrap();
        let deal = DealDraft::new("Acme", "AE").into_deal("d1".into(), 10, "t".into());
        store.apply(StatePatch::pipeline(vec![deal.clone()])).unwrap();

        let reloaded = Store::load(FileStorage::new(dir.path())).unwrap();
        assert_eq!(reloaded.state().pipeline, vec![deal]);
    }

    #[test]
    fn legacy_document_is_migrated_on_load() {
        let legacy = r#"{"pipeline":[{"id":"j1","company":"A","role":"B","stage":"Interviewing","probability":250}]}"#;
        let store = Store::load(MemoryStorage::with_entry(STATE_KEY, legacy)).unwrap();
        let state = store.state();
        assert_eq!(state.schema_version, migrations::CURRENT_SCHEMA_VERSION);
        assert_eq!(state.pipeline[0].probability, 100);
        assert_eq!(state.pipeline[0].stage, crate::types::Stage::Interview);
    }

    #[test]
    fn current_document_is_sanitized_on_load() {
        let doc = r#"{"schemaVersion":2,"pipeline":[
            {"id":"d1","company":"A","role":"B","probability":180},
            {"id":"d1","company":"C","role":"D","probability":20}
        ]}"#;
        let store = Store::load(MemoryStorage::with_entry(STATE_KEY, doc)).unwrap();
        let pipeline = &store.state().pipeline;
        assert_eq!(pipeline[0].probability, 100);
        assert_eq!(pipeline[0].id, "d1");
        assert_ne!(pipeline[1].id, "d1");
    }
}
