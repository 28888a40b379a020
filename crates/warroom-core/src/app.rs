use crate::config::{BoardConfig, Config};
use crate::error::{Result, WarRoomError};
use crate::level::{level_for_xp, LevelInfo};
use crate::metrics::PipelineSummary;
use crate::notify::{Clock, Notifier};
use crate::state::{SessionRecord, StatePatch, UserState};
use crate::storage::Storage;
use crate::store::Store;
use std::sync::Arc;

/// The engine a host drives: the persisted store, the notification queue and
/// the small amount of view state the board keeps between actions.
///
/// Board and directory operations live in [`crate::board`] and
/// [`crate::directory`] as further `impl` blocks on this type.
#[derive(Debug)]
pub struct WarRoom<S: Storage> {
    pub(crate) store: Store<S>,
    pub(crate) notifier: Notifier,
    pub(crate) board: BoardConfig,
    /// Only the id is kept; the deal itself is resolved on every read.
    pub(crate) selected_deal: Option<String>,
}

impl<S: Storage> WarRoom<S> {
    pub fn new(store: Store<S>, notifier: Notifier, board: BoardConfig) -> Self {
        Self {
            store,
            notifier,
            board,
            selected_deal: None,
        }
    }

    /// Load the stored document and wire it up with `config`.
    pub fn open(storage: S, config: &Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let store = Store::load(storage)?;
        let notifier = Notifier::new(&config.notifications, clock);
        Ok(Self::new(store, notifier, config.board.clone()))
    }

    pub fn state(&self) -> &UserState {
        self.store.state()
    }

    pub fn store(&self) -> &Store<S> {
        &self.store
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut Notifier {
        &mut self.notifier
    }

    pub fn summary(&self) -> PipelineSummary {
        let state = self.state();
        PipelineSummary::compute(&state.pipeline, &state.contacts, state.revenue_target)
    }

    pub fn level(&self) -> LevelInfo {
        level_for_xp(self.state().xp)
    }

    /// Award XP for a scored practice session. A `score` also appends the
    /// session to the history and becomes the latest score.
    pub fn record_session(&mut self, score: Option<f64>, notes: &str) -> Result<LevelInfo> {
        let mut patch = StatePatch::default();
        if let Some(score) = score {
            let mut history = self.state().session_history.clone();
            history.push(SessionRecord {
                date: chrono::Utc::now().to_rfc3339(),
                score,
                notes: notes.to_string(),
            });
            patch.session_history = Some(history);
            patch.last_simulacrum_score = Some(score);
        }
        let amount = self.board.xp_per_session;
        let patch = self.xp_award(amount, patch);
        self.commit(patch)?;

        let level = self.level();
        tracing::info!(xp = level.xp, level = level.level, ?score, "session recorded");
        self.notifier
            .success("Session Scored", &format!("+{amount} XP, now {}", level.title));
        Ok(level)
    }

    /// Persist a patch, raising "Save Failed" when the write is lost.
    pub(crate) fn commit(&mut self, patch: StatePatch) -> Result<()> {
        self.store.apply(patch).inspect_err(|e| {
            if e.is_persistence() {
                self.notifier.error("Save Failed", &e.to_string());
            }
        })
    }

    /// Raise "Validation Failed" for `err` and hand it back to the caller.
    pub(crate) fn reject(&mut self, err: WarRoomError) -> WarRoomError {
        let detail = match &err {
            WarRoomError::Validation(msg) => capitalize(msg),
            other => other.to_string(),
        };
        self.notifier.error("Validation Failed", &detail);
        err
    }

    /// XP and level after adding `amount`, as a patch.
    pub(crate) fn xp_award(&self, amount: u64, mut patch: StatePatch) -> StatePatch {
        let xp = self.state().xp.saturating_add(amount);
        patch.xp = Some(xp);
        patch.level = Some(level_for_xp(xp).level);
        patch
    }
}

fn capitalize(msg: &str) -> String {
    let mut chars = msg.chars();
    match chars.next() {
        Some(first) => format!("{}{}.", first.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ManualClock;
    use crate::storage::MemoryStorage;

    fn room() -> WarRoom<MemoryStorage> {
        let clock = ManualClock::new(chrono::Utc::now());
        WarRoom::open(MemoryStorage::new(), &Config::default(), Arc::new(clock)).unwrap()
    }

    #[test]
    fn scored_session_awards_xp_and_records_history() {
        let mut room = room();
        let level = room.record_session(Some(92.0), "Strong close").unwrap();

        assert_eq!(level.xp, 500);
        assert_eq!(level.title, "Apprentice");
        assert_eq!(room.state().xp, 500);
        assert_eq!(room.state().level, 2);
        assert_eq!(room.state().last_simulacrum_score, 92.0);
        assert_eq!(room.state().session_history.len(), 1);
        assert_eq!(room.state().session_history[0].notes, "Strong close");
        assert_eq!(room.notifier().active()[0].title, "Session Scored");
    }

    #[test]
    fn unscored_session_still_awards_xp() {
        let mut room = room();
        room.record_session(None, "").unwrap();
        room.record_session(None, "").unwrap();

        assert_eq!(room.state().xp, 1000);
        assert!(room.state().session_history.is_empty());
        assert_eq!(room.state().last_simulacrum_score, 0.0);
    }
}
