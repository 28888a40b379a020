//! Pipeline board: deal create/edit/delete, stage moves, and selection.

use crate::app::WarRoom;
use crate::deal::{self, Deal, DealDraft, DealPatch};
use crate::error::{Result, WarRoomError};
use crate::notify::NotifyKind;
use crate::state::StatePatch;
use crate::storage::Storage;
use crate::types::Stage;
use chrono::Utc;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Destructive actions take an explicit confirmation instead of prompting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Pending,
    Confirmed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome<T> {
    Deleted(T),
    NeedsConfirmation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved { from: Stage, to: Stage },
    /// The deal was already in the target stage.
    Unchanged,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardColumn<'a> {
    pub stage: Stage,
    pub deals: Vec<&'a Deal>,
    pub total: f64,
}

/// Partition deals into one column per stage, in board order.
pub fn columns(deals: &[Deal]) -> Vec<BoardColumn<'_>> {
    Stage::all()
        .iter()
        .map(|&stage| {
            let in_stage: Vec<&Deal> = deals.iter().filter(|d| d.stage == stage).collect();
            let total = in_stage.iter().map(|d| d.value).sum();
            BoardColumn {
                stage,
                deals: in_stage,
                total,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Board controller
// ---------------------------------------------------------------------------

impl<S: Storage> WarRoom<S> {
    pub fn columns(&self) -> Vec<BoardColumn<'_>> {
        columns(&self.state().pipeline)
    }

    pub fn deal(&self, id: &str) -> Option<&Deal> {
        deal::find(&self.state().pipeline, id)
    }

    /// Validate and append a new deal, awarding XP.
    pub fn create_deal(&mut self, draft: DealDraft) -> Result<Deal> {
        let new = draft.into_deal(
            deal::new_deal_id(),
            self.board.default_probability,
            Utc::now().to_rfc3339(),
        );
        if let Err(e) = new.validate() {
            return Err(self.reject(e));
        }

        let mut pipeline = self.state().pipeline.clone();
        pipeline.push(new.clone());
        let patch = self.xp_award(self.board.xp_per_deal, StatePatch::pipeline(pipeline));
        self.commit(patch)?;

        tracing::info!(id = %new.id, company = %new.company, "deal created");
        self.notifier.success(
            "Opportunity Synchronized",
            &format!("{} added to {}", new.company, new.stage),
        );
        Ok(new)
    }

    /// Merge `patch` into the deal with `id`. The merged record must still
    /// validate or nothing is written.
    pub fn edit_deal(&mut self, id: &str, patch: DealPatch) -> Result<Deal> {
        let mut pipeline = self.state().pipeline.clone();
        let target = deal::find_mut(&mut pipeline, id)?;
        patch.apply_to(target);
        target.last_enriched = Some(Utc::now().to_rfc3339());
        if let Err(e) = target.validate() {
            return Err(self.reject(e));
        }
        let updated = target.clone();

        self.commit(StatePatch::pipeline(pipeline))?;
        tracing::info!(id = %updated.id, "deal updated");
        self.notifier
            .success("Matrix Updated", &format!("{} saved", updated.company));
        Ok(updated)
    }

    pub fn delete_deal(
        &mut self,
        id: &str,
        confirmation: Confirmation,
    ) -> Result<DeleteOutcome<Deal>> {
        let Some(position) = self.state().pipeline.iter().position(|d| d.id == id) else {
            return Err(WarRoomError::DealNotFound(id.to_string()));
        };
        if confirmation == Confirmation::Pending {
            return Ok(DeleteOutcome::NeedsConfirmation);
        }

        let mut pipeline = self.state().pipeline.clone();
        let removed = pipeline.remove(position);
        self.commit(StatePatch::pipeline(pipeline))?;

        if self.selected_deal.as_deref() == Some(id) {
            self.selected_deal = None;
        }
        tracing::info!(id = %removed.id, "deal deleted");
        self.notifier
            .warning("Node Purged", &format!("{} removed from pipeline", removed.company));
        Ok(DeleteOutcome::Deleted(removed))
    }

    /// Drop a deal onto a stage column. Only the id travels with the drag;
    /// the deal is looked up fresh here.
    pub fn move_deal(&mut self, id: &str, stage: Stage) -> Result<MoveOutcome> {
        let mut pipeline = self.state().pipeline.clone();
        let Some(target) = pipeline.iter_mut().find(|d| d.id == id) else {
            return Ok(MoveOutcome::NotFound);
        };
        let from = target.stage;
        if from == stage {
            return Ok(MoveOutcome::Unchanged);
        }
        target.stage = stage;
        let company = target.company.clone();

        self.commit(StatePatch::pipeline(pipeline))?;
        tracing::info!(%id, %from, to = %stage, "deal moved");
        self.notifier
            .info("Stage Advanced", &format!("Moved {company} to {stage}"));
        if stage == Stage::Closed {
            self.notifier.notify_after(
                self.board.closed_celebration(),
                NotifyKind::Success,
                "Revenue Captured",
                &format!("{company} closed."),
            );
        }
        Ok(MoveOutcome::Moved { from, to: stage })
    }

    /// Select a deal by id, or clear the selection with `None`.
    pub fn select_deal(&mut self, id: Option<&str>) {
        self.selected_deal = id.map(str::to_string);
    }

    /// The selected deal as it currently stands in the pipeline. A selection
    /// whose deal has since been removed resolves to `None`.
    pub fn selected_deal(&self) -> Option<&Deal> {
        self.selected_deal.as_deref().and_then(|id| self.deal(id))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::metrics;
    use crate::notify::ManualClock;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;
    use std::time::Duration;

    fn room() -> (WarRoom<MemoryStorage>, MemoryStorage, ManualClock) {
        let storage = MemoryStorage::new();
        let clock = ManualClock::new(Utc::now());
        let room =
            WarRoom::open(storage.clone(), &Config::default(), Arc::new(clock.clone())).unwrap();
        (room, storage, clock)
    }

    fn draft(company: &str, stage: Stage, value: f64, probability: u8) -> DealDraft {
        DealDraft {
            stage: Some(stage),
            value: Some(value),
            probability: Some(probability),
            ..DealDraft::new(company, "AE")
        }
    }

    #[test]
    fn create_defaults_to_target_and_lands_in_target_column() {
        let (mut room, _, _) = room();
        let d = room
            .create_deal(DealDraft {
                value: Some(100_000.0),
                probability: Some(50),
                ..DealDraft::new("Acme", "AE")
            })
            .unwrap();

        assert_eq!(d.stage, Stage::Target);
        assert_eq!(metrics::expected_value(&d), 50_000.0);
        let cols = room.columns();
        assert_eq!(cols[0].stage, Stage::Target);
        assert_eq!(cols[0].total, 100_000.0);
        assert_eq!(cols[0].deals[0].id, d.id);
    }

    #[test]
    fn create_awards_xp_and_notifies() {
        let (mut room, _, _) = room();
        room.create_deal(DealDraft::new("Acme", "AE")).unwrap();
        assert_eq!(room.state().xp, 50);
        assert_eq!(room.state().pipeline[0].probability, 10);
        let active = room.notifier().active();
        assert_eq!(active[0].title, "Opportunity Synchronized");
    }

    #[test]
    fn create_rejects_blank_company_without_writing() {
        let (mut room, storage, _) = room();
        let err = room.create_deal(DealDraft::new("  ", "AE")).unwrap_err();
        assert!(matches!(err, WarRoomError::Validation(_)));
        assert!(room.state().pipeline.is_empty());
        assert_eq!(room.state().xp, 0);
        assert_eq!(storage.raw(crate::paths::STATE_KEY), None);

        let active = room.notifier().active();
        assert_eq!(active[0].kind, NotifyKind::Error);
        assert_eq!(active[0].title, "Validation Failed");
    }

    #[test]
    fn create_rejects_probability_over_100() {
        let (mut room, _, _) = room();
        assert!(room.create_deal(draft("Acme", Stage::Target, 1.0, 101)).is_err());
        assert!(room.state().pipeline.is_empty());
    }

    #[test]
    fn edit_merges_in_place_and_revalidates() {
        let (mut room, _, _) = room();
        let d = room.create_deal(draft("Acme", Stage::Applied, 1.0, 10)).unwrap();

        let updated = room
            .edit_deal(
                &d.id,
                DealPatch {
                    value: Some(250_000.0),
                    next_step: Some("Send deck".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.id, d.id);
        assert_eq!(updated.value, 250_000.0);
        assert_eq!(updated.stage, Stage::Applied);

        let err = room
            .edit_deal(
                &d.id,
                DealPatch {
                    role: Some(String::new()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, WarRoomError::Validation(_)));
        assert_eq!(room.deal(&d.id).unwrap().role, "AE");
    }

    #[test]
    fn edit_unknown_id_is_not_found() {
        let (mut room, _, _) = room();
        let err = room.edit_deal("nope", DealPatch::default()).unwrap_err();
        assert!(matches!(err, WarRoomError::DealNotFound(_)));
    }

    #[test]
    fn delete_requires_confirmation_and_clears_selection() {
        let (mut room, _, _) = room();
        let d = room.create_deal(DealDraft::new("Acme", "AE")).unwrap();
        room.select_deal(Some(&d.id));

        let outcome = room.delete_deal(&d.id, Confirmation::Pending).unwrap();
        assert_eq!(outcome, DeleteOutcome::NeedsConfirmation);
        assert_eq!(room.state().pipeline.len(), 1);

        let outcome = room.delete_deal(&d.id, Confirmation::Confirmed).unwrap();
        assert!(matches!(outcome, DeleteOutcome::Deleted(ref gone) if gone.id == d.id));
        assert!(room.state().pipeline.is_empty());
        assert!(room.selected_deal().is_none());
        let last = room.notifier().active().last().map(|n| n.kind);
        assert_eq!(last, Some(NotifyKind::Warning));
    }

    #[test]
    fn move_to_closed_notifies_now_and_later() {
        let (mut room, _, clock) = room();
        let d = room.create_deal(draft("Acme", Stage::Interview, 1.0, 60)).unwrap();
        let before = room.notifier().active().len();

        let outcome = room.move_deal(&d.id, Stage::Closed).unwrap();
        assert_eq!(
            outcome,
            MoveOutcome::Moved {
                from: Stage::Interview,
                to: Stage::Closed
            }
        );
        assert_eq!(room.deal(&d.id).unwrap().stage, Stage::Closed);
        assert_eq!(room.notifier().active().len(), before + 1);

        clock.advance(Duration::from_millis(500));
        room.notifier_mut().tick();
        let active = room.notifier().active();
        assert_eq!(active.len(), before + 2);
        let fresh: Vec<(NotifyKind, &str)> = active[before..]
            .iter()
            .map(|n| (n.kind, n.title.as_str()))
            .collect();
        assert_eq!(
            fresh,
            [
                (NotifyKind::Info, "Stage Advanced"),
                (NotifyKind::Success, "Revenue Captured")
            ]
        );
    }

    #[test]
    fn same_stage_drop_is_a_no_op() {
        let (mut room, storage, _) = room();
        let d = room.create_deal(draft("Acme", Stage::Offer, 1.0, 60)).unwrap();
        let snapshot = storage.raw(crate::paths::STATE_KEY);
        let revision = room.store().revision();
        let notes = room.notifier().active().len();

        assert_eq!(room.move_deal(&d.id, Stage::Offer).unwrap(), MoveOutcome::Unchanged);
        assert_eq!(storage.raw(crate::paths::STATE_KEY), snapshot);
        assert_eq!(room.store().revision(), revision);
        assert_eq!(room.notifier().active().len(), notes);
    }

    #[test]
    fn move_unknown_id_is_not_found() {
        let (mut room, _, _) = room();
        assert_eq!(
            room.move_deal("missing", Stage::Closed).unwrap(),
            MoveOutcome::NotFound
        );
    }

    #[test]
    fn selection_tracks_live_record() {
        let (mut room, _, _) = room();
        let d = room.create_deal(DealDraft::new("Acme", "AE")).unwrap();
        room.select_deal(Some(&d.id));
        room.move_deal(&d.id, Stage::Applied).unwrap();
        assert_eq!(room.selected_deal().unwrap().stage, Stage::Applied);
    }

    #[test]
    fn columns_partition_every_deal() {
        let (mut room, _, _) = room();
        for (i, stage) in Stage::all().iter().enumerate() {
            room.create_deal(draft(&format!("Co{i}"), *stage, 1_000.0, 10))
                .unwrap();
        }
        room.create_deal(draft("Extra", Stage::Offer, 500.0, 10)).unwrap();

        let cols = room.columns();
        assert_eq!(cols.len(), 5);
        let placed: usize = cols.iter().map(|c| c.deals.len()).sum();
        assert_eq!(placed, room.state().pipeline.len());
        let total: f64 = cols.iter().map(|c| c.total).sum();
        assert_eq!(total, metrics::total_value(&room.state().pipeline));
    }

    #[test]
    fn save_failure_raises_notification() {
        let (mut room, storage, _) = room();
        storage.fail_writes(true);
        let err = room.create_deal(DealDraft::new("Acme", "AE")).unwrap_err();
        assert!(err.is_persistence());
        assert!(room.store().is_dirty());
        let titles: Vec<&str> = room
            .notifier()
            .active()
            .iter()
            .map(|n| n.title.as_str())
            .collect();
        assert_eq!(titles, ["Save Failed"]);
    }
}
