//! Aggregate views over the pipeline and contacts.
//!
//! Everything here is a pure function of its inputs and is recomputed on every
//! read. Nothing is cached, so there is nothing to invalidate.

use crate::contact::Contact;
use crate::deal::Deal;
use crate::types::{ContactStatus, Stage, Tier};
use serde::Serialize;
use std::collections::BTreeMap;

pub fn total_value(deals: &[Deal]) -> f64 {
    deals.iter().map(|d| d.value).sum()
}

pub fn expected_value(deal: &Deal) -> f64 {
    deal.expected_value()
}

/// Probability-weighted forecast: the sum of every deal's expected value.
pub fn weighted_value(deals: &[Deal]) -> f64 {
    deals.iter().map(Deal::expected_value).sum()
}

/// Sum of deal values per stage. Every stage is present, in board order, even
/// when it holds no deals.
pub fn stage_funnel(deals: &[Deal]) -> BTreeMap<Stage, f64> {
    let mut funnel: BTreeMap<Stage, f64> = Stage::all().iter().map(|s| (*s, 0.0)).collect();
    for deal in deals {
        *funnel.entry(deal.stage).or_insert(0.0) += deal.value;
    }
    funnel
}

pub fn stage_counts(deals: &[Deal]) -> BTreeMap<Stage, usize> {
    let mut counts: BTreeMap<Stage, usize> = Stage::all().iter().map(|s| (*s, 0)).collect();
    for deal in deals {
        *counts.entry(deal.stage).or_insert(0) += 1;
    }
    counts
}

/// Mean probability, 0 for an empty pipeline.
pub fn average_probability(deals: &[Deal]) -> f64 {
    if deals.is_empty() {
        return 0.0;
    }
    let sum: f64 = deals.iter().map(|d| f64::from(d.probability)).sum();
    sum / deals.len() as f64
}

/// Share of deals sitting in Closed, as a percentage. 0 for an empty pipeline.
pub fn win_rate(deals: &[Deal]) -> f64 {
    if deals.is_empty() {
        return 0.0;
    }
    let closed = deals.iter().filter(|d| d.stage == Stage::Closed).count();
    closed as f64 / deals.len() as f64 * 100.0
}

/// Weighted forecast as a percentage of the revenue target, clamped to 0..=100.
pub fn target_progress(deals: &[Deal], revenue_target: f64) -> f64 {
    if !revenue_target.is_finite() || revenue_target <= 0.0 {
        return 0.0;
    }
    (weighted_value(deals) / revenue_target * 100.0).clamp(0.0, 100.0)
}

pub fn tier_counts(contacts: &[Contact]) -> BTreeMap<Tier, usize> {
    let mut counts: BTreeMap<Tier, usize> = Tier::all().iter().map(|t| (*t, 0)).collect();
    for c in contacts {
        *counts.entry(c.tier).or_insert(0) += 1;
    }
    counts
}

/// Contacts per status. Only statuses that occur are listed.
pub fn status_counts(contacts: &[Contact]) -> BTreeMap<ContactStatus, usize> {
    let mut counts = BTreeMap::new();
    for c in contacts {
        *counts.entry(c.status).or_insert(0) += 1;
    }
    counts
}

// ---------------------------------------------------------------------------
// PipelineSummary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSummary {
    pub deal_count: usize,
    pub contact_count: usize,
    pub total_value: f64,
    pub weighted_value: f64,
    pub average_probability: f64,
    pub win_rate: f64,
    pub revenue_target: f64,
    pub target_progress: f64,
    pub funnel: BTreeMap<Stage, f64>,
    pub stage_counts: BTreeMap<Stage, usize>,
    pub tier_counts: BTreeMap<Tier, usize>,
}

impl PipelineSummary {
    pub fn compute(deals: &[Deal], contacts: &[Contact], revenue_target: f64) -> Self {
        Self {
            deal_count: deals.len(),
            contact_count: contacts.len(),
            total_value: total_value(deals),
            weighted_value: weighted_value(deals),
            average_probability: average_probability(deals),
            win_rate: win_rate(deals),
            revenue_target,
            target_progress: target_progress(deals, revenue_target),
            funnel: stage_funnel(deals),
            stage_counts: stage_counts(deals),
            tier_counts: tier_counts(contacts),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::ContactDraft;
    use crate::deal::DealDraft;

    fn deal(stage: Stage, value: f64, probability: u8) -> Deal {
        DealDraft {
            stage: Some(stage),
            value: Some(value),
            probability: Some(probability),
            ..DealDraft::new("Acme", "AE")
        }
        .into_deal(crate::deal::new_deal_id(), 10, "t".into())
    }

    #[test]
    fn empty_collections_are_zero() {
        assert_eq!(average_probability(&[]), 0.0);
        assert_eq!(weighted_value(&[]), 0.0);
        assert_eq!(total_value(&[]), 0.0);
        assert_eq!(win_rate(&[]), 0.0);
        let funnel = stage_funnel(&[]);
        assert_eq!(funnel.len(), 5);
        assert!(funnel.values().all(|v| *v == 0.0));
    }

    #[test]
    fn weighted_value_and_funnel_for_two_deals() {
        let deals = vec![
            deal(Stage::Applied, 100_000.0, 50),
            deal(Stage::Offer, 200_000.0, 80),
        ];
        assert_eq!(weighted_value(&deals), 210_000.0);

        let funnel = stage_funnel(&deals);
        let expected: Vec<(Stage, f64)> = vec![
            (Stage::Target, 0.0),
            (Stage::Applied, 100_000.0),
            (Stage::Interview, 0.0),
            (Stage::Offer, 200_000.0),
            (Stage::Closed, 0.0),
        ];
        assert_eq!(funnel.into_iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn funnel_partitions_total_value() {
        let deals = vec![
            deal(Stage::Closed, 10.0, 100),
            deal(Stage::Target, 7.5, 10),
            deal(Stage::Interview, 1_000.0, 40),
            deal(Stage::Target, 0.0, 0),
            deal(Stage::Closed, 333.0, 90),
        ];
        let funnel_sum: f64 = stage_funnel(&deals).values().sum();
        assert_eq!(funnel_sum, total_value(&deals));
        let count_sum: usize = stage_counts(&deals).values().sum();
        assert_eq!(count_sum, deals.len());
    }

    #[test]
    fn funnel_order_ignores_insertion_order() {
        let deals = vec![deal(Stage::Closed, 1.0, 1), deal(Stage::Target, 1.0, 1)];
        let stages: Vec<Stage> = stage_funnel(&deals).into_keys().collect();
        assert_eq!(stages, Stage::all());
    }

    #[test]
    fn average_and_win_rate() {
        let deals = vec![
            deal(Stage::Closed, 1.0, 100),
            deal(Stage::Applied, 1.0, 20),
            deal(Stage::Applied, 1.0, 30),
            deal(Stage::Offer, 1.0, 50),
        ];
        assert_eq!(average_probability(&deals), 50.0);
        assert_eq!(win_rate(&deals), 25.0);
    }

    #[test]
    fn target_progress_is_clamped() {
        let deals = vec![deal(Stage::Offer, 400_000.0, 50)];
        assert_eq!(target_progress(&deals, 400_000.0), 50.0);
        assert_eq!(target_progress(&deals, 100_000.0), 100.0);
        assert_eq!(target_progress(&deals, 0.0), 0.0);
    }

    #[test]
    fn contact_breakdowns() {
        let mut warm = ContactDraft::new("A", "X").into_contact("c1".into());
        warm.status = ContactStatus::Warm;
        warm.tier = Tier::Two;
        let plain = ContactDraft::new("B", "Y").into_contact("c2".into());
        let contacts = vec![warm, plain];

        let tiers = tier_counts(&contacts);
        assert_eq!(tiers[&Tier::One], 1);
        assert_eq!(tiers[&Tier::Two], 1);
        assert_eq!(tiers[&Tier::Three], 0);

        let statuses = status_counts(&contacts);
        assert_eq!(statuses[&ContactStatus::Warm], 1);
        assert_eq!(statuses[&ContactStatus::Active], 1);
        assert!(!statuses.contains_key(&ContactStatus::Cold));
    }

    #[test]
    fn summary_bundles_everything() {
        let deals = vec![deal(Stage::Applied, 100_000.0, 50)];
        let s = PipelineSummary::compute(&deals, &[], 1_000_000.0);
        assert_eq!(s.deal_count, 1);
        assert_eq!(s.weighted_value, 50_000.0);
        assert_eq!(s.target_progress, 5.0);
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["funnel"]["Applied"], 100_000.0);
        assert_eq!(json["tierCounts"]["1"], 0);
    }
}
