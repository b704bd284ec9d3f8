//! Queue ordering and filtering — the visible review queue.
//!
//! RULE: The queue is a pure projection. It is re-derived from the
//! store plus the transient filter parameters on every read and is
//! never stored independently.

use crate::{
    intake::RiskBand,
    lifecycle::CaseStatus,
    types::CaseId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Status facet on the filter bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFacet {
    All,
    /// High-band cases only.
    Urgent,
    /// Everything not yet resolved.
    Active,
    Resolved,
}

/// Tie-break applied within a band after the resolved/band keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortPreference {
    /// Newest intake first.
    IntakeDesc,
    /// Highest last observed trend score first.
    ScoreDesc,
}

/// Transient filter/sort parameters. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueFilter {
    pub search: String,
    pub band:   Option<RiskBand>,
    pub facet:  StatusFacet,
    pub sort:   SortPreference,
}

impl Default for QueueFilter {
    fn default() -> Self {
        Self {
            search: String::new(),
            band: None,
            facet: StatusFacet::All,
            sort: SortPreference::IntakeDesc,
        }
    }
}

/// One row of the visible queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    pub case_id:      CaseId,
    pub display_name: String,
    pub band:         RiskBand,
    pub status:       CaseStatus,
    pub intake_at:    DateTime<Utc>,
    /// Most recent trend observation; the numeric sort proxy.
    pub latest_score: i64,
}

/// The derived queue. `loaded` is the store's full case count, so an
/// empty `entries` distinguishes "filtered to nothing" from "no cases
/// loaded at all".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueView {
    pub loaded:  usize,
    pub entries: Vec<QueueEntry>,
}

impl QueueView {
    pub fn filtered_to_empty(&self) -> bool {
        self.loaded > 0 && self.entries.is_empty()
    }
}

/// Derive the visible queue from every loaded case (in store order)
/// and the current filter.
///
/// Sort keys, strict order, ties broken by the next key:
///   1. resolved cases after all non-resolved cases
///   2. band descending (High, Medium, Low)
///   3. the chosen preference, intake date or latest score descending
/// The sort is stable, so full ties keep store order (case id).
pub fn visible_queue(all: Vec<QueueEntry>, filter: &QueueFilter) -> QueueView {
    let loaded = all.len();
    let mut entries: Vec<QueueEntry> = all
        .into_iter()
        .filter(|entry| matches_filter(entry, filter))
        .collect();
    entries.sort_by(|a, b| queue_ordering(a, b, filter.sort));
    QueueView { loaded, entries }
}

fn matches_filter(entry: &QueueEntry, filter: &QueueFilter) -> bool {
    let needle = filter.search.trim().to_lowercase();
    let text_ok = needle.is_empty()
        || entry.display_name.to_lowercase().contains(&needle)
        || entry.case_id.to_lowercase().contains(&needle);

    let band_ok = filter.band.map_or(true, |band| entry.band == band);

    let facet_ok = match filter.facet {
        StatusFacet::All => true,
        StatusFacet::Urgent => entry.band == RiskBand::High,
        StatusFacet::Active => entry.status.is_active(),
        StatusFacet::Resolved => entry.status == CaseStatus::Resolved,
    };

    text_ok && band_ok && facet_ok
}

fn queue_ordering(a: &QueueEntry, b: &QueueEntry, sort: SortPreference) -> Ordering {
    a.status
        .is_terminal()
        .cmp(&b.status.is_terminal())
        .then_with(|| b.band.cmp(&a.band))
        .then_with(|| match sort {
            SortPreference::IntakeDesc => b.intake_at.cmp(&a.intake_at),
            SortPreference::ScoreDesc => b.latest_score.cmp(&a.latest_score),
        })
}
