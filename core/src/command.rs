use crate::{
    decision::DecisionOutcome,
    intake::{CaseEventKind, RiskBand},
    queue::{SortPreference, StatusFacet},
    reviewer_role::ReviewerRole,
};
use serde::{Deserialize, Serialize};

/// All analyst-issued commands — the engine's single dispatch surface.
/// Variants are added as the desk grows; never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum AnalystCommand {
    // ── Case review ───────────────────────────────
    SelectCase {
        case_id: String,
    },
    SimulateEvent {
        kind: CaseEventKind,
    },
    CommitDecision {
        outcome: DecisionOutcome,
        note: Option<String>,
    },

    // ── Working state ─────────────────────────────
    SetNote {
        text: String,
    },
    SetRole {
        role: ReviewerRole,
    },

    // ── Filter bar ────────────────────────────────
    SetSearch {
        text: String,
    },
    SetBandFilter {
        band: Option<RiskBand>,
    },
    SetFacet {
        facet: StatusFacet,
    },
    SetSort {
        sort: SortPreference,
    },
}
