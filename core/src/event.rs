//! Engine events — everything externally observable.
//!
//! RULE: Every state change is recorded in the event log. Variants are
//! added as the desk grows — never removed or reordered. The stale
//! fetch guard's outcome is an event here, not an error: discarding a
//! late response is normal operation that still has to be traceable.

use crate::{
    decision::DecisionOutcome,
    intake::{CaseEventKind, RiskBand},
    reviewer_role::ReviewerRole,
    types::{CaseId, Seq, SessionId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeskEvent {
    // ── Session events ─────────────────────────────
    SessionStarted {
        session_id: SessionId,
        seed: u64,
    },
    CaseAdmitted {
        seq: Seq,
        case_id: CaseId,
        band: RiskBand,
    },

    // ── Selection and lifecycle events ─────────────
    CaseSelected {
        seq: Seq,
        case_id: CaseId,
    },
    ReviewOpened {
        seq: Seq,
        case_id: CaseId,
    },
    ResolvedCaseRevisited {
        seq: Seq,
        case_id: CaseId,
    },

    // ── Assessment events ──────────────────────────
    AssessmentRecorded {
        seq: Seq,
        case_id: CaseId,
        generation: u64,
        score: i64,
        level: RiskBand,
    },
    AssessmentFetchFailed {
        seq: Seq,
        case_id: CaseId,
        reason: String,
    },
    StaleAssessmentDiscarded {
        seq: Seq,
        case_id: CaseId,
        generation: u64,
        current_generation: u64,
    },

    // ── Evidence and decision events ───────────────
    CaseEventSimulated {
        seq: Seq,
        case_id: CaseId,
        kind: CaseEventKind,
    },
    DecisionCommitted {
        seq: Seq,
        case_id: CaseId,
        outcome: DecisionOutcome,
        actor_role: ReviewerRole,
    },
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub session_id: SessionId,
    pub seq: Seq,
    pub source: String,
    pub event_type: String,
    pub payload: String, // JSON-serialized DeskEvent
    pub recorded_at: DateTime<Utc>,
}
