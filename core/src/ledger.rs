//! Audit ledger records and projections.
//!
//! RULE: The ledger is append-only. The store exposes insert and
//! select for audit records; no update or delete exists anywhere in
//! the codebase. Display sorts are re-projections and never touch the
//! underlying append order, which stays observable through `seq`.

use crate::{decision::DecisionOutcome, reviewer_role::ReviewerRole, types::CaseId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One committed decision. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Append position, assigned by the store. None before insert.
    pub seq:        Option<i64>,
    /// Unique identifier minted at commit time.
    pub record_id:  String,
    pub case_id:    CaseId,
    pub outcome:    DecisionOutcome,
    pub actor_role: ReviewerRole,
    pub note:       String,
    pub decided_at: DateTime<Utc>,
}

/// Display sort key for ledger listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerSortKey {
    DecidedAt,
    CaseId,
    ActorRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Derived counts over the ledger. Computed on demand, never a
/// maintained counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub total:      i64,
    pub accepted:   i64,
    pub overridden: i64,
}
