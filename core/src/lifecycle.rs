//! Case lifecycle — NEW, IN-REVIEW, RESOLVED.
//!
//! RULES:
//!   - Forward progression only. There is no transition out of Resolved.
//!   - New -> InReview fires once per case, on first selection, and
//!     records the entry timestamp.
//!   - InReview -> Resolved fires only inside a committed decision.
//!   - Review aging is derived from the entry timestamp on read; it is
//!     never a stored field.

use crate::types::CaseId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    New,
    InReview,
    Resolved,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InReview => "in_review",
            Self::Resolved => "resolved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Self::New),
            "in_review" => Some(Self::InReview),
            "resolved" => Some(Self::Resolved),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::InReview => "In review",
            Self::Resolved => "Resolved",
        }
    }

    /// Resolved is terminal: no transition leaves it.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved)
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

/// One case's review progress as persisted in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleRecord {
    pub case_id:           CaseId,
    pub status:            CaseStatus,
    pub entered_review_at: Option<DateTime<Utc>>,
    pub resolved_at:       Option<DateTime<Utc>>,
}

impl LifecycleRecord {
    /// Whole minutes spent in review so far. None before first selection.
    pub fn review_age_minutes(&self, now: DateTime<Utc>) -> Option<i64> {
        self.entered_review_at
            .map(|entered| (now - entered).num_minutes().max(0))
    }

    /// SLA check against a configured review budget.
    pub fn is_overdue(&self, now: DateTime<Utc>, sla_minutes: i64) -> bool {
        self.status == CaseStatus::InReview
            && self
                .review_age_minutes(now)
                .is_some_and(|age| age >= sla_minutes)
    }
}
