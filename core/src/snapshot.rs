//! Snapshot serialization — the read-only export projection.
//!
//! Consumed by report/export tooling. Capturing a snapshot reads the
//! store and never mutates anything.

use crate::{
    intake::{CaseRecord, SignalWeight, TrendPoint},
    ledger::{AuditRecord, LedgerSummary},
    lifecycle::LifecycleRecord,
    types::{Seq, SessionId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeskSnapshot {
    pub session_id:  SessionId,
    pub seq:         Seq,
    pub captured_at: DateTime<Utc>,
    pub cases:       Vec<CaseSnapshot>,
    pub ledger:      Vec<AuditRecord>,
    pub summary:     LedgerSummary,
}

/// One case with its full history, as exported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseSnapshot {
    pub record:    CaseRecord,
    pub lifecycle: LifecycleRecord,
    pub trend:     Vec<TrendPoint>,
    pub signals:   Vec<SignalWeight>,
}
