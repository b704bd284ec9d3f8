//! Audit ledger database queries and the atomic decision commit.

use super::{invalid_text, parse_ts, DeskStore};
use crate::{
    decision::DecisionOutcome,
    error::{DeskError, DeskResult},
    ledger::{AuditRecord, LedgerSortKey, LedgerSummary, SortDirection},
    reviewer_role::ReviewerRole,
};
use rusqlite::params;

impl DeskStore {
    /// Resolve the case and append the audit record in one transaction.
    /// The UPDATE refuses terminal cases, so a duplicate commit rolls
    /// back without ever touching the ledger — all-or-nothing from the
    /// caller's perspective.
    pub fn commit_decision(&mut self, session_id: &str, record: &AuditRecord) -> DeskResult<()> {
        let tx = self.conn.transaction()?;
        let resolved = tx.execute(
            "UPDATE lifecycle SET status = 'resolved', resolved_at = ?1
             WHERE session_id = ?2 AND case_id = ?3 AND status != 'resolved'",
            params![record.decided_at.to_rfc3339(), session_id, record.case_id],
        )?;
        if resolved == 0 {
            return Err(DeskError::AlreadyResolved {
                case_id: record.case_id.clone(),
            });
        }
        tx.execute(
            "INSERT INTO audit_record (
                record_id, session_id, case_id, outcome, actor_role, note, decided_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.record_id,
                session_id,
                record.case_id,
                record.outcome.as_str(),
                record.actor_role.as_str(),
                record.note,
                record.decided_at.to_rfc3339(),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Re-project the ledger for display. `seq` breaks ties so every
    /// listing is a strict total order; the underlying append order is
    /// untouched.
    pub fn audit_records(
        &self,
        session_id: &str,
        key: LedgerSortKey,
        direction: SortDirection,
    ) -> DeskResult<Vec<AuditRecord>> {
        let column = match key {
            LedgerSortKey::DecidedAt => "decided_at",
            LedgerSortKey::CaseId => "case_id",
            LedgerSortKey::ActorRole => "actor_role",
        };
        let dir = match direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        let mut stmt = self.conn.prepare(&format!(
            "SELECT seq, record_id, case_id, outcome, actor_role, note, decided_at
             FROM audit_record WHERE session_id = ?1
             ORDER BY {column} {dir}, seq ASC"
        ))?;
        let records = stmt
            .query_map(params![session_id], row_to_audit)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn records_for_case(&self, session_id: &str, case_id: &str) -> DeskResult<Vec<AuditRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT seq, record_id, case_id, outcome, actor_role, note, decided_at
             FROM audit_record WHERE session_id = ?1 AND case_id = ?2
             ORDER BY seq ASC",
        )?;
        let records = stmt
            .query_map(params![session_id, case_id], row_to_audit)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn ledger_len(&self, session_id: &str) -> DeskResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM audit_record WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?)
    }

    /// Counts derived on demand so they can never drift from the list.
    pub fn ledger_summary(&self, session_id: &str) -> DeskResult<LedgerSummary> {
        let (total, overridden): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN outcome = 'overridden' THEN 1 ELSE 0 END), 0)
             FROM audit_record WHERE session_id = ?1",
            params![session_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(LedgerSummary {
            total,
            accepted: total - overridden,
            overridden,
        })
    }
}

fn row_to_audit(row: &rusqlite::Row) -> Result<AuditRecord, rusqlite::Error> {
    let outcome_raw: String = row.get(3)?;
    let role_raw: String = row.get(4)?;
    Ok(AuditRecord {
        seq: Some(row.get(0)?),
        record_id: row.get(1)?,
        case_id: row.get(2)?,
        outcome: DecisionOutcome::parse(&outcome_raw)
            .ok_or_else(|| invalid_text(3, "decision outcome", &outcome_raw))?,
        actor_role: ReviewerRole::parse(&role_raw)
            .ok_or_else(|| invalid_text(4, "reviewer role", &role_raw))?,
        note: row.get(5)?,
        decided_at: parse_ts(6, row.get(6)?)?,
    })
}
