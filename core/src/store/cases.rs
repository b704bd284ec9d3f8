//! Case, trend, factor, and lifecycle database queries.

use super::{invalid_text, parse_opt_ts, parse_ts, DeskStore};
use crate::{
    error::{DeskError, DeskResult},
    intake::{CaseEventKind, CaseFeatures, CaseRecord, RiskBand, SignalWeight, TrendPoint},
    lifecycle::{CaseStatus, LifecycleRecord},
};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

const CASE_COLUMNS: &str = "case_id, display_name, intake_at, seed_band,
       withdrawal_attempts, profile_changes, geo_switches, account_age_days";

impl DeskStore {
    // ── Case records ──────────────────────────────────────────

    pub fn insert_case(&self, session_id: &str, record: &CaseRecord) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO case_record (
                session_id, case_id, display_name, intake_at, seed_band,
                withdrawal_attempts, profile_changes, geo_switches, account_age_days
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                session_id,
                record.case_id,
                record.display_name,
                record.intake_at.to_rfc3339(),
                record.seed_band.as_str(),
                record.features.withdrawal_attempts as i64,
                record.features.profile_changes as i64,
                record.features.geo_switches as i64,
                record.features.account_age_days as i64,
            ],
        )?;
        Ok(())
    }

    pub fn case_record(&self, session_id: &str, case_id: &str) -> DeskResult<Option<CaseRecord>> {
        let result = self
            .conn
            .query_row(
                &format!(
                    "SELECT {CASE_COLUMNS} FROM case_record
                     WHERE session_id = ?1 AND case_id = ?2"
                ),
                params![session_id, case_id],
                row_to_case,
            )
            .optional()?;
        Ok(result)
    }

    /// Every case in the session, ordered by case id. This ordering is
    /// the queue projection's input order, so full sort ties stay in
    /// case-id order.
    pub fn all_cases(&self, session_id: &str) -> DeskResult<Vec<CaseRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CASE_COLUMNS} FROM case_record
             WHERE session_id = ?1 ORDER BY case_id ASC"
        ))?;
        let cases = stmt
            .query_map(params![session_id], row_to_case)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cases)
    }

    pub fn case_count(&self, session_id: &str) -> DeskResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM case_record WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?)
    }

    /// Increment the counter behind one simulated event kind.
    /// The only mutation path for case feature data.
    pub fn increment_feature(
        &self,
        session_id: &str,
        case_id: &str,
        kind: CaseEventKind,
    ) -> DeskResult<()> {
        let column = match kind {
            CaseEventKind::Withdrawal => "withdrawal_attempts",
            CaseEventKind::ProfileChange => "profile_changes",
            CaseEventKind::GeoSwitch => "geo_switches",
        };
        let updated = self.conn.execute(
            &format!(
                "UPDATE case_record SET {column} = {column} + 1
                 WHERE session_id = ?1 AND case_id = ?2"
            ),
            params![session_id, case_id],
        )?;
        if updated == 0 {
            return Err(DeskError::CaseNotFound {
                case_id: case_id.to_string(),
            });
        }
        Ok(())
    }

    // ── Trend series ──────────────────────────────────────────

    pub fn append_trend_point(
        &self,
        session_id: &str,
        case_id: &str,
        point: &TrendPoint,
    ) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO trend_point (session_id, case_id, label, score)
             VALUES (?1, ?2, ?3, ?4)",
            params![session_id, case_id, point.label, point.score],
        )?;
        Ok(())
    }

    pub fn trend_for_case(&self, session_id: &str, case_id: &str) -> DeskResult<Vec<TrendPoint>> {
        let mut stmt = self.conn.prepare(
            "SELECT label, score FROM trend_point
             WHERE session_id = ?1 AND case_id = ?2
             ORDER BY id ASC",
        )?;
        let points = stmt
            .query_map(params![session_id, case_id], |row| {
                Ok(TrendPoint {
                    label: row.get(0)?,
                    score: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(points)
    }

    /// Most recent trend observation; the queue's numeric sort proxy.
    pub fn latest_trend_score(&self, session_id: &str, case_id: &str) -> DeskResult<Option<i64>> {
        let score = self
            .conn
            .query_row(
                "SELECT score FROM trend_point
                 WHERE session_id = ?1 AND case_id = ?2
                 ORDER BY id DESC LIMIT 1",
                params![session_id, case_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(score)
    }

    // ── Factor breakdown ──────────────────────────────────────

    pub fn insert_signal_weight(
        &self,
        session_id: &str,
        case_id: &str,
        signal: &SignalWeight,
    ) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO signal_weight (session_id, case_id, signal, weight)
             VALUES (?1, ?2, ?3, ?4)",
            params![session_id, case_id, signal.signal, signal.weight],
        )?;
        Ok(())
    }

    pub fn signals_for_case(
        &self,
        session_id: &str,
        case_id: &str,
    ) -> DeskResult<Vec<SignalWeight>> {
        let mut stmt = self.conn.prepare(
            "SELECT signal, weight FROM signal_weight
             WHERE session_id = ?1 AND case_id = ?2
             ORDER BY id ASC",
        )?;
        let signals = stmt
            .query_map(params![session_id, case_id], |row| {
                Ok(SignalWeight {
                    signal: row.get(0)?,
                    weight: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(signals)
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn insert_lifecycle(&self, session_id: &str, case_id: &str) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO lifecycle (session_id, case_id, status) VALUES (?1, ?2, 'new')",
            params![session_id, case_id],
        )?;
        Ok(())
    }

    pub fn lifecycle_record(
        &self,
        session_id: &str,
        case_id: &str,
    ) -> DeskResult<Option<LifecycleRecord>> {
        let result = self
            .conn
            .query_row(
                "SELECT case_id, status, entered_review_at, resolved_at
                 FROM lifecycle WHERE session_id = ?1 AND case_id = ?2",
                params![session_id, case_id],
                row_to_lifecycle,
            )
            .optional()?;
        Ok(result)
    }

    pub fn all_lifecycle(&self, session_id: &str) -> DeskResult<Vec<LifecycleRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT case_id, status, entered_review_at, resolved_at
             FROM lifecycle WHERE session_id = ?1 ORDER BY case_id ASC",
        )?;
        let records = stmt
            .query_map(params![session_id], row_to_lifecycle)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Promote a case out of 'new'. Returns true when the transition
    /// fired, false when the case had already left 'new' — the entry
    /// timestamp is written at most once.
    pub fn mark_in_review(
        &self,
        session_id: &str,
        case_id: &str,
        at: DateTime<Utc>,
    ) -> DeskResult<bool> {
        let updated = self.conn.execute(
            "UPDATE lifecycle SET status = 'in_review', entered_review_at = ?1
             WHERE session_id = ?2 AND case_id = ?3 AND status = 'new'",
            params![at.to_rfc3339(), session_id, case_id],
        )?;
        Ok(updated > 0)
    }
}

fn row_to_case(row: &rusqlite::Row) -> Result<CaseRecord, rusqlite::Error> {
    let band_raw: String = row.get(3)?;
    Ok(CaseRecord {
        case_id: row.get(0)?,
        display_name: row.get(1)?,
        intake_at: parse_ts(2, row.get(2)?)?,
        seed_band: RiskBand::parse(&band_raw).ok_or_else(|| invalid_text(3, "risk band", &band_raw))?,
        features: CaseFeatures {
            withdrawal_attempts: row.get::<_, i64>(4)? as u32,
            profile_changes: row.get::<_, i64>(5)? as u32,
            geo_switches: row.get::<_, i64>(6)? as u32,
            account_age_days: row.get::<_, i64>(7)? as u32,
        },
    })
}

fn row_to_lifecycle(row: &rusqlite::Row) -> Result<LifecycleRecord, rusqlite::Error> {
    let status_raw: String = row.get(1)?;
    Ok(LifecycleRecord {
        case_id: row.get(0)?,
        status: CaseStatus::parse(&status_raw)
            .ok_or_else(|| invalid_text(1, "lifecycle status", &status_raw))?,
        entered_review_at: parse_opt_ts(2, row.get(2)?)?,
        resolved_at: parse_opt_ts(3, row.get(3)?)?,
    })
}
