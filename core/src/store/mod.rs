//! SQLite persistence layer.
//!
//! RULE: Only the store module talks to the database.
//! Components call store methods — they never execute SQL directly.

use crate::{error::DeskResult, event::EventLogEntry, types::Seq};
mod cases;
mod ledger;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

pub struct DeskStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl DeskStore {
    pub fn open(path: &str) -> DeskResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> DeskResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    /// Reopen a new connection to the same database.
    /// For in-memory databases, this returns a new in-memory database (isolated).
    /// For file-based databases, this opens the same file.
    pub fn reopen(&self) -> DeskResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> DeskResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_cases.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_lifecycle.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/004_audit_ledger.sql"))?;
        Ok(())
    }

    // ── Session ────────────────────────────────────────────────

    pub fn insert_session(
        &self,
        session_id: &str,
        seed: u64,
        version: &str,
        started_at: DateTime<Utc>,
    ) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO session (session_id, seed, version, started_at) VALUES (?1, ?2, ?3, ?4)",
            params![session_id, seed as i64, version, started_at.to_rfc3339()],
        )?;
        Ok(())
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (session_id, seq, source, event_type, payload, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.session_id,
                entry.seq as i64,
                entry.source,
                entry.event_type,
                entry.payload,
                entry.recorded_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// All events for a session in append order.
    pub fn events_for_session(&self, session_id: &str) -> DeskResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, seq, source, event_type, payload, recorded_at
             FROM event_log WHERE session_id = ?1
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![session_id], row_to_event)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Events of one type for a session, in append order.
    /// Used by the trace tooling and the stale-fetch tests.
    pub fn events_of_type(
        &self,
        session_id: &str,
        event_type: &str,
    ) -> DeskResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, seq, source, event_type, payload, recorded_at
             FROM event_log WHERE session_id = ?1 AND event_type = ?2
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![session_id, event_type], row_to_event)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

fn row_to_event(row: &rusqlite::Row) -> Result<EventLogEntry, rusqlite::Error> {
    Ok(EventLogEntry {
        id: Some(row.get(0)?),
        session_id: row.get(1)?,
        seq: row.get::<_, i64>(2)? as Seq,
        source: row.get(3)?,
        event_type: row.get(4)?,
        payload: row.get(5)?,
        recorded_at: parse_ts(6, row.get(6)?)?,
    })
}

// ── Row conversion helpers ─────────────────────────────────────

pub(crate) fn parse_ts(col: usize, raw: String) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(e))
        })
}

pub(crate) fn parse_opt_ts(
    col: usize,
    raw: Option<String>,
) -> Result<Option<DateTime<Utc>>, rusqlite::Error> {
    raw.map(|s| parse_ts(col, s)).transpose()
}

pub(crate) fn invalid_text(col: usize, what: &str, raw: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        col,
        rusqlite::types::Type::Text,
        format!("unrecognized {what} '{raw}'").into(),
    )
}
