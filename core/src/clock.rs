//! Desk clock — owns the action sequence and the timestamp source.

use crate::types::{Seq, SessionId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeskClock {
    pub session_id:  SessionId,
    pub current_seq: Seq,
    pub source:      TimeSource,
}

impl DeskClock {
    /// Wall-clock timestamps. Interactive sessions.
    pub fn system(session_id: SessionId) -> Self {
        Self {
            session_id,
            current_seq: 0,
            source: TimeSource::System,
        }
    }

    /// Fixed origin plus a fixed step per action. Scripted runs and
    /// tests get reproducible timestamps.
    pub fn manual(session_id: SessionId, origin: DateTime<Utc>, step_secs: i64) -> Self {
        Self {
            session_id,
            current_seq: 0,
            source: TimeSource::Manual { origin, step_secs },
        }
    }

    /// Advance one action. Returns the new sequence number.
    pub fn advance(&mut self) -> Seq {
        self.current_seq += 1;
        self.current_seq
    }

    /// Timestamp for the current action.
    pub fn now(&self) -> DateTime<Utc> {
        match &self.source {
            TimeSource::System => Utc::now(),
            TimeSource::Manual { origin, step_secs } => {
                *origin + Duration::seconds(step_secs * self.current_seq as i64)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TimeSource {
    System,
    Manual {
        origin: DateTime<Utc>,
        step_secs: i64,
    },
}
