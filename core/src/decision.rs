//! Decision validation — the mandatory-justification gate.
//!
//! RULE: Every caller of the commit path goes through resolve_note.
//! The override gate lives here and nowhere else, so a panel, an
//! inline form, and a scripted runner all share one source of truth.

use crate::{
    error::{DeskError, DeskResult},
    reviewer_role::ReviewerRole,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    Accepted,
    Overridden,
}

impl DecisionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Overridden => "overridden",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "accepted" => Some(Self::Accepted),
            "overridden" => Some(Self::Overridden),
            _ => None,
        }
    }
}

/// The deterministic note substituted when an acceptance carries no
/// analyst note. References the recommended action and acting role.
pub fn default_acceptance_note(recommended_action: &str, role: ReviewerRole) -> String {
    format!(
        "Accepted recommended action: {} (per {})",
        recommended_action,
        role.label()
    )
}

/// Validate the justification note for a decision.
///
/// An override with an empty-after-trim note fails with
/// JustificationRequired. An acceptance without a note substitutes the
/// deterministic default. Nothing is mutated on failure.
pub fn resolve_note(
    case_id: &str,
    outcome: DecisionOutcome,
    note: Option<&str>,
    recommended_action: &str,
    role: ReviewerRole,
) -> DeskResult<String> {
    let trimmed = note.map(str::trim).unwrap_or("");
    match outcome {
        DecisionOutcome::Overridden if trimmed.is_empty() => {
            Err(DeskError::JustificationRequired {
                case_id: case_id.to_string(),
            })
        }
        DecisionOutcome::Accepted if trimmed.is_empty() => {
            Ok(default_acceptance_note(recommended_action, role))
        }
        _ => Ok(trimmed.to_string()),
    }
}
