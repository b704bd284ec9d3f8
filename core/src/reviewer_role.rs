//! Reviewer roles.
//!
//! The acting role is stamped onto every audit record and referenced
//! by the default acceptance note. It carries no permissions model —
//! every role may accept or override.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewerRole {
    Analyst,
    SeniorAnalyst,
    ComplianceLead,
}

impl ReviewerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analyst => "analyst",
            Self::SeniorAnalyst => "senior_analyst",
            Self::ComplianceLead => "compliance_lead",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "analyst" => Some(Self::Analyst),
            "senior_analyst" => Some(Self::SeniorAnalyst),
            "compliance_lead" => Some(Self::ComplianceLead),
            _ => None,
        }
    }

    /// Display label for notes and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Analyst => "Analyst",
            Self::SeniorAnalyst => "Senior Analyst",
            Self::ComplianceLead => "Compliance Lead",
        }
    }
}

impl Default for ReviewerRole {
    fn default() -> Self {
        Self::Analyst
    }
}
