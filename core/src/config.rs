use crate::assessment::ScoreBands;
use serde::{Deserialize, Serialize};

/// Seeded demo intake shape. Shares are fractions of the caseload;
/// whatever the High and Medium shares leave over is Low.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntakeProfile {
    pub case_count:   usize,
    pub high_share:   f64,
    pub medium_share: f64,
}

impl Default for IntakeProfile {
    fn default() -> Self {
        Self {
            case_count: 12,
            high_share: 0.25,
            medium_share: 0.35,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeskConfig {
    #[serde(default)]
    pub bands: ScoreBands,
    #[serde(default)]
    pub intake: IntakeProfile,
    /// Review budget per case before the queue flags it as overdue.
    #[serde(default = "default_review_sla_minutes")]
    pub review_sla_minutes: i64,
}

fn default_review_sla_minutes() -> i64 {
    240
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            bands: ScoreBands::default(),
            intake: IntakeProfile::default(),
            review_sla_minutes: default_review_sla_minutes(),
        }
    }
}

impl DeskConfig {
    /// Load from a JSON file. Missing sections fall back to defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        Ok(serde_json::from_str(&content)?)
    }
}
