//! Risk assessment — deterministic scoring over case features.
//!
//! RULES:
//!   - Scoring is pure: identical features and seed band always yield
//!     an identical verdict. No randomness, no time-dependence.
//!   - The level is always derived from the final score through
//!     ScoreBands, never trusted from the backend, so score/level
//!     consistency holds by construction.
//!   - The backend is fallible. A failed or malformed response becomes
//!     AssessmentFetchFailed; the engine never fabricates a verdict.

use crate::{
    error::{DeskError, DeskResult},
    intake::{CaseRecord, RiskBand},
    types::CaseId,
};
use serde::{Deserialize, Serialize};

// ── Rule-based model constants ─────────────────────────────────────

const BASE_SCORE_HIGH: i64 = 78;
const BASE_SCORE_MEDIUM: i64 = 52;
const BASE_SCORE_LOW: i64 = 18;

const WITHDRAWAL_WEIGHT: i64 = 3;
const PROFILE_CHANGE_WEIGHT: i64 = 2;
const GEO_SWITCH_WEIGHT: i64 = 4;

/// Accounts younger than this pick up a flat risk increment.
const NEW_ACCOUNT_AGE_DAYS: u32 = 30;
const NEW_ACCOUNT_WEIGHT: i64 = 5;

const CONFIDENCE_BASE: f64 = 0.72;
const CONFIDENCE_PER_SIGNAL: f64 = 0.04;
const CONFIDENCE_CAP: f64 = 0.94;

// ── Band thresholds ────────────────────────────────────────────────

/// Total, non-overlapping score cutoffs: score >= high_floor is High,
/// score >= medium_floor is Medium, everything below is Low.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBands {
    pub high_floor:   i64,
    pub medium_floor: i64,
}

impl Default for ScoreBands {
    fn default() -> Self {
        Self {
            high_floor: 70,
            medium_floor: 40,
        }
    }
}

impl ScoreBands {
    pub fn band_for(&self, score: i64) -> RiskBand {
        if score >= self.high_floor {
            RiskBand::High
        } else if score >= self.medium_floor {
            RiskBand::Medium
        } else {
            RiskBand::Low
        }
    }
}

// ── Backend contract ───────────────────────────────────────────────

/// Raw response from a scoring backend, before validation. The level
/// is intentionally absent: it is derived from the score on receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelVerdict {
    pub score:              i64,
    pub explanation:        String,
    pub risk_signals:       Vec<String>,
    pub recommended_action: String,
    pub confidence:         f64,
    pub business_impact:    String,
    pub why_not_low:        Option<String>,
}

/// The pluggable scoring backend. The default is rule-based and never
/// fails; real backends fail over the wire and return Err.
pub trait ScoringModel: Send {
    fn name(&self) -> &'static str;

    fn score(&self, case: &CaseRecord, bands: &ScoreBands) -> DeskResult<ModelVerdict>;
}

/// Tag for one in-flight assessment fetch. A response is applied only
/// while its ticket still matches the current selection and generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentTicket {
    pub case_id:    CaseId,
    pub generation: u64,
}

// ── Validated assessment ───────────────────────────────────────────

/// A complete, validated point-in-time assessment for one case.
/// Replaced wholesale on every recompute, never patched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub case_id:            CaseId,
    pub generation:         u64,
    pub score:              i64,
    pub level:              RiskBand,
    pub explanation:        String,
    pub risk_signals:       Vec<String>,
    pub recommended_action: String,
    pub confidence:         f64,
    pub business_impact:    String,
    pub why_not_low:        Option<String>,
}

impl RiskAssessment {
    /// Validate a backend verdict and derive the level from the score.
    /// A malformed response is an AssessmentFetchFailed, same as a
    /// transport failure.
    pub fn from_verdict(
        case_id: &str,
        generation: u64,
        verdict: ModelVerdict,
        bands: &ScoreBands,
    ) -> DeskResult<Self> {
        let malformed = |reason: String| DeskError::AssessmentFetchFailed {
            case_id: case_id.to_string(),
            reason,
        };

        if !(0..=100).contains(&verdict.score) {
            return Err(malformed(format!("score {} out of range", verdict.score)));
        }
        if !(0.0..=1.0).contains(&verdict.confidence) {
            return Err(malformed(format!(
                "confidence {} out of range",
                verdict.confidence
            )));
        }

        let level = bands.band_for(verdict.score);
        if level != RiskBand::Low {
            if verdict.risk_signals.is_empty() {
                return Err(malformed("no risk signals on an elevated verdict".into()));
            }
            if verdict.why_not_low.is_none() {
                return Err(malformed(
                    "missing counterfactual narrative on an elevated verdict".into(),
                ));
            }
        }

        Ok(Self {
            case_id: case_id.to_string(),
            generation,
            score: verdict.score,
            level,
            explanation: verdict.explanation,
            risk_signals: verdict.risk_signals,
            recommended_action: verdict.recommended_action,
            confidence: verdict.confidence,
            business_impact: verdict.business_impact,
            why_not_low: verdict.why_not_low,
        })
    }
}

// ── Rule-based default model ───────────────────────────────────────

/// Deterministic in-process scorer: seed band selects a base score,
/// feature counters add fixed increments and can push the score
/// across bands.
pub struct RuleBasedModel;

impl RuleBasedModel {
    fn counter_points(case: &CaseRecord) -> i64 {
        let f = &case.features;
        let mut points = f.withdrawal_attempts as i64 * WITHDRAWAL_WEIGHT
            + f.profile_changes as i64 * PROFILE_CHANGE_WEIGHT
            + f.geo_switches as i64 * GEO_SWITCH_WEIGHT;
        if f.account_age_days < NEW_ACCOUNT_AGE_DAYS {
            points += NEW_ACCOUNT_WEIGHT;
        }
        points
    }

    fn base_score(band: RiskBand) -> i64 {
        match band {
            RiskBand::High => BASE_SCORE_HIGH,
            RiskBand::Medium => BASE_SCORE_MEDIUM,
            RiskBand::Low => BASE_SCORE_LOW,
        }
    }

    fn signals(case: &CaseRecord) -> Vec<String> {
        let f = &case.features;
        let mut signals = Vec::new();
        if f.withdrawal_attempts > 0 {
            signals.push(format!(
                "{} rapid withdrawal attempt(s)",
                f.withdrawal_attempts
            ));
        }
        if f.profile_changes > 0 {
            signals.push(format!("{} recent profile change(s)", f.profile_changes));
        }
        if f.geo_switches > 0 {
            signals.push(format!(
                "Geo-velocity anomaly across {} location(s)",
                f.geo_switches
            ));
        }
        if f.account_age_days < NEW_ACCOUNT_AGE_DAYS {
            signals.push(format!("Account age under {NEW_ACCOUNT_AGE_DAYS} days"));
        }
        match case.seed_band {
            RiskBand::High => signals.push("Flagged by upstream fraud-pattern screen".into()),
            RiskBand::Medium => signals.push("Historical drift above cohort baseline".into()),
            RiskBand::Low => {}
        }
        signals
    }

    fn recommended_action(level: RiskBand) -> &'static str {
        match level {
            RiskBand::High => "Escalate to fraud operations and freeze outbound transfers",
            RiskBand::Medium => "Request enhanced due-diligence documentation before release",
            RiskBand::Low => "Clear the case and restore standard monitoring",
        }
    }

    fn business_impact(level: RiskBand) -> &'static str {
        match level {
            RiskBand::High => {
                "Material exposure across linked accounts if outbound transfers continue"
            }
            RiskBand::Medium => "Moderate exposure; delayed action raises downstream review cost",
            RiskBand::Low => "Minimal exposure; residual friction risks customer attrition",
        }
    }
}

impl ScoringModel for RuleBasedModel {
    fn name(&self) -> &'static str {
        "rule_based"
    }

    fn score(&self, case: &CaseRecord, bands: &ScoreBands) -> DeskResult<ModelVerdict> {
        let base = Self::base_score(case.seed_band);
        let counter_points = Self::counter_points(case);
        let score = (base + counter_points).clamp(0, 100);
        let level = bands.band_for(score);
        let signals = Self::signals(case);

        let why_not_low = if level != RiskBand::Low {
            Some(format!("Not cleared: {}", signals.join("; ")))
        } else {
            None
        };
        let confidence = (CONFIDENCE_BASE + CONFIDENCE_PER_SIGNAL * signals.len() as f64)
            .min(CONFIDENCE_CAP);

        Ok(ModelVerdict {
            score,
            explanation: format!(
                "{} intake band; behavioral counters add {} point(s) to a base of {}",
                case.seed_band.label(),
                counter_points,
                base
            ),
            risk_signals: signals,
            recommended_action: Self::recommended_action(level).to_string(),
            confidence,
            business_impact: Self::business_impact(level).to_string(),
            why_not_low,
        })
    }
}
