//! Case records and seeded demo intake.
//!
//! RULE: Case feature counters only ever increase within a session.
//! Simulated events increment them; nothing decrements. Case rows are
//! owned by the store and mutated only through the simulated-event path.

use crate::{config::IntakeProfile, rng::IntakeRng, types::CaseId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// ── Risk bands ─────────────────────────────────────────────────────

/// Seed risk category assigned at intake. Also the level scale for
/// assessments. Variant order gives Low < Medium < High.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

// ── Case data ──────────────────────────────────────────────────────

/// Behavioral feature counters. All monotonically non-decreasing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseFeatures {
    pub withdrawal_attempts: u32,
    pub profile_changes:     u32,
    pub geo_switches:        u32,
    pub account_age_days:    u32,
}

/// A flagged case awaiting review. Flat row shape; the historical
/// trend series and factor breakdown live in their own tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseRecord {
    pub case_id:      CaseId,
    pub display_name: String,
    pub intake_at:    DateTime<Utc>,
    pub seed_band:    RiskBand,
    pub features:     CaseFeatures,
}

/// One historical risk observation on a case's trend series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendPoint {
    pub label: String,
    pub score: i64,
}

/// The fixed label for the point appended on every recorded assessment.
pub const TREND_NOW_LABEL: &str = "Now";

/// One named signal in a case's factor breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalWeight {
    pub signal: String,
    pub weight: f64,
}

/// Events an analyst may simulate against the selected case.
/// Each increments exactly one feature counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseEventKind {
    Withdrawal,
    ProfileChange,
    GeoSwitch,
}

impl CaseEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Withdrawal => "withdrawal",
            Self::ProfileChange => "profile_change",
            Self::GeoSwitch => "geo_switch",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Withdrawal => "Withdrawal attempt",
            Self::ProfileChange => "Profile change",
            Self::GeoSwitch => "Geo switch",
        }
    }
}

/// A freshly generated case with its seed history, ready for admission.
#[derive(Debug, Clone)]
pub struct GeneratedCase {
    pub record:  CaseRecord,
    pub trend:   Vec<TrendPoint>,
    pub signals: Vec<SignalWeight>,
}

// ── Seeded intake generation ───────────────────────────────────────

const FIRST_NAMES: &[&str] = &[
    "Marcus", "Elena", "Dmitri", "Sofia", "Rashid", "Ingrid", "Tomas",
    "Amara", "Viktor", "Leila", "Hassan", "Petra", "Mateo", "Yuki",
];
const LAST_NAMES: &[&str] = &[
    "Webb", "Vasquez", "Orlov", "Lindqvist", "Okafor", "Marsh", "Novak",
    "Haddad", "Silva", "Kovacs", "Reyes", "Brandt", "Ito", "Durand",
];

const HIGH_FACTORS: &[(&str, f64)] = &[
    ("Transaction velocity anomaly", 0.34),
    ("Device fingerprint churn", 0.22),
    ("Prior fraud-pattern correlation", 0.27),
    ("Mule-network proximity", 0.17),
];
const MEDIUM_FACTORS: &[(&str, f64)] = &[
    ("Dormancy followed by burst activity", 0.29),
    ("Unverified contact details", 0.18),
    ("Cross-border counterparties", 0.24),
];
const LOW_FACTORS: &[(&str, f64)] = &[
    ("Routine payroll pattern", 0.11),
    ("Long-tenured account", 0.08),
];

/// Trend history depth seeded per case, labeled "W-4".."W-1".
const TREND_HISTORY_POINTS: usize = 4;

/// How far each seed band's history hovers from its nominal center.
const TREND_JITTER: u64 = 13; // +/- 6 around center

/// Deterministic demo caseload generator. One RNG stream per session;
/// identical seed and profile yield an identical caseload.
pub struct IntakeGenerator {
    rng: IntakeRng,
}

impl IntakeGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: IntakeRng::new(seed),
        }
    }

    /// Generate the session's caseload. Intake dates fall on distinct
    /// days before `origin`, oldest case first.
    pub fn generate(&mut self, profile: &IntakeProfile, origin: DateTime<Utc>) -> Vec<GeneratedCase> {
        let count = profile.case_count;
        let mut cases = Vec::with_capacity(count);
        for i in 0..count {
            let case_id = format!("C-{:03}", i + 1);
            let band = self.draw_band(profile);
            let record = CaseRecord {
                display_name: self.draw_name(),
                intake_at: origin
                    - Duration::days((count - i) as i64)
                    - Duration::hours(self.rng.next_u64_below(20) as i64),
                seed_band: band,
                features: self.draw_features(band),
                case_id,
            };
            let trend = self.draw_trend(band);
            let signals = self.draw_signals(band);
            cases.push(GeneratedCase {
                record,
                trend,
                signals,
            });
        }
        cases
    }

    fn draw_band(&mut self, profile: &IntakeProfile) -> RiskBand {
        let roll = self.rng.next_f64();
        if roll < profile.high_share {
            RiskBand::High
        } else if roll < profile.high_share + profile.medium_share {
            RiskBand::Medium
        } else {
            RiskBand::Low
        }
    }

    fn draw_name(&mut self) -> String {
        format!(
            "{} {}",
            self.rng.pick(FIRST_NAMES),
            self.rng.pick(LAST_NAMES)
        )
    }

    fn draw_features(&mut self, band: RiskBand) -> CaseFeatures {
        match band {
            RiskBand::High => CaseFeatures {
                withdrawal_attempts: 1 + self.rng.next_u64_below(4) as u32,
                profile_changes: 1 + self.rng.next_u64_below(3) as u32,
                geo_switches: 1 + self.rng.next_u64_below(3) as u32,
                account_age_days: 5 + self.rng.next_u64_below(116) as u32,
            },
            RiskBand::Medium => CaseFeatures {
                withdrawal_attempts: self.rng.next_u64_below(3) as u32,
                profile_changes: self.rng.next_u64_below(3) as u32,
                geo_switches: self.rng.next_u64_below(2) as u32,
                account_age_days: 30 + self.rng.next_u64_below(371) as u32,
            },
            RiskBand::Low => CaseFeatures {
                withdrawal_attempts: self.rng.next_u64_below(2) as u32,
                profile_changes: self.rng.next_u64_below(2) as u32,
                geo_switches: 0,
                account_age_days: 180 + self.rng.next_u64_below(1321) as u32,
            },
        }
    }

    fn draw_trend(&mut self, band: RiskBand) -> Vec<TrendPoint> {
        let center: i64 = match band {
            RiskBand::High => 76,
            RiskBand::Medium => 52,
            RiskBand::Low => 20,
        };
        (0..TREND_HISTORY_POINTS)
            .map(|i| {
                let jitter = self.rng.next_u64_below(TREND_JITTER) as i64 - 6;
                TrendPoint {
                    label: format!("W-{}", TREND_HISTORY_POINTS - i),
                    score: (center + jitter).clamp(0, 100),
                }
            })
            .collect()
    }

    fn draw_signals(&mut self, band: RiskBand) -> Vec<SignalWeight> {
        let pool = match band {
            RiskBand::High => HIGH_FACTORS,
            RiskBand::Medium => MEDIUM_FACTORS,
            RiskBand::Low => LOW_FACTORS,
        };
        pool.iter()
            .map(|(signal, weight)| SignalWeight {
                signal: (*signal).to_string(),
                weight: weight + (self.rng.next_f64() * 0.06 - 0.03),
            })
            .collect()
    }
}
