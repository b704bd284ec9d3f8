//! Queue projection tests: the strict ordering contract, facets, and
//! filter composition.

use chrono::{DateTime, TimeZone, Utc};
use triage_core::{
    intake::RiskBand,
    lifecycle::CaseStatus,
    queue::{visible_queue, QueueEntry, QueueFilter, QueueView, SortPreference, StatusFacet},
};

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, d, 12, 0, 0).unwrap()
}

fn entry(
    case_id: &str,
    name: &str,
    band: RiskBand,
    status: CaseStatus,
    intake_day: u32,
    score: i64,
) -> QueueEntry {
    QueueEntry {
        case_id: case_id.to_string(),
        display_name: name.to_string(),
        band,
        status,
        intake_at: day(intake_day),
        latest_score: score,
    }
}

fn ids(view: &QueueView) -> Vec<&str> {
    view.entries.iter().map(|e| e.case_id.as_str()).collect()
}

/// Resolved cases sink below every non-resolved case, whatever their
/// band or recency.
#[test]
fn resolved_cases_always_sink() {
    let rows = vec![
        entry("C-601", "Resolved High", RiskBand::High, CaseStatus::Resolved, 9, 99),
        entry("C-602", "Active Low", RiskBand::Low, CaseStatus::New, 1, 10),
    ];
    let view = visible_queue(rows, &QueueFilter::default());
    assert_eq!(ids(&view), vec!["C-602", "C-601"]);
}

/// Within the non-resolved group the band orders descending.
#[test]
fn band_orders_descending() {
    let rows = vec![
        entry("C-611", "Low", RiskBand::Low, CaseStatus::New, 5, 20),
        entry("C-612", "High", RiskBand::High, CaseStatus::InReview, 3, 80),
        entry("C-613", "Medium", RiskBand::Medium, CaseStatus::New, 8, 50),
    ];
    let view = visible_queue(rows, &QueueFilter::default());
    assert_eq!(ids(&view), vec!["C-612", "C-613", "C-611"]);
}

/// Within a band the default tie-break is newest intake first.
#[test]
fn intake_recency_breaks_band_ties() {
    let rows = vec![
        entry("C-621", "Older", RiskBand::High, CaseStatus::New, 3, 90),
        entry("C-622", "Newer", RiskBand::High, CaseStatus::New, 7, 75),
    ];
    let view = visible_queue(rows, &QueueFilter::default());
    assert_eq!(ids(&view), vec!["C-622", "C-621"]);
}

/// The score preference swaps the within-band tie-break to the latest
/// observed score.
#[test]
fn score_preference_breaks_band_ties() {
    let rows = vec![
        entry("C-631", "Lower score", RiskBand::High, CaseStatus::New, 7, 75),
        entry("C-632", "Higher score", RiskBand::High, CaseStatus::New, 3, 90),
    ];
    let filter = QueueFilter { sort: SortPreference::ScoreDesc, ..QueueFilter::default() };
    let view = visible_queue(rows, &filter);
    assert_eq!(ids(&view), vec!["C-632", "C-631"]);
}

/// Full key ties keep input order — the sort is stable.
#[test]
fn full_ties_keep_input_order() {
    let rows = vec![
        entry("C-641", "Twin A", RiskBand::Medium, CaseStatus::New, 5, 50),
        entry("C-642", "Twin B", RiskBand::Medium, CaseStatus::New, 5, 50),
        entry("C-643", "Twin C", RiskBand::Medium, CaseStatus::New, 5, 50),
    ];
    let view = visible_queue(rows, &QueueFilter::default());
    assert_eq!(ids(&view), vec!["C-641", "C-642", "C-643"]);
}

/// The documented composite: resolved last, then band, then recency.
#[test]
fn composite_ordering_contract() {
    let rows = vec![
        entry("C-651", "Resolved Medium", RiskBand::Medium, CaseStatus::Resolved, 9, 60),
        entry("C-652", "Old High", RiskBand::High, CaseStatus::InReview, 2, 85),
        entry("C-653", "New High", RiskBand::High, CaseStatus::New, 8, 72),
        entry("C-654", "Low", RiskBand::Low, CaseStatus::New, 9, 15),
        entry("C-655", "Medium", RiskBand::Medium, CaseStatus::InReview, 6, 55),
        entry("C-656", "Resolved High", RiskBand::High, CaseStatus::Resolved, 7, 95),
    ];
    let view = visible_queue(rows, &QueueFilter::default());
    assert_eq!(
        ids(&view),
        vec!["C-653", "C-652", "C-655", "C-654", "C-656", "C-651"],
        "actives by band then recency, resolveds last by band then recency"
    );
}

/// Search is a case-insensitive substring over display name and id,
/// with surrounding whitespace ignored.
#[test]
fn search_matches_name_and_id() {
    let rows = vec![
        entry("C-661", "Marcus Webb", RiskBand::Low, CaseStatus::New, 4, 20),
        entry("C-662", "Elena Vasquez", RiskBand::Low, CaseStatus::New, 5, 18),
    ];

    let by_name = QueueFilter { search: "  WEBB ".into(), ..QueueFilter::default() };
    let view = visible_queue(rows.clone(), &by_name);
    assert_eq!(ids(&view), vec!["C-661"]);

    let by_id = QueueFilter { search: "c-662".into(), ..QueueFilter::default() };
    let view = visible_queue(rows, &by_id);
    assert_eq!(ids(&view), vec!["C-662"]);
}

/// The band filter keeps exactly the chosen band.
#[test]
fn band_filter_is_exact() {
    let rows = vec![
        entry("C-671", "High", RiskBand::High, CaseStatus::New, 4, 80),
        entry("C-672", "Medium", RiskBand::Medium, CaseStatus::New, 5, 50),
        entry("C-673", "Low", RiskBand::Low, CaseStatus::New, 6, 12),
    ];
    let filter = QueueFilter { band: Some(RiskBand::Medium), ..QueueFilter::default() };
    let view = visible_queue(rows, &filter);
    assert_eq!(ids(&view), vec!["C-672"]);
}

/// Facets: Urgent keeps the High band regardless of status, Active
/// drops resolved cases, Resolved keeps only them.
#[test]
fn facets_partition_by_band_and_status() {
    let rows = vec![
        entry("C-681", "High active", RiskBand::High, CaseStatus::InReview, 4, 80),
        entry("C-682", "High resolved", RiskBand::High, CaseStatus::Resolved, 5, 85),
        entry("C-683", "Medium active", RiskBand::Medium, CaseStatus::New, 6, 50),
    ];

    let urgent = QueueFilter { facet: StatusFacet::Urgent, ..QueueFilter::default() };
    assert_eq!(ids(&visible_queue(rows.clone(), &urgent)), vec!["C-681", "C-682"]);

    let active = QueueFilter { facet: StatusFacet::Active, ..QueueFilter::default() };
    assert_eq!(ids(&visible_queue(rows.clone(), &active)), vec!["C-681", "C-683"]);

    let resolved = QueueFilter { facet: StatusFacet::Resolved, ..QueueFilter::default() };
    assert_eq!(ids(&visible_queue(rows, &resolved)), vec!["C-682"]);
}

/// Filters compose: search AND band AND facet must all hold.
#[test]
fn filters_compose() {
    let rows = vec![
        entry("C-691", "Viktor Orlov", RiskBand::High, CaseStatus::InReview, 4, 82),
        entry("C-692", "Viktor Novak", RiskBand::Medium, CaseStatus::InReview, 5, 55),
        entry("C-693", "Petra Orlov", RiskBand::High, CaseStatus::Resolved, 6, 88),
    ];
    let filter = QueueFilter {
        search: "orlov".into(),
        band: Some(RiskBand::High),
        facet: StatusFacet::Active,
        sort: SortPreference::IntakeDesc,
    };
    let view = visible_queue(rows, &filter);
    assert_eq!(ids(&view), vec!["C-691"]);
}

/// An empty result under an active filter is distinguishable from an
/// empty caseload.
#[test]
fn filtered_empty_versus_unloaded() {
    let rows = vec![entry("C-695", "Only Low", RiskBand::Low, CaseStatus::New, 4, 12)];
    let filter = QueueFilter { band: Some(RiskBand::High), ..QueueFilter::default() };

    let filtered = visible_queue(rows, &filter);
    assert_eq!(filtered.loaded, 1);
    assert!(filtered.entries.is_empty());
    assert!(filtered.filtered_to_empty());

    let unloaded = visible_queue(Vec::new(), &QueueFilter::default());
    assert_eq!(unloaded.loaded, 0);
    assert!(!unloaded.filtered_to_empty());
}
