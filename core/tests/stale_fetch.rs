//! Stale assessment guard tests: a late or superseded verdict is
//! discarded with a trace, never applied and never an error.

use chrono::{TimeZone, Utc};
use triage_core::{
    assessment::ModelVerdict,
    clock::DeskClock,
    config::DeskConfig,
    engine::{AssessmentOutcome, DeskEngine},
    intake::{CaseFeatures, CaseRecord, RiskBand, TREND_NOW_LABEL},
    store::DeskStore,
};

fn build_desk(session_id: &str) -> DeskEngine {
    let store = DeskStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    let clock = DeskClock::manual(
        session_id.to_string(),
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        60,
    );
    store
        .insert_session(session_id, 7, "0.1.0-test", clock.now())
        .expect("insert session");
    DeskEngine::build(session_id.to_string(), 7, DeskConfig::default(), store, clock)
        .expect("engine build")
}

fn admit(engine: &mut DeskEngine, case_id: &str, band: RiskBand) {
    let record = CaseRecord {
        case_id: case_id.to_string(),
        display_name: format!("Case {case_id}"),
        intake_at: Utc.with_ymd_and_hms(2024, 2, 20, 8, 0, 0).unwrap(),
        seed_band: band,
        features: CaseFeatures { account_age_days: 200, ..CaseFeatures::default() },
    };
    engine.admit_case(record, vec![], vec![]).expect("admit case");
}

fn late_verdict() -> ModelVerdict {
    ModelVerdict {
        score: 91,
        explanation: "late response from a slow backend".into(),
        risk_signals: vec!["synthetic signal".into()],
        recommended_action: "escalate".into(),
        confidence: 0.9,
        business_impact: "high".into(),
        why_not_low: Some("synthetic signal".into()),
    }
}

fn now_point_count(engine: &DeskEngine, case_id: &str) -> usize {
    engine
        .store
        .trend_for_case(&engine.session_id, case_id)
        .expect("trend")
        .iter()
        .filter(|p| p.label == TREND_NOW_LABEL)
        .count()
}

/// A response ticketed for a previous selection is discarded: the
/// newer case's assessment stays on screen untouched.
#[test]
fn late_response_for_previous_selection_discarded() {
    let mut engine = build_desk("stale-switch-test");
    admit(&mut engine, "C-901", RiskBand::High);
    admit(&mut engine, "C-902", RiskBand::Low);

    engine.select_case("C-901").expect("select first");
    let stale = engine.begin_assessment("C-901");
    engine.select_case("C-902").expect("switch");

    let current = engine.current_assessment().expect("assessment").clone();
    let outcome = engine
        .apply_assessment(&stale, late_verdict())
        .expect("apply is not an error");
    assert!(matches!(outcome, AssessmentOutcome::Discarded));

    let after = engine.current_assessment().expect("assessment");
    assert_eq!(after.case_id, "C-902");
    assert_eq!(after.score, current.score, "the late verdict must not leak in");
    assert_eq!(after.generation, current.generation);
}

/// Within one case, every new fetch supersedes the previous ticket.
#[test]
fn newer_ticket_supersedes_older() {
    let mut engine = build_desk("stale-generation-test");
    admit(&mut engine, "C-911", RiskBand::Medium);
    engine.select_case("C-911").expect("select");

    let older = engine.begin_assessment("C-911");
    let newer = engine.begin_assessment("C-911");

    let discarded = engine
        .apply_assessment(&older, late_verdict())
        .expect("apply older");
    assert!(matches!(discarded, AssessmentOutcome::Discarded));

    let applied = engine
        .apply_assessment(&newer, late_verdict())
        .expect("apply newer");
    match applied {
        AssessmentOutcome::Applied(assessment) => {
            assert_eq!(assessment.case_id, "C-911");
            assert_eq!(assessment.score, 91);
            assert_eq!(assessment.level, RiskBand::High, "derived from the score");
        }
        AssessmentOutcome::Discarded => panic!("current ticket must apply"),
    }
}

/// A discard is traced in the event log with both generations, and
/// appends nothing to the case's trend.
#[test]
fn discard_leaves_trace_but_no_data() {
    let mut engine = build_desk("stale-trace-test");
    admit(&mut engine, "C-921", RiskBand::High);
    admit(&mut engine, "C-922", RiskBand::Low);

    engine.select_case("C-921").expect("select first");
    let stale = engine.begin_assessment("C-921");
    engine.select_case("C-922").expect("switch");

    let before = now_point_count(&engine, "C-921");
    engine
        .apply_assessment(&stale, late_verdict())
        .expect("apply");
    assert_eq!(
        now_point_count(&engine, "C-921"),
        before,
        "discarded responses never touch the trend"
    );

    let traces = engine
        .store
        .events_of_type(&engine.session_id, "stale_assessment_discarded")
        .expect("events");
    assert_eq!(traces.len(), 1);

    let payload: serde_json::Value =
        serde_json::from_str(&traces[0].payload).expect("payload json");
    assert_eq!(payload["case_id"], "C-921");
    let ticket_generation = payload["generation"].as_u64().expect("generation");
    let current_generation = payload["current_generation"].as_u64().expect("current");
    assert!(
        ticket_generation < current_generation,
        "trace must show the superseding generation: {ticket_generation} vs {current_generation}"
    );
}

/// A ticket with no selection behind it is stale by definition.
#[test]
fn ticket_without_selection_discarded() {
    let mut engine = build_desk("stale-unselected-test");
    admit(&mut engine, "C-931", RiskBand::Medium);

    let ticket = engine.begin_assessment("C-931");
    let outcome = engine
        .apply_assessment(&ticket, late_verdict())
        .expect("apply");
    assert!(matches!(outcome, AssessmentOutcome::Discarded));
    assert!(engine.current_assessment().is_none());
}

/// An applied assessment appends exactly one "Now" trend point and one
/// recorded event; discards add neither.
#[test]
fn applied_assessment_writes_now_point() {
    let mut engine = build_desk("stale-applied-test");
    admit(&mut engine, "C-941", RiskBand::Medium);

    engine.select_case("C-941").expect("select");
    assert_eq!(now_point_count(&engine, "C-941"), 1);

    let recorded = engine
        .store
        .events_of_type(&engine.session_id, "assessment_recorded")
        .expect("events");
    assert_eq!(recorded.len(), 1);
}
