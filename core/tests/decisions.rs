//! Decision workflow tests: the override justification gate, note
//! handling, role stamping, and the atomic resolve-and-append.

use chrono::{TimeZone, Utc};
use triage_core::{
    assessment::{ModelVerdict, ScoreBands, ScoringModel},
    clock::DeskClock,
    command::AnalystCommand,
    config::DeskConfig,
    decision::{default_acceptance_note, DecisionOutcome},
    engine::DeskEngine,
    error::{DeskError, DeskResult},
    intake::{CaseFeatures, CaseRecord, RiskBand},
    lifecycle::CaseStatus,
    reviewer_role::ReviewerRole,
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

fn status_of(engine: &DeskEngine, case_id: &str) -> CaseStatus {
    engine
        .store
        .lifecycle_record(&engine.session_id, case_id)
        .expect("lifecycle query")
        .expect("lifecycle row")
        .status
}

/// Overriding without a justification is rejected before anything is
/// touched: the case stays in review and the ledger stays empty.
#[test]
fn override_requires_justification() {
    let mut engine = build_desk("dec-gate-test");
    admit(&mut engine, "C-701", RiskBand::High);
    engine.select_case("C-701").expect("select");

    for bad_note in [None, Some(""), Some("   \n\t")] {
        let err = engine
            .commit_decision(DecisionOutcome::Overridden, bad_note)
            .expect_err("override without justification");
        assert!(
            matches!(err, DeskError::JustificationRequired { ref case_id } if case_id == "C-701"),
            "unexpected error: {err}"
        );
    }

    assert_eq!(status_of(&engine, "C-701"), CaseStatus::InReview);
    assert_eq!(engine.store.ledger_len(&engine.session_id).expect("len"), 0);

    // The selection survives the rejection, so the analyst can retry.
    engine
        .commit_decision(DecisionOutcome::Overridden, Some("Documented travel confirmed"))
        .expect("retry with justification");
    assert_eq!(status_of(&engine, "C-701"), CaseStatus::Resolved);
}

/// Justification text is trimmed before it is stored.
#[test]
fn justification_trimmed_before_store() {
    let mut engine = build_desk("dec-trim-test");
    admit(&mut engine, "C-711", RiskBand::Medium);
    engine.select_case("C-711").expect("select");

    let record = engine
        .commit_decision(DecisionOutcome::Overridden, Some("  cleared by phone  "))
        .expect("commit");
    assert_eq!(record.note, "cleared by phone");
}

/// An acceptance without a note synthesizes the deterministic default
/// wording from the recommendation and the acting role.
#[test]
fn acceptance_default_note_references_role() {
    let mut engine = build_desk("dec-default-test");
    admit(&mut engine, "C-721", RiskBand::Low);

    engine
        .apply(AnalystCommand::SetRole { role: ReviewerRole::ComplianceLead })
        .expect("set role");
    let selection = engine.select_case("C-721").expect("select");

    let record = engine
        .commit_decision(DecisionOutcome::Accepted, None)
        .expect("accept");
    assert_eq!(
        record.note,
        default_acceptance_note(
            &selection.assessment.recommended_action,
            ReviewerRole::ComplianceLead
        )
    );
    assert!(record.note.contains("(per Compliance Lead)"));
    assert_eq!(record.actor_role, ReviewerRole::ComplianceLead);
}

/// An acceptance with an explicit note keeps the note.
#[test]
fn acceptance_keeps_explicit_note() {
    let mut engine = build_desk("dec-explicit-test");
    admit(&mut engine, "C-731", RiskBand::Low);
    engine.select_case("C-731").expect("select");

    let record = engine
        .commit_decision(DecisionOutcome::Accepted, Some("Payroll pattern, verified"))
        .expect("accept");
    assert_eq!(record.note, "Payroll pattern, verified");
}

/// With no inline note the working note stands in, and the commit
/// clears it.
#[test]
fn working_note_feeds_commit_and_clears() {
    let mut engine = build_desk("dec-working-test");
    admit(&mut engine, "C-741", RiskBand::High);
    engine.select_case("C-741").expect("select");

    engine
        .apply(AnalystCommand::SetNote { text: "Second factor verified in branch".into() })
        .expect("set note");
    assert_eq!(engine.working_note(), "Second factor verified in branch");

    let record = engine
        .commit_decision(DecisionOutcome::Overridden, None)
        .expect("commit from working note");
    assert_eq!(record.note, "Second factor verified in branch");
    assert_eq!(engine.working_note(), "", "commit consumes the working note");
}

/// Switching cases discards the draft note; re-selecting the same case
/// keeps it.
#[test]
fn working_note_cleared_on_case_switch() {
    let mut engine = build_desk("dec-switch-test");
    admit(&mut engine, "C-751", RiskBand::Medium);
    admit(&mut engine, "C-752", RiskBand::Medium);

    engine.select_case("C-751").expect("select");
    engine
        .apply(AnalystCommand::SetNote { text: "draft for 751".into() })
        .expect("set note");

    engine.select_case("C-751").expect("re-select same case");
    assert_eq!(engine.working_note(), "draft for 751");

    engine.select_case("C-752").expect("switch case");
    assert_eq!(engine.working_note(), "", "switching cases discards the draft");
}

/// Decisions need a selected case and a loaded assessment.
#[test]
fn commit_preconditions_enforced() {
    let mut engine = build_desk("dec-precondition-test");
    admit(&mut engine, "C-761", RiskBand::Medium);

    let err = engine
        .commit_decision(DecisionOutcome::Accepted, None)
        .expect_err("no selection");
    assert!(matches!(err, DeskError::NoCaseSelected));

    // A failed fetch leaves the case selected but assessment-less.
    engine.set_model(Box::new(FailingModel));
    engine.select_case("C-761").expect_err("fetch fails");
    let err = engine
        .commit_decision(DecisionOutcome::Accepted, None)
        .expect_err("no assessment loaded");
    assert!(
        matches!(err, DeskError::AssessmentNotLoaded { ref case_id } if case_id == "C-761"),
        "unexpected error: {err}"
    );
    assert_eq!(status_of(&engine, "C-761"), CaseStatus::InReview);
}

/// A second commit on the same case is rejected atomically: no
/// lifecycle change, no ledger growth.
#[test]
fn duplicate_commit_rejected_without_side_effects() {
    let mut engine = build_desk("dec-duplicate-test");
    admit(&mut engine, "C-771", RiskBand::Medium);

    engine.select_case("C-771").expect("select");
    engine
        .commit_decision(DecisionOutcome::Accepted, None)
        .expect("first commit");
    let summary_before = engine.ledger_summary().expect("summary");
    assert_eq!(summary_before.total, 1);

    let revisit = engine.select_case("C-771").expect("revisit");
    assert!(revisit.already_resolved);

    let err = engine
        .commit_decision(DecisionOutcome::Overridden, Some("changed my mind"))
        .expect_err("duplicate commit");
    assert!(matches!(err, DeskError::AlreadyResolved { ref case_id } if case_id == "C-771"));

    let summary_after = engine.ledger_summary().expect("summary");
    assert_eq!(summary_after, summary_before, "rejected commits leave the ledger untouched");
    assert_eq!(status_of(&engine, "C-771"), CaseStatus::Resolved);
}

struct FailingModel;

impl ScoringModel for FailingModel {
    fn name(&self) -> &'static str {
        "failing_test"
    }

    fn score(&self, _case: &CaseRecord, _bands: &ScoreBands) -> DeskResult<ModelVerdict> {
        Err(DeskError::Other(anyhow::anyhow!("scoring service unavailable")))
    }
}
