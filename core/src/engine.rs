//! The desk engine — the heart of the triage desk.
//!
//! ACTION ORDER (fixed, documented, never reordered):
//!   1. select case     -> lifecycle promotion + fresh assessment
//!   2. simulate event  -> counter bump + fresh assessment
//!   3. commit decision -> atomic resolve + ledger append
//!
//! RULES:
//!   - Every analyst action runs to completion before the next one is
//!     taken. There is no background work between actions.
//!   - The assessment is recomputed at exactly two call sites: case
//!     selection and a simulated case event. Never implicitly.
//!   - Case feature counters change only through the simulated-event
//!     path.
//!   - Recording an assessment appends one "Now" trend observation.
//!     That is the assessment path's only write.
//!   - All state changes are recorded in the event log.
//!   - Only a committed decision appends to the audit ledger.

use crate::{
    assessment::{AssessmentTicket, ModelVerdict, RiskAssessment, RuleBasedModel, ScoringModel},
    clock::DeskClock,
    command::AnalystCommand,
    config::DeskConfig,
    decision::{resolve_note, DecisionOutcome},
    error::{DeskError, DeskResult},
    event::{DeskEvent, EventLogEntry},
    intake::{
        CaseEventKind, CaseRecord, IntakeGenerator, SignalWeight, TrendPoint, TREND_NOW_LABEL,
    },
    ledger::{AuditRecord, LedgerSortKey, LedgerSummary, SortDirection},
    lifecycle::CaseStatus,
    queue::{QueueEntry, QueueFilter, QueueView},
    reviewer_role::ReviewerRole,
    snapshot::{CaseSnapshot, DeskSnapshot},
    store::DeskStore,
    types::{CaseId, SessionId},
};
use std::collections::HashMap;

// ── Action results ───────────────────────────────────────────────────────────

/// What one case selection produced.
#[derive(Debug, Clone)]
pub struct Selection {
    pub case_id:          CaseId,
    /// The case was already terminal before this selection. Review
    /// access is still granted; committing another decision is not.
    pub already_resolved: bool,
    pub assessment:       RiskAssessment,
}

/// How a fetched verdict fared against the staleness guard.
#[derive(Debug)]
pub enum AssessmentOutcome {
    Applied(RiskAssessment),
    /// The ticket was superseded before the verdict arrived. Traced in
    /// the event log, never surfaced as an error.
    Discarded,
}

// ── The engine ───────────────────────────────────────────────────────────────

pub struct DeskEngine {
    pub session_id: SessionId,
    pub clock:      DeskClock,
    pub config:     DeskConfig,
    pub store:      DeskStore,

    seed:  u64,
    model: Box<dyn ScoringModel>,

    // Transient review state. Deliberately not persisted: a restart
    // puts the analyst back on a clean selection.
    filter:             QueueFilter,
    acting_role:        ReviewerRole,
    selected:           Option<CaseId>,
    current_assessment: Option<RiskAssessment>,
    working_note:       String,
    fetch_generation:   u64,
}

impl DeskEngine {
    pub fn new(
        session_id: SessionId,
        seed: u64,
        config: DeskConfig,
        store: DeskStore,
        clock: DeskClock,
    ) -> Self {
        Self {
            session_id,
            clock,
            config,
            store,
            seed,
            model:              Box::new(RuleBasedModel),
            filter:             QueueFilter::default(),
            acting_role:        ReviewerRole::default(),
            selected:           None,
            current_assessment: None,
            working_note:       String::new(),
            fetch_generation:   0,
        }
    }

    /// Build a fully wired engine and record the session start.
    /// The caller inserts the session row first (see `DeskStore`).
    pub fn build(
        session_id: SessionId,
        seed: u64,
        config: DeskConfig,
        store: DeskStore,
        clock: DeskClock,
    ) -> DeskResult<Self> {
        let engine = Self::new(session_id, seed, config, store, clock);
        engine.emit(
            "engine",
            &DeskEvent::SessionStarted { session_id: engine.session_id.clone(), seed },
        )?;
        Ok(engine)
    }

    /// Swap the scoring backend. The default is [`RuleBasedModel`];
    /// anything implementing [`ScoringModel`] slots in here.
    pub fn set_model(&mut self, model: Box<dyn ScoringModel>) {
        self.model = model;
    }

    // ── Read accessors ───────────────────────────────────────────────────────

    pub fn selected_case(&self) -> Option<&CaseId> {
        self.selected.as_ref()
    }

    pub fn current_assessment(&self) -> Option<&RiskAssessment> {
        self.current_assessment.as_ref()
    }

    pub fn working_note(&self) -> &str {
        &self.working_note
    }

    pub fn acting_role(&self) -> ReviewerRole {
        self.acting_role
    }

    pub fn filter(&self) -> &QueueFilter {
        &self.filter
    }

    // ── Intake ───────────────────────────────────────────────────────────────

    /// Admit one case with its seed history. Used by intake seeding
    /// and by tests that need a hand-built caseload.
    pub fn admit_case(
        &mut self,
        record: CaseRecord,
        trend: Vec<TrendPoint>,
        signals: Vec<SignalWeight>,
    ) -> DeskResult<()> {
        self.store.insert_case(&self.session_id, &record)?;
        for point in &trend {
            self.store.append_trend_point(&self.session_id, &record.case_id, point)?;
        }
        for signal in &signals {
            self.store.insert_signal_weight(&self.session_id, &record.case_id, signal)?;
        }
        self.store.insert_lifecycle(&self.session_id, &record.case_id)?;
        self.emit(
            "engine",
            &DeskEvent::CaseAdmitted {
                seq:     self.clock.current_seq,
                case_id: record.case_id.clone(),
                band:    record.seed_band,
            },
        )?;
        Ok(())
    }

    /// Seed the caseload from the session seed. Returns the count.
    pub fn seed_intake(&mut self) -> DeskResult<usize> {
        let mut generator = IntakeGenerator::new(self.seed);
        let cases = generator.generate(&self.config.intake, self.clock.now());
        let count = cases.len();
        for case in cases {
            self.admit_case(case.record, case.trend, case.signals)?;
        }
        log::info!("seeded {count} cases for session {}", self.session_id);
        Ok(count)
    }

    // ── Selection & lifecycle ────────────────────────────────────────────────

    /// Select a case for review.
    ///
    /// Promotes a NEW case into review (stamping the entry time on the
    /// first promotion only), surfaces the already-resolved advisory
    /// for terminal cases, and recomputes the assessment. Switching to
    /// a different case discards the working note.
    pub fn select_case(&mut self, case_id: &str) -> DeskResult<Selection> {
        let record = self
            .store
            .case_record(&self.session_id, case_id)?
            .ok_or_else(|| DeskError::CaseNotFound { case_id: case_id.to_string() })?;
        let lifecycle = self
            .store
            .lifecycle_record(&self.session_id, case_id)?
            .ok_or_else(|| DeskError::CaseNotFound { case_id: case_id.to_string() })?;

        let seq = self.clock.advance();
        if self.selected.as_deref() != Some(case_id) {
            self.working_note.clear();
        }
        self.selected = Some(record.case_id.clone());
        self.current_assessment = None;
        self.emit("engine", &DeskEvent::CaseSelected { seq, case_id: record.case_id.clone() })?;

        let already_resolved = lifecycle.status.is_terminal();
        if already_resolved {
            self.emit(
                "engine",
                &DeskEvent::ResolvedCaseRevisited { seq, case_id: record.case_id.clone() },
            )?;
        } else if self.store.mark_in_review(&self.session_id, case_id, self.clock.now())? {
            self.emit("engine", &DeskEvent::ReviewOpened { seq, case_id: record.case_id.clone() })?;
        }

        let assessment = self.run_assessment(&record)?;
        Ok(Selection { case_id: record.case_id.clone(), already_resolved, assessment })
    }

    /// Whole minutes the case has sat in review, measured from the
    /// first promotion. `None` until the case has entered review.
    pub fn review_age_minutes(&self, case_id: &str) -> DeskResult<Option<i64>> {
        let lifecycle = self
            .store
            .lifecycle_record(&self.session_id, case_id)?
            .ok_or_else(|| DeskError::CaseNotFound { case_id: case_id.to_string() })?;
        Ok(lifecycle.review_age_minutes(self.clock.now()))
    }

    /// Whether the case has been in review past the configured SLA.
    pub fn is_overdue(&self, case_id: &str) -> DeskResult<bool> {
        let lifecycle = self
            .store
            .lifecycle_record(&self.session_id, case_id)?
            .ok_or_else(|| DeskError::CaseNotFound { case_id: case_id.to_string() })?;
        Ok(lifecycle.is_overdue(self.clock.now(), self.config.review_sla_minutes))
    }

    // ── Assessment ───────────────────────────────────────────────────────────

    /// Tag a new assessment fetch for `case_id`. Every call supersedes
    /// all earlier tickets.
    pub fn begin_assessment(&mut self, case_id: &str) -> AssessmentTicket {
        self.fetch_generation += 1;
        AssessmentTicket { case_id: case_id.to_string(), generation: self.fetch_generation }
    }

    /// Apply a fetched verdict under the staleness guard.
    ///
    /// A ticket that no longer matches the current selection and
    /// generation is discarded, so a slow response can never clobber
    /// the assessment of a newer selection. A malformed verdict is
    /// rejected as [`DeskError::AssessmentFetchFailed`].
    pub fn apply_assessment(
        &mut self,
        ticket: &AssessmentTicket,
        verdict: ModelVerdict,
    ) -> DeskResult<AssessmentOutcome> {
        let seq = self.clock.current_seq;
        let is_current = ticket.generation == self.fetch_generation
            && self.selected.as_deref() == Some(ticket.case_id.as_str());
        if !is_current {
            log::debug!(
                "discarding stale assessment for {} (ticket generation {}, current {})",
                ticket.case_id,
                ticket.generation,
                self.fetch_generation
            );
            self.emit(
                "assessment",
                &DeskEvent::StaleAssessmentDiscarded {
                    seq,
                    case_id: ticket.case_id.clone(),
                    generation: ticket.generation,
                    current_generation: self.fetch_generation,
                },
            )?;
            return Ok(AssessmentOutcome::Discarded);
        }

        let assessment = match RiskAssessment::from_verdict(
            &ticket.case_id,
            ticket.generation,
            verdict,
            &self.config.bands,
        ) {
            Ok(assessment) => assessment,
            Err(err) => {
                if let DeskError::AssessmentFetchFailed { reason, .. } = &err {
                    self.emit(
                        "assessment",
                        &DeskEvent::AssessmentFetchFailed {
                            seq,
                            case_id: ticket.case_id.clone(),
                            reason:  reason.clone(),
                        },
                    )?;
                }
                self.current_assessment = None;
                return Err(err);
            }
        };

        self.store.append_trend_point(
            &self.session_id,
            &ticket.case_id,
            &TrendPoint { label: TREND_NOW_LABEL.to_string(), score: assessment.score },
        )?;
        self.emit(
            "assessment",
            &DeskEvent::AssessmentRecorded {
                seq,
                case_id: ticket.case_id.clone(),
                generation: ticket.generation,
                score: assessment.score,
                level: assessment.level,
            },
        )?;
        self.current_assessment = Some(assessment.clone());
        Ok(AssessmentOutcome::Applied(assessment))
    }

    /// The one recompute path: issue a ticket, call the backend, apply
    /// the verdict under the guard.
    fn run_assessment(&mut self, record: &CaseRecord) -> DeskResult<RiskAssessment> {
        let ticket = self.begin_assessment(&record.case_id);
        let verdict = self.fetch_verdict(record)?;
        match self.apply_assessment(&ticket, verdict)? {
            AssessmentOutcome::Applied(assessment) => Ok(assessment),
            // Nothing can supersede the ticket inside a single action.
            AssessmentOutcome::Discarded => Err(DeskError::Other(anyhow::anyhow!(
                "assessment ticket superseded mid-action"
            ))),
        }
    }

    /// Call the scoring backend. On failure the case stays selected
    /// with no assessment loaded; retry is the analyst re-selecting.
    fn fetch_verdict(&mut self, record: &CaseRecord) -> DeskResult<ModelVerdict> {
        match self.model.score(record, &self.config.bands) {
            Ok(verdict) => Ok(verdict),
            Err(err) => {
                let reason = err.to_string();
                log::warn!("assessment fetch failed for {}: {reason}", record.case_id);
                self.emit(
                    "assessment",
                    &DeskEvent::AssessmentFetchFailed {
                        seq:     self.clock.current_seq,
                        case_id: record.case_id.clone(),
                        reason:  reason.clone(),
                    },
                )?;
                self.current_assessment = None;
                Err(DeskError::AssessmentFetchFailed { case_id: record.case_id.clone(), reason })
            }
        }
    }

    // ── Simulated case events ────────────────────────────────────────────────

    /// Apply a simulated event to the selected case: exactly one
    /// feature counter goes up, then the assessment is recomputed.
    pub fn simulate_event(&mut self, kind: CaseEventKind) -> DeskResult<RiskAssessment> {
        let case_id = self.selected.clone().ok_or(DeskError::NoCaseSelected)?;
        let seq = self.clock.advance();
        self.store.increment_feature(&self.session_id, &case_id, kind)?;
        self.emit("engine", &DeskEvent::CaseEventSimulated { seq, case_id: case_id.clone(), kind })?;
        let record = self
            .store
            .case_record(&self.session_id, &case_id)?
            .ok_or_else(|| DeskError::CaseNotFound { case_id: case_id.clone() })?;
        self.run_assessment(&record)
    }

    // ── Decision ─────────────────────────────────────────────────────────────

    /// Commit a binding decision on the selected case.
    ///
    /// The precondition chain runs before any mutation: a selected
    /// case, a loaded assessment for it, a non-terminal status, and a
    /// note valid for the outcome. The resolve and the ledger append
    /// then land in a single store transaction. When `note` is `None`
    /// the working note stands in; an empty note falls back to the
    /// default acceptance wording (accepts only — overrides must carry
    /// a justification).
    pub fn commit_decision(
        &mut self,
        outcome: DecisionOutcome,
        note: Option<&str>,
    ) -> DeskResult<AuditRecord> {
        let case_id = self.selected.clone().ok_or(DeskError::NoCaseSelected)?;
        let assessment = match &self.current_assessment {
            Some(assessment) if assessment.case_id == case_id => assessment.clone(),
            _ => return Err(DeskError::AssessmentNotLoaded { case_id }),
        };
        let lifecycle = self
            .store
            .lifecycle_record(&self.session_id, &case_id)?
            .ok_or_else(|| DeskError::CaseNotFound { case_id: case_id.clone() })?;
        if lifecycle.status.is_terminal() {
            return Err(DeskError::AlreadyResolved { case_id });
        }

        let supplied = match note {
            Some(text) => Some(text),
            None if self.working_note.trim().is_empty() => None,
            None => Some(self.working_note.as_str()),
        };
        let resolved = resolve_note(
            &case_id,
            outcome,
            supplied,
            &assessment.recommended_action,
            self.acting_role,
        )?;

        let seq = self.clock.advance();
        let record = AuditRecord {
            seq:        None,
            record_id:  uuid::Uuid::new_v4().to_string(),
            case_id:    case_id.clone(),
            outcome,
            actor_role: self.acting_role,
            note:       resolved,
            decided_at: self.clock.now(),
        };
        self.store.commit_decision(&self.session_id, &record)?;
        self.working_note.clear();
        self.emit(
            "decision",
            &DeskEvent::DecisionCommitted {
                seq,
                case_id: case_id.clone(),
                outcome,
                actor_role: self.acting_role,
            },
        )?;
        log::info!("decision committed on {case_id}: {}", outcome.as_str());
        Ok(record)
    }

    // ── Projections ──────────────────────────────────────────────────────────

    /// Derive the visible queue. Pure projection, recomputed on every
    /// call from the store plus the transient filter.
    pub fn visible_queue(&self) -> DeskResult<QueueView> {
        let statuses: HashMap<CaseId, CaseStatus> = self
            .store
            .all_lifecycle(&self.session_id)?
            .into_iter()
            .map(|lifecycle| (lifecycle.case_id, lifecycle.status))
            .collect();
        let mut rows = Vec::new();
        for record in self.store.all_cases(&self.session_id)? {
            let status = statuses.get(&record.case_id).copied().unwrap_or(CaseStatus::New);
            let latest_score = self
                .store
                .latest_trend_score(&self.session_id, &record.case_id)?
                .unwrap_or(0);
            rows.push(QueueEntry {
                case_id: record.case_id,
                display_name: record.display_name,
                band: record.seed_band,
                status,
                intake_at: record.intake_at,
                latest_score,
            });
        }
        Ok(crate::queue::visible_queue(rows, &self.filter))
    }

    /// Re-project the audit ledger under a sort key. The rows are the
    /// same committed records whichever key is chosen.
    pub fn ledger(
        &self,
        key: LedgerSortKey,
        direction: SortDirection,
    ) -> DeskResult<Vec<AuditRecord>> {
        self.store.audit_records(&self.session_id, key, direction)
    }

    pub fn ledger_summary(&self) -> DeskResult<LedgerSummary> {
        self.store.ledger_summary(&self.session_id)
    }

    /// Capture the read-only export projection.
    pub fn snapshot(&self) -> DeskResult<DeskSnapshot> {
        let mut cases = Vec::new();
        for record in self.store.all_cases(&self.session_id)? {
            let lifecycle = self
                .store
                .lifecycle_record(&self.session_id, &record.case_id)?
                .ok_or_else(|| DeskError::CaseNotFound { case_id: record.case_id.clone() })?;
            let trend = self.store.trend_for_case(&self.session_id, &record.case_id)?;
            let signals = self.store.signals_for_case(&self.session_id, &record.case_id)?;
            cases.push(CaseSnapshot { record, lifecycle, trend, signals });
        }
        Ok(DeskSnapshot {
            session_id:  self.session_id.clone(),
            seq:         self.clock.current_seq,
            captured_at: self.clock.now(),
            cases,
            ledger: self.store.audit_records(
                &self.session_id,
                LedgerSortKey::DecidedAt,
                SortDirection::Asc,
            )?,
            summary: self.store.ledger_summary(&self.session_id)?,
        })
    }

    // ── Command dispatch ─────────────────────────────────────────────────────

    /// Dispatch one analyst command. The IPC surface and scripted
    /// runners both come through here.
    pub fn apply(&mut self, command: AnalystCommand) -> DeskResult<()> {
        match command {
            AnalystCommand::SelectCase { case_id } => {
                self.select_case(&case_id)?;
            }
            AnalystCommand::SimulateEvent { kind } => {
                self.simulate_event(kind)?;
            }
            AnalystCommand::CommitDecision { outcome, note } => {
                self.commit_decision(outcome, note.as_deref())?;
            }
            AnalystCommand::SetNote { text } => self.working_note = text,
            AnalystCommand::SetRole { role } => self.acting_role = role,
            AnalystCommand::SetSearch { text } => self.filter.search = text,
            AnalystCommand::SetBandFilter { band } => self.filter.band = band,
            AnalystCommand::SetFacet { facet } => self.filter.facet = facet,
            AnalystCommand::SetSort { sort } => self.filter.sort = sort,
        }
        Ok(())
    }

    /// Persist one event to the append-only log.
    fn emit(&self, source: &str, event: &DeskEvent) -> DeskResult<()> {
        let entry = EventLogEntry {
            id:          None,
            session_id:  self.session_id.clone(),
            seq:         self.clock.current_seq,
            source:      source.to_string(),
            event_type:  event_type_name(event).to_string(),
            payload:     serde_json::to_string(event)?,
            recorded_at: self.clock.now(),
        };
        self.store.append_event(&entry)
    }
}

/// Extract a stable string name from a DeskEvent variant.
/// Used for the event_type column in event_log.
fn event_type_name(event: &DeskEvent) -> &'static str {
    match event {
        DeskEvent::SessionStarted { .. }           => "session_started",
        DeskEvent::CaseAdmitted { .. }             => "case_admitted",
        DeskEvent::CaseSelected { .. }             => "case_selected",
        DeskEvent::ReviewOpened { .. }             => "review_opened",
        DeskEvent::ResolvedCaseRevisited { .. }    => "resolved_case_revisited",
        DeskEvent::AssessmentRecorded { .. }       => "assessment_recorded",
        DeskEvent::AssessmentFetchFailed { .. }    => "assessment_fetch_failed",
        DeskEvent::StaleAssessmentDiscarded { .. } => "stale_assessment_discarded",
        DeskEvent::CaseEventSimulated { .. }       => "case_event_simulated",
        DeskEvent::DecisionCommitted { .. }        => "decision_committed",
    }
}
