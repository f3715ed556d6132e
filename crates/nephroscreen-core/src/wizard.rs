//! Wizard state machine tying the flow controller and classifier together.
//!
//! `Intake -> InProgress(step) -> Submitting -> Resulted`, with `Restart`
//! looping back to `Intake` (fresh) or straight to the first question
//! (identity retained for a "check another relative" run).
//!
//! The engine is a plain value with one writer: every mutation happens in
//! response to a discrete host action, and the whole engine serializes so
//! hosts can persist it between invocations. Side effects are never
//! performed here -- completing a run emits [`Command`]s for the outer
//! shell, and a failing sink must not change the computed result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crm::LeadPayload;
use crate::events::{Event, NavDirection};
use crate::qr::ScanContext;
use crate::questionnaire::flow::{next_visible_index, previous_visible_index, BackTarget};
use crate::questionnaire::{ids, AnswerSet, Language, Question, Questionnaire};
use crate::risk::{classify, derive_age_group, AssessmentResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
    Other,
}

/// Identity fields collected by the intake form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    /// Optional contact number; required only for CRM forwarding.
    #[serde(default)]
    pub phone: String,
}

/// How a restart treats previously collected identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartMode {
    /// Clear everything and return to the intake form.
    Fresh,
    /// Keep the identity and jump straight to the first question.
    RetainIdentity,
}

/// Whether this run screens the submitter or a relative they entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreeningMode {
    SelfCheck,
    Relative,
}

/// Wizard lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    /// Collecting identity fields.
    Intake,
    /// Showing the question at `step`.
    InProgress { step: usize },
    /// Classification and command emission in flight.
    Submitting,
    /// Terminal: result available, only restart leaves this phase.
    Resulted,
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Intake => "intake",
            Phase::InProgress { .. } => "in_progress",
            Phase::Submitting => "submitting",
            Phase::Resulted => "resulted",
        }
    }
}

/// Host-driven wizard actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WizardAction {
    /// Record an answer for the current question and advance.
    Answer { question_id: String, value: String },
    /// Advance over a question that already has an answer.
    Next,
    /// Step back to the previous visible question (or the intake form).
    Back,
    /// Reset the wizard.
    Restart { mode: RestartMode },
}

/// A side effect for the outer shell. Execution is fire-and-forget with
/// respect to the result: a sink failure is logged and surfaced as a
/// warning, never allowed to undo `Resulted`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Command {
    PersistSubmission(Submission),
    ForwardLead(LeadPayload),
}

/// The full record handed to the persistence sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub user_id: String,
    pub qr_no: String,
    pub location_code: String,
    pub unit: String,
    pub user: Identity,
    pub answers: AnswerSet,
    pub zone: crate::risk::Zone,
    pub code: String,
    pub language: Language,
    pub mode: ScreeningMode,
    pub created_at: DateTime<Utc>,
}

/// Error type for wizard operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    /// No screening location resolved for the scanned code.
    #[error("no screening location resolved; scan a valid QR code first")]
    MissingScanContext,
    /// Identity required but not collected.
    #[error("identity has not been collected yet")]
    MissingIdentity,
    /// Intake form failed validation.
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),
    /// Action not legal in the current phase.
    #[error("cannot {action} while in the {phase} phase")]
    InvalidPhase {
        action: &'static str,
        phase: &'static str,
    },
    /// Answer arrived for a question other than the current one.
    #[error("question '{expected}' is current, got an answer for '{got}'")]
    QuestionMismatch { expected: String, got: String },
    /// Answer value is not one of the question's options.
    #[error("'{value}' is not an option for question '{question_id}'")]
    InvalidValue { question_id: String, value: String },
    /// `Next` over a question that has no recorded answer.
    #[error("question '{0}' has not been answered yet")]
    NotAnswered(String),
}

/// Result of applying one action: the event to render plus any commands
/// for the outer shell.
#[derive(Debug, Clone)]
pub struct Advance {
    pub event: Event,
    pub commands: Vec<Command>,
}

impl Advance {
    fn event(event: Event) -> Self {
        Self {
            event,
            commands: Vec::new(),
        }
    }
}

/// The wizard state machine. One per session; never shared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardEngine {
    questionnaire: Questionnaire,
    context: ScanContext,
    language: Language,
    mode: ScreeningMode,
    phase: Phase,
    identity: Option<Identity>,
    answers: AnswerSet,
    result: Option<AssessmentResult>,
    direction: NavDirection,
}

impl WizardEngine {
    /// Create a new engine for a resolved scan context. Entry without a
    /// resolved context is blocked upstream ([`WizardError::MissingScanContext`]).
    pub fn new(questionnaire: Questionnaire, context: ScanContext, language: Language) -> Self {
        Self {
            questionnaire,
            context,
            language,
            mode: ScreeningMode::SelfCheck,
            phase: Phase::Intake,
            identity: None,
            answers: AnswerSet::new(),
            result: None,
            direction: NavDirection::Forward,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn mode(&self) -> ScreeningMode {
        self.mode
    }

    pub fn context(&self) -> &ScanContext {
        &self.context
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn result(&self) -> Option<&AssessmentResult> {
        self.result.as_ref()
    }

    /// Direction of the most recent step change, for presentation.
    pub fn direction(&self) -> NavDirection {
        self.direction
    }

    pub fn questionnaire(&self) -> &Questionnaire {
        &self.questionnaire
    }

    /// The question currently on screen, when a run is in progress.
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            Phase::InProgress { step } => self.questionnaire.get(step),
            _ => None,
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let step_index = match self.phase {
            Phase::InProgress { step } => Some(step),
            _ => None,
        };
        Event::StateSnapshot {
            phase: self.phase.name().to_string(),
            step_index,
            question_id: self.current_question().map(|q| q.id.clone()),
            answered: self.answers.len(),
            total: self.questionnaire.len(),
            zone: self.result.as_ref().map(|r| r.zone),
            code: self.result.as_ref().map(|r| r.code.clone()),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Validate the intake form, synthesize the age-group answer into
    /// slot 0 and move to the first visible question.
    pub fn submit_intake(&mut self, identity: Identity) -> Result<Advance, WizardError> {
        if self.phase != Phase::Intake {
            return Err(WizardError::InvalidPhase {
                action: "submit intake",
                phase: self.phase.name(),
            });
        }
        Self::validate_identity(&identity)?;

        self.answers
            .insert(ids::AGE_GROUP, derive_age_group(identity.age));
        self.identity = Some(identity);
        self.direction = NavDirection::Forward;

        let first = next_visible_index(self.questionnaire.questions(), 0, &self.answers);
        if first == self.questionnaire.len() {
            // A bank with only the derived question; degenerate but legal.
            return self.finish();
        }
        self.phase = Phase::InProgress { step: first };
        log::debug!("intake complete, first interactive step {first}");
        Ok(Advance::event(Event::IntakeCompleted {
            first_step: first,
            at: Utc::now(),
        }))
    }

    /// Apply one host action.
    pub fn apply(&mut self, action: WizardAction) -> Result<Advance, WizardError> {
        match action {
            WizardAction::Answer { question_id, value } => self.answer(&question_id, value),
            WizardAction::Next => self.next(),
            WizardAction::Back => self.back(),
            WizardAction::Restart { mode } => self.restart(mode),
        }
    }

    fn answer(&mut self, question_id: &str, value: String) -> Result<Advance, WizardError> {
        let step = self.in_progress_step("answer")?;
        let question = self
            .questionnaire
            .get(step)
            .expect("in-progress step always points at a question");
        if question.id != question_id {
            return Err(WizardError::QuestionMismatch {
                expected: question.id.clone(),
                got: question_id.to_string(),
            });
        }
        if !question.accepts(&value) {
            return Err(WizardError::InvalidValue {
                question_id: question_id.to_string(),
                value,
            });
        }
        self.answers.insert(question_id, value);
        self.advance_from(step)
    }

    fn next(&mut self) -> Result<Advance, WizardError> {
        let step = self.in_progress_step("advance")?;
        let question = self
            .questionnaire
            .get(step)
            .expect("in-progress step always points at a question");
        if !self.answers.contains(&question.id) {
            return Err(WizardError::NotAnswered(question.id.clone()));
        }
        self.advance_from(step)
    }

    fn back(&mut self) -> Result<Advance, WizardError> {
        let step = self.in_progress_step("step back")?;
        self.direction = NavDirection::Backward;
        match previous_visible_index(self.questionnaire.questions(), step, &self.answers) {
            BackTarget::Question(index) => {
                self.phase = Phase::InProgress { step: index };
                let question = self
                    .questionnaire
                    .get(index)
                    .expect("backward scan returns in-range indices");
                Ok(Advance::event(Event::StepChanged {
                    step_index: index,
                    question_id: question.id.clone(),
                    direction: NavDirection::Backward,
                    at: Utc::now(),
                }))
            }
            BackTarget::Intake => {
                // Identity and answers are kept so the form re-opens
                // pre-filled; re-submitting intake re-derives slot 0.
                self.phase = Phase::Intake;
                Ok(Advance::event(Event::ReturnedToIntake { at: Utc::now() }))
            }
        }
    }

    fn restart(&mut self, mode: RestartMode) -> Result<Advance, WizardError> {
        self.answers = AnswerSet::new();
        self.result = None;
        self.direction = NavDirection::Forward;
        match mode {
            RestartMode::Fresh => {
                self.identity = None;
                self.mode = ScreeningMode::SelfCheck;
                self.phase = Phase::Intake;
            }
            RestartMode::RetainIdentity => {
                let identity = self.identity.clone().ok_or(WizardError::MissingIdentity)?;
                self.mode = ScreeningMode::Relative;
                self.answers
                    .insert(ids::AGE_GROUP, derive_age_group(identity.age));
                let first = next_visible_index(self.questionnaire.questions(), 0, &self.answers);
                if first == self.questionnaire.len() {
                    return self.finish();
                }
                self.phase = Phase::InProgress { step: first };
            }
        }
        log::debug!("wizard restarted ({mode:?})");
        Ok(Advance::event(Event::Restarted {
            mode,
            at: Utc::now(),
        }))
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn in_progress_step(&self, action: &'static str) -> Result<usize, WizardError> {
        match self.phase {
            Phase::InProgress { step } => Ok(step),
            _ => Err(WizardError::InvalidPhase {
                action,
                phase: self.phase.name(),
            }),
        }
    }

    /// Move forward from `step`, purging stale answers of questions the
    /// scan skips as hidden so they cannot leak into classification.
    fn advance_from(&mut self, step: usize) -> Result<Advance, WizardError> {
        let next = next_visible_index(self.questionnaire.questions(), step, &self.answers);
        let skipped: Vec<String> = self.questionnaire.questions()[step + 1..next]
            .iter()
            .map(|q| q.id.clone())
            .collect();
        for id in skipped {
            if self.answers.remove(&id).is_some() {
                log::debug!("purged stale answer for hidden question {id}");
            }
        }

        self.direction = NavDirection::Forward;
        if next == self.questionnaire.len() {
            return self.finish();
        }
        self.phase = Phase::InProgress { step: next };
        let question = self
            .questionnaire
            .get(next)
            .expect("scan returned an in-range index");
        Ok(Advance {
            event: Event::StepChanged {
                step_index: next,
                question_id: question.id.clone(),
                direction: NavDirection::Forward,
                at: Utc::now(),
            },
            commands: Vec::new(),
        })
    }

    /// Classify, generate the code and emit persistence/CRM commands.
    /// The transition to `Resulted` is unconditional once classification
    /// completes; sink outcomes are the shell's concern.
    fn finish(&mut self) -> Result<Advance, WizardError> {
        let identity = self.identity.clone().ok_or(WizardError::MissingIdentity)?;
        self.phase = Phase::Submitting;

        let now = Utc::now();
        let zone = classify(&self.answers);
        let result = AssessmentResult::new(zone, now);

        let submission = Submission {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: uuid::Uuid::new_v4().to_string(),
            qr_no: self.context.qr_no.clone(),
            location_code: self.context.location_code.clone(),
            unit: self.context.unit.clone(),
            user: identity.clone(),
            answers: self.answers.clone(),
            zone,
            code: result.code.clone(),
            language: self.language,
            mode: self.mode,
            created_at: now,
        };
        let lead = LeadPayload {
            name: identity.name,
            phone: identity.phone,
            zone,
            code: result.code.clone(),
            location_code: self.context.location_code.clone(),
            language: self.language,
        };

        let event = Event::AssessmentCompleted {
            zone,
            code: result.code.clone(),
            at: now,
        };
        self.result = Some(result);
        self.phase = Phase::Resulted;
        log::debug!("assessment completed: zone {zone}");

        Ok(Advance {
            event,
            commands: vec![
                Command::PersistSubmission(submission),
                Command::ForwardLead(lead),
            ],
        })
    }

    fn validate_identity(identity: &Identity) -> Result<(), WizardError> {
        if identity.name.trim().is_empty() {
            return Err(WizardError::InvalidIdentity("name is required".into()));
        }
        if identity.age > 120 {
            return Err(WizardError::InvalidIdentity(format!(
                "age {} is out of range",
                identity.age
            )));
        }
        if !identity.phone.is_empty()
            && (!(7..=15).contains(&identity.phone.len())
                || !identity.phone.chars().all(|c| c.is_ascii_digit()))
        {
            return Err(WizardError::InvalidIdentity(
                "phone number must be 7 to 15 digits".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questionnaire::ids;
    use crate::risk::Zone;

    fn context() -> ScanContext {
        ScanContext {
            qr_no: "KN-0042".into(),
            location_code: "TN-CHN-01".into(),
            unit: "Mobile Camp A".into(),
        }
    }

    fn identity(age: u32) -> Identity {
        Identity {
            name: "Meena".into(),
            age,
            gender: Gender::Female,
            phone: "9876543210".into(),
        }
    }

    fn engine() -> WizardEngine {
        WizardEngine::new(Questionnaire::standard(), context(), Language::English)
    }

    fn answer(engine: &mut WizardEngine, value: &str) -> Advance {
        let id = engine.current_question().unwrap().id.clone();
        engine
            .apply(WizardAction::Answer {
                question_id: id,
                value: value.into(),
            })
            .unwrap()
    }

    #[test]
    fn intake_synthesizes_age_group_and_skips_slot_zero() {
        let mut engine = engine();
        engine.submit_intake(identity(45)).unwrap();

        assert_eq!(engine.answers().get(ids::AGE_GROUP), Some("40-60"));
        assert_eq!(engine.phase(), Phase::InProgress { step: 1 });
        assert_eq!(engine.current_question().unwrap().id, ids::COMORBIDITY);
    }

    #[test]
    fn intake_rejects_empty_name() {
        let mut engine = engine();
        let mut bad = identity(45);
        bad.name = "  ".into();
        assert!(matches!(
            engine.submit_intake(bad),
            Err(WizardError::InvalidIdentity(_))
        ));
        assert_eq!(engine.phase(), Phase::Intake);
    }

    #[test]
    fn answer_must_match_current_question() {
        let mut engine = engine();
        engine.submit_intake(identity(45)).unwrap();

        let err = engine
            .apply(WizardAction::Answer {
                question_id: ids::FAMILY_HISTORY.into(),
                value: "Yes".into(),
            })
            .unwrap_err();
        assert!(matches!(err, WizardError::QuestionMismatch { .. }));
    }

    #[test]
    fn answer_value_must_be_an_option() {
        let mut engine = engine();
        engine.submit_intake(identity(45)).unwrap();

        let err = engine
            .apply(WizardAction::Answer {
                question_id: ids::COMORBIDITY.into(),
                value: "Perhaps".into(),
            })
            .unwrap_err();
        assert!(matches!(err, WizardError::InvalidValue { .. }));
    }

    #[test]
    fn full_run_reaches_resulted_and_emits_commands() {
        let mut engine = engine();
        engine.submit_intake(identity(35)).unwrap();

        answer(&mut engine, "No"); // comorbidity (duration skipped)
        answer(&mut engine, "No"); // family history
        answer(&mut engine, "No"); // swelling
        answer(&mut engine, "No"); // blood in urine
        answer(&mut engine, "No"); // foamy urine
        answer(&mut engine, "No"); // breathlessness
        answer(&mut engine, "No"); // painkiller use
        answer(&mut engine, "No"); // kidney stones
        answer(&mut engine, "No"); // difficulty urinating
        answer(&mut engine, "No"); // tobacco use
        let last = answer(&mut engine, "No"); // dipstick done (protein skipped)

        assert_eq!(engine.phase(), Phase::Resulted);
        let result = engine.result().unwrap();
        assert_eq!(result.zone, Zone::Green);
        assert!(matches!(
            last.event,
            Event::AssessmentCompleted {
                zone: Zone::Green,
                ..
            }
        ));
        assert_eq!(last.commands.len(), 2);

        match &last.commands[0] {
            Command::PersistSubmission(sub) => {
                assert_eq!(sub.qr_no, "KN-0042");
                assert_eq!(sub.zone, Zone::Green);
                assert_eq!(sub.code, result.code);
                assert!(!sub.answers.contains(ids::URINE_PROTEIN));
            }
            other => panic!("expected PersistSubmission, got {other:?}"),
        }
        match &last.commands[1] {
            Command::ForwardLead(lead) => {
                assert_eq!(lead.zone, Zone::Green);
                assert_eq!(lead.location_code, "TN-CHN-01");
            }
            other => panic!("expected ForwardLead, got {other:?}"),
        }
    }

    #[test]
    fn answering_after_resulted_is_rejected() {
        let mut engine = engine();
        engine.submit_intake(identity(35)).unwrap();
        for _ in 0..11 {
            answer(&mut engine, "No");
        }
        assert_eq!(engine.phase(), Phase::Resulted);

        let err = engine
            .apply(WizardAction::Answer {
                question_id: ids::COMORBIDITY.into(),
                value: "No".into(),
            })
            .unwrap_err();
        assert!(matches!(err, WizardError::InvalidPhase { .. }));
    }

    #[test]
    fn back_from_first_question_returns_to_intake() {
        let mut engine = engine();
        engine.submit_intake(identity(45)).unwrap();

        let adv = engine.apply(WizardAction::Back).unwrap();
        assert!(matches!(adv.event, Event::ReturnedToIntake { .. }));
        assert_eq!(engine.phase(), Phase::Intake);
        // Identity kept so the form re-opens pre-filled.
        let adv = engine.submit_intake(identity(45)).unwrap();
        assert!(matches!(adv.event, Event::IntakeCompleted { .. }));
    }

    #[test]
    fn next_requires_an_existing_answer() {
        let mut engine = engine();
        engine.submit_intake(identity(45)).unwrap();

        assert!(matches!(
            engine.apply(WizardAction::Next),
            Err(WizardError::NotAnswered(_))
        ));

        answer(&mut engine, "No"); // now at family_history
        engine.apply(WizardAction::Back).unwrap();
        assert_eq!(engine.current_question().unwrap().id, ids::COMORBIDITY);
        // Re-traversal over the already-answered comorbidity question.
        assert!(engine.apply(WizardAction::Next).is_ok());
        assert_eq!(engine.current_question().unwrap().id, ids::FAMILY_HISTORY);
    }

    #[test]
    fn changing_upstream_answer_purges_hidden_answer() {
        let mut engine = engine();
        engine.submit_intake(identity(45)).unwrap();

        answer(&mut engine, "Diabetes"); // comorbidity
        assert_eq!(
            engine.current_question().unwrap().id,
            ids::COMORBIDITY_DURATION
        );
        answer(&mut engine, "Over 10 years");
        assert!(engine.answers().contains(ids::COMORBIDITY_DURATION));

        // Back to comorbidity and flip it to "No": duration becomes
        // hidden; advancing must drop its stale answer.
        engine.apply(WizardAction::Back).unwrap();
        engine.apply(WizardAction::Back).unwrap();
        assert_eq!(engine.current_question().unwrap().id, ids::COMORBIDITY);
        answer(&mut engine, "No");

        assert_eq!(engine.current_question().unwrap().id, ids::FAMILY_HISTORY);
        assert!(!engine.answers().contains(ids::COMORBIDITY_DURATION));
    }

    #[test]
    fn fresh_restart_clears_identity() {
        let mut engine = engine();
        engine.submit_intake(identity(70)).unwrap();
        answer(&mut engine, "No");

        engine
            .apply(WizardAction::Restart {
                mode: RestartMode::Fresh,
            })
            .unwrap();
        assert_eq!(engine.phase(), Phase::Intake);
        assert!(engine.answers().is_empty());
        assert!(engine.result().is_none());
        assert_eq!(engine.mode(), ScreeningMode::SelfCheck);
    }

    #[test]
    fn retain_identity_restart_skips_intake() {
        let mut engine = engine();
        engine.submit_intake(identity(70)).unwrap();
        for _ in 0..11 {
            answer(&mut engine, "No");
        }
        assert_eq!(engine.phase(), Phase::Resulted);

        engine
            .apply(WizardAction::Restart {
                mode: RestartMode::RetainIdentity,
            })
            .unwrap();
        assert_eq!(engine.phase(), Phase::InProgress { step: 1 });
        assert_eq!(engine.mode(), ScreeningMode::Relative);
        assert_eq!(engine.answers().get(ids::AGE_GROUP), Some("Above 60"));
        assert!(engine.result().is_none());
    }

    #[test]
    fn retain_identity_restart_without_identity_fails() {
        let mut engine = engine();
        assert!(matches!(
            engine.apply(WizardAction::Restart {
                mode: RestartMode::RetainIdentity,
            }),
            Err(WizardError::MissingIdentity)
        ));
    }

    #[test]
    fn engine_round_trips_through_serde() {
        let mut engine = engine();
        engine.submit_intake(identity(45)).unwrap();
        answer(&mut engine, "Diabetes");

        let json = serde_json::to_string(&engine).unwrap();
        let restored: WizardEngine = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.phase(), engine.phase());
        assert_eq!(restored.answers(), engine.answers());
        assert_eq!(
            restored.current_question().unwrap().id,
            engine.current_question().unwrap().id
        );
    }
}
