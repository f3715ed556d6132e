//! # Nephroscreen Core Library
//!
//! This library provides the core business logic for Nephroscreen, a
//! QR-triggered kidney-health self-assessment. It implements a CLI-first
//! philosophy where all operations are available via a standalone CLI
//! binary, with any UI being a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Questionnaire**: the fixed, bilingual question bank with
//!   per-question visibility dependencies, plus the pure flow functions
//!   that pick the next/previous visible question
//! - **Risk**: the pure classifier mapping a completed answer set to a
//!   RED/AMBER/GREEN zone and a human-readable priority code
//! - **Wizard**: a state machine (`Intake -> InProgress -> Submitting ->
//!   Resulted`) that composes the flow functions and the classifier and
//!   emits persistence/CRM commands for the outer shell to execute
//! - **Report**: compact token codec for read-only "scan completed
//!   report" views
//! - **Storage**: SQLite submission storage and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`WizardEngine`]: the wizard state machine
//! - [`classify`] / [`priority_code`]: the risk classifier
//! - [`Database`]: submission persistence
//! - [`Config`]: application configuration management
//! - [`LeadSink`]: trait for CRM lead forwarding

pub mod crm;
pub mod error;
pub mod events;
pub mod qr;
pub mod questionnaire;
pub mod report;
pub mod risk;
pub mod storage;
pub mod wizard;

pub use crm::{CrmWebhook, LeadPayload, LeadSink};
pub use error::{ConfigError, CoreError, CrmError, DatabaseError};
pub use events::{Event, NavDirection};
pub use qr::{QrDirectory, ScanContext};
pub use questionnaire::{AnswerSet, Language, Question, QuestionOption, Questionnaire};
pub use report::{ReportError, ReportPayload};
pub use risk::{classify, derive_age_group, priority_code, AssessmentResult, Zone};
pub use storage::{Config, Database, ZoneStats};
pub use wizard::{
    Advance, Command, Gender, Identity, Phase, RestartMode, ScreeningMode, Submission,
    WizardAction, WizardEngine, WizardError,
};
