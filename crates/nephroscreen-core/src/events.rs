use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::risk::Zone;
use crate::wizard::RestartMode;

/// Navigation direction of the most recent step change. Presentation
/// only -- it never influences visibility or classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavDirection {
    Forward,
    Backward,
}

/// Every wizard transition produces an Event. The host renders them;
/// side effects travel separately as [`crate::wizard::Command`]s.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Identity collected and age-group answer synthesized.
    IntakeCompleted {
        first_step: usize,
        at: DateTime<Utc>,
    },
    /// The step pointer moved to a visible question.
    StepChanged {
        step_index: usize,
        question_id: String,
        direction: NavDirection,
        at: DateTime<Utc>,
    },
    /// Backward navigation left the question sequence entirely.
    ReturnedToIntake {
        at: DateTime<Utc>,
    },
    /// Classification ran and the session is now terminal.
    AssessmentCompleted {
        zone: Zone,
        code: String,
        at: DateTime<Utc>,
    },
    /// The wizard was reset.
    Restarted {
        mode: RestartMode,
        at: DateTime<Utc>,
    },
    /// Full state snapshot for host polling.
    StateSnapshot {
        phase: String,
        step_index: Option<usize>,
        question_id: Option<String>,
        answered: usize,
        total: usize,
        zone: Option<Zone>,
        code: Option<String>,
        at: DateTime<Utc>,
    },
}
