//! Pure question-flow functions.
//!
//! Both scans evaluate visibility against the answers as they are *now*;
//! nothing is cached between traversals, so re-answering an earlier
//! question changes every downstream visibility decision on the next
//! pass. An out-of-range index is a caller bug and trips a debug
//! assertion rather than being silently clamped.

use super::{AnswerSet, Question};

/// Where a backward step lands.
///
/// Question 0 is the derived age-group slot and is never shown, so a
/// backward scan that reaches it resolves to the intake form instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackTarget {
    /// Return to the identity intake form.
    Intake,
    /// Show the question at this index.
    Question(usize),
}

/// First visible question index after `current`, or `questions.len()` as
/// the completion sentinel.
pub fn next_visible_index(questions: &[Question], current: usize, answers: &AnswerSet) -> usize {
    debug_assert!(
        current < questions.len(),
        "current index {current} out of range for {} questions",
        questions.len()
    );
    let mut candidate = current + 1;
    while candidate < questions.len() {
        if questions[candidate].is_visible(answers) {
            return candidate;
        }
        candidate += 1;
    }
    questions.len()
}

/// First visible question index before `current`, scanning down towards
/// the front of the sequence. Index 0 is never offered interactively, so
/// exhausting the scan yields [`BackTarget::Intake`].
pub fn previous_visible_index(
    questions: &[Question],
    current: usize,
    answers: &AnswerSet,
) -> BackTarget {
    debug_assert!(
        current >= 1 && current <= questions.len(),
        "current index {current} out of range for {} questions",
        questions.len()
    );
    let mut candidate = current;
    while candidate > 1 {
        candidate -= 1;
        if questions[candidate].is_visible(answers) {
            return BackTarget::Question(candidate);
        }
    }
    BackTarget::Intake
}
