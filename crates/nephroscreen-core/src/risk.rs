//! Risk classification and priority-code generation.
//!
//! `classify` is a pure function of the answer set: rules are evaluated
//! in a fixed order (RED short-circuit, diabetic+trace override, general
//! AMBER predicate, GREEN fallback) and missing keys never match a
//! positive condition.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::questionnaire::{ids, AnswerSet};

/// Risk classification outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Zone {
    /// Urgent referral.
    Red,
    /// Moderate risk, follow-up advised.
    Amber,
    /// Low risk.
    Green,
}

impl Zone {
    pub fn label(&self) -> &'static str {
        match self {
            Zone::Red => "RED",
            Zone::Amber => "AMBER",
            Zone::Green => "GREEN",
        }
    }

    pub fn parse(label: &str) -> Option<Zone> {
        match label {
            "RED" => Some(Zone::Red),
            "AMBER" => Some(Zone::Amber),
            "GREEN" => Some(Zone::Green),
            _ => None,
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The outcome of one completed wizard run. Created exactly once,
/// immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub zone: Zone,
    pub code: String,
    pub created_at: DateTime<Utc>,
}

impl AssessmentResult {
    pub fn new(zone: Zone, now: DateTime<Utc>) -> Self {
        Self {
            zone,
            code: priority_code(zone, now),
            created_at: now,
        }
    }
}

/// The four symptom flags that short-circuit to RED.
const RED_FLAGS: [&str; 4] = [
    ids::SWELLING,
    ids::BLOOD_IN_URINE,
    ids::FOAMY_URINE,
    ids::BREATHLESSNESS,
];

/// Any positive dipstick reading counts towards the general predicate.
const POSITIVE_PROTEIN: [&str; 4] = ["Trace", "1+", "2+", "3+"];

/// Age-group token synthesized from the intake age. Total for all ages.
pub fn derive_age_group(age: u32) -> &'static str {
    if age < 40 {
        "Below 40"
    } else if age <= 60 {
        "40-60"
    } else {
        "Above 60"
    }
}

/// Map a completed answer set to exactly one zone.
pub fn classify(answers: &AnswerSet) -> Zone {
    if RED_FLAGS.iter().any(|id| answers.get(id) == Some("Yes")) {
        return Zone::Red;
    }

    let comorbid = answers
        .get(ids::COMORBIDITY)
        .map(|v| v != "No")
        .unwrap_or(false);

    // Dedicated diabetic/hypertensive + trace-protein rule, checked ahead
    // of the general predicate. It currently lands on the same zone the
    // general predicate would, but the two rules are tuned independently.
    if comorbid && answers.get(ids::URINE_PROTEIN) == Some("Trace") {
        return Zone::Amber;
    }

    let amber = comorbid
        || answers.get(ids::FAMILY_HISTORY) == Some("Yes")
        || answers.get(ids::PAINKILLER_USE) == Some("Yes")
        || answers
            .get(ids::KIDNEY_STONES)
            .map(|v| v != "No")
            .unwrap_or(false)
        || answers.get(ids::DIFFICULTY_URINATING) == Some("Yes")
        || answers.get(ids::AGE_GROUP) == Some("Above 60")
        || answers
            .get(ids::URINE_PROTEIN)
            .map(|v| POSITIVE_PROTEIN.contains(&v))
            .unwrap_or(false);

    if amber {
        Zone::Amber
    } else {
        Zone::Green
    }
}

/// Human-readable triage reference: `KN-{ZONE}-{DDMMYY}-{RRR}`.
///
/// The 3-digit suffix is uniform in 100..=999; same-day collisions are
/// possible and acceptable, the code is not a storage key.
pub fn priority_code(zone: Zone, now: DateTime<Utc>) -> String {
    priority_code_with_rng(zone, now, &mut rand::thread_rng())
}

/// Seedable variant of [`priority_code`].
pub fn priority_code_with_rng<R: Rng>(zone: Zone, now: DateTime<Utc>, rng: &mut R) -> String {
    let suffix: u32 = rng.gen_range(100..=999);
    format!("KN-{}-{}-{}", zone.label(), now.format("%d%m%y"), suffix)
}
