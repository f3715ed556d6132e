//! Question bank and answer storage for the kidney-health screening.
//!
//! Questions form a flat ordered sequence, not a tree. A question may
//! declare a dependency on an earlier question's answer; the dependency is
//! a visibility filter over the fixed order, never a branch. Index 0 is
//! the derived age-group slot: it is filled from the intake age and never
//! shown interactively.

pub mod flow;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Question identifiers used by the standard bank and the classifier.
pub mod ids {
    pub const AGE_GROUP: &str = "age_group";
    pub const COMORBIDITY: &str = "comorbidity";
    pub const COMORBIDITY_DURATION: &str = "comorbidity_duration";
    pub const FAMILY_HISTORY: &str = "family_history";
    pub const SWELLING: &str = "swelling";
    pub const BLOOD_IN_URINE: &str = "blood_in_urine";
    pub const FOAMY_URINE: &str = "foamy_urine";
    pub const BREATHLESSNESS: &str = "breathlessness";
    pub const PAINKILLER_USE: &str = "painkiller_use";
    pub const KIDNEY_STONES: &str = "kidney_stones";
    pub const DIFFICULTY_URINATING: &str = "difficulty_urinating";
    pub const TOBACCO_USE: &str = "tobacco_use";
    pub const DIPSTICK_DONE: &str = "dipstick_done";
    pub const URINE_PROTEIN: &str = "urine_protein";
}

/// Display language for labels. Value tokens are language-independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Tamil,
}

impl Default for Language {
    fn default() -> Self {
        Language::English
    }
}

/// A label in both supported languages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub en: String,
    pub ta: String,
}

impl LocalizedText {
    pub fn new(en: impl Into<String>, ta: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ta: ta.into(),
        }
    }

    pub fn in_language(&self, language: Language) -> &str {
        match language {
            Language::English => &self.en,
            Language::Tamil => &self.ta,
        }
    }
}

/// One selectable option of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    /// Language-independent value token recorded in the answer set.
    pub value: String,
    pub label: LocalizedText,
}

impl QuestionOption {
    fn new(value: &str, en: &str, ta: &str) -> Self {
        Self {
            value: value.into(),
            label: LocalizedText::new(en, ta),
        }
    }
}

/// A question in the screening sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier within the bank.
    pub id: String,
    pub label: LocalizedText,
    pub options: Vec<QuestionOption>,
    /// Identifier of the question this one's visibility depends on.
    #[serde(default)]
    pub depends_on: Option<String>,
    /// Answer tokens of `depends_on` that make this question visible.
    /// Must be non-empty whenever `depends_on` is set.
    #[serde(default)]
    pub required_values: Vec<String>,
}

impl Question {
    /// Visibility against the *current* answers. A question with no
    /// dependency is always visible; a dependent question is visible only
    /// while the referenced answer is one of its required values.
    pub fn is_visible(&self, answers: &AnswerSet) -> bool {
        match &self.depends_on {
            None => true,
            Some(dep) => match answers.get(dep) {
                Some(value) => self.required_values.iter().any(|v| v == value),
                None => false,
            },
        }
    }

    /// Whether `value` is one of this question's option tokens.
    pub fn accepts(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }
}

/// The accumulated question-id -> value-token mapping for one run.
///
/// Grows as the user progresses; the only removal path is the wizard
/// purging answers of questions that became hidden again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSet(HashMap<String, String>);

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }

    pub fn insert(&mut self, id: impl Into<String>, value: impl Into<String>) {
        self.0.insert(id.into(), value.into());
    }

    pub fn remove(&mut self, id: &str) -> Option<String> {
        self.0.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Recorded value tokens in question order, skipping absent keys.
    /// This is the `answer_values` sequence carried by report tokens.
    pub fn ordered_values(&self, questions: &[Question]) -> Vec<String> {
        questions
            .iter()
            .filter_map(|q| self.get(&q.id).map(str::to_string))
            .collect()
    }
}

/// The ordered question sequence driving one screening run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Questionnaire {
    questions: Vec<Question>,
}

impl Questionnaire {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.questions.iter().position(|q| q.id == id)
    }

    /// The standard kidney-health screening bank.
    ///
    /// Index 0 is the derived age-group question. The four symptom flags
    /// (swelling, blood in urine, foamy urine, breathlessness) drive the
    /// RED short-circuit in the classifier.
    pub fn standard() -> Self {
        let yes_no = || {
            vec![
                QuestionOption::new("Yes", "Yes", "ஆம்"),
                QuestionOption::new("No", "No", "இல்லை"),
            ]
        };

        Self::new(vec![
            Question {
                id: ids::AGE_GROUP.into(),
                label: LocalizedText::new("Age group", "வயது பிரிவு"),
                options: vec![
                    QuestionOption::new("Below 40", "Below 40", "40க்கு கீழ்"),
                    QuestionOption::new("40-60", "40 to 60", "40 முதல் 60 வரை"),
                    QuestionOption::new("Above 60", "Above 60", "60க்கு மேல்"),
                ],
                depends_on: None,
                required_values: vec![],
            },
            Question {
                id: ids::COMORBIDITY.into(),
                label: LocalizedText::new(
                    "Do you have diabetes or high blood pressure?",
                    "உங்களுக்கு நீரிழிவு அல்லது உயர் இரத்த அழுத்தம் உள்ளதா?",
                ),
                options: vec![
                    QuestionOption::new("No", "No", "இல்லை"),
                    QuestionOption::new("Diabetes", "Diabetes", "நீரிழிவு"),
                    QuestionOption::new("Hypertension", "High blood pressure", "உயர் இரத்த அழுத்தம்"),
                    QuestionOption::new("Both", "Both", "இரண்டும்"),
                ],
                depends_on: None,
                required_values: vec![],
            },
            Question {
                id: ids::COMORBIDITY_DURATION.into(),
                label: LocalizedText::new(
                    "For how long have you had it?",
                    "எவ்வளவு காலமாக இது உள்ளது?",
                ),
                options: vec![
                    QuestionOption::new("Under 5 years", "Less than 5 years", "5 ஆண்டுகளுக்கு குறைவாக"),
                    QuestionOption::new("5-10 years", "5 to 10 years", "5 முதல் 10 ஆண்டுகள்"),
                    QuestionOption::new("Over 10 years", "More than 10 years", "10 ஆண்டுகளுக்கு மேல்"),
                ],
                depends_on: Some(ids::COMORBIDITY.into()),
                required_values: vec!["Diabetes".into(), "Hypertension".into(), "Both".into()],
            },
            Question {
                id: ids::FAMILY_HISTORY.into(),
                label: LocalizedText::new(
                    "Has anyone in your family had kidney disease?",
                    "உங்கள் குடும்பத்தில் யாருக்காவது சிறுநீரக நோய் இருந்ததா?",
                ),
                options: yes_no(),
                depends_on: None,
                required_values: vec![],
            },
            Question {
                id: ids::SWELLING.into(),
                label: LocalizedText::new(
                    "Do you have swelling of the face or feet?",
                    "உங்கள் முகம் அல்லது கால்களில் வீக்கம் உள்ளதா?",
                ),
                options: yes_no(),
                depends_on: None,
                required_values: vec![],
            },
            Question {
                id: ids::BLOOD_IN_URINE.into(),
                label: LocalizedText::new(
                    "Have you noticed blood in your urine?",
                    "உங்கள் சிறுநீரில் இரத்தம் கண்டதுண்டா?",
                ),
                options: yes_no(),
                depends_on: None,
                required_values: vec![],
            },
            Question {
                id: ids::FOAMY_URINE.into(),
                label: LocalizedText::new(
                    "Is your urine unusually foamy?",
                    "உங்கள் சிறுநீர் அதிக நுரையுடன் வெளியேறுகிறதா?",
                ),
                options: yes_no(),
                depends_on: None,
                required_values: vec![],
            },
            Question {
                id: ids::BREATHLESSNESS.into(),
                label: LocalizedText::new(
                    "Do you feel breathless or unusually tired?",
                    "மூச்சுத் திணறல் அல்லது அதிக சோர்வு உணர்கிறீர்களா?",
                ),
                options: yes_no(),
                depends_on: None,
                required_values: vec![],
            },
            Question {
                id: ids::PAINKILLER_USE.into(),
                label: LocalizedText::new(
                    "Do you regularly take painkillers or other long-term medication?",
                    "தொடர்ந்து வலி நிவாரணிகள் அல்லது நீண்டகால மருந்துகள் எடுத்துக்கொள்கிறீர்களா?",
                ),
                options: yes_no(),
                depends_on: None,
                required_values: vec![],
            },
            Question {
                id: ids::KIDNEY_STONES.into(),
                label: LocalizedText::new(
                    "Have you ever had kidney stones?",
                    "உங்களுக்கு எப்போதாவது சிறுநீரக கற்கள் இருந்ததுண்டா?",
                ),
                options: vec![
                    QuestionOption::new("No", "No", "இல்லை"),
                    QuestionOption::new("Once", "Once", "ஒரு முறை"),
                    QuestionOption::new("Recurrent", "More than once", "ஒன்றுக்கு மேற்பட்ட முறை"),
                ],
                depends_on: None,
                required_values: vec![],
            },
            Question {
                id: ids::DIFFICULTY_URINATING.into(),
                label: LocalizedText::new(
                    "Do you have difficulty passing urine?",
                    "சிறுநீர் கழிப்பதில் சிரமம் உள்ளதா?",
                ),
                options: yes_no(),
                depends_on: None,
                required_values: vec![],
            },
            Question {
                id: ids::TOBACCO_USE.into(),
                label: LocalizedText::new(
                    "Do you smoke or use tobacco?",
                    "நீங்கள் புகைபிடிக்கிறீர்களா அல்லது புகையிலை பயன்படுத்துகிறீர்களா?",
                ),
                options: yes_no(),
                depends_on: None,
                required_values: vec![],
            },
            Question {
                id: ids::DIPSTICK_DONE.into(),
                label: LocalizedText::new(
                    "Have you had a urine dipstick test recently?",
                    "சமீபத்தில் சிறுநீர் பரிசோதனை செய்துள்ளீர்களா?",
                ),
                options: yes_no(),
                depends_on: None,
                required_values: vec![],
            },
            Question {
                id: ids::URINE_PROTEIN.into(),
                label: LocalizedText::new(
                    "What was the protein reading on that test?",
                    "அந்த பரிசோதனையில் புரத அளவு என்ன?",
                ),
                options: vec![
                    QuestionOption::new("None", "None", "இல்லை"),
                    QuestionOption::new("Trace", "Trace", "சிறிதளவு"),
                    QuestionOption::new("1+", "1+", "1+"),
                    QuestionOption::new("2+", "2+", "2+"),
                    QuestionOption::new("3+", "3+", "3+"),
                ],
                depends_on: Some(ids::DIPSTICK_DONE.into()),
                required_values: vec!["Yes".into()],
            },
        ])
    }
}
