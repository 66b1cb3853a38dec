use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

/// Question as the model writes it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawQuestion {
    id: Option<String>,
    text: Option<String>,
    pre_hint: Option<String>,
    feedback: Option<String>,
    options: Vec<RawOption>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawOption {
    id: Option<String>,
    text: Option<String>,
    is_correct: bool,
    hint: Option<String>,
    feedback: Option<String>,
}

/// Question as served to the front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub pre_hint: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub options: Vec<QuizOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizOption {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default)]
    pub hint: Option<String>,
}

fn generated_question_id() -> String {
    let simple = Uuid::new_v4().simple().to_string();
    format!("q-{}", &simple[..7])
}

/// Converts the model's `questions` array into front-end questions.
/// Entries that are not objects are skipped; missing ids are generated.
pub fn format_questions(raw_questions: &Value) -> Vec<Question> {
    let Some(items) = raw_questions.as_array() else {
        tracing::error!("Model output did not contain an array of questions");
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match serde_json::from_value::<RawQuestion>(item.clone()) {
            Ok(raw) => Some(raw),
            Err(e) => {
                tracing::warn!("Skipping malformed question: {}", e);
                None
            }
        })
        .map(|raw| Question {
            id: raw.id.filter(|id| !id.is_empty()).unwrap_or_else(generated_question_id),
            question: raw.text.unwrap_or_default(),
            pre_hint: raw.pre_hint,
            feedback: raw.feedback,
            options: raw
                .options
                .into_iter()
                .enumerate()
                .map(|(idx, opt)| QuizOption {
                    id: opt.id.unwrap_or_else(|| option_letter(idx)),
                    text: opt.text.unwrap_or_default(),
                    is_correct: opt.is_correct,
                    hint: opt.hint.or(opt.feedback),
                })
                .collect(),
        })
        .collect()
}

fn option_letter(idx: usize) -> String {
    char::from_u32('a' as u32 + idx as u32)
        .map(String::from)
        .unwrap_or_else(|| idx.to_string())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuizSubmission {
    pub user_id: Option<String>,
    pub tutorial_id: Option<String>,
    /// Selected option ids keyed by question id.
    pub answers: Option<HashMap<String, Vec<String>>>,
    pub questions: Option<Vec<Question>>,
}

/// Percentage (0-100) of questions whose selected options are exactly the
/// correct ones.
pub fn score_answers(questions: &[Question], answers: &HashMap<String, Vec<String>>) -> u32 {
    if questions.is_empty() {
        return 0;
    }

    let correct = questions
        .iter()
        .filter(|q| {
            let expected: BTreeSet<&str> = q
                .options
                .iter()
                .filter(|o| o.is_correct)
                .map(|o| o.id.as_str())
                .collect();
            let chosen: BTreeSet<&str> = answers
                .get(&q.id)
                .map(|ids| ids.iter().map(String::as_str).collect())
                .unwrap_or_default();
            !expected.is_empty() && expected == chosen
        })
        .count();

    ((correct * 100) as f64 / questions.len() as f64).round() as u32
}
