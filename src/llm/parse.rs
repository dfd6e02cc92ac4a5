//! # Provider Response Parsing
//!
//! Providers do not reliably obey the "raw JSON" instruction, so every
//! response goes through defensive extraction: strip fences, slice out the
//! JSON payload, decode, unwrap known envelope keys, and normalize field
//! variants onto the canonical schema.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::{Difficulty, Question, QuestionType, MAX_HINTS};

/// Why a provider response could not be turned into a usable value.
#[derive(Debug, thiserror::Error)]
pub enum ParseFailure {
    #[error("no JSON payload found in response")]
    NoJson,

    #[error("JSON decode failed: {0}")]
    Decode(String),

    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    #[error("invalid question: {0}")]
    InvalidQuestion(String),

    #[error("expected {expected} questions, provider returned {got}")]
    WrongCount { expected: usize, got: usize },

    #[error("response contained no usable text")]
    EmptyText,
}

/// Envelope keys searched, in order, when the decoded value is a mapping.
const ENVELOPE_KEYS: [&str; 4] = ["questions", "data", "items", "quiz"];

/// Generic fallback suggestions used to pad short evaluation output.
const GENERIC_SUGGESTIONS: [&str; 2] = [
    "Review the explanations for the questions you missed and retry the quiz.",
    "Practice more questions on your weakest topics before moving up in difficulty.",
];

// =============================================================================
// JSON EXTRACTION
// =============================================================================

/// Removes fenced code markers (```/```json lines) from a response.
fn strip_code_fences(raw: &str) -> String {
    if !raw.contains("```") {
        return raw.to_string();
    }
    raw.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Slices the JSON payload out of surrounding commentary: from the earliest
/// `[` or `{` to the latest `]` or `}`.
fn slice_json(text: &str) -> Option<&str> {
    let open_bracket = text.find('[');
    let open_brace = text.find('{');
    let start = match (open_bracket, open_brace) {
        (Some(a), Some(b)) => a.min(b),
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => return None,
    };

    let close_bracket = text.rfind(']');
    let close_brace = text.rfind('}');
    let end = match (close_bracket, close_brace) {
        (Some(a), Some(b)) => a.max(b),
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => return None,
    };

    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Extracts and decodes the JSON payload of a raw provider response.
pub fn extract_value(raw: &str) -> Result<Value, ParseFailure> {
    let stripped = strip_code_fences(raw.trim());
    let payload = slice_json(stripped.trim()).ok_or(ParseFailure::NoJson)?;
    serde_json::from_str(payload).map_err(|e| ParseFailure::Decode(e.to_string()))
}

/// Unwraps the question array from a decoded value: arrays are used directly,
/// mappings are searched for the known envelope keys in order.
fn unwrap_array(value: Value) -> Result<Vec<Value>, ParseFailure> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => {
            for key in ENVELOPE_KEYS {
                if let Some(Value::Array(items)) = map.remove(key) {
                    return Ok(items);
                }
            }
            Err(ParseFailure::UnexpectedShape(
                "object carries no known array envelope".into(),
            ))
        }
        other => Err(ParseFailure::UnexpectedShape(format!(
            "expected array or object, got {}",
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// QUESTION PARSING
// =============================================================================

/// Raw question as providers emit it; aliases cover common field drift.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    #[serde(default, alias = "id")]
    question_id: Option<String>,

    #[serde(alias = "question", alias = "text")]
    question_text: String,

    #[serde(default, alias = "type")]
    question_type: Option<String>,

    #[serde(default)]
    options: Option<Vec<String>>,

    #[serde(alias = "answer")]
    correct_answer: String,

    #[serde(default)]
    explanation: Option<String>,

    #[serde(default)]
    difficulty: Option<String>,

    #[serde(default)]
    points: Option<i32>,

    #[serde(default)]
    hints: Option<Vec<String>>,

    #[serde(default)]
    topic: Option<String>,
}

/// Parses a generation response into exactly `expected` questions.
///
/// Surplus questions are truncated with a warning; a shortfall is a parse
/// failure so the gateway can try the fallback provider.
pub fn parse_questions(raw: &str, expected: usize) -> Result<Vec<Question>, ParseFailure> {
    let items = unwrap_array(extract_value(raw)?)?;
    if items.len() > expected {
        tracing::warn!(
            expected,
            got = items.len(),
            "provider returned surplus questions, truncating"
        );
    }

    let mut questions = Vec::with_capacity(items.len().min(expected));
    for (index, item) in items.into_iter().enumerate() {
        if questions.len() == expected {
            break;
        }
        let raw_question: RawQuestion =
            serde_json::from_value(item).map_err(|e| ParseFailure::Decode(e.to_string()))?;
        questions.push(normalize_question(raw_question, index)?);
    }

    if questions.len() < expected {
        return Err(ParseFailure::WrongCount {
            expected,
            got: questions.len(),
        });
    }
    Ok(questions)
}

fn normalize_question(raw: RawQuestion, index: usize) -> Result<Question, ParseFailure> {
    let question_type = match raw.question_type.as_deref() {
        Some(t) => QuestionType::canonicalize(t),
        None => {
            tracing::warn!(index, "question has no type field, defaulting to mcq");
            QuestionType::Mcq
        }
    };

    let correct_answer = raw.correct_answer.trim().to_string();
    if correct_answer.is_empty() {
        return Err(ParseFailure::InvalidQuestion(format!(
            "question {index} has an empty correct answer"
        )));
    }

    let options = match question_type {
        QuestionType::Mcq => {
            let options = raw.options.unwrap_or_default();
            if !(2..=6).contains(&options.len()) {
                return Err(ParseFailure::InvalidQuestion(format!(
                    "mcq question {index} has {} options",
                    options.len()
                )));
            }
            options
        }
        // Options only make sense for multiple choice.
        _ => Vec::new(),
    };

    // The author-tool invariant is that the MCQ answer equals one option
    // exactly; providers sometimes drift on casing, so repair when a unique
    // case-insensitive match exists.
    let correct_answer = if question_type == QuestionType::Mcq {
        if options.iter().any(|o| *o == correct_answer) {
            correct_answer
        } else {
            let lowered = correct_answer.to_lowercase();
            match options.iter().find(|o| o.to_lowercase() == lowered) {
                Some(matched) => {
                    tracing::warn!(index, "repaired mcq answer casing against options");
                    matched.clone()
                }
                None => {
                    return Err(ParseFailure::InvalidQuestion(format!(
                        "mcq question {index} answer matches no option"
                    )));
                }
            }
        }
    } else {
        correct_answer
    };

    let mut hints = raw.hints.unwrap_or_default();
    hints.truncate(MAX_HINTS);

    Ok(Question {
        question_id: raw
            .question_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("q{}", index + 1)),
        text: raw.question_text,
        question_type,
        options,
        correct_answer,
        explanation: raw.explanation,
        difficulty: raw
            .difficulty
            .as_deref()
            .map(Difficulty::parse_lenient)
            .unwrap_or_default(),
        points: raw.points.unwrap_or(5).clamp(1, 10),
        hints,
        topic: raw.topic,
    })
}

// =============================================================================
// EVALUATION PARSING
// =============================================================================

/// Evaluation payload before provider attribution.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEvaluation {
    pub suggestions: Vec<String>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawEvaluation {
    #[serde(default)]
    suggestions: Option<Vec<String>>,
    #[serde(default)]
    strengths: Option<Vec<String>>,
    #[serde(default)]
    weaknesses: Option<Vec<String>>,
}

/// Parses an evaluation response and normalizes `suggestions` to exactly two
/// entries: truncated if longer, padded with generic defaults if shorter or
/// absent.
pub fn parse_evaluation(raw: &str) -> Result<ParsedEvaluation, ParseFailure> {
    let value = extract_value(raw)?;
    if !value.is_object() {
        return Err(ParseFailure::UnexpectedShape(format!(
            "expected evaluation object, got {}",
            type_name(&value)
        )));
    }
    let raw_eval: RawEvaluation =
        serde_json::from_value(value).map_err(|e| ParseFailure::Decode(e.to_string()))?;

    Ok(ParsedEvaluation {
        suggestions: normalize_suggestions(raw_eval.suggestions.unwrap_or_default()),
        strengths: raw_eval.strengths.unwrap_or_default(),
        weaknesses: raw_eval.weaknesses.unwrap_or_default(),
    })
}

fn normalize_suggestions(suggestions: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = suggestions
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    out.truncate(2);
    let mut generic = GENERIC_SUGGESTIONS.iter();
    while out.len() < 2 {
        // Both generics are distinct, so padding never duplicates.
        if let Some(fallback) = generic.next() {
            out.push((*fallback).to_string());
        }
    }
    out
}

// =============================================================================
// HINT PARSING
// =============================================================================

/// Cleans a hint response down to plain text.
pub fn parse_hint(raw: &str) -> Result<String, ParseFailure> {
    let cleaned = strip_code_fences(raw.trim());
    let cleaned = cleaned.trim().trim_matches('"').trim();
    if cleaned.is_empty() {
        return Err(ParseFailure::EmptyText);
    }
    Ok(cleaned.to_string())
}

// =============================================================================
// Tests
// =============================================================================
