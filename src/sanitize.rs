//! # Content Sanitizer
//!
//! Pure projection of questions into their client-safe wire shape. Solution
//! fields (`correctAnswer`, `explanation`) are stripped unless the caller is
//! internal, and hints are opt-in.
//!
//! Capability flags are decided by the service layer from the caller's
//! identity; clients have no input that maps onto `include_solutions`, so the
//! flag cannot be set through a query parameter.

use serde::{Deserialize, Serialize};

use crate::domain::{Difficulty, Question, QuestionType};

/// What a projection is allowed to expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanitizeOptions {
    /// Only ever true for internal grading calls and the quiz author.
    pub include_solutions: bool,
    pub include_hints: bool,
}

impl SanitizeOptions {
    /// Default client projection: no solutions, no hints.
    pub fn client() -> Self {
        Self {
            include_solutions: false,
            include_hints: false,
        }
    }

    /// Client projection with hints opted in.
    pub fn client_with_hints() -> Self {
        Self {
            include_solutions: false,
            include_hints: true,
        }
    }

    /// Internal projection for the scoring path and quiz authors.
    pub fn internal() -> Self {
        Self {
            include_solutions: true,
            include_hints: true,
        }
    }
}

/// Wire shape of a question after sanitization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub question_id: String,
    pub question_text: String,
    pub question_type: QuestionType,

    /// Present for MCQ only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,

    pub difficulty: Difficulty,
    pub points: i32,
    pub topic: Option<String>,

    /// Present only when hints were opted in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hints: Option<Vec<String>>,

    /// Present only for internal callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Projects one question according to the capability flags.
pub fn sanitize_question(question: &Question, opts: SanitizeOptions) -> QuestionView {
    QuestionView {
        question_id: question.question_id.clone(),
        question_text: question.text.clone(),
        question_type: question.question_type,
        options: (question.question_type == QuestionType::Mcq)
            .then(|| question.options.clone()),
        difficulty: question.difficulty,
        points: question.points,
        topic: question.topic.clone(),
        hints: opts.include_hints.then(|| question.hints.clone()),
        correct_answer: opts
            .include_solutions
            .then(|| question.correct_answer.clone()),
        explanation: opts
            .include_solutions
            .then(|| question.explanation.clone())
            .flatten(),
    }
}

/// Projects a question sequence; order is preserved.
pub fn sanitize_questions(questions: &[Question], opts: SanitizeOptions) -> Vec<QuestionView> {
    questions
        .iter()
        .map(|q| sanitize_question(q, opts))
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
