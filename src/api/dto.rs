//! # Data Transfer Objects
//!
//! Wire shapes returned by the core services. The host transport serializes
//! these as-is; all solution stripping has already happened by the time a DTO
//! is built.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{GradeLetter, Quiz, QuizId, QuizMetadata, Submission, UserId};
use crate::sanitize::{sanitize_questions, QuestionView, SanitizeOptions};

// =============================================================================
// QUIZ DTOs
// =============================================================================

/// A quiz as served to callers, with questions projected through the
/// sanitizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizView {
    pub quiz_id: QuizId,
    pub title: String,
    pub description: Option<String>,
    pub metadata: QuizMetadata,
    pub questions: Vec<QuestionView>,
    pub created_by: UserId,
    pub is_public: bool,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QuizView {
    /// Projects a quiz for one caller according to the capability flags.
    pub fn project(quiz: &Quiz, opts: SanitizeOptions) -> Self {
        Self {
            quiz_id: quiz.quiz_id,
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            metadata: quiz.metadata.clone(),
            questions: sanitize_questions(&quiz.questions, opts),
            created_by: quiz.created_by,
            is_public: quiz.is_public,
            version: quiz.version,
            created_at: quiz.created_at,
            updated_at: quiz.updated_at,
        }
    }
}

// =============================================================================
// SUBMISSION DTOs
// =============================================================================

/// Condensed results block of a submission response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResults {
    /// Score percentage, 0-100.
    pub score: f64,
    pub grade: GradeLetter,
    pub correct_answers: i32,
    pub total_questions: i32,
    /// Seconds across the whole attempt.
    pub total_time_spent: i64,
    pub suggestions: Vec<String>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    /// Provider that evaluated the attempt, if evaluation succeeded.
    pub ai_model: Option<String>,
}

/// Whether the analytics projection caught up with this submission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnalyticsStatus {
    pub updated: bool,
}

/// Full submit-quiz response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub submission: Submission,
    pub results: SubmissionResults,
    pub analytics: AnalyticsStatus,
}

impl SubmissionResponse {
    /// Builds the response from a persisted submission.
    pub fn build(submission: Submission, analytics_updated: bool) -> Self {
        let results = SubmissionResults {
            score: submission.scoring.score_percentage,
            grade: submission.scoring.grade,
            correct_answers: submission.scoring.correct_answers,
            total_questions: submission.scoring.total_questions,
            total_time_spent: submission.timing.total_time_seconds,
            suggestions: submission
                .ai_evaluation
                .as_ref()
                .map(|e| e.suggestions.clone())
                .unwrap_or_default(),
            strengths: submission
                .ai_evaluation
                .as_ref()
                .map(|e| e.strengths.clone())
                .unwrap_or_default(),
            weaknesses: submission
                .ai_evaluation
                .as_ref()
                .map(|e| e.weaknesses.clone())
                .unwrap_or_default(),
            ai_model: submission.ai_evaluation.as_ref().map(|e| e.provider.clone()),
        };
        Self {
            submission,
            results,
            analytics: AnalyticsStatus {
                updated: analytics_updated,
            },
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
