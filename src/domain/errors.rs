//! # Core Domain Errors
//!
//! Error taxonomy for the adaptive quiz core. Provider-internal failures
//! (timeout, transport, empty body, parse) live in [`crate::llm`] and are
//! never surfaced directly; they escalate here only as `ProviderExhausted`
//! once both providers have failed.

use crate::domain::value_objects::{QuizId, SubmissionId};

/// Errors surfaced by core operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    // Validation
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Validation error")]
    InvalidInput(#[from] validator::ValidationErrors),

    // Absent aggregates
    #[error("Quiz not found: {0}")]
    QuizNotFound(QuizId),

    #[error("Submission not found: {0}")]
    SubmissionNotFound(SubmissionId),

    #[error("Question {question_id} not found in quiz {quiz_id}")]
    QuestionNotFound {
        quiz_id: QuizId,
        question_id: String,
    },

    // Corrupt storage; non-retryable
    #[error("Stored quiz data is invalid: {0}")]
    QuizDataInvalid(String),

    // Concurrency
    #[error("Duplicate attempt for this quiz")]
    DuplicateAttempt,

    #[error("Version conflict; the quiz was modified concurrently")]
    VersionConflict,

    #[error("Performance projection lost a concurrent update")]
    ProjectorConflict,

    // Authorization
    #[error("Resource access denied")]
    AccessDenied,

    // AI pipeline, fatal after fallback
    #[error("AI services unavailable; please try again later")]
    ProviderExhausted,

    // Store backend
    #[error("Store error: {0}")]
    Store(String),
}

impl CoreError {
    /// Returns the HTTP status code the host transport should map this to.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::InvalidInput(_) => 400,

            Self::AccessDenied => 403,

            Self::QuizNotFound(_)
            | Self::SubmissionNotFound(_)
            | Self::QuestionNotFound { .. } => 404,

            Self::DuplicateAttempt | Self::VersionConflict => 409,

            Self::ProviderExhausted => 503,

            Self::QuizDataInvalid(_) | Self::ProjectorConflict | Self::Store(_) => 500,
        }
    }

    /// Returns the stable error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidInput(_) => "VALIDATION_ERROR",
            Self::QuizNotFound(_) => "QUIZ_NOT_FOUND",
            Self::SubmissionNotFound(_) => "SUBMISSION_NOT_FOUND",
            Self::QuestionNotFound { .. } => "QUESTION_NOT_FOUND",
            Self::QuizDataInvalid(_) => "QUIZ_DATA_INVALID",
            Self::DuplicateAttempt => "DUPLICATE_ATTEMPT",
            Self::VersionConflict => "VERSION_CONFLICT",
            Self::ProjectorConflict => "PROJECTOR_CONFLICT",
            Self::AccessDenied => "ACCESS_DENIED",
            Self::ProviderExhausted => "AI_UNAVAILABLE",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns `true` for server-side failures that should be logged at
    /// error level and monitored.
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_by_category() {
        assert_eq!(CoreError::Validation("bad".into()).status_code(), 400);
        assert_eq!(CoreError::AccessDenied.status_code(), 403);
        assert_eq!(CoreError::QuizNotFound(QuizId::new()).status_code(), 404);
        assert_eq!(CoreError::DuplicateAttempt.status_code(), 409);
        assert_eq!(CoreError::ProviderExhausted.status_code(), 503);
        assert_eq!(CoreError::QuizDataInvalid("x".into()).status_code(), 500);
    }

    #[test]
    fn provider_exhaustion_message_is_user_safe() {
        let msg = CoreError::ProviderExhausted.to_string();
        assert_eq!(msg, "AI services unavailable; please try again later");
    }

    #[test]
    fn server_errors_are_flagged() {
        assert!(CoreError::Store("down".into()).is_server_error());
        assert!(CoreError::ProjectorConflict.is_server_error());
        assert!(!CoreError::DuplicateAttempt.is_server_error());
    }
}
