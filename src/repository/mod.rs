//! # Store Contracts
//!
//! Persistence interfaces fulfilled by external collaborators. The core never
//! talks to a database directly; the host process supplies implementations of
//! these traits (document store, cache, whatever it runs).
//!
//! ## Implementation obligations
//!
//! - Every call is an outbound I/O suspension point and must carry its own
//!   deadline (the platform budget for intra-service reads is 10s).
//! - `Submissions` must enforce a unique index on
//!   `(user_id, quiz_id, attempt_number)` and surface violations as
//!   [`StoreError::DuplicateAttempt`].
//! - `PerformanceHistory` must enforce a unique index on
//!   `(user_id, subject, grade)` with case-insensitive subject matching, and
//!   support the optimistic `expected_last_calculated_at` guard.
//! - `Submissions` should index `(user_id, submitted_at desc)` for listings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    AiEvaluation, CoreError, PerformanceHistory, Quiz, QuizDifficulty, QuizId, QuizMetadata,
    Submission, SubmissionId, UserId,
};

// =============================================================================
// ERRORS
// =============================================================================

/// Failures a store implementation may report.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Unique-index violation on `(user_id, quiz_id, attempt_number)`.
    #[error("duplicate attempt")]
    DuplicateAttempt,

    /// Optimistic-concurrency guard did not match the stored record.
    #[error("version conflict")]
    VersionConflict,

    /// Backend failure (connectivity, query, serialization).
    #[error("store backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for CoreError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateAttempt => CoreError::DuplicateAttempt,
            StoreError::VersionConflict => CoreError::VersionConflict,
            StoreError::Backend(msg) => CoreError::Store(msg),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// FILTERS & PAGINATION
// =============================================================================

/// Page request for listings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number.
    pub page: i64,
    pub per_page: i64,
}

impl Page {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self { page, per_page }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

/// Filter for quiz listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuizFilter {
    pub subject: Option<String>,
    pub grade: Option<i32>,
    pub difficulty: Option<QuizDifficulty>,
    pub created_by: Option<UserId>,
    pub is_public: Option<bool>,
    /// Free-text match against title and tags.
    pub search: Option<String>,
}

/// Filter for submission listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionFilter {
    pub quiz_id: Option<QuizId>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Filter for the leaderboard projection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaderboardFilter {
    pub subject: Option<String>,
    pub grade: Option<i32>,
}

// =============================================================================
// LIST PROJECTIONS
// =============================================================================

/// Quiz listing row: the quiz without its questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSummary {
    pub quiz_id: QuizId,
    pub title: String,
    pub description: Option<String>,
    pub metadata: QuizMetadata,
    pub created_by: UserId,
    pub is_public: bool,
    pub is_active: bool,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Quiz> for QuizSummary {
    fn from(q: &Quiz) -> Self {
        Self {
            quiz_id: q.quiz_id,
            title: q.title.clone(),
            description: q.description.clone(),
            metadata: q.metadata.clone(),
            created_by: q.created_by,
            is_public: q.is_public,
            is_active: q.is_active,
            version: q.version,
            created_at: q.created_at,
            updated_at: q.updated_at,
        }
    }
}

/// One leaderboard row, ordered by the store (average score descending).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub user_id: UserId,
    pub subject: String,
    pub grade: i32,
    pub average_score: f64,
    pub best_score: f64,
    pub total_quizzes: i32,
}

// =============================================================================
// MUTATIONS
// =============================================================================

/// Partial update applied to a quiz under optimistic versioning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuizPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
    pub time_limit_minutes: Option<i32>,
    pub tags: Option<Vec<String>>,
    pub category: Option<String>,
}

// =============================================================================
// CONTRACTS
// =============================================================================

/// Quiz aggregate store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Fetches the full quiz, including solution fields.
    async fn get_quiz(&self, quiz_id: QuizId) -> StoreResult<Option<Quiz>>;

    /// Lists quizzes without their questions; returns `(rows, total)`.
    async fn list_quizzes(
        &self,
        filter: &QuizFilter,
        page: Page,
    ) -> StoreResult<(Vec<QuizSummary>, i64)>;

    async fn create_quiz(&self, quiz: &Quiz) -> StoreResult<QuizId>;

    /// Applies `patch` iff the stored version equals `expected_version`;
    /// increments the version on success.
    async fn update_quiz(
        &self,
        quiz_id: QuizId,
        patch: &QuizPatch,
        expected_version: i32,
    ) -> StoreResult<Quiz>;

    /// Flips `is_active` off. Returns `false` when the quiz does not exist.
    async fn soft_delete(&self, quiz_id: QuizId) -> StoreResult<bool>;

    /// Replaces one question's hints; returns the new quiz version.
    async fn update_question_hints(
        &self,
        quiz_id: QuizId,
        question_id: &str,
        hints: &[String],
    ) -> StoreResult<i32>;
}

/// Submission aggregate store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Persists a completed submission. Fails with
    /// [`StoreError::DuplicateAttempt`] on an attempt-number collision.
    async fn create_submission(&self, submission: &Submission) -> StoreResult<SubmissionId>;

    /// Fetches a submission scoped to its owner.
    async fn get_submission(
        &self,
        submission_id: SubmissionId,
        user_id: UserId,
    ) -> StoreResult<Option<Submission>>;

    /// Lists a user's submissions, newest first; returns `(rows, total)`.
    async fn list_submissions(
        &self,
        user_id: UserId,
        filter: &SubmissionFilter,
        page: Page,
    ) -> StoreResult<(Vec<Submission>, i64)>;

    /// Counts completed attempts for `(user_id, quiz_id)`.
    async fn count_attempts(&self, user_id: UserId, quiz_id: QuizId) -> StoreResult<i64>;

    /// Attaches a late AI evaluation to a stored submission.
    async fn set_evaluation(
        &self,
        submission_id: SubmissionId,
        evaluation: &AiEvaluation,
    ) -> StoreResult<()>;
}

/// Performance projection store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PerformanceRepository: Send + Sync {
    /// Fetches the record for `(user_id, subject, grade)`; subject matching
    /// is case-insensitive.
    async fn get_performance(
        &self,
        user_id: UserId,
        subject: &str,
        grade: i32,
    ) -> StoreResult<Option<PerformanceHistory>>;

    /// Inserts or replaces the record. When `expected_last_calculated_at` is
    /// set, the write succeeds only if the stored record still carries that
    /// timestamp; otherwise [`StoreError::VersionConflict`].
    async fn upsert_performance(
        &self,
        history: &PerformanceHistory,
        expected_last_calculated_at: Option<DateTime<Utc>>,
    ) -> StoreResult<PerformanceHistory>;

    /// All performance records for one user, across subjects.
    async fn list_for_user(&self, user_id: UserId) -> StoreResult<Vec<PerformanceHistory>>;

    /// Ordered leaderboard projection (average score descending).
    async fn list_for_leaderboard(
        &self,
        filter: &LeaderboardFilter,
        limit: i64,
    ) -> StoreResult<Vec<LeaderboardRow>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_offset_is_zero_based() {
        assert_eq!(Page::new(1, 20).offset(), 0);
        assert_eq!(Page::new(3, 10).offset(), 20);
    }

    #[test]
    fn store_errors_map_to_core_errors() {
        assert!(matches!(
            CoreError::from(StoreError::DuplicateAttempt),
            CoreError::DuplicateAttempt
        ));
        assert!(matches!(
            CoreError::from(StoreError::VersionConflict),
            CoreError::VersionConflict
        ));
        assert!(matches!(
            CoreError::from(StoreError::Backend("down".into())),
            CoreError::Store(_)
        ));
    }
}
