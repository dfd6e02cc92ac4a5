//! # Domain Entities
//!
//! Core aggregates for the adaptive quiz platform.
//!
//! ## Entity Overview
//!
//! - `Question`: a single question inside a quiz (owned by value)
//! - `Quiz`: authored or AI-synthesized question set with metadata
//! - `Submission`: one completed attempt with graded answers
//! - `PerformanceHistory`: rolling per-(user, subject, grade) projection
//!
//! Quiz and Submission are separately owned aggregates; PerformanceHistory is
//! a materialized view over submissions. Cross-aggregate links are by identity
//! only, never by embedding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{
    ConfidenceLevel, DeviceType, Difficulty, DifficultyDistribution, GradeLetter, QuestionType,
    QuizDifficulty, QuizId, SubmissionId, TrendDirection, UserId,
};

/// Maximum entries kept in the recent-performance ring.
pub const RECENT_PERFORMANCE_CAP: usize = 20;

/// Maximum hints a question may carry.
pub const MAX_HINTS: usize = 5;

// =============================================================================
// QUIZ AGGREGATE
// =============================================================================

/// A single quiz question, including its solution fields.
///
/// Solution fields (`correct_answer`, `explanation`) must never reach a client
/// unsanitized; see [`crate::sanitize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Opaque id, unique within the quiz.
    pub question_id: String,
    pub text: String,
    pub question_type: QuestionType,
    /// Ordered options; present iff `question_type == Mcq` (2-6 entries).
    pub options: Vec<String>,
    /// Reference answer. For MCQ it equals exactly one option, case-sensitive;
    /// grading itself is case-insensitive.
    pub correct_answer: String,
    pub explanation: Option<String>,
    pub difficulty: Difficulty,
    /// Point value in [1, 10].
    pub points: i32,
    /// Ordered hints, at most [`MAX_HINTS`].
    pub hints: Vec<String>,
    pub topic: Option<String>,
}

/// Quiz-level metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizMetadata {
    /// School grade, 1-12.
    pub grade: i32,
    pub subject: String,
    /// Declared question count; invariant `|questions| == total_questions`.
    pub total_questions: i32,
    /// Time limit in minutes, 5-180.
    pub time_limit_minutes: i32,
    pub difficulty: QuizDifficulty,
    pub tags: Vec<String>,
    pub category: Option<String>,
    /// Present only for adaptively synthesized quizzes.
    pub adaptive: Option<AdaptiveMetadata>,
}

/// Snapshot of the adaptive recommendation a quiz was synthesized from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveMetadata {
    pub distribution: DifficultyDistribution,
    pub confidence: ConfidenceLevel,
    pub factors: AdaptiveFactors,
    /// The performance score the distribution was keyed on.
    pub performance_baseline: f64,
}

/// The four numeric factors behind an adaptive recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveFactors {
    /// Blended global/subject average, [0, 100].
    pub performance_score: f64,
    /// 100 - 2.5 * stdev of the recent 5 scores, clamped to [0, 100].
    pub consistency_score: f64,
    /// Recent-vs-older score mean difference, clamped to [-50, +50].
    pub improvement_trend: f64,
    /// Attempt-count and recency blend for the subject, [0, 100].
    pub subject_familiarity: f64,
}

/// An authored or synthesized quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub quiz_id: QuizId,
    pub title: String,
    pub description: Option<String>,
    pub metadata: QuizMetadata,
    pub questions: Vec<Question>,
    pub created_by: UserId,
    pub is_public: bool,
    /// Soft-delete flag; inactive quizzes are invisible to listings.
    pub is_active: bool,
    /// Monotonic, incremented on any mutation.
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Quiz {
    /// Looks up a question by id.
    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.question_id == question_id)
    }
}

// =============================================================================
// SUBMISSION AGGREGATE
// =============================================================================

/// A raw answer as supplied by the client, before grading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnswer {
    pub question_id: String,
    pub answer: String,
    /// Seconds spent on this question.
    pub time_spent_seconds: i32,
    pub hints_used: i32,
}

/// A graded answer as stored on a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_id: String,
    pub user_answer: String,
    pub is_correct: bool,
    /// 0 if incorrect, otherwise `round(points * (1 - min(0.1 * hints, 0.5)))`.
    pub points_earned: i32,
    pub time_spent_seconds: i32,
    pub hints_used: i32,
}

/// Aggregate scoring for a submission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringSummary {
    pub total_questions: i32,
    pub correct_answers: i32,
    pub total_points: i32,
    /// `round(100 * correct_answers / total_questions)`, 0-100.
    pub score_percentage: f64,
    pub grade: GradeLetter,
}

/// Timing envelope of an attempt. `total_time_seconds` is always derived from
/// the two timestamps, never passed through.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionTiming {
    pub started_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
    pub total_time_seconds: i64,
}

impl SubmissionTiming {
    /// Derives the timing envelope; `total_time_seconds` is
    /// `floor((submitted_at - started_at) / 1s)`.
    pub fn derive(started_at: DateTime<Utc>, submitted_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            submitted_at,
            total_time_seconds: (submitted_at - started_at).num_seconds(),
        }
    }
}

/// Best-effort AI feedback attached to a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiEvaluation {
    /// Name of the provider that produced the feedback.
    pub provider: String,
    /// Exactly two actionable suggestions.
    pub suggestions: Vec<String>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub evaluated_at: DateTime<Utc>,
}

/// Request-context metadata captured with a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionMetadata {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub device_type: DeviceType,
}

/// One completed quiz attempt. Immutable once completed, except for the
/// best-effort AI evaluation which may land after the durable write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub submission_id: SubmissionId,
    pub quiz_id: QuizId,
    pub user_id: UserId,
    /// 1-based, monotonic per (user, quiz); `(user_id, quiz_id,
    /// attempt_number)` is globally unique.
    pub attempt_number: i32,
    pub answers: Vec<AnswerRecord>,
    pub scoring: ScoringSummary,
    pub timing: SubmissionTiming,
    pub ai_evaluation: Option<AiEvaluation>,
    pub metadata: SubmissionMetadata,
    pub is_completed: bool,
}

// =============================================================================
// PERFORMANCE HISTORY AGGREGATE
// =============================================================================

/// Rolling statistics for one (user, subject, grade) key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceStats {
    pub total_quizzes: i32,
    pub average_score: f64,
    pub best_score: f64,
    pub worst_score: f64,
    pub total_time_minutes: i64,
    /// `clamp(100 - stdev(recent scores), 0, 100)`.
    pub consistency: f64,
}

/// One entry in the recent-performance ring, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentResult {
    pub date: DateTime<Utc>,
    pub score: f64,
    pub quiz_id: QuizId,
    pub difficulty: QuizDifficulty,
}

/// Trend summary recomputed from the 3 newest results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceTrends {
    pub improving: bool,
    pub direction: TrendDirection,
    pub recommended_difficulty: Difficulty,
}

impl Default for PerformanceTrends {
    fn default() -> Self {
        Self {
            improving: true,
            direction: TrendDirection::Stable,
            recommended_difficulty: Difficulty::Medium,
        }
    }
}

/// Per-topic accuracy and pace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicStat {
    pub topic: String,
    pub total_questions: i32,
    pub correct_answers: i32,
    /// Percentage, 0-100.
    pub accuracy: f64,
    /// Running mean, seconds per question.
    pub avg_time_per_question: f64,
}

/// Materialized per-subject performance view. Derived strictly from
/// submissions; the projector is the sole mutator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceHistory {
    pub user_id: UserId,
    /// Stored with original casing; keyed case-insensitively.
    pub subject: String,
    pub grade: i32,
    pub stats: PerformanceStats,
    /// Bounded ring of the [`RECENT_PERFORMANCE_CAP`] most recent results,
    /// newest first.
    pub recent_performance: Vec<RecentResult>,
    pub trends: PerformanceTrends,
    pub topic_stats: Vec<TopicStat>,
    pub last_calculated_at: DateTime<Utc>,
}

impl PerformanceHistory {
    /// A zeroed record for a key with no prior submissions.
    pub fn empty(user_id: UserId, subject: impl Into<String>, grade: i32) -> Self {
        Self {
            user_id,
            subject: subject.into(),
            grade,
            stats: PerformanceStats::default(),
            recent_performance: Vec::new(),
            trends: PerformanceTrends::default(),
            topic_stats: Vec::new(),
            last_calculated_at: Utc::now(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
