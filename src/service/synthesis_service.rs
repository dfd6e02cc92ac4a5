//! # Quiz Synthesis Orchestrator
//!
//! Generates adaptive quizzes: read the user's performance, compute the
//! difficulty distribution, generate questions through the AI gateway, and
//! persist the quiz with its adaptive metadata. Callers always receive the
//! sanitized projection; solutions are fetched internally only by the
//! submission flow.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::adaptive::{self, PerformanceSnapshot};
use crate::api::QuizView;
use crate::domain::{
    AdaptiveMetadata, CoreResult, Quiz, QuizDifficulty, QuizId, QuizMetadata,
    RequestedDifficulty, UserId,
};
use crate::llm::{AiGateway, DifficultyInstruction, QuizGenerationParams};
use crate::repository::{PerformanceRepository, QuizRepository};
use crate::sanitize::SanitizeOptions;

/// Parameters for one adaptive synthesis.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuizSynthesisRequest {
    /// Optional title; defaults to "<subject> adaptive quiz".
    #[validate(length(max = 255))]
    pub title: Option<String>,

    #[validate(range(min = 1, max = 12))]
    pub grade: i32,

    #[validate(length(min = 1, max = 100))]
    pub subject: String,

    #[validate(range(min = 1, max = 50))]
    pub total_questions: i32,

    #[validate(range(min = 5, max = 180))]
    pub time_limit_minutes: i32,

    /// Explicit topics; the engine's weak-topic suggestions are merged in.
    pub topics: Vec<String>,

    pub tags: Vec<String>,

    pub category: Option<String>,

    /// A fixed level pins the distribution table; absent or `mixed` lets the
    /// engine shape it.
    pub requested_difficulty: Option<RequestedDifficulty>,

    pub is_public: bool,

    /// Whether the returned projection carries hints.
    pub include_hints: bool,
}

/// Orchestrates adaptive quiz generation.
pub struct SynthesisService {
    quiz_repo: Arc<dyn QuizRepository>,
    performance_repo: Arc<dyn PerformanceRepository>,
    gateway: Arc<AiGateway>,
}

impl SynthesisService {
    pub fn new(
        quiz_repo: Arc<dyn QuizRepository>,
        performance_repo: Arc<dyn PerformanceRepository>,
        gateway: Arc<AiGateway>,
    ) -> Self {
        Self {
            quiz_repo,
            performance_repo,
            gateway,
        }
    }

    /// Generates, persists, and returns an adaptive quiz for one user.
    pub async fn generate_adaptive_quiz(
        &self,
        user_id: UserId,
        request: QuizSynthesisRequest,
    ) -> CoreResult<QuizView> {
        request.validate()?;

        // A user with no prior record gets the zeroed snapshot, which the
        // engine treats as a cautious, easy-heavy start.
        let subject_record = self
            .performance_repo
            .get_performance(user_id, &request.subject, request.grade)
            .await?;
        let all_records = self.performance_repo.list_for_user(user_id).await?;
        let snapshot = PerformanceSnapshot::build(subject_record.as_ref(), &all_records);

        let recommendation =
            adaptive::recommend(&snapshot, request.requested_difficulty, Utc::now());
        tracing::info!(
            user_id = %user_id,
            subject = %request.subject,
            distribution = %recommendation.distribution,
            confidence = ?recommendation.confidence,
            "adaptive distribution computed"
        );

        let mut topics = request.topics.clone();
        for suggested in &recommendation.suggested_topics {
            if !topics.iter().any(|t| t.eq_ignore_ascii_case(suggested)) {
                topics.push(suggested.clone());
            }
        }

        let params = QuizGenerationParams {
            grade: request.grade,
            subject: request.subject.clone(),
            total_questions: request.total_questions,
            topics,
            difficulty: DifficultyInstruction::Mixed(recommendation.distribution),
        };
        let questions = self.gateway.generate_questions(&params).await?;

        let now = Utc::now();
        let quiz = Quiz {
            quiz_id: QuizId::new(),
            title: request
                .title
                .clone()
                .unwrap_or_else(|| format!("{} adaptive quiz", request.subject)),
            description: None,
            metadata: QuizMetadata {
                grade: request.grade,
                subject: request.subject.clone(),
                total_questions: request.total_questions,
                time_limit_minutes: request.time_limit_minutes,
                difficulty: QuizDifficulty::Adaptive,
                tags: request.tags.clone(),
                category: request.category.clone(),
                adaptive: Some(AdaptiveMetadata {
                    distribution: recommendation.distribution,
                    confidence: recommendation.confidence,
                    factors: recommendation.factors,
                    performance_baseline: recommendation.factors.performance_score,
                }),
            },
            questions,
            created_by: user_id,
            is_public: request.is_public,
            is_active: true,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        self.quiz_repo.create_quiz(&quiz).await?;

        let opts = if request.include_hints {
            SanitizeOptions::client_with_hints()
        } else {
            SanitizeOptions::client()
        };
        Ok(QuizView::project(&quiz, opts))
    }
}

// =============================================================================
// Tests
// =============================================================================
