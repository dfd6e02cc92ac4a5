//! # Submission Orchestrator
//!
//! End-to-end submit flow: fetch quiz, score, persist, then best-effort AI
//! evaluation and analytics projection. Neither a stuck provider nor a stale
//! projector may prevent the user from receiving their score.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::api::SubmissionResponse;
use crate::config::RetryConfig;
use crate::domain::{
    AiEvaluation, CoreError, CoreResult, DeviceType, Quiz, QuizId, Submission, SubmissionId,
    SubmissionMetadata, SubmissionTiming, UserAnswer, UserId,
};
use crate::llm::AiGateway;
use crate::projection::PerformanceProjector;
use crate::repository::{
    Page, QuizRepository, StoreError, SubmissionFilter, SubmissionRepository,
};
use crate::scoring;

/// Input for one quiz submission.
#[derive(Debug, Clone)]
pub struct SubmitQuizCommand {
    pub user_id: UserId,
    pub quiz_id: QuizId,
    pub answers: Vec<UserAnswer>,
    pub started_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
    /// When set, the attempt is evaluated by the AI gateway best-effort.
    pub request_evaluation: bool,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Orchestrates the submit flow.
pub struct SubmissionService {
    quiz_repo: Arc<dyn QuizRepository>,
    submission_repo: Arc<dyn SubmissionRepository>,
    projector: Arc<PerformanceProjector>,
    gateway: Arc<AiGateway>,
    retry: RetryConfig,
}

impl SubmissionService {
    pub fn new(
        quiz_repo: Arc<dyn QuizRepository>,
        submission_repo: Arc<dyn SubmissionRepository>,
        projector: Arc<PerformanceProjector>,
        gateway: Arc<AiGateway>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            quiz_repo,
            submission_repo,
            projector,
            gateway,
            retry,
        }
    }

    /// Submits a completed attempt.
    ///
    /// Scoring and the durable write are mandatory; evaluation and projection
    /// run afterwards, concurrently and best-effort. Their outcomes are
    /// reported in the response (`aiEvaluation`, `analytics.updated`) instead
    /// of failing it.
    pub async fn submit_quiz(&self, cmd: SubmitQuizCommand) -> CoreResult<SubmissionResponse> {
        if cmd.submitted_at < cmd.started_at {
            return Err(CoreError::Validation(
                "submittedAt precedes startedAt".into(),
            ));
        }

        let quiz = self
            .quiz_repo
            .get_quiz(cmd.quiz_id)
            .await?
            .filter(|q| q.is_active)
            .ok_or(CoreError::QuizNotFound(cmd.quiz_id))?;

        let graded = scoring::grade_answers(&quiz.questions, &cmd.answers)?;
        let summary = scoring::summarize(&graded, quiz.metadata.total_questions);

        // The attempt counter can race with a concurrent submission for the
        // same (user, quiz); the store's unique index arbitrates and the
        // count is re-read on each retry.
        let mut submission = None;
        for attempt in 1..=self.retry.max_attempts {
            let attempt_number = 1 + self
                .submission_repo
                .count_attempts(cmd.user_id, cmd.quiz_id)
                .await? as i32;

            let candidate = Submission {
                submission_id: SubmissionId::new(),
                quiz_id: cmd.quiz_id,
                user_id: cmd.user_id,
                attempt_number,
                answers: graded.clone(),
                scoring: summary,
                timing: SubmissionTiming::derive(cmd.started_at, cmd.submitted_at),
                ai_evaluation: None,
                metadata: SubmissionMetadata {
                    ip_address: cmd.ip_address.clone(),
                    user_agent: cmd.user_agent.clone(),
                    device_type: DeviceType::from_user_agent(cmd.user_agent.as_deref()),
                },
                is_completed: true,
            };

            match self.submission_repo.create_submission(&candidate).await {
                Ok(_) => {
                    submission = Some(candidate);
                    break;
                }
                Err(StoreError::DuplicateAttempt) => {
                    tracing::warn!(
                        user_id = %cmd.user_id,
                        quiz_id = %cmd.quiz_id,
                        attempt_number,
                        attempt,
                        "attempt number collided, re-reading count"
                    );
                    tokio::time::sleep(self.retry.backoff(attempt)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
        let mut submission = submission.ok_or(CoreError::DuplicateAttempt)?;

        // Both side effects start only after the durable write and may
        // overlap each other.
        let evaluation = self.evaluate_best_effort(&cmd, &quiz, &submission);
        let projection = self.project_best_effort(&submission, &quiz);
        let (evaluation, analytics_updated) = tokio::join!(evaluation, projection);
        submission.ai_evaluation = evaluation;

        Ok(SubmissionResponse::build(submission, analytics_updated))
    }

    /// Fetches one submission scoped to its owner.
    pub async fn get_submission(
        &self,
        submission_id: SubmissionId,
        user_id: UserId,
    ) -> CoreResult<Submission> {
        self.submission_repo
            .get_submission(submission_id, user_id)
            .await?
            .ok_or(CoreError::SubmissionNotFound(submission_id))
    }

    /// Lists a user's submissions, newest first.
    pub async fn list_submissions(
        &self,
        user_id: UserId,
        filter: &SubmissionFilter,
        page: Page,
    ) -> CoreResult<(Vec<Submission>, i64)> {
        Ok(self
            .submission_repo
            .list_submissions(user_id, filter, page)
            .await?)
    }

    async fn evaluate_best_effort(
        &self,
        cmd: &SubmitQuizCommand,
        quiz: &Quiz,
        submission: &Submission,
    ) -> Option<AiEvaluation> {
        if !cmd.request_evaluation {
            return None;
        }

        match self
            .gateway
            .evaluate_submission(&quiz.questions, &submission.answers)
            .await
        {
            Ok(feedback) => {
                let evaluation = AiEvaluation {
                    provider: feedback.provider,
                    suggestions: feedback.suggestions,
                    strengths: feedback.strengths,
                    weaknesses: feedback.weaknesses,
                    evaluated_at: Utc::now(),
                };
                if let Err(e) = self
                    .submission_repo
                    .set_evaluation(submission.submission_id, &evaluation)
                    .await
                {
                    tracing::warn!(
                        submission_id = %submission.submission_id,
                        error = %e,
                        "evaluation computed but could not be persisted"
                    );
                }
                Some(evaluation)
            }
            Err(e) => {
                tracing::warn!(
                    submission_id = %submission.submission_id,
                    error = %e,
                    "AI evaluation unavailable, returning submission without it"
                );
                None
            }
        }
    }

    async fn project_best_effort(&self, submission: &Submission, quiz: &Quiz) -> bool {
        match self.projector.project(submission, quiz).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(
                    submission_id = %submission.submission_id,
                    error = %e,
                    "performance projection failed, submission preserved"
                );
                false
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
