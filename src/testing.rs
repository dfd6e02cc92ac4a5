//! In-memory store fakes and fixtures shared by the service tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    AiEvaluation, Difficulty, PerformanceHistory, Question, QuestionType, Quiz, QuizDifficulty,
    QuizId, QuizMetadata, Submission, SubmissionId, UserId,
};
use crate::repository::{
    LeaderboardFilter, LeaderboardRow, Page, PerformanceRepository, QuizFilter, QuizPatch,
    QuizRepository, QuizSummary, StoreError, StoreResult, SubmissionFilter, SubmissionRepository,
};

/// Installs a compact subscriber so `--nocapture` runs show the warn-level
/// degradation logs. Safe to call from every test; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("quiz_core=debug")
        .compact()
        .try_init();
}

// =============================================================================
// FIXTURES
// =============================================================================

pub fn sample_question(id: &str, topic: &str, points: i32) -> Question {
    Question {
        question_id: id.into(),
        text: format!("question {id}"),
        question_type: QuestionType::Mcq,
        options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
        correct_answer: "a".into(),
        explanation: Some("because a".into()),
        difficulty: Difficulty::Medium,
        points,
        hints: vec!["first hint".into()],
        topic: Some(topic.into()),
    }
}

pub fn sample_quiz(author: UserId, subject: &str, question_count: usize) -> Quiz {
    let questions: Vec<Question> = (1..=question_count)
        .map(|i| sample_question(&format!("q{i}"), "general", 5))
        .collect();
    Quiz {
        quiz_id: QuizId::new(),
        title: format!("{subject} practice"),
        description: Some("fixture quiz".into()),
        metadata: QuizMetadata {
            grade: 7,
            subject: subject.into(),
            total_questions: question_count as i32,
            time_limit_minutes: 30,
            difficulty: QuizDifficulty::Medium,
            tags: vec![subject.to_lowercase()],
            category: None,
            adaptive: None,
        },
        questions,
        created_by: author,
        is_public: true,
        is_active: true,
        version: 1,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

// =============================================================================
// QUIZ STORE
// =============================================================================

#[derive(Default)]
pub struct InMemoryQuizStore {
    quizzes: Mutex<HashMap<QuizId, Quiz>>,
}

impl InMemoryQuizStore {
    pub fn with(quizzes: impl IntoIterator<Item = Quiz>) -> Self {
        Self {
            quizzes: Mutex::new(quizzes.into_iter().map(|q| (q.quiz_id, q)).collect()),
        }
    }
}

#[async_trait]
impl QuizRepository for InMemoryQuizStore {
    async fn get_quiz(&self, quiz_id: QuizId) -> StoreResult<Option<Quiz>> {
        Ok(self.quizzes.lock().unwrap().get(&quiz_id).cloned())
    }

    async fn list_quizzes(
        &self,
        filter: &QuizFilter,
        page: Page,
    ) -> StoreResult<(Vec<QuizSummary>, i64)> {
        let quizzes = self.quizzes.lock().unwrap();
        let mut rows: Vec<QuizSummary> = quizzes
            .values()
            .filter(|q| q.is_active)
            .filter(|q| {
                filter
                    .subject
                    .as_ref()
                    .is_none_or(|s| q.metadata.subject.eq_ignore_ascii_case(s))
            })
            .filter(|q| filter.grade.is_none_or(|g| q.metadata.grade == g))
            .filter(|q| filter.is_public.is_none_or(|p| q.is_public == p))
            .filter(|q| filter.created_by.is_none_or(|u| q.created_by == u))
            .map(QuizSummary::from)
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = rows.len() as i64;
        let rows = rows
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.per_page as usize)
            .collect();
        Ok((rows, total))
    }

    async fn create_quiz(&self, quiz: &Quiz) -> StoreResult<QuizId> {
        self.quizzes
            .lock()
            .unwrap()
            .insert(quiz.quiz_id, quiz.clone());
        Ok(quiz.quiz_id)
    }

    async fn update_quiz(
        &self,
        quiz_id: QuizId,
        patch: &QuizPatch,
        expected_version: i32,
    ) -> StoreResult<Quiz> {
        let mut quizzes = self.quizzes.lock().unwrap();
        let quiz = quizzes
            .get_mut(&quiz_id)
            .ok_or_else(|| StoreError::Backend("quiz not found".into()))?;
        if quiz.version != expected_version {
            return Err(StoreError::VersionConflict);
        }
        if let Some(title) = &patch.title {
            quiz.title = title.clone();
        }
        if let Some(description) = &patch.description {
            quiz.description = Some(description.clone());
        }
        if let Some(is_public) = patch.is_public {
            quiz.is_public = is_public;
        }
        if let Some(minutes) = patch.time_limit_minutes {
            quiz.metadata.time_limit_minutes = minutes;
        }
        if let Some(tags) = &patch.tags {
            quiz.metadata.tags = tags.clone();
        }
        if let Some(category) = &patch.category {
            quiz.metadata.category = Some(category.clone());
        }
        quiz.version += 1;
        quiz.updated_at = Utc::now();
        Ok(quiz.clone())
    }

    async fn soft_delete(&self, quiz_id: QuizId) -> StoreResult<bool> {
        let mut quizzes = self.quizzes.lock().unwrap();
        match quizzes.get_mut(&quiz_id) {
            Some(quiz) => {
                quiz.is_active = false;
                quiz.version += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_question_hints(
        &self,
        quiz_id: QuizId,
        question_id: &str,
        hints: &[String],
    ) -> StoreResult<i32> {
        let mut quizzes = self.quizzes.lock().unwrap();
        let quiz = quizzes
            .get_mut(&quiz_id)
            .ok_or_else(|| StoreError::Backend("quiz not found".into()))?;
        let question = quiz
            .questions
            .iter_mut()
            .find(|q| q.question_id == question_id)
            .ok_or_else(|| StoreError::Backend("question not found".into()))?;
        question.hints = hints.to_vec();
        quiz.version += 1;
        Ok(quiz.version)
    }
}

// =============================================================================
// SUBMISSION STORE
// =============================================================================

#[derive(Default)]
pub struct InMemorySubmissionStore {
    submissions: Mutex<Vec<Submission>>,
}

#[async_trait]
impl SubmissionRepository for InMemorySubmissionStore {
    async fn create_submission(&self, submission: &Submission) -> StoreResult<SubmissionId> {
        let mut submissions = self.submissions.lock().unwrap();
        let collision = submissions.iter().any(|s| {
            s.user_id == submission.user_id
                && s.quiz_id == submission.quiz_id
                && s.attempt_number == submission.attempt_number
        });
        if collision {
            return Err(StoreError::DuplicateAttempt);
        }
        submissions.push(submission.clone());
        Ok(submission.submission_id)
    }

    async fn get_submission(
        &self,
        submission_id: SubmissionId,
        user_id: UserId,
    ) -> StoreResult<Option<Submission>> {
        Ok(self
            .submissions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.submission_id == submission_id && s.user_id == user_id)
            .cloned())
    }

    async fn list_submissions(
        &self,
        user_id: UserId,
        filter: &SubmissionFilter,
        page: Page,
    ) -> StoreResult<(Vec<Submission>, i64)> {
        let submissions = self.submissions.lock().unwrap();
        let mut rows: Vec<Submission> = submissions
            .iter()
            .filter(|s| s.user_id == user_id)
            .filter(|s| filter.quiz_id.is_none_or(|q| s.quiz_id == q))
            .filter(|s| filter.from.is_none_or(|f| s.timing.submitted_at >= f))
            .filter(|s| filter.to.is_none_or(|t| s.timing.submitted_at <= t))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.timing.submitted_at.cmp(&a.timing.submitted_at));
        let total = rows.len() as i64;
        let rows = rows
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.per_page as usize)
            .collect();
        Ok((rows, total))
    }

    async fn count_attempts(&self, user_id: UserId, quiz_id: QuizId) -> StoreResult<i64> {
        Ok(self
            .submissions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id == user_id && s.quiz_id == quiz_id)
            .count() as i64)
    }

    async fn set_evaluation(
        &self,
        submission_id: SubmissionId,
        evaluation: &AiEvaluation,
    ) -> StoreResult<()> {
        let mut submissions = self.submissions.lock().unwrap();
        let submission = submissions
            .iter_mut()
            .find(|s| s.submission_id == submission_id)
            .ok_or_else(|| StoreError::Backend("submission not found".into()))?;
        submission.ai_evaluation = Some(evaluation.clone());
        Ok(())
    }
}

// =============================================================================
// PERFORMANCE STORE
// =============================================================================

#[derive(Default)]
pub struct InMemoryPerformanceStore {
    records: Mutex<Vec<PerformanceHistory>>,
}

impl InMemoryPerformanceStore {
    pub fn with(records: impl IntoIterator<Item = PerformanceHistory>) -> Self {
        Self {
            records: Mutex::new(records.into_iter().collect()),
        }
    }
}

fn same_key(record: &PerformanceHistory, user_id: UserId, subject: &str, grade: i32) -> bool {
    record.user_id == user_id
        && record.grade == grade
        && record.subject.eq_ignore_ascii_case(subject)
}

#[async_trait]
impl PerformanceRepository for InMemoryPerformanceStore {
    async fn get_performance(
        &self,
        user_id: UserId,
        subject: &str,
        grade: i32,
    ) -> StoreResult<Option<PerformanceHistory>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| same_key(r, user_id, subject, grade))
            .cloned())
    }

    async fn upsert_performance(
        &self,
        history: &PerformanceHistory,
        expected_last_calculated_at: Option<DateTime<Utc>>,
    ) -> StoreResult<PerformanceHistory> {
        let mut records = self.records.lock().unwrap();
        let existing = records
            .iter_mut()
            .find(|r| same_key(r, history.user_id, &history.subject, history.grade));
        match (existing, expected_last_calculated_at) {
            (Some(record), Some(expected)) if record.last_calculated_at != expected => {
                Err(StoreError::VersionConflict)
            }
            (Some(record), _) => {
                *record = history.clone();
                Ok(history.clone())
            }
            (None, Some(_)) => Err(StoreError::VersionConflict),
            (None, None) => {
                records.push(history.clone());
                Ok(history.clone())
            }
        }
    }

    async fn list_for_user(&self, user_id: UserId) -> StoreResult<Vec<PerformanceHistory>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_for_leaderboard(
        &self,
        filter: &LeaderboardFilter,
        limit: i64,
    ) -> StoreResult<Vec<LeaderboardRow>> {
        let records = self.records.lock().unwrap();
        let mut rows: Vec<LeaderboardRow> = records
            .iter()
            .filter(|r| {
                filter
                    .subject
                    .as_ref()
                    .is_none_or(|s| r.subject.eq_ignore_ascii_case(s))
            })
            .filter(|r| filter.grade.is_none_or(|g| r.grade == g))
            .map(|r| LeaderboardRow {
                user_id: r.user_id,
                subject: r.subject.clone(),
                grade: r.grade,
                average_score: r.stats.average_score,
                best_score: r.stats.best_score,
                total_quizzes: r.stats.total_quizzes,
            })
            .collect();
        rows.sort_by(|a, b| b.average_score.total_cmp(&a.average_score));
        rows.truncate(limit as usize);
        Ok(rows)
    }
}
