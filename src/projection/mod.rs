//! # Performance Projector
//!
//! Sole writer of `PerformanceHistory`. Every completed submission is folded
//! into the rolling per-(user, subject, grade) record: stats, the bounded
//! recent-performance ring, trend summary, and topic breakdown.
//!
//! Concurrent projections for the same key are serialized with optimistic
//! concurrency: read, fold, conditional upsert, retry on conflict.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::RetryConfig;
use crate::domain::{
    CoreError, CoreResult, Difficulty, PerformanceHistory, PerformanceTrends, Quiz, RecentResult,
    Submission, TopicStat, TrendDirection, RECENT_PERFORMANCE_CAP,
};
use crate::repository::{PerformanceRepository, StoreError};

/// Score delta against the running average that flips the trend direction.
const TREND_DELTA: f64 = 5.0;

/// Average over the newest results at or above this recommends hard quizzes.
const RECOMMEND_HARD_AT: f64 = 85.0;

/// Average below this recommends easy quizzes.
const RECOMMEND_EASY_BELOW: f64 = 65.0;

/// Folds submissions into performance history records.
pub struct PerformanceProjector {
    repo: Arc<dyn PerformanceRepository>,
    retry: RetryConfig,
}

impl PerformanceProjector {
    pub fn new(repo: Arc<dyn PerformanceRepository>, retry: RetryConfig) -> Self {
        Self { repo, retry }
    }

    /// Projects one completed submission. Invoke once per submission; the
    /// `(user, quiz, attempt)` uniqueness upstream provides caller-level
    /// idempotence.
    ///
    /// On an optimistic-concurrency loss the projection is retried up to the
    /// configured budget, then fails with `ProjectorConflict`.
    pub async fn project(
        &self,
        submission: &Submission,
        quiz: &Quiz,
    ) -> CoreResult<PerformanceHistory> {
        let subject = quiz.metadata.subject.as_str();
        let grade = quiz.metadata.grade;

        for attempt in 1..=self.retry.max_attempts {
            let current = self
                .repo
                .get_performance(submission.user_id, subject, grade)
                .await?;
            let expected = current.as_ref().map(|h| h.last_calculated_at);
            let base = current.unwrap_or_else(|| {
                PerformanceHistory::empty(submission.user_id, subject, grade)
            });

            let updated = apply_submission(base, submission, quiz, Utc::now());
            match self.repo.upsert_performance(&updated, expected).await {
                Ok(persisted) => return Ok(persisted),
                Err(StoreError::VersionConflict) => {
                    tracing::warn!(
                        user_id = %submission.user_id,
                        subject,
                        attempt,
                        "performance projection lost a concurrent update, retrying"
                    );
                    tokio::time::sleep(self.retry.backoff(attempt)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CoreError::ProjectorConflict)
    }
}

// =============================================================================
// FOLD
// =============================================================================

/// Pure fold of one submission into a history record.
pub fn apply_submission(
    mut history: PerformanceHistory,
    submission: &Submission,
    quiz: &Quiz,
    now: DateTime<Utc>,
) -> PerformanceHistory {
    let score = submission.scoring.score_percentage;
    let time_minutes = (submission.timing.total_time_seconds as f64 / 60.0).round() as i64;

    // Rolling stats.
    let n = history.stats.total_quizzes + 1;
    history.stats.average_score =
        (history.stats.average_score * f64::from(n - 1) + score) / f64::from(n);
    if n == 1 {
        // A zeroed record would otherwise pin worst_score at 0 forever.
        history.stats.best_score = score;
        history.stats.worst_score = score;
    } else {
        history.stats.best_score = history.stats.best_score.max(score);
        history.stats.worst_score = history.stats.worst_score.min(score);
    }
    history.stats.total_quizzes = n;
    history.stats.total_time_minutes += time_minutes;

    // Recent ring, newest first.
    history.recent_performance.insert(
        0,
        RecentResult {
            date: now,
            score,
            quiz_id: quiz.quiz_id,
            difficulty: quiz.metadata.difficulty,
        },
    );
    history.recent_performance.truncate(RECENT_PERFORMANCE_CAP);

    history.stats.consistency = consistency(&history.recent_performance);
    history.trends = trends(&history.recent_performance, history.stats.average_score);
    fold_topic_stats(&mut history.topic_stats, submission, quiz);

    history.last_calculated_at = now;
    history
}

/// `clamp(100 - stdev(recent scores), 0, 100)`.
fn consistency(recent: &[RecentResult]) -> f64 {
    if recent.is_empty() {
        return 0.0;
    }
    let scores: Vec<f64> = recent.iter().map(|r| r.score).collect();
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / scores.len() as f64;
    (100.0 - variance.sqrt()).clamp(0.0, 100.0)
}

/// Trend summary over the 3 newest results against the running average.
fn trends(recent: &[RecentResult], average_score: f64) -> PerformanceTrends {
    if recent.len() < 3 {
        return PerformanceTrends::default();
    }

    let newest_avg = recent.iter().take(3).map(|r| r.score).sum::<f64>() / 3.0;
    let delta = newest_avg - average_score;
    let direction = if delta > TREND_DELTA {
        TrendDirection::Up
    } else if delta < -TREND_DELTA {
        TrendDirection::Down
    } else {
        TrendDirection::Stable
    };

    let recommended_difficulty = if newest_avg >= RECOMMEND_HARD_AT {
        Difficulty::Hard
    } else if newest_avg < RECOMMEND_EASY_BELOW {
        Difficulty::Easy
    } else {
        Difficulty::Medium
    };

    PerformanceTrends {
        improving: direction == TrendDirection::Up,
        direction,
        recommended_difficulty,
    }
}

/// Accumulates per-topic counts, accuracy, and running mean time.
fn fold_topic_stats(topic_stats: &mut Vec<TopicStat>, submission: &Submission, quiz: &Quiz) {
    for answer in &submission.answers {
        let Some(topic) = quiz
            .question(&answer.question_id)
            .and_then(|q| q.topic.as_deref())
        else {
            continue;
        };

        let index = match topic_stats.iter().position(|t| t.topic == topic) {
            Some(index) => index,
            None => {
                topic_stats.push(TopicStat {
                    topic: topic.to_string(),
                    total_questions: 0,
                    correct_answers: 0,
                    accuracy: 0.0,
                    avg_time_per_question: 0.0,
                });
                topic_stats.len() - 1
            }
        };
        let stat = &mut topic_stats[index];

        let n = stat.total_questions + 1;
        stat.avg_time_per_question = (stat.avg_time_per_question * f64::from(n - 1)
            + f64::from(answer.time_spent_seconds))
            / f64::from(n);
        stat.total_questions = n;
        if answer.is_correct {
            stat.correct_answers += 1;
        }
        stat.accuracy = 100.0 * f64::from(stat.correct_answers) / f64::from(n);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AnswerRecord, GradeLetter, Question, QuestionType, QuizDifficulty, QuizId, QuizMetadata,
        ScoringSummary, SubmissionId, SubmissionMetadata, SubmissionTiming, UserId,
    };
    use crate::repository::MockPerformanceRepository;
    use chrono::Duration;
    use mockall::Sequence;

    fn quiz(subject: &str) -> Quiz {
        let question = |id: &str, topic: &str| Question {
            question_id: id.into(),
            text: format!("question {id}"),
            question_type: QuestionType::Mcq,
            options: vec!["a".into(), "b".into()],
            correct_answer: "a".into(),
            explanation: None,
            difficulty: crate::domain::Difficulty::Medium,
            points: 5,
            hints: vec![],
            topic: Some(topic.into()),
        };
        Quiz {
            quiz_id: QuizId::new(),
            title: "Fractions basics".into(),
            description: None,
            metadata: QuizMetadata {
                grade: 7,
                subject: subject.into(),
                total_questions: 2,
                time_limit_minutes: 20,
                difficulty: QuizDifficulty::Medium,
                tags: vec![],
                category: None,
                adaptive: None,
            },
            questions: vec![question("q1", "fractions"), question("q2", "decimals")],
            created_by: UserId::new(),
            is_public: true,
            is_active: true,
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn submission(user_id: UserId, quiz: &Quiz, score: f64, seconds: i64) -> Submission {
        let correct = (score / 100.0 * 2.0).round() as usize;
        let answers: Vec<AnswerRecord> = quiz
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| AnswerRecord {
                question_id: q.question_id.clone(),
                user_answer: "a".into(),
                is_correct: i < correct,
                points_earned: if i < correct { 5 } else { 0 },
                time_spent_seconds: 30,
                hints_used: 0,
            })
            .collect();
        let started = Utc::now() - Duration::seconds(seconds);
        Submission {
            submission_id: SubmissionId::new(),
            quiz_id: quiz.quiz_id,
            user_id,
            attempt_number: 1,
            answers,
            scoring: ScoringSummary {
                total_questions: 2,
                correct_answers: correct as i32,
                total_points: (correct * 5) as i32,
                score_percentage: score,
                grade: GradeLetter::from_percentage(score),
            },
            timing: SubmissionTiming::derive(started, Utc::now()),
            ai_evaluation: None,
            metadata: SubmissionMetadata::default(),
            is_completed: true,
        }
    }

    #[test]
    fn first_projection_seeds_stats() {
        let quiz = quiz("Math");
        let user = UserId::new();
        let sub = submission(user, &quiz, 100.0, 754);

        let history = apply_submission(
            PerformanceHistory::empty(user, "Math", 7),
            &sub,
            &quiz,
            Utc::now(),
        );

        assert_eq!(history.stats.total_quizzes, 1);
        assert_eq!(history.stats.average_score, 100.0);
        assert_eq!(history.stats.best_score, 100.0);
        assert_eq!(history.stats.worst_score, 100.0);
        assert_eq!(history.stats.total_time_minutes, 13); // round(754 / 60)
        assert_eq!(history.recent_performance.len(), 1);
        assert_eq!(history.stats.consistency, 100.0);
    }

    #[test]
    fn rolling_average_and_extremes_update() {
        let quiz = quiz("Math");
        let user = UserId::new();
        let now = Utc::now();

        let mut history = PerformanceHistory::empty(user, "Math", 7);
        for score in [100.0, 50.0, 0.0] {
            history = apply_submission(history, &submission(user, &quiz, score, 300), &quiz, now);
        }

        assert_eq!(history.stats.total_quizzes, 3);
        assert_eq!(history.stats.average_score, 50.0);
        assert_eq!(history.stats.best_score, 100.0);
        assert_eq!(history.stats.worst_score, 0.0);
    }

    #[test]
    fn recent_ring_is_capped_and_newest_first() {
        let quiz = quiz("Math");
        let user = UserId::new();
        let mut history = PerformanceHistory::empty(user, "Math", 7);

        let start = Utc::now();
        for i in 0..25 {
            history = apply_submission(
                history,
                &submission(user, &quiz, 50.0, 300),
                &quiz,
                start + Duration::minutes(i),
            );
        }

        assert_eq!(history.recent_performance.len(), RECENT_PERFORMANCE_CAP);
        for pair in history.recent_performance.windows(2) {
            assert!(pair[0].date >= pair[1].date);
        }
        assert_eq!(
            history.recent_performance[0].date,
            start + Duration::minutes(24)
        );
    }

    #[test]
    fn trends_default_until_three_results() {
        let quiz = quiz("Math");
        let user = UserId::new();
        let mut history = PerformanceHistory::empty(user, "Math", 7);
        history = apply_submission(history, &submission(user, &quiz, 100.0, 300), &quiz, Utc::now());
        history = apply_submission(history, &submission(user, &quiz, 0.0, 300), &quiz, Utc::now());

        assert_eq!(history.trends.direction, TrendDirection::Stable);
        assert!(history.trends.improving);
        assert_eq!(history.trends.recommended_difficulty, Difficulty::Medium);
    }

    #[test]
    fn rising_scores_trend_up_and_recommend_hard() {
        let quiz = quiz("Math");
        let user = UserId::new();
        let mut history = PerformanceHistory::empty(user, "Math", 7);
        for score in [0.0, 0.0, 50.0, 100.0, 100.0, 100.0] {
            history = apply_submission(history, &submission(user, &quiz, score, 300), &quiz, Utc::now());
        }

        // Newest three average 100 against a running average of 58.3.
        assert_eq!(history.trends.direction, TrendDirection::Up);
        assert!(history.trends.improving);
        assert_eq!(history.trends.recommended_difficulty, Difficulty::Hard);
    }

    #[test]
    fn falling_scores_trend_down_and_recommend_easy() {
        let quiz = quiz("Math");
        let user = UserId::new();
        let mut history = PerformanceHistory::empty(user, "Math", 7);
        for score in [100.0, 100.0, 100.0, 50.0, 0.0, 0.0] {
            history = apply_submission(history, &submission(user, &quiz, score, 300), &quiz, Utc::now());
        }

        assert_eq!(history.trends.direction, TrendDirection::Down);
        assert!(!history.trends.improving);
        assert_eq!(history.trends.recommended_difficulty, Difficulty::Easy);
    }

    #[test]
    fn topic_stats_accumulate_with_running_mean_time() {
        let quiz = quiz("Math");
        let user = UserId::new();
        let mut history = PerformanceHistory::empty(user, "Math", 7);

        // 100%: both answers correct; 50%: only the first.
        history = apply_submission(history, &submission(user, &quiz, 100.0, 300), &quiz, Utc::now());
        history = apply_submission(history, &submission(user, &quiz, 50.0, 300), &quiz, Utc::now());

        let fractions = history
            .topic_stats
            .iter()
            .find(|t| t.topic == "fractions")
            .unwrap();
        assert_eq!(fractions.total_questions, 2);
        assert_eq!(fractions.correct_answers, 2);
        assert_eq!(fractions.accuracy, 100.0);
        assert_eq!(fractions.avg_time_per_question, 30.0);

        let decimals = history
            .topic_stats
            .iter()
            .find(|t| t.topic == "decimals")
            .unwrap();
        assert_eq!(decimals.total_questions, 2);
        assert_eq!(decimals.correct_answers, 1);
        assert_eq!(decimals.accuracy, 50.0);
    }

    #[tokio::test]
    async fn conflict_is_retried_then_succeeds() {
        let quiz = quiz("Math");
        let user = UserId::new();
        let sub = submission(user, &quiz, 80.0, 300);

        let mut repo = MockPerformanceRepository::new();
        let mut seq = Sequence::new();
        repo.expect_get_performance()
            .times(2)
            .returning(|_, _, _| Ok(None));
        repo.expect_upsert_performance()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(StoreError::VersionConflict));
        repo.expect_upsert_performance()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|h, _| Ok(h.clone()));

        let projector = PerformanceProjector::new(Arc::new(repo), RetryConfig::default());
        let history = projector.project(&sub, &quiz).await.unwrap();
        assert_eq!(history.stats.total_quizzes, 1);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_projector_conflict() {
        let quiz = quiz("Math");
        let user = UserId::new();
        let sub = submission(user, &quiz, 80.0, 300);

        let mut repo = MockPerformanceRepository::new();
        repo.expect_get_performance().returning(|_, _, _| Ok(None));
        repo.expect_upsert_performance()
            .times(3)
            .returning(|_, _| Err(StoreError::VersionConflict));

        let retry = RetryConfig {
            max_attempts: 3,
            backoff_ms: 1,
        };
        let projector = PerformanceProjector::new(Arc::new(repo), retry);
        let err = projector.project(&sub, &quiz).await.unwrap_err();
        assert!(matches!(err, CoreError::ProjectorConflict));
    }
}
