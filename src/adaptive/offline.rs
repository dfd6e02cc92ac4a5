//! # Offline Difficulty Recommendation
//!
//! Synthesizes a per-user difficulty distribution from historical
//! performance. Four numeric factors feed a performance-bucketed baseline
//! with sequential adjustments; callers that request a fixed level get a
//! performance-tuned fixed table instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    AdaptiveFactors, ConfidenceLevel, Difficulty, DifficultyDistribution, PerformanceHistory,
    RequestedDifficulty, TopicStat,
};

/// How many recent scores the consistency and trend factors look at.
const RECENT_WINDOW: usize = 5;

/// Topics below this accuracy are suggested for the next quiz.
const WEAK_TOPIC_ACCURACY: f64 = 70.0;

/// Minimum questions seen before a topic accuracy is trusted.
const WEAK_TOPIC_MIN_QUESTIONS: i32 = 3;

const MAX_SUGGESTED_TOPICS: usize = 3;

// =============================================================================
// INPUT
// =============================================================================

/// One historical score with its date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatedScore {
    pub date: DateTime<Utc>,
    pub score: f64,
}

/// Subject-specific slice of a user's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectHistory {
    pub average_score: f64,
    pub total_quizzes: i32,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub topic_stats: Vec<TopicStat>,
}

/// Shaped performance input for the recommender: the target subject's record
/// plus the user's global averages across subjects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    pub global_average: f64,
    pub total_quizzes: i32,
    /// Subject scores, newest first.
    pub recent_scores: Vec<DatedScore>,
    pub subject: Option<SubjectHistory>,
}

impl PerformanceSnapshot {
    /// Snapshot for a user with no history at all.
    pub fn empty() -> Self {
        Self {
            global_average: 0.0,
            total_quizzes: 0,
            recent_scores: Vec::new(),
            subject: None,
        }
    }

    /// Shapes store records into a snapshot: the subject record supplies the
    /// recent scores and familiarity inputs, all records supply the global
    /// average weighted by attempt counts.
    pub fn build(
        subject_record: Option<&PerformanceHistory>,
        all_records: &[PerformanceHistory],
    ) -> Self {
        let total_quizzes: i32 = all_records.iter().map(|r| r.stats.total_quizzes).sum();
        let global_average = if total_quizzes > 0 {
            all_records
                .iter()
                .map(|r| r.stats.average_score * f64::from(r.stats.total_quizzes))
                .sum::<f64>()
                / f64::from(total_quizzes)
        } else {
            0.0
        };

        let recent_scores = subject_record
            .map(|r| {
                r.recent_performance
                    .iter()
                    .map(|e| DatedScore {
                        date: e.date,
                        score: e.score,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let subject = subject_record.map(|r| SubjectHistory {
            average_score: r.stats.average_score,
            total_quizzes: r.stats.total_quizzes,
            last_attempt_at: r.recent_performance.first().map(|e| e.date),
            topic_stats: r.topic_stats.clone(),
        });

        Self {
            global_average,
            total_quizzes,
            recent_scores,
            subject,
        }
    }
}

// =============================================================================
// OUTPUT
// =============================================================================

/// A full recommendation: the distribution plus everything needed to explain
/// and persist it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyRecommendation {
    pub distribution: DifficultyDistribution,
    pub reasoning: Vec<String>,
    pub confidence: ConfidenceLevel,
    pub suggested_topics: Vec<String>,
    pub factors: AdaptiveFactors,
}

// =============================================================================
// RECOMMENDATION
// =============================================================================

/// Computes the difficulty recommendation for one upcoming quiz.
///
/// `now` is passed in so the familiarity recency factor stays deterministic.
pub fn recommend(
    snapshot: &PerformanceSnapshot,
    requested: Option<RequestedDifficulty>,
    now: DateTime<Utc>,
) -> DifficultyRecommendation {
    let factors = AdaptiveFactors {
        performance_score: performance_score(snapshot),
        consistency_score: consistency_score(&snapshot.recent_scores),
        improvement_trend: improvement_trend(&snapshot.recent_scores),
        subject_familiarity: subject_familiarity(snapshot.subject.as_ref(), now),
    };

    let (distribution, reasoning) = match requested.and_then(RequestedDifficulty::fixed_level) {
        Some(level) => fixed_level_distribution(level, factors.performance_score),
        None => distribution_from_factors(&factors),
    };

    DifficultyRecommendation {
        distribution,
        reasoning,
        confidence: confidence(snapshot),
        suggested_topics: suggested_topics(snapshot.subject.as_ref()),
        factors,
    }
}

/// Derives the mixed distribution from the four factors: performance-bucketed
/// baseline, sequential band adjustments, then clamping with the medium
/// residual.
pub fn distribution_from_factors(
    factors: &AdaptiveFactors,
) -> (DifficultyDistribution, Vec<String>) {
    let performance = factors.performance_score;
    let (mut easy, mut medium, mut hard, performance_note) = match performance {
        p if p < 40.0 => (
            70,
            25,
            5,
            "Overall performance is low; the mix leans heavily toward easy questions",
        ),
        p if p < 60.0 => (
            50,
            40,
            10,
            "Overall performance is below average; easier questions dominate the mix",
        ),
        p if p < 75.0 => (
            35,
            45,
            20,
            "Overall performance is moderate; the mix stays balanced with some challenge",
        ),
        p if p < 85.0 => (
            25,
            50,
            25,
            "Overall performance is strong; the mix adds harder questions",
        ),
        _ => (
            15,
            40,
            45,
            "Overall performance is excellent; hard questions take a large share",
        ),
    };
    let mut reasoning = vec![performance_note.to_string()];

    if factors.consistency_score < 30.0 {
        easy += 10;
        hard -= 10;
        reasoning.push("Scores vary widely; extra easy questions stabilize the attempt".into());
    } else if factors.consistency_score > 80.0 {
        hard += 5;
        easy -= 5;
        reasoning.push("Scores are very consistent; a few more hard questions are safe".into());
    }

    if factors.improvement_trend > 20.0 {
        hard += 5;
        medium += 5;
        easy -= 10;
        reasoning.push("Recent scores are improving; difficulty shifts upward".into());
    } else if factors.improvement_trend < -20.0 {
        easy += 10;
        hard -= 10;
        reasoning.push("Recent scores are declining; difficulty shifts downward".into());
    }

    if factors.subject_familiarity < 20.0 {
        easy += 15;
        medium += 5;
        hard -= 20;
        reasoning.push("Little history in this subject; the mix starts gentle".into());
    } else if factors.subject_familiarity > 80.0 {
        hard += 10;
        easy -= 10;
        reasoning.push("Deep familiarity with this subject; harder questions are added".into());
    }

    easy = easy.clamp(10, 80);
    hard = hard.clamp(5, 60);
    medium = 100 - easy - hard;
    if medium < 10 {
        // Steal the shortfall from whichever side is larger. In degenerate
        // inputs this can push easy or hard slightly past its clamp; that
        // behavior is load-bearing for downstream consumers.
        let shortfall = 10 - medium;
        if easy >= hard {
            easy -= shortfall;
        } else {
            hard -= shortfall;
        }
        medium = 10;
    }

    (DifficultyDistribution::new(easy, medium, hard), reasoning)
}

/// Fixed-level tables, tuned by the performance score.
fn fixed_level_distribution(
    level: Difficulty,
    performance: f64,
) -> (DifficultyDistribution, Vec<String>) {
    let distribution = match level {
        Difficulty::Easy => {
            if performance < 50.0 {
                DifficultyDistribution::new(90, 10, 0)
            } else {
                DifficultyDistribution::new(80, 15, 5)
            }
        }
        Difficulty::Medium => {
            if performance < 50.0 {
                DifficultyDistribution::new(40, 50, 10)
            } else if performance > 80.0 {
                DifficultyDistribution::new(10, 70, 20)
            } else {
                DifficultyDistribution::new(20, 70, 10)
            }
        }
        Difficulty::Hard => {
            if performance < 60.0 {
                DifficultyDistribution::new(20, 50, 30)
            } else {
                DifficultyDistribution::new(5, 35, 60)
            }
        }
    };
    let reasoning = vec![format!(
        "Requested {level} difficulty, tuned to the learner's performance level"
    )];
    (distribution, reasoning)
}

// =============================================================================
// FACTORS
// =============================================================================

/// Blended global/subject performance, [0, 100]. The subject average carries
/// the weight once the user has at least two subject attempts.
fn performance_score(snapshot: &PerformanceSnapshot) -> f64 {
    match &snapshot.subject {
        Some(subject) if subject.total_quizzes >= 2 => {
            (0.3 * snapshot.global_average + 0.7 * subject.average_score).round()
        }
        _ => snapshot.global_average.round(),
    }
}

/// Consistency over the most recent scores: `clamp(100 - 2.5 * stdev, 0,
/// 100)`, or the neutral 50 with fewer than two scores.
fn consistency_score(recent_scores: &[DatedScore]) -> f64 {
    let window: Vec<f64> = recent_scores
        .iter()
        .take(RECENT_WINDOW)
        .map(|s| s.score)
        .collect();
    if window.len() < 2 {
        return 50.0;
    }

    let mean = window.iter().sum::<f64>() / window.len() as f64;
    let variance = window.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / window.len() as f64;
    (100.0 - 2.5 * variance.sqrt()).clamp(0.0, 100.0)
}

/// Signed recent-vs-older score difference, clamped to [-50, +50]: the mean
/// of the two newest scores against the mean of the rest of the window.
fn improvement_trend(recent_scores: &[DatedScore]) -> f64 {
    if recent_scores.len() < 3 {
        return 0.0;
    }

    let mut window: Vec<DatedScore> = recent_scores.iter().copied().take(RECENT_WINDOW).collect();
    window.sort_by(|a, b| b.date.cmp(&a.date));

    let newer = (window[0].score + window[1].score) / 2.0;
    let older: f64 =
        window[2..].iter().map(|s| s.score).sum::<f64>() / (window.len() - 2) as f64;
    (newer - older).clamp(-50.0, 50.0)
}

/// Attempt-count and recency blend for the subject, [0, 100].
fn subject_familiarity(subject: Option<&SubjectHistory>, now: DateTime<Utc>) -> f64 {
    let Some(subject) = subject else {
        return 0.0;
    };

    let attempts_factor = f64::from(10 * subject.total_quizzes).min(100.0);
    let recency_factor = match subject.last_attempt_at {
        Some(last) => {
            let days_since = (now - last).num_days() as f64;
            (100.0 - 2.0 * days_since).clamp(20.0, 100.0)
        }
        // No dated attempt on record: floor of the recency band.
        None => 20.0,
    };
    0.7 * attempts_factor + 0.3 * recency_factor
}

// =============================================================================
// CONFIDENCE & TOPICS
// =============================================================================

fn confidence(snapshot: &PerformanceSnapshot) -> ConfidenceLevel {
    let recent = snapshot.recent_scores.len();
    if snapshot.total_quizzes < 3 || recent < 2 {
        ConfidenceLevel::Low
    } else if snapshot.total_quizzes < 8 || recent < 4 {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::High
    }
}

/// Weakest subject topics, worst first, for the generation prompt.
fn suggested_topics(subject: Option<&SubjectHistory>) -> Vec<String> {
    let Some(subject) = subject else {
        return Vec::new();
    };

    let mut weak: Vec<&TopicStat> = subject
        .topic_stats
        .iter()
        .filter(|t| t.total_questions >= WEAK_TOPIC_MIN_QUESTIONS)
        .filter(|t| t.accuracy < WEAK_TOPIC_ACCURACY)
        .collect();
    weak.sort_by(|a, b| a.accuracy.total_cmp(&b.accuracy));
    weak.iter()
        .take(MAX_SUGGESTED_TOPICS)
        .map(|t| t.topic.clone())
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn factors(
        performance: f64,
        consistency: f64,
        trend: f64,
        familiarity: f64,
    ) -> AdaptiveFactors {
        AdaptiveFactors {
            performance_score: performance,
            consistency_score: consistency,
            improvement_trend: trend,
            subject_familiarity: familiarity,
        }
    }

    fn scores(values: &[f64]) -> Vec<DatedScore> {
        let now = Utc::now();
        values
            .iter()
            .enumerate()
            .map(|(i, &score)| DatedScore {
                date: now - Duration::days(i as i64),
                score,
            })
            .collect()
    }

    #[test]
    fn struggling_learner_lands_on_eighty_fifteen_five() {
        // performance 35 -> baseline (70,25,5); consistency 20 -> (80,25,-5);
        // trend -25 -> (90,25,-15); familiarity 10 -> (105,30,-35);
        // clamp easy 80, hard 5, medium = 15.
        let (dist, reasoning) = distribution_from_factors(&factors(35.0, 20.0, -25.0, 10.0));
        assert_eq!(dist, DifficultyDistribution::new(80, 15, 5));
        assert!(dist.is_valid());
        assert_eq!(reasoning.len(), 4);
    }

    #[test]
    fn zero_history_favors_easy() {
        let rec = recommend(&PerformanceSnapshot::empty(), None, Utc::now());
        assert!(rec.distribution.easy >= 50);
        assert!(rec.distribution.is_valid());
        assert_eq!(rec.confidence, ConfidenceLevel::Low);
        assert_eq!(rec.factors.subject_familiarity, 0.0);
    }

    #[test]
    fn top_performer_with_high_familiarity_gets_hard_mix() {
        let (dist, _) = distribution_from_factors(&factors(100.0, 50.0, 0.0, 90.0));
        assert!(dist.hard >= 40);
        assert!(dist.is_valid());
    }

    #[test]
    fn distribution_always_sums_to_one_hundred() {
        for performance in [0.0, 35.0, 45.0, 62.0, 80.0, 100.0] {
            for consistency in [10.0, 50.0, 95.0] {
                for trend in [-40.0, 0.0, 40.0] {
                    for familiarity in [5.0, 50.0, 95.0] {
                        let (dist, _) = distribution_from_factors(&factors(
                            performance,
                            consistency,
                            trend,
                            familiarity,
                        ));
                        assert_eq!(
                            dist.total(),
                            100,
                            "factors ({performance}, {consistency}, {trend}, {familiarity})"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn performance_score_blends_once_subject_has_two_attempts() {
        let mut snapshot = PerformanceSnapshot {
            global_average: 60.0,
            total_quizzes: 10,
            recent_scores: vec![],
            subject: Some(SubjectHistory {
                average_score: 90.0,
                total_quizzes: 2,
                last_attempt_at: None,
                topic_stats: vec![],
            }),
        };
        // 0.3 * 60 + 0.7 * 90 = 81
        assert_eq!(performance_score(&snapshot), 81.0);

        snapshot.subject.as_mut().unwrap().total_quizzes = 1;
        assert_eq!(performance_score(&snapshot), 60.0);
    }

    #[test]
    fn consistency_needs_two_scores() {
        assert_eq!(consistency_score(&scores(&[70.0])), 50.0);
        assert_eq!(consistency_score(&[]), 50.0);
    }

    #[test]
    fn identical_scores_are_fully_consistent() {
        assert_eq!(consistency_score(&scores(&[80.0; 5])), 100.0);
    }

    #[test]
    fn spread_scores_lower_consistency() {
        // stdev of [100, 0] is 50 -> 100 - 125 clamps to 0.
        assert_eq!(consistency_score(&scores(&[100.0, 0.0])), 0.0);
    }

    #[test]
    fn trend_compares_newest_two_to_the_rest() {
        assert_eq!(improvement_trend(&scores(&[90.0, 85.0, 70.0, 65.0, 60.0])), 22.5);
        assert_eq!(improvement_trend(&scores(&[60.0, 65.0, 90.0])), -27.5);
        assert_eq!(improvement_trend(&scores(&[90.0, 40.0])), 0.0);
    }

    #[test]
    fn trend_is_clamped() {
        assert_eq!(improvement_trend(&scores(&[100.0, 100.0, 0.0])), 50.0);
    }

    #[test]
    fn familiarity_blends_attempts_and_recency() {
        let now = Utc::now();
        let subject = SubjectHistory {
            average_score: 75.0,
            total_quizzes: 10,
            last_attempt_at: Some(now),
            topic_stats: vec![],
        };
        // attempts 100, recency 100
        assert_eq!(subject_familiarity(Some(&subject), now), 100.0);

        let stale = SubjectHistory {
            last_attempt_at: Some(now - Duration::days(60)),
            total_quizzes: 3,
            ..subject
        };
        // attempts 30, recency floor 20 -> 0.7*30 + 0.3*20 = 27
        assert_eq!(subject_familiarity(Some(&stale), now), 27.0);

        assert_eq!(subject_familiarity(None, now), 0.0);
    }

    #[test]
    fn fixed_level_tables_follow_performance() {
        let (dist, _) = fixed_level_distribution(Difficulty::Easy, 30.0);
        assert_eq!(dist, DifficultyDistribution::new(90, 10, 0));

        let (dist, _) = fixed_level_distribution(Difficulty::Medium, 85.0);
        assert_eq!(dist, DifficultyDistribution::new(10, 70, 20));

        let (dist, _) = fixed_level_distribution(Difficulty::Hard, 50.0);
        assert_eq!(dist, DifficultyDistribution::new(20, 50, 30));

        let (dist, _) = fixed_level_distribution(Difficulty::Hard, 75.0);
        assert_eq!(dist, DifficultyDistribution::new(5, 35, 60));
    }

    #[test]
    fn requested_level_bypasses_the_mixed_algorithm() {
        let snapshot = PerformanceSnapshot {
            global_average: 90.0,
            total_quizzes: 20,
            recent_scores: scores(&[90.0; 5]),
            subject: Some(SubjectHistory {
                average_score: 90.0,
                total_quizzes: 20,
                last_attempt_at: Some(Utc::now()),
                topic_stats: vec![],
            }),
        };
        let rec = recommend(&snapshot, Some(RequestedDifficulty::Easy), Utc::now());
        assert_eq!(rec.distribution, DifficultyDistribution::new(80, 15, 5));
        assert_eq!(rec.reasoning.len(), 1);
    }

    #[test]
    fn confidence_bands() {
        let mut snapshot = PerformanceSnapshot::empty();
        assert_eq!(confidence(&snapshot), ConfidenceLevel::Low);

        snapshot.total_quizzes = 5;
        snapshot.recent_scores = scores(&[70.0, 75.0, 80.0]);
        assert_eq!(confidence(&snapshot), ConfidenceLevel::Medium);

        snapshot.total_quizzes = 12;
        snapshot.recent_scores = scores(&[70.0, 75.0, 80.0, 85.0, 90.0]);
        assert_eq!(confidence(&snapshot), ConfidenceLevel::High);
    }

    #[test]
    fn weak_topics_are_suggested_worst_first() {
        let topic = |name: &str, total: i32, accuracy: f64| TopicStat {
            topic: name.into(),
            total_questions: total,
            correct_answers: 0,
            accuracy,
            avg_time_per_question: 30.0,
        };
        let subject = SubjectHistory {
            average_score: 70.0,
            total_quizzes: 5,
            last_attempt_at: None,
            topic_stats: vec![
                topic("fractions", 10, 55.0),
                topic("decimals", 8, 40.0),
                topic("geometry", 2, 10.0), // too few questions
                topic("algebra", 12, 90.0), // strong enough
            ],
        };
        assert_eq!(
            suggested_topics(Some(&subject)),
            vec!["decimals".to_string(), "fractions".to_string()]
        );
    }

    #[test]
    fn snapshot_build_weights_global_average_by_attempts() {
        let user = crate::domain::UserId::new();
        let mut math = PerformanceHistory::empty(user, "Math", 7);
        math.stats.total_quizzes = 3;
        math.stats.average_score = 90.0;
        let mut science = PerformanceHistory::empty(user, "Science", 7);
        science.stats.total_quizzes = 1;
        science.stats.average_score = 50.0;

        let snapshot = PerformanceSnapshot::build(Some(&math), &[math.clone(), science]);
        assert_eq!(snapshot.total_quizzes, 4);
        assert_eq!(snapshot.global_average, 80.0); // (90*3 + 50*1) / 4
        assert_eq!(snapshot.subject.as_ref().unwrap().total_quizzes, 3);
    }
}
