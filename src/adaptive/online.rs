//! # Real-Time Difficulty Adjustment
//!
//! Intra-quiz adjustment computed from the answers given so far. Pure and
//! synchronous; the caller feeds it the running answer sequence (oldest
//! first) and the number of questions left.

use serde::{Deserialize, Serialize};

use crate::domain::AnswerRecord;

/// Window used for recent accuracy, recent pace, and consistency.
const WINDOW: usize = 5;

/// Recent average pace below this (seconds) counts as fast.
const FAST_PACE_SECONDS: f64 = 90.0;

/// Recent average pace above this (seconds) counts as slow.
const SLOW_PACE_SECONDS: f64 = 135.0;

/// Score magnitude required to move off `maintain`.
const DECISION_THRESHOLD: f64 = 0.7;

/// Attempts with fewer questions left than this are dampened and never move.
const MIN_REMAINING_TO_MOVE: i32 = 3;

// =============================================================================
// TYPES
// =============================================================================

/// One answered question in the running attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveAnswer {
    pub is_correct: bool,
    pub time_spent_seconds: i32,
    pub hints_used: i32,
}

impl From<&AnswerRecord> for LiveAnswer {
    fn from(record: &AnswerRecord) -> Self {
        Self {
            is_correct: record.is_correct,
            time_spent_seconds: record.time_spent_seconds,
            hints_used: record.hints_used,
        }
    }
}

/// Where the next questions should move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentDirection {
    Easier,
    Maintain,
    Harder,
}

/// The adjustment decision with its underlying score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RealtimeAdjustment {
    pub direction: AdjustmentDirection,
    /// Signed score in [-1, +1]; positive means the attempt is going well.
    pub adjustment_score: f64,
}

impl RealtimeAdjustment {
    fn maintain() -> Self {
        Self {
            direction: AdjustmentDirection::Maintain,
            adjustment_score: 0.0,
        }
    }
}

// =============================================================================
// ADJUSTMENT
// =============================================================================

/// Decides whether upcoming questions should get easier, harder, or stay.
///
/// Answers are ordered oldest first. With fewer than two answers there is
/// nothing to read yet and the attempt maintains.
pub fn adjust_difficulty(answers: &[LiveAnswer], remaining_questions: i32) -> RealtimeAdjustment {
    let n = answers.len();
    if n < 2 {
        return RealtimeAdjustment::maintain();
    }

    let recent = &answers[n - WINDOW.min(n)..];

    let overall_accuracy = accuracy(answers);
    let recent_accuracy = accuracy(recent);
    let average_time = mean_time(answers);
    let recent_average_time = mean_time(recent);
    let hint_usage_rate =
        answers.iter().map(|a| f64::from(a.hints_used)).sum::<f64>() / n as f64;
    let consistency = consistency_score(answers);
    let trend = improvement_trend(answers);

    let mut score = 0.0;

    if recent_accuracy >= 0.8 {
        score += 0.4;
    } else if recent_accuracy <= 0.4 {
        score -= 0.4;
    }

    if overall_accuracy >= 0.75 {
        score += 0.2;
    } else if overall_accuracy <= 0.5 {
        score -= 0.2;
    }

    let speed_factor = if recent_average_time < average_time
        && recent_average_time < FAST_PACE_SECONDS
    {
        0.5
    } else if recent_average_time > SLOW_PACE_SECONDS {
        -0.5
    } else {
        0.0
    };
    score += 0.15 * speed_factor;

    if hint_usage_rate >= 0.5 {
        score -= 0.15;
    } else if hint_usage_rate <= 0.2 {
        score += 0.1;
    }

    score += 0.1 * consistency;
    score += 0.1 * trend;

    // Late in the attempt a swing is worth less.
    if remaining_questions <= MIN_REMAINING_TO_MOVE {
        score *= 0.7;
    }
    let score = score.clamp(-1.0, 1.0);

    let direction = if score >= DECISION_THRESHOLD && remaining_questions >= MIN_REMAINING_TO_MOVE {
        AdjustmentDirection::Harder
    } else if score <= -DECISION_THRESHOLD && remaining_questions >= MIN_REMAINING_TO_MOVE {
        AdjustmentDirection::Easier
    } else {
        AdjustmentDirection::Maintain
    };

    RealtimeAdjustment {
        direction,
        adjustment_score: score,
    }
}

fn accuracy(answers: &[LiveAnswer]) -> f64 {
    if answers.is_empty() {
        return 0.0;
    }
    answers.iter().filter(|a| a.is_correct).count() as f64 / answers.len() as f64
}

fn mean_time(answers: &[LiveAnswer]) -> f64 {
    if answers.is_empty() {
        return 0.0;
    }
    answers
        .iter()
        .map(|a| f64::from(a.time_spent_seconds))
        .sum::<f64>()
        / answers.len() as f64
}

/// Accuracy stability over sliding windows: `clamp(1 - 2 * variance, 0, 1)`
/// where the variance is taken over per-window accuracies. Shorter sequences
/// degrade to a single window.
fn consistency_score(answers: &[LiveAnswer]) -> f64 {
    let window = WINDOW.min(answers.len());
    let accuracies: Vec<f64> = answers
        .windows(window)
        .map(accuracy)
        .collect();

    let mean = accuracies.iter().sum::<f64>() / accuracies.len() as f64;
    let variance = accuracies.iter().map(|a| (a - mean).powi(2)).sum::<f64>()
        / accuracies.len() as f64;
    (1.0 - 2.0 * variance).clamp(0.0, 1.0)
}

/// Second-half accuracy minus first-half accuracy; zero until both halves
/// hold at least two answers.
fn improvement_trend(answers: &[LiveAnswer]) -> f64 {
    if answers.len() < 4 {
        return 0.0;
    }
    let half = answers.len() / 2;
    accuracy(&answers[half..]) - accuracy(&answers[..half])
}

// =============================================================================
// Tests
// =============================================================================
