//! # Scoring Engine
//!
//! Deterministic, type-aware answer grading with hint-based penalties.
//! Grading is pure: the same questions and answers always produce
//! byte-identical results.

use std::collections::HashMap;

use crate::domain::{
    AnswerRecord, CoreError, CoreResult, GradeLetter, Question, QuestionType, ScoringSummary,
    UserAnswer,
};

/// Stopwords removed before fuzzy short-answer matching.
const STOPWORDS: [&str; 14] = [
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

/// Share of reference key words a short answer must cover.
const KEYWORD_MATCH_RATIO: f64 = 0.7;

/// Penalty per hint used, capped at half credit.
const HINT_PENALTY_STEP: f64 = 0.1;
const HINT_PENALTY_CAP: f64 = 0.5;

// =============================================================================
// GRADING
// =============================================================================

/// Grades a set of user answers against the quiz questions.
///
/// Answers referencing an unknown `question_id` are dropped with a warning.
/// A question with no stored correct answer is corrupt storage and fails the
/// whole grade with [`CoreError::QuizDataInvalid`].
pub fn grade_answers(
    questions: &[Question],
    user_answers: &[UserAnswer],
) -> CoreResult<Vec<AnswerRecord>> {
    let by_id: HashMap<&str, &Question> = questions
        .iter()
        .map(|q| (q.question_id.as_str(), q))
        .collect();

    let mut graded = Vec::with_capacity(user_answers.len());
    for answer in user_answers {
        let Some(question) = by_id.get(answer.question_id.as_str()) else {
            tracing::warn!(
                question_id = %answer.question_id,
                "answer references unknown question, dropping"
            );
            continue;
        };

        if question.correct_answer.trim().is_empty() {
            return Err(CoreError::QuizDataInvalid(format!(
                "question {} has no correct answer",
                question.question_id
            )));
        }

        let is_correct = is_answer_correct(question, &answer.answer);
        graded.push(AnswerRecord {
            question_id: answer.question_id.clone(),
            user_answer: answer.answer.clone(),
            is_correct,
            points_earned: points_earned(question.points, is_correct, answer.hints_used),
            time_spent_seconds: answer.time_spent_seconds,
            hints_used: answer.hints_used,
        });
    }
    Ok(graded)
}

/// Summarizes graded answers into the submission scoring block.
pub fn summarize(graded: &[AnswerRecord], total_questions: i32) -> ScoringSummary {
    let correct_answers = graded.iter().filter(|a| a.is_correct).count() as i32;
    let total_points = graded.iter().map(|a| a.points_earned).sum();
    let score_percentage = if total_questions > 0 {
        (100.0 * f64::from(correct_answers) / f64::from(total_questions)).round()
    } else {
        0.0
    };

    ScoringSummary {
        total_questions,
        correct_answers,
        total_points,
        score_percentage,
        grade: GradeLetter::from_percentage(score_percentage),
    }
}

/// Points for one answer: 0 if incorrect, otherwise the question's points
/// reduced by 10% per hint used, capped at half credit.
fn points_earned(points: i32, is_correct: bool, hints_used: i32) -> i32 {
    if !is_correct {
        return 0;
    }
    let penalty = (HINT_PENALTY_STEP * f64::from(hints_used.max(0))).min(HINT_PENALTY_CAP);
    (f64::from(points) * (1.0 - penalty)).round() as i32
}

// =============================================================================
// CORRECTNESS
// =============================================================================

fn is_answer_correct(question: &Question, user_answer: &str) -> bool {
    match question.question_type {
        QuestionType::Mcq | QuestionType::TrueFalse => {
            user_answer.trim().to_lowercase() == question.correct_answer.trim().to_lowercase()
        }
        QuestionType::ShortAnswer => short_answer_matches(&question.correct_answer, user_answer),
    }
}

/// Fuzzy short-answer match.
///
/// Both sides are cleaned (lowercase, punctuation stripped, stopwords
/// removed). Key words are the reference tokens longer than 2 characters; the
/// answer is correct when at least 70% of them are covered. A key word counts
/// as covered when it and a user token contain each other either way; this
/// makes "car" match "scarce", which mirrors the long-standing matcher
/// behavior.
fn short_answer_matches(reference: &str, user_answer: &str) -> bool {
    let reference_clean = clean_text(reference);
    let user_clean = clean_text(user_answer);

    let key_words: Vec<&str> = reference_clean
        .split_whitespace()
        .filter(|t| t.len() > 2)
        .collect();

    if key_words.is_empty() {
        return reference_clean == user_clean;
    }

    let user_tokens: Vec<&str> = user_clean.split_whitespace().collect();
    let matched = key_words
        .iter()
        .filter(|kw| {
            user_tokens
                .iter()
                .any(|ut| ut.contains(*kw) || kw.contains(ut))
        })
        .count();

    let required = (KEYWORD_MATCH_RATIO * key_words.len() as f64).ceil() as usize;
    matched >= required
}

/// Lowercase, strip punctuation, drop stopwords, normalize whitespace.
fn clean_text(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    stripped
        .split_whitespace()
        .filter(|t| !STOPWORDS.contains(t))
        .collect::<Vec<_>>()
        .join(" ")
}

// =============================================================================
// Tests
// =============================================================================
