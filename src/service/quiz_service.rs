//! # Quiz Service
//!
//! Author-facing quiz lifecycle: creation with invariant checks, sanitized
//! reads, optimistic updates, soft deletion, duplication, and AI-assisted
//! hint authoring.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::QuizView;
use crate::domain::{
    CoreError, CoreResult, Difficulty, Question, QuestionType, Quiz, QuizDifficulty, QuizId,
    QuizMetadata, UserId, MAX_HINTS,
};
use crate::llm::AiGateway;
use crate::repository::{Page, QuizFilter, QuizPatch, QuizRepository, QuizSummary};
use crate::sanitize::SanitizeOptions;

/// A question as supplied by an author; ids are assigned on creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuestion {
    pub text: String,
    pub question_type: QuestionType,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: Option<String>,
    pub difficulty: Difficulty,
    pub points: i32,
    pub hints: Vec<String>,
    pub topic: Option<String>,
}

/// Input for an authored quiz.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizInput {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    pub description: Option<String>,

    #[validate(range(min = 1, max = 12))]
    pub grade: i32,

    #[validate(length(min = 1, max = 100))]
    pub subject: String,

    #[validate(range(min = 5, max = 180))]
    pub time_limit_minutes: i32,

    pub difficulty: QuizDifficulty,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub is_public: bool,

    #[validate(length(min = 1, max = 50))]
    pub questions: Vec<NewQuestion>,
}

/// Author-facing quiz operations.
pub struct QuizService {
    quiz_repo: Arc<dyn QuizRepository>,
    gateway: Arc<AiGateway>,
}

impl QuizService {
    pub fn new(quiz_repo: Arc<dyn QuizRepository>, gateway: Arc<AiGateway>) -> Self {
        Self { quiz_repo, gateway }
    }

    // =========================================================================
    // CREATION
    // =========================================================================

    /// Creates an authored quiz after checking the question invariants.
    pub async fn create_quiz(&self, author: UserId, input: CreateQuizInput) -> CoreResult<Quiz> {
        input.validate()?;

        let mut questions = Vec::with_capacity(input.questions.len());
        for (index, new_question) in input.questions.iter().enumerate() {
            questions.push(validate_question(new_question, index)?);
        }

        let now = Utc::now();
        let quiz = Quiz {
            quiz_id: QuizId::new(),
            title: input.title,
            description: input.description,
            metadata: QuizMetadata {
                grade: input.grade,
                subject: input.subject,
                total_questions: questions.len() as i32,
                time_limit_minutes: input.time_limit_minutes,
                difficulty: input.difficulty,
                tags: input.tags,
                category: input.category,
                adaptive: None,
            },
            questions,
            created_by: author,
            is_public: input.is_public,
            is_active: true,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        self.quiz_repo.create_quiz(&quiz).await?;
        Ok(quiz)
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Fetches a quiz for one caller. Authors see solutions; everyone else
    /// gets the sanitized projection with hints opt-in. Private quizzes are
    /// visible to their author only.
    pub async fn get_quiz(
        &self,
        quiz_id: QuizId,
        caller: Option<UserId>,
        include_hints: bool,
    ) -> CoreResult<QuizView> {
        let quiz = self.fetch_active(quiz_id).await?;
        let is_author = caller == Some(quiz.created_by);

        if !quiz.is_public && !is_author {
            return Err(CoreError::AccessDenied);
        }

        let opts = if is_author {
            SanitizeOptions::internal()
        } else if include_hints {
            SanitizeOptions::client_with_hints()
        } else {
            SanitizeOptions::client()
        };
        Ok(QuizView::project(&quiz, opts))
    }

    /// Lists quizzes without their questions.
    pub async fn list_quizzes(
        &self,
        filter: &QuizFilter,
        page: Page,
    ) -> CoreResult<(Vec<QuizSummary>, i64)> {
        Ok(self.quiz_repo.list_quizzes(filter, page).await?)
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Applies a patch under optimistic versioning; author only.
    pub async fn update_quiz(
        &self,
        quiz_id: QuizId,
        caller: UserId,
        patch: QuizPatch,
        expected_version: i32,
    ) -> CoreResult<Quiz> {
        let quiz = self.fetch_active(quiz_id).await?;
        if quiz.created_by != caller {
            return Err(CoreError::AccessDenied);
        }
        Ok(self
            .quiz_repo
            .update_quiz(quiz_id, &patch, expected_version)
            .await?)
    }

    /// Soft-deletes a quiz; author only.
    pub async fn delete_quiz(&self, quiz_id: QuizId, caller: UserId) -> CoreResult<()> {
        let quiz = self.fetch_active(quiz_id).await?;
        if quiz.created_by != caller {
            return Err(CoreError::AccessDenied);
        }
        self.quiz_repo.soft_delete(quiz_id).await?;
        Ok(())
    }

    /// Duplicates a quiz as a fresh private identity owned by the caller.
    /// Allowed for the author and for any public quiz.
    pub async fn duplicate_quiz(&self, quiz_id: QuizId, caller: UserId) -> CoreResult<Quiz> {
        let source = self.fetch_active(quiz_id).await?;
        if !source.is_public && source.created_by != caller {
            return Err(CoreError::AccessDenied);
        }

        let now = Utc::now();
        let copy = Quiz {
            quiz_id: QuizId::new(),
            title: format!("{} (copy)", source.title),
            created_by: caller,
            is_public: false,
            is_active: true,
            version: 1,
            created_at: now,
            updated_at: now,
            ..source
        };
        self.quiz_repo.create_quiz(&copy).await?;
        Ok(copy)
    }

    /// Generates one more hint for a question and persists it; author only.
    /// Returns the hint together with the new quiz version.
    pub async fn generate_hint(
        &self,
        quiz_id: QuizId,
        question_id: &str,
        caller: UserId,
    ) -> CoreResult<(String, i32)> {
        let quiz = self.fetch_active(quiz_id).await?;
        if quiz.created_by != caller {
            return Err(CoreError::AccessDenied);
        }
        let question = quiz
            .question(question_id)
            .ok_or_else(|| CoreError::QuestionNotFound {
                quiz_id,
                question_id: question_id.to_string(),
            })?;
        if question.hints.len() >= MAX_HINTS {
            return Err(CoreError::Validation(format!(
                "question already carries {MAX_HINTS} hints"
            )));
        }

        let hint = self.gateway.generate_hint(question).await?;
        let mut hints = question.hints.clone();
        hints.push(hint.clone());
        let version = self
            .quiz_repo
            .update_question_hints(quiz_id, question_id, &hints)
            .await?;
        Ok((hint, version))
    }

    async fn fetch_active(&self, quiz_id: QuizId) -> CoreResult<Quiz> {
        self.quiz_repo
            .get_quiz(quiz_id)
            .await?
            .filter(|q| q.is_active)
            .ok_or(CoreError::QuizNotFound(quiz_id))
    }
}

/// Checks the per-question invariants and assigns the in-quiz id.
fn validate_question(new_question: &NewQuestion, index: usize) -> CoreResult<Question> {
    let ordinal = index + 1;
    if new_question.text.trim().is_empty() {
        return Err(CoreError::Validation(format!(
            "question {ordinal} has no text"
        )));
    }
    if new_question.correct_answer.trim().is_empty() {
        return Err(CoreError::Validation(format!(
            "question {ordinal} has no correct answer"
        )));
    }
    if !(1..=10).contains(&new_question.points) {
        return Err(CoreError::Validation(format!(
            "question {ordinal} points must be between 1 and 10"
        )));
    }
    if new_question.hints.len() > MAX_HINTS {
        return Err(CoreError::Validation(format!(
            "question {ordinal} carries more than {MAX_HINTS} hints"
        )));
    }

    match new_question.question_type {
        QuestionType::Mcq => {
            if !(2..=6).contains(&new_question.options.len()) {
                return Err(CoreError::Validation(format!(
                    "question {ordinal} needs 2-6 options"
                )));
            }
            // The author tool is case-sensitive here; grading is not.
            if !new_question
                .options
                .iter()
                .any(|o| *o == new_question.correct_answer)
            {
                return Err(CoreError::Validation(format!(
                    "question {ordinal} answer must equal one option"
                )));
            }
        }
        QuestionType::TrueFalse | QuestionType::ShortAnswer => {
            if !new_question.options.is_empty() {
                return Err(CoreError::Validation(format!(
                    "question {ordinal} must not carry options"
                )));
            }
        }
    }

    Ok(Question {
        question_id: format!("q{ordinal}"),
        text: new_question.text.clone(),
        question_type: new_question.question_type,
        options: new_question.options.clone(),
        correct_answer: new_question.correct_answer.clone(),
        explanation: new_question.explanation.clone(),
        difficulty: new_question.difficulty,
        points: new_question.points,
        hints: new_question.hints.clone(),
        topic: new_question.topic.clone(),
    })
}

// =============================================================================
// Tests
// =============================================================================
