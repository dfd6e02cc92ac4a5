//! # Prompt Templates
//!
//! One template per gateway operation. Each template pins the output contract
//! to bare JSON with a fixed field schema; the parser still treats the result
//! defensively.

use crate::domain::Question;
use crate::llm::{DifficultyInstruction, QuizGenerationParams};

/// Details of one wrong answer, fed to the evaluation template.
#[derive(Debug, Clone)]
pub struct WrongAnswerDetail {
    pub question_text: String,
    pub topic: Option<String>,
    pub user_answer: String,
    pub correct_answer: String,
}

/// Builds the question-generation prompt.
pub fn generation_prompt(params: &QuizGenerationParams) -> String {
    let difficulty_instruction = match params.difficulty {
        DifficultyInstruction::Fixed(level) => {
            format!("Every question must be {level} difficulty.")
        }
        DifficultyInstruction::Mixed(dist) => format!(
            "Mix difficulties across the set: {}% easy, {}% medium, {}% hard of the total question count.",
            dist.easy, dist.medium, dist.hard
        ),
    };

    let topics = if params.topics.is_empty() {
        "any age-appropriate topics for the subject".to_string()
    } else {
        params.topics.join(", ")
    };

    format!(
        r#"Generate {count} quiz questions for a grade {grade} student studying {subject}.

REQUIREMENTS:
- Topics: {topics}
- {difficulty_instruction}
- Question types: mcq (4 options), true_false, short_answer
- Each question carries 1-10 points scaled to its difficulty

Respond with ONLY a bare JSON array. No markdown, no code fences, no wrapper object, no commentary. Each element must have exactly these fields:
{{
    "questionText": "the question",
    "questionType": "mcq|true_false|short_answer",
    "options": ["only for mcq, 2-6 entries"],
    "correctAnswer": "for mcq must equal one option exactly",
    "explanation": "why the answer is correct",
    "difficulty": "easy|medium|hard",
    "points": 5,
    "hints": ["optional, at most 2 short hints"],
    "topic": "the topic this question covers"
}}"#,
        count = params.total_questions,
        grade = params.grade,
        subject = params.subject,
    )
}

/// Builds the hint-generation prompt for one question.
pub fn hint_prompt(question: &Question) -> String {
    let options = if question.options.is_empty() {
        String::new()
    } else {
        format!("\nOptions: {}", question.options.join(", "))
    };

    format!(
        r#"Write one short hint for the quiz question below. The hint must nudge the student toward the answer without revealing it or eliminating options outright.

Question: {text}{options}

Respond with the hint text only. No JSON, no quotes, no commentary."#,
        text = question.text,
    )
}

/// Builds the submission-evaluation prompt.
pub fn evaluation_prompt(
    wrong_answers: &[WrongAnswerDetail],
    total_questions: usize,
    correct_answers: usize,
) -> String {
    let mistakes = if wrong_answers.is_empty() {
        "None - every answer was correct.".to_string()
    } else {
        wrong_answers
            .iter()
            .enumerate()
            .map(|(i, w)| {
                format!(
                    "{}. [{}] {}\n   answered: \"{}\" / correct: \"{}\"",
                    i + 1,
                    w.topic.as_deref().unwrap_or("general"),
                    w.question_text,
                    w.user_answer,
                    w.correct_answer,
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"A student answered {correct} of {total} quiz questions correctly. Their mistakes:

{mistakes}

Evaluate the attempt. Respond with ONLY a bare JSON object, no markdown or commentary:
{{
    "suggestions": ["exactly two actionable study suggestions"],
    "strengths": ["what the student did well"],
    "weaknesses": ["concepts the student struggled with"]
}}"#,
        correct = correct_answers,
        total = total_questions,
    )
}
