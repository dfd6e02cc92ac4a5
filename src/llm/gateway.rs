//! # AI Provider Gateway
//!
//! Single entry point for every AI operation: question generation, hint
//! generation, and submission evaluation. The gateway calls the primary
//! provider and, on any failure (timeout, transport, empty body, parse
//! failure), retries once against the fallback. Only when both providers fail
//! does an operation surface `ProviderExhausted`.

use std::sync::Arc;
use std::time::Instant;

use validator::Validate;

use crate::config::{CoreConfig, GenerationConfig, TimeoutConfig};
use crate::domain::{AnswerRecord, CoreError, CoreResult, Question};
use crate::llm::parse::{self, ParseFailure};
use crate::llm::prompts::{self, WrongAnswerDetail};
use crate::llm::{
    ChatCompletionsClient, EvaluationFeedback, GenerativeContentClient, ProviderClient,
    ProviderError, ProviderRequest, ProviderResponse, QuizGenerationParams,
};

/// How much provider output is kept in failure logs.
const PREVIEW_CHARS: usize = 200;

/// Gateway over the primary and fallback providers.
pub struct AiGateway {
    primary: Arc<dyn ProviderClient>,
    fallback: Arc<dyn ProviderClient>,
    timeouts: TimeoutConfig,
    generation: GenerationConfig,
}

impl AiGateway {
    pub fn new(
        primary: Arc<dyn ProviderClient>,
        fallback: Arc<dyn ProviderClient>,
        timeouts: TimeoutConfig,
        generation: GenerationConfig,
    ) -> Self {
        Self {
            primary,
            fallback,
            timeouts,
            generation,
        }
    }

    /// Builds the gateway with the standard HTTP adapters: a chat-completions
    /// primary and a generative-content fallback.
    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(
            Arc::new(ChatCompletionsClient::new(config.providers.primary.clone())),
            Arc::new(GenerativeContentClient::new(
                config.providers.fallback.clone(),
            )),
            config.timeouts,
            config.generation,
        )
    }

    // =========================================================================
    // OPERATIONS
    // =========================================================================

    /// Generates a question set for the given parameters.
    pub async fn generate_questions(
        &self,
        params: &QuizGenerationParams,
    ) -> CoreResult<Vec<Question>> {
        params.validate()?;

        let request = ProviderRequest {
            prompt: prompts::generation_prompt(params),
            max_output_tokens: self.generation.generate_max_tokens,
            temperature: self.generation.temperature,
            deadline: self.timeouts.generate(),
        };
        let expected = params.total_questions as usize;

        let (questions, _) = self
            .complete_with_failover("generate_questions", &request, |raw| {
                parse::parse_questions(raw, expected)
            })
            .await?;
        Ok(questions)
    }

    /// Generates one hint for a question.
    pub async fn generate_hint(&self, question: &Question) -> CoreResult<String> {
        let request = ProviderRequest {
            prompt: prompts::hint_prompt(question),
            max_output_tokens: self.generation.hint_max_tokens,
            temperature: self.generation.temperature,
            deadline: self.timeouts.hint(),
        };

        let (hint, _) = self
            .complete_with_failover("generate_hint", &request, parse::parse_hint)
            .await?;
        Ok(hint)
    }

    /// Evaluates a graded submission: two actionable suggestions plus
    /// strengths and weaknesses, attributed to the provider that produced
    /// them.
    pub async fn evaluate_submission(
        &self,
        questions: &[Question],
        answers: &[AnswerRecord],
    ) -> CoreResult<EvaluationFeedback> {
        let wrong_answers: Vec<WrongAnswerDetail> = answers
            .iter()
            .filter(|a| !a.is_correct)
            .filter_map(|a| {
                questions
                    .iter()
                    .find(|q| q.question_id == a.question_id)
                    .map(|q| WrongAnswerDetail {
                        question_text: q.text.clone(),
                        topic: q.topic.clone(),
                        user_answer: a.user_answer.clone(),
                        correct_answer: q.correct_answer.clone(),
                    })
            })
            .collect();
        let correct = answers.iter().filter(|a| a.is_correct).count();

        let request = ProviderRequest {
            prompt: prompts::evaluation_prompt(&wrong_answers, answers.len(), correct),
            max_output_tokens: self.generation.evaluate_max_tokens,
            temperature: self.generation.temperature,
            deadline: self.timeouts.evaluate(),
        };

        let (parsed, provider) = self
            .complete_with_failover("evaluate_submission", &request, parse::parse_evaluation)
            .await?;
        Ok(EvaluationFeedback {
            provider,
            suggestions: parsed.suggestions,
            strengths: parsed.strengths,
            weaknesses: parsed.weaknesses,
        })
    }

    // =========================================================================
    // FAILOVER
    // =========================================================================

    /// Runs one operation against the primary, then the fallback. Providers
    /// are tried strictly sequentially, never raced.
    async fn complete_with_failover<T>(
        &self,
        operation: &str,
        request: &ProviderRequest,
        parse: impl Fn(&str) -> Result<T, ParseFailure>,
    ) -> CoreResult<(T, String)> {
        for client in [&self.primary, &self.fallback] {
            let started = Instant::now();
            match call_provider(client.as_ref(), request).await {
                Ok(response) => match parse(&response.raw_text) {
                    Ok(parsed) => {
                        tracing::debug!(
                            operation,
                            provider = %response.provider,
                            latency_ms = response.latency_ms,
                            "provider call succeeded"
                        );
                        return Ok((parsed, response.provider));
                    }
                    Err(e) => {
                        tracing::warn!(
                            operation,
                            provider = %response.provider,
                            latency_ms = response.latency_ms,
                            error = %e,
                            preview = %preview(&response.raw_text),
                            "provider response unparseable"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        operation,
                        provider = client.name(),
                        latency_ms = started.elapsed().as_millis() as u64,
                        error = %e,
                        "provider call failed"
                    );
                }
            }
        }

        tracing::error!(operation, "both providers exhausted");
        Err(CoreError::ProviderExhausted)
    }
}

/// One bounded provider call: the deadline is enforced here regardless of
/// whether the adapter honors it, and an all-whitespace body counts as empty.
async fn call_provider(
    client: &dyn ProviderClient,
    request: &ProviderRequest,
) -> Result<ProviderResponse, ProviderError> {
    match tokio::time::timeout(request.deadline, client.complete(request)).await {
        Ok(result) => {
            let response = result?;
            if response.raw_text.trim().is_empty() {
                return Err(ProviderError::Empty);
            }
            Ok(response)
        }
        Err(_) => Err(ProviderError::Timeout(request.deadline)),
    }
}

/// Truncated content preview for operator logs; never logs whole payloads.
fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        text.to_string()
    } else {
        let cut: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}…")
    }
}

// =============================================================================
// Tests
// =============================================================================
