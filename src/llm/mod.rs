//! # AI Provider Layer
//!
//! Uniform interface over the two external LLM providers, plus the gateway
//! that orchestrates primary/fallback failover and defensive response
//! parsing.
//!
//! The gateway never depends on provider-specific types: an adapter takes a
//! text prompt with an output budget and a deadline, and returns raw text.

pub mod chat_client;
pub mod content_client;
pub mod gateway;
pub mod parse;
pub mod prompts;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

use crate::domain::{Difficulty, DifficultyDistribution};

pub use chat_client::ChatCompletionsClient;
pub use content_client::GenerativeContentClient;
pub use gateway::AiGateway;

// =============================================================================
// PROVIDER CONTRACT
// =============================================================================

/// A single completion request to a provider adapter.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub prompt: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
    /// Wall-clock deadline for the whole call.
    pub deadline: Duration,
}

/// Raw provider output.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub raw_text: String,
    pub provider: String,
    pub latency_ms: u64,
}

/// Failures internal to one provider call. These never surface to callers of
/// the gateway; after both providers fail the gateway escalates to
/// [`crate::domain::CoreError::ProviderExhausted`].
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider call exceeded deadline of {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider returned an empty body")]
    Empty,
}

/// Pluggable provider adapter. Implementations are process-wide singletons
/// with pooled connections and are safe for concurrent invocation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Stable provider name used in logs and evaluation records.
    fn name(&self) -> &str;

    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError>;
}

// =============================================================================
// GATEWAY INPUTS & OUTPUTS
// =============================================================================

/// Difficulty instruction for question generation: either one fixed level or
/// a three-way percentage mix summing to 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyInstruction {
    Fixed(Difficulty),
    Mixed(DifficultyDistribution),
}

/// Parameters for a question-generation call.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuizGenerationParams {
    /// School grade, 1-12.
    #[validate(range(min = 1, max = 12))]
    pub grade: i32,

    #[validate(length(min = 1, max = 100))]
    pub subject: String,

    /// Number of questions to generate, 1-50.
    #[validate(range(min = 1, max = 50))]
    pub total_questions: i32,

    pub topics: Vec<String>,

    pub difficulty: DifficultyInstruction,
}

/// Feedback produced by the evaluation operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationFeedback {
    /// Name of the provider that produced the feedback.
    pub provider: String,
    /// Exactly two actionable suggestions.
    pub suggestions: Vec<String>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}
