//! # Chat-Completions Adapter
//!
//! Primary provider adapter speaking the OpenAI-compatible chat-completions
//! protocol. The adapter returns raw text only; all interpretation happens in
//! the gateway.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::ProviderSettings;
use crate::llm::{ProviderClient, ProviderError, ProviderRequest, ProviderResponse};

/// HTTP client for an OpenAI-compatible chat-completions endpoint.
///
/// One instance is shared process-wide; the inner `reqwest::Client` pools
/// connections and is safe for concurrent use.
pub struct ChatCompletionsClient {
    settings: ProviderSettings,
    http: reqwest::Client,
}

impl ChatCompletionsClient {
    pub fn new(settings: ProviderSettings) -> Self {
        Self {
            settings,
            http: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl ProviderClient for ChatCompletionsClient {
    fn name(&self) -> &str {
        &self.settings.name
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.settings.base_url);
        let body = ChatRequest {
            model: &self.settings.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            max_tokens: request.max_output_tokens,
            temperature: request.temperature,
        };

        let started = Instant::now();
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .timeout(request.deadline)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_send_error(e, request))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Transport(format!("http status {status}")));
        }

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(format!("malformed payload: {e}")))?;

        let raw_text = payload
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        if raw_text.trim().is_empty() {
            return Err(ProviderError::Empty);
        }

        Ok(ProviderResponse {
            raw_text,
            provider: self.settings.name.clone(),
            latency_ms: started.elapsed().as_millis() as u64,
        })
    }
}

pub(crate) fn classify_send_error(e: reqwest::Error, request: &ProviderRequest) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(request.deadline)
    } else {
        ProviderError::Transport(e.to_string())
    }
}

// =============================================================================
// Tests
// =============================================================================
