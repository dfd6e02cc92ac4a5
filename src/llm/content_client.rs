//! # Generative-Content Adapter
//!
//! Fallback provider adapter speaking the generative-content protocol
//! (`models/{model}:generateContent`). Returns raw text only.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::ProviderSettings;
use crate::llm::chat_client::classify_send_error;
use crate::llm::{ProviderClient, ProviderError, ProviderRequest, ProviderResponse};

/// HTTP client for a generative-content endpoint.
pub struct GenerativeContentClient {
    settings: ProviderSettings,
    http: reqwest::Client,
}

impl GenerativeContentClient {
    pub fn new(settings: ProviderSettings) -> Self {
        Self {
            settings,
            http: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationSettings,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationSettings {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl ProviderClient for GenerativeContentClient {
    fn name(&self) -> &str {
        &self.settings.name
    }

    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.settings.base_url, self.settings.model
        );
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationSettings {
                max_output_tokens: request.max_output_tokens,
                temperature: request.temperature,
            },
        };

        let started = Instant::now();
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.settings.api_key.as_str())])
            .timeout(request.deadline)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_send_error(e, request))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Transport(format!("http status {status}")));
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(format!("malformed payload: {e}")))?;

        let raw_text = payload
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
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

// =============================================================================
// Tests
// =============================================================================
