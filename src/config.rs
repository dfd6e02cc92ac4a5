//! # Core Configuration
//!
//! Configuration for the adaptive quiz core. The core has no environment
//! surface of its own: the host process builds a [`CoreConfig`] (from its own
//! config system) and injects it at startup. All values are read once and
//! shared immutably.

use serde::Deserialize;
use std::time::Duration;

/// Root configuration for the core.
///
/// Immutable after creation; construct once at startup and share via `Arc`.
#[derive(Debug, Clone, Deserialize)]
pub struct CoreConfig {
    /// Primary and fallback AI provider settings.
    pub providers: ProvidersConfig,

    /// Per-operation deadlines.
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Output budgets for generation calls.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Retry budgets for transient conflicts.
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Settings for the two provider adapters.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersConfig {
    pub primary: ProviderSettings,
    pub fallback: ProviderSettings,
}

/// Connection settings for one provider adapter.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    /// Provider name used in logs and `aiEvaluation.provider`.
    pub name: String,

    /// API base URL, e.g. `https://api.groq.com/openai/v1`.
    pub base_url: String,

    pub api_key: String,

    /// Model identifier passed to the provider.
    pub model: String,
}

/// Wall-clock deadlines for outbound calls, in seconds.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TimeoutConfig {
    /// Question generation deadline. Default: 30s.
    #[serde(default = "default_generate_timeout")]
    pub generate_seconds: u64,

    /// Submission evaluation deadline. Default: 20s.
    #[serde(default = "default_evaluate_timeout")]
    pub evaluate_seconds: u64,

    /// Hint generation deadline. Default: 10s.
    #[serde(default = "default_hint_timeout")]
    pub hint_seconds: u64,
}

impl TimeoutConfig {
    pub fn generate(&self) -> Duration {
        Duration::from_secs(self.generate_seconds)
    }

    pub fn evaluate(&self) -> Duration {
        Duration::from_secs(self.evaluate_seconds)
    }

    pub fn hint(&self) -> Duration {
        Duration::from_secs(self.hint_seconds)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            generate_seconds: default_generate_timeout(),
            evaluate_seconds: default_evaluate_timeout(),
            hint_seconds: default_hint_timeout(),
        }
    }
}

/// Output budgets and sampling for generation calls.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct GenerationConfig {
    /// Max output tokens for question generation. Default: 4000.
    #[serde(default = "default_generate_tokens")]
    pub generate_max_tokens: u32,

    /// Max output tokens for evaluation. Default: 1000.
    #[serde(default = "default_evaluate_tokens")]
    pub evaluate_max_tokens: u32,

    /// Max output tokens for hints. Default: 200.
    #[serde(default = "default_hint_tokens")]
    pub hint_max_tokens: u32,

    /// Sampling temperature. Default: 0.5.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            generate_max_tokens: default_generate_tokens(),
            evaluate_max_tokens: default_evaluate_tokens(),
            hint_max_tokens: default_hint_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// Retry budgets for transient write conflicts.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RetryConfig {
    /// Attempts for `DuplicateAttempt` and projector conflicts. Default: 3.
    #[serde(default = "default_max_retries")]
    pub max_attempts: u32,

    /// Base backoff between attempts, in milliseconds. Default: 50ms.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl RetryConfig {
    /// Backoff before the given 1-based retry, linear in the attempt number.
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms * u64::from(attempt))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_retries(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

// =============================================================================
// Default Value Functions
// =============================================================================

fn default_generate_timeout() -> u64 {
    30
}

fn default_evaluate_timeout() -> u64 {
    20
}

fn default_hint_timeout() -> u64 {
    10
}

fn default_generate_tokens() -> u32 {
    4000
}

fn default_evaluate_tokens() -> u32 {
    1000
}

fn default_hint_tokens() -> u32 {
    200
}

fn default_temperature() -> f32 {
    0.5
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    50
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_defaults_match_operation_deadlines() {
        let timeouts = TimeoutConfig::default();
        assert_eq!(timeouts.generate(), Duration::from_secs(30));
        assert_eq!(timeouts.evaluate(), Duration::from_secs(20));
        assert_eq!(timeouts.hint(), Duration::from_secs(10));
    }

    #[test]
    fn retry_backoff_grows_with_attempts() {
        let retry = RetryConfig::default();
        assert_eq!(retry.max_attempts, 3);
        assert!(retry.backoff(2) > retry.backoff(1));
    }
}
