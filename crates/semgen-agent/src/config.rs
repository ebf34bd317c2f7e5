//! Agent and LLM configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the validate step decides between persisting and regenerating
///
/// The two policies are deliberately separate: the structural gate never
/// discards a candidate, the LLM gate can clear it and force a regenerate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPolicy {
    /// Structural validator decides; fatal issues persist the candidate with
    /// an error annotation; LLM quality review is advisory only
    #[default]
    StructuralGate,
    /// LLM verdict decides; `INVALID` clears the candidate and regenerates
    LlmGate,
}

/// Agent configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Validation attempts before the run is declared failed
    pub max_validation_attempts: u32,
    /// Validate step policy
    pub validation_policy: ValidationPolicy,
    /// Serialized model size (characters) at or above which the quality
    /// review is skipped
    pub quality_review_max_chars: usize,
    /// Tool-calling rounds allowed during discovery
    pub max_discovery_iterations: u32,
    /// Rows returned by the `sample_rows` discovery tool
    pub sample_row_limit: usize,
    /// Retries of the generate step on transient LLM errors
    pub llm_retry_limit: u32,
    /// Linear backoff between generate retries in milliseconds
    pub llm_retry_backoff_ms: u64,
    /// Characters of the OSI specification included in prompts
    pub spec_prompt_max_chars: usize,
    /// Fatal issues listed in the run error summary
    pub max_error_issues: usize,
    /// Time a progress update may take before it is abandoned, in milliseconds
    pub progress_timeout_ms: u64,
}

impl AgentConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With max validation attempts
    #[inline]
    #[must_use]
    pub fn with_max_validation_attempts(mut self, attempts: u32) -> Self {
        self.max_validation_attempts = attempts;
        self
    }

    /// With validation policy
    #[inline]
    #[must_use]
    pub fn with_validation_policy(mut self, policy: ValidationPolicy) -> Self {
        self.validation_policy = policy;
        self
    }

    /// With LLM retry limit and backoff
    #[inline]
    #[must_use]
    pub fn with_llm_retries(mut self, limit: u32, backoff_ms: u64) -> Self {
        self.llm_retry_limit = limit;
        self.llm_retry_backoff_ms = backoff_ms;
        self
    }

    /// With max discovery iterations
    #[inline]
    #[must_use]
    pub fn with_max_discovery_iterations(mut self, iterations: u32) -> Self {
        self.max_discovery_iterations = iterations;
        self
    }

    /// With progress update timeout
    #[inline]
    #[must_use]
    pub fn with_progress_timeout(mut self, timeout_ms: u64) -> Self {
        self.progress_timeout_ms = timeout_ms;
        self
    }

    /// Progress update timeout
    #[inline]
    #[must_use]
    pub fn progress_timeout(&self) -> Duration {
        Duration::from_millis(self.progress_timeout_ms)
    }

    /// Backoff before the given retry (1-based)
    #[inline]
    #[must_use]
    pub fn retry_backoff(&self, retry: u32) -> Duration {
        Duration::from_millis(self.llm_retry_backoff_ms.saturating_mul(u64::from(retry)))
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_validation_attempts: 3,
            validation_policy: ValidationPolicy::StructuralGate,
            quality_review_max_chars: 100_000,
            max_discovery_iterations: 8,
            sample_row_limit: 5,
            llm_retry_limit: 2,
            llm_retry_backoff_ms: 500,
            spec_prompt_max_chars: 40_000,
            max_error_issues: 3,
            progress_timeout_ms: 2_000,
        }
    }
}

/// OpenAI-compatible chat completion endpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API base URL (without `/chat/completions`)
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion token cap
    pub max_tokens: Option<u32>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl LlmConfig {
    /// Request timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.1,
            max_tokens: Some(16_000),
            timeout_secs: 180,
        }
    }
}
