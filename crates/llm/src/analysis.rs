//! The analysis boundary: recent readings in, structured interpretation out.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use vitasense_core::config::{LlmConfig, OllamaConfig};
use vitasense_core::{AnalysisResult, HeartRateScenario, Reading, Signal, TemperatureScenario};

use crate::prompt::{analysis_schema, build_prompt, extract_json, SYSTEM_PROMPT};
use crate::provider::{CompletionOptions, LlmError, LlmProvider, Message};

/// One analysis request: chronological windows of both signals plus the
/// scenarios that produced them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub temperature: Vec<Reading>,
    pub heart_rate: Vec<Reading>,
    pub temperature_scenario: TemperatureScenario,
    pub heart_rate_scenario: HeartRateScenario,
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
    #[error("no {0} readings to analyze")]
    EmptyWindow(Signal),
    #[error("invalid analysis response: {reason}")]
    InvalidResponse {
        reason: String,
        raw_response: String,
    },
    #[error("analysis timed out after {0:?}")]
    Timeout(Duration),
    #[error("analysis not configured: {0}")]
    NotConfigured(String),
}

/// Opaque remote interpretation of recent readings. One call per trigger
/// firing; implementations must not retry.
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError>;
}

/// [`AnalysisClient`] backed by a chat-completion [`LlmProvider`].
pub struct LlmAnalysisClient {
    provider: Box<dyn LlmProvider>,
    temperature: f32,
    max_tokens: u32,
}

impl LlmAnalysisClient {
    pub fn new(provider: Box<dyn LlmProvider>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            provider,
            temperature,
            max_tokens,
        }
    }

    /// Build from config, creating the appropriate provider.
    pub fn from_config(
        llm_config: &LlmConfig,
        ollama_config: &OllamaConfig,
    ) -> Result<Self, LlmError> {
        let provider = crate::providers::create_provider(llm_config, ollama_config)?;
        Ok(Self::new(provider, llm_config.temperature, llm_config.max_tokens))
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }
}

#[async_trait]
impl AnalysisClient for LlmAnalysisClient {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        if request.temperature.is_empty() {
            return Err(AnalysisError::EmptyWindow(Signal::Temperature));
        }
        if request.heart_rate.is_empty() {
            return Err(AnalysisError::EmptyWindow(Signal::HeartRate));
        }

        let messages = vec![Message::system(SYSTEM_PROMPT), Message::user(build_prompt(request))];
        let options = CompletionOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            json_schema: Some(analysis_schema()),
        };

        info!(
            provider = self.provider.name(),
            temperature_readings = request.temperature.len(),
            heart_rate_readings = request.heart_rate.len(),
            "requesting health analysis"
        );

        let response = self.provider.complete(messages, &options).await?;
        debug!("LLM response: {}", response);

        parse_response(&response)
    }
}

/// Parse and shape-check a raw model response.
pub fn parse_response(response: &str) -> Result<AnalysisResult, AnalysisError> {
    let invalid = |reason: String| AnalysisError::InvalidResponse {
        reason,
        raw_response: response.to_string(),
    };

    let value: serde_json::Value =
        serde_json::from_str(extract_json(response)).map_err(|e| invalid(e.to_string()))?;
    AnalysisResult::from_value(value).map_err(|e| invalid(e.to_string()))
}

/// Stand-in used when no provider is configured; every call fails.
pub struct UnconfiguredClient {
    reason: String,
}

impl UnconfiguredClient {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

#[async_trait]
impl AnalysisClient for UnconfiguredClient {
    async fn analyze(&self, _request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        Err(AnalysisError::NotConfigured(self.reason.clone()))
    }
}
