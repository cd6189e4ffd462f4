//! Mock LLM provider with deterministic completions.
//!
//! Completions are a pure function of the request, so identical prompts
//! always yield identical answers. Useful for tests and offline runs where
//! no model runtime is available.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use parley_core::AppResult;
use std::time::Duration;

/// Deterministic mock completion client.
pub struct MockClient {
    /// Optional artificial latency per call, for timeout and ordering tests
    latency: Option<Duration>,
}

impl MockClient {
    /// Create a mock client that answers immediately.
    pub fn new() -> Self {
        Self { latency: None }
    }

    /// Create a mock client that sleeps before answering.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
        }
    }

    /// Produce the deterministic completion for a request.
    ///
    /// The mock echoes the prompt back under a short preamble, so answers
    /// reflect whatever context the pipeline supplied without requiring a
    /// real model.
    fn synthesize(&self, request: &LlmRequest) -> String {
        format!(
            "[{} completion]\n{}",
            request.model,
            request.prompt.trim()
        )
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmClient for MockClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let content = self.synthesize(request);
        let prompt_tokens = request.prompt.split_whitespace().count() as u32;
        let completion_tokens = content.split_whitespace().count() as u32;

        tracing::debug!("Mock completion for model '{}'", request.model);

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::new(prompt_tokens, completion_tokens),
            done: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_completion_is_deterministic() {
        let client = MockClient::new();
        let request = LlmRequest::new("What is the Q1 revenue?", "mock-1");

        let first = client.complete(&request).await.unwrap();
        let second = client.complete(&request).await.unwrap();

        assert_eq!(first.content, second.content);
        assert!(first.done);
    }

    #[tokio::test]
    async fn test_mock_completion_reflects_prompt() {
        let client = MockClient::new();
        let request = LlmRequest::new("Context: revenue was 2.1 million", "mock-1");

        let response = client.complete(&request).await.unwrap();
        assert!(response.content.contains("revenue was 2.1 million"));
    }

    #[tokio::test]
    async fn test_mock_latency_is_applied() {
        let client = MockClient::with_latency(Duration::from_millis(20));
        let request = LlmRequest::new("hello", "mock-1");

        let start = std::time::Instant::now();
        client.complete(&request).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
