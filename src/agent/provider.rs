//! LLM provider trait and the Anthropic messages client with retry logic.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::error::{Error, Result};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

/// Seam between the pipeline steps and the model. Tests swap in a
/// scripted implementation.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a single prompt and return the model's text.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

/// Anthropic messages API request
#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: usize,
    temperature: f32,
    system: Option<String>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

/// Anthropic messages client with bounded retry
pub struct ClaudeClient {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: usize,
    temperature: f32,
    max_retries: u32,
    retry_delay_ms: u64,
}

impl ClaudeClient {
    pub fn new(api_key: String, config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            max_retries: config.max_retries,
            retry_delay_ms: config.retry_delay_ms,
        })
    }

    /// Make a single API request
    async fn make_request(&self, request: &MessagesRequest) -> Result<String> {
        let response = self
            .client
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| Error::External(format!("API request failed: {e}")))?;

        match response.status() {
            StatusCode::OK => {
                let api_response: ApiResponse = response
                    .json()
                    .await
                    .map_err(|e| Error::External(format!("Failed to parse response: {e}")))?;

                debug!(
                    "Model {} used {} input / {} output tokens",
                    api_response.model,
                    api_response.usage.input_tokens,
                    api_response.usage.output_tokens
                );

                Ok(api_response
                    .content
                    .first()
                    .map(|c| c.text.clone())
                    .unwrap_or_default())
            }
            StatusCode::TOO_MANY_REQUESTS => {
                Err(Error::External("Rate limit exceeded".to_string()))
            }
            StatusCode::UNAUTHORIZED => Err(Error::Config("Invalid API key".to_string())),
            status => {
                let error_text = response.text().await.unwrap_or_default();
                Err(Error::External(format!("API error {status}: {error_text}")))
            }
        }
    }

    fn is_retryable_error(&self, error: &Error) -> bool {
        match error {
            Error::External(msg) => {
                msg.contains("Rate limit") || msg.contains("timeout") || msg.contains("connection")
            }
            _ => false,
        }
    }

    fn calculate_backoff(&self, retry_count: u32) -> u64 {
        self.retry_delay_ms * 2u64.pow(retry_count - 1)
    }
}

#[async_trait]
impl LlmProvider for ClaudeClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let request = MessagesRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: Some(system.to_string()),
        };

        let mut retry_count = 0;
        loop {
            match self.make_request(&request).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    if retry_count >= self.max_retries || !self.is_retryable_error(&e) {
                        return Err(e);
                    }

                    retry_count += 1;
                    let delay = self.calculate_backoff(retry_count);
                    warn!("Retrying model call in {delay}ms ({retry_count}/{}): {e}", self.max_retries);
                    sleep(Duration::from_millis(delay)).await;
                }
            }
        }
    }
}

// Internal API response structures
#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<Content>,
    model: String,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct Content {
    text: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: usize,
    output_tokens: usize,
}
