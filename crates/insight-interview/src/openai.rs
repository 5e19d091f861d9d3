//! OpenAI-compatible chat completion client.
//!
//! Docs: https://platform.openai.com/docs/api-reference/chat/create

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::GenerationError;
use crate::llm::{ChatMessage, TextGenerator};

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenAiChatClient {
    config: LlmConfig,
    http: reqwest::Client,
}

impl OpenAiChatClient {
    pub fn new(config: LlmConfig) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| GenerationError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    async fn send_once(&self, messages: &[ChatMessage]) -> Result<String, GenerationError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout(self.config.timeout_seconds)
                } else {
                    GenerationError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        extract_content(body)
    }
}

fn extract_content(body: ChatResponse) -> Result<String, GenerationError> {
    let choice = body
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::MalformedResponse("response has no choices".to_string()))?;
    let text = choice.message.content.unwrap_or_default();
    let text = text.trim();
    if text.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(text.to_string())
}

#[async_trait]
impl TextGenerator for OpenAiChatClient {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String, GenerationError> {
        if !self.config.is_configured() {
            return Err(GenerationError::NotConfigured(
                "set llm.api_key in config or the INSIGHT_LLM_API_KEY environment variable"
                    .to_string(),
            ));
        }

        let mut attempt = 0;
        loop {
            tracing::debug!(
                model = %self.config.model,
                messages = messages.len(),
                attempt,
                "requesting chat completion"
            );
            match self.send_once(messages).await {
                Ok(text) => {
                    tracing::debug!(chars = text.len(), "chat completion received");
                    return Ok(text);
                }
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = Duration::from_millis(self.config.retry_backoff_ms * u64::from(attempt));
                    tracing::warn!(error = %e, attempt, ?delay, "chat completion failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "chat completion failed");
                    return Err(e);
                }
            }
        }
    }
}
