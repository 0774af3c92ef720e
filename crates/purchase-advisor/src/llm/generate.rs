//! Text-generation channel.
//!
//! The pipeline only needs one capability from the language model: turn a
//! prompt into text, within a bounded wait. A timeout is reported as
//! `Ok(None)`, an explicit "no response" the caller must handle; transport
//! and API failures are real errors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::llm::settings::LlmSettings;

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text from a prompt. `Ok(None)` means the model produced no
    /// output within the configured bound.
    async fn generate(&self, prompt: &str) -> CoreResult<Option<String>>;
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
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

/// OpenAI-compatible chat-completions client.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    settings: LlmSettings,
}

impl OpenAiGenerator {
    pub fn new(settings: LlmSettings) -> CoreResult<Self> {
        if settings.api_key.is_none() {
            return Err(CoreError::InvalidInput("missing LLM API key".to_string()));
        }
        let client = reqwest::Client::builder()
            .build()
            .map_err(|error| CoreError::Internal(format!("http client: {error}")))?;
        Ok(Self { client, settings })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, prompt: &str) -> CoreResult<Option<String>> {
        let body = ChatCompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.to_string(),
            }],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_output_tokens,
        };
        let api_key = self.settings.api_key.as_deref().unwrap_or_default();

        let request = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key)
            .json(&body)
            .send();

        let response = match tokio::time::timeout(self.settings.timeout, request).await {
            Ok(Ok(response)) => response,
            Ok(Err(error)) => {
                return Err(CoreError::Llm(format!("request failed: {error}")));
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.settings.timeout.as_secs(),
                    "llm request timed out"
                );
                return Ok(None);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CoreError::Llm(format!("status {status}: {text}")));
        }

        let decoded: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|error| CoreError::Llm(format!("bad completion payload: {error}")))?;
        Ok(decoded
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty()))
    }
}

/// Strip a markdown code fence from model output before JSON decoding.
///
/// Handles ```json-tagged fences, untagged fences, and bare text.
pub fn extract_json_block(text: &str) -> &str {
    if let Some(start) = text.find("```json") {
        let body = &text[start + "```json".len()..];
        let end = body.find("```").unwrap_or(body.len());
        return body[..end].trim();
    }
    if let Some(start) = text.find("```") {
        let body = &text[start + "```".len()..];
        let end = body.find("```").unwrap_or(body.len());
        return body[..end].trim();
    }
    text.trim()
}
