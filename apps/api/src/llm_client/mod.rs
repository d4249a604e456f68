//! LLM Client: the single point of entry for all Azure OpenAI calls in the ranker.
//!
//! ARCHITECTURAL RULE: No other module may call the chat-completions endpoint directly.
//! All LLM interactions MUST go through this module.
//!
//! One request per call: no retries and no client-side timeout.
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Text of the first choice. A missing choice or a `null` content (Azure's content
    /// filter) reads as an empty completion, which scores like any unreadable reply.
    pub fn text(&self) -> &str {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Deployment coordinates and generation parameters for one Azure OpenAI deployment.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: String,
    pub endpoint: String,
    pub deployment: String,
    pub api_version: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl LlmSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_key: config.azure_openai_api_key.clone(),
            endpoint: config.azure_openai_endpoint.clone(),
            deployment: config.azure_openai_deployment.clone(),
            api_version: config.azure_openai_api_version.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }
}

/// The single LLM client used by the scoring service.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    settings: LlmSettings,
}

impl LlmClient {
    pub fn new(settings: LlmSettings) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().build()?,
            settings,
        })
    }

    pub fn deployment(&self) -> &str {
        &self.settings.deployment
    }

    /// Sends `prompt` as a single user message and returns the raw completion text.
    pub async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let request_body = ChatRequest {
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        let response = self
            .client
            .post(self.settings.completions_url())
            .header("api-key", &self.settings.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: api_error_message(body),
            });
        }

        let chat: ChatResponse = response.json().await?;

        if let Some(usage) = &chat.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        let completion = chat.text();
        if completion.trim().is_empty() {
            warn!("LLM returned an empty completion");
        }
        Ok(completion.to_string())
    }
}

/// Pulls `error.message` out of an Azure error body, falling back to the raw body.
fn api_error_message(body: String) -> String {
    serde_json::from_str::<ApiError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::test_support::stub_deployment;

    fn settings(endpoint: &str) -> LlmSettings {
        LlmSettings {
            api_key: "key".to_string(),
            endpoint: endpoint.to_string(),
            deployment: "gpt-4o".to_string(),
            api_version: "2024-02-01".to_string(),
            temperature: 0.3,
            max_tokens: 500,
        }
    }

    #[test]
    fn test_completions_url_trims_trailing_slash() {
        let url = settings("https://example.openai.azure.com/").completions_url();
        assert_eq!(
            url,
            "https://example.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-02-01"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = ChatRequest {
            messages: vec![ChatMessage {
                role: "user",
                content: "hello",
            }],
            temperature: 0.3,
            max_tokens: 500,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hello");
        assert_eq!(value["max_tokens"], 500);
    }

    #[test]
    fn test_response_text_takes_first_choice() {
        let chat: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Score: 80/100"}}],
                "usage":{"prompt_tokens":10,"completion_tokens":5,"total_tokens":15}}"#,
        )
        .unwrap();
        assert_eq!(chat.text(), "Score: 80/100");
    }

    #[test]
    fn test_response_text_missing_content_is_empty() {
        let chat: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":null},"finish_reason":"content_filter"}]}"#,
        )
        .unwrap();
        assert_eq!(chat.text(), "");

        let chat: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(chat.text(), "");
    }

    #[test]
    fn test_response_text_whitespace_is_kept_raw() {
        let chat: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"  "}}]}"#).unwrap();
        assert_eq!(chat.text(), "  ");
    }

    #[test]
    fn test_api_error_message_parsed() {
        let body = r#"{"error":{"code":"429","message":"Rate limit reached"}}"#.to_string();
        assert_eq!(api_error_message(body), "Rate limit reached");
    }

    #[test]
    fn test_api_error_message_falls_back_to_body() {
        assert_eq!(api_error_message("gateway down".to_string()), "gateway down");
    }

    #[tokio::test]
    async fn test_complete_filtered_reply_is_empty_completion() {
        let endpoint = stub_deployment(serde_json::json!({
            "choices": [{"message": {"content": null}, "finish_reason": "content_filter"}]
        }))
        .await;
        let client = LlmClient::new(settings(&endpoint)).unwrap();

        assert_eq!(client.complete("prompt").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_complete_returns_raw_text() {
        let endpoint = stub_deployment(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "Score: 77/100\nJustification: ok."}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 6}
        }))
        .await;
        let client = LlmClient::new(settings(&endpoint)).unwrap();

        assert_eq!(
            client.complete("prompt").await.unwrap(),
            "Score: 77/100\nJustification: ok."
        );
    }
}
