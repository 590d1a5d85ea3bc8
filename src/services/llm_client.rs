use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::{ChatMessage, ModelInfo};

pub const APP_TITLE: &str = "Document Chat Assistant";

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("provider API key is not configured")]
    MissingApiKey,

    #[error("provider request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(reqwest::Error),

    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("could not decode provider response: {0}")]
    Decode(String),

    #[error("provider returned no choices")]
    EmptyResponse,
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Transport(err)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletion {
    pub content: String,
    pub model: String,
    pub finish_reason: Option<String>,
}

/// A hosted chat-completion provider.
#[async_trait]
pub trait ChatCompletionClient: Send + Sync {
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<ChatCompletion, LlmError>;

    async fn list_models(&self) -> Result<Vec<ModelInfo>, LlmError>;

    fn is_configured(&self) -> bool;
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    model: Option<String>,
    error: Option<ApiErrorBody>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ModelsEnvelope {
    #[serde(default)]
    data: Vec<RemoteModel>,
}

#[derive(Deserialize)]
struct RemoteModel {
    id: String,
    name: Option<String>,
    #[serde(default)]
    context_length: u64,
    pricing: Option<RemotePricing>,
}

#[derive(Deserialize)]
struct RemotePricing {
    prompt: Option<Value>,
}

impl RemoteModel {
    fn is_free(&self) -> bool {
        let prompt = self.pricing.as_ref().and_then(|p| p.prompt.as_ref());
        match prompt {
            Some(Value::String(s)) => s.trim().parse::<f64>().map(|p| p == 0.0).unwrap_or(false),
            Some(Value::Number(n)) => n.as_f64() == Some(0.0),
            _ => false,
        }
    }
}

/// OpenRouter-compatible client. Single attempt per call; no retries.
pub struct OpenRouterClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    referer: String,
}

impl OpenRouterClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            referer: "http://localhost:5000".to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        Ok(Self::new(
            config.openrouter_base_url.clone(),
            config.openrouter_api_key.clone(),
            Duration::from_secs(config.request_timeout_seconds),
        )?
        .with_referer(config.app_referer.clone()))
    }

    pub fn with_referer(mut self, referer: String) -> Self {
        self.referer = referer;
        self
    }

    fn with_headers(&self, builder: RequestBuilder, api_key: &str) -> RequestBuilder {
        builder
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", APP_TITLE)
    }
}

/// Pulls `error.message` out of a provider error body, falling back to the raw text.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("HTTP {}", status.as_u16())
            } else {
                trimmed.chars().take(500).collect()
            }
        })
}

#[async_trait]
impl ChatCompletionClient for OpenRouterClient {
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<ChatCompletion, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %request.model, messages = request.messages.len(), "Sending chat completion request");

        let response = self
            .with_headers(self.client.post(&url), api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = error_message(status, &body);
            warn!(status = status.as_u16(), error = %message, "Provider rejected chat completion");
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: CompletionResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::Decode(e.to_string()))?;

        if let Some(error) = parsed.error {
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: error.message.unwrap_or_else(|| "unknown provider error".to_string()),
            });
        }

        let choice = parsed.choices.into_iter().next().ok_or(LlmError::EmptyResponse)?;

        Ok(ChatCompletion {
            content: choice.message.content.unwrap_or_default().trim().to_string(),
            model: parsed.model.unwrap_or_else(|| request.model.clone()),
            finish_reason: choice.finish_reason,
        })
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, LlmError> {
        let url = format!("{}/models", self.base_url);
        let builder = match self.api_key.as_deref() {
            Some(key) => self.with_headers(self.client.get(&url), key),
            None => self.client.get(&url),
        };

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        let envelope: ModelsEnvelope = response
            .json()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))?;

        let mut free: Vec<RemoteModel> = envelope.data.into_iter().filter(RemoteModel::is_free).collect();
        free.sort_by(|a, b| b.context_length.cmp(&a.context_length));

        info!(count = free.len(), "Fetched free models from provider");

        Ok(free
            .into_iter()
            .map(|m| {
                let name = m.name.unwrap_or_else(|| m.id.clone());
                let label = format!("{} [{}k]", name, m.context_length / 1000);
                ModelInfo::new(m.id, label)
            })
            .collect())
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_structured_body() {
        let body = r#"{"error": {"message": "Invalid API key", "code": 401}}"#;
        assert_eq!(error_message(StatusCode::UNAUTHORIZED, body), "Invalid API key");
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, "upstream down"), "upstream down");
        assert_eq!(error_message(StatusCode::TOO_MANY_REQUESTS, ""), "HTTP 429");
    }

    #[test]
    fn free_detection_handles_string_and_number_prices() {
        let parse = |v: Value| serde_json::from_value::<RemoteModel>(v).unwrap();
        assert!(parse(serde_json::json!({"id": "a", "pricing": {"prompt": "0"}})).is_free());
        assert!(parse(serde_json::json!({"id": "b", "pricing": {"prompt": 0}})).is_free());
        assert!(!parse(serde_json::json!({"id": "c", "pricing": {"prompt": "0.000002"}})).is_free());
        assert!(!parse(serde_json::json!({"id": "d"})).is_free());
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_network() {
        let client = OpenRouterClient::new("http://127.0.0.1:9", None, Duration::from_secs(1)).unwrap();
        let request = ChatCompletionRequest {
            model: "m".to_string(),
            messages: vec![ChatMessage::user("hi")],
            temperature: 0.3,
            max_tokens: 10,
        };
        assert!(matches!(client.complete(&request).await, Err(LlmError::MissingApiKey)));
        assert!(!client.is_configured());
    }
}
