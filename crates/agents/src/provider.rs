use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub total_tokens: u64,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to model provider failed: {0}")]
    Request(String),
    #[error("model provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model provider response had no message content")]
    MissingContent,
}

/// A chat-completion backend.
pub trait CompletionProvider: Send + Sync {
    fn model_name(&self) -> &str;
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, TransportError>;
}

/// Absent credentials are a state of their own rather than a failing provider.
pub enum ModelAccess<P> {
    Available(Arc<P>),
    NotConfigured,
}

impl<P> ModelAccess<P> {
    pub fn is_available(&self) -> bool {
        matches!(self, ModelAccess::Available(_))
    }

    pub fn provider(&self) -> Option<&P> {
        match self {
            ModelAccess::Available(provider) => Some(provider.as_ref()),
            ModelAccess::NotConfigured => None,
        }
    }
}

impl<P> Clone for ModelAccess<P> {
    fn clone(&self) -> Self {
        match self {
            ModelAccess::Available(provider) => ModelAccess::Available(Arc::clone(provider)),
            ModelAccess::NotConfigured => ModelAccess::NotConfigured,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiCompatClient {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionPayload<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiCompatClient {
    pub fn new(config: ProviderConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(6))
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build model HTTP client")?;
        Ok(Self::with_client(http, config))
    }

    pub fn with_client(http: Client, config: ProviderConfig) -> Self {
        Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key,
            model: config.model,
        }
    }
}

impl CompletionProvider for OpenAiCompatClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, TransportError> {
        let payload = ChatCompletionPayload {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_key.as_str())
            .json(&payload)
            .send()
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?;
        extract_completion(&body).ok_or(TransportError::MissingContent)
    }
}

fn extract_completion(payload: &serde_json::Value) -> Option<Completion> {
    let text = payload
        .get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?
        .as_str()?;
    let total_tokens = payload
        .get("usage")
        .and_then(|usage| usage.get("total_tokens"))
        .and_then(|value| value.as_u64())
        .unwrap_or(0);

    Some(Completion {
        text: text.to_string(),
        total_tokens,
    })
}
