use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use infohub_core::config::LlmConfig;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant in a Slack workspace. Provide clear, concise, and professional responses.";

#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub system_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_owned(),
            max_tokens: 500,
            temperature: 0.0,
        }
    }

    pub fn system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CompletionError {
    #[error("completion quota exceeded")]
    QuotaExceeded,
    #[error("completion service rate limited the request")]
    RateLimited,
    #[error("completion request timed out")]
    Timeout,
    #[error("completion service returned an empty response")]
    EmptyResponse,
    #[error("completion service error: {0}")]
    Service(String),
}

impl CompletionError {
    pub fn user_message(&self) -> String {
        match self {
            Self::QuotaExceeded => "OpenAI quota exceeded. Please check your billing.".to_owned(),
            Self::RateLimited => "Rate limit exceeded. Please try again in a moment.".to_owned(),
            Self::Timeout => "Request timed out. Please try again.".to_owned(),
            Self::EmptyResponse => "The AI service returned an empty response.".to_owned(),
            Self::Service(message) => format!("AI service error: {message}"),
        }
    }
}

#[async_trait]
pub trait TextCompletionService: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;
}

/// Whether an AI backend is configured. Absence of a credential is a state,
/// not an error; callers branch on it before building prompts.
#[derive(Clone)]
pub enum CompletionCapability {
    Available(Arc<dyn TextCompletionService>),
    Unavailable,
}

impl CompletionCapability {
    pub fn from_config(config: &LlmConfig) -> Self {
        match &config.api_key {
            Some(api_key) if config.has_credential() => {
                Self::Available(Arc::new(OpenAiCompletionService::new(
                    api_key.clone(),
                    config.base_url.clone(),
                    config.model.clone(),
                    Duration::from_secs(config.timeout_secs),
                )))
            }
            _ => {
                warn!(
                    event_name = "system.llm.unavailable",
                    correlation_id = "bootstrap",
                    "no completion credential configured; AI commands will degrade"
                );
                Self::Unavailable
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    pub fn service(&self) -> Option<&Arc<dyn TextCompletionService>> {
        match self {
            Self::Available(service) => Some(service),
            Self::Unavailable => None,
        }
    }
}

impl fmt::Debug for CompletionCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available(_) => f.write_str("CompletionCapability::Available"),
            Self::Unavailable => f.write_str("CompletionCapability::Unavailable"),
        }
    }
}

/// Chat-completions client for OpenAI and API-compatible backends.
pub struct OpenAiCompletionService {
    client: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Default, Deserialize)]
struct ApiErrorEnvelope {
    #[serde(default)]
    error: ApiErrorBody,
}

#[derive(Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

impl OpenAiCompletionService {
    pub fn new(api_key: SecretString, base_url: String, model: String, timeout: Duration) -> Self {
        let client = Client::builder().timeout(timeout).build().unwrap_or_else(|_| Client::new());
        Self { client, api_key, base_url: base_url.trim_end_matches('/').to_owned(), model }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl TextCompletionService for OpenAiCompletionService {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let body = ChatCompletionBody {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: &request.system_prompt },
                ChatMessage { role: "user", content: &request.prompt },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        debug!(
            model = %self.model,
            prompt_chars = request.prompt.chars().count(),
            max_tokens = request.max_tokens,
            "requesting chat completion"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let envelope = response.json::<ApiErrorEnvelope>().await.unwrap_or_default();
            let error = classify_status(status, envelope.error);
            warn!(status = status.as_u16(), error = %error, "chat completion failed");
            return Err(error);
        }

        let parsed = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|error| CompletionError::Service(format!("malformed response: {error}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_owned())
            .filter(|content| !content.is_empty())
            .ok_or(CompletionError::EmptyResponse)?;

        debug!(response_chars = content.chars().count(), "chat completion succeeded");
        Ok(content)
    }
}

fn classify_transport_error(error: reqwest::Error) -> CompletionError {
    if error.is_timeout() {
        CompletionError::Timeout
    } else {
        CompletionError::Service(error.to_string())
    }
}

fn classify_status(status: StatusCode, body: ApiErrorBody) -> CompletionError {
    let code = body.code.as_deref().or(body.kind.as_deref()).unwrap_or_default();
    if code == "insufficient_quota" {
        return CompletionError::QuotaExceeded;
    }
    if status == StatusCode::TOO_MANY_REQUESTS || code == "rate_limit_exceeded" {
        return CompletionError::RateLimited;
    }
    if status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::GATEWAY_TIMEOUT {
        return CompletionError::Timeout;
    }

    let message = body.message.unwrap_or_else(|| "no error detail".to_owned());
    CompletionError::Service(format!("{} {message}", status.as_u16()))
}
