//! OpenAI-compatible chat-completions oracle
//!
//! Works against any server exposing `POST {base_url}/chat/completions`
//! (OpenAI, vLLM, Ollama, LocalAI, ...).

use crate::error::OracleError;
use crate::instruction::{strip_code_fences, SYSTEM_MESSAGE};
use crate::oracle::Oracle;
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub model: String,
    /// Bearer token; usually supplied through `OPENAI_API_KEY`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4-turbo-preview".to_string(),
            api_key: None,
            temperature: 0.7,
            timeout_secs: 120,
        }
    }
}

impl OpenAiConfig {
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageResponse,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Option<String>,
}

/// Oracle backed by an OpenAI-compatible HTTP API
#[derive(Debug, Clone)]
pub struct OpenAiOracle {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiOracle {
    /// Build the HTTP client
    ///
    /// # Errors
    /// [`OracleError::NotConfigured`] when the base URL is empty or the client
    /// cannot be constructed
    pub fn new(config: OpenAiConfig) -> Result<Self, OracleError> {
        if config.base_url.trim().is_empty() {
            return Err(OracleError::NotConfigured("base_url is empty".into()));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OracleError::NotConfigured(format!("http client: {e}")))?;

        Ok(Self { client, config })
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn request_body<'a>(&'a self, instruction: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_MESSAGE,
                },
                ChatMessage {
                    role: "user",
                    content: instruction,
                },
            ],
            temperature: self.config.temperature,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        }
    }
}

#[async_trait]
impl Oracle for OpenAiOracle {
    fn id(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, instruction: &str) -> Result<String, OracleError> {
        let mut request = self
            .client
            .post(self.chat_completions_url())
            .json(&self.request_body(instruction));

        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        debug!(model = %self.config.model, chars = instruction.len(), "calling oracle");

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                OracleError::Timeout {
                    secs: self.config.timeout_secs,
                }
            } else {
                OracleError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "oracle request failed");
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(OracleError::RateLimited);
            }
            return Err(OracleError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Parse(e.to_string()))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(OracleError::Empty)?;

        let content = strip_code_fences(&content);
        if content.is_empty() {
            return Err(OracleError::Empty);
        }
        Ok(content.to_string())
    }
}
