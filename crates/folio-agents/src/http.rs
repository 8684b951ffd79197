//! HTTP model gateway
//!
//! Talks to any OpenAI-compatible chat completions endpoint. The system
//! directive and the user payload map onto the `system` and `user` chat
//! messages; the completion text is `choices[0].message.content`.

use crate::gateway::{ModelGateway, ModelRequest};
use async_trait::async_trait;
use folio_core::{GatewayConfig, GatewayError};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Chat completions request body
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Chat completions response body (only the fields we read)
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatContent,
}

#[derive(Debug, Deserialize)]
struct ChatContent {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> Result<String, GatewayError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(GatewayError::EmptyResponse)
    }
}

/// OpenAI-compatible HTTP gateway
pub struct HttpGateway {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    temperature: f32,
}

impl HttpGateway {
    /// Create a gateway with an explicit key
    ///
    /// # Errors
    /// `GatewayError::Transport` if the HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
            temperature: 0.0,
        })
    }

    /// Create a gateway from config, reading the key from the environment
    ///
    /// # Errors
    /// - `GatewayError::MissingApiKey` if the configured variable is unset
    /// - `GatewayError::Transport` if the HTTP client cannot be built
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| GatewayError::MissingApiKey(config.api_key_env.clone()))?;
        Ok(Self::new(&config.endpoint, &config.model, api_key)?.with_temperature(config.temperature))
    }

    /// With sampling temperature
    #[inline]
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn body<'a>(&'a self, request: &'a ModelRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            temperature: self.temperature,
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
        }
    }
}

#[async_trait]
impl ModelGateway for HttpGateway {
    async fn complete(&self, request: &ModelRequest) -> Result<String, GatewayError> {
        tracing::debug!(
            stage = %request.stage,
            model = %self.model,
            prompt_chars = request.system.len() + request.user.len(),
            "sending chat completion"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.body(request))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| GatewayError::Transport(format!("invalid completion body: {e}")))?
            .into_text()
    }

    fn name(&self) -> &str {
        &self.model
    }
}
