//! HTTP client for the Anthropic Messages and OpenAI Chat Completions APIs.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, info};

use osint_core::config::{Provider, ReasoningConfig};
use osint_core::gateway::{CompletionRequest, ReasoningGateway};

use crate::error::ReasoningError;

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// What a gateway is configured to talk to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub provider: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl From<&ReasoningConfig> for ModelInfo {
    fn from(config: &ReasoningConfig) -> Self {
        Self {
            provider: config.provider.to_string(),
            model: config.model().to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReasoningClient {
    http: reqwest::Client,
    provider: Provider,
    model: String,
    api_key: String,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
}

impl ReasoningClient {
    pub fn new(config: &ReasoningConfig, api_key: impl Into<String>) -> Result<Self, ReasoningError> {
        let default_base = match config.provider {
            Provider::Anthropic => ANTHROPIC_BASE_URL,
            Provider::OpenAi => OPENAI_BASE_URL,
            Provider::Offline => {
                return Err(ReasoningError::UnsupportedProvider(config.provider.to_string()))
            }
        };
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(default_base)
            .trim_end_matches('/')
            .to_string();
        info!(provider = %config.provider, model = %config.model(), "reasoning client initialised");
        Ok(Self {
            http,
            provider: config.provider,
            model: config.model().to_string(),
            api_key: api_key.into(),
            base_url,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    /// Build from the API key held in the configured environment variable.
    pub fn from_env(config: &ReasoningConfig) -> Result<Self, ReasoningError> {
        let var = config.api_key_env();
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Self::new(config, key),
            _ => Err(ReasoningError::MissingApiKey(var.to_string())),
        }
    }

    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: self.provider.to_string(),
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    async fn send(&self, request: CompletionRequest) -> Result<String, ReasoningError> {
        let temperature = request.temperature.unwrap_or(self.temperature);
        let max_tokens = request.max_tokens.unwrap_or(self.max_tokens);
        debug!(
            provider = %self.provider,
            prompt_len = request.prompt.len(),
            json_mode = request.json_mode,
            "completion request"
        );
        match self.provider {
            Provider::Anthropic => self.complete_anthropic(request, temperature, max_tokens).await,
            Provider::OpenAi => self.complete_openai(request, temperature, max_tokens).await,
            Provider::Offline => Err(ReasoningError::UnsupportedProvider(self.provider.to_string())),
        }
    }

    async fn complete_anthropic(
        &self,
        request: CompletionRequest,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, ReasoningError> {
        let mut body = json!({
            "model": self.model,
            "max_tokens": max_tokens,
            "temperature": temperature,
            "messages": [{"role": "user", "content": request.prompt}],
        });
        if let Some(system) = request.system_prompt {
            body["system"] = Value::String(system);
        }
        let resp = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;
        let parsed: AnthropicResponse = self.checked(resp).await?.json().await?;
        parsed
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| ReasoningError::EmptyResponse(self.provider.to_string()))
    }

    async fn complete_openai(
        &self,
        request: CompletionRequest,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, ReasoningError> {
        let mut messages = Vec::new();
        if let Some(system) = request.system_prompt {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": request.prompt}));
        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
        });
        if request.json_mode {
            body["response_format"] = json!({"type": "json_object"});
        }
        let resp = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let parsed: OpenAiResponse = self.checked(resp).await?.json().await?;
        parsed
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or_else(|| ReasoningError::EmptyResponse(self.provider.to_string()))
    }

    async fn checked(&self, resp: reqwest::Response) -> Result<reqwest::Response, ReasoningError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ReasoningError::Status {
            provider: self.provider.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ReasoningGateway for ReasoningClient {
    async fn complete(&self, request: CompletionRequest) -> osint_core::Result<String> {
        self.send(request).await.map_err(|e| {
            error!(provider = %self.provider, error = %e, "completion failed");
            e.into()
        })
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use osint_core::OsintError;

    fn config(provider: Provider, base_url: String) -> ReasoningConfig {
        ReasoningConfig {
            provider,
            base_url: Some(base_url),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn anthropic_messages_round_trip() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "test-key")
            .match_header("anthropic-version", ANTHROPIC_VERSION)
            .match_body(Matcher::PartialJson(json!({
                "model": "claude-3-opus-20240229",
                "system": "be brief",
                "max_tokens": 100,
            })))
            .with_header("content-type", "application/json")
            .with_body(r#"{"content":[{"type":"text","text":"hello"}]}"#)
            .create_async()
            .await;

        let client = ReasoningClient::new(&config(Provider::Anthropic, server.url()), "test-key").unwrap();
        let text = client
            .complete(CompletionRequest::new("hi").system("be brief").max_tokens(100))
            .await
            .unwrap();
        assert_eq!(text, "hello");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn openai_json_mode_sets_response_format() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-4-turbo-preview",
                "response_format": {"type": "json_object"},
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "go"}
                ],
            })))
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"{\"ok\":true}"}}]}"#)
            .create_async()
            .await;

        let client = ReasoningClient::new(&config(Provider::OpenAi, server.url()), "sk-test").unwrap();
        let text = client
            .complete(CompletionRequest::new("go").system("sys").json())
            .await
            .unwrap();
        assert_eq!(text, r#"{"ok":true}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_status_becomes_gateway_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(529)
            .with_body("overloaded")
            .create_async()
            .await;

        let client = ReasoningClient::new(&config(Provider::Anthropic, server.url()), "k").unwrap();
        let err = client.complete(CompletionRequest::new("hi")).await.unwrap_err();
        match err {
            OsintError::Gateway(msg) => {
                assert!(msg.contains("529"));
                assert!(msg.contains("overloaded"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_content_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_body(r#"{"content":[]}"#)
            .create_async()
            .await;

        let client = ReasoningClient::new(&config(Provider::Anthropic, server.url()), "k").unwrap();
        assert!(client.complete(CompletionRequest::new("hi")).await.is_err());
    }

    #[test]
    fn offline_provider_has_no_client() {
        let cfg = ReasoningConfig {
            provider: Provider::Offline,
            ..Default::default()
        };
        assert!(matches!(
            ReasoningClient::new(&cfg, "k"),
            Err(ReasoningError::UnsupportedProvider(_))
        ));
    }

    #[test]
    fn model_info_reflects_config() {
        let cfg = ReasoningConfig {
            provider: Provider::OpenAi,
            temperature: 0.2,
            ..Default::default()
        };
        let client = ReasoningClient::new(&cfg, "k").unwrap();
        let info = client.model_info();
        assert_eq!(info.provider, "openai");
        assert_eq!(info.model, "gpt-4-turbo-preview");
        assert_eq!(info, ModelInfo::from(&cfg));
    }
}
