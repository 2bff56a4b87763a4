//! Language model client abstraction and implementations.
//!
//! Defines the [`LlmClient`] trait and concrete implementations:
//! - **[`DisabledClient`]**: always errors; every analysis uses the static fallback.
//! - **[`OpenAiClient`]**: calls an OpenAI-compatible chat completions API.
//!
//! The analyzer makes exactly one call per analysis. There is no retry:
//! any failure here is absorbed by the fallback estimate.
//!
//! # Provider Selection
//!
//! Use [`create_client`] to instantiate the client named by `[llm].provider`:
//!
//! ```rust,no_run
//! # use clonetime::config::LlmConfig;
//! # use clonetime::llm::create_client;
//! let config = LlmConfig { provider: "disabled".into(), ..LlmConfig::default() };
//! let client = create_client(&config).unwrap();
//! assert_eq!(client.model_name(), "disabled");
//! ```

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::LlmConfig;

/// A single chat completion request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Text-in, text-out model backend.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Returns the model identifier (e.g. `"gpt-4"`).
    fn model_name(&self) -> &str;

    /// Send one chat request and return the assistant's reply text.
    async fn complete(&self, request: &ChatRequest) -> Result<String>;
}

// ============ Disabled Client ============

/// A client that always fails, so every analysis falls back to the static
/// estimate. Used when `llm.provider = "disabled"` or no API key is set.
pub struct DisabledClient;

#[async_trait]
impl LlmClient for DisabledClient {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn complete(&self, _request: &ChatRequest) -> Result<String> {
        bail!("LLM provider is disabled")
    }
}

// ============ OpenAI Client ============

/// Client for `POST {api_base}/chat/completions`.
pub struct OpenAiClient {
    client: reqwest::Client,
    model: String,
    api_base: String,
    api_key: String,
}

impl OpenAiClient {
    /// # Errors
    ///
    /// Returns an error if no API key was resolved into the config.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| anyhow!("{} environment variable not set", config.api_key_env))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            model: config.model.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("OpenAI request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("OpenAI API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        parse_chat_response(&json)
    }
}

/// Extract `choices[0].message.content` from a chat completions response.
fn parse_chat_response(json: &serde_json::Value) -> Result<String> {
    json.pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .filter(|c| !c.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("No response from OpenAI"))
}

/// Create the [`LlmClient`] named by `[llm].provider`.
///
/// | Config Value | Client |
/// |-------------|--------|
/// | `"disabled"` | [`DisabledClient`] |
/// | `"openai"` | [`OpenAiClient`], or [`DisabledClient`] if no API key is set |
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledClient)),
        "openai" => match OpenAiClient::new(config) {
            Ok(client) => Ok(Arc::new(client)),
            Err(e) => {
                tracing::warn!(error = %e, "LLM unavailable, all analyses will use the fallback estimate");
                Ok(Arc::new(DisabledClient))
            }
        },
        other => bail!("Unknown llm provider: {}", other),
    }
}
