//! Summarization gateway
//!
//! Thin client for an OpenAI-compatible chat completions endpoint. The
//! gateway only moves text; prompt construction and error rendering live in
//! [`crate::services::summary`].

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::GatewaySettings;
use crate::error::{QualityError, Result};

/// Sends one system + user prompt pair and returns the completion text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SummarizationGateway: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Configuration for the chat completions gateway
#[derive(Debug)]
pub struct LlmConfig {
    /// API key; `None` fails every call with a missing-credential error
    pub api_key: Option<SecretString>,

    pub organization: Option<String>,
    pub project: Option<String>,

    /// Base URL without trailing slash, e.g. `https://api.openai.com/v1`
    pub base_url: String,

    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl LlmConfig {
    pub fn from_settings(
        settings: &GatewaySettings,
        api_key: Option<SecretString>,
        organization: Option<String>,
        project: Option<String>,
    ) -> Self {
        Self {
            api_key,
            organization,
            project,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            timeout: Duration::from_secs(settings.timeout_seconds),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self::from_settings(&GatewaySettings::default(), None, None, None)
    }
}

/// Chat completions request body
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

/// Chat completions response body
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Gateway backed by `POST {base_url}/chat/completions`
pub struct ChatCompletionsGateway {
    config: LlmConfig,
    client: reqwest::Client,
}

impl ChatCompletionsGateway {
    /// Build the gateway; a missing API key is only reported when called
    pub fn new(config: LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client ({}); using per-request timeout", e);
                reqwest::Client::new()
            });

        Self { config, client }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    pub fn has_credentials(&self) -> bool {
        self.config.api_key.is_some()
    }
}

#[async_trait]
impl SummarizationGateway for ChatCompletionsGateway {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| QualityError::Gateway("missing credential OPENAI_API_KEY".to_string()))?;

        debug!("Calling chat completions, model {}", self.config.model);

        let request = ChatRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            messages: vec![
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
        };

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(api_key.expose_secret())
            .timeout(self.config.timeout)
            .json(&request);

        if let Some(org) = &self.config.organization {
            builder = builder.header("OpenAI-Organization", org);
        }
        if let Some(project) = &self.config.project {
            builder = builder.header("OpenAI-Project", project);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                QualityError::Gateway(format!(
                    "request timed out after {}s",
                    self.config.timeout.as_secs()
                ))
            } else {
                QualityError::Gateway(format!("request failed: {}", e))
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(QualityError::Gateway(format!(
                "API request failed with status {}: {}",
                status, error_text
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| QualityError::Gateway(format!("Failed to parse response: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| QualityError::Gateway("Empty response from API".to_string()))
    }
}
