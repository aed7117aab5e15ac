//! Generation Provider
//!
//! The generation backend is an opaque capability behind [`GenerationProvider`].
//! [`OllamaClient`] talks to a local Ollama server; hosts and tests can plug in
//! any other implementation.

use crate::config::SynapseConfig;
use crate::error::SynapseError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// One generation call: user prompt, rendered system prompt, optional chat history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system_prompt: String,
    pub history: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: system_prompt.into(),
            history: None,
        }
    }

    pub fn with_history(mut self, history: impl Into<String>) -> Self {
        let history = history.into();
        self.history = (!history.trim().is_empty()).then_some(history);
        self
    }

    /// Prompt text sent to backends without a native history field.
    pub fn full_prompt(&self) -> String {
        match &self.history {
            Some(history) => format!(
                "Chat history:\n{}\n\nCurrent message: {}",
                history, self.prompt
            ),
            None => self.prompt.clone(),
        }
    }
}

/// Generation backend.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Health check. No side effects.
    async fn is_available(&self) -> bool;

    /// Generate a response; the returned text is trimmed.
    /// Fails with `Transport` when the backend is unreachable or answers non-2xx.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, SynapseError>;

    /// Best-effort model listing; empty when the backend is unreachable.
    async fn list_models(&self) -> Vec<String>;

    fn model_name(&self) -> &str;
}

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const PROVIDER_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

fn build_provider_http_client() -> Result<Client, SynapseError> {
    Client::builder()
        .no_proxy()
        .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
        .timeout(PROVIDER_HTTP_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| SynapseError::Config(format!("Failed to create HTTP client: {}", e)))
}

// Helper function to map HTTP errors to transport errors
fn map_http_error(error: reqwest::Error) -> SynapseError {
    let status = error.status().map(|s| s.as_u16());
    if error.is_timeout() {
        SynapseError::transport(status, format!("Request timeout: {}", error))
    } else if error.is_connect() {
        SynapseError::transport(status, format!("Connection error: {}", error))
    } else {
        SynapseError::transport(status, format!("HTTP error: {}", error))
    }
}

/// Sampling options sent with every Ollama request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplingOptions {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            top_k: 40,
        }
    }
}

#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    system: &'a str,
    stream: bool,
    options: SamplingOptions,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
    #[allow(dead_code)]
    #[serde(default)]
    done: bool,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Deserialize)]
struct ModelInfo {
    name: String,
}

/// Ollama provider client (`/api/generate`, `/api/tags`)
pub struct OllamaClient {
    client: Client,
    model: String,
    base_url: String,
    options: SamplingOptions,
}

impl OllamaClient {
    pub fn new(model: String, base_url: &str) -> Result<Self, SynapseError> {
        let client = build_provider_http_client()?;
        Ok(Self {
            client,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            options: SamplingOptions::default(),
        })
    }

    /// Client for the endpoint and model named in the settings record.
    pub fn from_config(config: &SynapseConfig) -> Result<Self, SynapseError> {
        Self::new(config.model_name.clone(), config.endpoint())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_tags(&self) -> Result<Vec<String>, SynapseError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).send().await.map_err(map_http_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(SynapseError::transport(
                Some(status.as_u16()),
                format!("Failed to fetch models: {}", status),
            ));
        }
        let tags: TagsResponse = response.json().await.map_err(|e| {
            SynapseError::transport(None, format!("Failed to parse models response: {}", e))
        })?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait]
impl GenerationProvider for OllamaClient {
    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(endpoint = %self.base_url, error = %e, "Generation backend unreachable");
                false
            }
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, SynapseError> {
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt: request.full_prompt(),
            system: &request.system_prompt,
            stream: false,
            options: self.options,
        };

        let url = format!("{}/api/generate", self.base_url);
        debug!(model = %self.model, prompt_len = body.prompt.len(), "Sending generation request");
        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(map_http_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SynapseError::transport(
                Some(status.as_u16()),
                format!("Ollama API error: {} {}", status.as_u16(), error_text.trim()),
            ));
        }

        let data: OllamaGenerateResponse = response.json().await.map_err(|e| {
            SynapseError::transport(None, format!("Failed to parse response: {}", e))
        })?;
        Ok(data.response.trim().to_string())
    }

    async fn list_models(&self) -> Vec<String> {
        match self.fetch_tags().await {
            Ok(models) => models,
            Err(e) => {
                warn!(endpoint = %self.base_url, error = %e, "Error fetching models");
                Vec::new()
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// Mock provider for testing
#[cfg(test)]
pub struct MockProvider {
    responses: parking_lot::Mutex<std::collections::VecDeque<Result<String, SynapseError>>>,
    pub requests: parking_lot::Mutex<Vec<GenerationRequest>>,
}

#[cfg(test)]
impl MockProvider {
    pub fn new(responses: Vec<Result<String, SynapseError>>) -> Self {
        Self {
            responses: parking_lot::Mutex::new(responses.into()),
            requests: parking_lot::Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }
}

#[cfg(test)]
#[async_trait]
impl GenerationProvider for MockProvider {
    async fn is_available(&self) -> bool {
        true
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, SynapseError> {
        self.requests.lock().push(request.clone());
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok("Mock response".to_string()))
            .map(|text| text.trim().to_string())
    }

    async fn list_models(&self) -> Vec<String> {
        vec!["mock".to_string()]
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
