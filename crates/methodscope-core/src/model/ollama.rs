//! Ollama `/api/generate` client.
//!
//! Decoding is pinned for reproducibility: temperature 0, a fixed seed and a
//! fixed context window. The settings are sent both at the top level of the
//! request body and inside Ollama's `options` object.

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::{ModelCallError, ModelClient};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.1:8b";
pub const DEFAULT_NUM_CTX: u32 = 32_768;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Connection and decoding settings for [`OllamaClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    /// Base URL, e.g. `http://localhost:11434`.
    pub endpoint: String,
    pub model: String,
    pub num_ctx: u32,
    pub seed: u64,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            num_ctx: DEFAULT_NUM_CTX,
            seed: DEFAULT_SEED,
            temperature: 0.0,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_ctx: u32,
    seed: u64,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    temperature: f32,
    num_ctx: u32,
    seed: u64,
    options: GenerateOptions,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

pub struct OllamaClient {
    settings: ModelSettings,
    http: reqwest::Client,
}

impl OllamaClient {
    pub fn new(settings: ModelSettings) -> Result<Self, ModelCallError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| ModelCallError::Transport(e.to_string()))?;
        Ok(Self { settings, http })
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.endpoint.trim_end_matches('/'), path)
    }

    /// Check that the server answers on `/api/tags`.
    pub async fn health_check(&self) -> Result<(), ModelCallError> {
        let resp = self
            .http
            .get(self.url("/api/tags"))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| ModelCallError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ModelCallError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn generate_inner(&self, prompt: &str) -> Result<String, ModelCallError> {
        let s = &self.settings;
        let request = GenerateRequest {
            model: &s.model,
            prompt,
            stream: false,
            temperature: s.temperature,
            num_ctx: s.num_ctx,
            seed: s.seed,
            options: GenerateOptions {
                temperature: s.temperature,
                num_ctx: s.num_ctx,
                seed: s.seed,
            },
        };

        tracing::debug!(model = %s.model, prompt_chars = prompt.len(), "sending generate request");
        let start = Instant::now();

        let resp = self
            .http
            .post(self.url("/api/generate"))
            .json(&request)
            .send()
            .await
            .map_err(|e| ModelCallError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ModelCallError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| ModelCallError::Decode(e.to_string()))?;

        tracing::debug!(
            model = %s.model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            response_chars = data.response.len(),
            "generate request complete"
        );
        Ok(data.response)
    }
}

impl ModelClient for OllamaClient {
    fn model_name(&self) -> &str {
        &self.settings.model
    }

    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, ModelCallError>> + Send + 'a>> {
        Box::pin(self.generate_inner(prompt))
    }
}

impl std::fmt::Debug for OllamaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaClient")
            .field("settings", &self.settings)
            .finish()
    }
}
