//! Client for a local Ollama runtime.
//!
//! Only two endpoints are used: `/api/tags` as a capability probe and
//! `/api/generate` for non-streaming completions.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::types::{GeneratePayload, GenerateResponse, ModelInfo, TagsResponse};
use crate::{build_http, trim_base_url, ClientError};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.2:3b";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            top_p: 0.9,
            top_k: 40,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub probe_timeout: Duration,
    pub options: GenerationOptions,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(5),
            options: GenerationOptions::default(),
        }
    }
}

#[derive(Debug)]
pub struct OllamaClient {
    http: Client,
    base_url: String,
    model: String,
    probe_timeout: Duration,
    options: GenerationOptions,
}

impl OllamaClient {
    pub fn with_config(config: OllamaConfig) -> Result<Self, ClientError> {
        Ok(Self {
            http: build_http(config.timeout)?,
            base_url: trim_base_url(&config.base_url),
            model: config.model,
            probe_timeout: config.probe_timeout,
            options: config.options,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[instrument(name = "ollama_client.list_models", skip(self))]
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, ClientError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .http
            .get(&url)
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(|err| ClientError::from_transport(&err, &url))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, url, "Ollama capability probe failed");
            return Err(ClientError::Status(status));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|err| ClientError::from_transport(&err, &url))?;
        debug!(models = tags.models.len(), "Ollama capability probe succeeded");
        Ok(tags.models)
    }

    #[instrument(name = "ollama_client.generate", skip(self, prompt), fields(model = %self.model))]
    pub async fn generate(&self, prompt: &str) -> Result<String, ClientError> {
        let url = format!("{}/api/generate", self.base_url);
        let payload = GeneratePayload {
            model: &self.model,
            prompt,
            stream: false,
            options: &self.options,
        };

        let response = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|err| ClientError::from_transport(&err, &url))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, url, "Ollama generation failed");
            return Err(ClientError::Status(status));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|err| ClientError::from_transport(&err, &url))?;
        Ok(body.response.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_match_low_temperature_profile() {
        let options = GenerationOptions::default();
        assert!((options.temperature - 0.3).abs() < f32::EPSILON);
        assert!((options.top_p - 0.9).abs() < f32::EPSILON);
        assert_eq!(options.top_k, 40);
    }

    #[test]
    fn generate_payload_disables_streaming() {
        let options = GenerationOptions::default();
        let payload = GeneratePayload {
            model: DEFAULT_MODEL,
            prompt: "classify",
            stream: false,
            options: &options,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["model"], "llama3.2:3b");
        assert_eq!(value["stream"], false);
        assert_eq!(value["options"]["top_k"], 40);
    }

    #[tokio::test]
    async fn probe_fails_when_runtime_is_down() {
        let client = OllamaClient::with_config(OllamaConfig {
            base_url: "http://127.0.0.1:9/".to_string(),
            probe_timeout: Duration::from_secs(2),
            ..OllamaConfig::default()
        })
        .unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:9");
        let error = client.list_models().await.unwrap_err();
        assert!(matches!(error, ClientError::Http(_) | ClientError::Timeout(_)));
    }
}
