//! Immutable analyzer configuration.
//!
//! A batch takes one snapshot (`Arc<AnalyzerConfig>`) at start; nothing in the
//! crate mutates it afterwards.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{fusion::FusionWeights, lexicon::ModifierLexicon};

/// Models offered by default for the local LLM pipeline.
pub const AVAILABLE_MODELS: &[&str] = &[
    "llama3.2:3b",
    "llama3.2:1b",
    "llama3.1:8b",
    "mistral:7b",
    "phi3:mini",
    "gemma2:2b",
];

pub const MAX_RESULT_LIMIT: u32 = 20;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("weight `{name}` must be between 0 and 100 (got {value})")]
    WeightOutOfRange { name: &'static str, value: f64 },
    #[error("search result limit must be between 1 and {MAX_RESULT_LIMIT} (got {0})")]
    ResultLimit(u32),
    #[error("country code must not be empty")]
    EmptyCountry,
    #[error("model name must not be empty")]
    EmptyModel,
    #[error("model endpoint must be an http(s) URL (got `{0}`)")]
    InvalidEndpoint(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub limit: u32,
    pub country: String,
    pub location: String,
    /// How many fetched pages feed the page signal extractor.
    pub max_pages: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            limit: 10,
            country: "US".to_string(),
            location: String::new(),
            max_pages: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub model: String,
    pub base_url: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: intent_client::ollama::DEFAULT_MODEL.to_string(),
            base_url: intent_client::ollama::DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub weights: FusionWeights,
    pub lexicon: ModifierLexicon,
    pub search: SearchSettings,
    pub llm: LlmSettings,
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in self.weights.iter() {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::WeightOutOfRange { name, value });
            }
        }
        if !(1..=MAX_RESULT_LIMIT).contains(&self.search.limit) {
            return Err(ConfigError::ResultLimit(self.search.limit));
        }
        if self.search.country.trim().is_empty() {
            return Err(ConfigError::EmptyCountry);
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel);
        }
        let endpoint = self.llm.base_url.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::InvalidEndpoint(self.llm.base_url.clone()));
        }
        Ok(())
    }

    /// Location is optional; blank means "not set".
    pub fn location(&self) -> Option<&str> {
        Some(self.search.location.trim()).filter(|location| !location.is_empty())
    }
}
