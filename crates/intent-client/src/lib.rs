pub mod firecrawl;
pub mod ollama;
pub mod types;

pub use firecrawl::{FirecrawlClient, FirecrawlConfig};
pub use ollama::{GenerationOptions, OllamaClient, OllamaConfig};
pub use types::{ModelInfo, ResultItem, SearchRequest};

use reqwest::StatusCode;
use thiserror::Error;

const USER_AGENT: &str = "SearchIntentAnalyzer/1.0";

#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("FIRECRAWL_API_KEY not set")]
    MissingApiKey,
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("request to {0} timed out")]
    Timeout(String),
    #[error("unexpected status code: {0}")]
    Status(StatusCode),
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Configuration problems block a whole batch; everything else is per-request.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingApiKey)
    }

    fn from_transport(error: &reqwest::Error, url: &str) -> Self {
        if error.is_timeout() {
            Self::Timeout(url.to_string())
        } else if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Http(error.to_string())
        }
    }
}

fn build_http(timeout: std::time::Duration) -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .gzip(true)
        .build()
        .map_err(|err| ClientError::Http(format!("failed to build reqwest client: {err}")))
}

fn trim_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_missing_key_is_a_configuration_error() {
        assert!(ClientError::MissingApiKey.is_configuration());
        assert!(!ClientError::Timeout("http://localhost".into()).is_configuration());
        assert!(!ClientError::Status(StatusCode::UNAUTHORIZED).is_configuration());
    }

    #[test]
    fn base_url_loses_trailing_slashes() {
        assert_eq!(trim_base_url("http://localhost:11434//"), "http://localhost:11434");
        assert_eq!(trim_base_url("https://api.firecrawl.dev/v2"), "https://api.firecrawl.dev/v2");
    }
}
