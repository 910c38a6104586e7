//! Firecrawl search + scrape client.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::types::{ResultItem, ScrapeOptions, SearchPayload, SearchRequest, SearchResponse};
use crate::{build_http, trim_base_url, ClientError};

pub const DEFAULT_BASE_URL: &str = "https://api.firecrawl.dev/v2";
pub const API_KEY_ENV: &str = "FIRECRAWL_API_KEY";

#[derive(Debug, Clone)]
pub struct FirecrawlConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for FirecrawlConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var(API_KEY_ENV).ok(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug)]
pub struct FirecrawlClient {
    http: Client,
    api_key: String,
    search_url: String,
}

impl FirecrawlClient {
    /// Builds a client, failing up front when no API key is configured.
    pub fn with_config(config: FirecrawlConfig) -> Result<Self, ClientError> {
        let api_key = config
            .api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(ClientError::MissingApiKey)?;

        Ok(Self {
            http: build_http(config.timeout)?,
            api_key,
            search_url: format!("{}/search", trim_base_url(&config.base_url)),
        })
    }

    #[instrument(name = "firecrawl_client.search", skip(self), fields(query = %request.query))]
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<ResultItem>, ClientError> {
        let payload = SearchPayload {
            query: &request.query,
            limit: request.limit,
            country: &request.country,
            location: request
                .location
                .as_deref()
                .map(str::trim)
                .filter(|location| !location.is_empty()),
            sources: ["web"],
            scrape_options: ScrapeOptions::default(),
        };

        let response = self
            .http
            .post(&self.search_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|err| ClientError::from_transport(&err, &self.search_url))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, url = %self.search_url, "Firecrawl search failed");
            return Err(ClientError::Status(status));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|err| ClientError::from_transport(&err, &self.search_url))?;
        let items = body.into_items();
        debug!(results = items.len(), "Firecrawl search completed");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: Option<&str>) -> FirecrawlConfig {
        FirecrawlConfig {
            api_key: api_key.map(str::to_string),
            ..FirecrawlConfig::default()
        }
    }

    #[test]
    fn missing_api_key_is_rejected_at_construction() {
        let error = FirecrawlClient::with_config(config(None)).unwrap_err();
        assert!(matches!(error, ClientError::MissingApiKey));

        let blank = FirecrawlClient::with_config(config(Some("   "))).unwrap_err();
        assert!(blank.is_configuration());
    }

    #[test]
    fn search_url_is_derived_from_base() {
        let client = FirecrawlClient::with_config(FirecrawlConfig {
            base_url: "http://127.0.0.1:3002/v2/".to_string(),
            ..config(Some("fc-test"))
        })
        .unwrap();
        assert_eq!(client.search_url, "http://127.0.0.1:3002/v2/search");
    }

    #[tokio::test]
    async fn unreachable_endpoint_surfaces_transport_error() {
        let client = FirecrawlClient::with_config(FirecrawlConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_secs(2),
            ..config(Some("fc-test"))
        })
        .unwrap();
        let error = client
            .search(&SearchRequest::new("alexa homekit"))
            .await
            .unwrap_err();
        assert!(matches!(error, ClientError::Http(_) | ClientError::Timeout(_)));
    }
}
