//! Seams to the two external collaborators.
//!
//! The pipelines only see these traits, so tests can drive them with canned
//! responses instead of the network clients.

use async_trait::async_trait;
use intent_client::{
    ClientError, FirecrawlClient, ModelInfo, OllamaClient, ResultItem, SearchRequest,
};

/// Search plus scrape: ranked results with page bodies attached.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<ResultItem>, ClientError>;
}

/// A local text generation endpoint.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Capability probe. Also used to list models.
    async fn list_models(&self) -> Result<Vec<ModelInfo>, ClientError>;

    async fn generate(&self, prompt: &str) -> Result<String, ClientError>;

    fn model(&self) -> &str;
}

#[async_trait]
impl SearchProvider for FirecrawlClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<ResultItem>, ClientError> {
        FirecrawlClient::search(self, request).await
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn list_models(&self) -> Result<Vec<ModelInfo>, ClientError> {
        OllamaClient::list_models(self).await
    }

    async fn generate(&self, prompt: &str) -> Result<String, ClientError> {
        OllamaClient::generate(self, prompt).await
    }

    fn model(&self) -> &str {
        OllamaClient::model(self)
    }
}
