use std::sync::Arc;

use anyhow::{Context, Result};
use intent_client::{FirecrawlClient, FirecrawlConfig, OllamaClient, OllamaConfig};
use tracing::info;

pub mod brands;
pub mod config;
pub mod error;
pub mod export;
pub mod fusion;
pub mod intent;
pub mod lexicon;
pub mod llm;
pub mod pages;
pub mod pipeline;
pub mod providers;
pub mod report;
pub mod rules;
pub mod serp;
pub mod verdict;

pub use config::{AnalyzerConfig, ConfigError, AVAILABLE_MODELS};
pub use error::InputError;
pub use intent::{Intent, ScoreVector};
pub use llm::{IntentResult, LlmBatchRow, LlmIntentAnalyzer, ParseOutcome, RowStatus};
pub use pipeline::{
    prepare_keywords, process_queries, AnalysisNotes, AnalysisResult, HybridPipeline,
    NoopObserver, ProgressObserver,
};
pub use providers::{SearchProvider, TextGenerator};
pub use verdict::Branching;

/// Builds the search-backed pipeline from a validated configuration snapshot.
///
/// `api_key` overrides the `FIRECRAWL_API_KEY` environment variable. A missing
/// key or an invalid configuration fails here, before any keyword is touched.
pub fn hybrid_pipeline(
    config: Arc<AnalyzerConfig>,
    api_key: Option<String>,
) -> Result<HybridPipeline<FirecrawlClient>> {
    config.validate().context("invalid analyzer configuration")?;

    let defaults = FirecrawlConfig::default();
    let client = FirecrawlClient::with_config(FirecrawlConfig {
        api_key: api_key.or(defaults.api_key),
        ..defaults
    })
    .context("search provider is not configured")?;

    info!(
        target: "intent_core",
        limit = config.search.limit,
        country = %config.search.country,
        max_pages = config.search.max_pages,
        "Hybrid pipeline ready"
    );
    Ok(HybridPipeline::new(client, config))
}

/// Connects to the local model server named by the configuration.
pub async fn llm_analyzer(config: &AnalyzerConfig) -> Result<LlmIntentAnalyzer<OllamaClient>> {
    config.validate().context("invalid analyzer configuration")?;

    let client = OllamaClient::with_config(OllamaConfig {
        base_url: config.llm.base_url.clone(),
        model: config.llm.model.clone(),
        ..OllamaConfig::default()
    })?;
    LlmIntentAnalyzer::connect(client).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_api_key_is_rejected_up_front() {
        let result = hybrid_pipeline(Arc::new(AnalyzerConfig::default()), Some("  ".to_string()));
        let error = result.err().unwrap();
        assert!(format!("{error:#}").contains("FIRECRAWL_API_KEY not set"));
    }

    #[test]
    fn invalid_weights_fail_before_client_setup() {
        let mut config = AnalyzerConfig::default();
        config.weights.rules = -1.0;
        let error = hybrid_pipeline(Arc::new(config), Some("key".to_string()))
            .err()
            .unwrap();
        assert!(error.downcast_ref::<ConfigError>().is_some());
    }

    #[tokio::test]
    async fn unreachable_model_server_fails_to_connect() {
        let mut config = AnalyzerConfig::default();
        config.llm.base_url = "http://127.0.0.1:9".to_string();
        assert!(llm_analyzer(&config).await.is_err());
    }
}
