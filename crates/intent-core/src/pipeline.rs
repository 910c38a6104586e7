//! Batch orchestration for both analysis paths.
//!
//! Keywords are processed one at a time. A failure on one keyword is turned
//! into an error row and never aborts the batch.

use std::{collections::HashSet, sync::Arc};

use anyhow::{Context, Result};
use intent_client::{ResultItem, SearchRequest};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    config::AnalyzerConfig,
    error::InputError,
    fusion::combine,
    intent::{Intent, ScoreVector},
    lexicon::score_from_modifiers,
    llm::{LlmBatchRow, LlmIntentAnalyzer, MAX_LLM_BATCH},
    pages::{score_from_pages, PageNote},
    providers::{SearchProvider, TextGenerator},
    rules::{classify, LabelScores},
    serp::score_from_serp,
    verdict::{derive_verdict, Branching},
};

/// Number of result URLs kept on each analysis row.
pub const TOP_URL_COUNT: usize = 10;

/// Receives a tick after each keyword finishes.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, current: usize, total: usize, keyword: &str);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_progress(&self, _current: usize, _total: usize, _keyword: &str) {}
}

/// Either the per-page notes or the reason the keyword failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisNotes {
    Pages(Vec<PageNote>),
    Error { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub keyword: String,
    pub primary_intent: Option<Intent>,
    pub secondary_intent: Option<Intent>,
    pub confidence_pct: f64,
    pub branching: Branching,
    pub top_urls: Vec<String>,
    pub scores: ScoreVector,
    pub notes: AnalysisNotes,
    /// Five-label classifier scores in percent, when the classifier ran.
    pub auxiliary_scores: Option<LabelScores>,
}

impl AnalysisResult {
    pub fn failed(keyword: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            primary_intent: None,
            secondary_intent: None,
            confidence_pct: 0.0,
            branching: Branching::Error,
            top_urls: Vec::new(),
            scores: ScoreVector::zero(),
            notes: AnalysisNotes::Error {
                error: error.into(),
            },
            auxiliary_scores: None,
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.branching == Branching::Error
    }
}

/// Trims each line, drops blanks and repeated keywords (first one wins).
pub fn prepare_keywords<I, S>(lines: I) -> Result<Vec<String>, InputError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let keywords: Vec<String> = lines
        .into_iter()
        .map(|line| line.as_ref().trim().to_string())
        .filter(|line| !line.is_empty())
        .filter(|line| seen.insert(line.clone()))
        .collect();

    if keywords.is_empty() {
        return Err(InputError::NoKeywords);
    }
    Ok(keywords)
}

/// Search-backed hybrid scorer: SERP cues, query modifiers, page bodies and the
/// auxiliary URL/title classifier fused into one verdict per keyword.
pub struct HybridPipeline<S> {
    provider: S,
    config: Arc<AnalyzerConfig>,
}

impl<S: SearchProvider> HybridPipeline<S> {
    pub fn new(provider: S, config: Arc<AnalyzerConfig>) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn provider(&self) -> &S {
        &self.provider
    }

    fn request_for(&self, keyword: &str) -> SearchRequest {
        let search = &self.config.search;
        SearchRequest {
            query: keyword.to_string(),
            limit: search.limit,
            country: search.country.clone(),
            location: self.config.location().map(str::to_string),
        }
    }

    pub async fn analyze_keyword(&self, keyword: &str) -> Result<AnalysisResult> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(InputError::EmptyQuery.into());
        }

        let items = self
            .provider
            .search(&self.request_for(keyword))
            .await
            .with_context(|| format!("search failed for `{keyword}`"))?;

        Ok(self.score_items(keyword, &items))
    }

    /// Scores already-fetched results; no I/O.
    pub fn score_items(&self, keyword: &str, items: &[ResultItem]) -> AnalysisResult {
        let config = &self.config;
        let serp = score_from_serp(items, keyword);
        let rules = score_from_modifiers(keyword, &config.lexicon);
        let pages = score_from_pages(items, config.search.max_pages);

        let auxiliary = (config.weights.classifier > 0.0).then(|| {
            let urls: Vec<&str> = items.iter().filter_map(|item| item.url.as_deref()).collect();
            let titles: Vec<&str> = items.iter().map(ResultItem::title).collect();
            classify(&urls, &titles)
        });
        let auxiliary_vector = auxiliary.as_ref().map(|result| result.canonical());

        let fused = combine(
            &serp,
            &rules,
            &pages.scores,
            &config.weights,
            auxiliary_vector.as_ref(),
        );
        let verdict = derive_verdict(&fused);

        debug!(
            target: "intent_core",
            keyword,
            results = items.len(),
            serp = ?serp,
            rules = ?rules,
            pages = ?pages.scores,
            auxiliary = ?auxiliary.as_ref().map(|result| result.primary),
            fused = ?fused,
            "Scored keyword"
        );

        AnalysisResult {
            keyword: keyword.to_string(),
            primary_intent: Some(verdict.primary),
            secondary_intent: Some(verdict.secondary),
            confidence_pct: verdict.confidence,
            branching: verdict.branching,
            top_urls: items
                .iter()
                .take(TOP_URL_COUNT)
                .filter_map(|item| item.url.clone())
                .collect(),
            scores: fused,
            notes: AnalysisNotes::Pages(pages.notes),
            auxiliary_scores: auxiliary.map(|result| result.normalized),
        }
    }

    pub async fn run_batch(
        &self,
        keywords: &[String],
        observer: &dyn ProgressObserver,
    ) -> Vec<AnalysisResult> {
        let total = keywords.len();
        info!(target: "intent_core", total, "Starting hybrid analysis batch");

        let mut results = Vec::with_capacity(total);
        for (index, keyword) in keywords.iter().enumerate() {
            let result = match self.analyze_keyword(keyword).await {
                Ok(result) => result,
                Err(err) => {
                    warn!(target: "intent_core", keyword = keyword.as_str(), error = %format!("{err:#}"), "Keyword analysis failed");
                    AnalysisResult::failed(keyword.as_str(), format!("{err:#}"))
                }
            };
            results.push(result);
            observer.on_progress(index + 1, total, keyword);
        }

        let failed = results.iter().filter(|result| result.is_error()).count();
        info!(target: "intent_core", total, failed, "Hybrid analysis batch finished");
        results
    }
}

/// LLM batch entry point; validates the batch before contacting the model.
pub async fn process_queries<G: TextGenerator>(
    analyzer: &LlmIntentAnalyzer<G>,
    keywords: &[String],
    observer: &dyn ProgressObserver,
) -> Result<Vec<LlmBatchRow>, InputError> {
    if keywords.is_empty() {
        return Err(InputError::NoKeywords);
    }
    if keywords.len() > MAX_LLM_BATCH {
        return Err(InputError::TooManyKeywords {
            count: keywords.len(),
            limit: MAX_LLM_BATCH,
        });
    }

    info!(target: "intent_core", total = keywords.len(), model = analyzer.model(), "Starting LLM analysis batch");
    let rows = analyzer.analyze_batch(keywords, observer).await;
    let failed = rows
        .iter()
        .filter(|row| matches!(row, LlmBatchRow::Error { .. }))
        .count();
    info!(target: "intent_core", total = rows.len(), failed, "LLM analysis batch finished");
    Ok(rows)
}
