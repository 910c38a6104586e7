use std::{collections::HashMap, sync::Arc, sync::Mutex};

use async_trait::async_trait;
use intent_client::{ClientError, ResultItem, SearchRequest};
use intent_core::{
    export::{read_analysis_csv, write_analysis_csv},
    report::{BatchOverview, ResultFilter},
    AnalysisNotes, AnalysisResult, AnalyzerConfig, Branching, HybridPipeline, Intent,
    NoopObserver, ProgressObserver, SearchProvider,
};

#[derive(Default)]
struct FakeSearch {
    results: HashMap<String, Vec<ResultItem>>,
    requests: Mutex<Vec<SearchRequest>>,
}

impl FakeSearch {
    fn with(mut self, query: &str, items: Vec<ResultItem>) -> Self {
        self.results.insert(query.to_string(), items);
        self
    }
}

#[async_trait]
impl SearchProvider for FakeSearch {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<ResultItem>, ClientError> {
        self.requests.lock().unwrap().push(request.clone());
        self.results
            .get(&request.query)
            .cloned()
            .ok_or_else(|| ClientError::Timeout("https://api.firecrawl.dev/v2/search".to_string()))
    }
}

#[derive(Default)]
struct RecordingObserver {
    ticks: Mutex<Vec<(usize, usize, String)>>,
}

impl ProgressObserver for RecordingObserver {
    fn on_progress(&self, current: usize, total: usize, keyword: &str) {
        self.ticks
            .lock()
            .unwrap()
            .push((current, total, keyword.to_string()));
    }
}

fn item(url: &str, title: &str, description: &str, markdown: &str) -> ResultItem {
    ResultItem {
        url: Some(url.to_string()),
        title: Some(title.to_string()),
        description: Some(description.to_string()),
        markdown: Some(markdown.to_string()),
        html: None,
    }
}

const SMART_HOME_QUERY: &str = "how to connect alexa with google home";

fn smart_home_results() -> Vec<ResultItem> {
    vec![
        item(
            "https://www.reddit.com/r/smarthome/comments/abc/connect_alexa_google",
            "How to connect Alexa with Google Home?",
            "Step by step guide from the community",
            "FAQ: pair your speaker with the other assistant",
        ),
        item(
            "https://support.google.com/googlenest/answer/123",
            "Set up your speaker with another voice assistant",
            "Google Nest Help",
            "Open the app and link your accounts",
        ),
    ]
}

fn pipeline(provider: FakeSearch, config: AnalyzerConfig) -> HybridPipeline<FakeSearch> {
    HybridPipeline::new(provider, Arc::new(config))
}

#[tokio::test]
async fn smart_home_integration_query_is_informational() {
    let provider = FakeSearch::default().with(SMART_HOME_QUERY, smart_home_results());
    let pipeline = pipeline(provider, AnalyzerConfig::default());

    let result = pipeline.analyze_keyword(SMART_HOME_QUERY).await.unwrap();

    assert_eq!(result.primary_intent, Some(Intent::Informational));
    assert_eq!(result.branching, Branching::Clear);
    assert!(result.confidence_pct > 50.0, "{}", result.confidence_pct);
    assert_eq!(result.top_urls.len(), 2);
    assert!(result.auxiliary_scores.is_some());
    match &result.notes {
        AnalysisNotes::Pages(notes) => assert_eq!(notes.len(), 2),
        AnalysisNotes::Error { error } => panic!("unexpected error notes: {error}"),
    }
}

#[tokio::test]
async fn request_uses_configured_search_settings() {
    let provider = FakeSearch::default().with("buy shoes", Vec::new());
    let mut config = AnalyzerConfig::default();
    config.search.limit = 7;
    config.search.country = "DE".to_string();
    config.search.location = "   ".to_string();
    let pipeline = pipeline(provider, config);

    pipeline.analyze_keyword("  buy shoes ").await.unwrap();

    let requests = pipeline_requests(&pipeline);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].query, "buy shoes");
    assert_eq!(requests[0].limit, 7);
    assert_eq!(requests[0].country, "DE");
    assert_eq!(requests[0].location, None);
}

fn pipeline_requests(pipeline: &HybridPipeline<FakeSearch>) -> Vec<SearchRequest> {
    pipeline.provider().requests.lock().unwrap().clone()
}

#[tokio::test]
async fn zero_classifier_weight_skips_auxiliary_scores() {
    let provider = FakeSearch::default().with(SMART_HOME_QUERY, smart_home_results());
    let mut config = AnalyzerConfig::default();
    config.weights.classifier = 0.0;
    let pipeline = pipeline(provider, config);

    let result = pipeline.analyze_keyword(SMART_HOME_QUERY).await.unwrap();
    assert!(result.auxiliary_scores.is_none());
    assert_eq!(result.primary_intent, Some(Intent::Informational));
}

#[tokio::test]
async fn empty_result_list_still_yields_a_verdict() {
    let provider = FakeSearch::default().with("buy running shoes", Vec::new());
    let pipeline = pipeline(provider, AnalyzerConfig::default());

    let result = pipeline.analyze_keyword("buy running shoes").await.unwrap();
    assert_eq!(result.primary_intent, Some(Intent::Transactional));
    assert!(result.top_urls.is_empty());
    assert_eq!(result.notes, AnalysisNotes::Pages(Vec::new()));
}

#[tokio::test]
async fn failing_keyword_becomes_error_row_and_batch_continues() {
    let provider = FakeSearch::default().with(SMART_HOME_QUERY, smart_home_results());
    let pipeline = pipeline(provider, AnalyzerConfig::default());
    let observer = RecordingObserver::default();
    let keywords = vec!["unreachable".to_string(), SMART_HOME_QUERY.to_string()];

    let results = pipeline.run_batch(&keywords, &observer).await;

    assert_eq!(results.len(), 2);
    let failed = &results[0];
    assert!(failed.is_error());
    assert_eq!(failed.primary_intent, None);
    assert!(failed.scores.is_zero());
    match &failed.notes {
        AnalysisNotes::Error { error } => {
            assert!(error.contains("search failed for `unreachable`"), "{error}");
            assert!(error.contains("timed out"), "{error}");
        }
        AnalysisNotes::Pages(_) => panic!("expected error notes"),
    }
    assert_eq!(results[1].primary_intent, Some(Intent::Informational));

    let ticks = observer.ticks.lock().unwrap().clone();
    assert_eq!(
        ticks,
        vec![
            (1, 2, "unreachable".to_string()),
            (2, 2, SMART_HOME_QUERY.to_string()),
        ]
    );
}

#[tokio::test]
async fn batch_results_export_filter_and_summarize() {
    let provider = FakeSearch::default()
        .with(SMART_HOME_QUERY, smart_home_results())
        .with("buy running shoes", Vec::new());
    let pipeline = pipeline(provider, AnalyzerConfig::default());
    let keywords = vec![
        SMART_HOME_QUERY.to_string(),
        "buy running shoes".to_string(),
        "offline".to_string(),
    ];
    let results = pipeline.run_batch(&keywords, &NoopObserver).await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("intent_results.csv");
    write_analysis_csv(std::fs::File::create(&path).unwrap(), &results).unwrap();
    let restored: Vec<AnalysisResult> =
        read_analysis_csv(std::fs::File::open(&path).unwrap()).unwrap();
    assert_eq!(restored.len(), 3);
    for (before, after) in results.iter().zip(&restored) {
        assert_eq!(before.keyword, after.keyword);
        assert_eq!(before.primary_intent, after.primary_intent);
        assert_eq!(before.confidence_pct, after.confidence_pct);
        assert_eq!(before.branching, after.branching);
    }

    let filter = ResultFilter {
        intents: vec![Intent::Informational, Intent::Transactional],
        ..ResultFilter::default()
    };
    let visible = filter.apply(&restored);
    assert_eq!(visible.len(), 2);

    let overview = BatchOverview::from_rows(&visible);
    assert_eq!(overview.keywords, 2);
    assert_eq!(overview.distribution.get(&Intent::Informational), Some(&1));
    assert!(overview.average_confidence.is_some());
}
