//! Intent analysis backed by a local text generation model.
//!
//! Every reply goes through [`parse_response`], which never fails: anything
//! the model gets wrong degrades to [`fallback_analysis`].

use std::fmt;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::{
    error::InputError,
    intent::{Intent, ScoreVector, UnknownIntent},
    pipeline::ProgressObserver,
    providers::TextGenerator,
    verdict::round1,
};

/// Upper bound on keywords accepted by one LLM batch.
pub const MAX_LLM_BATCH: usize = 100;

const FALLBACK_ERROR_CHARS: usize = 50;
const FALLBACK_MATCH_SCORE: f64 = 60.0;
const FALLBACK_DEFAULT_SCORE: f64 = 40.0;

const FALLBACK_BUCKETS: [(Intent, &[&str]); 4] = [
    (
        Intent::Informational,
        &["how", "what", "why", "guide", "tutorial", "learn"],
    ),
    (
        Intent::Transactional,
        &["buy", "price", "order", "download", "book"],
    ),
    (
        Intent::Navigational,
        &["login", "official", "homepage", "site"],
    ),
    (
        Intent::CommercialInvestigation,
        &["best", "top", "vs", "review", "compare"],
    ),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    pub primary_intent: Intent,
    pub secondary_intent: Intent,
    /// Normalized score of the primary intent, one decimal.
    pub confidence: f64,
    pub reasoning: String,
    /// Sums to 100.
    pub all_scores: ScoreVector,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Parsed(IntentResult),
    Fallback(IntentResult),
}

impl ParseOutcome {
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }

    #[must_use]
    pub fn into_result(self) -> IntentResult {
        match self {
            Self::Parsed(result) | Self::Fallback(result) => result,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowStatus {
    Success,
    Error,
}

impl RowStatus {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One keyword's outcome inside an LLM batch.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmBatchRow {
    Success {
        keyword: String,
        result: IntentResult,
    },
    Error {
        keyword: String,
        message: String,
    },
}

impl LlmBatchRow {
    pub fn keyword(&self) -> &str {
        match self {
            Self::Success { keyword, .. } | Self::Error { keyword, .. } => keyword,
        }
    }

    pub fn status(&self) -> RowStatus {
        match self {
            Self::Success { .. } => RowStatus::Success,
            Self::Error { .. } => RowStatus::Error,
        }
    }

    pub fn primary_intent(&self) -> Option<Intent> {
        match self {
            Self::Success { result, .. } => Some(result.primary_intent),
            Self::Error { .. } => None,
        }
    }

    pub fn secondary_intent(&self) -> Option<Intent> {
        match self {
            Self::Success { result, .. } => Some(result.secondary_intent),
            Self::Error { .. } => None,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            Self::Success { result, .. } => result.confidence,
            Self::Error { .. } => 0.0,
        }
    }

    pub fn reasoning(&self) -> String {
        match self {
            Self::Success { result, .. } => result.reasoning.clone(),
            Self::Error { message, .. } => format!("Analysis failed: {message}"),
        }
    }

    /// Error rows report a zeroed vector.
    pub fn scores(&self) -> ScoreVector {
        match self {
            Self::Success { result, .. } => result.all_scores,
            Self::Error { .. } => ScoreVector::zero(),
        }
    }
}

/// Builds the classification prompt for a single (already trimmed) query.
pub fn build_prompt(query: &str) -> String {
    format!(
        r#"You are an expert SEO analyst specializing in search intent classification. Analyze the following search query and determine the user's search intent.

**Search Query:** "{query}"

**Intent Categories:**

1. **Informational**: User seeks knowledge, answers, guides, tutorials, definitions, or how-to content.
   - Examples: "how to tie a tie", "what is machine learning", "python tutorial"

2. **Transactional**: User intends to complete an action like buying, downloading, subscribing, or booking.
   - Examples: "buy iPhone 15", "download spotify premium", "book hotel NYC"

3. **Navigational**: User wants to find a specific website, brand page, or login portal.
   - Examples: "facebook login", "amazon official site", "netflix homepage"

4. **Commercial Investigation**: User is researching before making a purchase decision (comparisons, reviews, best options).
   - Examples: "best laptops 2024", "iPhone vs Samsung", "Nike shoes review"

**Instructions:**
1. Analyze the query carefully considering keywords, structure, and implied user intent
2. Assign a primary intent (most likely)
3. Assign a secondary intent (next most likely)
4. Provide confidence scores (0-100) for ALL four intents
5. Explain your reasoning in 1-2 sentences

**Output Format (JSON only, no other text):**
{{
  "primary_intent": "Intent Name",
  "secondary_intent": "Intent Name",
  "confidence_scores": {{
    "Informational": 25,
    "Transactional": 60,
    "Navigational": 5,
    "Commercial Investigation": 10
  }},
  "reasoning": "Brief explanation of why this intent was chosen"
}}

**Important:** Respond ONLY with the JSON object, nothing else."#
    )
}

#[derive(Debug, Deserialize)]
struct RawReply {
    primary_intent: String,
    secondary_intent: String,
    confidence_scores: Map<String, Value>,
    reasoning: String,
}

/// Span from the first `{` to the last `}`, or the whole text.
fn json_candidate(response: &str) -> &str {
    match (response.find('{'), response.rfind('}')) {
        (Some(start), Some(end)) if start < end => &response[start..=end],
        _ => response,
    }
}

fn read_scores(raw: &Map<String, Value>) -> Result<ScoreVector, String> {
    let mut scores = ScoreVector::zero();
    for (key, value) in raw {
        let Ok(intent) = key.parse::<Intent>() else {
            continue;
        };
        match value.as_f64() {
            Some(score) if score >= 0.0 && score.is_finite() => scores.set(intent, score),
            _ => return Err(format!("invalid score for {intent}: {value}")),
        }
    }
    Ok(scores)
}

fn parse_reply(response: &str) -> Result<IntentResult, String> {
    let reply: RawReply =
        serde_json::from_str(json_candidate(response)).map_err(|err| err.to_string())?;

    let primary: Intent = reply
        .primary_intent
        .parse()
        .map_err(|err: UnknownIntent| err.to_string())?;
    let secondary = match reply.secondary_intent.parse::<Intent>() {
        Ok(secondary) if secondary != primary => secondary,
        _ => first_other(primary),
    };

    let raw = read_scores(&reply.confidence_scores)?;
    let total = match raw.total() {
        total if total > 0.0 => total,
        _ => 1.0,
    };
    let all_scores = raw * (100.0 / total);

    Ok(IntentResult {
        primary_intent: primary,
        secondary_intent: secondary,
        confidence: round1(all_scores[primary]),
        reasoning: reply.reasoning,
        all_scores,
    })
}

fn first_other(primary: Intent) -> Intent {
    Intent::ALL
        .into_iter()
        .find(|intent| *intent != primary)
        .unwrap_or(Intent::Transactional)
}

/// Interprets a raw model reply; malformed replies become a fallback result.
pub fn parse_response(response: &str, query: &str) -> ParseOutcome {
    match parse_reply(response) {
        Ok(result) => ParseOutcome::Parsed(result),
        Err(error) => {
            debug!(target: "intent_core", %error, query, "model reply rejected; using fallback");
            ParseOutcome::Fallback(fallback_analysis(query, Some(&error)))
        }
    }
}

/// Keyword-bucket heuristic used whenever the model cannot be trusted.
pub fn fallback_analysis(query: &str, error: Option<&str>) -> IntentResult {
    let lowered = query.to_lowercase();
    let mut scores = ScoreVector::zero();

    match FALLBACK_BUCKETS
        .iter()
        .find(|(_, words)| words.iter().any(|word| lowered.contains(word)))
    {
        Some((intent, _)) => scores.set(*intent, FALLBACK_MATCH_SCORE),
        None => scores.set(Intent::Informational, FALLBACK_DEFAULT_SCORE),
    }

    // The remainder is split in thirds over every zero-scored intent.
    let assigned = scores.total();
    if assigned < 100.0 {
        let share = (100.0 - assigned) / (Intent::ALL.len() - 1) as f64;
        for intent in Intent::ALL {
            if scores[intent] == 0.0 {
                scores.set(intent, share);
            }
        }
    }

    let primary = scores.argmax();
    let secondary = scores.argmax_excluding(Some(primary));
    let reasoning = match error.filter(|error| !error.is_empty()) {
        Some(error) => {
            let head: String = error.chars().take(FALLBACK_ERROR_CHARS).collect();
            format!("Fallback analysis (LLM error: {head})")
        }
        None => "Basic keyword analysis".to_string(),
    };

    IntentResult {
        primary_intent: primary,
        secondary_intent: secondary,
        confidence: round1(scores[primary]),
        reasoning,
        all_scores: scores,
    }
}

pub struct LlmIntentAnalyzer<G> {
    generator: G,
}

impl<G: TextGenerator> LlmIntentAnalyzer<G> {
    /// Probes the endpoint once; an unreachable model server is fatal here.
    pub async fn connect(generator: G) -> Result<Self> {
        let models = generator.list_models().await.with_context(|| {
            format!(
                "cannot reach the model endpoint for `{}`; make sure the server is running and the model is pulled",
                generator.model()
            )
        })?;
        info!(
            target: "intent_core",
            model = generator.model(),
            available = models.len(),
            "Connected to model endpoint"
        );
        Ok(Self { generator })
    }

    pub fn model(&self) -> &str {
        self.generator.model()
    }

    pub async fn analyze(&self, query: &str) -> Result<IntentResult, InputError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(InputError::EmptyQuery);
        }

        let prompt = build_prompt(query);
        match self.generator.generate(&prompt).await {
            Ok(response) => {
                let outcome = parse_response(&response, query);
                if outcome.is_fallback() {
                    warn!(target: "intent_core", query, "model reply was malformed; used keyword fallback");
                }
                Ok(outcome.into_result())
            }
            Err(err) => {
                warn!(target: "intent_core", query, error = %err, "LLM analysis failed; using fallback");
                Ok(fallback_analysis(query, Some(&err.to_string())))
            }
        }
    }

    /// Sequential; a failing keyword becomes an error row and the batch goes on.
    pub async fn analyze_batch(
        &self,
        queries: &[String],
        observer: &dyn ProgressObserver,
    ) -> Vec<LlmBatchRow> {
        let total = queries.len();
        let mut rows = Vec::with_capacity(total);
        for (index, query) in queries.iter().enumerate() {
            let row = match self.analyze(query).await {
                Ok(result) => LlmBatchRow::Success {
                    keyword: query.clone(),
                    result,
                },
                Err(err) => LlmBatchRow::Error {
                    keyword: query.clone(),
                    message: err.to_string(),
                },
            };
            rows.push(row);
            observer.on_progress(index + 1, total, query);
        }
        rows
    }
}
