//! Intent cues mined from the bodies of the top-ranked pages.

use intent_client::ResultItem;
use serde::{Deserialize, Serialize};

use crate::{
    brands::mentions_integration,
    intent::{Intent, ScoreVector},
};

pub const CALLS_TO_ACTION: &[&str] = &[
    "buy now",
    "add to cart",
    "order",
    "checkout",
    "subscribe",
    "sign up",
    "download",
    "contact",
];

const HYBRID_INFORMATIONAL_BONUS: f64 = 0.7;
const HYBRID_TRANSACTIONAL_PENALTY: f64 = 0.3;
const INTEGRATION_BONUS: f64 = 0.5;

/// Structured-data style markers, detected by substring heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaTag {
    #[serde(rename = "FAQ")]
    Faq,
    HowTo,
    Product,
    Review,
}

/// Per-page observability record; never feeds back into scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageNote {
    pub url: Option<String>,
    pub ctas: Vec<String>,
    pub schema: Vec<SchemaTag>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageSignals {
    pub scores: ScoreVector,
    pub notes: Vec<PageNote>,
}

fn detect_schema(markdown: &str, html: &str) -> Vec<SchemaTag> {
    let mut schema = Vec::new();
    if markdown.contains("faq") || html.contains("faqpage") {
        schema.push(SchemaTag::Faq);
    }
    if html.contains("howto") || html.contains("how-to") {
        schema.push(SchemaTag::HowTo);
    }
    if html.contains("product") && (html.contains("price") || html.contains("sku")) {
        schema.push(SchemaTag::Product);
    }
    if markdown.contains("review") || html.contains("aggregaterating") {
        schema.push(SchemaTag::Review);
    }
    schema
}

/// Scores the first `max_pages` items in provider order.
///
/// The hybrid product/education rule adjusts the running Transactional total,
/// so a page late in the list can pull down signal contributed by earlier ones.
pub fn score_from_pages(items: &[ResultItem], max_pages: usize) -> PageSignals {
    let mut scores = ScoreVector::zero();
    let mut notes = Vec::with_capacity(max_pages.min(items.len()));

    for item in items.iter().take(max_pages) {
        let markdown = item.markdown().to_lowercase();
        let html = item.html().to_lowercase();

        let ctas: Vec<String> = CALLS_TO_ACTION
            .iter()
            .filter(|cta| markdown.contains(*cta) || html.contains(*cta))
            .map(|cta| (*cta).to_string())
            .collect();
        let schema = detect_schema(&markdown, &html);
        let has = |tag: SchemaTag| schema.contains(&tag);

        if !ctas.is_empty() || has(SchemaTag::Product) {
            scores.add_to(Intent::Transactional, 1.0);
        }
        if has(SchemaTag::Faq) || has(SchemaTag::HowTo) {
            scores.add_to(Intent::Informational, 1.0);
        }
        if has(SchemaTag::Review) {
            scores.add_to(Intent::CommercialInvestigation, 1.0);
        }
        if has(SchemaTag::Product) && (has(SchemaTag::Faq) || has(SchemaTag::HowTo)) {
            scores.add_to(Intent::Informational, HYBRID_INFORMATIONAL_BONUS);
            let transactional = scores[Intent::Transactional];
            scores.set(
                Intent::Transactional,
                (transactional - HYBRID_TRANSACTIONAL_PENALTY).max(0.0),
            );
        }
        if mentions_integration(&markdown) {
            scores.add_to(Intent::Informational, INTEGRATION_BONUS);
        }

        notes.push(PageNote {
            url: item.url.clone(),
            ctas,
            schema,
        });
    }

    PageSignals { scores, notes }
}
