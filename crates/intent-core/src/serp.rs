use intent_client::ResultItem;

use crate::{
    brands::{is_cross_brand, mentions_integration},
    intent::{Intent, ScoreVector},
};

/// Only the head of the result list contributes SERP-wide cues.
pub const SERP_WINDOW: usize = 10;

const CUES: &[(Intent, f64, &[&str])] = &[
    (
        Intent::Informational,
        0.6,
        &["faq", "people also ask", "how to", "guide", "tutorial"],
    ),
    (
        Intent::Transactional,
        0.6,
        &["buy", "price", "add to cart", "checkout", "shop"],
    ),
    (
        Intent::Navigational,
        0.4,
        &["official site", "login", "contact us"],
    ),
    (
        Intent::CommercialInvestigation,
        0.6,
        &["review", "best", "top", " vs ", "comparison"],
    ),
];

const INTEGRATION_BONUS: f64 = 0.8;
const BRAND_PAIR_BONUS: f64 = 0.6;

/// Maps page-one text (titles, descriptions, markdown) plus the query itself
/// onto coarse intent cues.
pub fn score_from_serp(items: &[ResultItem], query: &str) -> ScoreVector {
    let texts: Vec<String> = std::iter::once(query.to_string())
        .chain(items.iter().take(SERP_WINDOW).map(|item| {
            [item.title(), item.description(), item.markdown()].join(" ")
        }))
        .collect();
    let joined = texts.join(" \n ").to_lowercase();

    let mut scores = ScoreVector::zero();
    for (intent, weight, cues) in CUES {
        if cues.iter().any(|cue| joined.contains(cue)) {
            scores.add_to(*intent, *weight);
        }
    }
    if mentions_integration(&joined) {
        scores.add_to(Intent::Informational, INTEGRATION_BONUS);
    }
    if is_cross_brand(&texts) {
        scores.add_to(Intent::Informational, BRAND_PAIR_BONUS);
    }
    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, markdown: &str) -> ResultItem {
        ResultItem {
            title: Some(title.to_string()),
            markdown: Some(markdown.to_string()),
            ..ResultItem::default()
        }
    }

    #[test]
    fn query_alone_contributes_cues() {
        let scores = score_from_serp(&[], "facebook login");
        assert!((scores[Intent::Navigational] - 0.4).abs() < 1e-9);
        assert_eq!(scores[Intent::Transactional], 0.0);
    }

    #[test]
    fn shopping_pages_raise_transactional_and_commercial() {
        let items = vec![
            item("Best noise cancelling headphones", "Price drop: add to cart"),
            item("Sony WH-1000XM5 review", ""),
        ];
        let scores = score_from_serp(&items, "noise cancelling headphones");
        assert!((scores[Intent::Transactional] - 0.6).abs() < 1e-9);
        assert!((scores[Intent::CommercialInvestigation] - 0.6).abs() < 1e-9);
    }

    #[test]
    fn results_beyond_the_window_are_ignored() {
        let mut items = vec![item("plain", "plain"); SERP_WINDOW];
        items.push(item("official site", ""));
        let scores = score_from_serp(&items, "plain");
        assert_eq!(scores[Intent::Navigational], 0.0);
    }

    #[test]
    fn brands_split_across_results_still_pair() {
        let items = vec![item("Alexa skills", ""), item("HomeKit hub", "")];
        let scores = score_from_serp(&items, "smart hub");
        assert!((scores[Intent::Informational] - 0.6).abs() < 1e-9);
    }
}
