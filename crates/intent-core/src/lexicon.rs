use serde::{Deserialize, Serialize};

use crate::{
    brands::{is_cross_brand, mentions_integration},
    intent::{Intent, ScoreVector},
};

const INTEGRATION_BONUS: f64 = 0.8;
const BRAND_PAIR_BONUS: f64 = 0.6;

/// Per-intent modifier terms, matched as lowercase substrings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierLexicon {
    pub informational: Vec<String>,
    pub transactional: Vec<String>,
    pub navigational: Vec<String>,
    pub commercial: Vec<String>,
}

impl Default for ModifierLexicon {
    fn default() -> Self {
        Self {
            informational: split_terms(
                "how,what,why,who,guide,tutorial,learn,meaning,definition,ideas,examples,steps",
            ),
            transactional: split_terms(
                "buy,price,deal,discount,coupon,book,order,subscribe,download",
            ),
            navigational: split_terms("brand,login,official,homepage,near me,locations,contact"),
            commercial: split_terms(
                "best,top,vs,review,compare,comparison,alternative,pros,cons",
            ),
        }
    }
}

impl ModifierLexicon {
    /// Builds a lexicon from four comma-separated term lists.
    pub fn from_comma_lists(
        informational: &str,
        transactional: &str,
        navigational: &str,
        commercial: &str,
    ) -> Self {
        Self {
            informational: split_terms(informational),
            transactional: split_terms(transactional),
            navigational: split_terms(navigational),
            commercial: split_terms(commercial),
        }
    }

    pub fn terms(&self, intent: Intent) -> &[String] {
        match intent {
            Intent::Informational => &self.informational,
            Intent::Transactional => &self.transactional,
            Intent::Navigational => &self.navigational,
            Intent::CommercialInvestigation => &self.commercial,
        }
    }
}

/// Splits a comma-separated list, trimming and lowercasing each term and
/// dropping blanks.
pub fn split_terms(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|term| term.trim().to_lowercase())
        .filter(|term| !term.is_empty())
        .collect()
}

/// Case-insensitive substring test; blank terms never match.
pub fn contains_any<S: AsRef<str>>(text: &str, terms: &[S]) -> bool {
    let lowered = text.to_lowercase();
    terms
        .iter()
        .map(|term| term.as_ref().trim().to_lowercase())
        .any(|term| !term.is_empty() && lowered.contains(&term))
}

/// Scores a raw query against the modifier lexicon.
///
/// Matching is substring containment, so short terms such as `how` or `top`
/// also fire inside longer words (`showroom`, `laptop`).
pub fn score_from_modifiers(query: &str, lexicon: &ModifierLexicon) -> ScoreVector {
    let mut scores = ScoreVector::zero();
    for intent in Intent::ALL {
        if contains_any(query, lexicon.terms(intent)) {
            scores.add_to(intent, 1.0);
        }
    }
    if mentions_integration(query) {
        scores.add_to(Intent::Informational, INTEGRATION_BONUS);
    }
    if is_cross_brand([query]) {
        scores.add_to(Intent::Informational, BRAND_PAIR_BONUS);
    }
    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn cross_brand_integration_query_skews_informational() {
        let scores = score_from_modifiers(
            "how to connect alexa with google home",
            &ModifierLexicon::default(),
        );
        // keyword match + integration verb + brand pair
        assert!(scores[Intent::Informational] >= 2.4 - TOLERANCE);
        assert!((scores[Intent::Informational] - 2.4).abs() < TOLERANCE);
    }

    #[test]
    fn each_intent_scores_at_most_once_per_lexicon() {
        let scores = score_from_modifiers("best top review vs", &ModifierLexicon::default());
        assert_eq!(scores[Intent::CommercialInvestigation], 1.0);
        assert_eq!(scores[Intent::Transactional], 0.0);
    }

    #[test]
    fn substring_matching_is_a_known_false_positive_source() {
        let scores = score_from_modifiers("laptop", &ModifierLexicon::default());
        assert_eq!(scores[Intent::CommercialInvestigation], 1.0);
    }

    #[test]
    fn blank_terms_are_ignored() {
        let lexicon = ModifierLexicon::from_comma_lists(" , ,", "", "login, ", "");
        assert!(lexicon.informational.is_empty());
        assert_eq!(lexicon.navigational, vec!["login".to_string()]);
        let scores = score_from_modifiers("facebook login", &lexicon);
        assert_eq!(scores[Intent::Navigational], 1.0);
        assert_eq!(scores[Intent::Informational], 0.0);
        assert!(!contains_any("anything", &["", "  "]));
    }

    #[test]
    fn matching_ignores_case() {
        let scores = score_from_modifiers("BUY iPhone", &ModifierLexicon::default());
        assert_eq!(scores[Intent::Transactional], 1.0);
    }
}
