//! Cross-brand "how do I use X with Y" detection.
//!
//! Queries pairing two ecosystems are usually looking for setup instructions,
//! even when they read like navigational or transactional searches.

use std::collections::HashSet;

pub const INTEGRATION_VERBS: &[&str] = &[
    "connect",
    "pair",
    "link",
    "use",
    "enable",
    "setup",
    "set up",
    "add",
    "integrate",
    "bridge",
    "work with",
    "works with",
];

pub const BRAND_LEXICON: &[&str] = &[
    "alexa",
    "amazon",
    "apple",
    "homekit",
    "siri",
    "homepod",
    "google",
    "nest",
    "assistant",
    "smartthings",
    "ikea",
    "philips hue",
];

/// Minimum number of distinct brands for a text set to count as cross-brand.
pub const BRAND_PAIR_THRESHOLD: usize = 2;

/// Counts distinct brands mentioned anywhere across `texts`.
pub fn count_brands<I, S>(texts: I) -> usize
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    for text in texts {
        let lowered = text.as_ref().to_lowercase();
        for brand in BRAND_LEXICON {
            if lowered.contains(brand) {
                seen.insert(*brand);
            }
        }
    }
    seen.len()
}

pub fn is_cross_brand<I, S>(texts: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    count_brands(texts) >= BRAND_PAIR_THRESHOLD
}

/// Substring test against [`INTEGRATION_VERBS`]; `text` may be any case.
pub fn mentions_integration(text: &str) -> bool {
    let lowered = text.to_lowercase();
    INTEGRATION_VERBS.iter().any(|verb| lowered.contains(verb))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_each_brand_once_across_texts() {
        assert_eq!(count_brands(["Alexa and Google", "alexa again"]), 2);
        assert_eq!(count_brands(["nothing branded here"]), 0);
        assert!(is_cross_brand(["how to connect alexa with google home"]));
        assert!(!is_cross_brand(["philips hue bulbs"]));
    }

    #[test]
    fn brand_matching_is_substring_based() {
        // "amazon" and "alexa" are both present in the one word below
        assert_eq!(count_brands(["amazonalexa"]), 2);
    }

    #[test]
    fn integration_verbs_match_inside_words() {
        assert!(mentions_integration("Set Up HomeKit"));
        assert!(mentions_integration("useful tips"));
        assert!(!mentions_integration("buy iphone 15"));
    }
}
