//! Auxiliary rule classifier over result URLs and titles.
//!
//! Works on a finer five-label partition than the rest of the crate; the
//! output is folded back onto [`Intent`] with [`RuleClassification::canonical`].

use std::{collections::HashMap, fmt, ops::Index};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::intent::{Intent, ScoreVector};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleLabel {
    Informational,
    ProblemSolving,
    Commercial,
    Transactional,
    Navigational,
}

impl RuleLabel {
    pub const ALL: [RuleLabel; 5] = [
        RuleLabel::Informational,
        RuleLabel::ProblemSolving,
        RuleLabel::Commercial,
        RuleLabel::Transactional,
        RuleLabel::Navigational,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Informational => "informational",
            Self::ProblemSolving => "problem_solving",
            Self::Commercial => "commercial",
            Self::Transactional => "transactional",
            Self::Navigational => "navigational",
        }
    }

    /// Canonical intent this label folds into.
    #[must_use]
    pub fn canonical(self) -> Intent {
        match self {
            Self::Informational | Self::ProblemSolving => Intent::Informational,
            Self::Commercial => Intent::CommercialInvestigation,
            Self::Transactional => Intent::Transactional,
            Self::Navigational => Intent::Navigational,
        }
    }
}

impl fmt::Display for RuleLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LabelScores([f64; 5]);

impl LabelScores {
    #[must_use]
    pub fn get(&self, label: RuleLabel) -> f64 {
        self.0[label as usize]
    }

    fn add_to(&mut self, label: RuleLabel, delta: f64) {
        self.0[label as usize] += delta;
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RuleLabel, f64)> + '_ {
        RuleLabel::ALL.into_iter().map(|label| (label, self.get(label)))
    }

    /// First maximum in label order.
    #[must_use]
    pub fn argmax(&self) -> RuleLabel {
        RuleLabel::ALL
            .into_iter()
            .fold(RuleLabel::Informational, |best, label| {
                if self.get(label) > self.get(best) {
                    label
                } else {
                    best
                }
            })
    }

    /// Rescales to percentages; an all-zero vector stays zero.
    #[must_use]
    pub fn to_percentages(&self) -> LabelScores {
        let total = self.total();
        if total > 0.0 {
            LabelScores(self.0.map(|value| value / total * 100.0))
        } else {
            LabelScores::default()
        }
    }
}

impl Index<RuleLabel> for LabelScores {
    type Output = f64;

    fn index(&self, label: RuleLabel) -> &Self::Output {
        &self.0[label as usize]
    }
}

impl Serialize for LabelScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter().map(|(label, value)| (label.as_str(), value)))
    }
}

impl<'de> Deserialize<'de> for LabelScores {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = HashMap::<RuleLabel, f64>::deserialize(deserializer)?;
        let mut scores = LabelScores::default();
        for (label, value) in raw {
            scores.0[label as usize] = value;
        }
        Ok(scores)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UrlFeatures {
    pub reddit: bool,
    pub github: bool,
    pub youtube: bool,
    pub wikipedia: bool,
    pub blog: bool,
    pub ecommerce: bool,
    pub comparison: bool,
    pub tutorial: bool,
}

/// Domain categories are exclusive per URL (first match wins); path
/// patterns are tested independently.
pub fn extract_url_features<S: AsRef<str>>(urls: &[S]) -> UrlFeatures {
    let mut features = UrlFeatures::default();
    for url in urls {
        let url = url.as_ref().to_lowercase();
        if url.contains("reddit.com") {
            features.reddit = true;
        } else if url.contains("github.com") {
            features.github = true;
        } else if url.contains("youtube.com") {
            features.youtube = true;
        } else if url.contains("wikipedia.org") {
            features.wikipedia = true;
        } else if ["blog", "medium", "hashnode"].iter().any(|m| url.contains(m)) {
            features.blog = true;
        } else if ["amazon", "shop", "store", "ebay"].iter().any(|m| url.contains(m)) {
            features.ecommerce = true;
        }

        if url.contains("comparison") || url.contains("vs") {
            features.comparison = true;
        }
        if ["how-to", "tutorial", "guide"].iter().any(|m| url.contains(m)) {
            features.tutorial = true;
        }
    }
    features
}

const PROBLEM_KEYWORDS: &[&str] = &[
    "how to", "can i", "error", "fix", "solve", "issue", "guide", "tutorial",
];
const COMPARISON_KEYWORDS: &[&str] = &["vs", "comparison", "best", "vs.", "compared to"];
const INFO_KEYWORDS: &[&str] = &["what is", "explain", "overview", "introduction", "definition"];

/// Word boundaries are only anchored on word characters, so `vs.` matches
/// `a vs. b` as a whole phrase.
#[allow(clippy::expect_used)]
fn phrase_regex(phrase: &str) -> Regex {
    let starts_word = phrase.chars().next().is_some_and(|c| c.is_alphanumeric() || c == '_');
    let ends_word = phrase.chars().last().is_some_and(|c| c.is_alphanumeric() || c == '_');
    let pattern = format!(
        "{}{}{}",
        if starts_word { r"\b" } else { "" },
        regex::escape(phrase),
        if ends_word { r"\b" } else { "" },
    );
    Regex::new(&pattern).expect("escaped phrase is a valid regex")
}

static TITLE_PATTERNS: Lazy<Vec<(RuleLabel, Regex)>> = Lazy::new(|| {
    let groups: [(RuleLabel, &[&str]); 3] = [
        (RuleLabel::ProblemSolving, PROBLEM_KEYWORDS),
        (RuleLabel::Commercial, COMPARISON_KEYWORDS),
        (RuleLabel::Informational, INFO_KEYWORDS),
    ];
    groups
        .into_iter()
        .flat_map(|(label, phrases)| phrases.iter().map(move |phrase| (label, phrase_regex(phrase))))
        .collect()
});

/// Whole-phrase occurrence counts per label across all titles.
pub fn title_phrase_counts<S: AsRef<str>>(titles: &[S]) -> HashMap<RuleLabel, usize> {
    let text = titles
        .iter()
        .map(AsRef::<str>::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let mut counts = HashMap::new();
    for (label, pattern) in TITLE_PATTERNS.iter() {
        let hits = pattern.find_iter(&text).count();
        if hits > 0 {
            *counts.entry(*label).or_insert(0) += hits;
        }
    }
    counts
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleClassification {
    pub primary: RuleLabel,
    /// Unnormalized label scores.
    pub raw: LabelScores,
    /// Label scores as percentages of the total (0-100).
    pub normalized: LabelScores,
}

impl RuleClassification {
    /// Folds the five labels onto the canonical intents, renormalized to sum to 1.
    #[must_use]
    pub fn canonical(&self) -> ScoreVector {
        let mut folded = ScoreVector::zero();
        for (label, value) in self.normalized.iter() {
            folded.add_to(label.canonical(), value / 100.0);
        }
        let total = folded.total();
        let divisor = if total > 0.0 { total } else { 1.0 };
        folded * (1.0 / divisor)
    }
}

pub fn classify<U: AsRef<str>, T: AsRef<str>>(urls: &[U], titles: &[T]) -> RuleClassification {
    let mut raw = LabelScores::default();
    let features = extract_url_features(urls);

    if features.reddit || features.github {
        raw.add_to(RuleLabel::ProblemSolving, 3.0);
    }
    if features.blog || features.wikipedia {
        raw.add_to(RuleLabel::Informational, 2.0);
    }
    if features.youtube {
        raw.add_to(RuleLabel::ProblemSolving, 1.0);
        raw.add_to(RuleLabel::Informational, 1.0);
    }
    if features.ecommerce {
        raw.add_to(RuleLabel::Transactional, 3.0);
    }
    if features.comparison {
        raw.add_to(RuleLabel::Commercial, 3.0);
    }
    if features.tutorial {
        raw.add_to(RuleLabel::ProblemSolving, 2.0);
    }

    for (label, hits) in title_phrase_counts(titles) {
        raw.add_to(label, hits as f64 * 2.0);
    }

    RuleClassification {
        primary: raw.argmax(),
        normalized: raw.to_percentages(),
        raw,
    }
}
