use std::fmt;

use serde::{Deserialize, Serialize};

use crate::intent::{Intent, ScoreVector};

const EPSILON: f64 = 1e-6;
/// Normalized entropy above which a keyword is reported as mixed.
pub const MIXED_ENTROPY_THRESHOLD: f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Branching {
    Clear,
    #[serde(rename = "Mixed Intent")]
    MixedIntent,
    /// The keyword could not be evaluated; scores are zeroed.
    Error,
}

impl Branching {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::MixedIntent => "Mixed Intent",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for Branching {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub primary: Intent,
    pub secondary: Intent,
    /// 0-100, one decimal.
    pub confidence: f64,
    pub branching: Branching,
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Turns a fused score vector into a labeled verdict.
///
/// Confidence combines how peaked the distribution is (one minus normalized
/// entropy) with the relative gap between the top two intents.
pub fn derive_verdict(scores: &ScoreVector) -> Verdict {
    let total = scores.total() + EPSILON;
    let probs = *scores * (1.0 / total);

    let primary = probs.argmax();
    let secondary = probs.argmax_excluding(Some(primary));
    let top1 = probs[primary];
    let top2 = probs[secondary];
    let margin = (top1 - top2) / (top1 + top2 + EPSILON);

    let intents = Intent::ALL.len() as f64;
    let entropy = -probs
        .iter()
        .map(|(_, p)| p * (p + EPSILON).ln())
        .sum::<f64>()
        / intents.ln();

    let confidence = round1((1.0 - entropy).max(0.0) * margin * 100.0).clamp(0.0, 100.0);
    let branching = if entropy > MIXED_ENTROPY_THRESHOLD {
        Branching::MixedIntent
    } else {
        Branching::Clear
    };

    Verdict {
        primary,
        secondary,
        confidence,
        branching,
    }
}
