use serde::{Deserialize, Serialize};

use crate::intent::ScoreVector;

/// Signal weights, each expressed as a percentage (0-100).
///
/// The three base weights are independent and need not sum to 100, which lets
/// a caller over- or under-weight the whole base blend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionWeights {
    pub serp: f64,
    pub rules: f64,
    pub pages: f64,
    /// Share given to the auxiliary classifier when its vector is present.
    pub classifier: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            serp: 25.0,
            rules: 20.0,
            pages: 25.0,
            classifier: 30.0,
        }
    }
}

impl FusionWeights {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> {
        [
            ("serp", self.serp),
            ("rules", self.rules),
            ("pages", self.pages),
            ("classifier", self.classifier),
        ]
        .into_iter()
    }
}

/// Linear blend of the signal vectors. No normalization happens here.
pub fn combine(
    serp: &ScoreVector,
    rules: &ScoreVector,
    pages: &ScoreVector,
    weights: &FusionWeights,
    auxiliary: Option<&ScoreVector>,
) -> ScoreVector {
    let base = *serp * (weights.serp / 100.0)
        + *rules * (weights.rules / 100.0)
        + *pages * (weights.pages / 100.0);

    match auxiliary {
        Some(aux) => {
            let share = weights.classifier / 100.0;
            base * (1.0 - share) + *aux * share
        }
        None => base,
    }
}
