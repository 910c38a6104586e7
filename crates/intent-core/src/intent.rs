use std::{
    collections::HashMap,
    fmt,
    ops::{Add, Index, Mul},
    str::FromStr,
};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// The four canonical search intents.
///
/// Declaration order is significant: every tie-break in the crate picks the
/// earliest variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Intent {
    Informational,
    Transactional,
    Navigational,
    #[serde(rename = "Commercial Investigation")]
    CommercialInvestigation,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown intent label `{0}`")]
pub struct UnknownIntent(pub String);

impl Intent {
    pub const ALL: [Intent; 4] = [
        Intent::Informational,
        Intent::Transactional,
        Intent::Navigational,
        Intent::CommercialInvestigation,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Informational => "Informational",
            Self::Transactional => "Transactional",
            Self::Navigational => "Navigational",
            Self::CommercialInvestigation => "Commercial Investigation",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Intent {
    type Err = UnknownIntent;

    /// Accepts canonical labels only; anything else is rejected at the boundary.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Intent::ALL
            .into_iter()
            .find(|intent| intent.label() == value)
            .ok_or_else(|| UnknownIntent(value.to_string()))
    }
}

/// Score per intent. Every intent always has an entry (zero by default).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreVector([f64; 4]);

impl ScoreVector {
    #[must_use]
    pub const fn zero() -> Self {
        Self([0.0; 4])
    }

    pub fn from_fn(mut f: impl FnMut(Intent) -> f64) -> Self {
        let mut scores = Self::zero();
        for intent in Intent::ALL {
            scores.set(intent, f(intent));
        }
        scores
    }

    #[must_use]
    pub fn get(&self, intent: Intent) -> f64 {
        self.0[intent.index()]
    }

    pub fn set(&mut self, intent: Intent, value: f64) {
        self.0[intent.index()] = value;
    }

    pub fn add_to(&mut self, intent: Intent, delta: f64) {
        self.0[intent.index()] += delta;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Intent, f64)> + '_ {
        Intent::ALL.into_iter().map(|intent| (intent, self.get(intent)))
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Highest-scoring intent; the first in declaration order wins ties.
    #[must_use]
    pub fn argmax(&self) -> Intent {
        self.argmax_excluding(None)
    }

    /// Highest-scoring intent other than `excluded`, first in order on ties.
    #[must_use]
    pub fn argmax_excluding(&self, excluded: Option<Intent>) -> Intent {
        let mut candidates = Intent::ALL
            .into_iter()
            .filter(|intent| Some(*intent) != excluded);
        let first = candidates.next().unwrap_or(Intent::Informational);
        candidates.fold(first, |best, intent| {
            if self.get(intent) > self.get(best) {
                intent
            } else {
                best
            }
        })
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|value| *value == 0.0)
    }
}

impl Index<Intent> for ScoreVector {
    type Output = f64;

    fn index(&self, intent: Intent) -> &Self::Output {
        &self.0[intent.index()]
    }
}

impl Add for ScoreVector {
    type Output = ScoreVector;

    fn add(self, rhs: ScoreVector) -> Self::Output {
        ScoreVector::from_fn(|intent| self.get(intent) + rhs.get(intent))
    }
}

impl Mul<f64> for ScoreVector {
    type Output = ScoreVector;

    fn mul(self, factor: f64) -> Self::Output {
        ScoreVector::from_fn(|intent| self.get(intent) * factor)
    }
}

impl Serialize for ScoreVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter().map(|(intent, value)| (intent.label(), value)))
    }
}

impl<'de> Deserialize<'de> for ScoreVector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = HashMap::<String, f64>::deserialize(deserializer)?;
        let mut scores = ScoreVector::zero();
        for (label, value) in raw {
            let intent = label.parse::<Intent>().map_err(de::Error::custom)?;
            scores.set(intent, value);
        }
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_from_str() {
        for intent in Intent::ALL {
            assert_eq!(intent.label().parse::<Intent>(), Ok(intent));
        }
        assert!("informational".parse::<Intent>().is_err());
        assert!("Problem Solving".parse::<Intent>().is_err());
    }

    #[test]
    fn argmax_prefers_declaration_order_on_ties() {
        let tied = ScoreVector::from_fn(|_| 1.0);
        assert_eq!(tied.argmax(), Intent::Informational);
        assert_eq!(
            tied.argmax_excluding(Some(Intent::Informational)),
            Intent::Transactional
        );

        let mut scores = ScoreVector::zero();
        scores.set(Intent::Navigational, 2.0);
        scores.set(Intent::CommercialInvestigation, 2.0);
        assert_eq!(scores.argmax(), Intent::Navigational);
        assert_eq!(
            scores.argmax_excluding(Some(Intent::Navigational)),
            Intent::CommercialInvestigation
        );
    }

    #[test]
    fn serializes_every_intent_in_order() {
        let mut scores = ScoreVector::zero();
        scores.add_to(Intent::Transactional, 0.5);
        let json = serde_json::to_string(&scores).unwrap();
        assert_eq!(
            json,
            r#"{"Informational":0.0,"Transactional":0.5,"Navigational":0.0,"Commercial Investigation":0.0}"#
        );
    }

    #[test]
    fn deserializes_partial_maps_and_rejects_unknown_labels() {
        let scores: ScoreVector = serde_json::from_str(r#"{"Navigational": 3.5}"#).unwrap();
        assert_eq!(scores[Intent::Navigational], 3.5);
        assert_eq!(scores[Intent::Informational], 0.0);

        let error = serde_json::from_str::<ScoreVector>(r#"{"Problem Solving": 1.0}"#);
        assert!(error.is_err());
    }

    #[test]
    fn arithmetic_is_per_intent() {
        let a = ScoreVector::from_fn(|_| 1.0);
        let b = ScoreVector::from_fn(|intent| if intent == Intent::Navigational { 2.0 } else { 0.0 });
        let sum = a + b * 0.5;
        assert_eq!(sum[Intent::Navigational], 2.0);
        assert_eq!(sum[Intent::Informational], 1.0);
        assert_eq!(sum.total(), 5.0);
    }
}
