//! Filtering and roll-ups over finished batches.

use std::{cmp::Ordering, collections::BTreeMap};

use serde::Serialize;

use crate::{
    intent::Intent,
    llm::LlmBatchRow,
    pipeline::AnalysisResult,
    verdict::{round1, Branching},
};

/// Common view over hybrid and LLM rows.
pub trait ReportRow {
    fn keyword(&self) -> &str;
    fn primary_intent(&self) -> Option<Intent>;
    fn confidence(&self) -> f64;
    /// `None` when the pipeline does not classify branching.
    fn branching(&self) -> Option<Branching>;
    fn succeeded(&self) -> bool;
}

impl ReportRow for AnalysisResult {
    fn keyword(&self) -> &str {
        &self.keyword
    }

    fn primary_intent(&self) -> Option<Intent> {
        self.primary_intent
    }

    fn confidence(&self) -> f64 {
        self.confidence_pct
    }

    fn branching(&self) -> Option<Branching> {
        Some(self.branching)
    }

    fn succeeded(&self) -> bool {
        !self.is_error()
    }
}

impl ReportRow for LlmBatchRow {
    fn keyword(&self) -> &str {
        LlmBatchRow::keyword(self)
    }

    fn primary_intent(&self) -> Option<Intent> {
        LlmBatchRow::primary_intent(self)
    }

    fn confidence(&self) -> f64 {
        LlmBatchRow::confidence(self)
    }

    fn branching(&self) -> Option<Branching> {
        None
    }

    fn succeeded(&self) -> bool {
        matches!(self, LlmBatchRow::Success { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultFilter {
    /// Empty means every intent; otherwise rows without an intent never match.
    pub intents: Vec<Intent>,
    pub min_confidence: f64,
    pub search_text: String,
}

impl ResultFilter {
    pub fn matches<R: ReportRow + ?Sized>(&self, row: &R) -> bool {
        if !self.intents.is_empty() {
            match row.primary_intent() {
                Some(intent) if self.intents.contains(&intent) => {}
                _ => return false,
            }
        }
        if row.confidence() < self.min_confidence {
            return false;
        }
        let needle = self.search_text.trim().to_lowercase();
        needle.is_empty() || row.keyword().to_lowercase().contains(&needle)
    }

    pub fn apply<'a, R: ReportRow>(&self, rows: &'a [R]) -> Vec<&'a R> {
        rows.iter().filter(|row| self.matches(*row)).collect()
    }
}

/// Highest confidence first, then by intent.
pub fn sort_for_display<R: ReportRow>(rows: &mut [&R]) {
    rows.sort_by(|a, b| {
        b.confidence()
            .partial_cmp(&a.confidence())
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.primary_intent().cmp(&b.primary_intent()))
    });
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOverview {
    pub keywords: usize,
    pub average_confidence: Option<f64>,
    pub mixed: usize,
    pub clear: usize,
    pub distribution: BTreeMap<Intent, usize>,
}

impl BatchOverview {
    pub fn from_rows<R: ReportRow>(rows: &[&R]) -> Self {
        let keywords = rows.len();
        let average_confidence = (keywords > 0).then(|| {
            round1(rows.iter().map(|row| row.confidence()).sum::<f64>() / keywords as f64)
        });
        let count_branching = |wanted: Branching| {
            rows.iter()
                .filter(|row| row.branching() == Some(wanted))
                .count()
        };

        let mut distribution = BTreeMap::new();
        for intent in rows.iter().filter_map(|row| row.primary_intent()) {
            *distribution.entry(intent).or_insert(0) += 1;
        }

        Self {
            keywords,
            average_confidence,
            mixed: count_branching(Branching::MixedIntent),
            clear: count_branching(Branching::Clear),
            distribution,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntentSummary {
    pub intent: Intent,
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

/// Per-intent confidence statistics over successful rows only.
pub fn summarize<R: ReportRow>(rows: &[R]) -> Vec<IntentSummary> {
    let mut groups: BTreeMap<Intent, Vec<f64>> = BTreeMap::new();
    for row in rows.iter().filter(|row| row.succeeded()) {
        if let Some(intent) = row.primary_intent() {
            groups.entry(intent).or_default().push(row.confidence());
        }
    }

    groups
        .into_iter()
        .map(|(intent, values)| {
            let count = values.len();
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            IntentSummary {
                intent,
                average: round1(values.iter().sum::<f64>() / count as f64),
                min: round1(min),
                max: round1(max),
                count,
            }
        })
        .collect()
}
