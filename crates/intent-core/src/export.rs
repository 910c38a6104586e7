//! CSV export and re-import of batch results.
//!
//! Structured columns (URLs, scores, notes) hold a single JSON document per
//! cell so a row survives a trip through spreadsheet tools.

use std::io::{Read, Write};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use time::{macros::format_description, OffsetDateTime};

use crate::{
    intent::{Intent, ScoreVector},
    llm::{IntentResult, LlmBatchRow, RowStatus},
    pipeline::{AnalysisNotes, AnalysisResult},
    rules::LabelScores,
    verdict::Branching,
};

const EMPTY_OBJECT: &str = "{}";
const ERROR_LABEL: &str = "Error";
const FAILURE_PREFIX: &str = "Analysis failed: ";

#[derive(Debug, Serialize, Deserialize)]
struct AnalysisRecord {
    keyword: String,
    primary_intent: String,
    secondary_intent: String,
    confidence_pct: f64,
    branching: String,
    top_urls: String,
    scores: String,
    notes: String,
    clf_scores: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct LlmRecord {
    keyword: String,
    primary_intent: String,
    secondary_intent: String,
    confidence_pct: f64,
    reasoning: String,
    scores: String,
    status: String,
}

/// `<prefix>_YYYYMMDD_HHMMSS.csv`
pub fn default_export_name(prefix: &str, now: OffsetDateTime) -> Result<String> {
    let stamp = now
        .format(format_description!(
            "[year][month][day]_[hour][minute][second]"
        ))
        .context("failed to format export timestamp")?;
    Ok(format!("{prefix}_{stamp}.csv"))
}

fn intent_cell(intent: Option<Intent>) -> String {
    intent.map(|intent| intent.label().to_string()).unwrap_or_default()
}

fn parse_intent_cell(cell: &str) -> Result<Option<Intent>> {
    let cell = cell.trim();
    if cell.is_empty() || cell == ERROR_LABEL {
        return Ok(None);
    }
    Ok(Some(cell.parse()?))
}

fn parse_branching(cell: &str) -> Result<Branching> {
    [Branching::Clear, Branching::MixedIntent, Branching::Error]
        .into_iter()
        .find(|branching| branching.label() == cell.trim())
        .ok_or_else(|| anyhow!("unknown branching label `{cell}`"))
}

fn json_cell<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).context("failed to encode JSON cell")
}

fn from_json_cell<T: for<'de> Deserialize<'de>>(column: &str, cell: &str) -> Result<T> {
    serde_json::from_str(cell).with_context(|| format!("invalid JSON in `{column}` column"))
}

impl AnalysisRecord {
    fn from_result(result: &AnalysisResult) -> Result<Self> {
        Ok(Self {
            keyword: result.keyword.clone(),
            primary_intent: intent_cell(result.primary_intent),
            secondary_intent: intent_cell(result.secondary_intent),
            confidence_pct: result.confidence_pct,
            branching: result.branching.label().to_string(),
            top_urls: json_cell(&result.top_urls)?,
            scores: json_cell(&result.scores)?,
            notes: json_cell(&result.notes)?,
            clf_scores: match &result.auxiliary_scores {
                Some(scores) => json_cell(scores)?,
                None => EMPTY_OBJECT.to_string(),
            },
        })
    }

    fn into_result(self) -> Result<AnalysisResult> {
        let clf = self.clf_scores.trim();
        let auxiliary_scores = if clf.is_empty() || clf == EMPTY_OBJECT {
            None
        } else {
            Some(from_json_cell::<LabelScores>("clf_scores", clf)?)
        };

        Ok(AnalysisResult {
            primary_intent: parse_intent_cell(&self.primary_intent)?,
            secondary_intent: parse_intent_cell(&self.secondary_intent)?,
            confidence_pct: self.confidence_pct,
            branching: parse_branching(&self.branching)?,
            top_urls: from_json_cell("top_urls", &self.top_urls)?,
            scores: from_json_cell::<ScoreVector>("scores", &self.scores)?,
            notes: from_json_cell::<AnalysisNotes>("notes", &self.notes)?,
            auxiliary_scores,
            keyword: self.keyword,
        })
    }
}

impl LlmRecord {
    fn from_row(row: &LlmBatchRow) -> Result<Self> {
        let label = |intent: Option<Intent>| {
            intent.map_or_else(|| ERROR_LABEL.to_string(), |intent| intent.label().to_string())
        };
        Ok(Self {
            keyword: row.keyword().to_string(),
            primary_intent: label(row.primary_intent()),
            secondary_intent: label(row.secondary_intent()),
            confidence_pct: row.confidence(),
            reasoning: row.reasoning(),
            scores: json_cell(&row.scores())?,
            status: row.status().label().to_string(),
        })
    }

    fn into_row(self) -> Result<LlmBatchRow> {
        match self.status.trim() {
            status if status == RowStatus::Success.label() => {
                let primary = parse_intent_cell(&self.primary_intent)?
                    .ok_or_else(|| anyhow!("successful row `{}` has no primary intent", self.keyword))?;
                let secondary = parse_intent_cell(&self.secondary_intent)?
                    .ok_or_else(|| anyhow!("successful row `{}` has no secondary intent", self.keyword))?;
                Ok(LlmBatchRow::Success {
                    result: IntentResult {
                        primary_intent: primary,
                        secondary_intent: secondary,
                        confidence: self.confidence_pct,
                        reasoning: self.reasoning,
                        all_scores: from_json_cell("scores", &self.scores)?,
                    },
                    keyword: self.keyword,
                })
            }
            status if status == RowStatus::Error.label() => Ok(LlmBatchRow::Error {
                message: self
                    .reasoning
                    .strip_prefix(FAILURE_PREFIX)
                    .unwrap_or(&self.reasoning)
                    .to_string(),
                keyword: self.keyword,
            }),
            other => Err(anyhow!("unknown row status `{other}`")),
        }
    }
}

pub fn write_analysis_csv<W: Write>(writer: W, results: &[AnalysisResult]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for result in results {
        csv.serialize(AnalysisRecord::from_result(result)?)
            .with_context(|| format!("failed to write row for `{}`", result.keyword))?;
    }
    csv.flush().context("failed to flush CSV export")?;
    Ok(())
}

pub fn read_analysis_csv<R: Read>(reader: R) -> Result<Vec<AnalysisResult>> {
    let mut csv = csv::Reader::from_reader(reader);
    csv.deserialize::<AnalysisRecord>()
        .enumerate()
        .map(|(index, record)| {
            record
                .with_context(|| format!("failed to read CSV record {}", index + 1))?
                .into_result()
        })
        .collect()
}

pub fn write_llm_csv<W: Write>(writer: W, rows: &[LlmBatchRow]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in rows {
        csv.serialize(LlmRecord::from_row(row)?)
            .with_context(|| format!("failed to write row for `{}`", row.keyword()))?;
    }
    csv.flush().context("failed to flush CSV export")?;
    Ok(())
}

pub fn read_llm_csv<R: Read>(reader: R) -> Result<Vec<LlmBatchRow>> {
    let mut csv = csv::Reader::from_reader(reader);
    csv.deserialize::<LlmRecord>()
        .enumerate()
        .map(|(index, record)| {
            record
                .with_context(|| format!("failed to read CSV record {}", index + 1))?
                .into_row()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use time::macros::datetime;

    use super::*;
    use crate::llm::fallback_analysis;

    fn success_row() -> AnalysisResult {
        let mut scores = ScoreVector::zero();
        scores.set(Intent::CommercialInvestigation, 1.25);
        scores.set(Intent::Informational, 0.5);
        AnalysisResult {
            keyword: "best robot vacuum, 2024".to_string(),
            primary_intent: Some(Intent::CommercialInvestigation),
            secondary_intent: Some(Intent::Informational),
            confidence_pct: 41.7,
            branching: Branching::Clear,
            top_urls: vec!["https://www.rtings.com/vacuum".to_string()],
            scores,
            notes: AnalysisNotes::Pages(Vec::new()),
            auxiliary_scores: None,
        }
    }

    #[test]
    fn error_row_layout() {
        let mut buffer = Vec::new();
        write_analysis_csv(
            &mut buffer,
            &[AnalysisResult::failed("offline query", "search failed")],
        )
        .unwrap();
        let output = String::from_utf8(buffer).unwrap();
        insta::assert_snapshot!(output.trim_end(), @r###"
keyword,primary_intent,secondary_intent,confidence_pct,branching,top_urls,scores,notes,clf_scores
offline query,,,0.0,Error,[],"{""Informational"":0.0,""Transactional"":0.0,""Navigational"":0.0,""Commercial Investigation"":0.0}","{""error"":""search failed""}",{}
"###);
    }

    #[test]
    fn analysis_rows_survive_a_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let rows = vec![success_row(), AnalysisResult::failed("broken", "timed out")];

        write_analysis_csv(File::create(&path).unwrap(), &rows).unwrap();
        let restored = read_analysis_csv(File::open(&path).unwrap()).unwrap();

        assert_eq!(restored.len(), 2);
        assert_eq!(restored[0].keyword, "best robot vacuum, 2024");
        assert_eq!(
            restored[0].primary_intent,
            Some(Intent::CommercialInvestigation)
        );
        assert_eq!(restored[0].confidence_pct, 41.7);
        assert_eq!(restored[0].top_urls, rows[0].top_urls);
        assert!(restored[0].auxiliary_scores.is_none());
        assert!(restored[1].is_error());
        assert_eq!(
            restored[1].notes,
            AnalysisNotes::Error {
                error: "timed out".to_string()
            }
        );
    }

    #[test]
    fn llm_rows_survive_a_round_trip() {
        let rows = vec![
            LlmBatchRow::Success {
                keyword: "best laptops 2024".to_string(),
                result: fallback_analysis("best laptops 2024", None),
            },
            LlmBatchRow::Error {
                keyword: "   ".to_string(),
                message: "query cannot be empty".to_string(),
            },
        ];
        let mut buffer = Vec::new();
        write_llm_csv(&mut buffer, &rows).unwrap();

        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.starts_with(
            "keyword,primary_intent,secondary_intent,confidence_pct,reasoning,scores,status\n"
        ));
        assert!(text.contains(",Error,Error,0.0,Analysis failed: query cannot be empty,"));

        let restored = read_llm_csv(buffer.as_slice()).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored[0].keyword(), "best laptops 2024");
        assert_eq!(
            restored[0].primary_intent(),
            Some(Intent::CommercialInvestigation)
        );
        assert_eq!(restored[0].confidence(), 60.0);
        assert_eq!(restored[1].status(), RowStatus::Error);
        assert_eq!(restored[1], rows[1]);
    }

    #[test]
    fn unknown_labels_are_rejected_on_import() {
        let csv = "keyword,primary_intent,secondary_intent,confidence_pct,reasoning,scores,status\n\
                   q,Local,Informational,50.0,r,{},Success\n";
        assert!(read_llm_csv(csv.as_bytes()).is_err());
    }

    #[test]
    fn export_name_carries_timestamp() {
        let name = default_export_name("intent_results", datetime!(2024-03-05 14:07:09 UTC)).unwrap();
        assert_eq!(name, "intent_results_20240305_140709.csv");
    }
}
