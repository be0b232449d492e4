//! JSON export.
//!
//! Two shapes are produced from a [`Report`]:
//!
//! - [`ExportedVerdict`], the compact verdict object:
//!   `{verdict, confidence, bias_type, domain_credibility: {score, label}, explanation}`
//!   with `confidence` as a whole percentage
//! - [`ReportFile`], the same fields plus the report context, which is what
//!   [`write_report`] puts on disk
//!
//! # Output Path
//!
//! `{json_output_dir}/{YYYY-MM-DD}/{HHMMSSmmm}_{slug}.json`

use super::{report_stem, write_new_file};
use crate::models::{BiasLabel, Call, CredibilityLabel, ExtractionMethod, Report, Verdict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainCredibility {
    pub score: u8,
    pub label: CredibilityLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedVerdict {
    pub verdict: Call,
    /// Whole percent, 0-100.
    pub confidence: u8,
    pub bias_type: BiasLabel,
    pub domain_credibility: DomainCredibility,
    pub explanation: String,
}

impl From<&Verdict> for ExportedVerdict {
    fn from(verdict: &Verdict) -> Self {
        Self {
            verdict: verdict.call,
            confidence: verdict.confidence_percent(),
            bias_type: verdict.bias.label,
            domain_credibility: DomainCredibility {
                score: verdict.credibility.score,
                label: verdict.credibility.label,
            },
            explanation: verdict.explanation.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportFile {
    #[serde(flatten)]
    pub verdict: ExportedVerdict,
    pub source_url: Option<String>,
    pub title: Option<String>,
    pub extraction_method: ExtractionMethod,
    pub word_count: usize,
    pub analyzed_at: DateTime<Utc>,
    pub matched_terms: Vec<String>,
    pub domain: String,
}

impl From<&Report> for ReportFile {
    fn from(report: &Report) -> Self {
        Self {
            verdict: ExportedVerdict::from(&report.verdict),
            source_url: report.source_url.clone(),
            title: report.title.clone(),
            extraction_method: report.extraction_method,
            word_count: report.word_count,
            analyzed_at: report.analyzed_at,
            matched_terms: report.verdict.bias.matched_terms.clone(),
            domain: report.verdict.credibility.domain.clone(),
        }
    }
}

/// The compact verdict object as a JSON string.
pub fn verdict_json(verdict: &Verdict) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&ExportedVerdict::from(verdict))
}

/// Write `report` as JSON under `json_output_dir` and return the file path.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_report(report: &Report, json_output_dir: &str) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(&ReportFile::from(report))?;
    let (date, stem) = report_stem(report);

    let full_json_dir = PathBuf::from(json_output_dir).join(&date);
    info!(dir = %full_json_dir.display(), "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&full_json_dir).await {
        error!(dir = %full_json_dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = write_new_file(&full_json_dir, &stem, "json", json.as_bytes()).await?;
    info!(path = %path.display(), "Wrote JSON report");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outputs::fixtures;
    use serde_json::{Value, json};

    #[test]
    fn test_exported_verdict_shape() {
        let report = fixtures::report();
        let value: Value = serde_json::from_str(&verdict_json(&report.verdict).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "verdict": "REAL",
                "confidence": 87,
                "bias_type": "Sensational",
                "domain_credibility": {"score": 95, "label": "High"},
                "explanation": "Figures match the published budget."
            })
        );
    }

    #[tokio::test]
    async fn test_write_report_path_and_contents() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        let report = fixtures::report();

        let path = write_report(&report, root).await.unwrap();

        assert_eq!(
            path,
            dir.path()
                .join("2025-05-06")
                .join("142501000_city-council-approves-budget.json")
        );
        let value: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["verdict"], "REAL");
        assert_eq!(value["confidence"], 87);
        assert_eq!(value["extraction_method"], "structured_data");
        assert_eq!(value["word_count"], 412);
        assert_eq!(value["domain"], "reuters.com");
        assert_eq!(value["matched_terms"], json!(["allegedly", "allegedly", "outrageous"]));
        assert_eq!(value["analyzed_at"], "2025-05-06T14:25:01Z");

        let parsed: ReportFile = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, ReportFile::from(&report));
    }

    #[tokio::test]
    async fn test_same_instant_reports_both_kept() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        let report = fixtures::report();

        let first = write_report(&report, root).await.unwrap();
        let second = write_report(&report, root).await.unwrap();

        assert_ne!(first, second);
        assert!(first.exists() && second.exists());
        assert_eq!(
            second.file_name().unwrap(),
            "142501000_city-council-approves-budget-2.json"
        );
    }
}
