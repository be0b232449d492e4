//! Local analysis history.
//!
//! Every finished [`Report`] is appended as one JSON line to
//! `{history_dir}/history.jsonl`. Records are keyed by `(source_url,
//! analyzed_at)`; re-analyzing a URL adds a new record rather than replacing
//! the old one.
//!
//! [`stats`] summarizes the whole file: how many analyses, of how many
//! distinct URLs and article texts, how the calls and bias labels split.

use crate::models::{BiasLabel, Call, Report};
use crate::pipeline::validate_url;
use itertools::Itertools;
use std::collections::HashSet;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument, warn};

const HISTORY_FILE: &str = "history.jsonl";

pub fn history_path(history_dir: &str) -> PathBuf {
    Path::new(history_dir).join(HISTORY_FILE)
}

/// Append `report` to the history file, creating it if needed.
#[instrument(level = "info", skip_all, fields(%history_dir))]
pub async fn append(report: &Report, history_dir: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(history_dir).await?;
    let mut line = serde_json::to_string(report)?;
    line.push('\n');

    let path = history_path(history_dir);
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await?;
    info!(path = %path.display(), "Appended to history");
    Ok(())
}

/// Every stored report, oldest first. Unreadable lines are skipped.
#[instrument(level = "debug", skip_all, fields(%history_dir))]
pub async fn load(history_dir: &str) -> Result<Vec<Report>, Box<dyn Error>> {
    let path = history_path(history_dir);
    let contents = match fs::read_to_string(&path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut reports = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Report>(line) {
            Ok(report) => reports.push(report),
            Err(e) => warn!(line = index + 1, error = %e, "Skipping unreadable history line"),
        }
    }
    Ok(reports)
}

/// Stored reports, newest first, optionally only those for `url`.
pub async fn query(
    history_dir: &str,
    url: Option<&str>,
    limit: usize,
) -> Result<Vec<Report>, Box<dyn Error>> {
    let wanted = url.map(normalize_url);
    let mut reports = load(history_dir).await?;
    reports.retain(|r| match (&wanted, &r.source_url) {
        (None, _) => true,
        (Some(want), Some(have)) => normalize_url(have) == *want,
        (Some(_), None) => false,
    });
    reports.sort_by(|a, b| b.analyzed_at.cmp(&a.analyzed_at));
    reports.truncate(limit);
    Ok(reports)
}

/// Aggregate figures over every stored analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryStats {
    pub total: usize,
    pub unique_urls: usize,
    /// Distinct article texts by hash. Lines without a hash count by URL.
    pub unique_articles: usize,
    pub real: usize,
    pub fake: usize,
    pub uncertain: usize,
    /// Mean verdict confidence in `[0, 1]`; `None` for an empty history.
    pub average_confidence: Option<f64>,
    /// Most common label first.
    pub bias_distribution: Vec<(BiasLabel, usize)>,
}

/// Statistics over the whole history file.
#[instrument(level = "debug", skip_all, fields(%history_dir))]
pub async fn stats(history_dir: &str) -> Result<HistoryStats, Box<dyn Error>> {
    let reports = load(history_dir).await?;
    Ok(summarize(&reports))
}

fn summarize(reports: &[Report]) -> HistoryStats {
    let unique_urls = reports
        .iter()
        .filter_map(|r| r.source_url.as_deref())
        .map(normalize_url)
        .collect::<HashSet<_>>()
        .len();
    let unique_articles = reports
        .iter()
        .filter_map(|r| {
            r.article_hash
                .clone()
                .or_else(|| r.source_url.as_deref().map(normalize_url))
        })
        .collect::<HashSet<_>>()
        .len();

    let calls = reports.iter().map(|r| r.verdict.call).counts();
    let call_count = |call: Call| calls.get(&call).copied().unwrap_or(0);

    let average_confidence = (!reports.is_empty()).then(|| {
        reports.iter().map(|r| r.verdict.confidence).sum::<f64>() / reports.len() as f64
    });

    let bias_distribution = reports
        .iter()
        .map(|r| r.verdict.bias.label)
        .counts()
        .into_iter()
        .sorted_by(|(a_label, a), (b_label, b)| {
            b.cmp(a).then_with(|| a_label.to_string().cmp(&b_label.to_string()))
        })
        .collect();

    HistoryStats {
        total: reports.len(),
        unique_urls,
        unique_articles,
        real: call_count(Call::Real),
        fake: call_count(Call::Fake),
        uncertain: call_count(Call::Uncertain),
        average_confidence,
        bias_distribution,
    }
}

/// Compare URLs the way they were analyzed: scheme added, trailing slash
/// ignored.
fn normalize_url(input: &str) -> String {
    let url = validate_url(input)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| input.trim().to_string());
    url.trim_end_matches('/').to_string()
}
