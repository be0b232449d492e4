//! Human-readable Markdown report.
//!
//! # Output Path
//!
//! `{markdown_output_dir}/{YYYY-MM-DD}_{HHMMSSmmm}_{slug}.md`

use super::{report_stem, write_new_file};
use crate::models::{Call, Report};
use itertools::Itertools;
use std::error::Error;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Render `report` as a Markdown document.
pub fn render_report(report: &Report) -> Result<String, std::fmt::Error> {
    let verdict = &report.verdict;
    let mut md = String::new();

    writeln!(
        md,
        "# {}\n",
        report.title.as_deref().unwrap_or("Article analysis")
    )?;
    if let Some(ref url) = report.source_url {
        writeln!(md, "Source: <{url}>\n")?;
    }
    writeln!(
        md,
        "Analyzed {} · {} words · extracted via `{}`\n",
        report.analyzed_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.word_count,
        report.extraction_method
    )?;

    writeln!(md, "## Verdict\n")?;
    writeln!(
        md,
        "**{}** {} ({}% confidence)\n",
        call_marker(verdict.call),
        verdict.call,
        verdict.confidence_percent()
    )?;
    if !verdict.explanation.is_empty() {
        writeln!(md, "> {}\n", verdict.explanation)?;
    }

    writeln!(md, "## Source credibility\n")?;
    let domain = if verdict.credibility.domain.is_empty() {
        "no source URL"
    } else {
        verdict.credibility.domain.as_str()
    };
    writeln!(md, "| Domain | Score | Label |")?;
    writeln!(md, "|--------|-------|-------|")?;
    writeln!(
        md,
        "| {} | {}/100 | {} |\n",
        domain, verdict.credibility.score, verdict.credibility.label
    )?;
    writeln!(md, "{}\n", verdict.credibility.recommendation())?;

    writeln!(md, "## Language bias\n")?;
    writeln!(md, "Detected bias: **{}**\n", verdict.bias.label)?;
    if verdict.bias.matched_terms.is_empty() {
        writeln!(md, "No flagged terms.")?;
    } else {
        writeln!(md, "| Term | Occurrences |")?;
        writeln!(md, "|------|-------------|")?;
        for (term, count) in term_counts(&verdict.bias.matched_terms) {
            writeln!(md, "| {term} | {count} |")?;
        }
    }

    Ok(md)
}

/// Distinct terms with their occurrence counts, most frequent first.
fn term_counts(terms: &[String]) -> Vec<(&str, usize)> {
    terms
        .iter()
        .map(String::as_str)
        .counts()
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)))
        .collect()
}

fn call_marker(call: Call) -> &'static str {
    match call {
        Call::Real => "✅",
        Call::Fake => "❌",
        Call::Uncertain => "⚠️",
    }
}

/// Write the Markdown report for `report` and return the file path.
#[instrument(level = "info", skip_all, fields(%markdown_output_dir))]
pub async fn write_report(
    report: &Report,
    markdown_output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let md = render_report(report)?;
    let (date, stem) = report_stem(report);

    fs::create_dir_all(markdown_output_dir).await?;
    let path = write_new_file(
        Path::new(markdown_output_dir),
        &format!("{date}_{stem}"),
        "md",
        md.as_bytes(),
    )
    .await?;
    info!(path = %path.display(), "Wrote Markdown report");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BiasFinding, CredibilityEntry};
    use crate::outputs::fixtures;

    #[test]
    fn test_render_sections() {
        let md = render_report(&fixtures::report()).unwrap();
        assert!(md.starts_with("# City Council Approves Budget\n"));
        assert!(md.contains("Source: <https://www.reuters.com/world/council-budget>"));
        assert!(md.contains("**✅** REAL (87% confidence)"));
        assert!(md.contains("> Figures match the published budget."));
        assert!(md.contains("| reuters.com | 95/100 | High |"));
        assert!(md.contains("Generally trustworthy source"));
        assert!(md.contains("Detected bias: **Sensational**"));
    }

    #[test]
    fn test_term_table_counts_and_orders() {
        let md = render_report(&fixtures::report()).unwrap();
        let allegedly = md.find("| allegedly | 2 |").unwrap();
        let outrageous = md.find("| outrageous | 1 |").unwrap();
        assert!(allegedly < outrageous);
    }

    #[test]
    fn test_render_pasted_text_without_terms() {
        let mut report = fixtures::report();
        report.source_url = None;
        report.title = None;
        report.verdict.call = Call::Uncertain;
        report.verdict.bias = BiasFinding::neutral();
        report.verdict.credibility = CredibilityEntry::unsourced();

        let md = render_report(&report).unwrap();
        assert!(md.starts_with("# Article analysis\n"));
        assert!(!md.contains("Source:"));
        assert!(md.contains("| no source URL | 50/100 | Unknown |"));
        assert!(md.contains("No flagged terms."));
    }

    #[tokio::test]
    async fn test_write_report_path() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("reports");

        let path = write_report(&fixtures::report(), out.to_str().unwrap())
            .await
            .unwrap();

        assert_eq!(
            path,
            out.join("2025-05-06_142501000_city-council-approves-budget.md")
        );
        assert!(std::fs::read_to_string(path).unwrap().contains("## Verdict"));
    }
}
