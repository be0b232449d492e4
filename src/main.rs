//! # newsguard
//!
//! Checks news articles for factuality, language bias and source credibility.
//!
//! ## Features
//!
//! - Extracts article text through an ordered fallback chain (JSON-LD and
//!   `<article>` markup, plain paragraphs, then an optional Browserless
//!   headless browser)
//! - Scores loaded language with keyword rules for left, right and
//!   sensational bias
//! - Looks up the publishing domain in a static credibility table
//! - Asks an OpenAI-compatible LLM (Groq by default) for a REAL/FAKE call
//! - Writes JSON and Markdown reports and keeps a JSON Lines history
//!
//! ## Usage
//!
//! ```sh
//! GROQ_API_KEY=gsk_... newsguard analyze --url https://www.reuters.com/world/story
//! newsguard history --limit 10
//! newsguard history --stats
//! ```
//!
//! ## Architecture
//!
//! 1. **Extraction**: first strategy producing enough text wins
//! 2. **Signals**: bias rules and credibility lookup, both local and static
//! 3. **Judgment**: one oracle call, bounded by a timeout
//! 4. **Aggregation**: one policy function combines everything into a verdict
//! 5. **Output**: JSON report, Markdown report, history line
//!
//! Several URLs are analyzed concurrently (4 at a time by default). Ctrl-C
//! drops every in-flight analysis.

use clap::Parser;
use futures::stream::{self, StreamExt};
use std::error::Error;
use std::process::ExitCode;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregate;
mod bias;
mod cli;
mod config;
mod credibility;
mod error;
mod extractors;
mod models;
mod oracle;
mod outputs;
mod pipeline;
mod utils;

use cli::{AnalyzeArgs, Cli, Command, HistoryArgs};
use error::AnalysisError;
use extractors::ExtractorChain;
use models::Report;
use oracle::groq::GroqOracle;
use oracle::retry::RetryOracle;
use oracle::Oracle;
use outputs::{history, json, markdown};
use pipeline::Analyzer;
use utils::ensure_writable_dir;

/// Where finished reports go.
#[derive(Debug, Clone)]
struct OutputDirs {
    json: String,
    markdown: String,
    history: String,
}

/// One unit of work for the analyzer.
#[derive(Debug)]
enum Job {
    Url(String),
    Text {
        text: String,
        source_url: Option<String>,
    },
}

impl Job {
    fn label(&self) -> String {
        match self {
            Job::Url(url) => url.clone(),
            Job::Text {
                source_url: Some(url),
                ..
            } => format!("pasted text ({url})"),
            Job::Text { .. } => "pasted text".to_string(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("newsguard starting up");

    let args = Cli::parse();
    debug!(?args.json_output_dir, ?args.markdown_output_dir, ?args.history_dir, "Parsed CLI arguments");

    let dirs = OutputDirs {
        json: args.json_output_dir.clone(),
        markdown: args.markdown_output_dir.clone(),
        history: args.history_dir.clone(),
    };

    let code = match args.command {
        Command::Analyze(ref analyze_args) => {
            run_analyze(args.config.as_deref(), analyze_args, &dirs).await?
        }
        Command::History(ref history_args) => run_history(history_args, &dirs).await?,
    };

    let elapsed = start_time.elapsed();
    info!(?elapsed, secs = elapsed.as_secs(), millis = elapsed.subsec_millis(), "Execution complete");
    Ok(code)
}

#[instrument(level = "info", skip_all)]
async fn run_analyze(
    config_path: Option<&str>,
    args: &AnalyzeArgs,
    dirs: &OutputDirs,
) -> Result<ExitCode, Box<dyn Error>> {
    let mut config = config::load_config(config_path).await?;
    args.apply_to(&mut config);
    debug!(?config, "Effective configuration");

    let jobs = match build_jobs(args).await {
        Ok(jobs) => jobs,
        Err(e) => return Ok(report_failure("input", &e)),
    };

    // Early check: fail before any network work if reports can't be written
    for dir in [&dirs.json, &dirs.markdown, &dirs.history] {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "Output directory is not writable (fix perms or choose a different path)");
            return Err(e);
        }
    }

    let groq = match GroqOracle::new(&config.oracle) {
        Ok(groq) => groq,
        Err(e) => {
            let err = AnalysisError::OracleUnavailable {
                reason: e.to_string(),
            };
            return Ok(report_failure("configuration", &err));
        }
    };
    let oracle = RetryOracle::new(groq, config.oracle.max_retries, config.oracle.retry_base_delay());
    let chain = ExtractorChain::from_config(&config.extraction)?;
    info!(
        methods = ?chain.methods(),
        limits = ?chain.limits(),
        policy = ?config.policy,
        credibility_domains = credibility::table().len(),
        "Analyzer ready"
    );

    let analyzer = Analyzer::new(chain, oracle, config.policy, config.oracle.overall_timeout());
    let total = jobs.len();
    let concurrency = args.concurrency.max(1);
    info!(total, concurrency, "Starting analysis");

    let work = stream::iter(jobs)
        .map(|job| run_job(&analyzer, job, dirs))
        .buffer_unordered(concurrency)
        .collect::<Vec<_>>();

    let results = tokio::select! {
        results = work => results,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted; in-flight analyses cancelled");
            return Ok(ExitCode::from(130));
        }
    };

    let mut failed = 0usize;
    for (label, result) in results {
        match result {
            Ok(report) => print_report(&report)?,
            Err(e) => {
                failed += 1;
                report_failure(&label, &e);
            }
        }
    }

    info!(total, successful = total - failed, failed, "Completed analysis");
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Turn the parsed arguments into analyzer jobs.
async fn build_jobs(args: &AnalyzeArgs) -> Result<Vec<Job>, AnalysisError> {
    if !args.is_text_input() {
        return Ok(args.urls.iter().cloned().map(Job::Url).collect());
    }
    if args.urls.len() > 1 {
        return Err(AnalysisError::InvalidInput(
            "pasted text takes at most one --url, used for the credibility lookup".to_string(),
        ));
    }
    let text = match (&args.text, &args.text_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AnalysisError::InvalidInput(format!("cannot read {path}: {e}")))?,
        (None, None) => String::new(),
    };
    Ok(vec![Job::Text {
        text,
        source_url: args.urls.first().cloned(),
    }])
}

/// Analyze one job and persist the report. Output failures are logged and
/// never discard the verdict.
async fn run_job<O: Oracle>(
    analyzer: &Analyzer<O>,
    job: Job,
    dirs: &OutputDirs,
) -> (String, Result<Report, AnalysisError>) {
    let label = job.label();
    let result = match job {
        Job::Url(ref url) => analyzer.analyze_url(url).await,
        Job::Text {
            ref text,
            ref source_url,
        } => analyzer.analyze_text(text, source_url.as_deref()).await,
    };

    if let Ok(ref report) = result {
        match json::write_report(report, &dirs.json).await {
            Ok(path) => info!(input = %label, path = %path.display(), "Saved JSON report"),
            Err(e) => error!(input = %label, error = %e, "Failed to write JSON report"),
        }
        match markdown::write_report(report, &dirs.markdown).await {
            Ok(path) => info!(input = %label, path = %path.display(), "Saved Markdown report"),
            Err(e) => error!(input = %label, error = %e, "Failed to write Markdown report"),
        }
        if let Err(e) = history::append(report, &dirs.history).await {
            error!(input = %label, error = %e, "Failed to append to history");
        }
    }
    (label, result)
}

fn print_report(report: &Report) -> Result<(), Box<dyn Error>> {
    if let Some(ref url) = report.source_url {
        println!("# {url}");
    }
    println!("{}", json::verdict_json(&report.verdict)?);
    Ok(())
}

fn report_failure(label: &str, e: &AnalysisError) -> ExitCode {
    error!(input = %label, error = %e, "Analysis failed");
    eprintln!("{label}: {}", e.user_message());
    ExitCode::FAILURE
}

#[instrument(level = "info", skip_all)]
async fn run_history(args: &HistoryArgs, dirs: &OutputDirs) -> Result<ExitCode, Box<dyn Error>> {
    if args.stats {
        let stats = history::stats(&dirs.history).await?;
        info!(total = stats.total, "Computed history statistics");
        print_stats(&stats);
        return Ok(ExitCode::SUCCESS);
    }

    let reports = history::query(&dirs.history, args.url.as_deref(), args.limit).await?;
    info!(count = reports.len(), "Loaded history");
    if reports.is_empty() {
        println!("No analyses recorded.");
    }
    for report in reports {
        let verdict = &report.verdict;
        println!(
            "{}  {:<9} {:>3}%  {:<11} {:>3}/100 {:<10}  {}",
            report.analyzed_at.format("%Y-%m-%d %H:%M:%S"),
            verdict.call.to_string(),
            verdict.confidence_percent(),
            verdict.bias.label.to_string(),
            verdict.credibility.score,
            verdict.credibility.label.to_string(),
            report.source_url.as_deref().unwrap_or("(pasted text)")
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn print_stats(stats: &history::HistoryStats) {
    println!("Total analyses:   {}", stats.total);
    println!("Unique URLs:      {}", stats.unique_urls);
    println!("Unique articles:  {}", stats.unique_articles);
    println!("REAL:             {}", stats.real);
    println!("FAKE:             {}", stats.fake);
    println!("UNCERTAIN:        {}", stats.uncertain);
    match stats.average_confidence {
        Some(avg) => println!("Avg confidence:   {:.1}%", avg * 100.0),
        None => println!("Avg confidence:   n/a"),
    }
    if !stats.bias_distribution.is_empty() {
        println!("Bias distribution:");
        for (label, count) in &stats.bias_distribution {
            println!("  {:<11} {count}", label.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(argv: &[&str]) -> AnalyzeArgs {
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Analyze(args) => args,
            Command::History(_) => panic!("expected analyze"),
        }
    }

    #[tokio::test]
    async fn test_url_jobs() {
        let jobs = build_jobs(&args(&["newsguard", "analyze", "-u", "a.com/1", "-u", "b.com/2"]))
            .await
            .unwrap();
        let labels: Vec<String> = jobs.iter().map(Job::label).collect();
        assert_eq!(labels, vec!["a.com/1", "b.com/2"]);
    }

    #[tokio::test]
    async fn test_text_job_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("story.txt");
        std::fs::write(&path, "Pasted story body.").unwrap();

        let jobs = build_jobs(&args(&[
            "newsguard",
            "analyze",
            "--text-file",
            path.to_str().unwrap(),
            "--url",
            "theonion.com/x",
        ]))
        .await
        .unwrap();

        assert_eq!(jobs.len(), 1);
        match &jobs[0] {
            Job::Text { text, source_url } => {
                assert_eq!(text, "Pasted story body.");
                assert_eq!(source_url.as_deref(), Some("theonion.com/x"));
            }
            Job::Url(_) => panic!("expected text job"),
        }
        assert_eq!(jobs[0].label(), "pasted text (theonion.com/x)");
    }

    #[tokio::test]
    async fn test_text_with_several_urls_is_invalid() {
        let err = build_jobs(&args(&[
            "newsguard", "analyze", "--text", "body", "-u", "a.com", "-u", "b.com",
        ]))
        .await
        .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_missing_text_file_is_invalid() {
        let err = build_jobs(&args(&[
            "newsguard",
            "analyze",
            "--text-file",
            "/definitely/not/here.txt",
        ]))
        .await
        .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput(_)));
    }
}
