//! Command-line interface definitions for newsguard.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Secrets and service endpoints can also come from environment variables;
//! anything given here overrides the YAML config file.

use crate::aggregate::CredibilityPolicy;
use crate::config::AppConfig;
use clap::{Args, Parser, Subcommand};

/// Check news articles for factuality, language bias and source credibility.
///
/// # Examples
///
/// ```sh
/// # Analyze one article
/// newsguard analyze --url https://www.reuters.com/world/some-story
///
/// # Several articles at once, reports under ./out
/// newsguard -j ./out/json -m ./out/md analyze -u bbc.com/news/a -u apnews.com/article/b
///
/// # Pasted text, with the URL used only for the credibility lookup
/// newsguard analyze --text-file story.txt --url theonion.com/story
///
/// # Past analyses of one URL
/// newsguard history --url https://www.reuters.com/world/some-story
///
/// # Totals over every stored analysis
/// newsguard history --stats
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, env = "NEWSGUARD_CONFIG", global = true)]
    pub config: Option<String>,

    /// Output directory for JSON reports
    #[arg(short, long, default_value = "./newsguard/json", global = true)]
    pub json_output_dir: String,

    /// Output directory for Markdown reports
    #[arg(short, long, default_value = "./newsguard/markdown", global = true)]
    pub markdown_output_dir: String,

    /// Directory holding history.jsonl
    #[arg(long, default_value = "./newsguard", global = true)]
    pub history_dir: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze one or more articles
    Analyze(AnalyzeArgs),
    /// List stored analyses, newest first
    History(HistoryArgs),
}

#[derive(Args, Debug, Clone)]
#[command(group(
    clap::ArgGroup::new("input")
        .required(true)
        .multiple(true)
        .args(["urls", "text", "text_file"])
))]
pub struct AnalyzeArgs {
    /// Article URL; repeat to analyze several. With --text or --text-file,
    /// a single URL is used for the credibility lookup only
    #[arg(short = 'u', long = "url")]
    pub urls: Vec<String>,

    /// Article text to analyze instead of fetching a URL
    #[arg(long, conflicts_with = "text_file")]
    pub text: Option<String>,

    /// File holding the article text
    #[arg(long)]
    pub text_file: Option<String>,

    /// API key for the OpenAI-compatible analysis service
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub groq_api_key: Option<String>,

    /// Base URL of the analysis service
    #[arg(long)]
    pub api_base_url: Option<String>,

    /// Model name sent to the analysis service
    #[arg(long)]
    pub model: Option<String>,

    /// Retries for transient analysis-service failures
    #[arg(long)]
    pub max_retries: Option<usize>,

    /// Browserless endpoint; enables the headless-browser fallback
    #[arg(long, env = "BROWSERLESS_URL")]
    pub browserless_url: Option<String>,

    /// Browserless API token
    #[arg(long, env = "BROWSERLESS_TOKEN", hide_env_values = true)]
    pub browserless_token: Option<String>,

    /// Downgrade REAL calls to UNCERTAIN for domains scoring below this
    #[arg(long, conflicts_with = "independent_credibility")]
    pub downgrade_below: Option<u8>,

    /// Report credibility without ever changing the call
    #[arg(long)]
    pub independent_credibility: bool,

    /// How many URLs to analyze at the same time
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,
}

impl AnalyzeArgs {
    /// Override file configuration with whatever was given on the command line.
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(ref key) = self.groq_api_key {
            config.oracle.api_key = Some(key.clone());
        }
        if let Some(ref base_url) = self.api_base_url {
            config.oracle.base_url = base_url.clone();
        }
        if let Some(ref model) = self.model {
            config.oracle.model = model.clone();
        }
        if let Some(max_retries) = self.max_retries {
            config.oracle.max_retries = max_retries;
        }
        if let Some(ref url) = self.browserless_url {
            config.extraction.browserless_url = Some(url.clone());
        }
        if let Some(ref token) = self.browserless_token {
            config.extraction.browserless_token = Some(token.clone());
        }
        if self.independent_credibility {
            config.policy = CredibilityPolicy::Independent;
        } else if let Some(below) = self.downgrade_below {
            config.policy = CredibilityPolicy::DowngradeReal { below };
        }
    }

    /// Pasted text was given instead of (or alongside) URLs.
    pub fn is_text_input(&self) -> bool {
        self.text.is_some() || self.text_file.is_some()
    }
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Only analyses of this URL
    #[arg(short = 'u', long)]
    pub url: Option<String>,

    /// Maximum number of entries to show
    #[arg(short = 'n', long, default_value_t = 20)]
    pub limit: usize,

    /// Print totals over the whole history instead of listing entries
    #[arg(long, conflicts_with_all = ["url", "limit"])]
    pub stats: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(argv: &[&str]) -> (Cli, AnalyzeArgs) {
        let cli = Cli::try_parse_from(argv).unwrap();
        let args = match cli.command {
            Command::Analyze(ref args) => args.clone(),
            Command::History(_) => panic!("expected analyze"),
        };
        (cli, args)
    }

    #[test]
    fn test_cli_parsing() {
        let (cli, args) = analyze(&[
            "newsguard",
            "--json-output-dir",
            "./json",
            "--markdown-output-dir",
            "./markdown",
            "analyze",
            "--url",
            "https://www.reuters.com/a",
            "--url",
            "bbc.co.uk/news/b",
        ]);

        assert_eq!(cli.json_output_dir, "./json");
        assert_eq!(cli.markdown_output_dir, "./markdown");
        assert_eq!(args.urls, vec!["https://www.reuters.com/a", "bbc.co.uk/news/b"]);
        assert_eq!(args.concurrency, 4);
        assert!(!args.is_text_input());
    }

    #[test]
    fn test_cli_short_flags_after_subcommand() {
        let (cli, args) = analyze(&[
            "newsguard", "analyze", "-u", "apnews.com/x", "-j", "/tmp/json", "-m", "/tmp/md",
        ]);

        assert_eq!(cli.json_output_dir, "/tmp/json");
        assert_eq!(cli.markdown_output_dir, "/tmp/md");
        assert_eq!(args.urls, vec!["apnews.com/x"]);
    }

    #[test]
    fn test_analyze_requires_some_input() {
        assert!(Cli::try_parse_from(["newsguard", "analyze"]).is_err());
    }

    #[test]
    fn test_text_and_text_file_conflict() {
        assert!(
            Cli::try_parse_from([
                "newsguard", "analyze", "--text", "abc", "--text-file", "story.txt"
            ])
            .is_err()
        );
    }

    #[test]
    fn test_text_with_url_for_credibility() {
        let (_, args) = analyze(&[
            "newsguard", "analyze", "--text", "Pasted body", "--url", "theonion.com/x",
        ]);
        assert!(args.is_text_input());
        assert_eq!(args.text.as_deref(), Some("Pasted body"));
        assert_eq!(args.urls, vec!["theonion.com/x"]);
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let (_, args) = analyze(&[
            "newsguard",
            "analyze",
            "-u",
            "a.com/x",
            "--groq-api-key",
            "gsk_test",
            "--model",
            "llama-3.3-70b-versatile",
            "--max-retries",
            "2",
            "--browserless-url",
            "http://chrome:3000",
            "--downgrade-below",
            "35",
        ]);
        let mut config = AppConfig::default();
        args.apply_to(&mut config);

        assert_eq!(config.oracle.api_key.as_deref(), Some("gsk_test"));
        assert_eq!(config.oracle.model, "llama-3.3-70b-versatile");
        assert_eq!(config.oracle.max_retries, 2);
        assert_eq!(
            config.extraction.browserless_url.as_deref(),
            Some("http://chrome:3000")
        );
        assert_eq!(config.policy, CredibilityPolicy::DowngradeReal { below: 35 });
    }

    #[test]
    fn test_untouched_config_survives_apply() {
        let (_, args) = analyze(&["newsguard", "analyze", "-u", "a.com", "--independent-credibility"]);
        let mut config = AppConfig::default();
        config.oracle.model = "from-file".to_string();
        args.apply_to(&mut config);
        assert_eq!(config.oracle.model, "from-file");
        assert_eq!(config.policy, CredibilityPolicy::Independent);
    }

    #[test]
    fn test_history_parsing() {
        let cli = Cli::try_parse_from(["newsguard", "history", "--url", "a.com/x", "-n", "5"])
            .unwrap();
        match cli.command {
            Command::History(args) => {
                assert_eq!(args.url.as_deref(), Some("a.com/x"));
                assert_eq!(args.limit, 5);
                assert!(!args.stats);
            }
            Command::Analyze(_) => panic!("expected history"),
        }
        assert_eq!(cli.history_dir, "./newsguard");
    }

    #[test]
    fn test_history_stats_flag() {
        let cli = Cli::try_parse_from(["newsguard", "history", "--stats"]).unwrap();
        match cli.command {
            Command::History(args) => assert!(args.stats),
            Command::Analyze(_) => panic!("expected history"),
        }
        assert!(Cli::try_parse_from(["newsguard", "history", "--stats", "-u", "a.com"]).is_err());
    }
}
