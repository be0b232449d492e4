//! One analysis, start to finish.
//!
//! ```text
//! input ──► validate ──► extract ──► bias rules ──┐
//!                                    credibility ─┼──► oracle ──► aggregate ──► Report
//! ```
//!
//! Each call owns its data; nothing is shared between concurrent analyses
//! except the read-only rule tables. Dropping the returned future cancels
//! the analysis, including any in-flight HTTP request.

use crate::aggregate::{CredibilityPolicy, aggregate};
use crate::bias::score_bias;
use crate::credibility;
use crate::error::{AnalysisError, Result};
use crate::extractors::ExtractorChain;
use crate::models::{Article, ArticleMetadata, CredibilityEntry, ExtractionMethod, Report};
use crate::oracle::{Oracle, OracleError, OracleRequest};
use crate::utils::clean_text;
use chrono::Utc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{info, instrument};
use url::Url;

pub struct Analyzer<O> {
    chain: ExtractorChain,
    oracle: O,
    policy: CredibilityPolicy,
    oracle_timeout: Duration,
}

impl<O> std::fmt::Debug for Analyzer<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("chain", &self.chain)
            .field("policy", &self.policy)
            .field("oracle_timeout", &self.oracle_timeout)
            .finish()
    }
}

impl<O: Oracle> Analyzer<O> {
    pub fn new(
        chain: ExtractorChain,
        oracle: O,
        policy: CredibilityPolicy,
        oracle_timeout: Duration,
    ) -> Self {
        Self {
            chain,
            oracle,
            policy,
            oracle_timeout,
        }
    }

    /// Fetch, extract and judge the article at `input`.
    ///
    /// A missing scheme is taken to mean `https://`.
    #[instrument(level = "info", skip(self))]
    pub async fn analyze_url(&self, input: &str) -> Result<Report> {
        let url = validate_url(input)?;
        let article = self.chain.extract(url.as_str()).await?;
        let credibility = credibility::lookup(url.as_str());
        self.judge(article, credibility).await
    }

    /// Judge pasted article text.
    ///
    /// `source_url`, when given, is used for the credibility lookup only;
    /// nothing is fetched.
    #[instrument(level = "info", skip(self, text), fields(chars = text.chars().count()))]
    pub async fn analyze_text(
        &self,
        text: &str,
        source_url: Option<&str>,
    ) -> Result<Report> {
        let text = clean_text(text);
        if text.is_empty() {
            return Err(AnalysisError::InvalidInput(
                "pasted article text is empty".to_string(),
            ));
        }
        let (source_url, credibility) = match source_url {
            Some(input) => {
                let url = validate_url(input)?;
                let entry = credibility::lookup(url.as_str());
                (Some(url.to_string()), entry)
            }
            None => (None, CredibilityEntry::unsourced()),
        };
        let article = Article::new(
            source_url,
            text,
            ExtractionMethod::PastedText,
            ArticleMetadata::default(),
        );
        self.judge(article, credibility).await
    }

    async fn judge(
        &self,
        article: Article,
        credibility: CredibilityEntry,
    ) -> Result<Report> {
        let bias = score_bias(&article.raw_text);
        info!(
            method = %article.extraction_method,
            chars = article.length,
            bias = %bias.label,
            flagged = bias.matched_terms.len(),
            domain = %credibility.domain,
            credibility = credibility.score,
            "Rule-based signals ready"
        );

        let request = OracleRequest {
            text: article.raw_text.clone(),
            flagged_terms: bias.matched_terms.clone(),
        };
        let started = Instant::now();
        let outcome = match timeout(self.oracle_timeout, self.oracle.analyze(&request)).await {
            Ok(result) => result,
            Err(_) => Err(OracleError::Timeout(self.oracle_timeout)),
        };
        info!(
            ok = outcome.is_ok(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Oracle finished"
        );

        let verdict = aggregate(outcome, bias, credibility, self.policy)?;
        info!(
            call = %verdict.call,
            confidence = verdict.confidence_percent(),
            "Verdict ready"
        );
        Ok(Report::new(&article, verdict, Utc::now()))
    }
}

/// Parse user input into an absolute http(s) URL with a host.
pub fn validate_url(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AnalysisError::InvalidInput("URL is empty".to_string()));
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let url = Url::parse(&candidate)
        .map_err(|e| AnalysisError::InvalidInput(format!("{trimmed}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AnalysisError::InvalidInput(format!(
            "{trimmed}: only http and https URLs are supported"
        )));
    }
    match url.host_str() {
        Some(host) if host.contains('.') || host == "localhost" || url.port().is_some() => Ok(url),
        _ => Err(AnalysisError::InvalidInput(format!(
            "{trimmed}: URL has no usable host"
        ))),
    }
}
