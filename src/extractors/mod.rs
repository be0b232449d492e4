//! Article text extraction with an ordered fallback chain.
//!
//! Each submodule implements one independent [`ExtractionStrategy`]:
//!
//! | Priority | Strategy | Module | Notes |
//! |----------|----------|--------|-------|
//! | 1 | Structured content | [`structured`] | JSON-LD `articleBody`, then `<article>` markup |
//! | 2 | HTML paragraphs | [`html`] | Every `<p>` of the raw page |
//! | 3 | Headless browser | [`browser`] | Browserless-rendered DOM; only when configured |
//!
//! The [`ExtractorChain`] tries them in that order and stops at the first
//! result whose normalized text is longer than the minimum length. Every
//! strategy runs under its own timeout and the whole chain under an aggregate
//! budget, so paywalls, stalled servers and redirect loops end in
//! [`AnalysisError::ExtractionFailed`] instead of a hang.

pub mod browser;
pub mod fetch;
pub mod html;
pub mod structured;

use crate::config::ExtractionConfig;
use crate::error::AnalysisError;
use crate::models::{Article, ArticleMetadata, ExtractionMethod};
use crate::utils::clean_text;
use async_trait::async_trait;
use fetch::FetchError;
use std::time::Duration;
use tokio::time::{Instant, timeout};
use tracing::{debug, info, instrument, warn};

/// Raw output of one strategy, before normalization and acceptance.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub text: String,
    pub metadata: ArticleMetadata,
}

/// One way of pulling article text out of a URL.
///
/// `Ok(None)` means the strategy ran but found nothing; errors are network
/// or service failures. Either way the chain moves on to the next strategy.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    fn method(&self) -> ExtractionMethod;

    async fn extract(&self, url: &str) -> Result<Option<Extracted>, FetchError>;
}

/// Limits applied by the chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainLimits {
    /// Accepted text must have strictly more characters than this.
    pub min_length: usize,
    pub strategy_timeout: Duration,
    pub total_timeout: Duration,
}

impl Default for ChainLimits {
    fn default() -> Self {
        Self {
            min_length: 50,
            strategy_timeout: Duration::from_secs(15),
            total_timeout: Duration::from_secs(45),
        }
    }
}

/// Does normalized `text` pass the minimum-length threshold?
pub fn accepts(text: &str, min_length: usize) -> bool {
    text.chars().count() > min_length
}

/// Ordered list of strategies plus the first-success combinator.
pub struct ExtractorChain {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    limits: ChainLimits,
}

impl std::fmt::Debug for ExtractorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorChain")
            .field("methods", &self.methods())
            .field("limits", &self.limits)
            .finish()
    }
}

impl ExtractorChain {
    pub fn new(strategies: Vec<Box<dyn ExtractionStrategy>>, limits: ChainLimits) -> Self {
        Self { strategies, limits }
    }

    /// The standard chain: structured content, HTML paragraphs, and the
    /// headless browser when a Browserless URL is configured.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, FetchError> {
        let limits = config.limits();
        let client = fetch::build_client(
            &config.user_agent,
            limits.strategy_timeout,
            config.max_redirects,
        )?;

        let pages = fetch::PageFetcher::new(client.clone());
        let mut strategies: Vec<Box<dyn ExtractionStrategy>> = vec![
            Box::new(structured::StructuredContent::new(pages.clone())),
            Box::new(html::HtmlParagraphs::new(pages)),
        ];
        if let Some(ref base_url) = config.browserless_url {
            strategies.push(Box::new(browser::HeadlessBrowser::new(
                client,
                base_url,
                config.browserless_token.as_deref(),
            )));
        }
        Ok(Self::new(strategies, limits))
    }

    pub fn methods(&self) -> Vec<ExtractionMethod> {
        self.strategies.iter().map(|s| s.method()).collect()
    }

    pub fn limits(&self) -> ChainLimits {
        self.limits
    }

    /// Extract the article at `url`.
    ///
    /// Returns the first accepted result. Metadata found by earlier,
    /// rejected strategies is kept and merged into the accepted article.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::ExtractionFailed`] listing every strategy that was
    /// started, when none produced enough text or the total budget ran out.
    #[instrument(level = "info", skip(self), fields(strategies = self.strategies.len()))]
    pub async fn extract(&self, url: &str) -> Result<Article, AnalysisError> {
        let deadline = Instant::now() + self.limits.total_timeout;
        let mut attempted = Vec::with_capacity(self.strategies.len());
        let mut metadata = ArticleMetadata::default();

        for strategy in &self.strategies {
            let method = strategy.method();
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!(%method, "Extraction budget exhausted; skipping remaining strategies");
                break;
            }
            let budget = remaining.min(self.limits.strategy_timeout);
            attempted.push(method);

            let started = Instant::now();
            match timeout(budget, strategy.extract(url)).await {
                Ok(Ok(Some(extracted))) => {
                    let text = clean_text(&extracted.text);
                    metadata.merge_missing(extracted.metadata);
                    if accepts(&text, self.limits.min_length) {
                        info!(
                            %method,
                            chars = text.chars().count(),
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "Extracted article"
                        );
                        return Ok(Article::new(Some(url.to_string()), text, method, metadata));
                    }
                    debug!(
                        %method,
                        chars = text.chars().count(),
                        min_length = self.limits.min_length,
                        "Extracted text too short; trying next strategy"
                    );
                }
                Ok(Ok(None)) => {
                    debug!(%method, "Strategy found no article text");
                }
                Ok(Err(e)) => {
                    warn!(%method, error = %e, "Strategy failed");
                }
                Err(_) => {
                    warn!(%method, budget_ms = budget.as_millis() as u64, "Strategy timed out");
                }
            }
        }

        warn!(attempted = ?attempted, "All extraction strategies failed");
        Err(AnalysisError::ExtractionFailed {
            url: url.to_string(),
            attempted_methods: attempted,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::config::ExtractionConfig;
    use httpmock::prelude::*;
    use std::sync::atomic::Ordering;

    const URL: &str = "https://news.example.com/story";

    fn limits() -> ChainLimits {
        ChainLimits {
            min_length: 50,
            strategy_timeout: Duration::from_millis(200),
            total_timeout: Duration::from_secs(2),
        }
    }

    #[test]
    fn test_accepts_is_strictly_greater() {
        assert!(!accepts(&"a".repeat(50), 50));
        assert!(accepts(&"a".repeat(51), 50));
        assert!(!accepts("", 0));
    }

    #[tokio::test]
    async fn test_first_acceptable_strategy_wins() {
        let second = FakeStrategy::text(ExtractionMethod::HtmlParagraphs, "x".repeat(80).as_str());
        let second_calls = second.calls.clone();
        let chain = ExtractorChain::new(
            vec![
                Box::new(FakeStrategy::text(ExtractionMethod::StructuredData, &long_text())),
                Box::new(second),
            ],
            limits(),
        );

        let article = chain.extract(URL).await.unwrap();

        assert_eq!(article.extraction_method, ExtractionMethod::StructuredData);
        assert_eq!(article.source_url.as_deref(), Some(URL));
        assert_eq!(article.length, article.raw_text.chars().count());
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_short_failed_and_empty_results_fall_through() {
        let chain = ExtractorChain::new(
            vec![
                Box::new(FakeStrategy::text(ExtractionMethod::StructuredData, "Subscribe now")),
                Box::new(FakeStrategy::new(ExtractionMethod::HtmlParagraphs, Outcome::Fail)),
                Box::new(FakeStrategy::new(ExtractionMethod::PastedText, Outcome::Nothing)),
                Box::new(FakeStrategy::text(ExtractionMethod::HeadlessBrowser, &long_text())),
            ],
            limits(),
        );

        let article = chain.extract(URL).await.unwrap();
        assert_eq!(article.extraction_method, ExtractionMethod::HeadlessBrowser);
    }

    #[tokio::test]
    async fn test_all_too_short_fails_with_attempted_methods() {
        let chain = ExtractorChain::new(
            vec![
                Box::new(FakeStrategy::text(ExtractionMethod::StructuredData, "short")),
                Box::new(FakeStrategy::text(ExtractionMethod::HtmlParagraphs, &"y".repeat(50))),
                Box::new(FakeStrategy::text(ExtractionMethod::HeadlessBrowser, "")),
            ],
            limits(),
        );

        let err = chain.extract(URL).await.unwrap_err();
        assert_eq!(
            err,
            AnalysisError::ExtractionFailed {
                url: URL.to_string(),
                attempted_methods: vec![
                    ExtractionMethod::StructuredData,
                    ExtractionMethod::HtmlParagraphs,
                    ExtractionMethod::HeadlessBrowser,
                ],
            }
        );
    }

    #[tokio::test]
    async fn test_length_measured_after_normalization() {
        // 61 raw chars, but only 5 once whitespace is collapsed.
        let padded = format!("a{}b{}c", " ".repeat(29), " ".repeat(29));
        let chain = ExtractorChain::new(
            vec![Box::new(FakeStrategy::text(ExtractionMethod::HtmlParagraphs, &padded))],
            limits(),
        );
        assert!(chain.extract(URL).await.is_err());
    }

    #[tokio::test]
    async fn test_slow_strategy_times_out_and_falls_through() {
        let chain = ExtractorChain::new(
            vec![
                Box::new(
                    FakeStrategy::text(ExtractionMethod::StructuredData, &long_text())
                        .delayed(Duration::from_secs(5)),
                ),
                Box::new(FakeStrategy::text(ExtractionMethod::HtmlParagraphs, &long_text())),
            ],
            limits(),
        );

        let started = std::time::Instant::now();
        let article = chain.extract(URL).await.unwrap();
        assert_eq!(article.extraction_method, ExtractionMethod::HtmlParagraphs);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_total_budget_stops_the_chain() {
        let slow = || {
            FakeStrategy::text(ExtractionMethod::StructuredData, &long_text())
                .delayed(Duration::from_secs(5))
        };
        let last = FakeStrategy::text(ExtractionMethod::HtmlParagraphs, &long_text());
        let last_calls = last.calls.clone();
        let chain = ExtractorChain::new(
            vec![Box::new(slow()), Box::new(slow()), Box::new(last)],
            ChainLimits {
                min_length: 50,
                strategy_timeout: Duration::from_millis(150),
                total_timeout: Duration::from_millis(250),
            },
        );

        let err = chain.extract(URL).await.unwrap_err();
        match err {
            AnalysisError::ExtractionFailed {
                attempted_methods, ..
            } => {
                assert_eq!(
                    attempted_methods,
                    vec![ExtractionMethod::StructuredData, ExtractionMethod::StructuredData]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(last_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_metadata_from_rejected_strategy_is_kept() {
        let titled = FakeStrategy::new(
            ExtractionMethod::StructuredData,
            Outcome::Text(
                "teaser".to_string(),
                ArticleMetadata {
                    title: Some("Real Headline".to_string()),
                    ..Default::default()
                },
            ),
        );
        let chain = ExtractorChain::new(
            vec![
                Box::new(titled),
                Box::new(FakeStrategy::text(ExtractionMethod::HtmlParagraphs, &long_text())),
            ],
            limits(),
        );

        let article = chain.extract(URL).await.unwrap();
        assert_eq!(article.metadata.title.as_deref(), Some("Real Headline"));
    }

    #[tokio::test]
    async fn test_empty_chain_fails() {
        let chain = ExtractorChain::new(Vec::new(), limits());
        let err = chain.extract(URL).await.unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::ExtractionFailed { ref attempted_methods, .. } if attempted_methods.is_empty()
        ));
    }

    #[test]
    fn test_from_config_strategy_order() {
        let mut config = ExtractionConfig::default();
        let chain = ExtractorChain::from_config(&config).unwrap();
        assert_eq!(
            chain.methods(),
            vec![ExtractionMethod::StructuredData, ExtractionMethod::HtmlParagraphs]
        );

        config.browserless_url = Some("http://localhost:3000".to_string());
        let chain = ExtractorChain::from_config(&config).unwrap();
        assert_eq!(
            chain.methods(),
            vec![
                ExtractionMethod::StructuredData,
                ExtractionMethod::HtmlParagraphs,
                ExtractionMethod::HeadlessBrowser,
            ]
        );
    }

    #[tokio::test]
    async fn test_real_strategies_against_paywall_and_article() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/paywalled");
                then.status(200)
                    .body("<html><body><p>Subscribe to keep reading.</p></body></html>");
            })
            .await;
        let open = server
            .mock_async(|when, then| {
                when.method(GET).path("/open");
                then.status(200).body(format!(
                    "<html><head><title>Open Story</title></head><body><p>{}</p></body></html>",
                    long_text()
                ));
            })
            .await;

        let chain = ExtractorChain::from_config(&ExtractionConfig::default()).unwrap();

        let err = chain.extract(&server.url("/paywalled")).await.unwrap_err();
        assert!(matches!(err, AnalysisError::ExtractionFailed { .. }));

        let article = chain.extract(&server.url("/open")).await.unwrap();
        assert_eq!(article.extraction_method, ExtractionMethod::HtmlParagraphs);
        assert_eq!(article.metadata.title.as_deref(), Some("Open Story"));
        // Structured and paragraph strategies share one download.
        open.assert_hits_async(1).await;
    }
}
