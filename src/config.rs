//! YAML configuration.
//!
//! Every field has a default, so the file is optional and may be partial:
//!
//! ```yaml
//! extraction:
//!   min_length: 50
//!   strategy_timeout_secs: 15
//!   total_timeout_secs: 45
//!   browserless_url: http://localhost:3000
//! oracle:
//!   model: llama-3.1-8b-instant
//!   timeout_secs: 30
//!   max_retries: 0
//! policy:
//!   mode: downgrade_real
//!   below: 20
//! ```
//!
//! Command-line flags and their environment variables override file values
//! (see [`crate::cli`]).

use crate::aggregate::CredibilityPolicy;
use crate::extractors::ChainLimits;
use crate::oracle::groq::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Duration;
use tracing::{info, instrument};

/// Upper bound on a single retry backoff, jitter included.
const MAX_BACKOFF: Duration = Duration::from_millis(30_250);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub extraction: ExtractionConfig,
    pub oracle: OracleConfig,
    pub policy: CredibilityPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Accepted text must be longer than this many characters.
    pub min_length: usize,
    pub strategy_timeout_secs: u64,
    pub total_timeout_secs: u64,
    pub max_redirects: usize,
    pub user_agent: String,
    /// Enables the headless-browser strategy.
    pub browserless_url: Option<String>,
    pub browserless_token: Option<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        let limits = ChainLimits::default();
        Self {
            min_length: limits.min_length,
            strategy_timeout_secs: limits.strategy_timeout.as_secs(),
            total_timeout_secs: limits.total_timeout.as_secs(),
            max_redirects: 5,
            user_agent: concat!("newsguard/", env!("CARGO_PKG_VERSION")).to_string(),
            browserless_url: None,
            browserless_token: None,
        }
    }
}

impl ExtractionConfig {
    pub fn limits(&self) -> ChainLimits {
        ChainLimits {
            min_length: self.min_length,
            strategy_timeout: Duration::from_secs(self.strategy_timeout_secs),
            total_timeout: Duration::from_secs(self.total_timeout_secs),
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// OpenAI-compatible API root, without `/chat/completions`.
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Bound on a single oracle call.
    pub timeout_secs: u64,
    /// Extra attempts for transient failures; 0 means one attempt.
    pub max_retries: usize,
    pub retry_base_delay_ms: u64,
    /// Article text beyond this many characters is not sent.
    pub max_article_chars: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            temperature: 0.1,
            max_tokens: 500,
            timeout_secs: 30,
            max_retries: 0,
            retry_base_delay_ms: 1000,
            max_article_chars: 4000,
        }
    }
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    /// Bound on the whole judgment: every attempt plus the longest possible
    /// backoff before each retry.
    pub fn overall_timeout(&self) -> Duration {
        let attempts = u32::try_from(self.max_retries + 1).unwrap_or(u32::MAX);
        let retries = attempts - 1;
        self.timeout().saturating_mul(attempts) + MAX_BACKOFF.saturating_mul(retries)
    }
}

impl std::fmt::Debug for OracleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_base_delay_ms", &self.retry_base_delay_ms)
            .field("max_article_chars", &self.max_article_chars)
            .finish()
    }
}

/// Parse configuration from YAML text.
pub fn parse_config(yaml: &str) -> Result<AppConfig, serde_yaml::Error> {
    if yaml.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    serde_yaml::from_str(yaml)
}

/// Load configuration from `path`, or defaults when `path` is `None`.
#[instrument(level = "info")]
pub async fn load_config(path: Option<&str>) -> Result<AppConfig, Box<dyn Error>> {
    let Some(path) = path else {
        info!("No config file given; using defaults");
        return Ok(AppConfig::default());
    };
    let yaml = tokio::fs::read_to_string(path).await?;
    let config = parse_config(&yaml)?;
    info!(path, "Loaded configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_gives_defaults() {
        assert_eq!(parse_config("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let config = parse_config(
            "extraction:\n  min_length: 120\n  browserless_url: http://chrome:3000\noracle:\n  max_retries: 2\n",
        )
        .unwrap();
        assert_eq!(config.extraction.min_length, 120);
        assert_eq!(config.extraction.total_timeout_secs, 45);
        assert_eq!(
            config.extraction.browserless_url.as_deref(),
            Some("http://chrome:3000")
        );
        assert_eq!(config.oracle.max_retries, 2);
        assert_eq!(config.oracle.model, DEFAULT_MODEL);
        assert_eq!(config.policy, CredibilityPolicy::default());
    }

    #[test]
    fn test_policy_section() {
        let config = parse_config("policy:\n  mode: independent\n").unwrap();
        assert_eq!(config.policy, CredibilityPolicy::Independent);
    }

    #[test]
    fn test_unknown_policy_mode_rejected() {
        assert!(parse_config("policy:\n  mode: vibes\n").is_err());
    }

    #[test]
    fn test_limits_conversion() {
        let limits = ExtractionConfig {
            strategy_timeout_secs: 3,
            total_timeout_secs: 9,
            ..ExtractionConfig::default()
        }
        .limits();
        assert_eq!(limits.strategy_timeout, Duration::from_secs(3));
        assert_eq!(limits.total_timeout, Duration::from_secs(9));
        assert_eq!(limits.min_length, 50);
    }

    #[test]
    fn test_overall_timeout_covers_retries() {
        let single = OracleConfig::default();
        assert_eq!(single.overall_timeout(), Duration::from_secs(30));

        let retrying = OracleConfig {
            timeout_secs: 10,
            max_retries: 2,
            ..OracleConfig::default()
        };
        assert_eq!(
            retrying.overall_timeout(),
            Duration::from_secs(30) + Duration::from_millis(60_500)
        );
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = OracleConfig {
            api_key: Some("gsk_secret".into()),
            ..OracleConfig::default()
        };
        let shown = format!("{config:?}");
        assert!(!shown.contains("gsk_secret"));
        assert!(shown.contains("<redacted>"));
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("newsguard.yaml");
        std::fs::write(&path, "oracle:\n  timeout_secs: 5\n").unwrap();

        let config = load_config(path.to_str()).await.unwrap();
        assert_eq!(config.oracle.timeout(), Duration::from_secs(5));

        assert_eq!(load_config(None).await.unwrap(), AppConfig::default());
        assert!(load_config(Some("/definitely/not/here.yaml")).await.is_err());
    }
}
