//! OpenAI-compatible chat-completions oracle (Groq by default).
//!
//! The model is asked for a single JSON object:
//!
//! ```json
//! {"verdict": "REAL", "confidence": 85, "bias_type": "Neutral", "explanation": "..."}
//! ```
//!
//! Replies are validated strictly: anything without a parsable object, a
//! verdict, a numeric confidence and an explanation is
//! [`OracleError::Malformed`]. Verdicts other than REAL/FAKE become
//! UNCERTAIN, and confidence is clamped to 0–100 before scaling to `[0, 1]`.

use super::{Oracle, OracleError, OracleRequest};
use crate::config::OracleConfig;
use crate::models::{BiasLabel, Call, OracleResult};
use crate::utils::{extract_json_object, looks_truncated, truncate_chars, truncate_for_log};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

const SYSTEM_PROMPT: &str = "You are an expert news analyst. Always respond with valid JSON only.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// The model's JSON answer before validation.
#[derive(Debug, Deserialize)]
struct RawJudgment {
    verdict: String,
    confidence: serde_json::Value,
    #[serde(default)]
    bias_type: Option<String>,
    explanation: String,
}

pub struct GroqOracle {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    max_article_chars: usize,
}

impl std::fmt::Debug for GroqOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqOracle")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GroqOracle {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// [`OracleError::MissingApiKey`] when no key is configured.
    pub fn new(config: &OracleConfig) -> Result<Self, OracleError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(OracleError::MissingApiKey)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_article_chars: config.max_article_chars,
        })
    }

    fn headers(&self) -> Result<HeaderMap, OracleError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| OracleError::Unauthorized)?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn prompt(&self, request: &OracleRequest) -> String {
        build_prompt(
            truncate_chars(&request.text, self.max_article_chars),
            &request.flagged_terms,
        )
    }
}

impl Oracle for GroqOracle {
    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn analyze(&self, request: &OracleRequest) -> Result<OracleResult, OracleError> {
        let url = format!("{}/chat/completions", self.base_url);
        let prompt = self.prompt(request);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: 0.9,
        };

        let t0 = Instant::now();
        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %truncate_for_log(&message, 300), "Oracle API error");
            return Err(classify_status(status, message));
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| OracleError::Malformed("no choices in response".into()))?;
        debug!(reply = %truncate_for_log(&content, 300), "Oracle reply");

        let result = parse_reply(&content)?;
        info!(
            call = %result.call,
            confidence = result.confidence,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Oracle judgment received"
        );
        Ok(result)
    }
}

fn classify_status(status: StatusCode, message: String) -> OracleError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => OracleError::RateLimited,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => OracleError::Unauthorized,
        _ => OracleError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// The user prompt for one article.
pub fn build_prompt(article_text: &str, flagged_terms: &[String]) -> String {
    let flagged = if flagged_terms.is_empty() {
        "None detected".to_string()
    } else {
        flagged_terms.join(", ")
    };

    format!(
        r#"You are an expert news analyst specializing in detecting fake news and media bias. Analyze the following news article.

ARTICLE TO ANALYZE:
{article_text}

BIASED WORDS ALREADY IDENTIFIED:
{flagged}

Respond with ONLY a valid JSON object in this exact format:
{{
    "verdict": "REAL" or "FAKE",
    "confidence": integer from 0-100,
    "bias_type": "Left", "Right", "Neutral", "Sensational", "Emotional", or "Clickbait",
    "explanation": "2-4 sentence explanation focusing on credibility indicators, sourcing, factual accuracy, and bias"
}}

Consider: verifiable claims and proper attribution; logical consistency; exaggeration or emotionally manipulative language; fabricated events, false quotes, misleading statistics, unsupported conspiracy claims; satire presented as news.

Provide your assessment as a JSON object only, no additional text."#
    )
}

/// Validate a model reply into an [`OracleResult`].
pub fn parse_reply(content: &str) -> Result<OracleResult, OracleError> {
    let json = extract_json_object(content)
        .ok_or_else(|| OracleError::Malformed("no JSON object in reply".into()))?;

    let raw: RawJudgment = serde_json::from_str(json).map_err(|e| {
        if looks_truncated(&e) {
            OracleError::Malformed(format!("reply truncated: {e}"))
        } else {
            OracleError::Malformed(e.to_string())
        }
    })?;

    let percent = match &raw.confidence {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    }
    .filter(|p| p.is_finite())
    .ok_or_else(|| OracleError::Malformed(format!("confidence is not a number: {}", raw.confidence)))?;

    Ok(OracleResult {
        call: Call::from_oracle(&raw.verdict),
        confidence: percent.clamp(0.0, 100.0) / 100.0,
        explanation: raw.explanation.trim().to_string(),
        bias_hint: raw.bias_type.as_deref().map(BiasLabel::from_hint),
    })
}
