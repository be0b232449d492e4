//! Data models for extracted articles, scoring signals, and verdicts.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Article`]: Extracted article text plus how it was obtained
//! - [`CredibilityEntry`]: Static reputation of the publishing domain
//! - [`BiasFinding`]: Output of the keyword bias rules
//! - [`OracleResult`]: The LLM's judgment, taken as-is
//! - [`Verdict`]: The combined result for one article
//! - [`Report`]: A verdict plus the context written to exports and history
//!
//! All of these are immutable once built; nothing in the pipeline mutates a
//! value after handing it on.

use crate::utils::article_hash;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How an article's text was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// JSON-LD `articleBody` or semantic `<article>` markup.
    StructuredData,
    /// Every `<p>` element of the raw HTML.
    HtmlParagraphs,
    /// Paragraphs of HTML rendered by a headless browser.
    HeadlessBrowser,
    /// Text supplied directly by the user; no extraction happened.
    PastedText,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::StructuredData => "structured_data",
            ExtractionMethod::HtmlParagraphs => "html_paragraphs",
            ExtractionMethod::HeadlessBrowser => "headless_browser",
            ExtractionMethod::PastedText => "pasted_text",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional page metadata collected alongside the article body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub published: Option<String>,
    pub description: Option<String>,
}

impl ArticleMetadata {
    /// Fill any field still missing here from `other`.
    pub fn merge_missing(&mut self, other: ArticleMetadata) {
        if self.title.is_none() {
            self.title = other.title;
        }
        if self.author.is_none() {
            self.author = other.author;
        }
        if self.published.is_none() {
            self.published = other.published;
        }
        if self.description.is_none() {
            self.description = other.description;
        }
    }
}

/// An article whose text has been extracted and accepted.
///
/// Only the extractor chain and the pasted-text entry point build these, and
/// both refuse empty text, so `raw_text` is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    /// The URL the text came from, if any.
    pub source_url: Option<String>,
    /// The normalized article body.
    pub raw_text: String,
    /// Which strategy produced `raw_text`.
    pub extraction_method: ExtractionMethod,
    /// Character count of `raw_text`.
    pub length: usize,
    pub metadata: ArticleMetadata,
}

impl Article {
    pub fn new(
        source_url: Option<String>,
        raw_text: String,
        extraction_method: ExtractionMethod,
        metadata: ArticleMetadata,
    ) -> Self {
        let length = raw_text.chars().count();
        Self {
            source_url,
            raw_text,
            extraction_method,
            length,
            metadata,
        }
    }

    pub fn word_count(&self) -> usize {
        self.raw_text.split_whitespace().count()
    }
}

/// Coarse reputation band of a publishing domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredibilityLabel {
    High,
    Medium,
    Low,
    Unknown,
}

impl fmt::Display for CredibilityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CredibilityLabel::High => "High",
            CredibilityLabel::Medium => "Medium",
            CredibilityLabel::Low => "Low",
            CredibilityLabel::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Static credibility of one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredibilityEntry {
    /// The normalized domain the entry was looked up for. Empty when the
    /// article has no source URL.
    pub domain: String,
    /// 0–100.
    pub score: u8,
    pub label: CredibilityLabel,
}

impl CredibilityEntry {
    /// Neutral score given to any domain absent from the table.
    pub const UNKNOWN_SCORE: u8 = 50;

    pub fn unknown(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            score: Self::UNKNOWN_SCORE,
            label: CredibilityLabel::Unknown,
        }
    }

    /// Entry used for pasted text with no source URL.
    pub fn unsourced() -> Self {
        Self::unknown("")
    }

    /// Reader-facing advice for this score band.
    pub fn recommendation(&self) -> &'static str {
        if self.label == CredibilityLabel::Unknown {
            return "Source not in the credibility table; verify claims independently";
        }
        match self.score {
            80..=u8::MAX => "Generally trustworthy source",
            60..=79 => "Use caution and verify with other sources",
            40..=59 => "High risk of bias or misinformation",
            20..=39 => "Unreliable source; verify all claims",
            _ => "Known fake or satire site; not credible",
        }
    }
}

/// Bias category assigned by the rule engine (or hinted by the oracle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BiasLabel {
    Left,
    Right,
    Neutral,
    Sensational,
    Unknown,
}

impl BiasLabel {
    /// Parse a free-form label as returned by the oracle. Emotional and
    /// clickbait framings count as sensational; anything unrecognized is
    /// `Unknown`.
    pub fn from_hint(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => BiasLabel::Left,
            "right" => BiasLabel::Right,
            "neutral" => BiasLabel::Neutral,
            "sensational" | "emotional" | "clickbait" => BiasLabel::Sensational,
            _ => BiasLabel::Unknown,
        }
    }
}

impl fmt::Display for BiasLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BiasLabel::Left => "Left",
            BiasLabel::Right => "Right",
            BiasLabel::Neutral => "Neutral",
            BiasLabel::Sensational => "Sensational",
            BiasLabel::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Result of the bias rule engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiasFinding {
    pub label: BiasLabel,
    /// One entry per occurrence, in order of appearance in the text.
    pub matched_terms: Vec<String>,
}

impl BiasFinding {
    pub fn neutral() -> Self {
        Self {
            label: BiasLabel::Neutral,
            matched_terms: Vec::new(),
        }
    }
}

/// The factuality call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Call {
    Real,
    Fake,
    Uncertain,
}

impl Call {
    /// Anything other than REAL or FAKE is treated as UNCERTAIN.
    pub fn from_oracle(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "REAL" => Call::Real,
            "FAKE" => Call::Fake,
            _ => Call::Uncertain,
        }
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Call::Real => "REAL",
            Call::Fake => "FAKE",
            Call::Uncertain => "UNCERTAIN",
        };
        f.write_str(s)
    }
}

/// What the oracle returned, already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleResult {
    pub call: Call,
    /// In `[0, 1]`.
    pub confidence: f64,
    pub explanation: String,
    /// The oracle's own bias opinion. Informational only.
    pub bias_hint: Option<BiasLabel>,
}

/// The combined judgment for one article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub call: Call,
    /// In `[0, 1]`.
    pub confidence: f64,
    pub bias: BiasFinding,
    pub credibility: CredibilityEntry,
    pub explanation: String,
}

impl Verdict {
    /// Confidence as a whole percentage, for display and export.
    pub fn confidence_percent(&self) -> u8 {
        (self.confidence.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}

/// A verdict together with the context needed to export or store it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub source_url: Option<String>,
    pub title: Option<String>,
    pub extraction_method: ExtractionMethod,
    pub word_count: usize,
    /// Fingerprint of the article text; equal texts from different URLs
    /// share it. Absent on history lines written before it existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_hash: Option<String>,
    pub analyzed_at: DateTime<Utc>,
    pub verdict: Verdict,
}

impl Report {
    pub fn new(article: &Article, verdict: Verdict, analyzed_at: DateTime<Utc>) -> Self {
        Self {
            source_url: article.source_url.clone(),
            title: article.metadata.title.clone(),
            extraction_method: article.extraction_method,
            word_count: article.word_count(),
            article_hash: Some(article_hash(&article.raw_text)),
            analyzed_at,
            verdict,
        }
    }
}
