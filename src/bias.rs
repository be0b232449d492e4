//! Keyword rule engine for bias detection.
//!
//! Each bias category owns a fixed list of terms. Text is matched
//! case-insensitively on word boundaries and every occurrence counts. The
//! category with the most occurrences wins; equal counts resolve by the fixed
//! priority order Sensational, then Left, then Right. No matches at all means
//! `Neutral`.
//!
//! The compiled rules live in a process-wide static and are never mutated.

use crate::models::{BiasFinding, BiasLabel};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use tracing::debug;

const LEFT_TERMS: &[&str] = &[
    "progressive", "liberal", "social justice", "equality", "diversity", "inclusive",
    "climate change", "sustainable", "renewable", "tax the rich", "medicare for all",
    "gun control", "immigration reform", "reproductive rights", "pro-choice",
    "minimum wage", "workers rights", "union", "regulation", "big pharma",
    "corporate greed", "wealth gap", "systemic racism", "defund",
];

const RIGHT_TERMS: &[&str] = &[
    "conservative", "traditional values", "family values", "patriot", "freedom",
    "liberty", "free market", "capitalism", "small government", "constitution",
    "second amendment", "pro-life", "border security", "law and order",
    "american dream", "individual responsibility", "fiscal responsibility",
    "deregulation", "job creators", "socialist", "communist", "radical left",
    "mainstream media", "fake news", "deep state", "swamp",
];

/// Sensational, emotionally loaded, clickbait and insinuating language.
const SENSATIONAL_TERMS: &[&str] = &[
    // emotionally loaded
    "shocking", "outrageous", "disgusting", "horrifying", "devastating", "unbelievable",
    "stunning", "alarming", "terrifying", "catastrophic", "explosive", "bombshell",
    "scandalous", "mind-blowing", "heartbreaking", "miraculous",
    // sensational framing
    "breaking", "urgent", "exclusive", "revealed", "exposed", "uncovered", "conspiracy",
    "coverup", "cover-up", "allegedly", "undoubtedly", "absolutely", "totally",
    // clickbait
    "you won't believe", "this will shock you", "what happens next",
    "the reason will surprise you", "doctors hate this", "this one trick",
    "wait until you see", "you need to see this", "this changes everything",
    "gone wrong", "gone viral", "must see", "can't unsee", "mind blown", "game changer",
    // manipulative appeals
    "don't let them", "they don't want you", "government hiding", "media won't tell",
    "wake up", "open your eyes", "hidden agenda", "real americans", "true patriots",
    "brainwashed", "propaganda", "time is running out",
];

/// One category's compiled matcher.
#[derive(Debug)]
struct CategoryRule {
    label: BiasLabel,
    pattern: Regex,
}

impl CategoryRule {
    fn new(label: BiasLabel, terms: &[&str]) -> Self {
        // Longest first so a phrase wins over any shorter term it contains.
        let mut sorted: Vec<&str> = terms.to_vec();
        sorted.sort_by_key(|t| std::cmp::Reverse(t.len()));
        let alternation = sorted
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = RegexBuilder::new(&format!(r"\b(?:{alternation})\b"))
            .case_insensitive(true)
            .build()
            .expect("bias rule terms compile to a valid regex");
        Self { label, pattern }
    }

    /// Every occurrence, lowercased, in order of appearance.
    fn matches(&self, text: &str) -> Vec<String> {
        self.pattern
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .collect()
    }
}

/// The fixed rule table, compiled.
#[derive(Debug)]
pub struct BiasRules {
    /// Stored in tie-break priority order.
    categories: Vec<CategoryRule>,
}

static RULES: Lazy<BiasRules> = Lazy::new(BiasRules::builtin);

/// Score `text` against the process-wide rule table.
pub fn score_bias(text: &str) -> BiasFinding {
    RULES.score(text)
}

impl BiasRules {
    fn builtin() -> Self {
        let table: [(BiasLabel, &[&str]); 3] = [
            (BiasLabel::Sensational, SENSATIONAL_TERMS),
            (BiasLabel::Left, LEFT_TERMS),
            (BiasLabel::Right, RIGHT_TERMS),
        ];
        let categories = table
            .into_iter()
            .map(|(label, terms)| CategoryRule::new(label, terms))
            .collect();
        Self { categories }
    }

    /// Classify `text`.
    ///
    /// `matched_terms` holds the winning category's matches only, one entry
    /// per occurrence, in the order they appear in the text.
    pub fn score(&self, text: &str) -> BiasFinding {
        if text.trim().is_empty() {
            return BiasFinding::neutral();
        }
        // Typographic apostrophes would otherwise defeat phrases like "won't".
        let text = text.replace('\u{2019}', "'");

        let mut best: Option<(BiasLabel, Vec<String>)> = None;
        for rule in &self.categories {
            let found = rule.matches(&text);
            debug!(category = %rule.label, count = found.len(), "bias rule matches");
            let beats_best = match &best {
                None => !found.is_empty(),
                Some((_, terms)) => found.len() > terms.len(),
            };
            if beats_best {
                best = Some((rule.label, found));
            }
        }

        match best {
            Some((label, matched_terms)) => BiasFinding {
                label,
                matched_terms,
            },
            None => BiasFinding::neutral(),
        }
    }
}
