//! Combining the oracle's judgment with the rule-based signals.
//!
//! # Weighting rule
//!
//! The verdict's confidence is the oracle's confidence, unchanged. Bias and
//! credibility are reported next to it as independent signals and are never
//! blended into that number.
//!
//! # Override policy
//!
//! The call itself can change in exactly one place,
//! [`apply_credibility_policy`], according to the configured
//! [`CredibilityPolicy`]. Nothing else in this module touches the call.

use crate::error::AnalysisError;
use crate::models::{BiasFinding, Call, CredibilityEntry, OracleResult, Verdict};
use crate::oracle::OracleError;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// How a domain's credibility may change the oracle's call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CredibilityPolicy {
    /// Credibility is informational only.
    Independent,
    /// A REAL call for a domain scoring strictly below `below` becomes
    /// UNCERTAIN. FAKE and UNCERTAIN calls are never changed.
    DowngradeReal { below: u8 },
}

impl Default for CredibilityPolicy {
    fn default() -> Self {
        CredibilityPolicy::DowngradeReal { below: 20 }
    }
}

/// Outcome of the override policy for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub call: Call,
    /// Set when the call was changed; appended to the explanation.
    pub note: Option<String>,
}

/// The single place where credibility may override the oracle's call.
pub fn apply_credibility_policy(
    call: Call,
    credibility: &CredibilityEntry,
    policy: CredibilityPolicy,
) -> PolicyDecision {
    match policy {
        CredibilityPolicy::DowngradeReal { below }
            if call == Call::Real && credibility.score < below =>
        {
            PolicyDecision {
                call: Call::Uncertain,
                note: Some(format!(
                    "Downgraded from REAL: {} has a credibility score of {}/100, below the {} threshold.",
                    credibility.domain, credibility.score, below
                )),
            }
        }
        _ => PolicyDecision { call, note: None },
    }
}

/// Build the verdict from the oracle outcome and the rule-based signals.
///
/// Deterministic: identical inputs always give an identical verdict.
///
/// # Errors
///
/// [`AnalysisError::OracleUnavailable`] when `oracle` is an error. No
/// verdict is built in that case.
pub fn aggregate(
    oracle: Result<OracleResult, OracleError>,
    bias: BiasFinding,
    credibility: CredibilityEntry,
    policy: CredibilityPolicy,
) -> Result<Verdict, AnalysisError> {
    let judgment = oracle.map_err(|e| {
        warn!(error = %e, "Oracle unavailable; no verdict");
        AnalysisError::OracleUnavailable {
            reason: e.to_string(),
        }
    })?;

    let decision = apply_credibility_policy(judgment.call, &credibility, policy);
    let explanation = match decision.note {
        Some(ref note) if judgment.explanation.is_empty() => note.clone(),
        Some(ref note) => format!("{} {}", judgment.explanation, note),
        None => judgment.explanation,
    };

    if decision.call != judgment.call {
        info!(
            from = %judgment.call,
            to = %decision.call,
            domain = %credibility.domain,
            score = credibility.score,
            "Credibility policy changed the call"
        );
    }

    Ok(Verdict {
        call: decision.call,
        confidence: judgment.confidence.clamp(0.0, 1.0),
        bias,
        credibility,
        explanation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BiasLabel, CredibilityLabel};
    use std::time::Duration;

    fn oracle(call: Call, confidence: f64) -> OracleResult {
        OracleResult {
            call,
            confidence,
            explanation: "The model's reasoning.".to_string(),
            bias_hint: Some(BiasLabel::Neutral),
        }
    }

    fn entry(domain: &str, score: u8, label: CredibilityLabel) -> CredibilityEntry {
        CredibilityEntry {
            domain: domain.to_string(),
            score,
            label,
        }
    }

    fn sensational() -> BiasFinding {
        BiasFinding {
            label: BiasLabel::Sensational,
            matched_terms: vec!["allegedly".into(), "allegedly".into(), "outrageous".into()],
        }
    }

    #[test]
    fn test_confidence_is_oracle_confidence() {
        let verdict = aggregate(
            Ok(oracle(Call::Real, 0.83)),
            sensational(),
            entry("cnn.com", 60, CredibilityLabel::Medium),
            CredibilityPolicy::default(),
        )
        .unwrap();
        assert_eq!(verdict.call, Call::Real);
        assert_eq!(verdict.confidence, 0.83);
        assert_eq!(verdict.bias, sensational());
        assert_eq!(verdict.credibility.score, 60);
        assert_eq!(verdict.explanation, "The model's reasoning.");
    }

    #[test]
    fn test_deterministic() {
        let run = || {
            aggregate(
                Ok(oracle(Call::Fake, 0.7)),
                sensational(),
                entry("infowars.com", 30, CredibilityLabel::Low),
                CredibilityPolicy::default(),
            )
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_oracle_timeout_is_unavailable() {
        let err = aggregate(
            Err(OracleError::Timeout(Duration::from_secs(30))),
            BiasFinding::neutral(),
            CredibilityEntry::unknown("example.com"),
            CredibilityPolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::OracleUnavailable { .. }));
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_downgrade_real_below_threshold() {
        let verdict = aggregate(
            Ok(oracle(Call::Real, 0.9)),
            BiasFinding::neutral(),
            entry("theonion.com", 10, CredibilityLabel::Low),
            CredibilityPolicy::DowngradeReal { below: 20 },
        )
        .unwrap();
        assert_eq!(verdict.call, Call::Uncertain);
        assert_eq!(verdict.confidence, 0.9);
        assert!(verdict.explanation.starts_with("The model's reasoning. Downgraded from REAL"));
        assert!(verdict.explanation.contains("theonion.com"));
    }

    #[test]
    fn test_policy_threshold_is_strict() {
        let at = entry("edge.example", 20, CredibilityLabel::Low);
        let decision =
            apply_credibility_policy(Call::Real, &at, CredibilityPolicy::DowngradeReal { below: 20 });
        assert_eq!(decision.call, Call::Real);
        assert_eq!(decision.note, None);
    }

    #[test]
    fn test_policy_never_touches_fake_or_uncertain() {
        let satire = entry("theonion.com", 10, CredibilityLabel::Low);
        for call in [Call::Fake, Call::Uncertain] {
            let decision = apply_credibility_policy(call, &satire, CredibilityPolicy::default());
            assert_eq!(decision.call, call);
        }
    }

    #[test]
    fn test_independent_policy_never_overrides() {
        let satire = entry("theonion.com", 10, CredibilityLabel::Low);
        let decision =
            apply_credibility_policy(Call::Real, &satire, CredibilityPolicy::Independent);
        assert_eq!(decision.call, Call::Real);
        assert!(decision.note.is_none());
    }

    #[test]
    fn test_unknown_domain_does_not_override() {
        let verdict = aggregate(
            Ok(oracle(Call::Real, 0.6)),
            BiasFinding::neutral(),
            CredibilityEntry::unknown("unlisted.example"),
            CredibilityPolicy::default(),
        )
        .unwrap();
        assert_eq!(verdict.call, Call::Real);
    }

    #[test]
    fn test_policy_yaml_shape() {
        let policy: CredibilityPolicy =
            serde_yaml::from_str("mode: downgrade_real\nbelow: 35\n").unwrap();
        assert_eq!(policy, CredibilityPolicy::DowngradeReal { below: 35 });
        let policy: CredibilityPolicy = serde_yaml::from_str("mode: independent\n").unwrap();
        assert_eq!(policy, CredibilityPolicy::Independent);
    }
}
