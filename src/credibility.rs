//! Static domain credibility table.
//!
//! The table is built once, on first use, into a process-wide immutable map
//! and never mutated afterwards, so concurrent analyses read it without
//! locking.
//!
//! # Tiers
//!
//! | Tier | Score | Label |
//! |------|-------|-------|
//! | Highly credible | 95 | High |
//! | Good | 80 | High |
//! | Moderate | 60 | Medium |
//! | Low credibility | 30 | Low |
//! | Known fake / satire | 10 | Low |
//! | Institutional suffix (`.gov`, `.edu`, ...) | 95 | High |
//! | Anything else | 50 | Unknown |

use crate::models::{CredibilityEntry, CredibilityLabel};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::net::IpAddr;
use url::Url;

const HIGH: &[&str] = &[
    "reuters.com", "apnews.com", "bbc.com", "bbc.co.uk", "npr.org", "pbs.org",
    "propublica.org", "reuters.co.uk", "theguardian.com", "economist.com", "wsj.com",
    "ft.com", "nature.com", "science.org", "sciencemag.org", "cell.com",
    "thelancet.com", "nejm.org", "who.int", "europa.eu", "thehindu.com",
    "indianexpress.com", "hindustantimes.com", "business-standard.com", "livemint.com",
    "ndtv.com", "scroll.in", "theprint.in", "moneycontrol.com", "newindianexpress.com",
];

const GOOD: &[&str] = &[
    "nytimes.com", "washingtonpost.com", "latimes.com", "usatoday.com", "time.com",
    "newsweek.com", "theatlantic.com", "politico.com", "axios.com", "bloomberg.com",
    "cnbc.com", "forbes.com", "techcrunch.com", "wired.com", "arstechnica.com",
    "scientificamerican.com", "nationalgeographic.com", "smithsonianmag.com",
    "history.com", "news18.com", "indiatoday.in", "dnaindia.com", "deccanherald.com",
    "timesofindia.indiatimes.com", "firstpost.com", "businessline.in",
    "outlookindia.com", "theweek.in", "republicworld.com",
];

const MODERATE: &[&str] = &[
    "cnn.com", "foxnews.com", "msnbc.com", "cbsnews.com", "abcnews.go.com",
    "nbcnews.com", "huffpost.com", "vice.com", "buzzfeednews.com", "vox.com",
    "slate.com", "salon.com", "dailybeast.com", "thehill.com", "newsmax.com",
    "thefederalist.com", "motherjones.com", "jacobinmag.com", "reason.com", "zee5.com",
    "zeenews.india.com", "wionews.com", "opindia.com", "swarajyamag.com",
    "oneindia.com", "freepressjournal.in", "asianetnews.com", "indiatvnews.com",
    "navbharattimes.indiatimes.com",
];

const LOW: &[&str] = &[
    "breitbart.com", "infowars.com", "naturalnews.com", "beforeitsnews.com",
    "yournewswire.com", "neonnettle.com", "truthfeed.com", "bigleaguepolitics.com",
    "thegatewaypundit.com", "occupydemocrats.com", "addictinginfo.com",
    "palmerreport.com", "freedomdaily.com", "conservativetribune.com",
    "westernjournal.com", "politicususa.com", "rawstory.com", "alternet.org",
    "postcard.news", "newsd.in", "timesnownews.com", "punjabkesari.in", "abplive.com",
    "dailyo.in", "janmabhumi.in", "tfipost.com", "kreately.in", "indiavoice.com",
];

const FAKE_OR_SATIRE: &[&str] = &[
    "theonion.com", "clickhole.com", "babylonbee.com", "thebeaverton.com",
    "privateeye.co.uk", "newsthump.com", "worldnewsdailyreport.com",
    "nationalreport.net", "empirenews.net", "huzlers.com", "reductress.com",
    "thefauxy.com",
];

/// Suffixes of government and academic hosts.
const INSTITUTIONAL_SUFFIXES: &[&str] = &["gov", "edu", "ac.uk", "ac.in", "nic.in", "gov.uk"];

/// Public suffixes with two labels, so the registrable domain keeps three.
const TWO_LABEL_SUFFIXES: &[&str] = &[
    "co.uk", "org.uk", "ac.uk", "gov.uk", "co.in", "ac.in", "nic.in", "gov.in",
    "com.au", "co.nz", "co.jp", "com.br",
];

/// Read-only domain → credibility map.
#[derive(Debug)]
pub struct CredibilityTable {
    entries: HashMap<&'static str, (u8, CredibilityLabel)>,
}

static TABLE: Lazy<CredibilityTable> = Lazy::new(CredibilityTable::builtin);

/// The process-wide table.
pub fn table() -> &'static CredibilityTable {
    &TABLE
}

/// Look up a domain (or URL) in the process-wide table.
pub fn lookup(domain: &str) -> CredibilityEntry {
    TABLE.lookup(domain)
}

impl CredibilityTable {
    fn builtin() -> Self {
        let tiers: [(&[&str], u8, CredibilityLabel); 5] = [
            (HIGH, 95, CredibilityLabel::High),
            (GOOD, 80, CredibilityLabel::High),
            (MODERATE, 60, CredibilityLabel::Medium),
            (LOW, 30, CredibilityLabel::Low),
            (FAKE_OR_SATIRE, 10, CredibilityLabel::Low),
        ];
        let mut entries = HashMap::new();
        for (domains, score, label) in tiers {
            for domain in domains {
                entries.insert(*domain, (score, label));
            }
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Look up the credibility of `input`.
    ///
    /// `input` may be a bare domain or a full URL. The full host (minus
    /// `www.`) is tried first, then each parent host down to the registrable
    /// domain, then the institutional suffixes. Anything else gets the explicit neutral
    /// default of `{score: 50, label: Unknown}`.
    pub fn lookup(&self, input: &str) -> CredibilityEntry {
        let Some(host) = normalize_host(input) else {
            return CredibilityEntry::unknown(input.trim().to_ascii_lowercase());
        };
        let registrable = registrable_domain(&host);

        for candidate in parent_hosts(&host, &registrable) {
            if let Some((score, label)) = self.entries.get(candidate) {
                return CredibilityEntry {
                    domain: candidate.to_string(),
                    score: *score,
                    label: *label,
                };
            }
        }

        if is_institutional(&host) {
            return CredibilityEntry {
                domain: registrable,
                score: 95,
                label: CredibilityLabel::High,
            };
        }

        CredibilityEntry::unknown(registrable)
    }
}

/// Reduce a URL or domain to a lowercase host without `www.`.
pub fn normalize_host(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let parsed = Url::parse(&with_scheme).ok()?;
    let host = parsed.host_str()?.trim_end_matches('.').to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    (!host.is_empty()).then_some(host)
}

/// `host` itself, then each parent obtained by dropping the leftmost label,
/// ending at `registrable`.
fn parent_hosts<'a>(host: &'a str, registrable: &'a str) -> impl Iterator<Item = &'a str> {
    std::iter::successors(Some(host), move |current| {
        if current.len() <= registrable.len() {
            return None;
        }
        current.split_once('.').map(|(_, parent)| parent)
    })
}

/// Strip subdomains, keeping the label the publisher registered. IP
/// literals are returned whole.
pub fn registrable_domain(host: &str) -> String {
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if bare.parse::<IpAddr>().is_ok() {
        return host.to_string();
    }
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        return host.to_string();
    }
    let last_two = labels[labels.len() - 2..].join(".");
    let keep = if TWO_LABEL_SUFFIXES.contains(&last_two.as_str()) {
        3
    } else {
        2
    };
    labels[labels.len() - keep..].join(".")
}

fn is_institutional(host: &str) -> bool {
    INSTITUTIONAL_SUFFIXES
        .iter()
        .any(|suffix| host == *suffix || host.ends_with(&format!(".{suffix}")))
}
