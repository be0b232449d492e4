//! Utility functions for text normalization, string manipulation, and file system operations.
//!
//! This module provides helper functions used throughout the application:
//! - Whitespace normalization for extracted article text
//! - Char-boundary-safe truncation for logging and prompts
//! - JSON helpers for handling LLM replies
//! - Slugification for output filenames
//! - File system validation for output directories

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

static BLANK_LINE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t\r]*\n(?:[ \t\r]*\n)*[ \t]*").expect("valid regex"));
static SPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").expect("valid regex"));

/// Normalize extracted text.
///
/// Runs of blank lines collapse to a single blank line, runs of spaces and
/// tabs collapse to one space, and the result is trimmed.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(clean_text("  a   b \n\n\n c "), "a b \n\nc");
/// ```
pub fn clean_text(text: &str) -> String {
    let collapsed = BLANK_LINE_RUNS.replace_all(text, "\n\n");
    SPACE_RUNS.replace_all(&collapsed, " ").trim().to_string()
}

/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &s[..end]
}

/// Keep at most `max_chars` characters of `s`.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    s.char_indices().nth(max_chars).map_or(s, |(i, _)| &s[..i])
}

/// Stable 64-bit FNV-1a fingerprint of `text`, as 16 lowercase hex digits.
///
/// Identifies the same article text across runs and URLs; not a
/// cryptographic hash.
pub fn article_hash(text: &str) -> String {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let hash = text
        .bytes()
        .fold(OFFSET, |h, b| (h ^ u64::from(b)).wrapping_mul(PRIME));
    format!("{hash:016x}")
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes (on a char boundary)
/// with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let head = truncate_to_char_boundary(s, max);
    if head.len() == s.len() {
        s.to_string()
    } else {
        format!("{}…(+{} bytes)", head, s.len() - head.len())
    }
}

/// Strip markdown code fences the model sometimes wraps JSON in.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Slice out the outermost `{ ... }` object of a model reply, if any.
pub fn extract_json_object(response: &str) -> Option<&str> {
    let body = strip_code_blocks(response);
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    (end > start).then(|| &body[start..=end])
}

/// Detect if a serde_json error indicates truncated/incomplete JSON.
///
/// When the LLM response is cut off (e.g., due to token limits), the
/// resulting JSON will fail to parse with an EOF error.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Convert a title or URL to a filename-friendly slug.
///
/// Lowercases, maps every run of non-alphanumeric characters to a single
/// hyphen, trims hyphens from both ends, and caps the length at `max` chars.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slugify("Hello World", 40), "hello-world");
/// assert_eq!(slugify("https://www.bbc.co.uk/news", 40), "https-www-bbc-co-uk-news");
/// ```
pub fn slugify(title: &str, max: usize) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    let capped: String = slug.chars().take(max).collect();
    let capped = capped.trim_end_matches('-').to_string();
    if capped.is_empty() {
        "article".to_string()
    } else {
        capped
    }
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a scratch file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let scratch_path = format!("{}/..__write_check__", path.trim_end_matches('/'));
    stdfs::File::create(&scratch_path)?;
    let _ = stdfs::remove_file(&scratch_path);
    info!("Output directory is writable");
    Ok(())
}
