//! Writing finished reports to disk.
//!
//! # Submodules
//!
//! - [`json`]: the exported verdict plus report context, one file per analysis
//! - [`markdown`]: a human-readable report, one file per analysis
//! - [`history`]: an append-only JSON Lines log of every analysis
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     └── 142501874_city-council-approves-budget.json
//!
//! markdown_output_dir/
//! └── 2025-05-06_142501874_city-council-approves-budget.md
//!
//! history_dir/
//! └── history.jsonl
//! ```
//!
//! Dates and times come from the report's `analyzed_at`, in UTC, down to the
//! millisecond. A report never replaces an existing file: a taken name gets a
//! `-2`, `-3`, ... suffix instead.

pub mod history;
pub mod json;
pub mod markdown;

use crate::models::Report;
use crate::utils::slugify;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const SLUG_MAX: usize = 60;
const MAX_NAME_SUFFIX: usize = 1000;

/// `(YYYY-MM-DD, HHMMSSmmm_slug)` for a report's output files.
///
/// The slug comes from the title, else the source URL, else `pasted-text`.
pub fn report_stem(report: &Report) -> (String, String) {
    let date = report.analyzed_at.format("%Y-%m-%d").to_string();
    let time = report.analyzed_at.format("%H%M%S%3f");
    let basis = report
        .title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .or(report.source_url.as_deref())
        .unwrap_or("pasted text");
    (date, format!("{time}_{}", slugify(basis, SLUG_MAX)))
}

/// Create `{dir}/{stem}.{ext}`, or the first free `{stem}-N.{ext}`, and
/// write `contents` to it.
pub async fn write_new_file(
    dir: &Path,
    stem: &str,
    ext: &str,
    contents: &[u8],
) -> std::io::Result<PathBuf> {
    for n in 1..=MAX_NAME_SUFFIX {
        let name = if n == 1 {
            format!("{stem}.{ext}")
        } else {
            format!("{stem}-{n}.{ext}")
        };
        let path = dir.join(name);
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(mut file) => {
                file.write_all(contents).await?;
                file.flush().await?;
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
    Err(std::io::Error::new(
        ErrorKind::AlreadyExists,
        format!("no free file name for {stem}.{ext} in {}", dir.display()),
    ))
}
