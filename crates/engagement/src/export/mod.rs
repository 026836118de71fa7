//! CSV input and output.
//!
//! Reads the optional source CSV, joins results back onto it and writes the
//! final file.

mod source;
mod writer;

pub use source::SourceTable;
pub use writer::{quote, render_csv, write_csv, METRIC_HEADERS};

use std::path::{Path, PathBuf};

use crate::error::ExtractResult;
use crate::twitter::ExtractionResult;

/// File name used when the output is a directory or omitted.
pub const DEFAULT_FILE_NAME: &str = "results.csv";

/// Resolve where results are written.
///
/// A path with an extension is used as-is; anything else is treated as a
/// directory that receives `results.csv`. No path means `results.csv` in the
/// working directory.
pub fn resolve_output_path(output: Option<&Path>) -> PathBuf {
    match output {
        Some(path) if path.extension().is_some() => path.to_path_buf(),
        Some(dir) => dir.join(DEFAULT_FILE_NAME),
        None => PathBuf::from(DEFAULT_FILE_NAME),
    }
}

/// Directory that holds the resolved output file.
pub fn output_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Render and write results, returning the path written.
pub fn export(
    results: &[ExtractionResult],
    source: Option<&SourceTable>,
    output: Option<&Path>,
) -> ExtractResult<PathBuf> {
    let path = resolve_output_path(output);
    let content = render_csv(results, source);
    write_csv(&path, &content)?;
    Ok(path)
}

/// URLs picked for a run, with the size of the input they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlSelection {
    /// URLs to scan, in input order.
    pub urls: Vec<String>,
    /// Number of URLs in the input before the limit was applied.
    pub total: usize,
}

/// Pick the URLs to scan from the source table (when given) or the URL list.
///
/// A positive `limit` keeps the first `limit` URLs; zero, negative or absent
/// scans everything.
pub fn select_urls(
    source: Option<&SourceTable>,
    urls: Vec<String>,
    limit: Option<i64>,
) -> UrlSelection {
    let mut urls = match source {
        Some(table) => table.urls(),
        None => urls,
    };
    let total = urls.len();
    if let Some(limit) = limit
        .filter(|n| *n > 0)
        .and_then(|n| usize::try_from(n).ok())
    {
        urls.truncate(limit);
    }
    UrlSelection { urls, total }
}

/// Console summary line printed at the end of a run.
pub fn summary_line(scanned: usize, total: usize, path: &Path) -> String {
    format!("{scanned}/{total} urls scanned exported at {}", path.display())
}
