//! CSV rendering and writing.

use std::collections::{HashMap, VecDeque};
use std::fmt::Write as _;
use std::path::Path;

use super::source::SourceTable;
use crate::error::{ExtractError, ExtractResult};
use crate::twitter::ExtractionResult;

/// Metric columns following the URL (or join) column.
pub const METRIC_HEADERS: [&str; 6] = [
    "type",
    "retweet_count",
    "favorite_count",
    "reply_count",
    "quote_count",
    "related_to",
];

/// Quote-wrap a value, doubling embedded quotes.
pub fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Escape a value only when it would otherwise break the row.
fn escape(value: &str) -> String {
    if value.contains(&[',', '"', '\n', '\r'][..]) {
        quote(value)
    } else {
        value.to_string()
    }
}

fn push_metrics(line: &mut String, result: &ExtractionResult) {
    let _ = write!(
        line,
        ",{},{},{},{},{},{}",
        result.kind,
        result.retweet_count,
        result.favorite_count,
        result.reply_count,
        result.quote_count,
        escape(&result.related_to)
    );
}

/// Render results as CSV, optionally joined with a source table.
///
/// With a source table the n-th result for a join value is matched with the
/// n-th source row holding that value. Results without a matching row get
/// empty extra columns.
///
/// Rendered by hand rather than with `csv::Writer`: extra columns are always
/// quoted while core columns are quoted only when needed.
pub fn render_csv(results: &[ExtractionResult], source: Option<&SourceTable>) -> String {
    let mut csv = String::new();

    let Some(source) = source else {
        csv.push_str("url,");
        csv.push_str(&METRIC_HEADERS.join(","));
        csv.push('\n');
        for result in results {
            csv.push_str(&escape(&result.url));
            push_metrics(&mut csv, result);
            csv.push('\n');
        }
        return csv;
    };

    let extra_headers = source.extra_headers();
    let header: Vec<String> = std::iter::once(escape(source.join_column()))
        .chain(METRIC_HEADERS.iter().map(|h| (*h).to_string()))
        .chain(extra_headers.iter().map(|h| escape(h)))
        .collect();
    csv.push_str(&header.join(","));
    csv.push('\n');

    let mut rows_by_key: HashMap<&str, VecDeque<usize>> = HashMap::new();
    for row in 0..source.len() {
        rows_by_key.entry(source.key(row)).or_default().push_back(row);
    }
    let duplicates = rows_by_key.values().filter(|rows| rows.len() > 1).count();
    if duplicates > 0 {
        tracing::warn!(
            duplicates,
            column = source.join_column(),
            "Join column has duplicate values; matching rows in order"
        );
    }

    for result in results {
        csv.push_str(&escape(&result.url));
        push_metrics(&mut csv, result);

        match rows_by_key
            .get_mut(result.url.as_str())
            .and_then(VecDeque::pop_front)
        {
            Some(row) => {
                for value in source.extra_values(row) {
                    csv.push(',');
                    csv.push_str(&quote(value));
                }
            }
            None => {
                tracing::warn!(url = %result.url, "No source row for result; extra columns left empty");
                for _ in &extra_headers {
                    csv.push_str(",\"\"");
                }
            }
        }
        csv.push('\n');
    }

    csv
}

/// Write the CSV in one go, creating parent directories as needed.
///
/// Content lands in a temporary sibling first and is renamed into place, so
/// the destination never holds a partial file.
pub fn write_csv(path: &Path, content: &str) -> ExtractResult<()> {
    let write_err = |e: std::io::Error| ExtractError::FileWrite {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    std::fs::write(&tmp, content).map_err(write_err)?;
    std::fs::rename(&tmp, path).map_err(write_err)?;

    tracing::info!(path = %path.display(), "Wrote results");
    Ok(())
}
