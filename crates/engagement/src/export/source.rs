//! Source CSV whose join column supplies the URLs to scan.

use std::path::Path;

use crate::error::{ExtractError, ExtractResult};

/// Parsed source CSV.
#[derive(Debug, Clone)]
pub struct SourceTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    join_index: usize,
}

impl SourceTable {
    /// Load a CSV file with a header row and locate the join column.
    pub fn load(path: &Path, join_column: &str) -> ExtractResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ExtractError::FileRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let table = Self::parse(&content, join_column, &path.display().to_string())?;
        tracing::info!(
            path = %path.display(),
            rows = table.rows.len(),
            column = join_column,
            "Loaded source CSV"
        );
        Ok(table)
    }

    /// Parse CSV text. `origin` names the source in error messages.
    pub fn parse(content: &str, join_column: &str, origin: &str) -> ExtractResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let join_index = headers
            .iter()
            .position(|h| h == join_column)
            .ok_or_else(|| ExtractError::MissingColumn {
                column: join_column.to_string(),
                path: origin.to_string(),
            })?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        Ok(Self {
            headers,
            rows,
            join_index,
        })
    }

    /// Name of the join column.
    pub fn join_column(&self) -> &str {
        &self.headers[self.join_index]
    }

    /// Join column values, in row order.
    pub fn urls(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| row[self.join_index].clone())
            .collect()
    }

    /// Header names of every column except the join column.
    pub fn extra_headers(&self) -> Vec<&str> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != self.join_index)
            .map(|(_, h)| h.as_str())
            .collect()
    }

    /// Values of every column except the join column for a row.
    pub fn extra_values(&self, row: usize) -> Vec<&str> {
        self.rows[row]
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != self.join_index)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Join column value of a row.
    pub fn key(&self, row: usize) -> &str {
        &self.rows[row][self.join_index]
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
