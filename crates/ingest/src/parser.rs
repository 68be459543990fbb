//! Header-first delimited file parsing into [`FlatRecord`]s.

use std::path::{Path, PathBuf};

use roster_core::{FieldValue, FlatRecord};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::tokenizer::tokenize_row;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read CSV file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV file is empty: {path}")]
    Empty { path: PathBuf },
}

#[derive(Debug, Clone, Copy)]
pub struct CsvOptions {
    pub delimiter: char,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self { delimiter: ',' }
    }
}

/// A data line that was dropped because its field count did not match the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    /// 1-based physical line number in the source.
    pub line: usize,
    pub expected: usize,
    pub found: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    pub headers: Vec<String>,
    pub records: Vec<FlatRecord>,
    pub skipped: Vec<SkippedRow>,
}

impl ParsedFile {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RecordParser {
    options: CsvOptions,
}

impl RecordParser {
    pub fn new(options: CsvOptions) -> Self {
        Self { options }
    }

    pub fn with_delimiter(delimiter: char) -> Self {
        Self::new(CsvOptions { delimiter })
    }

    /// Read and parse a whole file. The entire file is held in memory.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<ParsedFile, ParseError> {
        let path = path.as_ref();
        info!("Parsing CSV file: {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|source| ParseError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed = self.parse_str(&content).ok_or_else(|| ParseError::Empty {
            path: path.to_path_buf(),
        })?;
        info!(
            records = parsed.records.len(),
            skipped = parsed.skipped_count(),
            "Parsed {} records",
            parsed.records.len()
        );
        Ok(parsed)
    }

    /// Parse in-memory text. Returns `None` when there are no non-blank lines.
    pub fn parse_str(&self, content: &str) -> Option<ParsedFile> {
        let mut lines = content
            .split('\n')
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| (idx + 1, line));

        let (_, header_line) = lines.next()?;
        let headers = self.parse_row(header_line);

        let mut parsed = ParsedFile {
            headers,
            ..ParsedFile::default()
        };

        for (line_no, line) in lines {
            let values = self.parse_row(line);
            if values.len() == parsed.headers.len() {
                parsed.records.push(create_record(&parsed.headers, &values));
            } else {
                warn!(
                    line = line_no,
                    expected = parsed.headers.len(),
                    found = values.len(),
                    "Skipping row {}: column count mismatch",
                    line_no
                );
                parsed.skipped.push(SkippedRow {
                    line: line_no,
                    expected: parsed.headers.len(),
                    found: values.len(),
                });
            }
        }

        Some(parsed)
    }

    pub fn parse_row(&self, line: &str) -> Vec<String> {
        tokenize_row(line, self.options.delimiter)
    }
}

/// Zip headers with values, coercing numbers. Columns with a blank header are dropped;
/// a repeated header keeps the later column's value.
pub fn create_record(headers: &[String], values: &[String]) -> FlatRecord {
    let mut record = FlatRecord::with_capacity(headers.len());
    for (i, header) in headers.iter().enumerate() {
        let header = header.trim();
        if header.is_empty() {
            continue;
        }
        let raw = values.get(i).map(String::as_str).unwrap_or("");
        record.insert(header.to_string(), FieldValue::parse(raw));
    }
    record
}
