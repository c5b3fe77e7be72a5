//! In-memory tabular sources
//!
//! A `TabularSource` is the decoded spreadsheet: a header row followed by
//! data rows. Rows whose length differs from the header are normalized on
//! access (padded with empty cells or truncated) rather than rejected.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

const UTF8_BOM: &str = "\u{feff}";

/// Ordered rows of a spreadsheet, header row first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularSource {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TabularSource {
    /// Build a source from a header row and data rows.
    ///
    /// Header cells are trimmed. An empty header row is rejected.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let headers: Vec<String> = headers.into_iter().map(|h| h.trim().to_string()).collect();
        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(Error::EmptySource);
        }
        Ok(Self { headers, rows })
    }

    /// Build a source from raw rows, the first being the header row
    pub fn from_rows<I, R, S>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect::<Vec<String>>());
        let headers = rows.next().ok_or(Error::EmptySource)?;
        Self::new(headers, rows.collect())
    }

    /// Parse CSV text. The first record is the header row.
    pub fn from_csv_str(text: &str) -> Result<Self> {
        Self::from_csv_reader(text.as_bytes())
    }

    /// Parse CSV from any reader, stripping a UTF-8 byte-order mark
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            if index == 0 {
                if let Some(first) = row.first_mut() {
                    if let Some(stripped) = first.strip_prefix(UTF8_BOM) {
                        *first = stripped.to_string();
                    }
                }
            }
            rows.push(row);
        }

        let source = Self::from_rows(rows)?;
        debug!(
            columns = source.headers.len(),
            rows = source.rows.len(),
            "loaded CSV source"
        );
        Ok(source)
    }

    /// Load a CSV file from disk
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_csv_reader(file)
    }

    /// Header row
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns in the header row
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Data row `index` (0-based) normalized to the header width
    pub fn row(&self, index: usize) -> Option<Vec<&str>> {
        self.rows.get(index).map(|row| self.normalize(index, row))
    }

    /// Iterate over data rows normalized to the header width
    pub fn rows(&self) -> impl Iterator<Item = Vec<&str>> + '_ {
        self.rows
            .iter()
            .enumerate()
            .map(|(index, row)| self.normalize(index, row))
    }

    fn normalize<'a>(&'a self, index: usize, row: &'a [String]) -> Vec<&'a str> {
        let width = self.headers.len();
        if row.len() != width {
            warn!(
                row = index + 1,
                expected = width,
                found = row.len(),
                "row width differs from header; padding or truncating"
            );
        }
        (0..width)
            .map(|column| row.get(column).map(String::as_str).unwrap_or(""))
            .collect()
    }
}
