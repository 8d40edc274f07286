//! Bulk posting import from ATS CSV exports.
//!
//! Parsing is strict about the file shape (headers, quoting, column counts)
//! and lenient about individual rows: a row that cannot become a posting is
//! reported with its spreadsheet row number instead of failing the batch.

mod mapping;
mod normalizer;
mod parser;

use std::collections::HashSet;
use std::io::Read;

use serde::Serialize;

use crate::marketplace::postings::PostingDraft;

#[derive(Debug)]
pub enum PostingImportError {
    Csv(csv::Error),
}

impl std::fmt::Display for PostingImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostingImportError::Csv(err) => write!(f, "invalid posting CSV data: {}", err),
        }
    }
}

impl std::error::Error for PostingImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PostingImportError::Csv(err) => Some(err),
        }
    }
}

impl From<csv::Error> for PostingImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// One rejected row and why it was left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    pub row: usize,
    pub reason: String,
}

/// Outcome of a parse: drafts ready for bulk creation plus the rows that
/// did not make it.
#[derive(Debug)]
pub struct PostingImport {
    pub drafts: Vec<PostingDraft>,
    pub skipped: Vec<SkippedRow>,
}

pub struct PostingCsvImporter;

impl PostingCsvImporter {
    /// Excel exports open with a BOM; strip it so the header row matches.
    pub fn from_str(csv: &str) -> Result<PostingImport, PostingImportError> {
        Self::from_reader(csv.strip_prefix('\u{feff}').unwrap_or(csv).as_bytes())
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<PostingImport, PostingImportError> {
        let mut drafts: Vec<PostingDraft> = Vec::new();
        let mut skipped = Vec::new();
        let mut seen_titles: HashSet<String> = HashSet::new();

        for (row, record) in parser::parse_rows(reader)? {
            match record.into_draft() {
                Ok(draft) => {
                    if !seen_titles.insert(normalizer::normalize_label(&draft.title)) {
                        skipped.push(SkippedRow {
                            row,
                            reason: format!("duplicate title {:?}, first row wins", draft.title),
                        });
                        continue;
                    }
                    drafts.push(draft);
                }
                Err(reason) => skipped.push(SkippedRow { row, reason }),
            }
        }

        Ok(PostingImport { drafts, skipped })
    }
}
