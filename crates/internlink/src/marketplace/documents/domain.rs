use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::marketplace::accounts::UserId;

/// Identifier for a stored document, e.g. `doc-000001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    Resume,
    CoverLetter,
    Transcript,
    #[default]
    Misc,
}

impl DocumentCategory {
    pub const fn label(&self) -> &'static str {
        match self {
            DocumentCategory::Resume => "resume",
            DocumentCategory::CoverLetter => "cover_letter",
            DocumentCategory::Transcript => "transcript",
            DocumentCategory::Misc => "misc",
        }
    }

    /// Parse the wire label used by the upload form.
    pub fn parse(label: &str) -> Option<DocumentCategory> {
        match label.trim() {
            "resume" => Some(DocumentCategory::Resume),
            "cover_letter" => Some(DocumentCategory::CoverLetter),
            "transcript" => Some(DocumentCategory::Transcript),
            "misc" => Some(DocumentCategory::Misc),
            _ => None,
        }
    }
}

/// A file kept in the document store plus the metadata needed to serve it
/// back. `storage_key` is internal and never leaves the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: DocumentId,
    pub owner: UserId,
    pub file_name: String,
    pub category: DocumentCategory,
    pub content_type: String,
    pub byte_size: usize,
    pub storage_key: String,
    pub uploaded_at: DateTime<Utc>,
}

impl StoredDocument {
    pub fn view(&self) -> DocumentView {
        DocumentView {
            id: self.id.clone(),
            file_name: self.file_name.clone(),
            category: self.category.label(),
            content_type: self.content_type.clone(),
            byte_size: self.byte_size,
            uploaded_at: self.uploaded_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentView {
    pub id: DocumentId,
    pub file_name: String,
    pub category: &'static str,
    pub content_type: String,
    pub byte_size: usize,
    pub uploaded_at: DateTime<Utc>,
}

/// Reduce an uploaded file name to a slug that is safe to embed in a
/// storage key: ASCII letters, digits, dots, dashes and underscores.
/// Anything else collapses to a single dash, and leading dots are dropped
/// so a name can never start a hidden or relative path segment.
pub fn sanitize_file_name(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = false;
    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() || ch == '.' || ch == '_' || ch == '-' {
            slug.push(ch);
            last_dash = false;
        } else if !last_dash && !slug.is_empty() {
            slug.push('-');
            last_dash = true;
        }
    }
    let slug = slug.trim_matches(|c| c == '-' || c == '.');
    if slug.is_empty() {
        "upload".to_string()
    } else {
        slug.to_string()
    }
}
