//! Public records and the error type shared by every entry point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// RECORDS
// ═══════════════════════════════════════════════════════════════════════════════

/// One document as handed to the index by the document-lifecycle collaborator.
///
/// Upserting an entry with an existing `doc_id` replaces the previous one
/// entirely; there are no partial updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub doc_id: i64,
    /// Extracted plain text. Empty when extraction failed upstream.
    pub content: String,
    /// Lowercase file kind such as "pdf" or "md"
    pub file_type: String,
    /// `None` means the document lives at the root
    pub folder_id: Option<i64>,
    pub tag_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

impl IndexEntry {
    pub fn new(doc_id: i64, content: impl Into<String>, file_type: impl Into<String>) -> Self {
        Self {
            doc_id,
            content: content.into(),
            file_type: file_type.into(),
            folder_id: None,
            tag_ids: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_folder(mut self, folder_id: Option<i64>) -> Self {
        self.folder_id = folder_id;
        self
    }

    pub fn with_tags(mut self, tag_ids: impl IntoIterator<Item = i64>) -> Self {
        self.tag_ids = tag_ids.into_iter().collect();
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Stored fields read back from the index for filtering and display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredEntry {
    pub doc_id: i64,
    pub content: String,
    pub file_type: String,
    pub folder_id: Option<i64>,
    pub tag_ids: Vec<i64>,
    /// Absent only for entries written without a timestamp
    pub created_at: Option<DateTime<Utc>>,
}

/// One ranked result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub doc_id: i64,
    pub file_type: String,
    pub folder_id: Option<i64>,
    /// BM25 relevance; higher is better, unbounded
    pub score: f32,
    pub highlight: String,
}

/// A page of results plus the filtered match count.
///
/// `total` counts matches that survived the filters inside the ranking
/// window (`skip + limit + overfetch` candidates). When a corpus has more
/// term matches than the window holds, `total` is a lower bound.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchPage {
    pub items: Vec<SearchHit>,
    pub total: usize,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Error type for every public docsearch operation
#[derive(Debug, Error)]
pub enum DocSearchError {
    #[error("Search backend is not available: {0}")]
    SearchUnavailable(String),
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("Invalid filter value: {0}")]
    InvalidFilterValue(String),
    #[error("Index error: {0}")]
    IndexError(String),
    #[error("Outbox error: {0}")]
    OutboxError(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Search task did not complete")]
    Cancelled,
}

impl DocSearchError {
    /// True when the caller should answer "service unavailable" rather than
    /// "no results" or "bad request".
    pub fn is_unavailable(&self) -> bool {
        matches!(self, DocSearchError::SearchUnavailable(_))
    }
}

impl From<crate::indexer::IndexerError> for DocSearchError {
    fn from(e: crate::indexer::IndexerError) -> Self {
        DocSearchError::IndexError(e.to_string())
    }
}

impl From<crate::outbox::OutboxError> for DocSearchError {
    fn from(e: crate::outbox::OutboxError) -> Self {
        DocSearchError::OutboxError(e.to_string())
    }
}

impl From<crate::config::ConfigError> for DocSearchError {
    fn from(e: crate::config::ConfigError) -> Self {
        DocSearchError::Config(e.to_string())
    }
}

pub type DocSearchResult<T> = Result<T, DocSearchError>;
