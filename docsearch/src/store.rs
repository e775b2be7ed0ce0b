//! Index backends behind one interface.
//!
//! The backend is chosen once, when the service is built: [`ActiveIndex`]
//! when tantivy opened cleanly, [`UnavailableIndex`] when it did not or when
//! search is switched off. Callers never check availability themselves.

use crate::highlight::{HighlightOptions, Highlighter};
use crate::indexer::{IndexStats, Indexer};
use crate::interface::{DocSearchError, DocSearchResult, IndexEntry, SearchPage, StoredEntry};
use crate::query::{QueryEngine, SearchRequest};
use std::sync::Arc;

/// Operations every index backend provides.
pub trait SearchIndex: Send + Sync {
    /// Add or fully replace the entry for `entry.doc_id`
    fn upsert(&self, entry: &IndexEntry) -> DocSearchResult<()>;

    /// Remove `doc_id`; absent ids succeed
    fn delete(&self, doc_id: i64) -> DocSearchResult<()>;

    /// Remove every entry
    fn clear(&self) -> DocSearchResult<()>;

    fn search(&self, request: &SearchRequest) -> DocSearchResult<SearchPage>;

    fn get(&self, doc_id: i64) -> DocSearchResult<Option<StoredEntry>>;

    fn stats(&self) -> DocSearchResult<IndexStats>;

    fn is_available(&self) -> bool;
}

/// Backend over a live tantivy index.
pub struct ActiveIndex {
    indexer: Arc<Indexer>,
    engine: QueryEngine,
}

impl ActiveIndex {
    pub fn new(indexer: Arc<Indexer>, overfetch: usize, highlight: HighlightOptions) -> Self {
        // Highlighting must cut query terms exactly as the index did
        let highlighter = Highlighter::new(indexer.tokenizer(), highlight);
        Self {
            indexer,
            engine: QueryEngine::new(overfetch, highlighter),
        }
    }

    pub fn indexer(&self) -> &Arc<Indexer> {
        &self.indexer
    }
}

impl SearchIndex for ActiveIndex {
    fn upsert(&self, entry: &IndexEntry) -> DocSearchResult<()> {
        Ok(self.indexer.upsert(entry)?)
    }

    fn delete(&self, doc_id: i64) -> DocSearchResult<()> {
        Ok(self.indexer.delete(doc_id)?)
    }

    fn clear(&self) -> DocSearchResult<()> {
        Ok(self.indexer.clear()?)
    }

    fn search(&self, request: &SearchRequest) -> DocSearchResult<SearchPage> {
        self.engine.execute(&self.indexer, request)
    }

    fn get(&self, doc_id: i64) -> DocSearchResult<Option<StoredEntry>> {
        Ok(self.indexer.get(doc_id)?)
    }

    fn stats(&self) -> DocSearchResult<IndexStats> {
        Ok(self.indexer.stats())
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Degraded backend: writes are accepted and dropped, reads fail with
/// [`DocSearchError::SearchUnavailable`].
#[derive(Debug, Clone)]
pub struct UnavailableIndex {
    reason: String,
}

impl UnavailableIndex {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    fn unavailable(&self) -> DocSearchError {
        DocSearchError::SearchUnavailable(self.reason.clone())
    }
}

impl SearchIndex for UnavailableIndex {
    fn upsert(&self, entry: &IndexEntry) -> DocSearchResult<()> {
        tracing::debug!(target: "docsearch::store", doc_id = entry.doc_id, "search unavailable, upsert dropped");
        Ok(())
    }

    fn delete(&self, doc_id: i64) -> DocSearchResult<()> {
        tracing::debug!(target: "docsearch::store", doc_id, "search unavailable, delete dropped");
        Ok(())
    }

    fn clear(&self) -> DocSearchResult<()> {
        Ok(())
    }

    fn search(&self, _request: &SearchRequest) -> DocSearchResult<SearchPage> {
        Err(self.unavailable())
    }

    fn get(&self, _doc_id: i64) -> DocSearchResult<Option<StoredEntry>> {
        Err(self.unavailable())
    }

    fn stats(&self) -> DocSearchResult<IndexStats> {
        Err(self.unavailable())
    }

    fn is_available(&self) -> bool {
        false
    }
}
