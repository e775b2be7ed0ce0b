//! Query engine: ranked retrieval, post-filtering and pagination
//!
//! 1. Tokenize the query with the index tokenizer.
//! 2. Fetch the best `skip + limit + overfetch` documents matching any term.
//! 3. Drop candidates that fail the attribute filters.
//! 4. `total` is the number of survivors; the page is `[skip, skip + limit)`.
//! 5. Highlight the page.
//!
//! Filters run after ranking, so `total` only counts matches inside the
//! window. A corpus with more matches than the window reports a lower bound.

use crate::highlight::Highlighter;
use crate::indexer::{Indexer, RankedDoc};
use crate::interface::{DocSearchError, DocSearchResult, SearchHit, SearchPage, StoredEntry};
use chrono::{DateTime, Utc};
use rayon::prelude::*;

/// Extra candidates fetched beyond `skip + limit` to absorb post-filtering
pub const DEFAULT_OVERFETCH: usize = 100;

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 100;

/// Attribute filters. Every `None` (or empty tag list) matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilters {
    /// Exact, case-sensitive match on the stored file type
    pub file_type: Option<String>,
    pub folder_id: Option<i64>,
    /// Matches entries sharing at least one tag with this list
    pub tag_ids: Option<Vec<i64>>,
    /// Inclusive lower bound on `created_at`
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`
    pub date_to: Option<DateTime<Utc>>,
}

impl SearchFilters {
    pub fn file_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = Some(file_type.into());
        self
    }

    pub fn folder(mut self, folder_id: i64) -> Self {
        self.folder_id = Some(folder_id);
        self
    }

    pub fn tags(mut self, tag_ids: impl IntoIterator<Item = i64>) -> Self {
        self.tag_ids = Some(tag_ids.into_iter().collect());
        self
    }

    pub fn created_from(mut self, from: DateTime<Utc>) -> Self {
        self.date_from = Some(from);
        self
    }

    pub fn created_to(mut self, to: DateTime<Utc>) -> Self {
        self.date_to = Some(to);
        self
    }

    pub fn matches(&self, entry: &StoredEntry) -> bool {
        if let Some(file_type) = &self.file_type {
            if entry.file_type != *file_type {
                return false;
            }
        }
        if let Some(folder_id) = self.folder_id {
            if entry.folder_id != Some(folder_id) {
                return false;
            }
        }
        if let Some(tag_ids) = self.tag_ids.as_deref().filter(|t| !t.is_empty()) {
            if !tag_ids.iter().any(|t| entry.tag_ids.contains(t)) {
                return false;
            }
        }
        // Date bounds only apply when the entry has a timestamp
        if let Some(created_at) = entry.created_at {
            if self.date_from.is_some_and(|from| created_at < from) {
                return false;
            }
            if self.date_to.is_some_and(|to| created_at > to) {
                return false;
            }
        }
        true
    }
}

/// A validated-on-execute search call.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub filters: SearchFilters,
    pub skip: usize,
    pub limit: usize,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            filters: SearchFilters::default(),
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_page(mut self, skip: usize, limit: usize) -> Self {
        self.skip = skip;
        self.limit = limit;
        self
    }

    pub fn validate(&self) -> DocSearchResult<()> {
        if self.query.trim().is_empty() {
            return Err(DocSearchError::InvalidQuery("query must not be empty".into()));
        }
        if self.limit == 0 || self.limit > MAX_LIMIT {
            return Err(DocSearchError::InvalidFilterValue(format!(
                "limit must be between 1 and {}, got {}",
                MAX_LIMIT, self.limit
            )));
        }
        Ok(())
    }
}

/// Turns a [`SearchRequest`] into a [`SearchPage`] against one index.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    overfetch: usize,
    highlighter: Highlighter,
}

impl QueryEngine {
    pub fn new(overfetch: usize, highlighter: Highlighter) -> Self {
        Self { overfetch, highlighter }
    }

    pub fn highlighter(&self) -> &Highlighter {
        &self.highlighter
    }

    pub fn execute(&self, indexer: &Indexer, request: &SearchRequest) -> DocSearchResult<SearchPage> {
        request.validate()?;

        let terms = indexer.tokenizer().unique_terms(&request.query);
        if terms.is_empty() {
            return Err(DocSearchError::InvalidQuery(format!(
                "'{}' contains no searchable terms",
                request.query.trim()
            )));
        }

        #[cfg(feature = "perf-log")]
        let t0 = std::time::Instant::now();

        // The indexer clamps the window to the corpus size
        let window = request
            .skip
            .saturating_add(request.limit)
            .saturating_add(self.overfetch);
        let candidates = indexer.ranked(&terms, window)?;
        #[cfg(feature = "perf-log")]
        let num_candidates = candidates.len();
        #[cfg(feature = "perf-log")]
        let t1 = std::time::Instant::now();

        let filtered: Vec<RankedDoc> = candidates
            .into_iter()
            .filter(|c| request.filters.matches(&c.entry))
            .collect();
        let total = filtered.len();

        let page: Vec<RankedDoc> = filtered
            .into_iter()
            .skip(request.skip)
            .take(request.limit)
            .collect();

        // Indexed parallel iterator: collect keeps rank order
        let items: Vec<SearchHit> = page
            .into_par_iter()
            .map(|c| SearchHit {
                highlight: self.highlighter.highlight(&c.entry.content, &request.query),
                doc_id: c.entry.doc_id,
                file_type: c.entry.file_type,
                folder_id: c.entry.folder_id,
                score: c.score,
            })
            .collect();

        #[cfg(feature = "perf-log")]
        {
            let t2 = std::time::Instant::now();
            tracing::info!(
                target: "docsearch::perf",
                retrieve_ms = (t1 - t0).as_secs_f64() * 1000.0,
                filter_highlight_ms = (t2 - t1).as_secs_f64() * 1000.0,
                candidates = num_candidates,
                total,
                "query executed"
            );
        }

        tracing::debug!(
            target: "docsearch::query",
            terms = terms.len(),
            window,
            total,
            returned = items.len(),
            "search completed"
        );

        Ok(SearchPage { items, total })
    }
}
