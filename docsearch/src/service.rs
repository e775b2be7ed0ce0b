//! SearchService - the entry point the rest of the application holds
//!
//! Built once at process start from a [`SearchConfig`] and passed by
//! reference to whoever needs it. Construction picks the backend: if the
//! index cannot be opened, or search is disabled, the service runs on
//! [`UnavailableIndex`] and keeps accepting writes.
//!
//! Concurrency Model:
//! - Writes go through the reindex outbox and are applied by its single consumer
//! - The index writer is serialized by the indexer; queries run concurrently
//!   on per-query searcher snapshots
//! - `search_async` moves the blocking query onto a `spawn_blocking` thread,
//!   using the global fallback runtime when called outside any runtime

use crate::boundary::{SearchParams, SearchResponse};
use crate::config::SearchConfig;
use crate::highlight::HighlightOptions;
use crate::indexer::{IndexStats, Indexer};
use crate::interface::{DocSearchError, DocSearchResult, IndexEntry, SearchPage, StoredEntry};
use crate::outbox::{DrainReport, ReindexOutbox, Reindexer};
use crate::query::SearchRequest;
use crate::store::{ActiveIndex, SearchIndex, UnavailableIndex};
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::Instant;

/// Global fallback Tokio runtime for async calls made outside any runtime
/// context. Shared across all services and never dropped.
static FALLBACK_RUNTIME: Lazy<std::io::Result<tokio::runtime::Runtime>> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .thread_name("docsearch-fallback")
        .enable_all()
        .build()
});

pub struct SearchService {
    config: SearchConfig,
    index: Arc<dyn SearchIndex>,
    reindexer: Reindexer,
}

impl SearchService {
    /// Open the on-disk index and outbox named by `config`.
    ///
    /// Index failures degrade to the unavailable backend; an outbox that
    /// cannot be opened is an error.
    pub fn open(config: SearchConfig) -> DocSearchResult<Self> {
        config.validate()?;
        let index = Self::select_backend(&config);
        let outbox = ReindexOutbox::open(&config.outbox_path)?;
        Ok(Self::with_parts(config, index, outbox))
    }

    /// RAM-only index and outbox, for tests and throwaway corpora
    pub fn in_memory(config: SearchConfig) -> DocSearchResult<Self> {
        config.validate()?;
        let index: Arc<dyn SearchIndex> = if config.search_enabled {
            let indexer = Arc::new(Indexer::new_in_memory(config.segmentation)?);
            Arc::new(ActiveIndex::new(indexer, config.overfetch, Self::highlight_options(&config)))
        } else {
            Arc::new(UnavailableIndex::new("search is disabled by configuration"))
        };
        Ok(Self::with_parts(config, index, ReindexOutbox::open_in_memory()?))
    }

    /// Assemble a service from an explicit backend and outbox.
    /// Events left over from a previous run are applied right away.
    pub fn with_parts(config: SearchConfig, index: Arc<dyn SearchIndex>, outbox: ReindexOutbox) -> Self {
        let reindexer = Reindexer::new(outbox, index.clone());
        match reindexer.drain() {
            Ok(report) if report.applied + report.failed + report.dropped > 0 => {
                tracing::info!(
                    target: "docsearch::service",
                    applied = report.applied,
                    failed = report.failed,
                    "replayed pending reindex events"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(target: "docsearch::service", error = %e, "could not replay pending reindex events");
            }
        }

        Self {
            config,
            index,
            reindexer,
        }
    }

    fn highlight_options(config: &SearchConfig) -> HighlightOptions {
        HighlightOptions::default().with_context_chars(config.context_chars)
    }

    fn select_backend(config: &SearchConfig) -> Arc<dyn SearchIndex> {
        if !config.search_enabled {
            tracing::warn!(target: "docsearch::service", "search disabled by configuration, running without an index");
            return Arc::new(UnavailableIndex::new("search is disabled by configuration"));
        }

        match Indexer::open_or_create(&config.index_dir, config.segmentation, config.writer_heap_bytes) {
            Ok(indexer) => Arc::new(ActiveIndex::new(
                indexer,
                config.overfetch,
                Self::highlight_options(config),
            )),
            Err(e) => {
                tracing::error!(
                    target: "docsearch::service",
                    path = %config.index_dir.display(),
                    error = %e,
                    "search index failed to open, search is unavailable"
                );
                Arc::new(UnavailableIndex::new(e.to_string()))
            }
        }
    }

    /// Get a tokio runtime handle - uses current runtime if available, otherwise global fallback
    fn runtime_handle() -> DocSearchResult<tokio::runtime::Handle> {
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            return Ok(handle);
        }
        FALLBACK_RUNTIME
            .as_ref()
            .map(|rt| rt.handle().clone())
            .map_err(|e| DocSearchError::SearchUnavailable(format!("no async runtime: {}", e)))
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn index(&self) -> &Arc<dyn SearchIndex> {
        &self.index
    }

    pub fn reindexer(&self) -> &Reindexer {
        &self.reindexer
    }

    pub fn is_available(&self) -> bool {
        self.index.is_available()
    }

    /// Record that `entry` is the current state of its document.
    /// Never fails; see [`Reindexer::emit`].
    pub fn upsert(&self, entry: IndexEntry) {
        self.reindexer.emit_upsert(entry);
    }

    /// Record that `doc_id` no longer exists. Never fails.
    pub fn delete(&self, doc_id: i64) {
        self.reindexer.emit_delete(doc_id);
    }

    pub fn search(&self, request: &SearchRequest) -> DocSearchResult<SearchPage> {
        self.index.search(request)
    }

    /// Validate raw caller parameters, search, and time the whole call.
    pub fn search_params(&self, params: SearchParams) -> DocSearchResult<SearchResponse> {
        let started = Instant::now();
        let request = params.into_request(&self.config)?;
        let page = self.search(&request)?;
        Ok(SearchResponse::timed(page, started))
    }

    /// [`search`](Self::search) on a blocking thread.
    pub async fn search_async(&self, request: SearchRequest) -> DocSearchResult<SearchPage> {
        let index = self.index.clone();
        let runtime = Self::runtime_handle()?;
        runtime
            .spawn_blocking(move || index.search(&request))
            .await
            .map_err(|e| {
                tracing::warn!(target: "docsearch::service", error = %e, "search task did not complete");
                DocSearchError::Cancelled
            })?
    }

    pub fn get(&self, doc_id: i64) -> DocSearchResult<Option<StoredEntry>> {
        self.index.get(doc_id)
    }

    pub fn stats(&self) -> DocSearchResult<IndexStats> {
        self.index.stats()
    }

    /// Drop every indexed entry. Pending outbox events are kept.
    pub fn clear(&self) -> DocSearchResult<()> {
        self.index.clear()
    }

    /// Retry pending reindex events now.
    pub fn drain(&self) -> DocSearchResult<DrainReport> {
        Ok(self.reindexer.drain()?)
    }

    pub fn pending(&self) -> DocSearchResult<usize> {
        Ok(self.reindexer.pending()?)
    }
}
