//! docsearch - full-text search for a document archive
//!
//! Extracted document text goes in through a durable reindex outbox; ranked,
//! filtered, highlighted pages come out. Retrieval is tantivy BM25 over a
//! script-aware tokenizer that segments CJK text into unigrams and bigrams.

pub mod boundary;
pub mod config;
pub mod highlight;
pub mod indexer;
pub mod interface;
pub mod outbox;
pub mod query;
mod service;
pub mod store;
pub mod tokenizer;

pub use boundary::{SearchParams, SearchResponse};
pub use config::SearchConfig;
pub use interface::*;
pub use outbox::{DrainReport, ReindexEvent};
pub use query::{SearchFilters, SearchRequest};
pub use service::SearchService;
pub use tokenizer::Segmentation;
