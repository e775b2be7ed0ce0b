//! Tantivy index holding postings and stored fields for documents
//!
//! One tantivy document per `doc_id`. Content is tokenized with
//! [`DocTokenizer`] and indexed with frequencies and positions; the
//! filterable attributes are stored verbatim next to it. Every write is
//! committed before the call returns and the reader is reloaded under the
//! writer lock, so a searcher taken afterwards sees the whole write or none
//! of it.

use crate::interface::{IndexEntry, StoredEntry};
use crate::tokenizer::{DocTokenizer, Segmentation};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tantivy::collector::TopDocs;
use tantivy::directory::error::LockError;
use tantivy::directory::MmapDirectory;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::*;
use tantivy::tokenizer::TextAnalyzer;
use tantivy::{
    DocId, Index, IndexReader, IndexWriter, ReloadPolicy, Score, SegmentReader, TantivyDocument, TantivyError, Term,
};
use thiserror::Error;

/// Smallest writer heap tantivy accepts comfortably for a single thread.
pub(crate) const MIN_WRITER_HEAP_BYTES: usize = 15_000_000;

/// Records which segmentation the postings were built with.
const META_FILE: &str = "docsearch_meta.json";

const DOC_ID_FIELD: &str = "doc_id";

/// A previous owner of the directory may still be releasing the writer lock.
const LOCK_RETRIES: u32 = 20;
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Live indexes keyed by canonical directory. A directory is owned by one
/// `Indexer` at a time; tantivy's writer lock rejects a second one.
static OPEN_INDEXES: Lazy<Mutex<HashMap<PathBuf, Weak<Indexer>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Error type for indexer operations
#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),
    #[error("Directory error: {0}")]
    Directory(#[from] tantivy::directory::error::OpenDirectoryError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Schema is missing field '{0}'")]
    Schema(&'static str),
}

pub type IndexerResult<T> = Result<T, IndexerError>;

#[derive(Debug, Serialize, Deserialize)]
struct IndexMeta {
    segmentation: Segmentation,
}

/// Field handles resolved once when the index is opened.
#[derive(Debug, Clone, Copy)]
struct Fields {
    doc_id: Field,
    content: Field,
    file_type: Field,
    folder_id: Field,
    tag_ids: Field,
    created_at: Field,
}

impl Fields {
    fn resolve(schema: &Schema) -> IndexerResult<Self> {
        let field = |name: &'static str| schema.get_field(name).map_err(|_| IndexerError::Schema(name));
        Ok(Self {
            doc_id: field(DOC_ID_FIELD)?,
            content: field("content")?,
            file_type: field("file_type")?,
            folder_id: field("folder_id")?,
            tag_ids: field("tag_ids")?,
            created_at: field("created_at")?,
        })
    }
}

/// A retrieval candidate with its BM25 score.
#[derive(Debug, Clone)]
pub struct RankedDoc {
    pub score: f32,
    pub entry: StoredEntry,
}

/// Index statistics for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub num_docs: u64,
    pub segments: usize,
    pub segmentation: Segmentation,
}

/// Tantivy-based document index
pub struct Indexer {
    writer: Mutex<IndexWriter>,
    reader: IndexReader,
    fields: Fields,
    tokenizer: DocTokenizer,
}

impl Indexer {
    /// Open the index in `path`, creating the directory and an empty index
    /// when nothing valid is there yet.
    ///
    /// Calls for the same directory share one instance for as long as any
    /// caller holds it.
    pub fn open_or_create(path: &Path, segmentation: Segmentation, heap_bytes: usize) -> IndexerResult<Arc<Self>> {
        std::fs::create_dir_all(path)?;
        let key = path.canonicalize()?;

        let mut open = OPEN_INDEXES.lock();
        if let Some(existing) = open.get(&key).and_then(Weak::upgrade) {
            tracing::debug!(target: "docsearch::indexer", path = %key.display(), "reusing open index");
            return Ok(existing);
        }

        let indexer = Arc::new(Self::open_dir_retrying(&key, segmentation, heap_bytes)?);
        open.retain(|_, weak| weak.strong_count() > 0);
        open.insert(key, Arc::downgrade(&indexer));
        Ok(indexer)
    }

    /// The registry entry dies as soon as the last `Arc` starts dropping, but
    /// tantivy releases the directory lock only once the writer is gone.
    /// Wait out that gap instead of reporting the index as unavailable.
    fn open_dir_retrying(path: &Path, segmentation: Segmentation, heap_bytes: usize) -> IndexerResult<Self> {
        let mut attempt = 0;
        loop {
            match Self::open_dir(path, segmentation, heap_bytes) {
                Err(IndexerError::Tantivy(TantivyError::LockFailure(LockError::LockBusy, _))) if attempt < LOCK_RETRIES => {
                    attempt += 1;
                    tracing::debug!(target: "docsearch::indexer", path = %path.display(), attempt, "index directory locked, retrying");
                    std::thread::sleep(LOCK_RETRY_DELAY);
                }
                result => return result,
            }
        }
    }

    fn open_dir(path: &Path, segmentation: Segmentation, heap_bytes: usize) -> IndexerResult<Self> {
        let segmentation = Self::reconcile_segmentation(path, segmentation)?;
        let dir = MmapDirectory::open(path)?;
        let index = Index::open_or_create(dir, Self::build_schema())?;
        let indexer = Self::from_index(index, segmentation, heap_bytes)?;

        tracing::info!(
            target: "docsearch::indexer",
            path = %path.display(),
            docs = indexer.num_docs(),
            ?segmentation,
            "index opened"
        );
        Ok(indexer)
    }

    /// Create an in-memory index (tests and throwaway corpora)
    pub fn new_in_memory(segmentation: Segmentation) -> IndexerResult<Self> {
        let index = Index::create_in_ram(Self::build_schema());
        Self::from_index(index, segmentation, MIN_WRITER_HEAP_BYTES)
    }

    fn from_index(index: Index, segmentation: Segmentation, heap_bytes: usize) -> IndexerResult<Self> {
        let tokenizer = DocTokenizer::new(segmentation);
        index
            .tokenizers()
            .register(DocTokenizer::NAME, TextAnalyzer::builder(tokenizer).build());

        let fields = Fields::resolve(&index.schema())?;
        let writer = index.writer(heap_bytes.max(MIN_WRITER_HEAP_BYTES))?;
        let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into()?;

        Ok(Self {
            writer: Mutex::new(writer),
            reader,
            fields,
            tokenizer,
        })
    }

    fn build_schema() -> Schema {
        let mut builder = Schema::builder();
        builder.add_i64_field(DOC_ID_FIELD, STORED | FAST | INDEXED);

        let content_indexing = TextFieldIndexing::default()
            .set_tokenizer(DocTokenizer::NAME)
            .set_index_option(IndexRecordOption::WithFreqsAndPositions);
        let content_options = TextOptions::default()
            .set_indexing_options(content_indexing)
            .set_stored();
        builder.add_text_field("content", content_options);

        builder.add_text_field("file_type", STRING | STORED);
        builder.add_i64_field("folder_id", STORED | INDEXED);
        builder.add_i64_field("tag_ids", STORED | INDEXED);
        // Microseconds since the Unix epoch
        builder.add_i64_field("created_at", STORED | FAST);
        builder.build()
    }

    /// Postings built with one segmentation cannot be queried with another, so
    /// an existing index keeps the mode it was created with.
    fn reconcile_segmentation(path: &Path, requested: Segmentation) -> IndexerResult<Segmentation> {
        let meta_path = path.join(META_FILE);
        match std::fs::read_to_string(&meta_path) {
            Ok(raw) => match serde_json::from_str::<IndexMeta>(&raw) {
                Ok(meta) => {
                    if meta.segmentation != requested {
                        tracing::warn!(
                            target: "docsearch::indexer",
                            stored = ?meta.segmentation,
                            ?requested,
                            "index was built with a different segmentation; keeping the stored one until a full reindex"
                        );
                    }
                    Ok(meta.segmentation)
                }
                Err(e) => {
                    tracing::warn!(target: "docsearch::indexer", error = %e, "unreadable index metadata, rewriting");
                    Self::write_meta(&meta_path, requested)?;
                    Ok(requested)
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Self::write_meta(&meta_path, requested)?;
                Ok(requested)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write_meta(meta_path: &Path, segmentation: Segmentation) -> IndexerResult<()> {
        let raw = serde_json::to_string(&IndexMeta { segmentation })
            .map_err(|e| IndexerError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        std::fs::write(meta_path, raw)?;
        Ok(())
    }

    pub fn tokenizer(&self) -> DocTokenizer {
        self.tokenizer
    }

    /// Run `op` against the writer and commit, as one unit. On failure the
    /// uncommitted operations are rolled back so nothing half-applied can be
    /// picked up by a later commit.
    fn write<F>(&self, op: F) -> IndexerResult<()>
    where
        F: FnOnce(&mut IndexWriter) -> tantivy::Result<()>,
    {
        let mut writer = self.writer.lock();
        let result = op(&mut *writer).and_then(|_| writer.commit().map(|_| ()));
        if let Err(e) = result {
            if let Err(rollback_err) = writer.rollback() {
                tracing::warn!(target: "docsearch::indexer", error = %rollback_err, "rollback after failed write also failed");
            }
            return Err(e.into());
        }
        self.reader.reload()?;
        Ok(())
    }

    /// Add or replace the document keyed by `entry.doc_id`
    pub fn upsert(&self, entry: &IndexEntry) -> IndexerResult<()> {
        let id_term = Term::from_field_i64(self.fields.doc_id, entry.doc_id);
        let doc = self.to_document(entry);
        self.write(|writer| {
            writer.delete_term(id_term);
            writer.add_document(doc)?;
            Ok(())
        })?;
        tracing::debug!(target: "docsearch::indexer", doc_id = entry.doc_id, "document upserted");
        Ok(())
    }

    /// Remove the document keyed by `doc_id`. Absent ids are not an error.
    pub fn delete(&self, doc_id: i64) -> IndexerResult<()> {
        let id_term = Term::from_field_i64(self.fields.doc_id, doc_id);
        self.write(|writer| {
            writer.delete_term(id_term);
            Ok(())
        })?;
        tracing::debug!(target: "docsearch::indexer", doc_id, "document deleted");
        Ok(())
    }

    pub fn clear(&self) -> IndexerResult<()> {
        self.write(|writer| writer.delete_all_documents().map(|_| ()))?;
        tracing::info!(target: "docsearch::indexer", "index cleared");
        Ok(())
    }

    /// Point lookup of stored fields by id
    pub fn get(&self, doc_id: i64) -> IndexerResult<Option<StoredEntry>> {
        let searcher = self.reader.searcher();
        let query = TermQuery::new(
            Term::from_field_i64(self.fields.doc_id, doc_id),
            IndexRecordOption::Basic,
        );
        let top = searcher.search(&query, &TopDocs::with_limit(1))?;
        match top.into_iter().next() {
            Some((_, address)) => {
                let doc: TantivyDocument = searcher.doc(address)?;
                Ok(Some(self.to_stored(&doc)))
            }
            None => Ok(None),
        }
    }

    /// Documents containing at least one of `terms`, best BM25 score first,
    /// at most `limit` of them. Equal scores order by ascending `doc_id`.
    ///
    /// The tie-break is part of the collector's key, so the result for a
    /// smaller `limit` is always a prefix of the result for a larger one.
    pub fn ranked(&self, terms: &[String], limit: usize) -> IndexerResult<Vec<RankedDoc>> {
        // One searcher per call: a consistent snapshot of the last commit.
        let searcher = self.reader.searcher();
        // TopDocs reserves memory up front for the whole limit
        let limit = limit.min(usize::try_from(searcher.num_docs()).unwrap_or(usize::MAX));
        if terms.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let query = self.any_term_query(terms);
        let collector = TopDocs::with_limit(limit).tweak_score(|segment: &SegmentReader| {
            let doc_ids = segment.fast_fields().i64(DOC_ID_FIELD).ok();
            move |doc: DocId, score: Score| {
                let doc_id = doc_ids.as_ref().and_then(|col| col.first(doc)).unwrap_or(i64::MAX);
                (score, Reverse(doc_id))
            }
        });
        let top_docs = searcher.search(&query, &collector)?;

        let mut ranked = Vec::with_capacity(top_docs.len());
        for ((score, _), address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            ranked.push(RankedDoc {
                score,
                entry: self.to_stored(&doc),
            });
        }
        Ok(ranked)
    }

    /// OR of term queries on content. Each clause scores with BM25
    /// (k1 = 1.2, b = 0.75) and the boolean query sums matching clauses.
    fn any_term_query(&self, terms: &[String]) -> BooleanQuery {
        let clauses: Vec<(Occur, Box<dyn Query>)> = terms
            .iter()
            .map(|text| {
                let term = Term::from_field_text(self.fields.content, text);
                let q: Box<dyn Query> = Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs));
                (Occur::Should, q)
            })
            .collect();
        BooleanQuery::new(clauses)
    }

    fn to_document(&self, entry: &IndexEntry) -> TantivyDocument {
        let f = &self.fields;
        let mut doc = TantivyDocument::default();
        doc.add_i64(f.doc_id, entry.doc_id);
        doc.add_text(f.content, &entry.content);
        doc.add_text(f.file_type, &entry.file_type);
        if let Some(folder_id) = entry.folder_id {
            doc.add_i64(f.folder_id, folder_id);
        }
        for tag_id in &entry.tag_ids {
            doc.add_i64(f.tag_ids, *tag_id);
        }
        doc.add_i64(f.created_at, entry.created_at.timestamp_micros());
        doc
    }

    fn to_stored(&self, doc: &TantivyDocument) -> StoredEntry {
        let f = &self.fields;
        let first_i64 = |field: Field| doc.get_first(field).and_then(|v| v.as_i64());
        let first_str = |field: Field| {
            doc.get_first(field)
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string()
        };

        StoredEntry {
            doc_id: first_i64(f.doc_id).unwrap_or(0),
            content: first_str(f.content),
            file_type: first_str(f.file_type),
            folder_id: first_i64(f.folder_id),
            tag_ids: doc.get_all(f.tag_ids).filter_map(|v| v.as_i64()).collect(),
            created_at: first_i64(f.created_at).and_then(DateTime::<Utc>::from_timestamp_micros),
        }
    }

    /// Get the number of documents in the index
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    pub fn stats(&self) -> IndexStats {
        let searcher = self.reader.searcher();
        IndexStats {
            num_docs: searcher.num_docs(),
            segments: searcher.segment_readers().len(),
            segmentation: self.tokenizer.mode(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn indexer() -> Indexer {
        Indexer::new_in_memory(Segmentation::Script).unwrap()
    }

    fn terms(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn ids(ranked: &[RankedDoc]) -> Vec<i64> {
        ranked.iter().map(|r| r.entry.doc_id).collect()
    }

    #[test]
    fn test_indexer_creation() {
        let indexer = indexer();
        assert_eq!(indexer.num_docs(), 0);
        assert_eq!(indexer.stats().segmentation, Segmentation::Script);
    }

    #[test]
    fn test_upsert_semantics() {
        let indexer = indexer();

        indexer.upsert(&IndexEntry::new(1, "Hello World", "md")).unwrap();
        assert_eq!(indexer.num_docs(), 1);

        // Same id replaces, never duplicates
        indexer.upsert(&IndexEntry::new(1, "Updated content", "pdf")).unwrap();
        assert_eq!(indexer.num_docs(), 1);

        assert!(indexer.ranked(&terms(&["hello"]), 10).unwrap().is_empty());
        let hits = indexer.ranked(&terms(&["updated"]), 10).unwrap();
        assert_eq!(ids(&hits), vec![1]);
        assert_eq!(hits[0].entry.file_type, "pdf");
    }

    #[test]
    fn test_delete_document() {
        let indexer = indexer();
        indexer.upsert(&IndexEntry::new(1, "Hello World", "md")).unwrap();
        assert_eq!(indexer.num_docs(), 1);

        indexer.delete(1).unwrap();
        assert_eq!(indexer.num_docs(), 0);
        assert!(indexer.get(1).unwrap().is_none());

        // Unknown id is a no-op
        indexer.delete(42).unwrap();
        assert_eq!(indexer.num_docs(), 0);
    }

    #[test]
    fn test_empty_content_is_indexed() {
        let indexer = indexer();
        indexer.upsert(&IndexEntry::new(7, "", "pdf")).unwrap();
        assert_eq!(indexer.num_docs(), 1);
        let stored = indexer.get(7).unwrap().unwrap();
        assert_eq!(stored.content, "");
    }

    #[test]
    fn test_stored_fields_round_trip() {
        let indexer = indexer();
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 45).unwrap();
        let entry = IndexEntry::new(3, "quarterly report", "pdf")
            .with_folder(Some(10))
            .with_tags([1, 2])
            .with_created_at(created);
        indexer.upsert(&entry).unwrap();

        let stored = indexer.get(3).unwrap().unwrap();
        assert_eq!(stored.doc_id, 3);
        assert_eq!(stored.content, "quarterly report");
        assert_eq!(stored.file_type, "pdf");
        assert_eq!(stored.folder_id, Some(10));
        assert_eq!(stored.tag_ids, vec![1, 2]);
        assert_eq!(stored.created_at, Some(created));

        indexer.upsert(&IndexEntry::new(4, "root level", "md")).unwrap();
        let root = indexer.get(4).unwrap().unwrap();
        assert_eq!(root.folder_id, None);
        assert!(root.tag_ids.is_empty());
    }

    #[test]
    fn test_bm25_prefers_higher_term_frequency() {
        let indexer = indexer();
        indexer.upsert(&IndexEntry::new(1, "apple banana cherry date", "md")).unwrap();
        indexer.upsert(&IndexEntry::new(2, "apple apple apple banana", "md")).unwrap();
        indexer.upsert(&IndexEntry::new(3, "nothing relevant here", "md")).unwrap();

        let hits = indexer.ranked(&terms(&["apple"]), 10).unwrap();
        assert_eq!(ids(&hits), vec![2, 1]);
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn test_any_term_retrieval_sums_matches() {
        let indexer = indexer();
        indexer.upsert(&IndexEntry::new(1, "red fox", "md")).unwrap();
        indexer.upsert(&IndexEntry::new(2, "red fox jumps", "md")).unwrap();
        indexer.upsert(&IndexEntry::new(3, "jumps", "md")).unwrap();

        let hits = indexer.ranked(&terms(&["fox", "jumps"]), 10).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].entry.doc_id, 2);
    }

    #[test]
    fn test_ranked_respects_limit() {
        let indexer = indexer();
        for i in 0..10 {
            indexer.upsert(&IndexEntry::new(i, format!("item {}", i), "md")).unwrap();
        }
        assert_eq!(indexer.ranked(&terms(&["item"]), 4).unwrap().len(), 4);
        assert!(indexer.ranked(&terms(&["item"]), 0).unwrap().is_empty());
        assert!(indexer.ranked(&[], 10).unwrap().is_empty());
    }

    #[test]
    fn test_equal_scores_order_by_doc_id() {
        let indexer = indexer();
        for id in [5, 3, 9, 1] {
            indexer.upsert(&IndexEntry::new(id, "same text", "md")).unwrap();
        }
        let hits = indexer.ranked(&terms(&["same"]), 10).unwrap();
        assert_eq!(ids(&hits), vec![1, 3, 5, 9]);
    }

    #[test]
    fn test_smaller_limit_is_prefix_of_larger() {
        let indexer = indexer();
        // Inserted in descending id order so index order and id order disagree
        for id in (1..=250).rev() {
            indexer.upsert(&IndexEntry::new(id, "same words", "md")).unwrap();
        }

        let narrow = indexer.ranked(&terms(&["same"]), 110).unwrap();
        let wide = indexer.ranked(&terms(&["same"]), 200).unwrap();

        assert_eq!(ids(&narrow), (1..=110).collect::<Vec<i64>>());
        assert_eq!(ids(&narrow), ids(&wide)[..110].to_vec());
    }

    #[test]
    fn test_limit_beyond_corpus_is_clamped() {
        let indexer = indexer();
        indexer.upsert(&IndexEntry::new(1, "tiny corpus", "md")).unwrap();
        let hits = indexer.ranked(&terms(&["tiny"]), usize::MAX).unwrap();
        assert_eq!(ids(&hits), vec![1]);
    }

    #[test]
    fn test_cjk_sub_phrase_matches() {
        let indexer = indexer();
        indexer.upsert(&IndexEntry::new(1, "全文搜索引擎", "md")).unwrap();
        indexer.upsert(&IndexEntry::new(2, "hello world", "md")).unwrap();

        let query_terms = indexer.tokenizer().unique_terms("搜索");
        let hits = indexer.ranked(&query_terms, 10).unwrap();
        assert_eq!(ids(&hits), vec![1]);
    }

    #[test]
    fn test_clear() {
        let indexer = indexer();
        for i in 0..10 {
            indexer.upsert(&IndexEntry::new(i, format!("Item {}", i), "md")).unwrap();
        }
        assert_eq!(indexer.num_docs(), 10);

        indexer.clear().unwrap();
        assert_eq!(indexer.num_docs(), 0);
    }

    #[test]
    fn test_open_or_create_shares_instance_per_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("index");

        let a = Indexer::open_or_create(&path, Segmentation::Script, 0).unwrap();
        let b = Indexer::open_or_create(&path, Segmentation::Script, 0).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        a.upsert(&IndexEntry::new(1, "shared", "md")).unwrap();
        assert_eq!(b.num_docs(), 1);
    }

    #[test]
    fn test_open_waits_for_lock_release() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("index");
        std::fs::create_dir_all(&path).unwrap();

        let index = Index::open_or_create(MmapDirectory::open(&path).unwrap(), Indexer::build_schema()).unwrap();
        let previous_owner: IndexWriter = index.writer(MIN_WRITER_HEAP_BYTES).unwrap();
        let release = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            drop(previous_owner);
        });

        let indexer = Indexer::open_or_create(&path, Segmentation::Script, 0).unwrap();
        release.join().unwrap();
        indexer.upsert(&IndexEntry::new(1, "after handover", "md")).unwrap();
        assert_eq!(indexer.num_docs(), 1);
    }

    #[test]
    fn test_reopen_keeps_committed_entries_and_segmentation() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("index");

        {
            let indexer = Indexer::open_or_create(&path, Segmentation::Whitespace, 0).unwrap();
            indexer.upsert(&IndexEntry::new(1, "persisted text", "md")).unwrap();
        }

        let reopened = Indexer::open_or_create(&path, Segmentation::Script, 0).unwrap();
        assert_eq!(reopened.num_docs(), 1);
        assert_eq!(reopened.tokenizer().mode(), Segmentation::Whitespace);
        assert!(reopened.get(1).unwrap().is_some());
    }
}
