//! Durable reindex outbox
//!
//! Document mutations elsewhere in the application record what the index
//! should now contain as a [`ReindexEvent`]. Events are written to SQLite
//! first and applied to the index by a single consumer, [`Reindexer`], which
//! owns all error handling for the write path. An event that fails stays in
//! the outbox with its attempt count and last error, and is retried on the
//! next drain.
//!
//! Upserts fully replace and deletes remove, so only the newest event per
//! document matters. A drain applies that one and discards the older ones.

use crate::interface::{DocSearchResult, IndexEntry};
use crate::store::SearchIndex;
use parking_lot::Mutex;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutboxError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("Event encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type OutboxResult<T> = Result<T, OutboxError>;

/// What the index should look like for one document after a mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReindexEvent {
    Upsert(IndexEntry),
    Delete { doc_id: i64 },
}

impl ReindexEvent {
    pub fn doc_id(&self) -> i64 {
        match self {
            ReindexEvent::Upsert(entry) => entry.doc_id,
            ReindexEvent::Delete { doc_id } => *doc_id,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ReindexEvent::Upsert(_) => "upsert",
            ReindexEvent::Delete { .. } => "delete",
        }
    }
}

/// One row of the outbox as seen by the consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEvent {
    pub seq: i64,
    pub doc_id: i64,
    pub kind: String,
    pub attempts: u32,
    pub last_error: Option<String>,
    payload: String,
}

impl PendingEvent {
    pub fn decode(&self) -> OutboxResult<ReindexEvent> {
        Ok(serde_json::from_str(&self.payload)?)
    }
}

/// SQLite-backed event queue.
pub struct ReindexOutbox {
    pool: Pool<SqliteConnectionManager>,
}

impl ReindexOutbox {
    /// Open or create the outbox database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> OutboxResult<Self> {
        if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let manager = SqliteConnectionManager::file(path.as_ref()).with_init(|conn| {
            conn.execute_batch(
                "
                PRAGMA journal_mode=WAL;
                PRAGMA synchronous=NORMAL;
                PRAGMA busy_timeout=5000;
            ",
            )?;
            Ok(())
        });

        let pool = Pool::builder().max_size(4).build(manager)?;

        let outbox = Self { pool };
        outbox.setup_schema()?;
        tracing::info!(
            target: "docsearch::outbox",
            path = %path.as_ref().display(),
            pending = outbox.pending()?,
            "outbox opened"
        );
        Ok(outbox)
    }

    /// Open an in-memory outbox (tests and ephemeral services)
    pub fn open_in_memory() -> OutboxResult<Self> {
        let manager = SqliteConnectionManager::memory();

        // In-memory needs single connection to maintain state
        let pool = Pool::builder().max_size(1).build(manager)?;

        let outbox = Self { pool };
        outbox.setup_schema()?;
        Ok(outbox)
    }

    fn get_conn(&self) -> OutboxResult<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    fn setup_schema(&self) -> OutboxResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS reindex_events (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                doc_id INTEGER NOT NULL,
                kind TEXT NOT NULL,
                payload TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
                attempts INTEGER NOT NULL DEFAULT 0,
                last_error TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_reindex_events_doc ON reindex_events(doc_id, seq);
            "#,
        )?;
        Ok(())
    }

    /// Append an event; returns its sequence number
    pub fn enqueue(&self, event: &ReindexEvent) -> OutboxResult<i64> {
        let payload = serde_json::to_string(event)?;
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO reindex_events (doc_id, kind, payload) VALUES (?1, ?2, ?3)",
            params![event.doc_id(), event.kind(), payload],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Number of rows not yet applied, superseded ones included
    pub fn pending(&self) -> OutboxResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM reindex_events", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Newest event of every document with pending rows, oldest first
    pub fn latest_pending(&self) -> OutboxResult<Vec<PendingEvent>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT seq, doc_id, kind, attempts, last_error, payload
             FROM reindex_events
             WHERE seq IN (SELECT MAX(seq) FROM reindex_events GROUP BY doc_id)
             ORDER BY seq",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(PendingEvent {
                seq: row.get(0)?,
                doc_id: row.get(1)?,
                kind: row.get(2)?,
                attempts: row.get(3)?,
                last_error: row.get(4)?,
                payload: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Pending row for `doc_id` that the next drain would apply
    pub fn latest_for(&self, doc_id: i64) -> OutboxResult<Option<PendingEvent>> {
        let conn = self.get_conn()?;
        let event = conn
            .query_row(
                "SELECT seq, doc_id, kind, attempts, last_error, payload
                 FROM reindex_events WHERE doc_id = ?1 ORDER BY seq DESC LIMIT 1",
                params![doc_id],
                |row| {
                    Ok(PendingEvent {
                        seq: row.get(0)?,
                        doc_id: row.get(1)?,
                        kind: row.get(2)?,
                        attempts: row.get(3)?,
                        last_error: row.get(4)?,
                        payload: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(event)
    }

    /// Remove `seq` and every older row for the same document.
    /// Rows enqueued after `seq` are kept.
    pub fn complete(&self, doc_id: i64, seq: i64) -> OutboxResult<usize> {
        let conn = self.get_conn()?;
        let removed = conn.execute(
            "DELETE FROM reindex_events WHERE doc_id = ?1 AND seq <= ?2",
            params![doc_id, seq],
        )?;
        Ok(removed)
    }

    pub fn record_failure(&self, seq: i64, error: &str) -> OutboxResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "UPDATE reindex_events SET attempts = attempts + 1, last_error = ?2 WHERE seq = ?1",
            params![seq, error],
        )?;
        Ok(())
    }
}

/// Outcome of one drain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    /// Events applied to the index and removed
    pub applied: usize,
    /// Events left in the outbox for retry
    pub failed: usize,
    /// Undecodable events removed without being applied
    pub dropped: usize,
}

/// The single consumer of the outbox.
pub struct Reindexer {
    outbox: ReindexOutbox,
    index: Arc<dyn SearchIndex>,
    drain_lock: Mutex<()>,
}

impl Reindexer {
    pub fn new(outbox: ReindexOutbox, index: Arc<dyn SearchIndex>) -> Self {
        Self {
            outbox,
            index,
            drain_lock: Mutex::new(()),
        }
    }

    pub fn outbox(&self) -> &ReindexOutbox {
        &self.outbox
    }

    /// Record `event` and try to apply it now.
    ///
    /// Never fails: problems are logged and the event stays queued for the
    /// next drain. If even the outbox write fails, the event is applied to
    /// the index directly as a last resort.
    pub fn emit(&self, event: ReindexEvent) {
        let doc_id = event.doc_id();
        if let Err(e) = self.outbox.enqueue(&event) {
            tracing::warn!(target: "docsearch::outbox", doc_id, error = %e, "failed to enqueue reindex event, applying directly");
            if let Err(e) = self.apply(&event) {
                tracing::warn!(target: "docsearch::outbox", doc_id, error = %e, "direct reindex failed; document stays stale until the next reindex");
            }
            return;
        }

        match self.drain() {
            Ok(report) if report.failed > 0 => {
                tracing::warn!(target: "docsearch::outbox", doc_id, failed = report.failed, "reindex deferred");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(target: "docsearch::outbox", doc_id, error = %e, "outbox drain failed");
            }
        }
    }

    pub fn emit_upsert(&self, entry: IndexEntry) {
        self.emit(ReindexEvent::Upsert(entry));
    }

    pub fn emit_delete(&self, doc_id: i64) {
        self.emit(ReindexEvent::Delete { doc_id });
    }

    /// Apply the newest pending event of every document.
    pub fn drain(&self) -> OutboxResult<DrainReport> {
        let _guard = self.drain_lock.lock();
        let batch = self.outbox.latest_pending()?;
        let mut report = DrainReport::default();

        for pending in batch {
            let event = match pending.decode() {
                Ok(event) => event,
                Err(e) => {
                    tracing::error!(target: "docsearch::outbox", seq = pending.seq, doc_id = pending.doc_id, error = %e, "dropping undecodable reindex event");
                    self.outbox.complete(pending.doc_id, pending.seq)?;
                    report.dropped += 1;
                    continue;
                }
            };

            match self.apply(&event) {
                Ok(()) => {
                    self.outbox.complete(pending.doc_id, pending.seq)?;
                    report.applied += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        target: "docsearch::outbox",
                        seq = pending.seq,
                        doc_id = pending.doc_id,
                        attempts = pending.attempts + 1,
                        error = %e,
                        "reindex failed, will retry"
                    );
                    self.outbox.record_failure(pending.seq, &e.to_string())?;
                    report.failed += 1;
                }
            }
        }

        if report != DrainReport::default() {
            tracing::debug!(
                target: "docsearch::outbox",
                applied = report.applied,
                failed = report.failed,
                dropped = report.dropped,
                "outbox drained"
            );
        }
        Ok(report)
    }

    pub fn pending(&self) -> OutboxResult<usize> {
        self.outbox.pending()
    }

    fn apply(&self, event: &ReindexEvent) -> DocSearchResult<()> {
        match event {
            ReindexEvent::Upsert(entry) => self.index.upsert(entry),
            ReindexEvent::Delete { doc_id } => self.index.delete(*doc_id),
        }
    }
}
