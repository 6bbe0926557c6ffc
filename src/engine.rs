//! Engine Module
//!
//! The request dispatcher that ties the write-ahead log and the ordered
//! store together and enforces optimistic locking.
//!
//! ## Responsibilities
//! - Validate writes against stored document versions
//! - Log every accepted mutation before applying it
//! - Replay the log into an empty store on startup
//! - Turn every outcome into a reply with one error condition
//!
//! ## Request Lifecycle
//! ```text
//! RECEIVED ──► VALIDATED ──► LOGGED ──► APPLIED ──► REPLIED
//!                  │            │
//!                  ▼            ▼
//!              REJECTED       FAILED
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use parking_lot::Mutex;

use crate::config::Config;
use crate::document::Document;
use crate::error::{QuillError, Result};
use crate::protocol::{ErrorCondition, ErrorType, Reply, Request, RequestBody, RequestType};
use crate::storage::{OrderedStore, StoreIter};
use crate::wal::{RecoveryResult, WalEntry, WriteAheadLog};

/// Validated `(key, encoded document)` pairs ready for the store
type WriteBatch = Vec<(Vec<u8>, Vec<u8>)>;

/// What happened during startup replay
#[derive(Debug, Clone, Default)]
pub struct ReplayStats {
    /// Entries applied to the store
    pub entries_replayed: u64,

    /// Entries that failed re-validation and were skipped
    pub entries_skipped: u64,

    /// Highest LSN seen (0 for an empty log)
    pub last_lsn: u64,

    /// Torn-tail handling done when the log was opened
    pub recovery: RecoveryResult,
}

/// Log handle plus the next LSN to hand out
struct LogState {
    wal: WriteAheadLog,
    next_lsn: u64,
}

/// The document store engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (write/delete): serialized by the `log` mutex, held from
///   validation through append and apply, so log order is apply order
/// - **Reads** (get/range/scan): take only the store's read lock; a batch
///   is applied under one store write lock, so readers see all of it or
///   none of it, and never anything that is not yet logged
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Write-ahead log (exclusive access, also the writer lock)
    log: Mutex<LogState>,

    /// Ordered key → encoded document index
    store: OrderedStore,

    /// Startup replay summary
    replay_stats: ReplayStats,
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Create the data directory
    /// 2. Open the WAL (cutting any torn tail)
    /// 3. Replay every record into an empty store
    /// 4. Ready to serve requests
    pub fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;

        let wal = WriteAheadLog::open(&config.wal_dir(), config.wal_sync_strategy)?;
        let store = OrderedStore::new();
        let replay_stats = Self::replay(&wal, &store)?;

        if replay_stats.entries_replayed > 0 || replay_stats.recovery.was_truncated {
            tracing::info!(
                "WAL replay: {} entries applied, {} skipped, last_lsn={}, {} keys live",
                replay_stats.entries_replayed,
                replay_stats.entries_skipped,
                replay_stats.last_lsn,
                store.len()
            );
        }

        let next_lsn = replay_stats.last_lsn + 1;

        Ok(Self {
            config,
            log: Mutex::new(LogState { wal, next_lsn }),
            store,
            replay_stats,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// Handle one request and produce its reply
    ///
    /// Never fails: every error ends up in the reply's error condition.
    pub fn handle(&self, request: Request) -> Reply {
        let request_id = request.request_id();
        let kind = request.body.request_type();

        if !request.is_consistent() {
            let condition = ErrorCondition::new(
                ErrorType::ProtocolSerialization,
                format!(
                    "header says {:?} but body is {:?}",
                    request.request_type(),
                    kind
                ),
            );
            return match kind {
                RequestType::Write | RequestType::Delete => Reply::write(request_id, condition),
                RequestType::Get | RequestType::GetRange => {
                    Reply::get_failed(request_id, condition)
                }
            };
        }

        match &request.body {
            RequestBody::Write(body) => {
                let result = self.apply_write(&request, &body.documents);
                Reply::write(request_id, Self::condition(result))
            }
            RequestBody::Delete(body) => {
                let result = self.apply_delete(&request, &body.keys);
                Reply::write(request_id, Self::condition(result))
            }
            RequestBody::Get(body) => Reply::get(request_id, self.store.get(&body.keys)),
            RequestBody::GetRange(body) => {
                let documents = self
                    .store
                    .range(&body.start_key, &body.end_key)
                    .map(|(_, value)| value)
                    .collect();
                Reply::get(request_id, documents)
            }
        }
    }

    // =========================================================================
    // Typed Operations
    // =========================================================================

    /// Write a batch of documents (all-or-nothing)
    pub fn write(&self, documents: Vec<Document>) -> Result<()> {
        Self::reply_result(self.handle(Request::write(documents)))
    }

    /// Delete keys; absent keys are ignored
    pub fn delete(&self, keys: Vec<Vec<u8>>) -> Result<()> {
        Self::reply_result(self.handle(Request::delete(keys)))
    }

    /// Look up a single document
    pub fn get(&self, key: &[u8]) -> Result<Option<Document>> {
        self.store
            .get_one(key)
            .map(|bytes| Document::from_bytes(&bytes))
            .transpose()
    }

    /// Look up several documents; missing keys contribute nothing
    pub fn get_all(&self, keys: &[Vec<u8>]) -> Result<Vec<Document>> {
        self.store
            .get(keys)
            .iter()
            .map(|bytes| Document::from_bytes(bytes))
            .collect()
    }

    /// Documents with `start <= key < end` in key order (empty end = unbounded)
    pub fn get_range(&self, start: &[u8], end: &[u8]) -> Result<Vec<Document>> {
        self.store
            .range(start, end)
            .map(|(_, bytes)| Document::from_bytes(&bytes))
            .collect()
    }

    /// Snapshot of every `(key, encoded document)` in key order
    pub fn scan(&self) -> StoreIter {
        self.store.scan()
    }

    /// Version currently stored under `key`
    pub fn stored_version(&self, key: &[u8]) -> Result<Option<u64>> {
        Ok(self.get(key)?.map(|doc| doc.instance_version()))
    }

    /// Close the engine gracefully, syncing and releasing the log
    pub fn close(self) -> Result<()> {
        self.log.into_inner().wal.close()
    }

    // =========================================================================
    // Write Path
    // =========================================================================

    fn apply_write(&self, request: &Request, documents: &[Document]) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }

        let mut log = self.log.lock();

        let batch = Self::validate_write(&self.store, documents).map_err(|e| {
            tracing::debug!("Write rejected (request {}): {}", request.request_id(), e);
            e
        })?;

        Self::append(&mut log, request)?;
        self.store.write(batch);
        Ok(())
    }

    fn apply_delete(&self, request: &Request, keys: &[Vec<u8>]) -> Result<()> {
        let mut log = self.log.lock();

        // Nothing to remove means nothing worth logging
        if !keys.iter().any(|key| self.store.contains_key(key)) {
            return Ok(());
        }

        Self::append(&mut log, request)?;
        self.store.delete(keys);
        Ok(())
    }

    /// Check every document's version and encode the batch
    ///
    /// A key seen earlier in the same batch is checked against that earlier
    /// document rather than the store.
    fn validate_write(store: &OrderedStore, documents: &[Document]) -> Result<WriteBatch> {
        let mut staged: HashMap<&[u8], u64> = HashMap::new();
        let mut batch = Vec::with_capacity(documents.len());

        for document in documents {
            let key = document.key();
            if key.is_empty() {
                return Err(QuillError::InvalidDocument(
                    "document key must not be empty".to_string(),
                ));
            }

            let expected = match staged.get(key) {
                Some(version) => version + 1,
                None => match store.get_one(key) {
                    Some(bytes) => Document::from_bytes(&bytes)?.instance_version() + 1,
                    None => 0,
                },
            };

            if document.instance_version() != expected {
                return Err(QuillError::OptimisticLock(format!(
                    "key '{}' submitted at version {}, expected {}",
                    String::from_utf8_lossy(key),
                    document.instance_version(),
                    expected
                )));
            }

            staged.insert(key, document.instance_version());
            batch.push((key.to_vec(), document.to_bytes()?));
        }

        Ok(batch)
    }

    fn append(log: &mut LogState, request: &Request) -> Result<()> {
        let entry = WalEntry::new(log.next_lsn, request.clone());
        let bytes = entry.encode()?;

        log.wal.append(&bytes).map_err(|e| {
            tracing::error!("WAL append failed for lsn {}: {}", entry.lsn, e);
            QuillError::Persistence(format!("WAL append failed: {}", e))
        })?;

        log.next_lsn += 1;
        Ok(())
    }

    // =========================================================================
    // Replay
    // =========================================================================

    /// Feed every logged entry through the live validate/apply path,
    /// minus the append
    fn replay(wal: &WriteAheadLog, store: &OrderedStore) -> Result<ReplayStats> {
        let mut stats = ReplayStats {
            recovery: wal.recovery().clone(),
            ..ReplayStats::default()
        };

        for record in wal.replay()? {
            let entry = WalEntry::decode(&record?)?;

            let applied = match &entry.request.body {
                RequestBody::Write(body) => match Self::validate_write(store, &body.documents) {
                    Ok(batch) => {
                        store.write(batch);
                        true
                    }
                    Err(e) => {
                        tracing::warn!("Skipping WAL entry lsn={}: {}", entry.lsn, e);
                        false
                    }
                },
                RequestBody::Delete(body) => {
                    store.delete(&body.keys);
                    true
                }
                RequestBody::Get(_) | RequestBody::GetRange(_) => {
                    tracing::warn!("Skipping read request logged at lsn={}", entry.lsn);
                    false
                }
            };

            if applied {
                stats.entries_replayed += 1;
            } else {
                stats.entries_skipped += 1;
            }
            stats.last_lsn = stats.last_lsn.max(entry.lsn);
        }

        Ok(stats)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn condition(result: Result<()>) -> ErrorCondition {
        match result {
            Ok(()) => ErrorCondition::none(),
            Err(e) => ErrorCondition::from(&e),
        }
    }

    fn reply_result(reply: Reply) -> Result<()> {
        reply.error_condition().clone().into_result()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Number of records in the WAL
    pub fn wal_record_count(&self) -> u64 {
        self.log.lock().wal.record_count()
    }

    /// Startup replay summary
    pub fn replay_stats(&self) -> &ReplayStats {
        &self.replay_stats
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
