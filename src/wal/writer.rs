//! WAL Writer
//!
//! Owns the append handles of both log files for the lifetime of the engine.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::{QuillError, Result};

use super::reader::WalReader;
use super::recovery::{RecoveryResult, WalRecovery};
use super::{DATA_FILE, INDEX_FILE};

/// Where an appended record landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOffset {
    /// Zero-based position of the record in the log
    pub sequence: u64,

    /// Byte offset of the payload in the data file
    pub data_offset: u64,

    /// Payload length in bytes
    pub length: u32,
}

/// The write-ahead log: a data file and an index file appended in lockstep
pub struct WriteAheadLog {
    dir: PathBuf,
    data: File,
    index: File,
    sync_strategy: WalSyncStrategy,

    /// Committed (paired) state; everything past these lengths is garbage
    record_count: u64,
    data_len: u64,
    index_len: u64,

    /// Set when a failed append could not be rolled back
    poisoned: bool,

    recovery: RecoveryResult,
}

impl WriteAheadLog {
    /// Open or create the log in `dir`
    ///
    /// Creates the directory and both files if absent, then cuts any torn
    /// tail so that new appends land right after the last paired record.
    pub fn open(dir: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        fs::create_dir_all(dir)?;

        let data = open_append(&dir.join(DATA_FILE))?;
        let index = open_append(&dir.join(INDEX_FILE))?;

        let recovery = WalRecovery::recover(dir)?;
        let data_len = data.metadata()?.len();
        let index_len = index.metadata()?.len();

        tracing::debug!(
            "WAL opened at {}: {} records, {} data bytes",
            dir.display(),
            recovery.records_recovered,
            data_len
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            data,
            index,
            sync_strategy,
            record_count: recovery.records_recovered,
            data_len,
            index_len,
            poisoned: false,
            recovery,
        })
    }

    /// Durably append one record
    ///
    /// The payload is written (and synced) before its index line. On any
    /// failure both files are cut back to the last committed record.
    pub fn append(&mut self, record: &[u8]) -> Result<RecordOffset> {
        if self.poisoned {
            return Err(QuillError::WalWrite(
                "log is unusable after a failed rollback; reopen to recover".to_string(),
            ));
        }

        let length = u32::try_from(record.len()).map_err(|_| {
            QuillError::WalWrite(format!("record of {} bytes is too large", record.len()))
        })?;
        let line = format!("{}\n", length);

        if let Err(e) = Self::write_synced(&mut self.data, record, self.sync_strategy) {
            self.rollback();
            return Err(e);
        }
        if let Err(e) = Self::write_synced(&mut self.index, line.as_bytes(), self.sync_strategy) {
            self.rollback();
            return Err(e);
        }

        let offset = RecordOffset {
            sequence: self.record_count,
            data_offset: self.data_len,
            length,
        };

        self.record_count += 1;
        self.data_len += record.len() as u64;
        self.index_len += line.len() as u64;

        tracing::trace!(
            "WAL append #{} ({} bytes at offset {})",
            offset.sequence,
            offset.length,
            offset.data_offset
        );

        Ok(offset)
    }

    /// A reader over every record committed so far, from the first one
    ///
    /// Records appended after this call are not visible to the reader.
    pub fn replay(&self) -> Result<WalReader> {
        WalReader::bounded(&self.dir, self.record_count)
    }

    /// Force both files to stable storage
    pub fn sync(&mut self) -> Result<()> {
        self.data.sync_all()?;
        self.index.sync_all()?;
        Ok(())
    }

    /// Sync and release the file handles
    pub fn close(mut self) -> Result<()> {
        self.sync()?;
        tracing::debug!("WAL closed with {} records", self.record_count);
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of committed records
    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    /// Committed length of the data file
    pub fn data_len(&self) -> u64 {
        self.data_len
    }

    /// What recovery did when the log was opened
    pub fn recovery(&self) -> &RecoveryResult {
        &self.recovery
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn write_synced(file: &mut File, bytes: &[u8], strategy: WalSyncStrategy) -> Result<()> {
        file.write_all(bytes)?;
        file.flush()?;
        if strategy == WalSyncStrategy::EveryWrite {
            file.sync_data()?;
        }
        Ok(())
    }

    fn rollback(&mut self) {
        let restored = self
            .data
            .set_len(self.data_len)
            .and_then(|_| self.index.set_len(self.index_len));

        if let Err(e) = restored {
            tracing::error!("WAL rollback failed, refusing further appends: {}", e);
            self.poisoned = true;
        }
    }
}

fn open_append(path: &Path) -> Result<File> {
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}
