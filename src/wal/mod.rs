//! Write-Ahead Log (WAL) Module
//!
//! Provides durability guarantees through append-only logging.
//!
//! ## Responsibilities
//! - Append every accepted request before it touches the store
//! - Keep the data and index files describing the same prefix of records
//! - Detect and cut a torn tail on open
//! - Replay records in append order
//!
//! ## File Layout
//! ```text
//! {data_dir}/wal/
//!   ├── dataFile    payload 1 | payload 2 | payload 3 | ...   (no framing)
//!   └── indexFile   "len1\n"  "len2\n"  "len3\n"  ...          (UTF-8 decimal)
//! ```
//!
//! The i-th index line is the byte length of the i-th payload. Data is
//! written and synced before its index line, so a crash can leave at most
//! unindexed data bytes or an unterminated index line; recovery drops both.
//!
//! ## Record Payload
//! ```text
//! ┌─────────┬────────────────────────────────────┐
//! │ CRC (4) │ bincode(WalEntry { lsn, ts, req }) │
//! └─────────┴────────────────────────────────────┘
//! ```

mod entry;
mod reader;
mod recovery;
mod writer;

pub use entry::{WalEntry, CHECKSUM_SIZE};
pub use reader::WalReader;
pub use recovery::{RecoveryResult, WalRecovery};
pub use writer::{RecordOffset, WriteAheadLog};

/// Directory under the data dir holding the log
pub const WAL_DIR: &str = "wal";

/// Raw concatenated payloads
pub const DATA_FILE: &str = "dataFile";

/// One decimal record length per line
pub const INDEX_FILE: &str = "indexFile";
