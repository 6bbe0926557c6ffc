//! WAL Recovery
//!
//! Finds the longest prefix of records present in both files and cuts the
//! rest. A record counts only when its index line is newline-terminated,
//! parses as a length, and all of its bytes are in the data file.
//!
//! An unparseable line is only a torn tail when it is the last line. Any
//! earlier one is corruption: recovery fails and leaves both files as they
//! are.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{QuillError, Result};

use super::{DATA_FILE, INDEX_FILE};

/// Handles WAL recovery after a crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of fully paired records kept
    pub records_recovered: u64,

    /// Bytes cut from the end of the index file
    pub index_bytes_discarded: u64,

    /// Bytes cut from the end of the data file
    pub data_bytes_discarded: u64,

    /// Whether anything was (or, for verify, would be) cut
    pub was_truncated: bool,
}

/// Byte lengths of the paired prefix
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct PairedPrefix {
    pub records: u64,
    pub index_len: u64,
    pub data_len: u64,
}

impl WalRecovery {
    /// Truncate both files in `dir` to their paired prefix
    pub fn recover(dir: &Path) -> Result<RecoveryResult> {
        let (prefix, result) = Self::inspect(dir)?;

        if result.index_bytes_discarded > 0 {
            let index = OpenOptions::new().write(true).open(dir.join(INDEX_FILE))?;
            index.set_len(prefix.index_len)?;
            index.sync_all()?;
        }
        if result.data_bytes_discarded > 0 {
            let data = OpenOptions::new().write(true).open(dir.join(DATA_FILE))?;
            data.set_len(prefix.data_len)?;
            data.sync_all()?;
        }

        if result.was_truncated {
            tracing::warn!(
                "WAL torn tail cut: kept {} records, dropped {} index bytes and {} data bytes",
                result.records_recovered,
                result.index_bytes_discarded,
                result.data_bytes_discarded
            );
        }

        Ok(result)
    }

    /// Report what [`recover`](Self::recover) would do without touching the files
    pub fn verify(dir: &Path) -> Result<RecoveryResult> {
        Ok(Self::inspect(dir)?.1)
    }

    pub(super) fn inspect(dir: &Path) -> Result<(PairedPrefix, RecoveryResult)> {
        let index_path = dir.join(INDEX_FILE);
        let data_path = dir.join(DATA_FILE);

        let index_file_len = file_len(&index_path)?;
        let data_file_len = file_len(&data_path)?;

        let mut prefix = PairedPrefix::default();

        if index_file_len > 0 {
            let mut reader = BufReader::new(File::open(&index_path)?);
            let mut line = Vec::new();

            loop {
                line.clear();
                let n = reader.read_until(b'\n', &mut line)?;
                if n == 0 {
                    break;
                }

                // Unterminated: the index append was interrupted
                if line.last() != Some(&b'\n') {
                    break;
                }

                let Some(len) = parse_length(&line[..n - 1]) else {
                    // Only the last line can be torn; anything earlier is damage
                    if prefix.index_len + n as u64 == index_file_len {
                        tracing::warn!(
                            "Unparseable final WAL index line after record {}, treating as tail",
                            prefix.records
                        );
                        break;
                    }
                    return Err(QuillError::WalCorruption(format!(
                        "index line {} is not a record length and is followed by more lines",
                        prefix.records + 1
                    )));
                };

                // Data for this record never fully reached the disk
                if prefix.data_len + len > data_file_len {
                    break;
                }

                prefix.records += 1;
                prefix.index_len += n as u64;
                prefix.data_len += len;
            }
        }

        let index_bytes_discarded = index_file_len - prefix.index_len;
        let data_bytes_discarded = data_file_len - prefix.data_len;

        let result = RecoveryResult {
            records_recovered: prefix.records,
            index_bytes_discarded,
            data_bytes_discarded,
            was_truncated: index_bytes_discarded > 0 || data_bytes_discarded > 0,
        };

        Ok((prefix, result))
    }
}

/// Parse one index line (without its newline) as a record length
pub(super) fn parse_length(line: &[u8]) -> Option<u64> {
    if line.is_empty() || !line.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(line)
        .ok()?
        .parse::<u32>()
        .ok()
        .map(u64::from)
}

fn file_len(path: &Path) -> Result<u64> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e.into()),
    }
}
