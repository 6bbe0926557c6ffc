//! WAL Reader
//!
//! Sequential replay of records by consuming index lengths and slicing the
//! matching byte ranges out of the data file.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{QuillError, Result};

use super::recovery::parse_length;
use super::{DATA_FILE, INDEX_FILE};

/// Reads records from the WAL in append order
pub struct WalReader {
    index: BufReader<File>,
    data: BufReader<File>,

    /// Stop after this many records (None = read until the files run out)
    limit: Option<u64>,

    /// Records returned so far
    position: u64,

    line: Vec<u8>,
    exhausted: bool,
}

impl WalReader {
    /// Open a reader over everything currently in `dir`
    ///
    /// A torn tail ends the iteration instead of failing it.
    pub fn open(dir: &Path) -> Result<Self> {
        Self::with_limit(dir, None)
    }

    pub(super) fn bounded(dir: &Path, limit: u64) -> Result<Self> {
        Self::with_limit(dir, Some(limit))
    }

    fn with_limit(dir: &Path, limit: Option<u64>) -> Result<Self> {
        let index = File::open(dir.join(INDEX_FILE))?;
        let data = File::open(dir.join(DATA_FILE))?;

        Ok(Self {
            index: BufReader::new(index),
            data: BufReader::new(data),
            limit,
            position: 0,
            line: Vec::new(),
            exhausted: false,
        })
    }

    /// Read the next record, or `None` at the end of the log
    pub fn next_record(&mut self) -> Result<Option<Vec<u8>>> {
        if self.exhausted || self.limit.is_some_and(|limit| self.position >= limit) {
            self.exhausted = true;
            return Ok(None);
        }

        self.line.clear();
        let n = self.index.read_until(b'\n', &mut self.line)?;
        if n == 0 || self.line.last() != Some(&b'\n') {
            self.exhausted = true;
            return Ok(None);
        }

        let length = parse_length(&self.line[..n - 1]).ok_or_else(|| {
            QuillError::WalCorruption(format!(
                "index line {} is not a record length",
                self.position + 1
            ))
        })?;

        // Sized by the bytes present; a torn length may be huge
        let mut record = Vec::new();
        self.data.by_ref().take(length).read_to_end(&mut record)?;
        if (record.len() as u64) < length {
            self.exhausted = true;
            return Ok(None);
        }

        self.position += 1;
        Ok(Some(record))
    }

    /// Read the next record, failing with [`QuillError::EndOfLog`] past the end
    pub fn read_next(&mut self) -> Result<Vec<u8>> {
        self.next_record()?.ok_or(QuillError::EndOfLog)
    }

    /// Start over from the first record
    pub fn rewind(&mut self) -> Result<()> {
        self.index.seek(SeekFrom::Start(0))?;
        self.data.seek(SeekFrom::Start(0))?;
        self.position = 0;
        self.exhausted = false;
        Ok(())
    }

    /// Number of records read since the start (or the last rewind)
    pub fn position(&self) -> u64 {
        self.position
    }
}

impl Iterator for WalReader {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_record() {
            Ok(record) => record.map(Ok),
            Err(e) => {
                self.exhausted = true;
                Some(Err(e))
            }
        }
    }
}
