//! Chunked CSV reading.
//!
//! The dataset is streamed in fixed-size row groups so an import never
//! holds the whole file in memory. Rows that fail CSV deserialization are
//! surfaced as per-row errors inside the chunk; reading continues with the
//! next row.

use std::fs::File;
use std::path::Path;

use crate::record::BookRecord;
use crate::{Error, Result};

pub const DEFAULT_CHUNK_SIZE: usize = 1_000;

/// Reader behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderOptions {
    pub delimiter: u8,
    pub has_header: bool,
    pub chunk_size: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ReaderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn has_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }
}

/// Streaming source of fixed-size [`BookRecord`] chunks.
pub struct ChunkedReader<R: std::io::Read> {
    records: csv::DeserializeRecordsIntoIter<R, BookRecord>,
    chunk_size: usize,
    done: bool,
}

impl<R: std::io::Read> std::fmt::Debug for ChunkedReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkedReader")
            .field("chunk_size", &self.chunk_size)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl ChunkedReader<File> {
    /// Open a dataset file for chunked reading.
    pub fn open(path: impl AsRef<Path>, options: &ReaderOptions) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(file, options)
    }
}

impl<R: std::io::Read> ChunkedReader<R> {
    pub fn from_reader(reader: R, options: &ReaderOptions) -> Result<Self> {
        if options.chunk_size == 0 {
            return Err(Error::Config(
                "chunk_size must be greater than zero".to_string(),
            ));
        }

        let csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(options.has_header)
            .from_reader(reader);

        Ok(Self {
            records: csv_reader.into_deserialize(),
            chunk_size: options.chunk_size,
            done: false,
        })
    }

    /// Read the next chunk of up to `chunk_size` rows.
    ///
    /// Returns `None` once the source is exhausted. Unreadable rows are
    /// returned as `Err` items in place, so callers keep their position in
    /// the stream.
    pub fn next_chunk(&mut self) -> Option<Vec<Result<BookRecord>>> {
        if self.done {
            return None;
        }

        let mut chunk = Vec::with_capacity(self.chunk_size);
        while chunk.len() < self.chunk_size {
            match self.records.next() {
                Some(Ok(record)) => chunk.push(Ok(record)),
                Some(Err(err)) => {
                    let mapped = map_csv_error(&err);
                    tracing::debug!(error = %mapped, "row failed to deserialize");
                    chunk.push(Err(mapped));
                }
                None => {
                    self.done = true;
                    break;
                }
            }
        }

        if chunk.is_empty() { None } else { Some(chunk) }
    }
}

fn map_csv_error(err: &csv::Error) -> Error {
    let line = err.position().map(csv::Position::line).unwrap_or(0);
    Error::read_at(line, err.to_string())
}
