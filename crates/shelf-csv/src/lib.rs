//! # shelf-csv
//!
//! CSV source for the shelf catalog loader.
//!
//! Streams the books dataset in fixed-size chunks and parses the
//! list-literal columns (`authors`, `categories`) that encode collections
//! as Python-style literals rather than plain comma-separated text.

pub mod list;
pub mod reader;
pub mod record;

pub use list::parse_list;
pub use reader::{ChunkedReader, DEFAULT_CHUNK_SIZE, ReaderOptions};
pub use record::BookRecord;

use thiserror::Error as ThisError;

/// Errors that can occur while reading the source dataset.
#[derive(ThisError, Debug)]
pub enum Error {
    /// CSV read or deserialization error with line context.
    #[error("CSV read error at line {line}: {message}")]
    Read { line: u64, message: String },

    /// Malformed list literal in an `authors`/`categories` field.
    #[error("List syntax error at offset {position}: {message}")]
    ListSyntax { position: usize, message: String },

    /// Field value that cannot be converted to its target type.
    #[error("Conversion error in column '{column}': {message}")]
    Conversion { column: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn read_at(line: u64, message: impl Into<String>) -> Self {
        Self::Read {
            line,
            message: message.into(),
        }
    }

    pub fn list_syntax(position: usize, message: impl Into<String>) -> Self {
        Self::ListSyntax {
            position,
            message: message.into(),
        }
    }

    pub fn conversion(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conversion {
            column: column.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
