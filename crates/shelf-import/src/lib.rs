//! # shelf-import
//!
//! Bulk importer for the shelf catalog loader.
//!
//! Streams the books dataset chunk by chunk and writes each record inside
//! its own transaction: lookup resolution, book insert, and association
//! links either all land or all roll back. A failed record is logged and
//! skipped; the run continues with the next one.

pub mod importer;
pub mod stats;

pub use importer::Importer;
pub use stats::ImportStats;

use thiserror::Error as ThisError;

/// Errors that can occur while importing.
#[derive(ThisError, Debug)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] shelf_db::Error),

    #[error(transparent)]
    Csv(#[from] shelf_csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
