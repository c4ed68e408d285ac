//! # shelf-db
//!
//! Database layer for the shelf catalog loader.
//!
//! This crate provides the connection manager, the catalog schema
//! initializer, and the store operations (get-or-create lookups, book
//! inserts, association links) used by the bulk importer.

pub mod config;
pub mod connection;
pub mod schema;
pub mod store;

pub use config::{DATABASE_KEY, EnvConfig, connection_config_from_env_file};
pub use connection::{ConnectionConfig, DbConnection, DbTransaction};
pub use schema::{
    ColumnDef, ColumnType, ForeignKey, TableSchema, apply_schema, catalog_schema, initialize,
};
pub use store::{
    Association, Lookup, NewBook, get_or_create, insert_book, link, link_authors, link_categories,
};

use thiserror::Error;

/// Errors that can occur when working with the database.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {details}")]
    Config { details: String },

    #[error("Connection error: {details}")]
    Connection { details: String },

    #[error("Libsql error during {context}: {source}")]
    Libsql {
        context: String,
        #[source]
        source: libsql::Error,
    },

    #[error("SQL error executing `{statement}`: {source}")]
    Sql {
        statement: String,
        #[source]
        source: libsql::Error,
    },

    #[error("Query error on `{table}`: {details}")]
    Query { table: String, details: String },

    #[error("Schema error: {details}")]
    Schema { details: String },

    #[error("Transaction error: {details}")]
    Transaction { details: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
