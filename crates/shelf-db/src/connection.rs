//! Database connection and transaction primitives.
//!
//! The loader runs on a single connection used serially, so there is no
//! pooling here: one libsql connection opened at startup and closed in the
//! final cleanup step. Opening a local database creates its file when
//! absent, which is how the loader "creates the target database".

use std::sync::Arc;
use std::time::Duration;

use libsql::{Builder, Connection as LibsqlConnection, Database, Transaction, params_from_iter};
use tokio::sync::RwLock;

use crate::{Error, Result};

pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Connection parameters resolved from the env-file configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub database_url: String,
    pub auth_token: Option<String>,
    pub timeout_ms: u64,
}

impl ConnectionConfig {
    pub fn in_memory() -> Self {
        Self {
            database_url: ":memory:".to_string(),
            auth_token: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn local(path: impl Into<String>) -> Self {
        Self {
            database_url: path.into(),
            auth_token: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn remote(url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            database_url: url.into(),
            auth_token: Some(auth_token.into()),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Single serial database connection.
#[derive(Clone)]
pub struct DbConnection {
    state: Arc<RwLock<Option<OpenState>>>,
    config: ConnectionConfig,
}

struct OpenState {
    // Keep the Database alive for the lifetime of the connection.
    _database: Database,
    connection: LibsqlConnection,
}

impl DbConnection {
    /// Create a connection with default config (in-memory database).
    pub fn new() -> Self {
        Self::with_config(ConnectionConfig::default())
    }

    pub fn with_config(config: ConnectionConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(None)),
            config,
        }
    }

    pub fn config(&self) -> ConnectionConfig {
        self.config.clone()
    }

    /// Open the database, creating a local file when absent.
    ///
    /// Enables foreign-key enforcement and the configured busy timeout.
    /// Connecting twice is a no-op.
    pub async fn connect(&self) -> Result<()> {
        if self.is_connected().await {
            return Ok(());
        }

        let build_future = build_database(&self.config);
        let database =
            tokio::time::timeout(Duration::from_millis(self.config.timeout_ms), build_future)
                .await
                .map_err(|_| Error::Connection {
                    details: format!(
                        "Timed out after {}ms while opening database '{}'",
                        self.config.timeout_ms, self.config.database_url
                    ),
                })??;

        let connection = database.connect().map_err(|source| Error::Libsql {
            context: "connect database".to_string(),
            source,
        })?;
        connection
            .busy_timeout(Duration::from_millis(self.config.timeout_ms))
            .map_err(|source| Error::Libsql {
                context: "set busy timeout".to_string(),
                source,
            })?;
        connection
            .execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|source| Error::Sql {
                statement: "PRAGMA foreign_keys = ON".to_string(),
                source,
            })?;

        *self.state.write().await = Some(OpenState {
            _database: database,
            connection,
        });
        tracing::debug!(database = %self.config.database_url, "database connection opened");
        Ok(())
    }

    pub async fn close(&self) {
        if self.state.write().await.take().is_some() {
            tracing::debug!(database = %self.config.database_url, "database connection closed");
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.state.read().await.is_some()
    }

    pub async fn begin_transaction(&self) -> Result<DbTransaction> {
        let connection = self.handle().await?;
        let transaction = connection
            .transaction()
            .await
            .map_err(|source| Error::Libsql {
                context: "begin transaction".to_string(),
                source,
            })?;
        Ok(DbTransaction {
            transaction: Some(transaction),
        })
    }

    /// Execute a statement outside of any explicit transaction.
    pub async fn execute(&self, sql: &str, params: Vec<libsql::Value>) -> Result<u64> {
        let connection = self.handle().await?;
        connection
            .execute(sql, params_from_iter(params))
            .await
            .map_err(|source| Error::Sql {
                statement: sql.to_string(),
                source,
            })
    }

    /// Run a query expected to yield at most one integer column.
    pub async fn query_id(&self, sql: &str, params: Vec<libsql::Value>) -> Result<Option<i64>> {
        let connection = self.handle().await?;
        first_integer(&connection, sql, params).await
    }

    pub async fn table_row_count(&self, table: &str) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(table));
        let count = self.query_id(&sql, Vec::new()).await?.unwrap_or(0);
        Ok(count.max(0) as usize)
    }

    async fn handle(&self) -> Result<LibsqlConnection> {
        self.state
            .read()
            .await
            .as_ref()
            .map(|open| open.connection.clone())
            .ok_or_else(|| Error::Connection {
                details: "Database is not connected".to_string(),
            })
    }
}

impl Default for DbConnection {
    fn default() -> Self {
        Self::new()
    }
}

/// Transaction over the loader's connection.
///
/// Commit and rollback consume the transaction; dropping it without either
/// rolls back at the database level.
pub struct DbTransaction {
    transaction: Option<Transaction>,
}

impl DbTransaction {
    pub fn is_active(&self) -> bool {
        self.transaction.is_some()
    }

    pub async fn execute(&self, sql: &str, params: Vec<libsql::Value>) -> Result<u64> {
        let tx = self.handle()?;
        tx.execute(sql, params_from_iter(params))
            .await
            .map_err(|source| Error::Sql {
                statement: sql.to_string(),
                source,
            })
    }

    /// Run a query expected to yield at most one integer column.
    pub async fn query_id(&self, sql: &str, params: Vec<libsql::Value>) -> Result<Option<i64>> {
        let tx = self.handle()?;
        first_integer(tx, sql, params).await
    }

    /// Row id generated by the most recent insert on this transaction.
    pub fn last_insert_rowid(&self) -> Result<i64> {
        Ok(self.handle()?.last_insert_rowid())
    }

    pub async fn commit(mut self) -> Result<()> {
        let tx = self.transaction.take().ok_or_else(|| Error::Transaction {
            details: "Transaction is no longer active".to_string(),
        })?;
        tx.commit().await.map_err(|source| Error::Libsql {
            context: "commit transaction".to_string(),
            source,
        })
    }

    pub async fn rollback(mut self) -> Result<()> {
        let tx = self.transaction.take().ok_or_else(|| Error::Transaction {
            details: "Transaction is no longer active".to_string(),
        })?;
        tx.rollback().await.map_err(|source| Error::Libsql {
            context: "rollback transaction".to_string(),
            source,
        })
    }

    fn handle(&self) -> Result<&Transaction> {
        self.transaction.as_ref().ok_or_else(|| Error::Transaction {
            details: "Transaction is no longer active".to_string(),
        })
    }
}

async fn build_database(config: &ConnectionConfig) -> Result<Database> {
    let url = config.database_url.trim();
    if url.is_empty() {
        return Err(Error::Config {
            details: "database_url must be provided".to_string(),
        });
    }

    if is_remote_url(url) {
        let token = config.auth_token.clone().ok_or_else(|| Error::Config {
            details: "auth_token is required for remote databases".to_string(),
        })?;
        let builder = Builder::new_remote(url.to_string(), token);
        builder.build().await.map_err(|source| Error::Libsql {
            context: "open remote database".to_string(),
            source,
        })
    } else {
        let path = url.strip_prefix("file:").unwrap_or(url);
        let builder = Builder::new_local(path);
        builder.build().await.map_err(|source| Error::Libsql {
            context: "open local database".to_string(),
            source,
        })
    }
}

pub fn is_remote_url(url: &str) -> bool {
    url.starts_with("libsql://") || url.starts_with("https://") || url.starts_with("http://")
}

async fn first_integer(
    connection: &LibsqlConnection,
    sql: &str,
    params: Vec<libsql::Value>,
) -> Result<Option<i64>> {
    let mut rows = connection
        .query(sql, params_from_iter(params))
        .await
        .map_err(|source| Error::Sql {
            statement: sql.to_string(),
            source,
        })?;

    match rows.next().await.map_err(|source| Error::Sql {
        statement: sql.to_string(),
        source,
    })? {
        Some(row) => {
            let value: i64 = row.get(0).map_err(|source| Error::Sql {
                statement: sql.to_string(),
                source,
            })?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

pub(crate) fn quote_identifier(value: &str) -> String {
    let escaped = value.replace('"', "\"\"");
    format!("\"{escaped}\"")
}
