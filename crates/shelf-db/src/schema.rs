//! Catalog schema definition and initialization.
//!
//! Five entity tables and two association tables, created inside a single
//! transaction so a DDL failure leaves no partial schema behind. The DDL is
//! ordered so every `REFERENCES` clause points at a table created earlier in
//! the same transaction: lookup tables first, then `Books`, then the join
//! tables.

use serde::{Deserialize, Serialize};

use crate::connection::{DbConnection, quote_identifier};
use crate::{Error, Result};

/// Supported column types for the catalog DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Text,
    Integer,
}

/// Foreign key description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
}

/// Column definition in a table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub primary_key: bool,
    pub foreign_key: Option<ForeignKey>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            primary_key: false,
            foreign_key: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Mark as the auto-incrementing integer primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn foreign_key(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.foreign_key = Some(ForeignKey {
            table: table.into(),
            column: column.into(),
        });
        self
    }
}

/// Table schema rendered to `CREATE TABLE IF NOT EXISTS` DDL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    /// Composite primary key for association tables. Empty when a single
    /// column carries `primary_key`.
    pub composite_primary_key: Vec<String>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            composite_primary_key: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_composite_primary_key(
        mut self,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.composite_primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn create_table_sql(&self) -> String {
        let mut parts: Vec<String> = self
            .columns
            .iter()
            .map(column_definition_sql)
            .collect();

        if !self.composite_primary_key.is_empty() {
            let keys: Vec<String> = self
                .composite_primary_key
                .iter()
                .map(|column| quote_identifier(column))
                .collect();
            parts.push(format!("PRIMARY KEY ({})", keys.join(", ")));
        }

        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_identifier(&self.name),
            parts.join(", ")
        )
    }
}

fn column_definition_sql(column: &ColumnDef) -> String {
    let mut parts = vec![
        quote_identifier(&column.name),
        column_type_sql(column.column_type).to_string(),
    ];

    if column.primary_key {
        parts.push("PRIMARY KEY AUTOINCREMENT".to_string());
    } else if !column.nullable {
        parts.push("NOT NULL".to_string());
    }

    if let Some(foreign_key) = &column.foreign_key {
        parts.push(format!(
            "REFERENCES {}({})",
            quote_identifier(&foreign_key.table),
            quote_identifier(&foreign_key.column)
        ));
    }

    parts.join(" ")
}

fn column_type_sql(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Text => "TEXT",
        ColumnType::Integer => "INTEGER",
    }
}

/// The seven catalog tables, in creation order.
pub fn catalog_schema() -> Vec<TableSchema> {
    vec![
        TableSchema::new("Languages")
            .with_column(ColumnDef::new("id", ColumnType::Integer).primary_key())
            .with_column(ColumnDef::new("language", ColumnType::Text).not_null()),
        TableSchema::new("Publishers")
            .with_column(ColumnDef::new("id", ColumnType::Integer).primary_key())
            .with_column(ColumnDef::new("name", ColumnType::Text).not_null()),
        TableSchema::new("Authors")
            .with_column(ColumnDef::new("id", ColumnType::Integer).primary_key())
            .with_column(ColumnDef::new("name", ColumnType::Text).not_null()),
        TableSchema::new("Categories")
            .with_column(ColumnDef::new("id", ColumnType::Integer).primary_key())
            .with_column(ColumnDef::new("category", ColumnType::Text).not_null()),
        TableSchema::new("Books")
            .with_column(ColumnDef::new("id", ColumnType::Integer).primary_key())
            .with_column(ColumnDef::new("title", ColumnType::Text).not_null())
            .with_column(
                ColumnDef::new("language_id", ColumnType::Integer).foreign_key("Languages", "id"),
            )
            .with_column(ColumnDef::new("maturityRating", ColumnType::Text))
            .with_column(
                ColumnDef::new("publisher_id", ColumnType::Integer)
                    .foreign_key("Publishers", "id"),
            )
            .with_column(ColumnDef::new("publishedDate", ColumnType::Text))
            .with_column(ColumnDef::new("pageCount", ColumnType::Integer)),
        TableSchema::new("Books_Authors")
            .with_column(
                ColumnDef::new("book_id", ColumnType::Integer)
                    .not_null()
                    .foreign_key("Books", "id"),
            )
            .with_column(
                ColumnDef::new("author_id", ColumnType::Integer)
                    .not_null()
                    .foreign_key("Authors", "id"),
            )
            .with_composite_primary_key(["book_id", "author_id"]),
        TableSchema::new("Books_Categories")
            .with_column(
                ColumnDef::new("book_id", ColumnType::Integer)
                    .not_null()
                    .foreign_key("Books", "id"),
            )
            .with_column(
                ColumnDef::new("category_id", ColumnType::Integer)
                    .not_null()
                    .foreign_key("Categories", "id"),
            )
            .with_composite_primary_key(["book_id", "category_id"]),
    ]
}

/// Execute the DDL for a set of tables inside one transaction.
///
/// On any failure the transaction is rolled back in full, leaving no
/// partial schema behind.
pub async fn apply_schema(connection: &DbConnection, tables: &[TableSchema]) -> Result<()> {
    let tx = connection.begin_transaction().await?;

    for table in tables {
        let sql = table.create_table_sql();
        if let Err(err) = tx.execute(&sql, Vec::new()).await {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "schema rollback failed");
            }
            return Err(Error::Schema {
                details: format!("Failed to create table '{}': {err}", table.name),
            });
        }
    }

    tx.commit().await
}

/// Create all catalog tables. Safe to run against an already-initialized
/// database.
pub async fn initialize(connection: &DbConnection) -> Result<()> {
    apply_schema(connection, &catalog_schema()).await?;
    tracing::info!("catalog schema initialized");
    Ok(())
}
