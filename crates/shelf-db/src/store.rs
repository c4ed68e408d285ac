//! Catalog store operations.
//!
//! Get-or-create resolution for the four lookup tables, book row inserts,
//! and batched association links. All operations run against an open
//! [`DbTransaction`] so the importer decides the commit boundaries.

use chrono::NaiveDate;

use crate::Result;
use crate::connection::{DbTransaction, quote_identifier};

/// Deduplicated lookup tables, keyed by case-insensitive name equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Language,
    Publisher,
    Author,
    Category,
}

impl Lookup {
    pub fn table(self) -> &'static str {
        match self {
            Lookup::Language => "Languages",
            Lookup::Publisher => "Publishers",
            Lookup::Author => "Authors",
            Lookup::Category => "Categories",
        }
    }

    pub fn name_column(self) -> &'static str {
        match self {
            Lookup::Language => "language",
            Lookup::Publisher => "name",
            Lookup::Author => "name",
            Lookup::Category => "category",
        }
    }
}

/// The two many-to-many association tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Association {
    Authors,
    Categories,
}

impl Association {
    /// The lookup entity on the far side of this association.
    pub fn lookup(self) -> Lookup {
        match self {
            Association::Authors => Lookup::Author,
            Association::Categories => Lookup::Category,
        }
    }

    fn table(self) -> &'static str {
        match self {
            Association::Authors => "Books_Authors",
            Association::Categories => "Books_Categories",
        }
    }

    fn other_column(self) -> &'static str {
        match self {
            Association::Authors => "author_id",
            Association::Categories => "category_id",
        }
    }
}

/// A book row ready for insertion, with lookup references already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub language_id: Option<i64>,
    pub maturity_rating: Option<String>,
    pub publisher_id: Option<i64>,
    pub published_date: Option<NaiveDate>,
    pub page_count: Option<i64>,
}

/// Resolve a lookup name to its row id, inserting the row on first use.
///
/// Matching is case-insensitive; the stored spelling is whichever variant
/// arrived first. Lookup rows are never updated afterwards.
pub async fn get_or_create(tx: &DbTransaction, lookup: Lookup, name: &str) -> Result<i64> {
    let table = quote_identifier(lookup.table());
    let column = quote_identifier(lookup.name_column());

    let select = format!("SELECT id FROM {table} WHERE LOWER({column}) = LOWER(?1)");
    if let Some(id) = tx
        .query_id(&select, vec![libsql::Value::Text(name.to_string())])
        .await?
    {
        return Ok(id);
    }

    let insert = format!("INSERT INTO {table} ({column}) VALUES (?1)");
    tx.execute(&insert, vec![libsql::Value::Text(name.to_string())])
        .await?;
    tx.last_insert_rowid()
}

/// Insert a book row and return its generated id.
pub async fn insert_book(tx: &DbTransaction, book: &NewBook) -> Result<i64> {
    let sql = "INSERT INTO \"Books\" \
               (\"title\", \"language_id\", \"maturityRating\", \"publisher_id\", \
               \"publishedDate\", \"pageCount\") \
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

    let params = vec![
        libsql::Value::Text(book.title.clone()),
        optional_integer(book.language_id),
        optional_text(book.maturity_rating.as_deref()),
        optional_integer(book.publisher_id),
        optional_text(book.published_date.map(|date| date.to_string()).as_deref()),
        optional_integer(book.page_count),
    ];

    tx.execute(sql, params).await?;
    tx.last_insert_rowid()
}

/// Link a book to each author id. Returns the number of rows written.
pub async fn link_authors(tx: &DbTransaction, book_id: i64, author_ids: &[i64]) -> Result<usize> {
    link(tx, Association::Authors, book_id, author_ids).await
}

/// Link a book to each category id. Returns the number of rows written.
pub async fn link_categories(
    tx: &DbTransaction,
    book_id: i64,
    category_ids: &[i64],
) -> Result<usize> {
    link(tx, Association::Categories, book_id, category_ids).await
}

/// Batched association insert.
///
/// `INSERT OR IGNORE` absorbs pairs repeated within one record; the
/// composite primary key keeps the table unique per (book, other) pair.
pub async fn link(
    tx: &DbTransaction,
    association: Association,
    book_id: i64,
    other_ids: &[i64],
) -> Result<usize> {
    let sql = format!(
        "INSERT OR IGNORE INTO {} (\"book_id\", {}) VALUES (?1, ?2)",
        quote_identifier(association.table()),
        quote_identifier(association.other_column())
    );

    let mut written = 0usize;
    for other_id in other_ids {
        let changed = tx
            .execute(
                &sql,
                vec![
                    libsql::Value::Integer(book_id),
                    libsql::Value::Integer(*other_id),
                ],
            )
            .await?;
        written += changed as usize;
    }
    Ok(written)
}

fn optional_text(value: Option<&str>) -> libsql::Value {
    match value {
        Some(text) => libsql::Value::Text(text.to_string()),
        None => libsql::Value::Null,
    }
}

fn optional_integer(value: Option<i64>) -> libsql::Value {
    match value {
        Some(integer) => libsql::Value::Integer(integer),
        None => libsql::Value::Null,
    }
}

impl NewBook {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            language_id: None,
            maturity_rating: None,
            publisher_id: None,
            published_date: None,
            page_count: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::connection::DbConnection;
    use crate::schema;

    async fn catalog() -> DbConnection {
        let conn = DbConnection::new();
        conn.connect().await.unwrap();
        schema::initialize(&conn).await.unwrap();
        conn
    }

    #[tokio::test]
    async fn test_get_or_create_is_case_insensitive() {
        let conn = catalog().await;
        let tx = conn.begin_transaction().await.unwrap();

        let first = get_or_create(&tx, Lookup::Language, "English").await.unwrap();
        let second = get_or_create(&tx, Lookup::Language, "ENGLISH").await.unwrap();
        let third = get_or_create(&tx, Lookup::Language, "english").await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first, third);
        assert_eq!(conn.table_row_count("Languages").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_or_create_distinct_names() {
        let conn = catalog().await;
        let tx = conn.begin_transaction().await.unwrap();

        let acme = get_or_create(&tx, Lookup::Publisher, "ACME").await.unwrap();
        let orbit = get_or_create(&tx, Lookup::Publisher, "Orbit").await.unwrap();
        tx.commit().await.unwrap();

        assert_ne!(acme, orbit);
        assert_eq!(conn.table_row_count("Publishers").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_insert_book_returns_generated_id() {
        let conn = catalog().await;
        let tx = conn.begin_transaction().await.unwrap();

        let language_id = get_or_create(&tx, Lookup::Language, "English").await.unwrap();
        let mut book = NewBook::titled("Foo");
        book.language_id = Some(language_id);
        book.page_count = Some(100);
        book.published_date = NaiveDate::from_ymd_opt(2020, 1, 1);

        let book_id = insert_book(&tx, &book).await.unwrap();
        tx.commit().await.unwrap();

        assert!(book_id > 0);
        assert_eq!(conn.table_row_count("Books").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_book_with_unknown_language_is_rejected() {
        let conn = catalog().await;
        let tx = conn.begin_transaction().await.unwrap();

        let mut book = NewBook::titled("Ghost");
        book.language_id = Some(9_999);

        let err = insert_book(&tx, &book).await.unwrap_err();
        assert!(matches!(err, Error::Sql { .. }));
    }

    #[tokio::test]
    async fn test_link_authors_deduplicates_pairs() {
        let conn = catalog().await;
        let tx = conn.begin_transaction().await.unwrap();

        let author = get_or_create(&tx, Lookup::Author, "A. Author").await.unwrap();
        let other = get_or_create(&tx, Lookup::Author, "B. Writer").await.unwrap();
        let book_id = insert_book(&tx, &NewBook::titled("Foo")).await.unwrap();

        let written = link_authors(&tx, book_id, &[author, other, author])
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(written, 2);
        assert_eq!(conn.table_row_count("Books_Authors").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_link_with_empty_list_writes_nothing() {
        let conn = catalog().await;
        let tx = conn.begin_transaction().await.unwrap();

        let book_id = insert_book(&tx, &NewBook::titled("Foo")).await.unwrap();
        let written = link_categories(&tx, book_id, &[]).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(written, 0);
        assert_eq!(conn.table_row_count("Books_Categories").await.unwrap(), 0);
        assert_eq!(conn.table_row_count("Books").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_lookup_names_survive_rollback_boundary() {
        let conn = catalog().await;

        let tx = conn.begin_transaction().await.unwrap();
        get_or_create(&tx, Lookup::Category, "Fiction").await.unwrap();
        tx.rollback().await.unwrap();
        assert_eq!(conn.table_row_count("Categories").await.unwrap(), 0);

        let tx = conn.begin_transaction().await.unwrap();
        let id = get_or_create(&tx, Lookup::Category, "Fiction").await.unwrap();
        tx.commit().await.unwrap();
        assert!(id > 0);
        assert_eq!(conn.table_row_count("Categories").await.unwrap(), 1);
    }
}
