use chrono::NaiveDate;
use shelf_db::{
    ConnectionConfig, DbConnection, Lookup, NewBook, get_or_create, initialize, insert_book,
    link_authors, link_categories,
};

async fn file_backed_catalog(path: &std::path::Path) -> DbConnection {
    let conn = DbConnection::with_config(ConnectionConfig::local(path.display().to_string()));
    conn.connect().await.unwrap();
    initialize(&conn).await.unwrap();
    conn
}

#[tokio::test]
async fn test_local_database_file_is_created_when_absent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("books.db");
    assert!(!path.exists());

    let conn = file_backed_catalog(&path).await;
    assert!(path.exists());
    conn.close().await;
}

#[tokio::test]
async fn test_full_record_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let conn = file_backed_catalog(&dir.path().join("books.db")).await;

    let tx = conn.begin_transaction().await.unwrap();
    let language_id = get_or_create(&tx, Lookup::Language, "English").await.unwrap();
    let publisher_id = get_or_create(&tx, Lookup::Publisher, "ACME").await.unwrap();

    let book = NewBook {
        title: "Foo".to_string(),
        language_id: Some(language_id),
        maturity_rating: Some("NOT_MATURE".to_string()),
        publisher_id: Some(publisher_id),
        published_date: NaiveDate::from_ymd_opt(2020, 1, 1),
        page_count: Some(100),
    };
    let book_id = insert_book(&tx, &book).await.unwrap();

    let author_id = get_or_create(&tx, Lookup::Author, "A. Author").await.unwrap();
    link_authors(&tx, book_id, &[author_id]).await.unwrap();
    let category_id = get_or_create(&tx, Lookup::Category, "Fiction").await.unwrap();
    link_categories(&tx, book_id, &[category_id]).await.unwrap();
    tx.commit().await.unwrap();

    for (table, expected) in [
        ("Languages", 1),
        ("Publishers", 1),
        ("Books", 1),
        ("Authors", 1),
        ("Categories", 1),
        ("Books_Authors", 1),
        ("Books_Categories", 1),
    ] {
        assert_eq!(
            conn.table_row_count(table).await.unwrap(),
            expected,
            "row count mismatch in {table}"
        );
    }
    conn.close().await;
}

#[tokio::test]
async fn test_dedup_persists_across_transactions() {
    let dir = tempfile::tempdir().unwrap();
    let conn = file_backed_catalog(&dir.path().join("books.db")).await;

    let tx = conn.begin_transaction().await.unwrap();
    let first = get_or_create(&tx, Lookup::Author, "Jane Roe").await.unwrap();
    tx.commit().await.unwrap();

    let tx = conn.begin_transaction().await.unwrap();
    let second = get_or_create(&tx, Lookup::Author, "JANE ROE").await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(conn.table_row_count("Authors").await.unwrap(), 1);
    conn.close().await;
}
