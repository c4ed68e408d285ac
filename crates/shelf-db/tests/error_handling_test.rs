use shelf_db::{
    ColumnDef, ColumnType, ConnectionConfig, DbConnection, Error, TableSchema, apply_schema,
    initialize,
};

#[tokio::test]
async fn test_failed_connection_creates_no_tables() {
    let conn = DbConnection::with_config(ConnectionConfig {
        database_url: "libsql://unreachable.example.io".to_string(),
        auth_token: None,
        timeout_ms: 200,
    });

    let err = conn.connect().await.unwrap_err();
    assert!(matches!(err, Error::Config { .. } | Error::Connection { .. }));
    assert!(!conn.is_connected().await);

    // With no usable connection, schema setup must fail before any DDL runs.
    let err = initialize(&conn).await.unwrap_err();
    assert!(matches!(err, Error::Connection { .. }));
}

#[tokio::test]
async fn test_operations_after_close_report_connection_error() {
    let conn = DbConnection::new();
    conn.connect().await.unwrap();
    conn.close().await;

    let err = conn.execute("SELECT 1", Vec::new()).await.unwrap_err();
    assert!(matches!(err, Error::Connection { .. }));
}

#[tokio::test]
async fn test_schema_failure_rolls_back_everything() {
    let conn = DbConnection::new();
    conn.connect().await.unwrap();

    let valid = TableSchema::new("Readers")
        .with_column(ColumnDef::new("id", ColumnType::Integer).primary_key())
        .with_column(ColumnDef::new("name", ColumnType::Text).not_null());
    // A table with no columns renders to invalid DDL, failing mid-sequence.
    let broken = TableSchema::new("Broken");

    let err = apply_schema(&conn, &[valid, broken]).await.unwrap_err();
    match err {
        Error::Schema { details } => assert!(details.contains("Broken")),
        other => panic!("expected schema error, got {other}"),
    }

    let kept = conn
        .query_id(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'Readers'",
            Vec::new(),
        )
        .await
        .unwrap();
    assert_eq!(kept, Some(0), "rolled-back schema must not keep tables");
}
