//! Database creation, reopening and schema versioning

use ficore_common::db::{get_schema_version, init_database, CURRENT_SCHEMA_VERSION};

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("ficore.db");

    let pool = init_database(&db_path).await;
    assert!(pool.is_ok(), "Database initialization failed: {:?}", pool.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("ficore.db");

    let first = init_database(&db_path).await.unwrap();
    sqlx::query("INSERT INTO cashflows (id, user_id, type, amount) VALUES ('x', 'u1', 'receipt', 1.0)")
        .execute(&first)
        .await
        .unwrap();
    first.close().await;

    let second = init_database(&db_path).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cashflows")
        .fetch_one(&second)
        .await
        .unwrap();
    assert_eq!(count, 1, "Existing rows must survive reinitialization");
}

#[tokio::test]
async fn test_schema_is_at_current_version() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("ficore.db")).await.unwrap();

    assert_eq!(get_schema_version(&pool).await.unwrap(), CURRENT_SCHEMA_VERSION);

    for table in ["users", "records", "cashflows", "inventory_movements", "system_config"] {
        let exists: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(exists, 1, "missing table {}", table);
    }
}
