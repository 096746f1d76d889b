//! Integration tests for the cleanup and migration passes
//!
//! Rows are written with raw SQL so that tests can seed the kind of damaged
//! data (backslashes, naive timestamps, text amounts, missing fields) the
//! insert paths would never produce.

use ficore_common::cleanup::{
    bulk_clean_cashflows, check_for_problematic_characters, clean_cashflow_data,
    comprehensive_cashflow_migration, diagnose, emergency_clean_user_data, normalize_datetimes,
    validate_cashflow_data, BATCH_SIZE,
};
use ficore_common::db::cashflows::get_cashflow;
use ficore_common::db::connect_in_memory;
use ficore_common::db::system_config::{
    get_flag, is_flag_set, CASHFLOW_CLEANUP_FLAG, COMPREHENSIVE_CLEANUP_FLAG,
};
use sqlx::SqlitePool;

const STAMP: &str = "2026-10-02T09:00:00.000000Z";

async fn seed(sql: &str, pool: &SqlitePool) {
    sqlx::query(sql).execute(pool).await.unwrap();
}

async fn seed_row(
    pool: &SqlitePool,
    id: &str,
    user_id: Option<&str>,
    kind: Option<&str>,
    amount: f64,
    party_name: &str,
    expense_category: Option<&str>,
) {
    sqlx::query(
        "INSERT INTO cashflows (id, user_id, type, amount, party_name, expense_category, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(user_id)
    .bind(kind)
    .bind(amount)
    .bind(party_name)
    .bind(expense_category)
    .bind(STAMP)
    .execute(pool)
    .await
    .unwrap();
}

#[tokio::test]
async fn test_bulk_clean_rewrites_only_dirty_rows() {
    let pool = connect_in_memory().await.unwrap();
    seed_row(&pool, "a", Some("u1"), Some("payment"), 10.0, r"Ade\wale", Some("cogs")).await;
    seed_row(&pool, "b", Some("u1"), Some("receipt"), 5.0, "Clean Name", None).await;
    seed_row(&pool, "c", Some("u2"), Some("receipt"), 7.0, "Tab\there", None).await;

    let stats = bulk_clean_cashflows(&pool, None).await.unwrap();
    assert_eq!(stats.processed, 3);
    assert_eq!(stats.cleaned, 2);
    assert_eq!(stats.errors, 0);

    let a = get_cashflow(&pool, "a").await.unwrap().unwrap();
    assert_eq!(a.party_name.as_deref(), Some("Adewale"));
    assert!(a.updated_at.is_some());

    let b = get_cashflow(&pool, "b").await.unwrap().unwrap();
    assert_eq!(b.updated_at, None);

    let c = get_cashflow(&pool, "c").await.unwrap().unwrap();
    assert_eq!(c.party_name.as_deref(), Some("Tab here"));

    let again = bulk_clean_cashflows(&pool, None).await.unwrap();
    assert_eq!(again.cleaned, 0);
}

async fn stored_amount(pool: &SqlitePool, id: &str) -> (String, Option<String>) {
    sqlx::query_as("SELECT typeof(amount), CAST(amount AS TEXT) FROM cashflows WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_bulk_clean_leaves_unreadable_amount_alone() {
    let pool = connect_in_memory().await.unwrap();
    seed(
        r"INSERT INTO cashflows (id, user_id, type, amount, party_name, created_at)
          VALUES ('a', 'u1', 'receipt', '5,000', 'Ade\wale', '2026-10-02T09:00:00.000000Z')",
        &pool,
    )
    .await;

    let stats = bulk_clean_cashflows(&pool, None).await.unwrap();
    assert_eq!(stats.cleaned, 1);

    let row = get_cashflow(&pool, "a").await.unwrap().unwrap();
    assert_eq!(row.party_name.as_deref(), Some("Adewale"));
    assert!(row.updated_at.is_some());
    assert_eq!(
        stored_amount(&pool, "a").await,
        ("text".to_string(), Some("5,000".to_string()))
    );
}

#[tokio::test]
async fn test_basic_clean_leaves_unreadable_amount_alone() {
    let pool = connect_in_memory().await.unwrap();
    seed(
        r"INSERT INTO cashflows (id, user_id, type, amount, party_name, created_at)
          VALUES ('a', 'u1', 'receipt', '5,000', 'Iya <Basira>', '2026-10-02T09:00:00.000000Z')",
        &pool,
    )
    .await;

    let stats = clean_cashflow_data(&pool).await.unwrap();
    assert_eq!(stats.cleaned, 1);

    let row = get_cashflow(&pool, "a").await.unwrap().unwrap();
    assert_eq!(row.party_name.as_deref(), Some("Iya Basira"));
    assert_eq!(
        stored_amount(&pool, "a").await,
        ("text".to_string(), Some("5,000".to_string()))
    );
}

#[tokio::test]
async fn test_bulk_clean_walks_past_one_batch() {
    let pool = connect_in_memory().await.unwrap();
    let total = BATCH_SIZE + 5;

    let mut tx = pool.begin().await.unwrap();
    for i in 0..total {
        sqlx::query(
            "INSERT INTO cashflows (id, user_id, type, amount, party_name, created_at) \
             VALUES (?, 'u1', 'receipt', 1.0, ?, '2026-10-01 10:00:00')",
        )
        .bind(format!("row-{:05}", i))
        .bind(format!("Party\\{}", i))
        .execute(&mut *tx)
        .await
        .unwrap();
    }
    tx.commit().await.unwrap();

    let stats = bulk_clean_cashflows(&pool, None).await.unwrap();
    assert_eq!(stats.processed, total as u64);
    assert_eq!(stats.cleaned, total as u64);
    assert_eq!(stats.errors, 0);

    let remaining: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM cashflows WHERE instr(party_name, char(92)) > 0")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(remaining, 0);

    let last = get_cashflow(&pool, &format!("row-{:05}", total - 1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(last.party_name, Some(format!("Party{}", total - 1)));

    let normalized = normalize_datetimes(&pool).await.unwrap();
    assert_eq!(normalized, total as u64);
    let naive: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cashflows WHERE created_at NOT LIKE '%Z'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(naive, 0);
}

#[tokio::test]
async fn test_emergency_clean_is_scoped_to_user() {
    let pool = connect_in_memory().await.unwrap();
    seed_row(&pool, "a", Some("u1"), Some("payment"), 10.0, r"One\", Some("cogs")).await;
    seed_row(&pool, "b", Some("u2"), Some("payment"), 10.0, r"Two\", Some("cogs")).await;

    let stats = emergency_clean_user_data(&pool, "u1").await.unwrap();
    assert_eq!(stats.processed, 1);
    assert_eq!(stats.cleaned, 1);

    let untouched = get_cashflow(&pool, "b").await.unwrap().unwrap();
    assert_eq!(untouched.party_name.as_deref(), Some(r"Two\"));

    let nothing = emergency_clean_user_data(&pool, "nobody").await.unwrap();
    assert_eq!(nothing.processed, 0);
    assert_eq!(nothing.cleaned, 0);
}

#[tokio::test]
async fn test_clean_cashflow_data_sets_flag() {
    let pool = connect_in_memory().await.unwrap();
    seed(
        "INSERT INTO cashflows (id, user_id, type, amount, party_name, created_at) \
         VALUES ('a', 'u1', 'receipt', 3.0, 'Iya <Basira>', '2026-10-01 10:00:00')",
        &pool,
    )
    .await;

    assert!(!is_flag_set(&pool, CASHFLOW_CLEANUP_FLAG).await.unwrap());
    let stats = clean_cashflow_data(&pool).await.unwrap();
    assert_eq!(stats.processed, 1);
    assert_eq!(stats.cleaned, 1);

    let row = get_cashflow(&pool, "a").await.unwrap().unwrap();
    assert_eq!(row.party_name.as_deref(), Some("Iya Basira"));
    assert_eq!(row.created_at.as_deref(), Some("2026-10-01T10:00:00.000000Z"));
    assert!(is_flag_set(&pool, CASHFLOW_CLEANUP_FLAG).await.unwrap());
}

#[tokio::test]
async fn test_comprehensive_migration_repairs_rows() {
    let pool = connect_in_memory().await.unwrap();
    seed(
        r"INSERT INTO cashflows (id, user_id, type, amount, party_name, expense_category, created_at)
          VALUES ('a', 'u1', 'payment', -50, 'Ade\wale', 'snacks', '2026-10-01 10:00:00')",
        &pool,
    )
    .await;
    seed_row(&pool, "b", Some("u1"), None, 20.0, "Shop", Some("cogs")).await;
    seed_row(&pool, "c", Some("u1"), None, 30.0, "Customer", None).await;
    seed_row(&pool, "d", None, Some("receipt"), 5.0, "Ghost", None).await;
    seed(
        "INSERT INTO cashflows (id, user_id, type, amount, party_name) \
         VALUES ('e', 'u1', 'receipt', 'lots', 'Bola')",
        &pool,
    )
    .await;

    let report = comprehensive_cashflow_migration(&pool).await.unwrap();
    assert_eq!(report.datetimes_normalized, 1);
    assert_eq!(report.categories_migrated, 1);
    assert_eq!(report.cleanup.processed, 4);
    assert_eq!(report.cleanup.cleaned, 4);
    assert_eq!(report.cleanup.skipped, 1);
    assert_eq!(report.cleanup.errors, 0);
    assert_eq!(report.issues, vec!["Found 1 records missing user_id".to_string()]);
    assert!(!report.is_clean());

    let a = get_cashflow(&pool, "a").await.unwrap().unwrap();
    assert_eq!(a.party_name.as_deref(), Some("Adewale"));
    assert_eq!(a.amount, Some(50.0));
    assert_eq!(a.expense_category.as_deref(), Some("office_admin"));
    assert_eq!(a.created_at.as_deref(), Some("2026-10-01T10:00:00.000000Z"));

    let b = get_cashflow(&pool, "b").await.unwrap().unwrap();
    assert_eq!(b.cashflow_type.as_deref(), Some("payment"));
    let c = get_cashflow(&pool, "c").await.unwrap().unwrap();
    assert_eq!(c.cashflow_type.as_deref(), Some("receipt"));

    let d = get_cashflow(&pool, "d").await.unwrap().unwrap();
    assert_eq!(d.updated_at, None);

    let e = get_cashflow(&pool, "e").await.unwrap().unwrap();
    assert_eq!(e.amount, Some(0.0));
    assert!(e.created_at.is_some());

    let flag = get_flag(&pool, COMPREHENSIVE_CLEANUP_FLAG).await.unwrap().unwrap();
    assert!(flag.value);
    let stats: serde_json::Value = serde_json::from_str(flag.stats.as_deref().unwrap()).unwrap();
    assert_eq!(stats["processed"], 4);
    assert_eq!(stats["cleaned"], 4);
    assert_eq!(stats["errors"], 0);
}

#[tokio::test]
async fn test_problem_report_counts_per_field() {
    let pool = connect_in_memory().await.unwrap();
    seed_row(&pool, "a", Some("u1"), Some("receipt"), 1.0, r"Back\slash", None).await;
    seed_row(&pool, "b", Some("u1"), Some("receipt"), 1.0, "O'Neil", None).await;
    seed_row(&pool, "c", Some("u1"), Some("receipt"), 1.0, "Plain", None).await;
    seed(
        r#"UPDATE cashflows SET contact = '"0803"', method = '<cash>' WHERE id = 'c'"#,
        &pool,
    )
    .await;

    let report = check_for_problematic_characters(&pool).await.unwrap();
    assert_eq!(report.fields["party_name"], 2);
    assert_eq!(report.fields["contact"], 1);
    assert_eq!(report.fields["method"], 1);
    assert_eq!(report.fields["description"], 0);
    assert_eq!(report.total, 4);

    let issues = validate_cashflow_data(&pool).await.unwrap();
    assert!(issues.contains(&"Found 2 records with problematic characters in party_name".to_string()));
    assert!(issues.contains(&"Found 1 records with problematic characters in contact".to_string()));
}

#[tokio::test]
async fn test_validate_reports_missing_and_negative() {
    let pool = connect_in_memory().await.unwrap();
    assert!(validate_cashflow_data(&pool).await.unwrap().is_empty());

    seed_row(&pool, "a", Some("u1"), Some("payment"), -3.0, "Neg", Some("cogs")).await;
    seed("INSERT INTO cashflows (id, user_id, amount) VALUES ('b', 'u1', 1.0)", &pool).await;
    seed("INSERT INTO cashflows (id, user_id, type) VALUES ('c', 'u1', 'receipt')", &pool).await;

    let issues = validate_cashflow_data(&pool).await.unwrap();
    assert_eq!(
        issues,
        vec![
            "Found 1 records missing type".to_string(),
            "Found 1 records missing amount".to_string(),
            "Found 1 records with negative amounts".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_diagnose_lists_backslashes_and_user_counts() {
    let pool = connect_in_memory().await.unwrap();
    seed_row(&pool, "a", Some("u1"), Some("payment"), 1.0, r"A\B", Some("cogs")).await;
    seed_row(&pool, "b", Some("u1"), Some("receipt"), 1.0, "Fine", None).await;
    seed_row(&pool, "c", Some("u2"), Some("receipt"), 1.0, "Fine", None).await;

    let diagnosis = diagnose(&pool).await.unwrap();
    assert_eq!(diagnosis.backslash_rows.len(), 1);
    let row = &diagnosis.backslash_rows[0];
    assert_eq!(row.record_id, "a");
    assert_eq!(row.field, "party_name");
    assert_eq!(row.value, r"A\B");

    assert_eq!(diagnosis.users.len(), 2);
    let u1 = &diagnosis.users[0];
    assert_eq!(u1.user_id.as_deref(), Some("u1"));
    assert_eq!((u1.total, u1.payments, u1.receipts), (2, 1, 1));
    assert_eq!(u1.undecodable_payments, 0);
}
