//! Database initialization
//!
//! Opens (or creates) the SQLite store, applies pragmas, creates every table
//! with `CREATE TABLE IF NOT EXISTS` and then runs versioned migrations.
//! Safe to call on every startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open the database at `db_path`, creating file and schema if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets the web service keep reading while a cleanup pass writes
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Fresh in-memory database with the full schema
///
/// Single connection with no idle/lifetime expiry: every connection to
/// `sqlite::memory:` is a separate database.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables and bring the schema to the current version
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_users_table(pool).await?;
    create_records_table(pool).await?;
    create_cashflows_table(pool).await?;
    create_inventory_movements_table(pool).await?;
    create_system_config_table(pool).await?;

    crate::db::migrations::run_migrations(pool).await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            display_name TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'trader',
            token_hash TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Debt and inventory records
///
/// Only `id` is enforced; every other column may be missing on legacy rows.
pub async fn create_records_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS records (
            id TEXT PRIMARY KEY,
            user_id TEXT,
            type TEXT,
            name TEXT,
            contact TEXT,
            description TEXT,
            amount_owed REAL,
            cost REAL,
            expected_margin REAL,
            selling_price REAL,
            manual_price_override INTEGER,
            quantity_in_stock REAL,
            reorder_level REAL,
            category TEXT,
            unit TEXT,
            status TEXT,
            created_at TEXT,
            updated_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Receipts and payments
///
/// No column types beyond affinity are enforced so that corrupted rows can
/// still be loaded and repaired by the cleanup passes.
pub async fn create_cashflows_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cashflows (
            id TEXT PRIMARY KEY,
            user_id TEXT,
            type TEXT,
            amount REAL,
            party_name TEXT,
            description TEXT,
            contact TEXT,
            method TEXT,
            expense_category TEXT,
            notes TEXT,
            reference TEXT,
            created_at TEXT,
            updated_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_inventory_movements_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS inventory_movements (
            id TEXT PRIMARY KEY,
            inventory_item_id TEXT NOT NULL,
            change_type TEXT NOT NULL,
            quantity REAL NOT NULL,
            date TEXT NOT NULL,
            notes TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_system_config_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS system_config (
            id TEXT PRIMARY KEY,
            value INTEGER NOT NULL DEFAULT 0,
            completed_at TEXT,
            stats TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
