//! Maintenance completion flags (`system_config`)

use crate::models::SystemFlag;
use crate::Result;
use serde::Serialize;
use sqlx::SqlitePool;

/// Set by the basic cashflow cleanup pass
pub const CASHFLOW_CLEANUP_FLAG: &str = "cashflow_data_cleanup_completed";

/// Set by the comprehensive cashflow migration
pub const COMPREHENSIVE_CLEANUP_FLAG: &str = "comprehensive_cashflow_cleanup_completed";

pub async fn get_flag(pool: &SqlitePool, id: &str) -> Result<Option<SystemFlag>> {
    let flag = sqlx::query_as::<_, SystemFlag>(
        "SELECT id, value, completed_at, stats FROM system_config WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(flag)
}

/// True if the flag exists and is set
pub async fn is_flag_set(pool: &SqlitePool, id: &str) -> Result<bool> {
    Ok(get_flag(pool, id).await?.map(|f| f.value).unwrap_or(false))
}

/// Mark a pass as completed, storing its stats as JSON
pub async fn set_flag<S: Serialize>(pool: &SqlitePool, id: &str, stats: &S) -> Result<()> {
    let stats = serde_json::to_string(stats)?;

    sqlx::query(
        r#"
        INSERT INTO system_config (id, value, completed_at, stats)
        VALUES (?, 1, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            value = excluded.value,
            completed_at = excluded.completed_at,
            stats = excluded.stats
        "#,
    )
    .bind(id)
    .bind(crate::time::now_string())
    .bind(stats)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_flags(pool: &SqlitePool) -> Result<Vec<SystemFlag>> {
    let flags = sqlx::query_as::<_, SystemFlag>(
        "SELECT id, value, completed_at, stats FROM system_config ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(flags)
}
