//! Debt records (creditors and debtors) and record listing

use sqlx::{FromRow, SqlitePool};
use tracing::{info, warn};

use crate::api::types::DebtSummary;
use crate::models::{NewDebtRecord, Record, RecordType};
use crate::sanitize::{check_currency_bounds, max_length_for, sanitize_input, DEFAULT_MAX_CURRENCY};
use crate::{Error, Result};

pub(crate) const RECORD_COLUMNS: &str = "id, user_id, type, name, contact, description, \
    amount_owed, cost, expected_margin, selling_price, manual_price_override, \
    quantity_in_stock, reorder_level, category, unit, status, created_at, updated_at";

/// Sum the user's creditor and debtor balances
pub async fn debt_summary(pool: &SqlitePool, user_id: &str) -> Result<DebtSummary> {
    let (total_i_owe, total_i_am_owed): (f64, f64) = sqlx::query_as(
        r#"
        SELECT
            CAST(COALESCE(SUM(CASE WHEN type = 'creditor' THEN amount_owed END), 0) AS REAL),
            CAST(COALESCE(SUM(CASE WHEN type = 'debtor' THEN amount_owed END), 0) AS REAL)
        FROM records
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(DebtSummary {
        total_i_owe,
        total_i_am_owed,
    })
}

/// Record a creditor or debtor entry
pub async fn insert_debt_record(
    pool: &SqlitePool,
    user_id: &str,
    new: &NewDebtRecord,
) -> Result<Record> {
    if new.record_type == RecordType::Inventory {
        return Err(Error::InvalidInput(
            "Inventory items are added through the inventory endpoints".to_string(),
        ));
    }

    let name = sanitize_input(&new.name, Some(max_length_for("name")), false);
    if name.is_empty() {
        return Err(Error::InvalidInput("Name is required".to_string()));
    }
    let amount_owed = check_currency_bounds(new.amount_owed, DEFAULT_MAX_CURRENCY)?;

    let now = crate::time::now_string();
    let record = Record {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: Some(user_id.to_string()),
        record_type: Some(new.record_type.as_str().to_string()),
        name: Some(name),
        contact: clean_optional(new.contact.as_deref(), "contact"),
        description: clean_optional(new.description.as_deref(), "description"),
        amount_owed: Some(amount_owed),
        created_at: Some(now.clone()),
        updated_at: Some(now),
        ..Default::default()
    };

    insert_record(pool, &record).await?;
    info!(
        "Added {} record {} for user {}",
        new.record_type.as_str(),
        record.id,
        user_id
    );

    Ok(record)
}

/// Sanitize an optional record field; blank values become `None`
pub(crate) fn clean_optional(value: Option<&str>, field: &str) -> Option<String> {
    value
        .map(|v| sanitize_input(v, Some(max_length_for(field)), false))
        .filter(|v| !v.is_empty())
}

pub(crate) async fn insert_record(pool: &SqlitePool, record: &Record) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO records (id, user_id, type, name, contact, description, amount_owed,
            cost, expected_margin, selling_price, manual_price_override, quantity_in_stock,
            reorder_level, category, unit, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.id)
    .bind(&record.user_id)
    .bind(&record.record_type)
    .bind(&record.name)
    .bind(&record.contact)
    .bind(&record.description)
    .bind(record.amount_owed)
    .bind(record.cost)
    .bind(record.expected_margin)
    .bind(record.selling_price)
    .bind(record.manual_price_override)
    .bind(record.quantity_in_stock)
    .bind(record.reorder_level)
    .bind(&record.category)
    .bind(&record.unit)
    .bind(&record.status)
    .bind(&record.created_at)
    .bind(&record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// The user's most recent records of any type, newest first
///
/// Rows that no longer decode are logged and skipped.
pub async fn list_recent_records(
    pool: &SqlitePool,
    user_id: &str,
    limit: i64,
) -> Result<Vec<Record>> {
    let sql = format!(
        "SELECT {} FROM records WHERE user_id = ? \
         ORDER BY julianday(created_at) DESC, created_at DESC LIMIT ?",
        RECORD_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        match Record::from_row(row) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping undecodable record for user {}: {}", user_id, e),
        }
    }

    Ok(records)
}
