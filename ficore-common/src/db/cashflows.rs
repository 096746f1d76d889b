//! Receipts and payments
//!
//! Every insert goes through [`cleanup::clean_cashflow_record`] first, so
//! stored text is sanitized and timestamps are canonical.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqliteExecutor, SqlitePool};
use tracing::{info, warn};

use crate::api::types::CashflowSummary;
use crate::cleanup;
use crate::models::{Cashflow, CashflowType, NewCashflow};
use crate::validation::validate_cashflow;
use crate::{time, Error, Result};

pub(crate) const CASHFLOW_COLUMNS: &str = "id, user_id, type, amount, party_name, description, \
    contact, method, expense_category, notes, reference, created_at, updated_at";

/// Insert a cashflow row as-is
pub async fn insert_cashflow<'e, E>(executor: E, cashflow: &Cashflow) -> Result<()>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO cashflows (id, user_id, type, amount, party_name, description, contact,
            method, expense_category, notes, reference, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&cashflow.id)
    .bind(&cashflow.user_id)
    .bind(&cashflow.cashflow_type)
    .bind(cashflow.amount)
    .bind(&cashflow.party_name)
    .bind(&cashflow.description)
    .bind(&cashflow.contact)
    .bind(&cashflow.method)
    .bind(&cashflow.expense_category)
    .bind(&cashflow.notes)
    .bind(&cashflow.reference)
    .bind(&cashflow.created_at)
    .bind(&cashflow.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Overwrite every column of an existing cashflow
pub async fn update_cashflow<'e, E>(executor: E, cashflow: &Cashflow) -> Result<()>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE cashflows SET
            user_id = ?, type = ?, amount = ?, party_name = ?, description = ?, contact = ?,
            method = ?, expense_category = ?, notes = ?, reference = ?, created_at = ?,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&cashflow.user_id)
    .bind(&cashflow.cashflow_type)
    .bind(cashflow.amount)
    .bind(&cashflow.party_name)
    .bind(&cashflow.description)
    .bind(&cashflow.contact)
    .bind(&cashflow.method)
    .bind(&cashflow.expense_category)
    .bind(&cashflow.notes)
    .bind(&cashflow.reference)
    .bind(&cashflow.created_at)
    .bind(&cashflow.updated_at)
    .bind(&cashflow.id)
    .execute(executor)
    .await?;

    Ok(())
}

/// Columns a partial update may write
const UPDATABLE_COLUMNS: &[&str] = &[
    "user_id",
    "type",
    "amount",
    "party_name",
    "description",
    "contact",
    "method",
    "expense_category",
    "notes",
    "reference",
    "created_at",
    "updated_at",
];

/// Columns whose values differ between two versions of the same row
///
/// Amounts compare bit for bit so a NaN never counts as a change.
pub fn changed_columns(before: &Cashflow, after: &Cashflow) -> Vec<&'static str> {
    UPDATABLE_COLUMNS
        .iter()
        .copied()
        .filter(|column| match *column {
            "amount" => before.amount.map(f64::to_bits) != after.amount.map(f64::to_bits),
            other => before.text_column(other) != after.text_column(other),
        })
        .collect()
}

/// Write only `columns` of an existing cashflow
///
/// Columns not listed keep their stored value and type, including values
/// that a lenient decode could not read.
pub async fn update_cashflow_columns<'e, E>(
    executor: E,
    cashflow: &Cashflow,
    columns: &[&str],
) -> Result<()>
where
    E: SqliteExecutor<'e>,
{
    if columns.is_empty() {
        return Ok(());
    }
    if let Some(unknown) = columns.iter().find(|c| !UPDATABLE_COLUMNS.contains(*c)) {
        return Err(Error::InvalidInput(format!(
            "Unknown cashflow column: {}",
            unknown
        )));
    }

    let assignments = columns
        .iter()
        .map(|column| format!("{} = ?", column))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("UPDATE cashflows SET {} WHERE id = ?", assignments);

    let mut query = sqlx::query(&sql);
    for column in columns {
        query = match *column {
            "amount" => query.bind(cashflow.amount),
            other => query.bind(cashflow.text_column(other).and_then(|v| v.clone())),
        };
    }
    query.bind(&cashflow.id).execute(executor).await?;

    Ok(())
}

pub async fn get_cashflow(pool: &SqlitePool, id: &str) -> Result<Option<Cashflow>> {
    let sql = format!("SELECT {} FROM cashflows WHERE id = ?", CASHFLOW_COLUMNS);
    let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;
    Ok(row.as_ref().map(Cashflow::from_row_lenient))
}

/// Cleaned, not yet validated row for a receipt or payment form
fn entry_from_form(id: String, user_id: &str, kind: CashflowType, new: &NewCashflow) -> Cashflow {
    let draft = Cashflow {
        id,
        user_id: Some(user_id.to_string()),
        cashflow_type: Some(kind.as_str().to_string()),
        amount: new.amount,
        party_name: Some(new.party_name.clone()),
        description: new.description.clone(),
        contact: new.contact.clone(),
        method: new.method.clone(),
        expense_category: new.expense_category.clone(),
        notes: new.notes.clone(),
        reference: new.reference.clone(),
        created_at: new
            .date
            .map(|d| time::format_timestamp(&time::date_to_timestamp(d))),
        updated_at: Some(time::now_string()),
    };

    let mut cashflow = cleanup::clean_cashflow_record(&draft);
    drop_blank_fields(&mut cashflow);
    cashflow
}

/// Clean, validate and store a receipt or payment
///
/// `created_at` is the entry date at midnight UTC; `today` bounds the
/// accepted date range.
pub async fn validate_and_insert_cashflow(
    pool: &SqlitePool,
    user_id: &str,
    kind: CashflowType,
    new: &NewCashflow,
    today: NaiveDate,
) -> Result<Cashflow> {
    let cashflow = entry_from_form(uuid::Uuid::new_v4().to_string(), user_id, kind, new);
    validate_cashflow(&cashflow, kind, new.date, today).map_err(Error::Validation)?;

    insert_cashflow(pool, &cashflow).await?;
    info!(
        "Recorded {} {} of {} for user {}",
        kind.as_str(),
        cashflow.id,
        cashflow.amount.unwrap_or_default(),
        user_id
    );

    Ok(cashflow)
}

/// One of the user's own receipts or payments, cleaned for display
pub async fn get_user_cashflow(
    pool: &SqlitePool,
    user_id: &str,
    kind: CashflowType,
    id: &str,
) -> Result<Cashflow> {
    let sql = format!(
        "SELECT {} FROM cashflows WHERE id = ? AND user_id = ? AND type = ?",
        CASHFLOW_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(id)
        .bind(user_id)
        .bind(kind.as_str())
        .fetch_optional(pool)
        .await?;

    row.as_ref()
        .map(decode_for_display)
        .ok_or_else(|| Error::NotFound(format!("{} {}", kind.as_str(), id)))
}

/// Replace one of the user's own receipts or payments with a new form
///
/// The form is cleaned and validated exactly as on insert, and `created_at`
/// is recomputed from the entry date.
pub async fn update_cashflow_entry(
    pool: &SqlitePool,
    user_id: &str,
    kind: CashflowType,
    id: &str,
    new: &NewCashflow,
    today: NaiveDate,
) -> Result<Cashflow> {
    let exists: Option<String> =
        sqlx::query_scalar("SELECT id FROM cashflows WHERE id = ? AND user_id = ? AND type = ?")
            .bind(id)
            .bind(user_id)
            .bind(kind.as_str())
            .fetch_optional(pool)
            .await?;
    if exists.is_none() {
        return Err(Error::NotFound(format!("{} {}", kind.as_str(), id)));
    }

    let cashflow = entry_from_form(id.to_string(), user_id, kind, new);
    validate_cashflow(&cashflow, kind, new.date, today).map_err(Error::Validation)?;

    update_cashflow(pool, &cashflow).await?;
    info!("Updated {} {} for user {}", kind.as_str(), id, user_id);

    Ok(cashflow)
}

/// Optional fields left empty by sanitization are stored as NULL
fn drop_blank_fields(cashflow: &mut Cashflow) {
    for field in ["description", "contact", "method", "expense_category", "notes", "reference"] {
        if let Some(value) = cashflow.string_field_mut(field) {
            if value.as_deref().map_or(false, str::is_empty) {
                *value = None;
            }
        }
    }
}

/// Delete one of the user's own receipts or payments
pub async fn delete_cashflow(
    pool: &SqlitePool,
    user_id: &str,
    kind: CashflowType,
    id: &str,
) -> Result<()> {
    let result = sqlx::query("DELETE FROM cashflows WHERE id = ? AND user_id = ? AND type = ?")
        .bind(id)
        .bind(user_id)
        .bind(kind.as_str())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("{} {}", kind.as_str(), id)));
    }

    info!("Deleted {} {} for user {}", kind.as_str(), id, user_id);
    Ok(())
}

/// Receipt and payment totals since `since`
///
/// `julianday` reads both canonical and legacy naive timestamps, so rows
/// not yet normalized still count.
pub async fn cashflow_summary_since(
    pool: &SqlitePool,
    user_id: &str,
    since: DateTime<Utc>,
) -> Result<CashflowSummary> {
    let (receipts, payments): (f64, f64) = sqlx::query_as(
        r#"
        SELECT
            CAST(COALESCE(SUM(CASE WHEN type = 'receipt' THEN amount END), 0) AS REAL),
            CAST(COALESCE(SUM(CASE WHEN type = 'payment' THEN amount END), 0) AS REAL)
        FROM cashflows
        WHERE user_id = ? AND julianday(created_at) >= julianday(?)
        "#,
    )
    .bind(user_id)
    .bind(time::format_timestamp(&since))
    .fetch_one(pool)
    .await?;

    Ok(CashflowSummary::new(receipts, payments))
}

/// Month-to-date totals relative to `now`
pub async fn month_to_date_summary(
    pool: &SqlitePool,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<CashflowSummary> {
    cashflow_summary_since(pool, user_id, time::start_of_month(now)).await
}

/// The user's newest cashflows, cleaned for display
pub async fn recent_cashflows(pool: &SqlitePool, user_id: &str, limit: i64) -> Result<Vec<Cashflow>> {
    safe_find_cashflows(pool, user_id, limit).await
}

/// Load the user's newest cashflows without failing on corrupted rows
///
/// Each row is strictly decoded and cleaned. A row that does not decode
/// (wrong column types) is salvaged with the aggressive clean instead.
pub async fn safe_find_cashflows(
    pool: &SqlitePool,
    user_id: &str,
    limit: i64,
) -> Result<Vec<Cashflow>> {
    let sql = format!(
        "SELECT {} FROM cashflows WHERE user_id = ? \
         ORDER BY julianday(created_at) DESC, created_at DESC LIMIT ?",
        CASHFLOW_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows.iter().map(decode_for_display).collect())
}

fn decode_for_display(row: &SqliteRow) -> Cashflow {
    match Cashflow::from_row(row) {
        Ok(cashflow) => cleanup::clean_cashflow_record(&cashflow),
        Err(e) => {
            let raw = Cashflow::from_row_lenient(row);
            warn!("Error processing cashflow record {}: {}", raw.id, e);
            let salvaged = cleanup::salvage_cashflow(&raw);
            info!("Salvaged problematic record {}", salvaged.id);
            salvaged
        }
    }
}

/// One keyset page of cashflows ordered by id
///
/// `after_id` is the last id of the previous page.
pub async fn fetch_page(
    pool: &SqlitePool,
    user_id: Option<&str>,
    after_id: Option<&str>,
    limit: i64,
) -> Result<Vec<Cashflow>> {
    let sql = format!(
        "SELECT {} FROM cashflows \
         WHERE (?1 IS NULL OR user_id = ?1) AND (?2 IS NULL OR id > ?2) \
         ORDER BY id LIMIT ?3",
        CASHFLOW_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .bind(after_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows.iter().map(Cashflow::from_row_lenient).collect())
}
