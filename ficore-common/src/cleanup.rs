//! Cashflow cleanup and data migration passes
//!
//! Stored text containing backslashes or control characters broke JSON
//! rendering of cashflow lists. These passes rewrite existing rows with the
//! same sanitization the insert paths apply, repair missing fields and record
//! completion flags in `system_config`.
//!
//! All bulk passes walk `cashflows` by id in pages of [`BATCH_SIZE`] and write
//! each page's changes in one transaction. A row that fails to write is
//! logged and counted; the pass carries on.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Row, SqlitePool};
use tracing::{error, info, warn};

use crate::categories::{DEFAULT_EXPENSE_CATEGORY, EXPENSE_CATEGORIES};
use crate::db::cashflows::{self, CASHFLOW_COLUMNS};
use crate::db::system_config::{self, CASHFLOW_CLEANUP_FLAG, COMPREHENSIVE_CLEANUP_FLAG};
use crate::models::{Cashflow, CashflowType, SystemFlag};
use crate::sanitize::{
    aggressive_clean, max_length_for, needs_advanced_cleaning, sanitize_field, sanitize_input,
    CASHFLOW_FIELD_RULES, CORE_CASHFLOW_FIELDS,
};
use crate::{time, Result};

/// Rows per page and per write transaction
pub const BATCH_SIZE: i64 = 1000;

/// Fields scanned by [`check_for_problematic_characters`]
const CHECKED_FIELDS: &[&str] = &["party_name", "description", "contact", "method"];

/// Fields scanned by [`validate_cashflow_data`]
const VALIDATED_FIELDS: &[&str] = &["party_name", "description", "contact"];

/// Character codes matched by the diagnostic pattern `[\\<>"']`
const PROBLEMATIC_CODES: &[u32] = &[92, 60, 62, 34, 39];

/// Default party for salvaged rows with no usable name
const UNKNOWN_PARTY: &str = "Unknown";

/// Counters reported by every bulk pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupStats {
    /// Rows examined
    pub processed: u64,
    /// Rows rewritten
    pub cleaned: u64,
    /// Rows that failed to write
    pub errors: u64,
    /// Rows left alone because they have no owner
    #[serde(default)]
    pub skipped: u64,
}

/// Outcome of [`comprehensive_cashflow_migration`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MigrationReport {
    pub datetimes_normalized: u64,
    pub categories_migrated: u64,
    pub cleanup: CleanupStats,
    pub issues: Vec<String>,
}

impl MigrationReport {
    pub fn is_clean(&self) -> bool {
        self.cleanup.errors == 0 && self.issues.is_empty()
    }
}

/// Per-field counts of rows matching the problematic pattern
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProblemReport {
    pub fields: BTreeMap<String, i64>,
    pub total: i64,
}

/// A stored value containing a backslash
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackslashRow {
    pub record_id: String,
    pub user_id: Option<String>,
    pub field: String,
    pub value: String,
    #[serde(rename = "type")]
    pub cashflow_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserCashflowCounts {
    pub user_id: Option<String>,
    pub total: i64,
    pub payments: i64,
    pub receipts: i64,
    /// Payments that fail strict decoding
    pub undecodable_payments: i64,
}

/// Output of [`diagnose`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnosis {
    pub backslash_rows: Vec<BackslashRow>,
    pub users: Vec<UserCashflowCounts>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagStatus {
    pub id: String,
    pub value: bool,
    pub completed_at: Option<String>,
    pub stats: Option<serde_json::Value>,
}

impl From<SystemFlag> for FlagStatus {
    fn from(flag: SystemFlag) -> Self {
        let stats = flag
            .stats
            .as_deref()
            .and_then(|s| serde_json::from_str(s).ok());
        Self {
            id: flag.id,
            value: flag.value,
            completed_at: flag.completed_at,
            stats,
        }
    }
}

/// Flags plus current problem counts, for the admin status page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanupStatus {
    pub flags: Vec<FlagStatus>,
    pub problems: ProblemReport,
}

// ========================================
// Per-row cleaning
// ========================================

/// Sanitize every string field and normalize timestamps
///
/// Applied to each cashflow before insert and before display.
pub fn clean_cashflow_record(record: &Cashflow) -> Cashflow {
    let mut cleaned = record.clone();

    for rule in CASHFLOW_FIELD_RULES {
        if let Some(slot) = cleaned.string_field_mut(rule.field) {
            if let Some(original) = slot.as_deref() {
                let value = sanitize_field(original, rule);
                if value != original && !original.is_empty() {
                    info!(
                        "Cleaned cashflow field '{}' in record {}",
                        rule.field, record.id
                    );
                }
                *slot = Some(value);
            }
        }
    }

    normalize_in_place(&mut cleaned.created_at);
    normalize_in_place(&mut cleaned.updated_at);

    cleaned
}

fn normalize_in_place(slot: &mut Option<String>) {
    if let Some(value) = slot.as_deref() {
        if let Some(normalized) = time::normalize_timestamp(value) {
            *slot = Some(normalized);
        }
    }
}

/// Rewrite only the fields that need it
///
/// A field is rewritten when it holds a backslash or control character or is
/// longer than the advanced-clean threshold. Returns the cleaned row and
/// whether anything changed.
pub fn clean_cashflow_document_advanced(record: &Cashflow) -> (Cashflow, bool) {
    let mut cleaned = record.clone();
    let mut changed = false;

    for rule in CASHFLOW_FIELD_RULES {
        if let Some(slot) = cleaned.string_field_mut(rule.field) {
            let rewritten = match slot.as_deref() {
                Some(original) if needs_advanced_cleaning(original) => {
                    let value = sanitize_input(original, Some(max_length_for(rule.field)), false);
                    (value != original).then_some(value)
                }
                _ => None,
            };
            if let Some(value) = rewritten {
                info!(
                    "Advanced cleaning of field '{}' in record {}",
                    rule.field, record.id
                );
                *slot = Some(value);
                changed = true;
            }
        }
    }

    (cleaned, changed)
}

/// Last-resort rebuild of a row that normal decoding could not handle
///
/// Keeps id, owner and type, salvages the core text fields with
/// [`aggressive_clean`] and fills required display fields with defaults.
pub fn salvage_cashflow(record: &Cashflow) -> Cashflow {
    let mut salvaged = Cashflow {
        id: record.id.clone(),
        user_id: record.user_id.clone(),
        cashflow_type: Some(
            record
                .cashflow_type
                .clone()
                .unwrap_or_else(|| CashflowType::Payment.as_str().to_string()),
        ),
        amount: Some(record.amount.filter(|a| a.is_finite()).unwrap_or(0.0)),
        created_at: record.created_at.clone().or_else(|| Some(time::now_string())),
        updated_at: record.updated_at.clone(),
        ..Default::default()
    };

    let mut source = record.clone();
    for field in CORE_CASHFLOW_FIELDS {
        let value = source
            .string_field_mut(field)
            .and_then(|slot| slot.as_deref().and_then(aggressive_clean));
        if let Some(slot) = salvaged.string_field_mut(field) {
            *slot = value;
        }
    }

    if salvaged.party_name.is_none() {
        salvaged.party_name = Some(UNKNOWN_PARTY.to_string());
    }
    if salvaged.expense_category.is_none() && salvaged.kind() == Some(CashflowType::Payment) {
        salvaged.expense_category = Some(DEFAULT_EXPENSE_CATEGORY.to_string());
    }

    normalize_in_place(&mut salvaged.created_at);
    normalize_in_place(&mut salvaged.updated_at);

    salvaged
}

/// Per-row rules of the comprehensive clean
///
/// Returns `None` for rows without an owner, which are left alone.
fn comprehensive_clean_row(record: &Cashflow) -> Option<Cashflow> {
    if record.user_id.as_deref().map_or(true, |u| u.trim().is_empty()) {
        return None;
    }

    let mut cleaned = record.clone();

    for field in CORE_CASHFLOW_FIELDS {
        if let Some(slot) = cleaned.string_field_mut(field) {
            if let Some(original) = slot.as_deref() {
                let value = sanitize_input(original, Some(max_length_for(field)), false)
                    .replace(['\\', '\0'], "")
                    .trim()
                    .to_string();
                *slot = Some(value);
            }
        }
    }

    if cleaned
        .cashflow_type
        .as_deref()
        .map_or(true, |t| t.trim().is_empty())
    {
        let has_category = cleaned
            .expense_category
            .as_deref()
            .map_or(false, |c| !c.is_empty());
        let inferred = if has_category {
            CashflowType::Payment
        } else {
            CashflowType::Receipt
        };
        cleaned.cashflow_type = Some(inferred.as_str().to_string());
    }

    match cleaned.created_at.as_deref() {
        Some(value) if !value.trim().is_empty() => normalize_in_place(&mut cleaned.created_at),
        _ => cleaned.created_at = Some(time::now_string()),
    }

    cleaned.amount = match cleaned.amount {
        Some(amount) if amount.is_finite() => Some(amount.abs()),
        _ => Some(0.0),
    };

    Some(cleaned)
}

// ========================================
// Batch plumbing
// ========================================

/// A cleaned row and the columns that differ from what is stored
struct PendingWrite {
    cashflow: Cashflow,
    columns: Vec<&'static str>,
}

/// Write one page of changed rows in a single transaction
///
/// Only the changed columns are written, so a value the lenient decode could
/// not read (text in `amount`, a blob in a text column) stays as stored.
async fn write_batch(
    pool: &SqlitePool,
    changed: &[PendingWrite],
    stats: &mut CleanupStats,
) -> Result<()> {
    if changed.is_empty() {
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    for write in changed {
        match cashflows::update_cashflow_columns(&mut *tx, &write.cashflow, &write.columns).await {
            Ok(()) => stats.cleaned += 1,
            Err(e) => {
                error!("Error cleaning record {}: {}", write.cashflow.id, e);
                stats.errors += 1;
            }
        }
    }
    tx.commit().await?;

    Ok(())
}

/// What a pass decided for one row
enum RowOutcome {
    Unchanged,
    Changed(Cashflow),
    Skipped,
}

impl RowOutcome {
    fn compare(original: &Cashflow, cleaned: Cashflow) -> Self {
        if cashflows::changed_columns(original, &cleaned).is_empty() {
            RowOutcome::Unchanged
        } else {
            RowOutcome::Changed(cleaned)
        }
    }
}

/// Walk cashflows page by page, writing back the rows `clean` changed
async fn run_pass<F>(
    pool: &SqlitePool,
    user_id: Option<&str>,
    label: &str,
    mut clean: F,
) -> Result<CleanupStats>
where
    F: FnMut(&Cashflow) -> RowOutcome,
{
    let mut stats = CleanupStats::default();
    let mut after: Option<String> = None;

    loop {
        let page = cashflows::fetch_page(pool, user_id, after.as_deref(), BATCH_SIZE).await?;
        let Some(last) = page.last() else {
            break;
        };
        after = Some(last.id.clone());

        let mut changed = Vec::new();
        for row in &page {
            match clean(row) {
                RowOutcome::Changed(mut cleaned) => {
                    cleaned.updated_at = Some(time::now_string());
                    let mut columns = cashflows::changed_columns(row, &cleaned);
                    if !columns.contains(&"updated_at") {
                        columns.push("updated_at");
                    }
                    changed.push(PendingWrite {
                        cashflow: cleaned,
                        columns,
                    });
                    stats.processed += 1;
                }
                RowOutcome::Unchanged => stats.processed += 1,
                RowOutcome::Skipped => stats.skipped += 1,
            }
        }

        write_batch(pool, &changed, &mut stats).await?;
        info!(
            "{}: processed {} records so far, cleaned {}",
            label, stats.processed, stats.cleaned
        );
    }

    Ok(stats)
}

// ========================================
// Passes
// ========================================

/// Advanced-clean all cashflows, or only those of `user_id`
pub async fn bulk_clean_cashflows(pool: &SqlitePool, user_id: Option<&str>) -> Result<CleanupStats> {
    info!(
        "Starting bulk cleanup of cashflow records for user {}",
        user_id.unwrap_or("all users")
    );

    let stats = run_pass(pool, user_id, "Bulk cleanup", |row| {
        match clean_cashflow_document_advanced(row) {
            (cleaned, true) => RowOutcome::Changed(cleaned),
            (_, false) => RowOutcome::Unchanged,
        }
    })
    .await?;

    info!(
        "Bulk cleanup completed. Cleaned {} out of {} records for user {}",
        stats.cleaned,
        stats.processed,
        user_id.unwrap_or("all users")
    );

    Ok(stats)
}

/// Bulk clean scoped to one user; zero cleaned rows is still success
pub async fn emergency_clean_user_data(pool: &SqlitePool, user_id: &str) -> Result<CleanupStats> {
    info!("Starting emergency data cleaning for user {}", user_id);

    let stats = bulk_clean_cashflows(pool, Some(user_id)).await?;

    if stats.cleaned > 0 {
        info!(
            "Emergency cleaning completed for user {}. Cleaned {} records.",
            user_id, stats.cleaned
        );
    } else {
        info!("No records needed cleaning for user {}", user_id);
    }

    Ok(stats)
}

/// Basic cleanup: sanitize the core fields and normalize `created_at`
///
/// Sets the `cashflow_data_cleanup_completed` flag.
pub async fn clean_cashflow_data(pool: &SqlitePool) -> Result<CleanupStats> {
    info!("Starting cashflow data cleanup");

    let stats = run_pass(pool, None, "Cleanup", |row| {
        let mut cleaned = row.clone();
        for field in CORE_CASHFLOW_FIELDS {
            if let Some(slot) = cleaned.string_field_mut(field) {
                if let Some(original) = slot.as_deref() {
                    *slot = Some(sanitize_input(original, Some(max_length_for(field)), false));
                }
            }
        }
        normalize_in_place(&mut cleaned.created_at);
        RowOutcome::compare(row, cleaned)
    })
    .await?;

    info!(
        "Cleanup completed: processed {} records, cleaned {} records",
        stats.processed, stats.cleaned
    );
    system_config::set_flag(pool, CASHFLOW_CLEANUP_FLAG, &stats).await?;

    Ok(stats)
}

/// Rewrite non-canonical `created_at`/`updated_at` values in cashflows and records
pub async fn normalize_datetimes(pool: &SqlitePool) -> Result<u64> {
    let mut total = 0;

    for table in ["cashflows", "records"] {
        let select = format!(
            "SELECT id, CAST(created_at AS TEXT) AS created_at, CAST(updated_at AS TEXT) AS updated_at \
             FROM {} WHERE id > ? ORDER BY id LIMIT ?",
            table
        );
        let update = format!(
            "UPDATE {} SET created_at = ?, updated_at = ? WHERE id = ?",
            table
        );
        let mut after = String::new();

        loop {
            let rows: Vec<(String, Option<String>, Option<String>)> = sqlx::query_as(&select)
                .bind(&after)
                .bind(BATCH_SIZE)
                .fetch_all(pool)
                .await?;
            let Some(last) = rows.last() else {
                break;
            };
            after = last.0.clone();

            let mut tx = pool.begin().await?;
            for (id, created_at, updated_at) in &rows {
                let mut new_created = created_at.clone();
                let mut new_updated = updated_at.clone();
                normalize_in_place(&mut new_created);
                normalize_in_place(&mut new_updated);
                if new_created != *created_at || new_updated != *updated_at {
                    sqlx::query(&update)
                        .bind(&new_created)
                        .bind(&new_updated)
                        .bind(id)
                        .execute(&mut *tx)
                        .await?;
                    total += 1;
                }
            }
            tx.commit().await?;
        }
    }

    info!("Normalized timestamps on {} rows", total);
    Ok(total)
}

/// Give payments with a missing or unknown category the default category
pub async fn migrate_expense_categories(pool: &SqlitePool) -> Result<u64> {
    let placeholders = vec!["?"; EXPENSE_CATEGORIES.len()].join(", ");
    let sql = format!(
        "UPDATE cashflows SET expense_category = ?, updated_at = ? \
         WHERE type = 'payment' AND (expense_category IS NULL \
         OR TRIM(expense_category) NOT IN ({}))",
        placeholders
    );

    let mut query = sqlx::query(&sql)
        .bind(DEFAULT_EXPENSE_CATEGORY)
        .bind(time::now_string());
    for category in EXPENSE_CATEGORIES {
        query = query.bind(category.key);
    }
    let migrated = query.execute(pool).await?.rows_affected();

    info!(
        "Assigned '{}' to {} payments with a missing or unknown category",
        DEFAULT_EXPENSE_CATEGORY, migrated
    );
    Ok(migrated)
}

/// The comprehensive clean: sanitize, infer and repair every owned row
///
/// Sets the `comprehensive_cashflow_cleanup_completed` flag.
pub async fn comprehensive_clean(pool: &SqlitePool) -> Result<CleanupStats> {
    info!("Starting comprehensive cleanup of cashflow records");

    let stats = run_pass(pool, None, "Comprehensive cleanup", |row| {
        match comprehensive_clean_row(row) {
            Some(cleaned) => RowOutcome::compare(row, cleaned),
            None => {
                warn!("Record {} missing user_id, skipping", row.id);
                RowOutcome::Skipped
            }
        }
    })
    .await?;

    info!(
        "Comprehensive cleanup completed: processed {} records, cleaned {} records, errors {}",
        stats.processed, stats.cleaned, stats.errors
    );
    system_config::set_flag(pool, COMPREHENSIVE_CLEANUP_FLAG, &stats).await?;

    Ok(stats)
}

/// Datetimes, categories, comprehensive clean, then validation
pub async fn comprehensive_cashflow_migration(pool: &SqlitePool) -> Result<MigrationReport> {
    info!("Step 1: Migrating naive datetimes...");
    let datetimes_normalized = normalize_datetimes(pool).await?;

    info!("Step 2: Migrating expense categories...");
    let categories_migrated = migrate_expense_categories(pool).await?;

    info!("Step 3: Cleaning problematic characters...");
    let cleanup = comprehensive_clean(pool).await?;
    if cleanup.errors > 0 {
        warn!("Data cleaning had {} errors, check logs", cleanup.errors);
    }

    info!("Step 4: Validating data integrity...");
    let issues = validate_cashflow_data(pool).await?;

    Ok(MigrationReport {
        datetimes_normalized,
        categories_migrated,
        cleanup,
        issues,
    })
}

// ========================================
// Checks
// ========================================

/// SQL predicate: `field` contains any problematic character
fn problematic_condition(field: &str) -> String {
    PROBLEMATIC_CODES
        .iter()
        .map(|code| format!("instr({}, char({})) > 0", field, code))
        .collect::<Vec<_>>()
        .join(" OR ")
}

async fn count_where(pool: &SqlitePool, condition: &str) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM cashflows WHERE {}", condition);
    let count: i64 = sqlx::query_scalar(&sql).fetch_one(pool).await?;
    Ok(count)
}

/// Count rows whose checked fields match the problematic pattern
pub async fn check_for_problematic_characters(pool: &SqlitePool) -> Result<ProblemReport> {
    let mut report = ProblemReport::default();

    for field in CHECKED_FIELDS {
        let count = count_where(pool, &problematic_condition(field)).await?;
        if count > 0 {
            info!("Found {} records with problematic characters in {}", count, field);
        }
        report.fields.insert(field.to_string(), count);
        report.total += count;
    }

    info!(
        "Total records with potentially problematic characters: {}",
        report.total
    );
    Ok(report)
}

/// List data-integrity issues; an empty list means the data passed
pub async fn validate_cashflow_data(pool: &SqlitePool) -> Result<Vec<String>> {
    let mut issues = Vec::new();

    for field in VALIDATED_FIELDS {
        let count = count_where(pool, &problematic_condition(field)).await?;
        if count > 0 {
            issues.push(format!(
                "Found {} records with problematic characters in {}",
                count, field
            ));
        }
    }

    for (condition, what) in [
        ("user_id IS NULL", "missing user_id"),
        ("type IS NULL", "missing type"),
        ("amount IS NULL", "missing amount"),
        ("typeof(amount) IN ('integer', 'real') AND amount < 0", "with negative amounts"),
    ] {
        let count = count_where(pool, condition).await?;
        if count > 0 {
            issues.push(format!("Found {} records {}", count, what));
        }
    }

    if issues.is_empty() {
        info!("Data validation passed - no issues found");
    } else {
        for issue in &issues {
            warn!("{}", issue);
        }
    }

    Ok(issues)
}

/// Rows holding backslashes plus per-user cashflow counts
pub async fn diagnose(pool: &SqlitePool) -> Result<Diagnosis> {
    let mut diagnosis = Diagnosis::default();

    for rule in CASHFLOW_FIELD_RULES {
        let sql = format!(
            "SELECT CAST(id AS TEXT), CAST(user_id AS TEXT), CAST(type AS TEXT), CAST({0} AS TEXT) \
             FROM cashflows WHERE instr({0}, char(92)) > 0 ORDER BY id",
            rule.field
        );
        let rows: Vec<(String, Option<String>, Option<String>, String)> =
            sqlx::query_as(&sql).fetch_all(pool).await?;
        if !rows.is_empty() {
            info!(
                "Found {} records with backslashes in field '{}'",
                rows.len(),
                rule.field
            );
        }
        diagnosis
            .backslash_rows
            .extend(rows.into_iter().map(|(record_id, user_id, cashflow_type, value)| {
                BackslashRow {
                    record_id,
                    user_id,
                    field: rule.field.to_string(),
                    value,
                    cashflow_type,
                }
            }));
    }

    let users: Vec<(Option<String>, i64, i64, i64)> = sqlx::query_as(
        r#"
        SELECT CAST(user_id AS TEXT),
               COUNT(*),
               COALESCE(SUM(CASE WHEN type = 'payment' THEN 1 ELSE 0 END), 0),
               COALESCE(SUM(CASE WHEN type = 'receipt' THEN 1 ELSE 0 END), 0)
        FROM cashflows
        GROUP BY user_id
        ORDER BY user_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    for (user_id, total, payments, receipts) in users {
        let undecodable_payments = count_undecodable_payments(pool, user_id.as_deref()).await?;
        if undecodable_payments > 0 {
            error!(
                "{} payments for user '{}' fail to decode",
                undecodable_payments,
                user_id.as_deref().unwrap_or("<none>")
            );
        }
        info!(
            "User '{}': {} total cashflows ({} payments, {} receipts)",
            user_id.as_deref().unwrap_or("<none>"),
            total,
            payments,
            receipts
        );
        diagnosis.users.push(UserCashflowCounts {
            user_id,
            total,
            payments,
            receipts,
            undecodable_payments,
        });
    }

    Ok(diagnosis)
}

async fn count_undecodable_payments(pool: &SqlitePool, user_id: Option<&str>) -> Result<i64> {
    let sql = format!(
        "SELECT {} FROM cashflows WHERE user_id IS ? AND type = 'payment'",
        CASHFLOW_COLUMNS
    );
    let rows = sqlx::query(&sql).bind(user_id).fetch_all(pool).await?;
    let failures = rows
        .iter()
        .filter(|row| match Cashflow::from_row(*row) {
            Ok(_) => false,
            Err(e) => {
                let id: Option<String> = row.try_get("id").ok();
                warn!("Undecodable payment {}: {}", id.unwrap_or_default(), e);
                true
            }
        })
        .count();
    Ok(failures as i64)
}

/// Completion flags and live problem counts
pub async fn cleanup_status(pool: &SqlitePool) -> Result<CleanupStatus> {
    let flags = system_config::list_flags(pool)
        .await?
        .into_iter()
        .map(FlagStatus::from)
        .collect();
    let problems = check_for_problematic_characters(pool).await?;

    Ok(CleanupStatus { flags, problems })
}
