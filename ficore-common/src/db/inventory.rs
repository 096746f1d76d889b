//! Inventory items and stock movements
//!
//! Items are `records` rows with `type = 'inventory'`. Adding an item books
//! its cost as a COGS payment and logs the opening stock as an `add`
//! movement; edits that change the stock level log an `adjust` movement.

use sqlx::SqlitePool;
use tracing::info;

use crate::categories::COGS_CATEGORY;
use crate::cleanup;
use crate::db::cashflows::insert_cashflow;
use crate::db::records::{clean_optional, insert_record, RECORD_COLUMNS};
use crate::models::{Cashflow, CashflowType, InventoryForm, InventoryMovement, Record, RecordType};
use crate::sanitize::{check_currency_bounds, max_length_for, sanitize_input, DEFAULT_MAX_CURRENCY};
use crate::{time, Error, Result};

/// Status given to items added without one
pub const DEFAULT_STATUS: &str = "Active";

pub async fn list_inventory(pool: &SqlitePool, user_id: &str) -> Result<Vec<Record>> {
    let sql = format!(
        "SELECT {} FROM records WHERE user_id = ? AND type = 'inventory' \
         ORDER BY julianday(created_at) DESC, created_at DESC",
        RECORD_COLUMNS
    );
    let items = sqlx::query_as::<_, Record>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(items)
}

/// One of the user's inventory items
pub async fn get_inventory_item(pool: &SqlitePool, user_id: &str, id: &str) -> Result<Record> {
    let sql = format!(
        "SELECT {} FROM records WHERE id = ? AND user_id = ? AND type = 'inventory'",
        RECORD_COLUMNS
    );
    sqlx::query_as::<_, Record>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Inventory item {}", id)))
}

/// Sanitized name plus range checks shared by add and edit
fn check_form(form: &InventoryForm) -> Result<String> {
    let name = sanitize_input(&form.name, Some(max_length_for("name")), false);
    if name.is_empty() {
        return Err(Error::InvalidInput("Name is required".to_string()));
    }

    check_currency_bounds(form.cost, DEFAULT_MAX_CURRENCY)?;
    check_currency_bounds(form.expected_margin, DEFAULT_MAX_CURRENCY)?;
    if let Some(price) = form.selling_price {
        check_currency_bounds(price, DEFAULT_MAX_CURRENCY)?;
    }

    for (label, value) in [
        ("Quantity in stock", form.quantity_in_stock),
        ("Reorder level", form.reorder_level),
    ] {
        if let Some(value) = value {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidInput(format!("{} cannot be negative", label)));
            }
        }
    }

    Ok(name)
}

/// Add an inventory item, its COGS payment and its opening movement
pub async fn add_inventory_item(
    pool: &SqlitePool,
    user_id: &str,
    form: &InventoryForm,
) -> Result<Record> {
    let name = check_form(form)?;
    let (selling_price, manual) = form.resolved_selling_price();
    let now = time::now_string();

    let item = Record {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: Some(user_id.to_string()),
        record_type: Some(RecordType::Inventory.as_str().to_string()),
        name: Some(name.clone()),
        cost: Some(form.cost),
        expected_margin: Some(form.expected_margin),
        selling_price: Some(selling_price),
        manual_price_override: Some(manual),
        quantity_in_stock: form.quantity_in_stock,
        reorder_level: form.reorder_level,
        category: clean_optional(form.category.as_deref(), "category"),
        unit: clean_optional(form.unit.as_deref(), "unit"),
        status: clean_optional(form.status.as_deref(), "status")
            .or_else(|| Some(DEFAULT_STATUS.to_string())),
        created_at: Some(now.clone()),
        updated_at: Some(now.clone()),
        ..Default::default()
    };
    insert_record(pool, &item).await?;

    let cogs = cleanup::clean_cashflow_record(&Cashflow {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: Some(user_id.to_string()),
        cashflow_type: Some(CashflowType::Payment.as_str().to_string()),
        amount: Some(form.cost),
        party_name: Some(name.clone()),
        description: Some(format!("COGS for inventory item: {}", name)),
        expense_category: Some(COGS_CATEGORY.to_string()),
        created_at: Some(now.clone()),
        updated_at: Some(now.clone()),
        ..Default::default()
    });
    insert_cashflow(pool, &cogs).await?;

    insert_movement(
        pool,
        &item.id,
        "add",
        form.quantity_in_stock.unwrap_or(0.0),
        "Initial stock addition",
    )
    .await?;

    info!(
        "Added inventory item {} ({}) for user {} with COGS payment {}",
        item.id, name, user_id, cogs.id
    );

    Ok(item)
}

/// Update an item; logs an `adjust` movement when the stock level changes
pub async fn update_inventory_item(
    pool: &SqlitePool,
    user_id: &str,
    id: &str,
    form: &InventoryForm,
) -> Result<Record> {
    let existing = get_inventory_item(pool, user_id, id).await?;
    let name = check_form(form)?;
    let (selling_price, manual) = form.resolved_selling_price();

    let updated = Record {
        name: Some(name),
        cost: Some(form.cost),
        expected_margin: Some(form.expected_margin),
        selling_price: Some(selling_price),
        manual_price_override: Some(manual),
        quantity_in_stock: form.quantity_in_stock,
        reorder_level: form.reorder_level,
        category: clean_optional(form.category.as_deref(), "category"),
        unit: clean_optional(form.unit.as_deref(), "unit"),
        status: clean_optional(form.status.as_deref(), "status")
            .or_else(|| existing.status.clone())
            .or_else(|| Some(DEFAULT_STATUS.to_string())),
        updated_at: Some(time::now_string()),
        ..existing.clone()
    };

    sqlx::query(
        r#"
        UPDATE records SET
            name = ?, cost = ?, expected_margin = ?, selling_price = ?,
            manual_price_override = ?, quantity_in_stock = ?, reorder_level = ?,
            category = ?, unit = ?, status = ?, updated_at = ?
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(&updated.name)
    .bind(updated.cost)
    .bind(updated.expected_margin)
    .bind(updated.selling_price)
    .bind(updated.manual_price_override)
    .bind(updated.quantity_in_stock)
    .bind(updated.reorder_level)
    .bind(&updated.category)
    .bind(&updated.unit)
    .bind(&updated.status)
    .bind(&updated.updated_at)
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    let old_quantity = existing.quantity_in_stock.unwrap_or(0.0);
    let new_quantity = updated.quantity_in_stock.unwrap_or(0.0);
    if new_quantity != old_quantity {
        insert_movement(
            pool,
            id,
            "adjust",
            new_quantity - old_quantity,
            "Stock quantity adjusted via edit",
        )
        .await?;
    }

    info!("Updated inventory item {} for user {}", id, user_id);
    Ok(updated)
}

async fn insert_movement(
    pool: &SqlitePool,
    item_id: &str,
    change_type: &str,
    quantity: f64,
    notes: &str,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO inventory_movements (id, inventory_item_id, change_type, quantity, date, notes) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(item_id)
    .bind(change_type)
    .bind(quantity)
    .bind(time::now_string())
    .bind(notes)
    .execute(pool)
    .await?;

    Ok(())
}

/// Stock movements for one of the user's items, newest first
pub async fn item_history(
    pool: &SqlitePool,
    user_id: &str,
    item_id: &str,
) -> Result<Vec<InventoryMovement>> {
    get_inventory_item(pool, user_id, item_id).await?;

    let movements = sqlx::query_as::<_, InventoryMovement>(
        "SELECT id, inventory_item_id, change_type, quantity, date, notes \
         FROM inventory_movements WHERE inventory_item_id = ? ORDER BY date DESC, rowid DESC",
    )
    .bind(item_id)
    .fetch_all(pool)
    .await?;

    Ok(movements)
}
