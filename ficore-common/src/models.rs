//! Domain models
//!
//! Row types mirror the stored documents: every convention field is optional
//! because legacy rows were written without a schema. Request payloads
//! (`New*`) carry the shapes the HTTP layer accepts.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// Kind of entry in the `records` collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Creditor,
    Debtor,
    Inventory,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Creditor => "creditor",
            RecordType::Debtor => "debtor",
            RecordType::Inventory => "inventory",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "creditor" => Some(RecordType::Creditor),
            "debtor" => Some(RecordType::Debtor),
            "inventory" => Some(RecordType::Inventory),
            _ => None,
        }
    }
}

/// Money in (receipt) or money out (payment)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashflowType {
    Receipt,
    Payment,
}

impl CashflowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CashflowType::Receipt => "receipt",
            CashflowType::Payment => "payment",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "receipt" => Some(CashflowType::Receipt),
            "payment" => Some(CashflowType::Payment),
            _ => None,
        }
    }
}

/// User roles allowed through the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Trader,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Trader => "trader",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "trader" => Some(Role::Trader),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Row in the `cashflows` table
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct Cashflow {
    pub id: String,
    pub user_id: Option<String>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub cashflow_type: Option<String>,
    pub amount: Option<f64>,
    pub party_name: Option<String>,
    pub description: Option<String>,
    pub contact: Option<String>,
    pub method: Option<String>,
    pub expense_category: Option<String>,
    pub notes: Option<String>,
    pub reference: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Cashflow {
    /// Decode a row without failing on mistyped columns
    ///
    /// SQLite keeps whatever type was written, so a corrupted row may hold
    /// text in `amount` or a blob in a string column. Such values decode as
    /// `None` (or, for numeric text, as the parsed number) instead of
    /// failing the whole query.
    pub fn from_row_lenient(row: &SqliteRow) -> Self {
        Self {
            id: lenient_string(row, "id").unwrap_or_default(),
            user_id: lenient_string(row, "user_id"),
            cashflow_type: lenient_string(row, "type"),
            amount: lenient_f64(row, "amount"),
            party_name: lenient_string(row, "party_name"),
            description: lenient_string(row, "description"),
            contact: lenient_string(row, "contact"),
            method: lenient_string(row, "method"),
            expense_category: lenient_string(row, "expense_category"),
            notes: lenient_string(row, "notes"),
            reference: lenient_string(row, "reference"),
            created_at: lenient_string(row, "created_at"),
            updated_at: lenient_string(row, "updated_at"),
        }
    }

    pub fn kind(&self) -> Option<CashflowType> {
        self.cashflow_type.as_deref().and_then(CashflowType::parse)
    }

    /// Mutable access to a sanitizable string field by column name
    pub fn string_field_mut(&mut self, field: &str) -> Option<&mut Option<String>> {
        match field {
            "party_name" => Some(&mut self.party_name),
            "description" => Some(&mut self.description),
            "contact" => Some(&mut self.contact),
            "method" => Some(&mut self.method),
            "expense_category" => Some(&mut self.expense_category),
            "notes" => Some(&mut self.notes),
            "reference" => Some(&mut self.reference),
            _ => None,
        }
    }

    /// Value of a text column by name; `None` for `id`, `amount` and unknown names
    pub fn text_column(&self, column: &str) -> Option<&Option<String>> {
        match column {
            "user_id" => Some(&self.user_id),
            "type" => Some(&self.cashflow_type),
            "party_name" => Some(&self.party_name),
            "description" => Some(&self.description),
            "contact" => Some(&self.contact),
            "method" => Some(&self.method),
            "expense_category" => Some(&self.expense_category),
            "notes" => Some(&self.notes),
            "reference" => Some(&self.reference),
            "created_at" => Some(&self.created_at),
            "updated_at" => Some(&self.updated_at),
            _ => None,
        }
    }
}

fn lenient_string(row: &SqliteRow, column: &str) -> Option<String> {
    match row.try_get::<Option<String>, _>(column) {
        Ok(value) => value,
        Err(_) => row
            .try_get::<Option<i64>, _>(column)
            .ok()
            .flatten()
            .map(|v| v.to_string())
            .or_else(|| {
                row.try_get::<Option<f64>, _>(column)
                    .ok()
                    .flatten()
                    .map(|v| v.to_string())
            }),
    }
}

fn lenient_f64(row: &SqliteRow, column: &str) -> Option<f64> {
    match row.try_get::<Option<f64>, _>(column) {
        Ok(value) => value,
        Err(_) => row
            .try_get::<Option<i64>, _>(column)
            .ok()
            .flatten()
            .map(|v| v as f64)
            .or_else(|| {
                row.try_get::<Option<String>, _>(column)
                    .ok()
                    .flatten()
                    .and_then(|s| s.trim().parse::<f64>().ok())
            }),
    }
}

/// Row in the `records` table (debts and inventory)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct Record {
    pub id: String,
    pub user_id: Option<String>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub record_type: Option<String>,
    pub name: Option<String>,
    pub contact: Option<String>,
    pub description: Option<String>,
    pub amount_owed: Option<f64>,
    pub cost: Option<f64>,
    pub expected_margin: Option<f64>,
    pub selling_price: Option<f64>,
    pub manual_price_override: Option<bool>,
    pub quantity_in_stock: Option<f64>,
    pub reorder_level: Option<f64>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Record {
    pub fn kind(&self) -> Option<RecordType> {
        self.record_type.as_deref().and_then(RecordType::parse)
    }
}

/// Stock change logged against an inventory item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct InventoryMovement {
    pub id: String,
    pub inventory_item_id: String,
    pub change_type: String,
    pub quantity: f64,
    pub date: String,
    pub notes: Option<String>,
}

/// Completion marker for a maintenance pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SystemFlag {
    pub id: String,
    pub value: bool,
    pub completed_at: Option<String>,
    pub stats: Option<String>,
}

/// Authenticated API user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub display_name: String,
    pub role: Role,
}

/// Payload for recording a receipt or payment
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCashflow {
    #[serde(default)]
    pub party_name: String,
    /// Transaction date; missing dates fail validation
    pub date: Option<NaiveDate>,
    pub amount: Option<f64>,
    pub method: Option<String>,
    pub contact: Option<String>,
    pub description: Option<String>,
    pub expense_category: Option<String>,
    pub notes: Option<String>,
    pub reference: Option<String>,
}

/// Payload for a creditor/debtor entry
#[derive(Debug, Clone, Deserialize)]
pub struct NewDebtRecord {
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub name: String,
    pub amount_owed: f64,
    pub contact: Option<String>,
    pub description: Option<String>,
}

/// Payload for adding or editing an inventory item
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InventoryForm {
    pub name: String,
    pub cost: f64,
    pub expected_margin: f64,
    pub quantity_in_stock: Option<f64>,
    pub reorder_level: Option<f64>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub status: Option<String>,
    pub selling_price: Option<f64>,
    #[serde(default)]
    pub manual_price_override: bool,
}

impl InventoryForm {
    /// Selling price and whether it came from a manual override
    ///
    /// A manual price wins only when the override is set and a price was
    /// supplied; otherwise the price is cost plus expected margin.
    pub fn resolved_selling_price(&self) -> (f64, bool) {
        match (self.manual_price_override, self.selling_price) {
            (true, Some(price)) => (price, true),
            _ => (self.cost + self.expected_margin, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_round_trip_names() {
        for kind in [RecordType::Creditor, RecordType::Debtor, RecordType::Inventory] {
            assert_eq!(RecordType::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(RecordType::parse("forecast"), None);
    }

    #[test]
    fn test_selling_price_auto() {
        let form = InventoryForm {
            name: "Rice".into(),
            cost: 100.0,
            expected_margin: 25.0,
            selling_price: Some(500.0),
            ..Default::default()
        };
        assert_eq!(form.resolved_selling_price(), (125.0, false));
    }

    #[test]
    fn test_selling_price_manual_override() {
        let form = InventoryForm {
            name: "Rice".into(),
            cost: 100.0,
            expected_margin: 25.0,
            selling_price: Some(140.0),
            manual_price_override: true,
            ..Default::default()
        };
        assert_eq!(form.resolved_selling_price(), (140.0, true));
    }

    #[test]
    fn test_manual_override_without_price_falls_back() {
        let form = InventoryForm {
            name: "Beans".into(),
            cost: 10.0,
            expected_margin: 2.5,
            manual_price_override: true,
            ..Default::default()
        };
        assert_eq!(form.resolved_selling_price(), (12.5, false));
    }

    #[test]
    fn test_cashflow_serializes_type_field() {
        let cashflow = Cashflow {
            id: "abc".into(),
            cashflow_type: Some("payment".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&cashflow).unwrap();
        assert_eq!(json["type"], "payment");
        assert_eq!(cashflow.kind(), Some(CashflowType::Payment));
    }
}
