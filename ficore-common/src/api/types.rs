//! Shared API response types
//!
//! Summary payloads keep the camelCase keys the dashboard widgets read.

use serde::{Deserialize, Serialize};

use crate::education::EducationPrompt;
use crate::models::{Cashflow, Record};
use crate::validation::ValidationErrors;

// ========================================
// Summary Types
// ========================================

/// Totals over the user's creditor and debtor records
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtSummary {
    /// Sum of `amount_owed` over creditor records
    pub total_i_owe: f64,
    /// Sum of `amount_owed` over debtor records
    pub total_i_am_owed: f64,
}

/// Month-to-date cashflow totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashflowSummary {
    pub net_cashflow: f64,
    pub total_receipts: f64,
    pub total_payments: f64,
}

impl CashflowSummary {
    pub fn new(total_receipts: f64, total_payments: f64) -> Self {
        Self {
            net_cashflow: total_receipts - total_payments,
            total_receipts,
            total_payments,
        }
    }
}

/// Dashboard landing payload
#[derive(Debug, Clone, Serialize)]
pub struct HomeSummary {
    pub debt: DebtSummary,
    pub cashflow: CashflowSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip: Option<EducationPrompt>,
}

/// Most recent records and cleaned cashflows
#[derive(Debug, Clone, Serialize)]
pub struct ViewData {
    pub records: Vec<Record>,
    pub cashflows: Vec<Cashflow>,
}

/// Response to a successful receipt/payment entry
#[derive(Debug, Clone, Serialize)]
pub struct CashflowCreated {
    pub cashflow: Cashflow,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education_prompt: Option<EducationPrompt>,
}

// ========================================
// Error Response Types
// ========================================

/// JSON error body returned by every route
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Per-field messages for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<ValidationErrors>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            fields: None,
        }
    }

    pub fn with_fields(error: impl Into<String>, fields: ValidationErrors) -> Self {
        Self {
            error: error.into(),
            fields: Some(fields),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_keys_are_camel_case() {
        let debt = DebtSummary {
            total_i_owe: 100.0,
            total_i_am_owed: 40.0,
        };
        let json = serde_json::to_value(debt).unwrap();
        assert_eq!(json["totalIOwe"], 100.0);
        assert_eq!(json["totalIAmOwed"], 40.0);

        let cashflow = CashflowSummary::new(500.0, 200.0);
        let json = serde_json::to_value(cashflow).unwrap();
        assert_eq!(json["netCashflow"], 300.0);
        assert_eq!(json["totalReceipts"], 500.0);
        assert_eq!(json["totalPayments"], 200.0);
    }

    #[test]
    fn test_error_response_omits_empty_fields() {
        let json = serde_json::to_string(&ErrorResponse::new("Not found")).unwrap();
        assert_eq!(json, r#"{"error":"Not found"}"#);

        let mut fields = ValidationErrors::new();
        fields.add("amount", "Amount is required");
        let json = serde_json::to_value(ErrorResponse::with_fields("Validation failed", fields))
            .unwrap();
        assert_eq!(json["fields"]["amount"], "Amount is required");
    }
}
