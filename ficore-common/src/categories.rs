//! Expense categories
//!
//! Fixed catalogue of payment categories with their tax treatment. Keys are
//! what gets stored in `cashflows.expense_category`.

use serde::Serialize;
use tracing::warn;

/// Category assigned when a payment has none (or an unknown one)
pub const DEFAULT_EXPENSE_CATEGORY: &str = "office_admin";

/// Category used for automatically booked cost of goods sold
pub const COGS_CATEGORY: &str = "cogs";

/// Largest amount accepted for a single categorized expense
pub const MAX_EXPENSE_AMOUNT: f64 = 999_999_999.99;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExpenseCategory {
    pub key: &'static str,
    pub name: &'static str,
    pub tax_deductible: bool,
    pub is_personal: bool,
    pub is_statutory: bool,
    pub description: &'static str,
    pub examples: &'static [&'static str],
}

pub const EXPENSE_CATEGORIES: &[ExpenseCategory] = &[
    ExpenseCategory {
        key: "office_admin",
        name: "Office & Admin",
        tax_deductible: true,
        is_personal: false,
        is_statutory: false,
        description: "Office supplies, stationery, internet/data, utility bills",
        examples: &["Office supplies", "Stationery", "Internet/Data", "Electricity"],
    },
    ExpenseCategory {
        key: "staff_wages",
        name: "Staff & Wages",
        tax_deductible: true,
        is_personal: false,
        is_statutory: false,
        description: "Employee salaries, wages, and related costs",
        examples: &["Salaries", "Wages", "Staff benefits", "Payroll costs"],
    },
    ExpenseCategory {
        key: "business_travel",
        name: "Business Travel & Transport",
        tax_deductible: true,
        is_personal: false,
        is_statutory: false,
        description: "Fuel, vehicle maintenance, and travel expenses for business",
        examples: &["Fuel", "Vehicle maintenance", "Business travel", "Transport costs"],
    },
    ExpenseCategory {
        key: "rent_utilities",
        name: "Rent & Utilities",
        tax_deductible: true,
        is_personal: false,
        is_statutory: false,
        description: "Rent for shop or business office",
        examples: &["Shop rent", "Office rent", "Business premises rent"],
    },
    ExpenseCategory {
        key: "marketing_sales",
        name: "Marketing & Sales",
        tax_deductible: true,
        is_personal: false,
        is_statutory: false,
        description: "Advertising, social media promotion, business cards",
        examples: &["Advertising", "Social media promotion", "Business cards"],
    },
    ExpenseCategory {
        key: "cogs",
        name: "Cost of Goods Sold (COGS)",
        tax_deductible: true,
        is_personal: false,
        is_statutory: false,
        description: "Direct costs of producing goods or services",
        examples: &["Raw materials", "Manufacturing costs", "Direct labor"],
    },
    ExpenseCategory {
        key: "personal_expenses",
        name: "Personal Expenses",
        tax_deductible: false,
        is_personal: true,
        is_statutory: false,
        description: "Personal expenses not related to business",
        examples: &["Personal meals", "Personal shopping", "Family expenses"],
    },
    ExpenseCategory {
        key: "statutory_legal",
        name: "Statutory & Legal Contributions",
        tax_deductible: true,
        is_personal: false,
        is_statutory: true,
        description: "Accounting, legal, and consulting fees directly related to business",
        examples: &["Accounting fees", "Legal fees", "Consulting fees"],
    },
];

/// Look up a category by key (surrounding whitespace ignored)
pub fn find(key: &str) -> Option<&'static ExpenseCategory> {
    let key = key.trim();
    EXPENSE_CATEGORIES.iter().find(|c| c.key == key)
}

pub fn is_valid(key: &str) -> bool {
    let valid = find(key).is_some();
    if !valid {
        warn!("Invalid expense category: {}", key);
    }
    valid
}

pub fn is_tax_deductible(key: &str) -> bool {
    find(key).map(|c| c.tax_deductible).unwrap_or(false)
}

pub fn is_personal(key: &str) -> bool {
    find(key).map(|c| c.is_personal).unwrap_or(false)
}

pub fn is_statutory(key: &str) -> bool {
    find(key).map(|c| c.is_statutory).unwrap_or(false)
}

pub fn tax_deductible_keys() -> Vec<&'static str> {
    EXPENSE_CATEGORIES
        .iter()
        .filter(|c| c.tax_deductible)
        .map(|c| c.key)
        .collect()
}

/// (key, label) pairs for a select box, sorted by label
pub fn form_choices() -> Vec<(&'static str, String)> {
    let mut choices: Vec<(&'static str, String)> = EXPENSE_CATEGORIES
        .iter()
        .map(|c| {
            let label = if c.is_personal {
                format!("{} (Not Tax Deductible)", c.name)
            } else {
                c.name.to_string()
            };
            (c.key, label)
        })
        .collect();
    choices.sort_by(|a, b| a.1.cmp(&b.1));
    choices
}

/// Check a category/amount/description triple before booking an expense
///
/// Returns every problem found; an empty list means the assignment is valid.
pub fn validate_category_assignment(
    key: &str,
    amount: f64,
    description: Option<&str>,
) -> Vec<String> {
    let mut errors = Vec::new();

    if !is_valid(key) {
        errors.push(format!("Invalid expense category: {}", key));
    }

    if !amount.is_finite() || amount < 0.0 {
        errors.push("Amount must be a positive number".to_string());
    } else if amount == 0.0 {
        errors.push("Amount cannot be zero".to_string());
    } else if amount > MAX_EXPENSE_AMOUNT {
        errors.push("Amount is too large (maximum: ₦999,999,999.99)".to_string());
    }

    if let Some(description) = description {
        if description.trim().chars().count() > 1000 {
            errors.push("Description cannot exceed 1000 characters".to_string());
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert!(is_valid("cogs"));
        assert!(is_valid("  office_admin "));
        assert!(!is_valid("snacks"));
        assert_eq!(find("staff_wages").unwrap().name, "Staff & Wages");
    }

    #[test]
    fn test_flags() {
        assert!(is_tax_deductible("rent_utilities"));
        assert!(!is_tax_deductible("personal_expenses"));
        assert!(is_personal("personal_expenses"));
        assert!(is_statutory("statutory_legal"));
        assert!(!is_statutory("unknown"));
    }

    #[test]
    fn test_tax_deductible_keys_exclude_personal() {
        let keys = tax_deductible_keys();
        assert_eq!(keys.len(), 7);
        assert!(!keys.contains(&"personal_expenses"));
    }

    #[test]
    fn test_form_choices_sorted_and_labelled() {
        let choices = form_choices();
        assert_eq!(choices.len(), EXPENSE_CATEGORIES.len());
        let labels: Vec<&String> = choices.iter().map(|c| &c.1).collect();
        let mut sorted = labels.clone();
        sorted.sort();
        assert_eq!(labels, sorted);
        let personal = choices.iter().find(|c| c.0 == "personal_expenses").unwrap();
        assert_eq!(personal.1, "Personal Expenses (Not Tax Deductible)");
    }

    #[test]
    fn test_validate_category_assignment() {
        assert!(validate_category_assignment("cogs", 10.0, Some("flour")).is_empty());
        assert_eq!(validate_category_assignment("cogs", 0.0, None), vec!["Amount cannot be zero"]);
        assert_eq!(validate_category_assignment("bogus", -1.0, None).len(), 2);
        assert_eq!(
            validate_category_assignment("cogs", 1e12, Some(&"d".repeat(1001))).len(),
            2
        );
    }
}
