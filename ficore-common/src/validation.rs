//! Cashflow form validation
//!
//! Runs after sanitization, on the cleaned values that would be stored.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::categories::{self, MAX_EXPENSE_AMOUNT};
use crate::models::{Cashflow, CashflowType};

static PARTY_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9\s\-.,'&]+$").expect("static regex"));

static CONTACT_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9\s\-.,+()@]+$").expect("static regex"));

/// Accepted payment methods
pub const PAYMENT_METHODS: &[&str] = &["cash", "card", "bank"];

/// Field name to message, one message per field
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error; a later error on the same field replaces the earlier
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.insert(field.to_string(), message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn title_case(field: &str) -> String {
    field
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Validate a cleaned cashflow before insert
///
/// `date` is the transaction date the user entered and `today` the current
/// UTC date. Payments additionally require a known expense category.
pub fn validate_cashflow(
    cashflow: &Cashflow,
    kind: CashflowType,
    date: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if non_blank(&cashflow.party_name).is_none() {
        errors.add("party_name", format!("{} is required", title_case("party_name")));
    }
    if date.is_none() {
        errors.add("date", format!("{} is required", title_case("date")));
    }
    if cashflow.amount.is_none() {
        errors.add("amount", format!("{} is required", title_case("amount")));
    }
    if kind == CashflowType::Payment && non_blank(&cashflow.expense_category).is_none() {
        errors.add(
            "expense_category",
            format!("{} is required", title_case("expense_category")),
        );
    }

    if let Some(party_name) = non_blank(&cashflow.party_name) {
        let length = party_name.chars().count();
        if length < 2 {
            errors.add("party_name", "Party name must be at least 2 characters long");
        } else if length > 100 {
            errors.add("party_name", "Party name cannot exceed 100 characters");
        } else if !PARTY_NAME_CHARS.is_match(party_name) {
            errors.add("party_name", "Party name contains invalid characters");
        }
    }

    if let Some(date) = date {
        if date > today {
            errors.add("date", "Date cannot be in the future");
        }
        let ten_years_ago = today
            .with_year(today.year() - 10)
            .unwrap_or_else(|| today - chrono::Duration::days(3653));
        if date < ten_years_ago {
            errors.add("date", "Date cannot be more than 10 years in the past");
        }
    }

    if let Some(amount) = cashflow.amount {
        if !amount.is_finite() {
            errors.add("amount", "Amount must be a valid number");
        } else if amount <= 0.0 {
            errors.add("amount", "Amount must be greater than zero");
        } else if amount > MAX_EXPENSE_AMOUNT {
            errors.add("amount", "Amount is too large (maximum: ₦999,999,999.99)");
        } else if !has_at_most_two_decimals(amount) {
            errors.add("amount", "Amount cannot have more than 2 decimal places");
        }
    }

    if let Some(category) = non_blank(&cashflow.expense_category) {
        if !categories::is_valid(category) {
            errors.add("expense_category", "Please select a valid expense category");
        }
    }

    if let Some(method) = non_blank(&cashflow.method) {
        if !PAYMENT_METHODS.contains(&method) {
            errors.add("method", "Please select a valid payment method");
        }
    }

    if let Some(contact) = non_blank(&cashflow.contact) {
        if contact.chars().count() > 100 {
            errors.add("contact", "Contact cannot exceed 100 characters");
        } else if !CONTACT_CHARS.is_match(contact) {
            errors.add("contact", "Contact contains invalid characters");
        }
    }

    if let Some(description) = non_blank(&cashflow.description) {
        if description.chars().count() > 1000 {
            errors.add("description", "Description cannot exceed 1000 characters");
        }
    }

    errors.into_result()
}

fn has_at_most_two_decimals(amount: f64) -> bool {
    let cents = amount * 100.0;
    (cents - cents.round()).abs() < 1e-6
}
