//! Input sanitization
//!
//! Stored string fields are cleaned on every insert path and retroactively by
//! the cleanup passes in [`crate::cleanup`]. Backslashes in persisted text
//! broke downstream JSON parsing ("unexpected char '\\'"), so they are
//! stripped unless a field explicitly allows escaped backslashes.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::{Error, Result};

/// Characters stripped as HTML/quote specials
static DANGEROUS_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>"'`]"#).expect("static regex"));

/// C0 and C1 control characters plus DEL
static CONTROL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x1f\x7f-\x9f]").expect("static regex"));

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Pattern the diagnostics use to flag a stored value
static PROBLEMATIC_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\\<>"']"#).expect("static regex"));

/// Everything the salvage pass refuses to keep
static SALVAGE_DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9\s\-.,()]").expect("static regex"));

/// Currency markers removed before parsing an amount
const CURRENCY_MARKERS: &[&str] = &["NGN", "₦", "$", "€", "£", ","];

/// Upper bound accepted by [`clean_currency`] by default
pub const DEFAULT_MAX_CURRENCY: f64 = 10_000_000_000.0;

/// Values longer than this are rewritten by the advanced cleanup pass
pub const ADVANCED_CLEAN_LENGTH: usize = 500;

/// Length cap applied by [`aggressive_clean`]
pub const SALVAGE_MAX_LENGTH: usize = 100;

/// How a single string field is sanitized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub field: &'static str,
    pub max_length: usize,
    pub allow_backslash: bool,
}

const fn rule(field: &'static str, max_length: usize, allow_backslash: bool) -> FieldRule {
    FieldRule {
        field,
        max_length,
        allow_backslash,
    }
}

/// Sanitization rules for cashflow string fields
pub const CASHFLOW_FIELD_RULES: &[FieldRule] = &[
    rule("party_name", 100, false),
    rule("description", 1000, true),
    rule("contact", 100, false),
    rule("method", 100, false),
    rule("expense_category", 100, false),
    rule("notes", 1000, true),
    rule("reference", 100, false),
];

/// The five fields the bulk cleanup passes rewrite
pub const CORE_CASHFLOW_FIELDS: &[&str] = &[
    "party_name",
    "description",
    "contact",
    "method",
    "expense_category",
];

/// Length cap for a record or cashflow field in the bulk passes
pub fn max_length_for(field: &str) -> usize {
    match field {
        "description" | "notes" => 1000,
        _ => 100,
    }
}

/// Sanitize a user-supplied string
///
/// Steps, in order: trim; drop backslashes (or collapse `\\` to `\` when
/// `allow_backslash`); turn newlines and tabs into spaces; remove
/// `< > " ' `` ` ``; remove control characters; remove `{ } [ ]`; collapse
/// whitespace; truncate to `max_length` characters.
pub fn sanitize_input(input: &str, max_length: Option<usize>, allow_backslash: bool) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let unescaped = if allow_backslash {
        trimmed.replace("\\\\", "\\")
    } else {
        trimmed.replace('\\', "")
    };

    let spaced = unescaped.replace(['\n', '\r', '\t'], " ");
    let no_specials = DANGEROUS_CHARS.replace_all(&spaced, "");
    let no_controls = CONTROL_CHARS.replace_all(&no_specials, "");
    let no_brackets: String = no_controls
        .chars()
        .filter(|c| !matches!(c, '{' | '}' | '[' | ']'))
        .collect();
    let collapsed = WHITESPACE_RUN.replace_all(&no_brackets, " ");
    let sanitized = collapsed.trim();

    if sanitized.contains(['<', '>']) {
        warn!("Angle bracket survived sanitization: {}", sanitized);
    }

    truncate_chars(sanitized, max_length)
}

/// Sanitize with a field rule
pub fn sanitize_field(value: &str, rule: &FieldRule) -> String {
    sanitize_input(value, Some(rule.max_length), rule.allow_backslash)
}

/// Salvage a value that normal cleaning could not fix
///
/// Keeps only letters, digits, whitespace and `- . , ( )`. Returns `None` if
/// nothing survives.
pub fn aggressive_clean(value: &str) -> Option<String> {
    let no_backslash = value.replace('\\', "");
    let no_controls = CONTROL_CHARS.replace_all(&no_backslash, "");
    let safe = SALVAGE_DISALLOWED.replace_all(&no_controls, "");
    let collapsed = WHITESPACE_RUN.replace_all(&safe, " ");
    let cleaned = truncate_chars(collapsed.trim(), Some(SALVAGE_MAX_LENGTH));
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// True if the value matches the diagnostic pattern `[\\<>"']`
pub fn has_problematic_chars(value: &str) -> bool {
    PROBLEMATIC_CHARS.is_match(value)
}

/// True if the advanced cleanup pass should rewrite the value
pub fn needs_advanced_cleaning(value: &str) -> bool {
    value.contains('\\')
        || CONTROL_CHARS.is_match(value)
        || value.chars().count() > ADVANCED_CLEAN_LENGTH
}

/// Parse a currency amount typed by a user
///
/// Strips currency markers and thousands separators. Blank input is zero.
/// Negative, malformed or oversized amounts are rejected.
pub fn clean_currency(input: &str, max_value: f64) -> Result<f64> {
    let mut text = input.trim().to_string();
    if text.is_empty() {
        return Ok(0.0);
    }

    for marker in CURRENCY_MARKERS {
        text = text.replace(marker, "");
    }
    let text = text.trim();

    if text.starts_with('-') {
        return Err(Error::InvalidInput(
            "Negative currency values are not allowed".to_string(),
        ));
    }

    let digits: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if digits.is_empty() || digits == "." || digits.matches('.').count() > 1 {
        return Err(Error::InvalidInput("Invalid currency format".to_string()));
    }

    let value: f64 = digits
        .parse()
        .map_err(|_| Error::InvalidInput("Invalid currency format".to_string()))?;

    check_currency_bounds(value, max_value)
}

/// Bounds check for an amount that is already numeric
pub fn check_currency_bounds(value: f64, max_value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(Error::InvalidInput("Invalid currency format".to_string()));
    }
    if value < 0.0 {
        return Err(Error::InvalidInput(
            "Negative currency values are not allowed".to_string(),
        ));
    }
    if value > max_value {
        return Err(Error::InvalidInput(format!(
            "Input cannot exceed {}",
            max_value
        )));
    }
    Ok(value)
}

fn truncate_chars(value: &str, max_length: Option<usize>) -> String {
    match max_length {
        Some(max) if value.chars().count() > max => value.chars().take(max).collect(),
        _ => value.to_string(),
    }
}
