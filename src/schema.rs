// Expense Tracker - Schema Validation
// Turns raw entry input into a validated Entry, or the list of everything wrong with it

use chrono::{DateTime, NaiveDate};
use serde::Serialize;

use crate::entry::{Entry, EntryPatch, EntryType, NewEntry};

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn required(field: &str) -> Self {
        Self::new(field, "is required")
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = Result<T, Vec<ValidationError>>;

// ============================================================================
// FIELD PARSERS
// ============================================================================

/// Parse a calendar date. Accepts `YYYY-MM-DD` or an RFC 3339 timestamp,
/// of which only the date part is kept.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

/// Trimmed text, or None when absent or blank.
fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// ============================================================================
// VALIDATORS
// ============================================================================

/// Validate a complete input and build the Entry it describes under `id`.
///
/// Required: amount (finite, > 0), category, type (Income | Expense),
/// paymentMethod, date. Optional: subcategory, description.
pub fn validate_new(input: &NewEntry, id: String) -> ValidationResult<Entry> {
    let mut errors = Vec::new();

    let amount = match input.amount.as_ref() {
        None => {
            errors.push(ValidationError::required("amount"));
            None
        }
        Some(raw) => match raw.value() {
            None => {
                errors.push(ValidationError::new("amount", "must be a number"));
                None
            }
            Some(n) if !n.is_finite() => {
                errors.push(ValidationError::new("amount", "must be a finite number"));
                None
            }
            // A zero amount counts as missing
            Some(n) if n == 0.0 => {
                errors.push(ValidationError::required("amount"));
                None
            }
            Some(n) if n < 0.0 => {
                errors.push(ValidationError::new(
                    "amount",
                    "must be greater than zero; use type to record an expense",
                ));
                None
            }
            Some(n) => Some(n),
        },
    };

    let category = non_blank(input.category.as_ref());
    if category.is_none() {
        errors.push(ValidationError::required("category"));
    }

    let entry_type = match non_blank(input.entry_type.as_ref()) {
        None => {
            errors.push(ValidationError::required("type"));
            None
        }
        Some(raw) => match raw.parse::<EntryType>() {
            Ok(t) => Some(t),
            Err(_) => {
                errors.push(ValidationError::new(
                    "type",
                    format!("must be one of Income, Expense (got '{}')", raw),
                ));
                None
            }
        },
    };

    let payment_method = non_blank(input.payment_method.as_ref());
    if payment_method.is_none() {
        errors.push(ValidationError::required("paymentMethod"));
    }

    let date = match non_blank(input.date.as_ref()) {
        None => {
            errors.push(ValidationError::required("date"));
            None
        }
        Some(raw) => {
            let parsed = parse_date(&raw);
            if parsed.is_none() {
                errors.push(ValidationError::new(
                    "date",
                    format!("must be a calendar date (YYYY-MM-DD), got '{}'", raw),
                ));
            }
            parsed
        }
    };

    match (amount, category, entry_type, payment_method, date) {
        (Some(amount), Some(category), Some(entry_type), Some(payment_method), Some(date))
            if errors.is_empty() =>
        {
            Ok(Entry {
                id,
                amount,
                category,
                subcategory: non_blank(input.subcategory.as_ref()),
                entry_type,
                payment_method,
                date,
                description: non_blank(input.description.as_ref()),
            })
        }
        _ => Err(errors),
    }
}

/// Apply a partial update to a stored entry and revalidate the result.
/// The id is carried over unchanged.
pub fn apply_patch(current: &Entry, patch: &EntryPatch) -> ValidationResult<Entry> {
    let merged = NewEntry::from(current).merge(patch);
    validate_new(&merged, current.id.clone())
}
