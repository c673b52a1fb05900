// Expense Tracker - Entry Model
// One income or expense record, plus the inputs used to create, patch and filter it

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// ENTRY TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// Money coming in
    Income,

    /// Money going out
    Expense,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Income => "Income",
            EntryType::Expense => "Expense",
        }
    }
}

impl FromStr for EntryType {
    type Err = String;

    /// Exact, case-sensitive match on "Income" / "Expense".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Income" => Ok(EntryType::Income),
            "Expense" => Ok(EntryType::Expense),
            other => Err(format!("unknown entry type '{}'", other)),
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ENTRY
// ============================================================================

/// A persisted entry. Only the store builds these, after validation.
///
/// Identity: `id` (UUID) is assigned at insert and never changes.
/// Values: every other field may be replaced through a patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,

    pub amount: f64,

    pub category: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,

    #[serde(rename = "type")]
    pub entry_type: EntryType,

    pub payment_method: String,

    pub date: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ============================================================================
// RAW INPUT
// ============================================================================

/// Amount as sent by a client: JSON number or numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
}

impl RawAmount {
    /// Numeric value, if the input is a number or parses as one.
    pub fn value(&self) -> Option<f64> {
        match self {
            RawAmount::Number(n) => Some(*n),
            RawAmount::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Unvalidated fields for a new entry.
///
/// Every field is optional here so that a missing field surfaces as a
/// validation error naming that field rather than as a decode failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    pub amount: Option<RawAmount>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    #[serde(rename = "type")]
    pub entry_type: Option<String>,
    pub payment_method: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
}

impl NewEntry {
    /// Build an input carrying every required field.
    pub fn new(
        amount: f64,
        category: &str,
        entry_type: EntryType,
        payment_method: &str,
        date: &str,
    ) -> Self {
        NewEntry {
            amount: Some(RawAmount::Number(amount)),
            category: Some(category.to_string()),
            subcategory: None,
            entry_type: Some(entry_type.as_str().to_string()),
            payment_method: Some(payment_method.to_string()),
            date: Some(date.to_string()),
            description: None,
        }
    }

    pub fn with_subcategory(mut self, subcategory: &str) -> Self {
        self.subcategory = Some(subcategory.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Overlay the supplied fields of `patch` onto this input.
    pub fn merge(mut self, patch: &EntryPatch) -> Self {
        if let Some(amount) = &patch.amount {
            self.amount = Some(amount.clone());
        }
        if let Some(category) = &patch.category {
            self.category = Some(category.clone());
        }
        if let Some(subcategory) = &patch.subcategory {
            self.subcategory = Some(subcategory.clone());
        }
        if let Some(entry_type) = &patch.entry_type {
            self.entry_type = Some(entry_type.clone());
        }
        if let Some(payment_method) = &patch.payment_method {
            self.payment_method = Some(payment_method.clone());
        }
        if let Some(date) = &patch.date {
            self.date = Some(date.clone());
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
        self
    }
}

impl From<&Entry> for NewEntry {
    fn from(entry: &Entry) -> Self {
        NewEntry {
            amount: Some(RawAmount::Number(entry.amount)),
            category: Some(entry.category.clone()),
            subcategory: entry.subcategory.clone(),
            entry_type: Some(entry.entry_type.as_str().to_string()),
            payment_method: Some(entry.payment_method.clone()),
            date: Some(entry.date.format("%Y-%m-%d").to_string()),
            description: entry.description.clone(),
        }
    }
}

/// Partial update: only the fields that are `Some` change.
///
/// Unknown keys (including `_id`) are ignored on decode, so a client may send
/// back a whole entry. An empty `subcategory` or `description` clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPatch {
    pub amount: Option<RawAmount>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    #[serde(rename = "type")]
    pub entry_type: Option<String>,
    pub payment_method: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
}

impl EntryPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == EntryPatch::default()
    }

    pub fn amount(mut self, amount: f64) -> Self {
        self.amount = Some(RawAmount::Number(amount));
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn subcategory(mut self, subcategory: &str) -> Self {
        self.subcategory = Some(subcategory.to_string());
        self
    }

    pub fn entry_type(mut self, entry_type: EntryType) -> Self {
        self.entry_type = Some(entry_type.as_str().to_string());
        self
    }

    pub fn payment_method(mut self, payment_method: &str) -> Self {
        self.payment_method = Some(payment_method.to_string());
        self
    }

    pub fn date(mut self, date: &str) -> Self {
        self.date = Some(date.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

// ============================================================================
// FILTER
// ============================================================================

/// Entry fields that can be used in an exact-match filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    Id,
    Amount,
    Category,
    Subcategory,
    Type,
    PaymentMethod,
    Date,
    Description,
}

impl FilterField {
    /// Map a wire key (as used in query strings) to a field.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "_id" | "id" => Some(FilterField::Id),
            "amount" => Some(FilterField::Amount),
            "category" => Some(FilterField::Category),
            "subcategory" => Some(FilterField::Subcategory),
            "type" => Some(FilterField::Type),
            "paymentMethod" => Some(FilterField::PaymentMethod),
            "date" => Some(FilterField::Date),
            "description" => Some(FilterField::Description),
            _ => None,
        }
    }
}

/// Exact-match filter: every condition must hold. Empty matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryFilter {
    conditions: Vec<(FilterField, String)>,
}

impl EntryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_type(entry_type: EntryType) -> Self {
        Self::new().with(FilterField::Type, entry_type.as_str())
    }

    /// Add a condition, replacing any earlier one on the same field.
    pub fn with(mut self, field: FilterField, value: impl Into<String>) -> Self {
        self.conditions.retain(|(f, _)| *f != field);
        self.conditions.push((field, value.into()));
        self
    }

    /// Build a filter from key/value pairs. Unknown keys are skipped.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .fold(Self::new(), |filter, (key, value)| {
                match FilterField::from_key(key.as_ref()) {
                    Some(field) => filter.with(field, value),
                    None => {
                        tracing::debug!(key = key.as_ref(), "ignoring unknown filter key");
                        filter
                    }
                }
            })
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[(FilterField, String)] {
        &self.conditions
    }
}
