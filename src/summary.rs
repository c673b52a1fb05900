// Expense Tracker - Client Aggregates
// Totals and sorting for list views. Computed from whatever entries the client
// fetched; the service itself guarantees no aggregate.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::entry::{Entry, EntryType};

// ============================================================================
// TOTALS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub income: f64,
    pub expense: f64,
    /// income - expense
    pub balance: f64,
}

impl Totals {
    pub fn from_entries(entries: &[Entry]) -> Self {
        let (income, expense) = entries
            .iter()
            .fold((0.0, 0.0), |(income, expense), entry| match entry.entry_type {
                EntryType::Income => (income + entry.amount, expense),
                EntryType::Expense => (income, expense + entry.amount),
            });

        Totals {
            income,
            expense,
            balance: income - expense,
        }
    }
}

// ============================================================================
// SORTING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Amount,
    Category,
    Subcategory,
    Type,
    PaymentMethod,
    Date,
    Description,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Amount => "amount",
            SortKey::Category => "category",
            SortKey::Subcategory => "subcategory",
            SortKey::Type => "type",
            SortKey::PaymentMethod => "paymentMethod",
            SortKey::Date => "date",
            SortKey::Description => "description",
        }
    }

    fn compare(&self, a: &Entry, b: &Entry) -> Ordering {
        match self {
            SortKey::Amount => a.amount.total_cmp(&b.amount),
            SortKey::Category => a.category.cmp(&b.category),
            SortKey::Subcategory => a.subcategory.cmp(&b.subcategory),
            SortKey::Type => a.entry_type.as_str().cmp(b.entry_type.as_str()),
            SortKey::PaymentMethod => a.payment_method.cmp(&b.payment_method),
            SortKey::Date => a.date.cmp(&b.date),
            SortKey::Description => a.description.cmp(&b.description),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "amount" => Ok(SortKey::Amount),
            "category" => Ok(SortKey::Category),
            "subcategory" => Ok(SortKey::Subcategory),
            "type" => Ok(SortKey::Type),
            "paymentMethod" | "payment-method" | "payment_method" => Ok(SortKey::PaymentMethod),
            "date" => Ok(SortKey::Date),
            "description" => Ok(SortKey::Description),
            other => Err(format!("unknown sort key '{}'", other)),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Current sort of a list view. Starts on amount, ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortConfig {
    fn default() -> Self {
        SortConfig {
            key: SortKey::Amount,
            direction: SortDirection::Ascending,
        }
    }
}

impl SortConfig {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        SortConfig { key, direction }
    }

    /// Column-header click: the same key while ascending flips to
    /// descending; anything else sorts ascending on `key`.
    pub fn toggle(&mut self, key: SortKey) {
        self.direction = if self.key == key && self.direction == SortDirection::Ascending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        self.key = key;
    }

    /// Sorted copy of `entries`. Ties keep their input order.
    pub fn sort(&self, entries: &[Entry]) -> Vec<Entry> {
        let mut sorted = entries.to_vec();
        sorted.sort_by(|a, b| {
            let ordering = self.key.compare(a, b);
            match self.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
        sorted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn entry(id: &str, amount: f64, entry_type: EntryType, category: &str, day: u32) -> Entry {
        Entry {
            id: id.to_string(),
            amount,
            category: category.to_string(),
            subcategory: None,
            entry_type,
            payment_method: "Cash".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            description: None,
        }
    }

    fn ids(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    fn sample() -> Vec<Entry> {
        vec![
            entry("a", 2000.0, EntryType::Income, "Salary", 1),
            entry("b", 100.0, EntryType::Expense, "Food", 3),
            entry("c", 350.5, EntryType::Expense, "Rent", 2),
            entry("d", 100.0, EntryType::Income, "Gift", 4),
        ]
    }

    #[test]
    fn test_totals() {
        let totals = Totals::from_entries(&sample());

        assert_eq!(
            totals,
            Totals {
                income: 2100.0,
                expense: 450.5,
                balance: 1649.5,
            }
        );
        assert_eq!(Totals::from_entries(&[]), Totals::default());
    }

    #[test]
    fn test_toggle_semantics() {
        let mut config = SortConfig::default();
        assert_eq!(config, SortConfig::new(SortKey::Amount, SortDirection::Ascending));

        config.toggle(SortKey::Amount);
        assert_eq!(config.direction, SortDirection::Descending);

        config.toggle(SortKey::Amount);
        assert_eq!(config.direction, SortDirection::Ascending);

        config.toggle(SortKey::Amount);
        config.toggle(SortKey::Date);
        assert_eq!(config, SortConfig::new(SortKey::Date, SortDirection::Ascending));
    }

    #[test]
    fn test_sort_by_amount_is_stable() {
        let entries = sample();

        let ascending = SortConfig::default().sort(&entries);
        assert_eq!(ids(&ascending), vec!["b", "d", "c", "a"]);

        let descending =
            SortConfig::new(SortKey::Amount, SortDirection::Descending).sort(&entries);
        assert_eq!(ids(&descending), vec!["a", "c", "b", "d"]);

        // input untouched
        assert_eq!(ids(&entries), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_sort_by_text_and_date() {
        let entries = sample();

        let by_category = SortConfig::new(SortKey::Category, SortDirection::Ascending).sort(&entries);
        assert_eq!(ids(&by_category), vec!["b", "d", "c", "a"]);

        let by_date = SortConfig::new(SortKey::Date, SortDirection::Descending).sort(&entries);
        assert_eq!(ids(&by_date), vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!("paymentMethod".parse::<SortKey>(), Ok(SortKey::PaymentMethod));
        assert_eq!("payment-method".parse::<SortKey>(), Ok(SortKey::PaymentMethod));
        assert!("merchant".parse::<SortKey>().is_err());
    }
}
