use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Value, ValueRef};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::entry::{Entry, EntryFilter, EntryPatch, EntryType, FilterField, NewEntry};
use crate::error::{Result, StoreError};
use crate::schema::{self, parse_date};

const SELECT_ENTRY: &str = "SELECT entry_id, amount, category, subcategory, entry_type,
        payment_method, date, description
 FROM entries";

// ============================================================================
// SQL CONVERSIONS
// ============================================================================

impl ToSql for EntryType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for EntryType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<Entry> {
    Ok(Entry {
        id: row.get(0)?,
        amount: row.get(1)?,
        category: row.get(2)?,
        subcategory: row.get(3)?,
        entry_type: row.get(4)?,
        payment_method: row.get(5)?,
        date: row.get(6)?,
        description: row.get(7)?,
    })
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // ==========================================================================
    // Entries Table
    // seq gives insertion order and is never reused (AUTOINCREMENT);
    // entry_id is the public identity.
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS entries (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            entry_id TEXT UNIQUE NOT NULL,
            amount REAL NOT NULL,
            category TEXT NOT NULL,
            subcategory TEXT,
            entry_type TEXT NOT NULL CHECK (entry_type IN ('Income', 'Expense')),
            payment_method TEXT NOT NULL,
            date TEXT NOT NULL,
            description TEXT
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_entries_type ON entries(entry_type)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_entries_date ON entries(date)",
        [],
    )?;

    Ok(())
}

/// Translate a filter into WHERE clauses and bound values.
///
/// Returns `None` when a condition can never match (e.g. a non-numeric
/// amount), so the caller can skip the query.
fn filter_clauses(filter: &EntryFilter) -> Option<(Vec<String>, Vec<Value>)> {
    let mut clauses = Vec::new();
    let mut values = Vec::new();

    for (field, raw) in filter.conditions() {
        let (column, value) = match field {
            FilterField::Id => ("entry_id", Value::Text(raw.clone())),
            FilterField::Amount => ("amount", Value::Real(raw.trim().parse().ok()?)),
            FilterField::Category => ("category", Value::Text(raw.clone())),
            FilterField::Subcategory => ("subcategory", Value::Text(raw.clone())),
            FilterField::Type => ("entry_type", Value::Text(raw.clone())),
            FilterField::PaymentMethod => ("payment_method", Value::Text(raw.clone())),
            FilterField::Date => (
                "date",
                Value::Text(parse_date(raw)?.format("%Y-%m-%d").to_string()),
            ),
            FilterField::Description => ("description", Value::Text(raw.clone())),
        };

        values.push(value);
        clauses.push(format!("{} = ?{}", column, values.len()));
    }

    Some((clauses, values))
}

fn select_by_id(conn: &Connection, id: &str) -> Result<Entry> {
    conn.query_row(
        &format!("{} WHERE entry_id = ?1", SELECT_ENTRY),
        [id],
        entry_from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::NotFound(id.to_string()))
}

// ============================================================================
// ENTRY STORE
// ============================================================================

/// SQLite-backed collection of entries.
///
/// The connection sits behind a mutex; each operation holds it for its whole
/// duration, so a read-modify-write update cannot interleave with a delete.
pub struct EntryStore {
    conn: Mutex<Connection>,
}

impl EntryStore {
    /// Open (or create) a database file with WAL journaling.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Enable WAL mode for crash recovery
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!(path = %path.display(), journal_mode = %mode, "opened entry database");

        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(EntryStore {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Validate, assign an id and persist. Nothing is written on failure.
    pub fn insert(&self, input: &NewEntry) -> Result<Entry> {
        let id = uuid::Uuid::new_v4().to_string();
        let entry = schema::validate_new(input, id).map_err(StoreError::Validation)?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO entries (
                entry_id, amount, category, subcategory, entry_type,
                payment_method, date, description
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                entry.id,
                entry.amount,
                entry.category,
                entry.subcategory,
                entry.entry_type,
                entry.payment_method,
                entry.date,
                entry.description,
            ],
        )?;

        Ok(entry)
    }

    /// All entries matching every condition of `filter`, in insertion order.
    pub fn find_many(&self, filter: &EntryFilter) -> Result<Vec<Entry>> {
        let Some((clauses, values)) = filter_clauses(filter) else {
            return Ok(Vec::new());
        };

        let mut sql = SELECT_ENTRY.to_string();
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY seq");

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params_from_iter(values), entry_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(entries)
    }

    pub fn find_by_id(&self, id: &str) -> Result<Entry> {
        let conn = self.lock()?;
        select_by_id(&conn, id)
    }

    /// Apply only the supplied fields, revalidate, and persist atomically.
    pub fn update_by_id(&self, id: &str, patch: &EntryPatch) -> Result<Entry> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let current = select_by_id(&tx, id)?;
        let updated = schema::apply_patch(&current, patch).map_err(StoreError::Validation)?;

        tx.execute(
            "UPDATE entries
             SET amount = ?2,
                 category = ?3,
                 subcategory = ?4,
                 entry_type = ?5,
                 payment_method = ?6,
                 date = ?7,
                 description = ?8
             WHERE entry_id = ?1",
            params![
                updated.id,
                updated.amount,
                updated.category,
                updated.subcategory,
                updated.entry_type,
                updated.payment_method,
                updated.date,
                updated.description,
            ],
        )?;
        tx.commit()?;

        Ok(updated)
    }

    /// Hard delete. Returns the removed entry.
    pub fn delete_by_id(&self, id: &str) -> Result<Entry> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let removed = select_by_id(&tx, id)?;
        tx.execute("DELETE FROM entries WHERE entry_id = ?1", [id])?;
        tx.commit()?;

        Ok(removed)
    }

    pub fn count(&self) -> Result<i64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::thread;

    fn store() -> EntryStore {
        EntryStore::open_in_memory().unwrap()
    }

    fn lunch() -> NewEntry {
        NewEntry::new(100.0, "Food", EntryType::Expense, "Cash", "2024-01-01")
            .with_subcategory("Lunch")
    }

    fn salary() -> NewEntry {
        NewEntry::new(2000.0, "Salary", EntryType::Income, "Bank Transfer", "2024-01-05")
    }

    #[test]
    fn test_insert_assigns_unique_ids() {
        let store = store();

        let a = store.insert(&lunch()).unwrap();
        let b = store.insert(&lunch()).unwrap();

        assert!(!a.id.is_empty());
        assert_ne!(a.id, b.id);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_invalid_insert_writes_nothing() {
        let store = store();

        let mut input = lunch();
        input.payment_method = None;
        let err = store.insert(&input).unwrap_err();

        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_find_many_preserves_insertion_order() {
        let store = store();
        let first = store.insert(&salary()).unwrap();
        let second = store.insert(&lunch()).unwrap();
        let third = store.insert(&salary()).unwrap();

        let all = store.find_many(&EntryFilter::new()).unwrap();
        assert_eq!(all, vec![first, second, third]);
    }

    #[test]
    fn test_find_many_exact_match() {
        let store = store();
        let lunch = store.insert(&lunch()).unwrap();
        let salary = store.insert(&salary()).unwrap();

        let expenses = store.find_many(&EntryFilter::by_type(EntryType::Expense)).unwrap();
        assert_eq!(expenses, vec![lunch.clone()]);

        let by_amount = store
            .find_many(&EntryFilter::new().with(FilterField::Amount, "2000"))
            .unwrap();
        assert_eq!(by_amount, vec![salary]);

        let by_two = store
            .find_many(
                &EntryFilter::new()
                    .with(FilterField::Category, "Food")
                    .with(FilterField::Date, "2024-01-01"),
            )
            .unwrap();
        assert_eq!(by_two, vec![lunch]);

        // Exact match only: no partial or case-insensitive matching
        let partial = store
            .find_many(&EntryFilter::new().with(FilterField::Category, "Foo"))
            .unwrap();
        assert!(partial.is_empty());
    }

    #[test]
    fn test_uninterpretable_filter_values_match_nothing() {
        let store = store();
        store.insert(&lunch()).unwrap();

        let bad_amount = EntryFilter::new().with(FilterField::Amount, "lots");
        assert!(store.find_many(&bad_amount).unwrap().is_empty());

        let bad_date = EntryFilter::new().with(FilterField::Date, "yesterday");
        assert!(store.find_many(&bad_date).unwrap().is_empty());
    }

    #[test]
    fn test_update_changes_only_supplied_fields() {
        let store = store();
        let original = store.insert(&lunch()).unwrap();

        let updated = store
            .update_by_id(&original.id, &EntryPatch::new().amount(500.0))
            .unwrap();

        assert_eq!(updated.amount, 500.0);
        assert_eq!(Entry { amount: 100.0, ..updated.clone() }, original);
        assert_eq!(store.find_by_id(&original.id).unwrap(), updated);
    }

    #[test]
    fn test_update_unknown_id_is_not_found() {
        let store = store();
        let existing = store.insert(&lunch()).unwrap();

        let err = store
            .update_by_id("missing", &EntryPatch::new().amount(1.0))
            .unwrap_err();

        assert!(matches!(err, StoreError::NotFound(id) if id == "missing"));
        assert_eq!(store.find_many(&EntryFilter::new()).unwrap(), vec![existing]);
    }

    #[test]
    fn test_invalid_update_leaves_row_unchanged() {
        let store = store();
        let original = store.insert(&lunch()).unwrap();

        let err = store
            .update_by_id(&original.id, &EntryPatch::new().amount(1.0).category(""))
            .unwrap_err();

        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(store.find_by_id(&original.id).unwrap(), original);
    }

    #[test]
    fn test_delete_then_delete_again() {
        let store = store();
        let entry = store.insert(&lunch()).unwrap();

        let removed = store.delete_by_id(&entry.id).unwrap();
        assert_eq!(removed, entry);
        assert!(store.find_many(&EntryFilter::new()).unwrap().is_empty());

        let err = store.delete_by_id(&entry.id).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_update_after_delete_is_not_found() {
        let store = store();
        let entry = store.insert(&lunch()).unwrap();
        store.delete_by_id(&entry.id).unwrap();

        let err = store
            .update_by_id(&entry.id, &EntryPatch::new().amount(5.0))
            .unwrap_err();

        assert!(matches!(err, StoreError::NotFound(id) if id == entry.id));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_delete_racing_update_leaves_entry_gone() {
        for _ in 0..50 {
            let store = Arc::new(store());
            let id = store.insert(&lunch()).unwrap().id;

            let deleter = {
                let store = Arc::clone(&store);
                let id = id.clone();
                thread::spawn(move || store.delete_by_id(&id))
            };
            let updater = {
                let store = Arc::clone(&store);
                let id = id.clone();
                thread::spawn(move || store.update_by_id(&id, &EntryPatch::new().amount(7.0)))
            };

            assert_eq!(deleter.join().unwrap().unwrap().id, id);
            match updater.join().unwrap() {
                Ok(updated) => assert_eq!(updated.amount, 7.0),
                Err(StoreError::NotFound(missing)) => assert_eq!(missing, id),
                Err(other) => panic!("unexpected update error: {other}"),
            }
            assert!(matches!(store.find_by_id(&id), Err(StoreError::NotFound(_))));
        }
    }

    #[test]
    fn test_concurrent_updates_last_write_wins() {
        let store = Arc::new(store());
        let id = store.insert(&lunch()).unwrap().id;

        let handles: Vec<_> = [10.0, 20.0]
            .into_iter()
            .map(|amount| {
                let store = Arc::clone(&store);
                let id = id.clone();
                thread::spawn(move || store.update_by_id(&id, &EntryPatch::new().amount(amount)))
            })
            .collect();
        let results: Vec<Entry> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap().unwrap())
            .collect();

        // Whichever update ran second is what remains; no field mix of the two
        let stored = store.find_by_id(&id).unwrap();
        assert!(results.contains(&stored));
        assert_eq!(stored.category, "Food");
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_schema_columns_match_entry_fields() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let mut stmt = conn.prepare("PRAGMA table_info(entries)").unwrap();
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .unwrap()
            .collect::<rusqlite::Result<Vec<_>>>()
            .unwrap();

        assert_eq!(
            columns,
            vec![
                "seq",
                "entry_id",
                "amount",
                "category",
                "subcategory",
                "entry_type",
                "payment_method",
                "date",
                "description",
            ]
        );
    }

    #[test]
    fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entries.db");

        let id = {
            let store = EntryStore::open(&path).unwrap();
            store.insert(&salary()).unwrap().id
        };

        let reopened = EntryStore::open(&path).unwrap();
        let entry = reopened.find_by_id(&id).unwrap();
        assert_eq!(entry.category, "Salary");
        assert_eq!(entry.entry_type, EntryType::Income);
    }
}
