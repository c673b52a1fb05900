// Expense Tracker - Entry Service
// Thin layer over EntryStore: fixed query shapes for the income/expense views
// and logging of every mutation. Totals live in summary.rs, not here

use crate::db::EntryStore;
use crate::entry::{Entry, EntryFilter, EntryPatch, EntryType, NewEntry};
use crate::error::Result;

pub struct EntryService {
    store: EntryStore,
}

impl EntryService {
    pub fn new(store: EntryStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    pub fn create(&self, input: &NewEntry) -> Result<Entry> {
        let entry = self.store.insert(input)?;
        tracing::info!(
            id = %entry.id,
            entry_type = %entry.entry_type,
            amount = entry.amount,
            "entry created"
        );
        Ok(entry)
    }

    /// All entries matching `filter` (empty filter = everything).
    pub fn list(&self, filter: &EntryFilter) -> Result<Vec<Entry>> {
        self.store.find_many(filter)
    }

    pub fn list_income(&self) -> Result<Vec<Entry>> {
        self.list(&EntryFilter::by_type(EntryType::Income))
    }

    pub fn list_expense(&self) -> Result<Vec<Entry>> {
        self.list(&EntryFilter::by_type(EntryType::Expense))
    }

    pub fn get(&self, id: &str) -> Result<Entry> {
        self.store.find_by_id(id)
    }

    pub fn update(&self, id: &str, patch: &EntryPatch) -> Result<Entry> {
        let entry = self.store.update_by_id(id, patch)?;
        tracing::info!(id = %entry.id, "entry updated");
        Ok(entry)
    }

    pub fn delete(&self, id: &str) -> Result<Entry> {
        let entry = self.store.delete_by_id(id)?;
        tracing::info!(id = %entry.id, "entry deleted");
        Ok(entry)
    }
}
