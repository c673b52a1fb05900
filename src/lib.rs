// Expense Tracker - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod config;
pub mod db;
pub mod entry;
pub mod error;
pub mod import;
pub mod logging;
pub mod schema;
pub mod service;
pub mod summary;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::{ConfigError, Settings};
pub use db::{setup_database, EntryStore};
pub use entry::{Entry, EntryFilter, EntryPatch, EntryType, FilterField, NewEntry, RawAmount};
pub use error::{Result, StoreError};
pub use import::{export_csv, import_entries, load_csv, CsvRow, ImportReport, SkippedRow};
pub use schema::{ValidationError, ValidationResult};
pub use service::EntryService;
pub use summary::{SortConfig, SortDirection, SortKey, Totals};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
