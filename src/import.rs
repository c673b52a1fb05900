// Expense Tracker - CSV Import / Export
// Bulk-create entries from a CSV file through the service, and dump entries back out

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

use crate::entry::{Entry, NewEntry, RawAmount};
use crate::error::StoreError;
use crate::service::EntryService;

/// CSV row as read. Every column is optional so a bad row is reported by
/// validation, not by the CSV decoder. An `_id` column (from an export) is ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportRow {
    #[serde(default)]
    amount: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    subcategory: Option<String>,
    #[serde(default, rename = "type")]
    entry_type: Option<String>,
    #[serde(default)]
    payment_method: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl From<ImportRow> for NewEntry {
    fn from(row: ImportRow) -> Self {
        NewEntry {
            amount: row.amount.map(RawAmount::Text),
            category: row.category,
            subcategory: row.subcategory,
            entry_type: row.entry_type,
            payment_method: row.payment_method,
            date: row.date,
            description: row.description,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportRow<'a> {
    #[serde(rename = "_id")]
    id: &'a str,
    amount: f64,
    category: &'a str,
    subcategory: Option<&'a str>,
    #[serde(rename = "type")]
    entry_type: &'static str,
    payment_method: &'a str,
    date: String,
    description: Option<&'a str>,
}

impl<'a> From<&'a Entry> for ExportRow<'a> {
    fn from(entry: &'a Entry) -> Self {
        ExportRow {
            id: &entry.id,
            amount: entry.amount,
            category: &entry.category,
            subcategory: entry.subcategory.as_deref(),
            entry_type: entry.entry_type.as_str(),
            payment_method: &entry.payment_method,
            date: entry.date.format("%Y-%m-%d").to_string(),
            description: entry.description.as_deref(),
        }
    }
}

// ============================================================================
// READ / WRITE
// ============================================================================

const EXPORT_HEADERS: [&str; 8] = [
    "_id",
    "amount",
    "category",
    "subcategory",
    "type",
    "paymentMethod",
    "date",
    "description",
];

/// One CSV record and the file line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRow {
    /// 1-based, counting the header as line 1
    pub line: u64,
    pub entry: NewEntry,
}

pub fn read_entries<R: io::Read>(reader: R) -> Result<Vec<CsvRow>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers().context("Failed to read CSV header")?.clone();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.context("Failed to read CSV record")?;
        let line = record.position().map_or(0, |pos| pos.line());
        let row: ImportRow = record
            .deserialize(Some(&headers))
            .with_context(|| format!("Failed to read CSV row at line {}", line))?;
        rows.push(CsvRow {
            line,
            entry: NewEntry::from(row),
        });
    }

    Ok(rows)
}

pub fn load_csv(csv_path: &Path) -> Result<Vec<CsvRow>> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open CSV file {}", csv_path.display()))?;
    read_entries(file)
}

/// Write the header row, then one row per entry. An empty slice still
/// produces a header, usable as an import template.
pub fn write_entries<W: io::Write>(writer: W, entries: &[Entry]) -> Result<usize> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(EXPORT_HEADERS)
        .context("Failed to write CSV header")?;
    for entry in entries {
        wtr.serialize(ExportRow::from(entry))
            .with_context(|| format!("Failed to write entry {}", entry.id))?;
    }
    wtr.flush().context("Failed to flush CSV output")?;

    Ok(entries.len())
}

pub fn export_csv(csv_path: &Path, entries: &[Entry]) -> Result<usize> {
    let file = std::fs::File::create(csv_path)
        .with_context(|| format!("Failed to create CSV file {}", csv_path.display()))?;
    write_entries(file, entries)
}

// ============================================================================
// IMPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    /// Line the record starts on, as in [`CsvRow::line`]
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: Vec<Entry>,
    pub skipped: Vec<SkippedRow>,
}

/// Create every row through the service. Rows failing validation are skipped
/// and reported; any other store failure aborts the import.
pub fn import_entries(service: &EntryService, rows: &[CsvRow]) -> Result<ImportReport> {
    let mut report = ImportReport::default();

    for row in rows {
        let line = row.line;
        match service.create(&row.entry) {
            Ok(entry) => report.imported.push(entry),
            Err(err @ StoreError::Validation(_)) => {
                tracing::warn!(line, error = %err, "skipping invalid row");
                report.skipped.push(SkippedRow {
                    line,
                    reason: err.to_string(),
                });
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Import aborted at line {}", line));
            }
        }
    }

    Ok(report)
}
