// Expense Tracker - Command Line Client
// Record, list, edit and delete entries straight against the database file

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use expense_tracker::{
    export_csv, import_entries, load_csv, logging, Entry, EntryFilter, EntryPatch, EntryService,
    EntryStore, EntryType, NewEntry, Settings, SortConfig, SortDirection, SortKey, Totals,
};

#[derive(Parser, Debug)]
#[command(name = "expense-tracker", version, about = "Personal income and expense tracker")]
struct Cli {
    /// SQLite database file (defaults to the configured database_path)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TypeArg {
    Income,
    Expense,
}

impl From<TypeArg> for EntryType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::Income => EntryType::Income,
            TypeArg::Expense => EntryType::Expense,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a new entry
    Add(AddArgs),

    /// List entries with their totals
    List {
        #[arg(long = "type", value_enum)]
        entry_type: Option<TypeArg>,

        /// amount, category, subcategory, type, paymentMethod, date or description
        #[arg(long, default_value = "amount")]
        sort: SortKey,

        /// Sort descending
        #[arg(long)]
        desc: bool,
    },

    /// Total income, total expense and balance
    Summary,

    /// Change fields of an existing entry
    Edit {
        id: String,

        #[command(flatten)]
        fields: EditArgs,
    },

    /// Delete an entry
    Delete { id: String },

    /// Create entries from a CSV file
    Import { path: PathBuf },

    /// Write entries to a CSV file
    Export {
        path: PathBuf,

        #[arg(long = "type", value_enum)]
        entry_type: Option<TypeArg>,
    },
}

#[derive(Args, Debug)]
struct AddArgs {
    #[arg(long, allow_negative_numbers = true)]
    amount: f64,

    #[arg(long)]
    category: String,

    #[arg(long)]
    subcategory: Option<String>,

    #[arg(long = "type", value_enum)]
    entry_type: TypeArg,

    #[arg(long)]
    payment_method: String,

    /// YYYY-MM-DD, defaults to today
    #[arg(long)]
    date: Option<String>,

    #[arg(long)]
    description: Option<String>,
}

#[derive(Args, Debug)]
struct EditArgs {
    #[arg(long, allow_negative_numbers = true)]
    amount: Option<f64>,

    #[arg(long)]
    category: Option<String>,

    /// Empty string clears it
    #[arg(long)]
    subcategory: Option<String>,

    #[arg(long = "type", value_enum)]
    entry_type: Option<TypeArg>,

    #[arg(long)]
    payment_method: Option<String>,

    #[arg(long)]
    date: Option<String>,

    /// Empty string clears it
    #[arg(long)]
    description: Option<String>,
}

impl From<EditArgs> for EntryPatch {
    fn from(args: EditArgs) -> Self {
        let mut patch = EntryPatch::new();
        if let Some(amount) = args.amount {
            patch = patch.amount(amount);
        }
        if let Some(entry_type) = args.entry_type {
            patch = patch.entry_type(entry_type.into());
        }
        patch.category = args.category;
        patch.subcategory = args.subcategory;
        patch.payment_method = args.payment_method;
        patch.date = args.date;
        patch.description = args.description;
        patch
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (settings, dotenv_path) =
        Settings::load_with_dotenv().context("failed to load configuration")?;
    logging::init_tracing(if cli.verbose { "debug" } else { "warn" })?;
    if let Some(path) = dotenv_path {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    let db_path = cli.db.unwrap_or(settings.database_path);
    let store = EntryStore::open(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;
    let service = EntryService::new(store);

    match cli.command {
        Command::Add(args) => run_add(&service, args),
        Command::List {
            entry_type,
            sort,
            desc,
        } => run_list(&service, entry_type.map(EntryType::from), sort, desc),
        Command::Summary => run_summary(&service),
        Command::Edit { id, fields } => run_edit(&service, &id, fields.into()),
        Command::Delete { id } => run_delete(&service, &id),
        Command::Import { path } => run_import(&service, &path),
        Command::Export { path, entry_type } => {
            run_export(&service, &path, entry_type.map(EntryType::from))
        }
    }
}

fn list_for(service: &EntryService, entry_type: Option<EntryType>) -> Result<Vec<Entry>> {
    let entries = match entry_type {
        Some(EntryType::Income) => service.list_income()?,
        Some(EntryType::Expense) => service.list_expense()?,
        None => service.list(&EntryFilter::new())?,
    };
    Ok(entries)
}

fn run_add(service: &EntryService, args: AddArgs) -> Result<()> {
    let date = args
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive().format("%Y-%m-%d").to_string());

    let mut input = NewEntry::new(
        args.amount,
        &args.category,
        args.entry_type.into(),
        &args.payment_method,
        &date,
    );
    input.subcategory = args.subcategory;
    input.description = args.description;

    let entry = service.create(&input)?;
    println!("✓ Added {} {} ({})", entry.entry_type, format_amount(entry.amount), entry.id);

    Ok(())
}

fn run_list(
    service: &EntryService,
    entry_type: Option<EntryType>,
    sort: SortKey,
    desc: bool,
) -> Result<()> {
    let entries = list_for(service, entry_type)?;
    let direction = if desc {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    };
    let sorted = SortConfig::new(sort, direction).sort(&entries);

    if !sorted.is_empty() {
        println!("Sorted by {} ({})", sort, if desc { "descending" } else { "ascending" });
    }
    print_entries(&sorted);
    println!();
    print_totals(&Totals::from_entries(&entries), entry_type);

    Ok(())
}

fn run_summary(service: &EntryService) -> Result<()> {
    let entries = service.list(&EntryFilter::new())?;
    println!("Entries: {}", entries.len());
    print_totals(&Totals::from_entries(&entries), None);
    Ok(())
}

fn run_edit(service: &EntryService, id: &str, patch: EntryPatch) -> Result<()> {
    if patch.is_empty() {
        bail!("nothing to change: pass at least one field flag");
    }

    let entry = service.update(id, &patch)?;
    println!("✓ Updated {}", entry.id);
    print_entries(&[entry]);

    Ok(())
}

fn run_delete(service: &EntryService, id: &str) -> Result<()> {
    let entry = service.delete(id)?;
    println!("✓ Deleted {} {} ({})", entry.entry_type, format_amount(entry.amount), entry.id);
    Ok(())
}

fn run_import(service: &EntryService, path: &std::path::Path) -> Result<()> {
    let rows = load_csv(path)?;
    println!("📂 Loaded {} rows from {}", rows.len(), path.display());

    let report = import_entries(service, &rows)?;
    println!("✓ Imported: {} entries", report.imported.len());

    if !report.skipped.is_empty() {
        println!("✗ Skipped: {} rows", report.skipped.len());
        for skipped in &report.skipped {
            println!("   line {}: {}", skipped.line, skipped.reason);
        }
    }

    Ok(())
}

fn run_export(
    service: &EntryService,
    path: &std::path::Path,
    entry_type: Option<EntryType>,
) -> Result<()> {
    let entries = list_for(service, entry_type)?;
    let written = export_csv(path, &entries)?;
    println!("✓ Exported {} entries to {}", written, path.display());
    Ok(())
}

// ============================================================================
// Output
// ============================================================================

fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}

fn print_entries(entries: &[Entry]) {
    if entries.is_empty() {
        println!("No entries.");
        return;
    }

    println!(
        "{:<36}  {:<10}  {:<7}  {:>12}  {:<16}  {:<16}  {:<14}  {}",
        "ID", "DATE", "TYPE", "AMOUNT", "CATEGORY", "SUBCATEGORY", "PAYMENT", "DESCRIPTION"
    );
    for entry in entries {
        println!(
            "{:<36}  {:<10}  {:<7}  {:>12}  {:<16}  {:<16}  {:<14}  {}",
            entry.id,
            entry.date.format("%Y-%m-%d").to_string(),
            entry.entry_type.as_str(),
            format_amount(entry.amount),
            entry.category,
            entry.subcategory.as_deref().unwrap_or("-"),
            entry.payment_method,
            entry.description.as_deref().unwrap_or(""),
        );
    }
}

fn print_totals(totals: &Totals, scope: Option<EntryType>) {
    match scope {
        Some(EntryType::Income) => println!("Total Income:  {:>12}", format_amount(totals.income)),
        Some(EntryType::Expense) => {
            println!("Total Expense: {:>12}", format_amount(totals.expense))
        }
        None => {
            println!("Total Income:  {:>12}", format_amount(totals.income));
            println!("Total Expense: {:>12}", format_amount(totals.expense));
            println!("Balance:       {:>12}", format_amount(totals.balance));
        }
    }
}
