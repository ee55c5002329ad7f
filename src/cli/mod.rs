pub mod demo;
pub mod expenses;
pub mod import;
pub mod init;
pub mod report;
pub mod settle;
pub mod status;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tracing_subscriber::filter::LevelFilter;

use crate::db::{get_connection, list_expenses, list_settlements};
use crate::error::{Result, TandemError};
use crate::models::{Expense, Partner, Partners, Settlement};
use crate::settings::{db_path, load_settings, Settings};
use crate::validate::{parse_date, validate_expenses, validate_settlements};

#[derive(Parser)]
#[command(name = "tandem", about = "Shared expense ledger and balance reconciliation for two partners.")]
pub struct Cli {
    /// Logging verbosity: off, error, warn, info, debug, trace. RUST_LOG overrides it.
    #[arg(long = "log-level", global = true, default_value_t = LevelFilter::WARN)]
    pub log_level: LevelFilter,

    /// Print reports as JSON instead of tables.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up tandem: choose a data directory, name the partners, create the database.
    Init {
        /// Path for tandem data (default: ~/Documents/tandem)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Identifier of the first partner
        #[arg(long = "partner-a")]
        partner_a: Option<String>,
        /// Identifier of the second partner
        #[arg(long = "partner-b")]
        partner_b: Option<String>,
        /// Currency symbol used when printing amounts
        #[arg(long)]
        currency: Option<String>,
    },
    /// Record, edit and remove shared expenses.
    Expense {
        #[command(subcommand)]
        command: ExpenseCommands,
    },
    /// Record and remove settlements between the partners.
    Settle {
        #[command(subcommand)]
        command: SettleCommands,
    },
    /// Import expenses from a CSV file (date, amount, category, paid_by[, description]).
    Import {
        /// Path to CSV file
        file: String,
    },
    /// Load sample expenses and settlements to explore tandem.
    Demo,
    /// Show current database and summary statistics.
    Status,
    /// Balance and analytics reports.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
}

#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Add an expense.
    Add {
        /// Amount spent
        amount: f64,
        #[arg(long)]
        category: String,
        /// Partner id of the payer
        #[arg(long = "paid-by")]
        paid_by: String,
        /// Date: YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// List all expenses.
    List,
    /// Replace every field of an existing expense.
    Update {
        /// Expense ID (shown in `tandem expense list`)
        id: i64,
        amount: f64,
        #[arg(long)]
        category: String,
        #[arg(long = "paid-by")]
        paid_by: String,
        #[arg(long)]
        date: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete an expense by ID.
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum SettleCommands {
    /// Record a payment from one partner to the other.
    Add {
        amount: f64,
        /// Paying partner id
        #[arg(long)]
        from: String,
        /// Receiving partner id
        #[arg(long)]
        to: String,
        /// Date: YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// List all settlements.
    List,
    /// Delete a settlement by ID.
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Who owes whom under a 50/50 split.
    Balance,
    /// Spending per month (or per ISO week).
    Monthly {
        /// Bucket by ISO week instead of month
        #[arg(long)]
        week: bool,
        /// Start date: YYYY-MM-DD
        #[arg(long = "from")]
        from_date: Option<String>,
        /// End date: YYYY-MM-DD
        #[arg(long = "to")]
        to_date: Option<String>,
        /// Only these categories (repeatable)
        #[arg(long = "category")]
        categories: Vec<String>,
        /// Only expenses paid by these partners (repeatable)
        #[arg(long = "partner")]
        partners: Vec<String>,
    },
    /// Spending per category with share of total.
    Categories,
    /// Running balance replayed over expenses and settlements.
    History,
    /// Category spending in the last N days against the N days before.
    Compare {
        /// Window length in days (default from settings)
        #[arg(long)]
        days: Option<u32>,
    },
    /// Each partner's spending per month (or per ISO week).
    Users {
        #[arg(long)]
        week: bool,
    },
    /// Spending by weekday and hour.
    Patterns {
        /// Collapse hours into night/morning/afternoon/evening
        #[arg(long)]
        blocks: bool,
    },
    /// Largest categories with their recent trend.
    Top {
        #[arg(short = 'n', long = "limit", default_value = "5")]
        limit: usize,
        #[arg(long)]
        days: Option<u32>,
    },
}

/// Validated records plus the settings needed to interpret them.
pub(crate) struct Ledger {
    pub settings: Settings,
    pub expenses: Vec<Expense>,
    pub settlements: Vec<Settlement>,
}

pub(crate) fn open_db(settings: &Settings) -> Result<Connection> {
    let path = db_path(settings);
    if !path.exists() {
        return Err(TandemError::Other(
            "No database found. Run `tandem init` first.".to_string(),
        ));
    }
    get_connection(&path)
}

pub(crate) fn load_ledger() -> Result<Ledger> {
    let settings = load_settings();
    let conn = open_db(&settings)?;
    let expenses = validate_expenses(&list_expenses(&conn)?, &settings.partners);
    let settlements = validate_settlements(&list_settlements(&conn)?, &settings.partners);
    tracing::debug!(expenses = expenses.len(), settlements = settlements.len(), "ledger loaded");
    Ok(Ledger {
        settings,
        expenses,
        settlements,
    })
}

pub(crate) fn resolve_partner(partners: &Partners, id: &str) -> Result<Partner> {
    partners
        .resolve(id)
        .ok_or_else(|| TandemError::UnknownPartner(id.to_string()))
}

pub(crate) fn parse_date_arg(raw: &str) -> Result<NaiveDate> {
    parse_date(raw).ok_or_else(|| TandemError::InvalidInput(format!("not a date: {raw}")))
}

pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub(crate) fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
