pub mod counterparties;
pub mod dict;
pub mod import;
pub mod init;
pub mod invoices;

use std::str::FromStr;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use rust_decimal::Decimal;
use tracing_subscriber::filter::LevelFilter;

use crate::db::get_connection;
use crate::error::{ContiError, Result};
use crate::row_parser::{parse_date_dmy, parse_date_iso, parse_decimal};
use crate::settings::load_settings;

/// Opens the database named by the current settings.
pub(crate) fn open_db() -> Result<Connection> {
    let db_path = load_settings().db_path();
    if !db_path.exists() {
        return Err(ContiError::Settings(format!(
            "No database found at {}\nRun `conti init` first.",
            db_path.display()
        )));
    }
    get_connection(&db_path)
}

/// Accepts `2024-03-01` or `1/3/2024`.
pub(crate) fn parse_date_arg(s: &str) -> std::result::Result<NaiveDate, String> {
    parse_date_iso(s)
        .or_else(|| parse_date_dmy(s))
        .ok_or_else(|| format!("invalid date: {s}"))
}

/// Accepts `19.90` or `19,90`.
pub(crate) fn parse_amount_arg(s: &str) -> std::result::Result<Decimal, String> {
    parse_decimal(s).ok_or_else(|| format!("invalid amount: {s}"))
}

fn parse_level(s: &str) -> std::result::Result<LevelFilter, String> {
    LevelFilter::from_str(s).map_err(|e| e.to_string())
}

#[derive(Parser)]
#[command(name = "conti", about = "Invoices and bookkeeping dictionaries.")]
pub struct Cli {
    /// Log level when RUST_LOG is not set: off, error, warn, info, debug, trace
    #[arg(long = "log-level", global = true, default_value = "warn", value_parser = parse_level)]
    pub log_level: LevelFilter,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for conti data (default: ~/Documents/conti)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Import dictionaries (accounts, VAT codes, withholding types) from XLSX files.
    Import {
        /// Directory holding the workbooks (default: from settings)
        #[arg(long)]
        dir: Option<String>,
        /// Import only one dictionary: accounts, vat, withholding
        #[arg(long)]
        only: Option<String>,
    },
    /// List imported dictionaries.
    Dict {
        #[command(subcommand)]
        command: DictCommands,
    },
    /// Manage customers and suppliers.
    Counterparties {
        #[command(subcommand)]
        command: CounterpartyCommands,
    },
    /// Manage invoices and their lines.
    Invoices {
        #[command(subcommand)]
        command: InvoiceCommands,
    },
}

#[derive(Subcommand)]
pub enum DictCommands {
    /// Chart of accounts.
    Accounts,
    /// VAT codes.
    Vat,
    /// Withholding types.
    Withholding,
}

#[derive(clap::Args, Clone)]
pub struct CounterpartyArgs {
    pub name: String,
    /// CUSTOMER or SUPPLIER
    #[arg(long)]
    pub kind: String,
    #[arg(long = "vat-number")]
    pub vat_number: Option<String>,
    #[arg(long = "tax-code")]
    pub tax_code: Option<String>,
    #[arg(long)]
    pub pec: Option<String>,
    #[arg(long = "sdi-code")]
    pub sdi_code: Option<String>,
    #[arg(long)]
    pub iban: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Subcommand)]
pub enum CounterpartyCommands {
    /// Add a counterparty.
    Add(CounterpartyArgs),
    /// Replace a counterparty's details.
    Edit {
        id: i64,
        #[command(flatten)]
        details: CounterpartyArgs,
    },
    /// List counterparties, optionally filtered by name.
    List {
        #[arg(long)]
        q: Option<String>,
    },
    /// Delete a counterparty with no invoices.
    Delete { id: i64 },
}

#[derive(clap::Args, Clone)]
pub struct HeaderArgs {
    /// ACTIVE (sales) or PASSIVE (purchase)
    #[arg(long)]
    pub direction: String,
    /// DRAFT, REGISTERED or PAID
    #[arg(long, default_value = "DRAFT")]
    pub status: String,
    /// Counterparty ID (shown in `conti counterparties list`)
    #[arg(long)]
    pub counterparty: i64,
    #[arg(long)]
    pub number: String,
    #[arg(long)]
    pub year: i32,
    #[arg(long = "issue-date", value_parser = parse_date_arg)]
    pub issue_date: NaiveDate,
    #[arg(long = "due-date", value_parser = parse_date_arg)]
    pub due_date: Option<NaiveDate>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Clone)]
pub struct LineArgs {
    #[arg(long)]
    pub description: String,
    /// Net amount, e.g. 1000.00 or 1000,00
    #[arg(long, value_parser = parse_amount_arg)]
    pub net: Decimal,
    /// VAT code
    #[arg(long)]
    pub vat: Option<String>,
    /// Chart of accounts code
    #[arg(long)]
    pub account: Option<String>,
    /// Withholding type code
    #[arg(long)]
    pub withholding: Option<String>,
}

#[derive(Subcommand)]
pub enum InvoiceCommands {
    /// Create an invoice header.
    New(HeaderArgs),
    /// Replace an invoice header.
    Edit {
        id: i64,
        #[command(flatten)]
        header: HeaderArgs,
    },
    /// List invoices with their totals.
    List {
        #[arg(long)]
        direction: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        counterparty: Option<i64>,
        #[arg(long = "from", value_parser = parse_date_arg)]
        from: Option<NaiveDate>,
        #[arg(long = "to", value_parser = parse_date_arg)]
        to: Option<NaiveDate>,
        /// Matches the invoice number, or the year when numeric
        #[arg(long)]
        q: Option<String>,
    },
    /// Show an invoice, its lines and totals.
    Show { id: i64 },
    /// Delete an invoice and its lines.
    Delete { id: i64 },
    /// Add a line to an invoice.
    AddLine {
        id: i64,
        #[command(flatten)]
        line: LineArgs,
    },
    /// Replace a line of an invoice.
    UpdateLine {
        id: i64,
        line_id: i64,
        #[command(flatten)]
        line: LineArgs,
    },
    /// Remove a line from an invoice.
    DeleteLine { id: i64, line_id: i64 },
}
