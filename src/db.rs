use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::error::Result;

pub const DB_FILE: &str = "conti.db";

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL,
    level INTEGER,
    active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS vat_codes (
    id INTEGER PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    rate TEXT,
    registry_description TEXT,
    long_description TEXT,
    operation_type TEXT,
    category TEXT,
    use_purchases INTEGER NOT NULL DEFAULT 1,
    use_sales INTEGER NOT NULL DEFAULT 1,
    use_receipts INTEGER NOT NULL DEFAULT 1,
    vat_edf_code TEXT,
    vat_grouping TEXT,
    custom_nature_purchases TEXT,
    custom_nature_sales TEXT,
    stamp_duty_applicable INTEGER NOT NULL DEFAULT 0,
    reverse_charge_relevant INTEGER NOT NULL DEFAULT 0,
    agri_comp_rate TEXT,
    notes TEXT,
    external_code TEXT,
    validity TEXT
);

CREATE TABLE IF NOT EXISTS withholding_types (
    id INTEGER PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    description TEXT,
    category TEXT,
    effective_from TEXT,
    rate TEXT,
    taxable_percent TEXT,
    tribute_code TEXT,
    tribute_description TEXT,
    due_date TEXT,
    due_date_description TEXT,
    short_rent INTEGER NOT NULL DEFAULT 0,
    long_description TEXT
);

CREATE TABLE IF NOT EXISTS dictionary_imports (
    id INTEGER PRIMARY KEY,
    dictionary TEXT NOT NULL,
    filename TEXT NOT NULL,
    checksum TEXT NOT NULL,
    processed INTEGER NOT NULL,
    skipped INTEGER NOT NULL,
    imported_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS counterparty_kinds (
    id INTEGER PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS counterparties (
    id INTEGER PRIMARY KEY,
    kind_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    vat_number TEXT,
    tax_code TEXT,
    pec TEXT,
    sdi_code TEXT,
    iban TEXT,
    notes TEXT,
    FOREIGN KEY (kind_id) REFERENCES counterparty_kinds(id)
);

CREATE TABLE IF NOT EXISTS invoice_directions (
    id INTEGER PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS invoice_statuses (
    id INTEGER PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS invoices (
    id INTEGER PRIMARY KEY,
    direction_id INTEGER NOT NULL,
    status_id INTEGER NOT NULL,
    counterparty_id INTEGER NOT NULL,
    number TEXT NOT NULL,
    year INTEGER NOT NULL,
    issue_date TEXT NOT NULL,
    due_date TEXT,
    notes TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),
    UNIQUE (direction_id, number, year),
    FOREIGN KEY (direction_id) REFERENCES invoice_directions(id),
    FOREIGN KEY (status_id) REFERENCES invoice_statuses(id),
    FOREIGN KEY (counterparty_id) REFERENCES counterparties(id)
);

CREATE TABLE IF NOT EXISTS invoice_lines (
    id INTEGER PRIMARY KEY,
    invoice_id INTEGER NOT NULL,
    description TEXT NOT NULL,
    net_amount TEXT NOT NULL,
    vat_code_id INTEGER,
    account_id INTEGER,
    withholding_type_id INTEGER,
    FOREIGN KEY (invoice_id) REFERENCES invoices(id) ON DELETE CASCADE,
    FOREIGN KEY (vat_code_id) REFERENCES vat_codes(id),
    FOREIGN KEY (account_id) REFERENCES accounts(id),
    FOREIGN KEY (withholding_type_id) REFERENCES withholding_types(id)
);
";

const DEFAULT_DIRECTIONS: &[(&str, &str)] = &[
    ("ACTIVE", "Sales invoice (issued)"),
    ("PASSIVE", "Purchase invoice (received)"),
];

const DEFAULT_STATUSES: &[(&str, &str)] = &[
    ("DRAFT", "Draft"),
    ("REGISTERED", "Registered"),
    ("PAID", "Paid"),
];

const DEFAULT_COUNTERPARTY_KINDS: &[(&str, &str)] = &[
    ("CUSTOMER", "Customer"),
    ("SUPPLIER", "Supplier"),
];

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    seed(conn, "invoice_directions", DEFAULT_DIRECTIONS)?;
    seed(conn, "invoice_statuses", DEFAULT_STATUSES)?;
    seed(conn, "counterparty_kinds", DEFAULT_COUNTERPARTY_KINDS)?;
    Ok(())
}

fn seed(conn: &Connection, table: &str, rows: &[(&str, &str)]) -> Result<()> {
    let sql = format!("INSERT OR IGNORE INTO {table} (code, description) VALUES (?1, ?2)");
    for (code, description) in rows {
        conn.execute(&sql, rusqlite::params![code, description])?;
    }
    Ok(())
}

/// Id of a seeded lookup row (`invoice_directions`, `invoice_statuses`, ...) by
/// case-insensitive code.
pub fn lookup_id(conn: &Connection, table: &str, code: &str) -> Result<Option<i64>> {
    let sql = format!("SELECT id FROM {table} WHERE upper(code) = upper(?1)");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([code.trim()])?;
    match rows.next()? {
        Some(row) => Ok(Some(row.get(0)?)),
        None => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Column helpers: decimals are stored as TEXT, dates as ISO TEXT
// ---------------------------------------------------------------------------

pub fn decimal_to_sql(value: Option<Decimal>) -> Option<String> {
    value.map(|d| d.to_string())
}

pub fn date_to_sql(value: Option<NaiveDate>) -> Option<String> {
    value.map(|d| d.format("%Y-%m-%d").to_string())
}

pub fn decimal_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        Decimal::from_str(&s)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

pub fn date_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}
