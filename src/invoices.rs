use std::collections::HashMap;

use rusqlite::types::{ToSql, Type};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

use crate::counterparties;
use crate::db::{date_column, date_to_sql, decimal_column, decimal_to_sql, lookup_id};
use crate::dictionaries::id_by_code;
use crate::error::{ContiError, Result};
use crate::models::{
    Invoice, InvoiceFilter, InvoiceHeader, InvoiceLine, InvoiceTotals, LineInput, VatRef,
    WithholdingRef,
};
use crate::totals::{compute_totals, compute_totals_for_many};

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

const SELECT_INVOICE: &str = "SELECT i.id, d.code, s.code, i.counterparty_id, c.name, i.number, i.year, \
     i.issue_date, i.due_date, i.notes \
     FROM invoices i \
     JOIN invoice_directions d ON i.direction_id = d.id \
     JOIN invoice_statuses s ON i.status_id = s.id \
     JOIN counterparties c ON i.counterparty_id = c.id";

fn invoice_from_row(row: &rusqlite::Row) -> rusqlite::Result<Invoice> {
    Ok(Invoice {
        id: row.get(0)?,
        direction: row.get(1)?,
        status: row.get(2)?,
        counterparty_id: row.get(3)?,
        counterparty_name: row.get(4)?,
        number: row.get(5)?,
        year: row.get(6)?,
        issue_date: date_column(row, 7)?
            .ok_or_else(|| rusqlite::Error::InvalidColumnType(7, "issue_date".into(), Type::Null))?,
        due_date: date_column(row, 8)?,
        notes: row.get(9)?,
    })
}

/// Resolves the header's lookup codes to row ids.
fn header_ids(conn: &Connection, h: &InvoiceHeader) -> Result<(i64, i64)> {
    let direction_id = lookup_id(conn, "invoice_directions", &h.direction)?
        .ok_or_else(|| ContiError::UnknownDirection(h.direction.clone()))?;
    let status_id = lookup_id(conn, "invoice_statuses", &h.status)?
        .ok_or_else(|| ContiError::UnknownStatus(h.status.clone()))?;
    counterparties::get(conn, h.counterparty_id)?;
    Ok((direction_id, status_id))
}

pub fn create(conn: &Connection, h: &InvoiceHeader) -> Result<i64> {
    let (direction_id, status_id) = header_ids(conn, h)?;
    conn.execute(
        "INSERT INTO invoices (direction_id, status_id, counterparty_id, number, year, issue_date, due_date, notes) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            direction_id,
            status_id,
            h.counterparty_id,
            h.number.trim(),
            h.year,
            date_to_sql(Some(h.issue_date)),
            date_to_sql(h.due_date),
            h.notes,
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(invoice = id, number = %h.number, "created invoice");
    Ok(id)
}

pub fn update_header(conn: &Connection, id: i64, h: &InvoiceHeader) -> Result<()> {
    get(conn, id)?;
    let (direction_id, status_id) = header_ids(conn, h)?;
    conn.execute(
        "UPDATE invoices SET direction_id = ?1, status_id = ?2, counterparty_id = ?3, number = ?4, \
         year = ?5, issue_date = ?6, due_date = ?7, notes = ?8, updated_at = datetime('now') \
         WHERE id = ?9",
        params![
            direction_id,
            status_id,
            h.counterparty_id,
            h.number.trim(),
            h.year,
            date_to_sql(Some(h.issue_date)),
            date_to_sql(h.due_date),
            h.notes,
            id,
        ],
    )?;
    Ok(())
}

/// Deletes the invoice together with its lines.
pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    let n = conn.execute("DELETE FROM invoices WHERE id = ?1", [id])?;
    if n == 0 {
        return Err(ContiError::InvoiceNotFound(id));
    }
    Ok(())
}

pub fn get(conn: &Connection, id: i64) -> Result<Invoice> {
    let sql = format!("{SELECT_INVOICE} WHERE i.id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query_map([id], invoice_from_row)?;
    rows.next().transpose()?.ok_or(ContiError::InvoiceNotFound(id))
}

/// Invoices matching every set filter field, newest issue date first.
///
/// `q` matches the invoice number as a case-insensitive substring, or the year
/// when it is all digits.
pub fn search(conn: &Connection, filter: &InvoiceFilter) -> Result<Vec<Invoice>> {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(direction) = filter.direction.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        values.push(Box::new(direction.to_uppercase()));
        clauses.push(format!("upper(d.code) = ?{}", values.len()));
    }
    if let Some(status) = filter.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        values.push(Box::new(status.to_uppercase()));
        clauses.push(format!("upper(s.code) = ?{}", values.len()));
    }
    if let Some(cp) = filter.counterparty_id {
        values.push(Box::new(cp));
        clauses.push(format!("i.counterparty_id = ?{}", values.len()));
    }
    if let Some(from) = filter.from {
        values.push(Box::new(date_to_sql(Some(from))));
        clauses.push(format!("i.issue_date >= ?{}", values.len()));
    }
    if let Some(to) = filter.to {
        values.push(Box::new(date_to_sql(Some(to))));
        clauses.push(format!("i.issue_date <= ?{}", values.len()));
    }
    if let Some(q) = filter.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        values.push(Box::new(format!("%{}%", q.to_lowercase())));
        let mut clause = format!("lower(i.number) LIKE ?{}", values.len());
        if q.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(year) = q.parse::<i32>() {
                values.push(Box::new(year));
                clause = format!("({clause} OR i.year = ?{})", values.len());
            }
        }
        clauses.push(clause);
    }

    let mut sql = SELECT_INVOICE.to_string();
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY i.issue_date DESC, i.id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let rows = stmt.query_map(params.as_slice(), invoice_from_row)?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

// ---------------------------------------------------------------------------
// Lines
// ---------------------------------------------------------------------------

const SELECT_LINE: &str = "SELECT l.id, l.invoice_id, l.description, l.net_amount, \
     v.code, v.rate, a.code, w.code, w.rate, w.taxable_percent \
     FROM invoice_lines l \
     LEFT JOIN vat_codes v ON l.vat_code_id = v.id \
     LEFT JOIN accounts a ON l.account_id = a.id \
     LEFT JOIN withholding_types w ON l.withholding_type_id = w.id";

fn line_from_row(row: &rusqlite::Row) -> rusqlite::Result<InvoiceLine> {
    let vat_code: Option<String> = row.get(4)?;
    let withholding_code: Option<String> = row.get(7)?;
    Ok(InvoiceLine {
        id: row.get(0)?,
        invoice_id: row.get(1)?,
        description: row.get(2)?,
        net_amount: decimal_column(row, 3)?,
        vat: match vat_code {
            Some(code) => Some(VatRef {
                code,
                rate: decimal_column(row, 5)?,
            }),
            None => None,
        },
        account_code: row.get(6)?,
        withholding: match withholding_code {
            Some(code) => Some(WithholdingRef {
                code,
                rate: decimal_column(row, 8)?,
                taxable_percent: decimal_column(row, 9)?,
            }),
            None => None,
        },
    })
}

/// Largest net amount a line may carry: 999,999,999,999,999.99.
fn max_net_amount() -> Decimal {
    Decimal::new(99_999_999_999_999_999, 2)
}

/// Resolved dictionary ids for a line: (vat code, account, withholding type).
fn line_ids(conn: &Connection, line: &LineInput) -> Result<(Option<i64>, Option<i64>, Option<i64>)> {
    if line.description.trim().is_empty() {
        return Err(ContiError::Other("line description is required".to_string()));
    }
    if line.net_amount < Decimal::new(1, 2) {
        return Err(ContiError::InvalidAmount(format!(
            "net amount must be at least 0.01, got {}",
            line.net_amount
        )));
    }
    if line.net_amount > max_net_amount() {
        return Err(ContiError::InvalidAmount(format!(
            "net amount must be at most {}, got {}",
            max_net_amount(),
            line.net_amount
        )));
    }
    let vat = match line.vat_code.as_deref() {
        Some(code) => Some(
            id_by_code(conn, "vat_codes", code)?
                .ok_or_else(|| ContiError::UnknownVatCode(code.to_string()))?,
        ),
        None => None,
    };
    let account = match line.account_code.as_deref() {
        Some(code) => Some(
            id_by_code(conn, "accounts", code)?
                .ok_or_else(|| ContiError::UnknownAccount(code.to_string()))?,
        ),
        None => None,
    };
    let withholding = match line.withholding_code.as_deref() {
        Some(code) => Some(
            id_by_code(conn, "withholding_types", code)?
                .ok_or_else(|| ContiError::UnknownWithholdingType(code.to_string()))?,
        ),
        None => None,
    };
    Ok((vat, account, withholding))
}

pub fn add_line(conn: &Connection, invoice_id: i64, line: &LineInput) -> Result<i64> {
    get(conn, invoice_id)?;
    let (vat, account, withholding) = line_ids(conn, line)?;
    conn.execute(
        "INSERT INTO invoice_lines (invoice_id, description, net_amount, vat_code_id, account_id, withholding_type_id) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            invoice_id,
            line.description.trim(),
            decimal_to_sql(Some(line.net_amount)),
            vat,
            account,
            withholding,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn owning_invoice(conn: &Connection, line_id: i64) -> Result<Option<i64>> {
    let mut stmt = conn.prepare("SELECT invoice_id FROM invoice_lines WHERE id = ?1")?;
    let mut rows = stmt.query([line_id])?;
    match rows.next()? {
        Some(row) => Ok(Some(row.get(0)?)),
        None => Ok(None),
    }
}

/// A line addressed through an invoice it does not belong to is reported as not found.
fn check_owner(conn: &Connection, invoice_id: i64, line_id: i64) -> Result<()> {
    match owning_invoice(conn, line_id)? {
        Some(owner) if owner == invoice_id => Ok(()),
        _ => Err(ContiError::LineNotFound {
            invoice_id,
            line_id,
        }),
    }
}

pub fn update_line(conn: &Connection, invoice_id: i64, line_id: i64, line: &LineInput) -> Result<()> {
    check_owner(conn, invoice_id, line_id)?;
    let (vat, account, withholding) = line_ids(conn, line)?;
    conn.execute(
        "UPDATE invoice_lines SET description = ?1, net_amount = ?2, vat_code_id = ?3, \
         account_id = ?4, withholding_type_id = ?5 WHERE id = ?6",
        params![
            line.description.trim(),
            decimal_to_sql(Some(line.net_amount)),
            vat,
            account,
            withholding,
            line_id,
        ],
    )?;
    Ok(())
}

pub fn delete_line(conn: &Connection, invoice_id: i64, line_id: i64) -> Result<()> {
    check_owner(conn, invoice_id, line_id)?;
    conn.execute("DELETE FROM invoice_lines WHERE id = ?1", [line_id])?;
    Ok(())
}

/// Lines of one invoice in insertion order.
pub fn lines(conn: &Connection, invoice_id: i64) -> Result<Vec<InvoiceLine>> {
    let sql = format!("{SELECT_LINE} WHERE l.invoice_id = ?1 ORDER BY l.id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([invoice_id], line_from_row)?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

/// Lines of several invoices in one query, ordered by line id.
pub fn lines_for(conn: &Connection, invoice_ids: &[i64]) -> Result<Vec<InvoiceLine>> {
    if invoice_ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders: Vec<String> = (1..=invoice_ids.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "{SELECT_LINE} WHERE l.invoice_id IN ({}) ORDER BY l.id",
        placeholders.join(", ")
    );
    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn ToSql> = invoice_ids.iter().map(|id| id as &dyn ToSql).collect();
    let rows = stmt.query_map(params.as_slice(), line_from_row)?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

// ---------------------------------------------------------------------------
// Totals
// ---------------------------------------------------------------------------

pub fn totals(conn: &Connection, invoice: &Invoice) -> Result<InvoiceTotals> {
    Ok(compute_totals(&invoice.direction, &lines(conn, invoice.id)?))
}

pub fn totals_for(conn: &Connection, invoices: &[Invoice]) -> Result<HashMap<i64, InvoiceTotals>> {
    if invoices.is_empty() {
        return Ok(HashMap::new());
    }
    let ids: Vec<i64> = invoices.iter().map(|i| i.id).collect();
    let all_lines = lines_for(conn, &ids)?;
    Ok(compute_totals_for_many(invoices, &all_lines))
}
