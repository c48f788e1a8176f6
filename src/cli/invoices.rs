use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::{open_db, HeaderArgs, LineArgs};
use crate::error::Result;
use crate::fmt::{money, percent};
use crate::invoices;
use crate::models::{InvoiceFilter, InvoiceHeader, InvoiceTotals, LineInput};
use crate::totals::is_passive;

impl From<HeaderArgs> for InvoiceHeader {
    fn from(a: HeaderArgs) -> Self {
        InvoiceHeader {
            direction: a.direction,
            status: a.status,
            counterparty_id: a.counterparty,
            number: a.number,
            year: a.year,
            issue_date: a.issue_date,
            due_date: a.due_date,
            notes: a.notes,
        }
    }
}

impl From<LineArgs> for LineInput {
    fn from(a: LineArgs) -> Self {
        LineInput {
            description: a.description,
            net_amount: a.net,
            vat_code: a.vat,
            account_code: a.account,
            withholding_code: a.withholding,
        }
    }
}

fn amount_cell(val: rust_decimal::Decimal) -> Cell {
    Cell::new(money(val)).set_alignment(CellAlignment::Right)
}

pub fn create(header: HeaderArgs) -> Result<()> {
    let conn = open_db()?;
    let header: InvoiceHeader = header.into();
    let id = invoices::create(&conn, &header)?;
    println!("Created invoice #{id} ({} {}/{})", header.direction.to_uppercase(), header.number, header.year);
    Ok(())
}

pub fn edit(id: i64, header: HeaderArgs) -> Result<()> {
    let conn = open_db()?;
    invoices::update_header(&conn, id, &header.into())?;
    println!("Updated invoice #{id}");
    Ok(())
}

pub fn list(filter: InvoiceFilter) -> Result<()> {
    let conn = open_db()?;
    let found = invoices::search(&conn, &filter)?;
    let totals = invoices::totals_for(&conn, &found)?;

    let mut table = Table::new();
    table.set_header(vec![
        "ID", "Dir", "Number", "Date", "Counterparty", "Status", "Net", "VAT", "Gross", "Payable",
    ]);
    for inv in &found {
        let t = totals.get(&inv.id).copied().unwrap_or_default();
        table.add_row(vec![
            Cell::new(inv.id),
            Cell::new(&inv.direction),
            Cell::new(format!("{}/{}", inv.number, inv.year)),
            Cell::new(inv.issue_date),
            Cell::new(&inv.counterparty_name),
            Cell::new(&inv.status),
            amount_cell(t.net_total),
            amount_cell(t.vat_total),
            amount_cell(t.gross_total),
            amount_cell(t.payable_total),
        ]);
    }
    println!("Invoices ({})\n{table}", found.len());
    Ok(())
}

pub fn show(id: i64) -> Result<()> {
    let conn = open_db()?;
    let inv = invoices::get(&conn, id)?;
    let lines = invoices::lines(&conn, id)?;
    let totals = invoices::totals(&conn, &inv)?;

    let side = if is_passive(&inv.direction) { "purchase" } else { "sales" };
    println!(
        "{} {}/{} ({side}, {})",
        "Invoice".bold(),
        inv.number,
        inv.year,
        inv.status
    );
    println!("Counterparty: {} (#{})", inv.counterparty_name, inv.counterparty_id);
    println!("Issued:       {}", inv.issue_date);
    if let Some(due) = inv.due_date {
        println!("Due:          {due}");
    }
    if let Some(notes) = &inv.notes {
        println!("Notes:        {notes}");
    }

    let mut table = Table::new();
    table.set_header(vec!["Line", "Description", "Account", "Net", "VAT", "Withholding"]);
    for line in &lines {
        let vat = line
            .vat
            .as_ref()
            .map(|v| format!("{} ({})", v.code, percent(v.rate)))
            .unwrap_or_default();
        let wt = line
            .withholding
            .as_ref()
            .map(|w| format!("{} ({})", w.code, percent(w.rate)))
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(line.id),
            Cell::new(&line.description),
            Cell::new(line.account_code.as_deref().unwrap_or_default()),
            amount_cell(line.net_amount.unwrap_or_default()),
            Cell::new(vat),
            Cell::new(wt),
        ]);
    }
    println!("{table}");
    print_totals(&totals, is_passive(&inv.direction));
    Ok(())
}

fn print_totals(t: &InvoiceTotals, passive: bool) {
    let mut table = Table::new();
    table.add_row(vec![Cell::new("Net"), amount_cell(t.net_total)]);
    table.add_row(vec![Cell::new("VAT"), amount_cell(t.vat_total)]);
    table.add_row(vec![Cell::new("Gross"), amount_cell(t.gross_total)]);
    let wt_label = if passive { "Withholding" } else { "Withholding (informational)" };
    table.add_row(vec![Cell::new(wt_label), amount_cell(t.withholding_total)]);
    table.add_row(vec![Cell::new("Payable".bold()), amount_cell(t.payable_total)]);
    println!("{table}");
}

pub fn delete(id: i64) -> Result<()> {
    let conn = open_db()?;
    invoices::delete(&conn, id)?;
    println!("Deleted invoice #{id}");
    Ok(())
}

pub fn add_line(id: i64, line: LineArgs) -> Result<()> {
    let conn = open_db()?;
    let line_id = invoices::add_line(&conn, id, &line.into())?;
    println!("Added line #{line_id} to invoice #{id}");
    Ok(())
}

pub fn update_line(id: i64, line_id: i64, line: LineArgs) -> Result<()> {
    let conn = open_db()?;
    invoices::update_line(&conn, id, line_id, &line.into())?;
    println!("Updated line #{line_id} of invoice #{id}");
    Ok(())
}

pub fn delete_line(id: i64, line_id: i64) -> Result<()> {
    let conn = open_db()?;
    invoices::delete_line(&conn, id, line_id)?;
    println!("Deleted line #{line_id} from invoice #{id}");
    Ok(())
}
