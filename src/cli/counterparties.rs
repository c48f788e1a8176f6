use comfy_table::{Cell, Table};

use crate::cli::{open_db, CounterpartyArgs};
use crate::counterparties;
use crate::error::Result;
use crate::models::Counterparty;

impl From<CounterpartyArgs> for Counterparty {
    fn from(a: CounterpartyArgs) -> Self {
        Counterparty {
            id: None,
            kind: a.kind,
            name: a.name,
            vat_number: a.vat_number,
            tax_code: a.tax_code,
            pec: a.pec,
            sdi_code: a.sdi_code,
            iban: a.iban,
            notes: a.notes,
        }
    }
}

pub fn add(details: CounterpartyArgs) -> Result<()> {
    let conn = open_db()?;
    let cp: Counterparty = details.into();
    let id = counterparties::add(&conn, &cp)?;
    println!("Added counterparty #{id}: {}", cp.name);
    Ok(())
}

pub fn edit(id: i64, details: CounterpartyArgs) -> Result<()> {
    let conn = open_db()?;
    counterparties::update(&conn, id, &details.into())?;
    println!("Updated counterparty #{id}");
    Ok(())
}

pub fn list(q: Option<&str>) -> Result<()> {
    let conn = open_db()?;
    let mut table = Table::new();
    table.set_header(vec!["ID", "Kind", "Name", "VAT number", "Tax code", "SDI", "PEC"]);
    for cp in counterparties::search(&conn, q)? {
        table.add_row(vec![
            Cell::new(cp.id.unwrap_or_default()),
            Cell::new(cp.kind),
            Cell::new(cp.name),
            Cell::new(cp.vat_number.unwrap_or_default()),
            Cell::new(cp.tax_code.unwrap_or_default()),
            Cell::new(cp.sdi_code.unwrap_or_default()),
            Cell::new(cp.pec.unwrap_or_default()),
        ]);
    }
    println!("Counterparties\n{table}");
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let conn = open_db()?;
    counterparties::delete(&conn, id)?;
    println!("Deleted counterparty #{id}");
    Ok(())
}
