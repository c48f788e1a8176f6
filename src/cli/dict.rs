use comfy_table::{Cell, Table};

use crate::cli::open_db;
use crate::dictionaries::{list_accounts, list_vat_codes, list_withholding_types};
use crate::error::Result;
use crate::fmt::percent;

fn flag(b: bool) -> &'static str {
    if b {
        "✓"
    } else {
        ""
    }
}

pub fn accounts() -> Result<()> {
    let conn = open_db()?;
    let mut table = Table::new();
    table.set_header(vec!["Code", "Description", "Level", "Active"]);
    for acc in list_accounts(&conn)? {
        // indent by hierarchy depth
        let indent = "  ".repeat(acc.level.saturating_sub(1));
        table.add_row(vec![
            Cell::new(format!("{indent}{}", acc.code)),
            Cell::new(acc.description),
            Cell::new(acc.level),
            Cell::new(flag(acc.active)),
        ]);
    }
    println!("Chart of accounts\n{table}");
    Ok(())
}

pub fn vat() -> Result<()> {
    let conn = open_db()?;
    let mut table = Table::new();
    table.set_header(vec![
        "Code", "Rate", "Description", "Purchases", "Sales", "Receipts", "Reverse charge", "Nature (P/S)",
    ]);
    for v in list_vat_codes(&conn)? {
        let nature = match (&v.custom_nature_purchases, &v.custom_nature_sales) {
            (None, None) => String::new(),
            (p, s) => format!(
                "{}/{}",
                p.as_deref().unwrap_or("-"),
                s.as_deref().unwrap_or("-")
            ),
        };
        table.add_row(vec![
            Cell::new(&v.code),
            Cell::new(percent(v.rate)),
            Cell::new(v.registry_description.as_deref().unwrap_or_default()),
            Cell::new(flag(v.use_purchases)),
            Cell::new(flag(v.use_sales)),
            Cell::new(flag(v.use_receipts)),
            Cell::new(flag(v.reverse_charge_relevant)),
            Cell::new(nature),
        ]);
    }
    println!("VAT codes\n{table}");
    Ok(())
}

pub fn withholding() -> Result<()> {
    let conn = open_db()?;
    let mut table = Table::new();
    table.set_header(vec![
        "Code", "Description", "Rate", "Taxable", "Tribute", "Effective from", "Short rent",
    ]);
    for w in list_withholding_types(&conn)? {
        table.add_row(vec![
            Cell::new(&w.code),
            Cell::new(w.description.as_deref().unwrap_or_default()),
            Cell::new(percent(w.rate)),
            Cell::new(percent(w.taxable_percent)),
            Cell::new(w.tribute_code.as_deref().unwrap_or_default()),
            Cell::new(w.effective_from.map(|d| d.to_string()).unwrap_or_default()),
            Cell::new(flag(w.short_rent)),
        ]);
    }
    println!("Withholding types\n{table}");
    Ok(())
}
