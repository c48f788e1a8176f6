use rusqlite::{params, Connection};

use crate::db::{date_column, date_to_sql, decimal_column, decimal_to_sql};
use crate::error::Result;
use crate::models::{AccountRecord, VatCodeRecord, WithholdingTypeRecord};

/// Keyed insert-or-overwrite of normalized dictionary records.
///
/// An upsert replaces every mapped field of an existing record, including with
/// blanks. Each call must be atomic on its own.
pub trait DictionarySink {
    fn upsert_account(&mut self, record: &AccountRecord) -> Result<()>;
    fn upsert_vat_code(&mut self, record: &VatCodeRecord) -> Result<()>;
    fn upsert_withholding_type(&mut self, record: &WithholdingTypeRecord) -> Result<()>;
}

impl DictionarySink for Connection {
    fn upsert_account(&mut self, r: &AccountRecord) -> Result<()> {
        self.execute(
            "INSERT INTO accounts (code, description, level, active) VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(code) DO UPDATE SET \
               description = excluded.description, \
               level = excluded.level, \
               active = excluded.active",
            params![r.code, r.description, r.level as i64, r.active],
        )?;
        Ok(())
    }

    fn upsert_vat_code(&mut self, r: &VatCodeRecord) -> Result<()> {
        self.execute(
            "INSERT INTO vat_codes (
               code, rate, registry_description, long_description, operation_type, category,
               use_purchases, use_sales, use_receipts,
               vat_edf_code, vat_grouping,
               custom_nature_purchases, custom_nature_sales,
               stamp_duty_applicable, reverse_charge_relevant,
               agri_comp_rate, notes, external_code, validity
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
             ON CONFLICT(code) DO UPDATE SET
               rate = excluded.rate,
               registry_description = excluded.registry_description,
               long_description = excluded.long_description,
               operation_type = excluded.operation_type,
               category = excluded.category,
               use_purchases = excluded.use_purchases,
               use_sales = excluded.use_sales,
               use_receipts = excluded.use_receipts,
               vat_edf_code = excluded.vat_edf_code,
               vat_grouping = excluded.vat_grouping,
               custom_nature_purchases = excluded.custom_nature_purchases,
               custom_nature_sales = excluded.custom_nature_sales,
               stamp_duty_applicable = excluded.stamp_duty_applicable,
               reverse_charge_relevant = excluded.reverse_charge_relevant,
               agri_comp_rate = excluded.agri_comp_rate,
               notes = excluded.notes,
               external_code = excluded.external_code,
               validity = excluded.validity",
            params![
                r.code,
                decimal_to_sql(r.rate),
                r.registry_description,
                r.long_description,
                r.operation_type,
                r.category,
                r.use_purchases,
                r.use_sales,
                r.use_receipts,
                r.vat_edf_code,
                r.vat_grouping,
                r.custom_nature_purchases,
                r.custom_nature_sales,
                r.stamp_duty_applicable,
                r.reverse_charge_relevant,
                decimal_to_sql(r.agri_comp_rate),
                r.notes,
                r.external_code,
                r.validity,
            ],
        )?;
        Ok(())
    }

    fn upsert_withholding_type(&mut self, r: &WithholdingTypeRecord) -> Result<()> {
        self.execute(
            "INSERT INTO withholding_types (
               code, description, category, effective_from,
               rate, taxable_percent,
               tribute_code, tribute_description,
               due_date, due_date_description,
               short_rent, long_description
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(code) DO UPDATE SET
               description = excluded.description,
               category = excluded.category,
               effective_from = excluded.effective_from,
               rate = excluded.rate,
               taxable_percent = excluded.taxable_percent,
               tribute_code = excluded.tribute_code,
               tribute_description = excluded.tribute_description,
               due_date = excluded.due_date,
               due_date_description = excluded.due_date_description,
               short_rent = excluded.short_rent,
               long_description = excluded.long_description",
            params![
                r.code,
                r.description,
                r.category,
                date_to_sql(r.effective_from),
                decimal_to_sql(r.rate),
                decimal_to_sql(r.taxable_percent),
                r.tribute_code,
                r.tribute_description,
                date_to_sql(r.due_date),
                r.due_date_description,
                r.short_rent,
                r.long_description,
            ],
        )?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

const ACCOUNT_COLUMNS: &str = "code, description, level, active";

const VAT_COLUMNS: &str = "code, rate, registry_description, long_description, operation_type, \
    category, use_purchases, use_sales, use_receipts, vat_edf_code, vat_grouping, \
    custom_nature_purchases, custom_nature_sales, stamp_duty_applicable, \
    reverse_charge_relevant, agri_comp_rate, notes, external_code, validity";

const WITHHOLDING_COLUMNS: &str = "code, description, category, effective_from, rate, \
    taxable_percent, tribute_code, tribute_description, due_date, due_date_description, \
    short_rent, long_description";

fn account_from_row(row: &rusqlite::Row) -> rusqlite::Result<AccountRecord> {
    let level: Option<i64> = row.get(2)?;
    Ok(AccountRecord {
        code: row.get(0)?,
        description: row.get(1)?,
        level: level.unwrap_or(0) as usize,
        active: row.get(3)?,
    })
}

fn vat_code_from_row(row: &rusqlite::Row) -> rusqlite::Result<VatCodeRecord> {
    Ok(VatCodeRecord {
        code: row.get(0)?,
        rate: decimal_column(row, 1)?,
        registry_description: row.get(2)?,
        long_description: row.get(3)?,
        operation_type: row.get(4)?,
        category: row.get(5)?,
        use_purchases: row.get(6)?,
        use_sales: row.get(7)?,
        use_receipts: row.get(8)?,
        vat_edf_code: row.get(9)?,
        vat_grouping: row.get(10)?,
        custom_nature_purchases: row.get(11)?,
        custom_nature_sales: row.get(12)?,
        stamp_duty_applicable: row.get(13)?,
        reverse_charge_relevant: row.get(14)?,
        agri_comp_rate: decimal_column(row, 15)?,
        notes: row.get(16)?,
        external_code: row.get(17)?,
        validity: row.get(18)?,
    })
}

fn withholding_type_from_row(row: &rusqlite::Row) -> rusqlite::Result<WithholdingTypeRecord> {
    Ok(WithholdingTypeRecord {
        code: row.get(0)?,
        description: row.get(1)?,
        category: row.get(2)?,
        effective_from: date_column(row, 3)?,
        rate: decimal_column(row, 4)?,
        taxable_percent: decimal_column(row, 5)?,
        tribute_code: row.get(6)?,
        tribute_description: row.get(7)?,
        due_date: date_column(row, 8)?,
        due_date_description: row.get(9)?,
        short_rent: row.get(10)?,
        long_description: row.get(11)?,
    })
}

pub fn list_accounts(conn: &Connection) -> Result<Vec<AccountRecord>> {
    let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY code");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], account_from_row)?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

pub fn list_vat_codes(conn: &Connection) -> Result<Vec<VatCodeRecord>> {
    let sql = format!("SELECT {VAT_COLUMNS} FROM vat_codes ORDER BY code");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], vat_code_from_row)?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

pub fn list_withholding_types(conn: &Connection) -> Result<Vec<WithholdingTypeRecord>> {
    let sql = format!("SELECT {WITHHOLDING_COLUMNS} FROM withholding_types ORDER BY code");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], withholding_type_from_row)?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

/// Row id of a dictionary entry by code; `table` is one of the three dictionary tables.
pub fn id_by_code(conn: &Connection, table: &str, code: &str) -> Result<Option<i64>> {
    let sql = format!("SELECT id FROM {table} WHERE code = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([code.trim()])?;
    match rows.next()? {
        Some(row) => Ok(Some(row.get(0)?)),
        None => Ok(None),
    }
}

pub fn record_import_run(
    conn: &Connection,
    dictionary: &str,
    filename: &str,
    checksum: &str,
    processed: usize,
    skipped: usize,
) -> Result<()> {
    conn.execute(
        "INSERT INTO dictionary_imports (dictionary, filename, checksum, processed, skipped) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![dictionary, filename, checksum, processed as i64, skipped as i64],
    )?;
    Ok(())
}
