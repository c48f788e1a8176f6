use std::path::Path;

use calamine::Reader;
use sha2::{Digest, Sha256};

use crate::cell::Cell;
use crate::dictionaries::DictionarySink;
use crate::error::{ContiError, Result};
use crate::models::{AccountRecord, VatCodeRecord, WithholdingTypeRecord};
use crate::row_parser::{compute_account_level, read_boolean, read_date, read_decimal, read_string};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

/// Reads the first sheet of a workbook into data rows, skipping the header row.
///
/// Cells are placed at their absolute column index even when the used range of
/// the sheet does not start at column A.
pub fn read_first_sheet(file_path: &Path) -> Result<Vec<Vec<Cell>>> {
    let mut workbook = calamine::open_workbook_auto(file_path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ContiError::EmptyWorkbook(file_path.display().to_string()))??;

    let (first_row, first_col) = range.start().unwrap_or((0, 0));
    let mut rows = Vec::new();
    for (i, data) in range.rows().enumerate() {
        if first_row as usize + i == 0 {
            continue;
        }
        let mut cells = vec![Cell::Blank; first_col as usize];
        cells.extend(data.iter().map(Cell::from));
        rows.push(cells);
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Row mappers: one fixed column layout per dictionary
// ---------------------------------------------------------------------------

/// Columns: code, description. Both are required.
pub fn parse_account_row(row: &[Cell]) -> Option<AccountRecord> {
    let code = read_string(row, 0)?;
    let description = read_string(row, 1)?;
    let level = compute_account_level(Some(&code))?;
    Some(AccountRecord {
        code,
        description,
        level,
        active: true,
    })
}

pub fn parse_vat_code_row(row: &[Cell]) -> Option<VatCodeRecord> {
    let code = read_string(row, 0)?;
    Some(VatCodeRecord {
        code,
        rate: read_decimal(row, 1),
        registry_description: read_string(row, 2),
        long_description: read_string(row, 3),
        operation_type: read_string(row, 4),
        category: read_string(row, 5),
        use_purchases: read_boolean(row, 6),
        use_sales: read_boolean(row, 7),
        use_receipts: read_boolean(row, 8),
        vat_edf_code: read_string(row, 9),
        vat_grouping: read_string(row, 10),
        custom_nature_purchases: read_string(row, 11),
        custom_nature_sales: read_string(row, 12),
        stamp_duty_applicable: read_boolean(row, 13),
        reverse_charge_relevant: read_boolean(row, 14),
        agri_comp_rate: read_decimal(row, 15),
        notes: read_string(row, 16),
        external_code: read_string(row, 17),
        validity: read_string(row, 18),
    })
}

pub fn parse_withholding_type_row(row: &[Cell]) -> Option<WithholdingTypeRecord> {
    let code = read_string(row, 0)?;
    Some(WithholdingTypeRecord {
        code,
        description: read_string(row, 1),
        category: read_string(row, 2),
        tribute_description: read_string(row, 3),
        short_rent: read_boolean(row, 4),
        effective_from: read_date(row, 5),
        rate: read_decimal(row, 6),
        taxable_percent: read_decimal(row, 7),
        tribute_code: read_string(row, 8),
        due_date_description: read_string(row, 9),
        due_date: read_date(row, 10),
        long_description: read_string(row, 11),
    })
}

// ---------------------------------------------------------------------------
// Dictionary kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictionaryKind {
    Accounts,
    VatCodes,
    WithholdingTypes,
}

pub const ALL_DICTIONARIES: &[DictionaryKind] = &[
    DictionaryKind::Accounts,
    DictionaryKind::VatCodes,
    DictionaryKind::WithholdingTypes,
];

impl DictionaryKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Accounts => "accounts",
            Self::VatCodes => "vat",
            Self::WithholdingTypes => "withholding",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Accounts => "Chart of accounts",
            Self::VatCodes => "VAT codes",
            Self::WithholdingTypes => "Withholding types",
        }
    }

    pub fn from_key(key: &str) -> Result<Self> {
        ALL_DICTIONARIES
            .iter()
            .find(|d| d.key().eq_ignore_ascii_case(key.trim()))
            .copied()
            .ok_or_else(|| ContiError::UnknownDictionary(key.to_string()))
    }

    /// Maps one row and upserts it. Returns `false` when the row was skipped.
    pub fn apply_row<S: DictionarySink>(&self, sink: &mut S, row: &[Cell]) -> Result<bool> {
        match self {
            Self::Accounts => match parse_account_row(row) {
                Some(record) => sink.upsert_account(&record).map(|_| true),
                None => Ok(false),
            },
            Self::VatCodes => match parse_vat_code_row(row) {
                Some(record) => sink.upsert_vat_code(&record).map(|_| true),
                None => Ok(false),
            },
            Self::WithholdingTypes => match parse_withholding_type_row(row) {
                Some(record) => sink.upsert_withholding_type(&record).map(|_| true),
                None => Ok(false),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// import_rows / import_file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowCounts {
    pub processed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct ImportResult {
    pub kind: DictionaryKind,
    pub filename: String,
    pub checksum: String,
    pub counts: RowCounts,
}

pub fn import_rows<S: DictionarySink>(
    kind: DictionaryKind,
    sink: &mut S,
    rows: &[Vec<Cell>],
) -> Result<RowCounts> {
    let mut counts = RowCounts::default();
    for (i, row) in rows.iter().enumerate() {
        if kind.apply_row(sink, row)? {
            counts.processed += 1;
        } else {
            // +2: one for the header, one for 1-based sheet numbering
            tracing::debug!(dictionary = kind.key(), row = i + 2, "skipping row with blank key");
            counts.skipped += 1;
        }
    }
    Ok(counts)
}

/// Imports one dictionary workbook. A missing or unreadable file is an error;
/// bad cells inside it are not.
pub fn import_file<S: DictionarySink>(
    kind: DictionaryKind,
    sink: &mut S,
    file_path: &Path,
) -> Result<ImportResult> {
    tracing::info!(dictionary = kind.key(), path = %file_path.display(), "importing {}", kind.name());
    let checksum = compute_checksum(file_path)?;
    let rows = read_first_sheet(file_path)?;
    let counts = import_rows(kind, sink, &rows)?;
    tracing::info!(
        dictionary = kind.key(),
        processed = counts.processed,
        skipped = counts.skipped,
        "{} imported",
        kind.name()
    );
    Ok(ImportResult {
        kind,
        filename: file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string(),
        checksum,
        counts,
    })
}
