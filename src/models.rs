use chrono::NaiveDate;
use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Dictionaries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct AccountRecord {
    pub code: String,
    pub description: String,
    pub level: usize,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct VatCodeRecord {
    pub code: String,
    pub rate: Option<Decimal>,
    pub registry_description: Option<String>,
    pub long_description: Option<String>,
    pub operation_type: Option<String>,
    pub category: Option<String>,
    pub use_purchases: bool,
    pub use_sales: bool,
    pub use_receipts: bool,
    pub vat_edf_code: Option<String>,
    pub vat_grouping: Option<String>,
    pub custom_nature_purchases: Option<String>,
    pub custom_nature_sales: Option<String>,
    pub stamp_duty_applicable: bool,
    pub reverse_charge_relevant: bool,
    pub agri_comp_rate: Option<Decimal>,
    pub notes: Option<String>,
    pub external_code: Option<String>,
    pub validity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WithholdingTypeRecord {
    pub code: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub effective_from: Option<NaiveDate>,
    pub rate: Option<Decimal>,
    pub taxable_percent: Option<Decimal>,
    pub tribute_code: Option<String>,
    pub tribute_description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub due_date_description: Option<String>,
    pub short_rent: bool,
    pub long_description: Option<String>,
}

// ---------------------------------------------------------------------------
// Counterparties
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Counterparty {
    pub id: Option<i64>,
    pub kind: String,
    pub name: String,
    pub vat_number: Option<String>,
    pub tax_code: Option<String>,
    pub pec: Option<String>,
    pub sdi_code: Option<String>,
    pub iban: Option<String>,
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Invoices
// ---------------------------------------------------------------------------

/// Purchase-side invoices carry this direction code; withholding is deducted only for them.
pub const PASSIVE_DIRECTION: &str = "PASSIVE";

/// Header fields as entered by the operator, with lookups given by code.
#[derive(Debug, Clone)]
pub struct InvoiceHeader {
    pub direction: String,
    pub status: String,
    pub counterparty_id: i64,
    pub number: String,
    pub year: i32,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Invoice {
    pub id: i64,
    pub direction: String,
    pub status: String,
    pub counterparty_id: i64,
    pub counterparty_name: String,
    pub number: String,
    pub year: i32,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// A line as entered by the operator; dictionary references are codes.
#[derive(Debug, Clone)]
pub struct LineInput {
    pub description: String,
    pub net_amount: Decimal,
    pub vat_code: Option<String>,
    pub account_code: Option<String>,
    pub withholding_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VatRef {
    pub code: String,
    pub rate: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithholdingRef {
    pub code: String,
    pub rate: Option<Decimal>,
    pub taxable_percent: Option<Decimal>,
}

/// A stored line with its dictionary references already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceLine {
    pub id: i64,
    pub invoice_id: i64,
    pub description: String,
    pub net_amount: Option<Decimal>,
    pub vat: Option<VatRef>,
    pub account_code: Option<String>,
    pub withholding: Option<WithholdingRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InvoiceTotals {
    pub net_total: Decimal,
    pub vat_total: Decimal,
    pub gross_total: Decimal,
    pub withholding_total: Decimal,
    pub payable_total: Decimal,
}

/// Search criteria for invoices. Every field is optional; unset fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub direction: Option<String>,
    pub status: Option<String>,
    pub counterparty_id: Option<i64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub q: Option<String>,
}
