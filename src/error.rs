use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContiError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Workbook has no sheets: {0}")]
    EmptyWorkbook(String),

    #[error("Unknown dictionary: {0}")]
    UnknownDictionary(String),

    #[error("Unknown invoice direction: {0}")]
    UnknownDirection(String),

    #[error("Unknown invoice status: {0}")]
    UnknownStatus(String),

    #[error("Unknown counterparty kind: {0}")]
    UnknownCounterpartyKind(String),

    #[error("Counterparty not found: {0}")]
    UnknownCounterparty(i64),

    #[error("Unknown VAT code: {0}")]
    UnknownVatCode(String),

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Unknown withholding type: {0}")]
    UnknownWithholdingType(String),

    #[error("Invoice not found: {0}")]
    InvoiceNotFound(i64),

    #[error("Line {line_id} not found on invoice {invoice_id}")]
    LineNotFound { invoice_id: i64, line_id: i64 },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Cannot delete counterparty {0}: invoices still reference it")]
    CounterpartyInUse(i64),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ContiError>;
