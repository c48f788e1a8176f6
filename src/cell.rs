use calamine::{Data, ExcelDateTime};
use chrono::{NaiveDate, TimeDelta};

/// One spreadsheet cell, reduced to the kinds the dictionary imports care about.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Blank,
    Text(String),
    /// A numeric cell. `date_formatted` is set when the sheet displays it as a date,
    /// in which case `value` is an Excel serial day number.
    Number { value: f64, date_formatted: bool },
    Boolean(bool),
    /// A formula cell with whatever result the workbook cached for it.
    Formula {
        cached_text: Option<String>,
        cached_number: Option<f64>,
    },
}

impl Cell {
    pub fn text(s: &str) -> Self {
        Cell::Text(s.to_string())
    }

    pub fn number(value: f64) -> Self {
        Cell::Number {
            value,
            date_formatted: false,
        }
    }

    pub fn date_serial(value: f64) -> Self {
        Cell::Number {
            value,
            date_formatted: true,
        }
    }

    /// Renders the cell as trimmed text, `None` when nothing meaningful is left.
    pub fn to_normalized_string(&self) -> Option<String> {
        match self {
            Cell::Blank => None,
            Cell::Text(s) => trim_to_null(s),
            Cell::Number {
                value,
                date_formatted: true,
            } => excel_serial_to_date(*value).map(|d| d.format("%Y-%m-%d").to_string()),
            Cell::Number { value, .. } => plain_number(*value),
            Cell::Boolean(b) => Some(if *b { "true" } else { "false" }.to_string()),
            Cell::Formula {
                cached_text: Some(s),
                ..
            } => trim_to_null(s),
            Cell::Formula {
                cached_number: Some(n),
                ..
            } => plain_number(*n),
            Cell::Formula { .. } => None,
        }
    }

    /// The calendar date of a date-formatted numeric cell.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Number {
                value,
                date_formatted: true,
            } => excel_serial_to_date(*value),
            _ => None,
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Blank,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Float(f) => Cell::number(*f),
            Data::Int(i) => Cell::number(*i as f64),
            Data::Bool(b) => Cell::Boolean(*b),
            Data::DateTime(dt) if dt.is_datetime() => date_cell(dt),
            Data::DateTime(dt) => Cell::number(dt.as_f64()),
            // ODS stores dates as ISO text; keep only the calendar part.
            Data::DateTimeIso(s) => Cell::Text(s.split('T').next().unwrap_or(s.as_str()).to_string()),
            Data::DurationIso(s) => Cell::Text(s.clone()),
            // Error values only come out of formulas that failed to evaluate.
            Data::Error(_) => Cell::Formula {
                cached_text: None,
                cached_number: None,
            },
        }
    }
}

// Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
fn excel_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

/// Serial of 9999-12-31, the last day Excel can display.
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Re-bases a workbook date onto the 1900 serial system, whichever system the
/// workbook itself uses. A value outside Excel's calendar is blank.
fn date_cell(dt: &ExcelDateTime) -> Cell {
    let value = dt.as_f64();
    let serial = (0.0..=MAX_EXCEL_SERIAL)
        .contains(&value)
        .then(|| dt.as_datetime())
        .flatten()
        .zip(excel_epoch())
        .map(|(at, epoch)| (at.date() - epoch).num_days());
    match serial {
        Some(days) => Cell::date_serial(days as f64),
        None => {
            tracing::debug!(value, "date cell out of range");
            Cell::Blank
        }
    }
}

/// Converts an Excel serial day number to a date, dropping any time-of-day fraction.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    let days = TimeDelta::try_days(serial.floor() as i64)?;
    excel_epoch()?.checked_add_signed(days)
}

fn plain_number(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    // f64 Display is the shortest round-trip form and never uses an exponent.
    let rendered = if value == 0.0 {
        "0".to_string()
    } else {
        value.to_string()
    };
    trim_to_null(&rendered)
}

pub fn trim_to_null(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

#[cfg(test)]
mod tests {
    use calamine::ExcelDateTimeType;

    use super::*;

    #[test]
    fn test_text_is_trimmed() {
        assert_eq!(Cell::text("  IVA 22  ").to_normalized_string(), Some("IVA 22".into()));
        assert_eq!(Cell::text("   ").to_normalized_string(), None);
        assert_eq!(Cell::Blank.to_normalized_string(), None);
    }

    #[test]
    fn test_numbers_drop_trailing_zeros() {
        assert_eq!(Cell::number(22.0).to_normalized_string(), Some("22".into()));
        assert_eq!(Cell::number(19.9).to_normalized_string(), Some("19.9".into()));
        assert_eq!(Cell::number(-4.25).to_normalized_string(), Some("-4.25".into()));
        assert_eq!(Cell::number(0.0).to_normalized_string(), Some("0".into()));
        assert_eq!(Cell::number(f64::NAN).to_normalized_string(), None);
    }

    #[test]
    fn test_date_formatted_number_renders_iso() {
        let cell = Cell::date_serial(45667.0);
        assert_eq!(cell.to_normalized_string(), Some("2025-01-10".into()));
        assert_eq!(cell.as_date(), NaiveDate::from_ymd_opt(2025, 1, 10));
        // time-of-day fraction is ignored
        assert_eq!(Cell::date_serial(45667.75).as_date(), NaiveDate::from_ymd_opt(2025, 1, 10));
        assert_eq!(Cell::number(45667.0).as_date(), None);
    }

    #[test]
    fn test_out_of_range_serial_is_blank() {
        for serial in [1e15, -1e15, f64::MAX, f64::MIN, f64::INFINITY] {
            let cell = Cell::date_serial(serial);
            assert_eq!(cell.to_normalized_string(), None, "serial {serial}");
            assert_eq!(cell.as_date(), None, "serial {serial}");
        }
    }

    #[test]
    fn test_date_cells_from_both_date_systems() {
        let jan_first = NaiveDate::from_ymd_opt(2024, 1, 1);
        let modern = Data::DateTime(ExcelDateTime::new(45292.0, ExcelDateTimeType::DateTime, false));
        assert_eq!(Cell::from(&modern), Cell::date_serial(45292.0));
        assert_eq!(Cell::from(&modern).as_date(), jan_first);

        // 1904 workbooks count days from 1904-01-01
        let mac = Data::DateTime(ExcelDateTime::new(43830.0, ExcelDateTimeType::DateTime, true));
        assert_eq!(Cell::from(&mac).as_date(), jan_first);

        for bad in [-1e22, 1e22, f64::NAN] {
            let dt = Data::DateTime(ExcelDateTime::new(bad, ExcelDateTimeType::DateTime, false));
            assert_eq!(Cell::from(&dt), Cell::Blank);
        }

        let duration = Data::DateTime(ExcelDateTime::new(1.5, ExcelDateTimeType::TimeDelta, false));
        assert_eq!(Cell::from(&duration), Cell::number(1.5));
    }

    #[test]
    fn test_boolean_renders_literal() {
        assert_eq!(Cell::Boolean(true).to_normalized_string(), Some("true".into()));
        assert_eq!(Cell::Boolean(false).to_normalized_string(), Some("false".into()));
    }

    #[test]
    fn test_formula_prefers_cached_text() {
        let both = Cell::Formula {
            cached_text: Some(" N2.2 ".into()),
            cached_number: Some(3.0),
        };
        assert_eq!(both.to_normalized_string(), Some("N2.2".into()));

        let numeric = Cell::Formula {
            cached_text: None,
            cached_number: Some(10.5),
        };
        assert_eq!(numeric.to_normalized_string(), Some("10.5".into()));

        let empty = Cell::Formula {
            cached_text: None,
            cached_number: None,
        };
        assert_eq!(empty.to_normalized_string(), None);
    }

    #[test]
    fn test_from_calamine_data() {
        assert_eq!(Cell::from(&Data::Empty), Cell::Blank);
        assert_eq!(Cell::from(&Data::String("x".into())), Cell::text("x"));
        assert_eq!(Cell::from(&Data::Int(4)), Cell::number(4.0));
        assert_eq!(Cell::from(&Data::Bool(true)), Cell::Boolean(true));
        assert_eq!(
            Cell::from(&Data::DateTimeIso("2024-03-01T00:00:00".into())),
            Cell::text("2024-03-01")
        );
    }
}
