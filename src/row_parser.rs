//! Normalization of raw spreadsheet rows into typed dictionary values.
//!
//! Every reader degrades instead of failing: a missing, blank or malformed cell
//! yields `None` (or `false` for flags) so a single bad cell never aborts a row.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::cell::Cell;

const TRUTHY: &[&str] = &["1", "true", "si", "sì", "yes", "y", "x"];

fn cell(row: &[Cell], col: usize) -> Option<&Cell> {
    row.get(col)
}

pub fn read_string(row: &[Cell], col: usize) -> Option<String> {
    cell(row, col).and_then(Cell::to_normalized_string)
}

pub fn read_decimal(row: &[Cell], col: usize) -> Option<Decimal> {
    let raw = read_string(row, col)?;
    let value = parse_decimal(&raw);
    if value.is_none() {
        tracing::debug!(col, raw = %raw, "unparsable decimal cell");
    }
    value
}

pub fn read_boolean(row: &[Cell], col: usize) -> bool {
    read_string(row, col)
        .map(|v| TRUTHY.contains(&v.trim().to_lowercase().as_str()))
        .unwrap_or(false)
}

pub fn read_date(row: &[Cell], col: usize) -> Option<NaiveDate> {
    let c = cell(row, col)?;
    if let Some(date) = c.as_date() {
        return Some(date);
    }
    let raw = c.to_normalized_string()?;
    let value = parse_date_dmy(&raw).or_else(|| parse_date_iso(&raw));
    if value.is_none() {
        tracing::debug!(col, raw = %raw, "unparsable date cell");
    }
    value
}

/// Hierarchy depth of a chart-of-accounts code: the number of dot-separated segments.
///
/// Trailing empty segments do not count, so `"1.2."` sits at level 2.
pub fn compute_account_level(code: Option<&str>) -> Option<usize> {
    let code = code.map(str::trim).filter(|c| !c.is_empty())?;
    let mut parts: Vec<&str> = code.split('.').collect();
    while parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
    Some(parts.len())
}

/// Rounds half away from zero to two decimals and pins the scale at 2.
pub fn round2(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Parses `19,90`, `19.90`, `-3` or `1e2`. Grouping separators are not supported.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let s = raw.trim().replace(',', ".");
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(&s)
        .or_else(|_| Decimal::from_scientific(&s))
        .ok()
        .map(round2)
}

/// `day/month/year`, each part numeric with any number of digits.
pub fn parse_date_dmy(raw: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = raw.trim().split('/').collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }
    let d: u32 = parts[0].parse().ok()?;
    let m: u32 = parts[1].parse().ok()?;
    let y: i32 = parts[2].parse().ok()?;
    if !(1..=31).contains(&d) {
        return None;
    }
    // a day past the end of the month falls back to the month's last day
    (1..=d).rev().find_map(|day| NaiveDate::from_ymd_opt(y, m, day))
}

pub fn parse_date_iso(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: Vec<Cell>) -> Vec<Cell> {
        cells
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_read_string_out_of_range_is_none() {
        let r = row(vec![Cell::text("A")]);
        assert_eq!(read_string(&r, 0), Some("A".into()));
        assert_eq!(read_string(&r, 5), None);
    }

    #[test]
    fn test_read_decimal_comma_and_dot_agree() {
        let r = row(vec![Cell::text("19,90"), Cell::text("19.90"), Cell::number(19.9)]);
        assert_eq!(read_decimal(&r, 0), Some(dec("19.90")));
        assert_eq!(read_decimal(&r, 1), Some(dec("19.90")));
        assert_eq!(read_decimal(&r, 2), Some(dec("19.90")));
        assert_eq!(read_decimal(&r, 0).unwrap().to_string(), "19.90");
    }

    #[test]
    fn test_read_decimal_rounds_half_up() {
        let r = row(vec![
            Cell::text("10.005"),
            Cell::text("10.004"),
            Cell::text("-2.345"),
            Cell::text("22"),
        ]);
        assert_eq!(read_decimal(&r, 0), Some(dec("10.01")));
        assert_eq!(read_decimal(&r, 1), Some(dec("10.00")));
        assert_eq!(read_decimal(&r, 2), Some(dec("-2.35")));
        assert_eq!(read_decimal(&r, 3).unwrap().to_string(), "22.00");
    }

    #[test]
    fn test_read_decimal_degrades_to_none() {
        let r = row(vec![Cell::text("abc"), Cell::Blank, Cell::text("1.234,56"), Cell::text("  ")]);
        assert_eq!(read_decimal(&r, 0), None);
        assert_eq!(read_decimal(&r, 1), None);
        assert_eq!(read_decimal(&r, 2), None);
        assert_eq!(read_decimal(&r, 3), None);
        assert_eq!(read_decimal(&r, 9), None);
    }

    #[test]
    fn test_read_boolean_synonyms() {
        for v in ["1", "true", "TRUE", "si", "SI", "sì", "SÌ", "yes", "Y", "x", " X "] {
            let r = row(vec![Cell::text(v)]);
            assert!(read_boolean(&r, 0), "expected {v:?} to be true");
        }
        for v in ["0", "no", "false", "n", "vero", "2"] {
            let r = row(vec![Cell::text(v)]);
            assert!(!read_boolean(&r, 0), "expected {v:?} to be false");
        }
        let r = row(vec![Cell::Blank, Cell::Boolean(true), Cell::number(1.0)]);
        assert!(!read_boolean(&r, 0));
        assert!(read_boolean(&r, 1));
        assert!(read_boolean(&r, 2));
        assert!(!read_boolean(&r, 3));
    }

    #[test]
    fn test_read_date_formats() {
        let r = row(vec![
            Cell::date_serial(45667.0),
            Cell::text("1/2/2024"),
            Cell::text("01/02/2024"),
            Cell::text("2024-02-01"),
            Cell::text("31/02/2024"),
            Cell::text("not a date"),
            Cell::Blank,
            Cell::text("31/04/2023"),
            Cell::text("29/02/2023"),
            Cell::text("32/01/2024"),
            Cell::text("0/01/2024"),
            Cell::text("15/13/2024"),
        ]);
        let feb1 = NaiveDate::from_ymd_opt(2024, 2, 1);
        assert_eq!(read_date(&r, 0), NaiveDate::from_ymd_opt(2025, 1, 10));
        assert_eq!(read_date(&r, 1), feb1);
        assert_eq!(read_date(&r, 2), feb1);
        assert_eq!(read_date(&r, 3), feb1);
        assert_eq!(read_date(&r, 4), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(read_date(&r, 5), None);
        assert_eq!(read_date(&r, 6), None);
        assert_eq!(read_date(&r, 7), NaiveDate::from_ymd_opt(2023, 4, 30));
        assert_eq!(read_date(&r, 8), NaiveDate::from_ymd_opt(2023, 2, 28));
        assert_eq!(read_date(&r, 9), None);
        assert_eq!(read_date(&r, 10), None);
        assert_eq!(read_date(&r, 11), None);
    }

    #[test]
    fn test_compute_account_level() {
        assert_eq!(compute_account_level(Some("1.2.3")), Some(3));
        assert_eq!(compute_account_level(Some("40")), Some(1));
        assert_eq!(compute_account_level(Some(" 10.05 ")), Some(2));
        assert_eq!(compute_account_level(Some("1.2.")), Some(2));
        assert_eq!(compute_account_level(None), None);
        assert_eq!(compute_account_level(Some("  ")), None);
    }

    #[test]
    fn test_round2_pins_scale() {
        assert_eq!(round2(dec("5")).to_string(), "5.00");
        assert_eq!(round2(dec("0.125")).to_string(), "0.13");
        assert_eq!(round2(dec("-0.125")).to_string(), "-0.13");
    }
}
