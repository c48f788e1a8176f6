use rust_decimal::Decimal;

use crate::row_parser::round2;

/// Format a decimal as a euro amount with thousands separators: €1,234.56
pub fn money(val: Decimal) -> String {
    let rounded = round2(val);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let cents = rounded.abs().to_string();
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-€{with_commas}.{dec_part}")
    } else {
        format!("€{with_commas}.{dec_part}")
    }
}

/// A rate or percentage as stored, or a dash when absent.
pub fn percent(val: Option<Decimal>) -> String {
    val.map(|v| format!("{}%", v.normalize())).unwrap_or_else(|| "—".to_string())
}
