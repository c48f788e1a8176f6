//! Invoice totals: net, VAT, gross, withholding and payable amounts.
//!
//! VAT and withholding are rounded to cents on every line before being summed,
//! never once on the invoice total. Arithmetic saturates at the bounds of
//! `Decimal` instead of overflowing.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::models::{Invoice, InvoiceLine, InvoiceTotals, PASSIVE_DIRECTION};
use crate::row_parser::round2;

fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    round2(amount.saturating_mul(percent) / Decimal::ONE_HUNDRED)
}

fn line_vat(line: &InvoiceLine, net: Decimal) -> Decimal {
    match line.vat.as_ref().and_then(|v| v.rate) {
        Some(rate) => percent_of(net, rate),
        None => Decimal::ZERO,
    }
}

fn line_withholding(line: &InvoiceLine, net: Decimal) -> Decimal {
    let Some(wt) = line.withholding.as_ref() else {
        return Decimal::ZERO;
    };
    let Some(rate) = wt.rate else {
        return Decimal::ZERO;
    };
    let taxable_percent = wt.taxable_percent.unwrap_or(Decimal::ONE_HUNDRED);
    let base = percent_of(net, taxable_percent);
    percent_of(base, rate)
}

pub fn is_passive(direction: &str) -> bool {
    direction.to_uppercase() == PASSIVE_DIRECTION
}

/// Totals for one invoice. Missing amounts and references count as zero.
pub fn compute_totals(direction: &str, lines: &[InvoiceLine]) -> InvoiceTotals {
    let mut net_total = Decimal::ZERO;
    let mut vat_total = Decimal::ZERO;
    let mut withholding_total = Decimal::ZERO;

    for line in lines {
        let net = line.net_amount.unwrap_or(Decimal::ZERO);
        net_total = net_total.saturating_add(net);
        vat_total = vat_total.saturating_add(line_vat(line, net));
        withholding_total = withholding_total.saturating_add(line_withholding(line, net));
    }

    let gross_total = net_total.saturating_add(vat_total);
    let payable_total = if is_passive(direction) {
        gross_total.saturating_sub(withholding_total)
    } else {
        gross_total
    };

    InvoiceTotals {
        net_total,
        vat_total,
        gross_total,
        withholding_total,
        payable_total,
    }
}

/// Totals for several invoices from one batch of pre-fetched lines.
///
/// Lines are grouped by `invoice_id`, keeping their relative order. Lines whose
/// invoice is not in `invoices` are ignored.
pub fn compute_totals_for_many(
    invoices: &[Invoice],
    lines: &[InvoiceLine],
) -> HashMap<i64, InvoiceTotals> {
    let mut by_invoice: HashMap<i64, Vec<InvoiceLine>> = HashMap::new();
    for line in lines {
        by_invoice.entry(line.invoice_id).or_default().push(line.clone());
    }

    invoices
        .iter()
        .map(|inv| {
            let group = by_invoice.get(&inv.id).map(Vec::as_slice).unwrap_or(&[]);
            (inv.id, compute_totals(&inv.direction, group))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::NaiveDate;

    use super::*;
    use crate::models::{VatRef, WithholdingRef};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn line(id: i64, invoice_id: i64, net: &str) -> InvoiceLine {
        InvoiceLine {
            id,
            invoice_id,
            description: format!("line {id}"),
            net_amount: Some(dec(net)),
            vat: None,
            account_code: None,
            withholding: None,
        }
    }

    fn with_vat(mut l: InvoiceLine, rate: &str) -> InvoiceLine {
        l.vat = Some(VatRef {
            code: format!("V{rate}"),
            rate: Some(dec(rate)),
        });
        l
    }

    fn with_withholding(mut l: InvoiceLine, rate: &str, taxable: Option<&str>) -> InvoiceLine {
        l.withholding = Some(WithholdingRef {
            code: "W".into(),
            rate: Some(dec(rate)),
            taxable_percent: taxable.map(dec),
        });
        l
    }

    fn invoice(id: i64, direction: &str) -> Invoice {
        Invoice {
            id,
            direction: direction.into(),
            status: "DRAFT".into(),
            counterparty_id: 1,
            counterparty_name: "ACME".into(),
            number: format!("{id}"),
            year: 2024,
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            due_date: None,
            notes: None,
        }
    }

    #[test]
    fn test_sales_invoice_with_two_vat_rates() {
        let lines = vec![
            with_vat(line(1, 1, "100.00"), "22"),
            with_vat(line(2, 1, "50.00"), "10"),
        ];
        let t = compute_totals("SALES", &lines);
        assert_eq!(t.net_total, dec("150.00"));
        assert_eq!(t.vat_total, dec("27.00"));
        assert_eq!(t.gross_total, dec("177.00"));
        assert_eq!(t.withholding_total, Decimal::ZERO);
        assert_eq!(t.payable_total, dec("177.00"));
    }

    #[test]
    fn test_passive_invoice_deducts_withholding() {
        let lines = vec![with_withholding(
            with_vat(line(1, 1, "1000.00"), "22"),
            "20",
            Some("100"),
        )];
        let t = compute_totals("PASSIVE", &lines);
        assert_eq!(t.vat_total, dec("220.00"));
        assert_eq!(t.withholding_total, dec("200.00"));
        assert_eq!(t.gross_total, dec("1220.00"));
        assert_eq!(t.payable_total, dec("1020.00"));
    }

    #[test]
    fn test_direction_is_case_insensitive() {
        let lines = vec![with_withholding(line(1, 1, "100"), "20", None)];
        assert_eq!(compute_totals("passive", &lines).payable_total, dec("80.00"));
        assert_eq!(compute_totals("ACTIVE", &lines).payable_total, dec("100"));
    }

    #[test]
    fn test_sales_side_withholding_is_informational() {
        let lines = vec![with_withholding(with_vat(line(1, 1, "1000"), "22"), "20", None)];
        let t = compute_totals("ACTIVE", &lines);
        assert_eq!(t.withholding_total, dec("200.00"));
        assert_eq!(t.payable_total, t.gross_total);
    }

    #[test]
    fn test_missing_taxable_percent_means_full_base() {
        let lines = vec![with_withholding(line(1, 1, "1000.00"), "20", None)];
        let t = compute_totals("PASSIVE", &lines);
        assert_eq!(t.withholding_total, dec("200.00"));
    }

    #[test]
    fn test_partial_taxable_percent() {
        // 50% of 333.33 = 166.665 -> 166.67; 20% -> 33.334 -> 33.33
        let lines = vec![with_withholding(line(1, 1, "333.33"), "20", Some("50"))];
        let t = compute_totals("PASSIVE", &lines);
        assert_eq!(t.withholding_total, dec("33.33"));
        assert_eq!(t.payable_total, dec("300.00"));
    }

    #[test]
    fn test_rounding_is_per_line() {
        // 0.05 * 10% = 0.005 -> 0.01 per line; aggregate-then-round would give 0.02
        let lines = vec![
            with_vat(line(1, 1, "0.05"), "10"),
            with_vat(line(2, 1, "0.05"), "10"),
            with_vat(line(3, 1, "0.05"), "10"),
        ];
        let t = compute_totals("ACTIVE", &lines);
        assert_eq!(t.vat_total, dec("0.03"));
    }

    #[test]
    fn test_absent_references_contribute_zero() {
        let mut no_rate = line(2, 1, "50");
        no_rate.vat = Some(VatRef {
            code: "N4".into(),
            rate: None,
        });
        no_rate.withholding = Some(WithholdingRef {
            code: "W".into(),
            rate: None,
            taxable_percent: Some(dec("50")),
        });
        let mut no_amount = line(3, 1, "0");
        no_amount.net_amount = None;
        let lines = vec![line(1, 1, "100"), no_rate, no_amount];
        let t = compute_totals("PASSIVE", &lines);
        assert_eq!(t.net_total, dec("150"));
        assert_eq!(t.vat_total, Decimal::ZERO);
        assert_eq!(t.withholding_total, Decimal::ZERO);
        assert_eq!(t.payable_total, dec("150"));
    }

    #[test]
    fn test_negative_amounts_pass_through() {
        let lines = vec![with_vat(line(1, 1, "-100"), "22")];
        let t = compute_totals("ACTIVE", &lines);
        assert_eq!(t.net_total, dec("-100"));
        assert_eq!(t.vat_total, dec("-22.00"));
    }

    #[test]
    fn test_extreme_amounts_saturate() {
        let huge = InvoiceLine {
            net_amount: Some(Decimal::MAX),
            ..line(1, 1, "0")
        };
        let lines = vec![
            with_withholding(with_vat(huge.clone(), "22"), "20", None),
            with_vat(huge, "22"),
        ];
        let t = compute_totals("PASSIVE", &lines);
        assert_eq!(t.net_total, Decimal::MAX);
        assert_eq!(t.gross_total, Decimal::MAX);
        assert!(t.vat_total > Decimal::ZERO);
        assert!(t.payable_total <= t.gross_total);

        let negative = InvoiceLine {
            net_amount: Some(Decimal::MIN),
            ..line(2, 1, "0")
        };
        let t = compute_totals("ACTIVE", &[with_vat(negative.clone(), "22"), negative]);
        assert_eq!(t.net_total, Decimal::MIN);
        assert_eq!(t.payable_total, Decimal::MIN);
    }

    #[test]
    fn test_no_lines_gives_zero_totals() {
        assert_eq!(compute_totals("PASSIVE", &[]), InvoiceTotals::default());
    }

    #[test]
    fn test_many_empty_input() {
        assert!(compute_totals_for_many(&[], &[]).is_empty());
    }

    #[test]
    fn test_many_groups_interleaved_lines() {
        let invoices = vec![invoice(1, "ACTIVE"), invoice(2, "PASSIVE"), invoice(3, "ACTIVE")];
        let lines = vec![
            with_vat(line(10, 1, "100"), "22"),
            with_withholding(line(11, 2, "1000"), "20", None),
            with_vat(line(12, 1, "50"), "10"),
            with_vat(line(13, 2, "10"), "22"),
            line(14, 99, "5"),
        ];
        let totals = compute_totals_for_many(&invoices, &lines);
        assert_eq!(totals.len(), 3);

        assert_eq!(totals[&1].net_total, dec("150"));
        assert_eq!(totals[&1].vat_total, dec("27.00"));
        assert_eq!(totals[&1].payable_total, dec("177.00"));

        assert_eq!(totals[&2].net_total, dec("1010"));
        assert_eq!(totals[&2].vat_total, dec("2.20"));
        assert_eq!(totals[&2].withholding_total, dec("200.00"));
        assert_eq!(totals[&2].payable_total, dec("812.20"));

        assert_eq!(totals[&3], InvoiceTotals::default());
    }
}
