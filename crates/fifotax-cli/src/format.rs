//! Plain text formatter for tax reports.
//!
//! Grounded on `cgt_formatter_plain::format` — section headers written with
//! `writeln!` into a `String` buffer (`# SUMMARY`, `# ...`), tables sorted
//! deterministically before printing. Generalised from the teacher's
//! same-day/B&B/Section-104 disposal narrative to this spec's flat
//! share/forex/misc row tables plus the AWV Z4/Z10 tables the teacher has no
//! counterpart for.
use crate::Report;
use fifotax_core::awv;
use fifotax_money::Currency;
use rust_decimal::Decimal;
use std::fmt::Write;

fn fmt_amount(value: Decimal, currency: Currency) -> String {
    format!("{} {}", value.round_dp(2), currency.code())
}

/// Render a fully processed [`Report`] as plain text.
pub fn format(report: &Report) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# SUMMARY ({})\n", report.tax_report.year);
    let s = &report.tax_report.summary;
    let _ = writeln!(out, "Share gains:                 {}", fmt_amount(s.share_gains, report.domestic));
    let _ = writeln!(out, "Share losses:                {}", fmt_amount(s.share_losses, report.domestic));
    let _ = writeln!(out, "Forex gain (taxable):        {}", fmt_amount(s.forex_gain_total, report.domestic));
    let _ = writeln!(out, "Total dividends:             {}", fmt_amount(s.total_dividends, report.domestic));
    let _ = writeln!(out, "Total fees:                  {}", fmt_amount(s.total_fees, report.domestic));
    let _ = writeln!(out, "Total taxes withheld:        {}", fmt_amount(s.total_taxes, report.domestic));
    let _ = writeln!(out, "Total foreign capital income:{}", fmt_amount(s.total_foreign_capital_income, report.domestic));

    let _ = writeln!(out, "\n# SHARES\n");
    if report.tax_report.shares.is_empty() {
        let _ = writeln!(out, "NONE");
    }
    for row in &report.tax_report.shares {
        let _ = writeln!(
            out,
            "{} {} {} @ {} -> {} @ {} = {}",
            row.sell_date,
            row.quantity,
            row.symbol,
            row.buy_price,
            row.sell_date,
            row.sell_price,
            fmt_amount(row.gain_dom, report.domestic)
        );
    }

    let _ = writeln!(out, "\n# FOREX\n");
    if report.tax_report.forex.is_empty() {
        let _ = writeln!(out, "NONE");
    }
    for row in &report.tax_report.forex {
        if row.comment.is_empty() {
            let _ = writeln!(
                out,
                "{} {} {} held {}..{} [{:?}] = {}",
                row.sell_date, row.quantity, row.currency, row.buy_date, row.sell_date, row.tax_status, fmt_amount(row.gain_dom, report.domestic)
            );
        } else {
            let _ = writeln!(
                out,
                "{} {} {} held {}..{} [{:?}] ({})",
                row.sell_date, row.quantity, row.currency, row.buy_date, row.sell_date, row.tax_status, row.comment
            );
        }
    }

    for (title, flows) in [("DIVIDENDS", &report.tax_report.dividends), ("FEES", &report.tax_report.fees), ("TAXES", &report.tax_report.taxes)] {
        let _ = writeln!(out, "\n# {title}\n");
        if flows.is_empty() {
            let _ = writeln!(out, "NONE");
        }
        for flow in flows {
            let amount_dom = flow.amount_dom_daily.or(flow.amount_dom_monthly).unwrap_or(Decimal::ZERO);
            let _ = writeln!(out, "{} {} {} = {}", flow.date, flow.amount, flow.currency, fmt_amount(amount_dom, report.domestic));
        }
    }

    let z4 = awv::generate_z4(&report.awv_z4, &report.config, report.tax_report.year);
    let z10 = awv::generate_z10(&report.awv_z10, &report.config, report.tax_report.year);

    let _ = writeln!(out, "\n# AWV Z4\n");
    if z4.is_empty() {
        let _ = writeln!(out, "NONE");
    }
    for entry in &z4 {
        let _ = writeln!(
            out,
            "{} {:?} {} {} ({})",
            entry.date,
            entry.purpose,
            entry.symbol,
            fmt_amount(entry.value, entry.currency),
            entry.value_dom.map(|v| fmt_amount(v, report.domestic)).unwrap_or_default()
        );
    }

    let _ = writeln!(out, "\n# AWV Z10\n");
    if z10.is_empty() {
        let _ = writeln!(out, "NONE");
    }
    for entry in &z10 {
        let _ = writeln!(
            out,
            "{} {:?} {} {} ({})",
            entry.date,
            entry.purpose,
            entry.symbol,
            fmt_amount(entry.value, entry.currency),
            entry.value_dom.map(|v| fmt_amount(v, report.domestic)).unwrap_or_default()
        );
    }

    if !report.warnings.is_empty() {
        let _ = writeln!(out, "\n# WARNINGS\n");
        for warning in &report.warnings {
            let _ = writeln!(out, "{warning:?}");
        }
    }

    out.trim_end().to_string() + "\n"
}
