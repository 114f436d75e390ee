//! Structured billing fields captured from exported PDF text.
//!
//! The utility provider changed its invoice template at some point, so two
//! regex layouts exist: `legacy` for the old template and `current` for the
//! new one. Field capture is best-effort — a pattern that does not match
//! leaves the field empty rather than failing the whole bill.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

/// Which invoice template the PDFs use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillLayout {
    /// Pre-redesign invoice template.
    Legacy,
    /// Post-redesign invoice template.
    Current,
}

impl BillLayout {
    /// Parse a layout name as given on the command line or in config.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "legacy" | "old" => Some(Self::Legacy),
            "current" | "new" => Some(Self::Current),
            _ => None,
        }
    }
}

/// One scanned electricity bill.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Bill {
    /// PDF file the bill was scanned from.
    pub source: String,
    /// Provider invoice number.
    pub invoice_no: String,
    /// Service address on the account.
    pub service_address: String,
    /// Meter read date.
    pub read_date: Option<NaiveDate>,
    /// Meter read type: `"Actual"` or `"Estimated"`.
    pub read_type: String,
    /// Number of days in the billing period.
    pub billing_period_days: Option<u32>,
    /// Energy consumed over the period, in kWh.
    pub energy_used_kwh: Option<f64>,
    /// Total charges for the period, in account currency.
    pub total_charges: Option<f64>,
}

/// Compiled capture patterns for one layout.
struct BillPatterns {
    invoice_no: Regex,
    service_address: Regex,
    read_date: Regex,
    read_type: Regex,
    billing_period: Regex,
    energy_used: Regex,
    total_charges: Regex,
}

fn legacy_patterns() -> &'static BillPatterns {
    static PATTERNS: OnceLock<BillPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| BillPatterns {
        invoice_no: Regex::new(r"\d{10,}").expect("valid pattern"),
        service_address: Regex::new(r"Service Name / Address:\n(?:.*\n)?(.*)")
            .expect("valid pattern"),
        read_date: Regex::new(r"\b\d{2}-[A-Z]{3}-\d{4}\b").expect("valid pattern"),
        read_type: Regex::new(r"Actual\b|Estimated").expect("valid pattern"),
        billing_period: Regex::new(r"No\. of Days\s+(\d+)").expect("valid pattern"),
        energy_used: Regex::new(r"TOTAL AMOUNT DUE\s+(\d{2,}\.\d+)").expect("valid pattern"),
        total_charges: Regex::new(r"Current\s+Charges\s+\$([\d,]+\.\d{2})")
            .expect("valid pattern"),
    })
}

fn current_patterns() -> &'static BillPatterns {
    static PATTERNS: OnceLock<BillPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| BillPatterns {
        invoice_no: Regex::new(r"\d{10,}").expect("valid pattern"),
        service_address: Regex::new(r"SERVICE ADDRESS: .{10,}").expect("valid pattern"),
        read_date: Regex::new(r"BY:\s+\d{2}-[A-Za-z]{3}-\d{4}").expect("valid pattern"),
        read_type: Regex::new(r"Actual\b|Estimated").expect("valid pattern"),
        billing_period: Regex::new(r"(\d+)\s+Days").expect("valid pattern"),
        energy_used: Regex::new(r"ENERGY[\s\S]*?\n(?:.*\n){8}(\d{2,3}\.\d{2})")
            .expect("valid pattern"),
        total_charges: Regex::new(r"Total:.{10,}").expect("valid pattern"),
    })
}

impl Bill {
    /// Capture bill fields from text extracted out of a PDF.
    pub fn from_text(text: &str, layout: BillLayout) -> Self {
        let p = match layout {
            BillLayout::Legacy => legacy_patterns(),
            BillLayout::Current => current_patterns(),
        };

        let service_address = capture(text, &p.service_address)
            .replace("SERVICE ADDRESS: ", "")
            .trim()
            .to_string();

        let read_date_raw = capture(text, &p.read_date).replace("BY:", "");
        let read_date = parse_read_date(read_date_raw.trim());

        let billing_period_days = capture(text, &p.billing_period)
            .replace("Days", "")
            .trim()
            .parse::<u32>()
            .ok();

        let energy_used_kwh = capture(text, &p.energy_used).trim().parse::<f64>().ok();

        let total_charges_raw = capture(text, &p.total_charges).replace("Total:", "");
        let total_charges = parse_amount(total_charges_raw.trim());

        Self {
            source: String::new(),
            invoice_no: capture(text, &p.invoice_no),
            service_address,
            read_date,
            read_type: capture(text, &p.read_type),
            billing_period_days,
            energy_used_kwh,
            total_charges,
        }
    }
}

/// Run a capture pattern against extracted text.
///
/// Returns capture group 1 if the pattern has one, the whole match
/// otherwise, and an empty string when nothing matches.
fn capture(text: &str, pattern: &Regex) -> String {
    match pattern.captures(text) {
        Some(caps) => caps
            .get(1)
            .or_else(|| caps.get(0))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
        None => String::new(),
    }
}

/// Parse a monetary amount, tolerating `$` signs, thousands separators,
/// and trailing text after the number.
fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim_start_matches('$')
        .replace(',', "")
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse::<f64>().ok()
}

/// Parse a `DD-MMM-YYYY` read date.
///
/// The legacy template prints months in uppercase (`16-JUL-2024`), which
/// chrono's `%b` rejects, so the month token is title-cased first.
fn parse_read_date(raw: &str) -> Option<NaiveDate> {
    let normalized: String = raw
        .char_indices()
        .map(|(i, c)| {
            let prev_is_alpha = i > 0 && raw[..i].ends_with(|p: char| p.is_ascii_alphabetic());
            if c.is_ascii_alphabetic() && prev_is_alpha {
                c.to_ascii_lowercase()
            } else {
                c.to_ascii_uppercase()
            }
        })
        .collect();
    NaiveDate::parse_from_str(&normalized, "%d-%b-%Y").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY_TEXT: &str = "\
Invoice 1234567890123
Service Name / Address:
JOHN BROWN
12 HOPE ROAD KINGSTON 6

Read Date: 16-JUL-2024 Actual
No. of Days  31
Current   Charges   $15,230.50
TOTAL AMOUNT DUE  245.70
";

    const CURRENT_TEXT: &str = "\
INVOICE NO: 9876543210
SERVICE ADDRESS: 12 HOPE ROAD KINGSTON 6
PLEASE PAY BY: 16-Aug-2024 Estimated
Billing Period 30 Days
ENERGY RATE SCHEDULE
line one
line two
line three
line four
line five
line six
line seven
line eight
187.25
Total: $18,412.75 due on receipt
";

    #[test]
    fn test_layout_names() {
        assert_eq!(BillLayout::from_name("legacy"), Some(BillLayout::Legacy));
        assert_eq!(BillLayout::from_name("OLD"), Some(BillLayout::Legacy));
        assert_eq!(BillLayout::from_name("current"), Some(BillLayout::Current));
        assert_eq!(BillLayout::from_name("new"), Some(BillLayout::Current));
        assert_eq!(BillLayout::from_name("fancy"), None);
    }

    #[test]
    fn test_legacy_capture() {
        let bill = Bill::from_text(LEGACY_TEXT, BillLayout::Legacy);
        assert_eq!(bill.invoice_no, "1234567890123");
        assert_eq!(bill.service_address, "12 HOPE ROAD KINGSTON 6");
        assert_eq!(bill.read_type, "Actual");
        assert_eq!(bill.read_date, NaiveDate::from_ymd_opt(2024, 7, 16));
        assert_eq!(bill.billing_period_days, Some(31));
        assert_eq!(bill.energy_used_kwh, Some(245.70));
        assert_eq!(bill.total_charges, Some(15230.50));
    }

    #[test]
    fn test_current_capture() {
        let bill = Bill::from_text(CURRENT_TEXT, BillLayout::Current);
        assert_eq!(bill.invoice_no, "9876543210");
        assert_eq!(bill.service_address, "12 HOPE ROAD KINGSTON 6");
        assert_eq!(bill.read_type, "Estimated");
        assert_eq!(bill.read_date, NaiveDate::from_ymd_opt(2024, 8, 16));
        assert_eq!(bill.billing_period_days, Some(30));
        assert_eq!(bill.energy_used_kwh, Some(187.25));
        assert_eq!(bill.total_charges, Some(18412.75));
    }

    #[test]
    fn test_missing_fields_stay_empty() {
        let bill = Bill::from_text("nothing matches here", BillLayout::Current);
        assert_eq!(bill.invoice_no, "");
        assert_eq!(bill.service_address, "");
        assert_eq!(bill.read_date, None);
        assert_eq!(bill.billing_period_days, None);
        assert_eq!(bill.energy_used_kwh, None);
        assert_eq!(bill.total_charges, None);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$15,230.50"), Some(15230.50));
        assert_eq!(parse_amount("18412.75 due on receipt"), Some(18412.75));
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn test_parse_read_date_uppercase_month() {
        assert_eq!(
            parse_read_date("16-JUL-2024"),
            NaiveDate::from_ymd_opt(2024, 7, 16)
        );
        assert_eq!(
            parse_read_date("01-Sep-2023"),
            NaiveDate::from_ymd_opt(2023, 9, 1)
        );
        assert_eq!(parse_read_date("garbage"), None);
    }
}
