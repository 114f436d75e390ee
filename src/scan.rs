//! Scan exported bill PDFs into structured records.
//!
//! This is the second half of the original workflow: once the PDFs sit in
//! a destination folder, pull the billing fields out of their text and
//! write one row per bill. Unreadable PDFs (encrypted, scanned images,
//! corrupt) are logged and skipped; the scan keeps going.

use std::io::Write;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{BilldropError, Result};
use crate::model::bill::{Bill, BillLayout};

/// Scan every PDF in `dir` (non-recursive), returning one bill per
/// readable file, sorted by file name.
pub fn scan_folder(dir: &Path, layout: BillLayout) -> Result<Vec<Bill>> {
    if !dir.is_dir() {
        return Err(BilldropError::InvalidPath(format!(
            "not a directory: {}",
            dir.display()
        )));
    }

    let mut pdf_paths: Vec<std::path::PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| BilldropError::io(dir, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| is_pdf_path(p))
        .collect();
    pdf_paths.sort();

    let mut bills = Vec::new();
    for path in pdf_paths {
        match pdf_extract::extract_text(&path) {
            Ok(text) => {
                let mut bill = Bill::from_text(&text, layout);
                bill.source = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default()
                    .to_string();
                debug!(file = %bill.source, invoice = %bill.invoice_no, "Scanned bill");
                bills.push(bill);
            }
            Err(e) => {
                warn!(
                    file = %path.display(),
                    error = %e,
                    "Could not extract text, skipping"
                );
            }
        }
    }

    Ok(bills)
}

/// Whether a path looks like a PDF file (case-insensitive extension).
fn is_pdf_path(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Write scanned bills to a CSV file.
///
/// Output is UTF-8 with BOM for Excel compatibility.
pub fn write_csv(bills: &[Bill], output_path: &Path) -> Result<()> {
    let mut file =
        std::fs::File::create(output_path).map_err(|e| BilldropError::io(output_path, e))?;

    // UTF-8 BOM for Excel
    file.write_all(&[0xEF, 0xBB, 0xBF])?;

    writeln!(
        file,
        "Source,Invoice_No,Service_Address,Read_Date,Read_Type,Billing_Days,Energy_kWh,Total_Charges"
    )?;

    for bill in bills {
        let read_date = bill
            .read_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let days = bill
            .billing_period_days
            .map(|d| d.to_string())
            .unwrap_or_default();
        let energy = bill
            .energy_used_kwh
            .map(|e| format!("{e:.2}"))
            .unwrap_or_default();
        let charges = bill
            .total_charges
            .map(|c| format!("{c:.2}"))
            .unwrap_or_default();

        writeln!(
            file,
            "{},{},{},{},{},{},{},{}",
            csv_escape(&bill.source),
            csv_escape(&bill.invoice_no),
            csv_escape(&bill.service_address),
            read_date,
            csv_escape(&bill.read_type),
            days,
            energy,
            charges,
        )?;
    }

    Ok(())
}

/// Escape a value for CSV (RFC 4180).
///
/// Wraps in double quotes if the value contains commas, quotes, or newlines.
fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
