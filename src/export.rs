//! The export procedure: search threads, walk every message, copy every
//! PDF attachment into a freshly created destination folder.
//!
//! The procedure is deliberately linear and unforgiving: the destination
//! folder is created even when nothing matches, nothing is retried, and a
//! failing host call aborts the run where it stands, leaving prior copies
//! in place. Runs never deduplicate against each other — each one gets its
//! own folder.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::host::{DriveFolder, DriveTarget, MailAttachment, MailMessage, MailSource, MailThread};
use crate::search::Query;

/// The PDF MIME type the filter compares against.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Whether an attachment should be exported.
///
/// The OR is deliberate: the content-type arm catches PDFs with
/// non-standard filenames, the suffix arm catches PDFs mislabeled with a
/// generic MIME type (`application/octet-stream` is common from billing
/// systems).
pub fn is_pdf(content_type: &str, filename: &str) -> bool {
    content_type == PDF_CONTENT_TYPE || filename.to_lowercase().ends_with(".pdf")
}

/// Outcome of one export run.
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    /// Display location of the created destination folder.
    pub folder: String,
    /// Threads the query matched.
    pub threads: usize,
    /// Messages walked across those threads.
    pub messages: usize,
    /// Attachments inspected.
    pub attachments: usize,
    /// Stored names of the copied files, in copy order.
    pub copied: Vec<String>,
    /// Attachments inspected but not copied.
    pub skipped: usize,
    /// Total bytes written.
    pub bytes: u64,
}

/// One attachment a dry run would copy.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedCopy {
    pub filename: String,
    pub content_type: String,
    pub size: u64,
    pub sender: String,
    pub date: DateTime<Utc>,
}

/// Run the export: one new folder, then every PDF attachment of every
/// message of every matching thread copied into it.
///
/// `progress` is called with `(threads_done, threads_total)`.
pub fn export_pdf_attachments<M, D>(
    mail: &M,
    drive: &D,
    query: &Query,
    folder_name: &str,
    progress: &dyn Fn(usize, usize),
) -> Result<ExportReport>
where
    M: MailSource,
    D: DriveTarget,
{
    let threads = mail.search(query)?;

    // Created unconditionally, even for zero matches.
    let mut folder = drive.create_folder(folder_name)?;
    info!(
        folder = %folder.location(),
        threads = threads.len(),
        "Starting export"
    );

    let mut report = ExportReport {
        folder: folder.location(),
        threads: threads.len(),
        messages: 0,
        attachments: 0,
        copied: Vec::new(),
        skipped: 0,
        bytes: 0,
    };

    let total = threads.len();
    for (i, thread) in threads.iter().enumerate() {
        progress(i, total);

        for message in thread.messages()? {
            report.messages += 1;

            for attachment in message.attachments()? {
                report.attachments += 1;

                if !is_pdf(attachment.content_type(), attachment.filename()) {
                    report.skipped += 1;
                    continue;
                }

                let content = attachment.content()?;
                let stored = folder.create_file(attachment.filename(), &content)?;
                report.bytes += content.len() as u64;
                report.copied.push(stored);
            }
        }
    }
    progress(total, total);

    if report.copied.is_empty() {
        warn!(folder = %report.folder, "No PDF attachments matched; folder left empty");
    } else {
        info!(
            copied = report.copied.len(),
            bytes = report.bytes,
            "Export complete"
        );
    }

    Ok(report)
}

/// Dry run: same traversal and filter as the export, but nothing is
/// created and nothing is copied.
pub fn preview_pdf_attachments<M>(mail: &M, query: &Query) -> Result<Vec<PlannedCopy>>
where
    M: MailSource,
{
    let mut planned = Vec::new();

    for thread in mail.search(query)? {
        for message in thread.messages()? {
            for attachment in message.attachments()? {
                if is_pdf(attachment.content_type(), attachment.filename()) {
                    planned.push(PlannedCopy {
                        filename: attachment.filename().to_string(),
                        content_type: attachment.content_type().to_string(),
                        size: attachment.size(),
                        sender: message.sender().display(),
                        date: message.date(),
                    });
                }
            }
        }
    }

    Ok(planned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pdf_by_content_type() {
        assert!(is_pdf("application/pdf", "data.bin"));
    }

    #[test]
    fn test_is_pdf_by_suffix_case_insensitive() {
        assert!(is_pdf("application/octet-stream", "Invoice.PDF"));
        assert!(is_pdf("application/octet-stream", "invoice.pdf"));
    }

    #[test]
    fn test_is_pdf_rejects_others() {
        assert!(!is_pdf("image/png", "photo.png"));
        assert!(!is_pdf("application/octet-stream", "notes.txt"));
        assert!(!is_pdf("application/pdf-ish", "report.doc"));
    }
}
