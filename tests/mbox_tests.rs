//! End-to-end tests over the MBOX and filesystem backends.

use std::path::Path;

use billdrop::export::{export_pdf_attachments, preview_pdf_attachments};
use billdrop::host::fs::FsDrive;
use billdrop::host::mbox::MboxMailbox;
use billdrop::host::{MailSource, MailThread};
use billdrop::search::Query;

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

const BILLS_QUERY: &str = "from:\"Jamaica Public Service\" has:attachment";

#[test]
fn test_open_and_thread_count() {
    let mailbox = MboxMailbox::open(fixture("bills.mbox")).unwrap();
    // msg 1 + its reply form one thread; the water bill and the outage
    // notice are standalone.
    assert_eq!(mailbox.thread_count(), 3);
}

#[test]
fn test_search_matches_sender_with_attachments() {
    let mailbox = MboxMailbox::open(fixture("bills.mbox")).unwrap();
    let threads = mailbox.search(&Query::parse(BILLS_QUERY)).unwrap();

    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].subject(), "Your JPS bill for January");
    assert_eq!(threads[0].messages().unwrap().len(), 2);
}

#[test]
fn test_export_copies_only_pdfs() {
    let mailbox = MboxMailbox::open(fixture("bills.mbox")).unwrap();
    let tmp = tempfile::tempdir().unwrap();
    let drive = FsDrive::new(tmp.path()).unwrap();

    let report = export_pdf_attachments(
        &mailbox,
        &drive,
        &Query::parse(BILLS_QUERY),
        "JPS Bills",
        &|_, _| {},
    )
    .unwrap();

    assert_eq!(report.threads, 1);
    assert_eq!(report.messages, 2);
    assert_eq!(report.attachments, 3);
    // bill_jan.pdf by MIME type, Invoice.PDF by case-insensitive suffix;
    // meter.png stays behind.
    assert_eq!(report.copied, vec!["bill_jan.pdf", "Invoice.PDF"]);
    assert_eq!(report.skipped, 1);

    let folder = Path::new(&report.folder);
    assert!(folder.join("bill_jan.pdf").is_file());
    assert!(folder.join("Invoice.PDF").is_file());
    assert!(!folder.join("meter.png").exists());

    let pdf = std::fs::read(folder.join("bill_jan.pdf")).unwrap();
    assert_eq!(pdf, b"%PDF-1.4\n% fixture january bill\n");
}

#[test]
fn test_export_twice_creates_two_folders() {
    let mailbox = MboxMailbox::open(fixture("bills.mbox")).unwrap();
    let tmp = tempfile::tempdir().unwrap();
    let drive = FsDrive::new(tmp.path()).unwrap();
    let query = Query::parse(BILLS_QUERY);

    let first = export_pdf_attachments(&mailbox, &drive, &query, "JPS Bills", &|_, _| {}).unwrap();
    let second = export_pdf_attachments(&mailbox, &drive, &query, "JPS Bills", &|_, _| {}).unwrap();

    assert_ne!(first.folder, second.folder);
    assert_eq!(first.copied, second.copied);
    assert!(Path::new(&second.folder).join("bill_jan.pdf").is_file());
}

#[test]
fn test_empty_query_exports_every_pdf() {
    let mailbox = MboxMailbox::open(fixture("bills.mbox")).unwrap();
    let tmp = tempfile::tempdir().unwrap();
    let drive = FsDrive::new(tmp.path()).unwrap();

    let report =
        export_pdf_attachments(&mailbox, &drive, &Query::parse(""), "All", &|_, _| {}).unwrap();

    assert_eq!(report.threads, 3);
    assert_eq!(
        report.copied,
        vec!["bill_jan.pdf", "Invoice.PDF", "water_jan.pdf"]
    );
}

#[test]
fn test_preview_touches_nothing() {
    let mailbox = MboxMailbox::open(fixture("bills.mbox")).unwrap();
    let planned = preview_pdf_attachments(&mailbox, &Query::parse(BILLS_QUERY)).unwrap();

    assert_eq!(planned.len(), 2);
    assert_eq!(planned[0].filename, "bill_jan.pdf");
    assert_eq!(planned[0].content_type, "application/pdf");
    assert_eq!(planned[1].filename, "Invoice.PDF");
    assert_eq!(planned[1].content_type, "application/octet-stream");
    assert!(planned
        .iter()
        .all(|p| p.sender.contains("Jamaica Public Service")));
}

#[test]
fn test_exported_tree_layout() {
    use assert_fs::prelude::*;
    use predicates::prelude::*;

    let mailbox = MboxMailbox::open(fixture("bills.mbox")).unwrap();
    let tmp = assert_fs::TempDir::new().unwrap();
    let drive = FsDrive::new(tmp.path()).unwrap();

    export_pdf_attachments(
        &mailbox,
        &drive,
        &Query::parse(BILLS_QUERY),
        "JPS Bills",
        &|_, _| {},
    )
    .unwrap();

    tmp.child("JPS Bills").assert(predicate::path::is_dir());
    tmp.child("JPS Bills/bill_jan.pdf")
        .assert(predicate::path::is_file());
    tmp.child("JPS Bills/meter.png")
        .assert(predicate::path::missing());
}

#[test]
fn test_no_match_still_creates_folder() {
    let mailbox = MboxMailbox::open(fixture("bills.mbox")).unwrap();
    let tmp = tempfile::tempdir().unwrap();
    let drive = FsDrive::new(tmp.path()).unwrap();

    let report = export_pdf_attachments(
        &mailbox,
        &drive,
        &Query::parse("from:nobody@nowhere.example"),
        "Empty",
        &|_, _| {},
    )
    .unwrap();

    assert_eq!(report.threads, 0);
    assert!(report.copied.is_empty());
    assert!(Path::new(&report.folder).is_dir());
}
