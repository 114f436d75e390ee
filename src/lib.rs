//! `billdrop` — export PDF bill attachments from mail archives.
//!
//! This crate provides the core library for searching an MBOX archive with a
//! sender/attachment query, copying every PDF attachment of the matching
//! threads into a freshly created destination folder, and scanning billing
//! fields out of the exported PDFs.

pub mod config;
pub mod error;
pub mod export;
pub mod host;
pub mod model;
pub mod scan;
pub mod search;
