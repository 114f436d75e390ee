//! Host capability traits.
//!
//! The exporter does not talk to a mail service or a storage backend
//! directly — both are injected as capability objects, so the same
//! procedure runs against the MBOX/filesystem backends shipped here or
//! against test doubles. Authentication, search indexing, and storage
//! semantics all live behind these seams.

pub mod fs;
pub mod mbox;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::address::EmailAddress;
use crate::search::Query;

/// A searchable message store.
pub trait MailSource {
    type Thread: MailThread;

    /// Return every thread with at least one message matching the query.
    fn search(&self, query: &Query) -> Result<Vec<Self::Thread>>;
}

/// An ordered group of related messages.
pub trait MailThread {
    type Message: MailMessage;

    /// Subject of the thread's first message.
    fn subject(&self) -> &str;

    /// All messages in the thread, matching or not.
    fn messages(&self) -> Result<Vec<Self::Message>>;
}

/// A single message.
pub trait MailMessage {
    type Attachment: MailAttachment;

    /// The message sender.
    fn sender(&self) -> &EmailAddress;

    /// The message date.
    fn date(&self) -> DateTime<Utc>;

    /// All attachments, payloads decoded.
    fn attachments(&self) -> Result<Vec<Self::Attachment>>;
}

/// A named, typed binary payload attached to a message.
pub trait MailAttachment {
    /// Attachment filename (generated when the headers carry none).
    fn filename(&self) -> &str;

    /// Declared MIME content type, `type/subtype`.
    fn content_type(&self) -> &str;

    /// Payload size in bytes.
    fn size(&self) -> u64;

    /// The decoded payload.
    fn content(&self) -> Result<Vec<u8>>;
}

/// A storage backend that can create folders.
pub trait DriveTarget {
    type Folder: DriveFolder;

    /// Create a NEW folder with the given display name.
    ///
    /// Each call produces a distinct folder even when the name is already
    /// taken — repeated runs never merge into an earlier run's folder.
    fn create_folder(&self, name: &str) -> Result<Self::Folder>;
}

/// A capability handle to one created folder.
pub trait DriveFolder {
    /// Copy a payload into the folder, returning the stored file name
    /// (which may differ from the requested one after sanitizing and
    /// collision handling).
    fn create_file(&mut self, filename: &str, content: &[u8]) -> Result<String>;

    /// Human-readable location of the folder, for reporting.
    fn location(&self) -> String;
}
