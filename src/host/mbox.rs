//! MBOX-backed implementation of the mail capability traits.
//!
//! A Gmail Takeout export of the billing label is a single MBOX file. The
//! archive is split on `From ` separator lines, headers are scanned for the
//! fields the search predicate needs, and messages are grouped into threads
//! by reference-chain root. Attachment payloads are decoded with
//! `mail-parser`, and only when a caller asks for them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mail_parser::{MessageParser, MimeHeaders};
use tracing::debug;

use crate::error::{BilldropError, Result};
use crate::host::{MailAttachment, MailMessage, MailSource, MailThread};
use crate::model::address::EmailAddress;
use crate::search::Query;

/// A local MBOX archive, opened and indexed up front.
#[derive(Debug)]
pub struct MboxMailbox {
    path: PathBuf,
    threads: Vec<MboxThread>,
}

/// One conversation thread from the archive.
#[derive(Debug, Clone)]
pub struct MboxThread {
    subject: String,
    messages: Vec<MboxMessage>,
}

/// One message, with its raw bytes retained for lazy attachment decoding.
#[derive(Debug, Clone)]
pub struct MboxMessage {
    raw: Arc<Vec<u8>>,
    sender: EmailAddress,
    subject: String,
    date: DateTime<Utc>,
    message_id: String,
    in_reply_to: Option<String>,
    references: Vec<String>,
    attachment_count: usize,
}

/// A decoded attachment.
#[derive(Debug, Clone)]
pub struct MboxAttachment {
    filename: String,
    content_type: String,
    data: Vec<u8>,
}

impl MboxMailbox {
    /// Open an MBOX file and index its messages into threads.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(BilldropError::MailboxNotFound(path.to_path_buf()));
        }

        let bytes = std::fs::read(path).map_err(|e| BilldropError::io(path, e))?;
        if !bytes.is_empty() && !bytes.starts_with(b"From ") {
            return Err(BilldropError::InvalidMbox(path.to_path_buf()));
        }

        let messages: Vec<MboxMessage> = split_messages(&bytes)
            .into_iter()
            .enumerate()
            .map(|(seq, raw)| MboxMessage::from_raw(raw, seq))
            .collect();

        let threads = group_threads(messages);
        debug!(
            path = %path.display(),
            threads = threads.len(),
            "Opened mailbox"
        );

        Ok(Self {
            path: path.to_path_buf(),
            threads,
        })
    }

    /// Total number of threads in the archive, matching or not.
    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }
}

impl MailSource for MboxMailbox {
    type Thread = MboxThread;

    fn search(&self, query: &Query) -> Result<Vec<MboxThread>> {
        let matching: Vec<MboxThread> = self
            .threads
            .iter()
            .filter(|thread| {
                thread.messages.iter().any(|m| {
                    query.matches_message(&m.sender, &m.subject, m.attachment_count)
                })
            })
            .cloned()
            .collect();

        debug!(
            path = %self.path.display(),
            matched = matching.len(),
            total = self.threads.len(),
            "Thread search complete"
        );
        Ok(matching)
    }
}

impl MailThread for MboxThread {
    type Message = MboxMessage;

    fn subject(&self) -> &str {
        &self.subject
    }

    fn messages(&self) -> Result<Vec<MboxMessage>> {
        Ok(self.messages.clone())
    }
}

impl MboxMessage {
    fn from_raw(raw: Vec<u8>, sequence: usize) -> Self {
        let headers = scan_headers(&raw);

        let sender = EmailAddress::parse(headers.get("from").map(String::as_str).unwrap_or(""));
        let subject = headers.get("subject").cloned().unwrap_or_default();
        let date = headers
            .get("date")
            .and_then(|d| parse_header_date(d))
            .unwrap_or(DateTime::UNIX_EPOCH);

        let message_id = headers
            .get("message-id")
            .map(|v| extract_angle_bracket(v))
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| format!("<seq-{sequence}@local>"));
        let in_reply_to = headers
            .get("in-reply-to")
            .map(|v| extract_angle_bracket(v))
            .filter(|v| !v.is_empty());
        let references = headers
            .get("references")
            .map(|v| extract_all_angle_brackets(v))
            .unwrap_or_default();

        let attachment_count = MessageParser::default()
            .parse(skip_from_line(&raw))
            .map(|msg| msg.attachments().count())
            .unwrap_or(0);

        Self {
            raw: Arc::new(raw),
            sender,
            subject,
            date,
            message_id,
            in_reply_to,
            references,
            attachment_count,
        }
    }

    /// Root of the reference chain: the thread grouping key.
    fn thread_root(&self) -> String {
        self.references
            .first()
            .cloned()
            .or_else(|| self.in_reply_to.clone())
            .unwrap_or_else(|| self.message_id.clone())
    }
}

impl MailMessage for MboxMessage {
    type Attachment = MboxAttachment;

    fn sender(&self) -> &EmailAddress {
        &self.sender
    }

    fn date(&self) -> DateTime<Utc> {
        self.date
    }

    fn attachments(&self) -> Result<Vec<MboxAttachment>> {
        let parsed = match MessageParser::default().parse(skip_from_line(&self.raw)) {
            Some(msg) => msg,
            None => return Ok(Vec::new()),
        };

        let mut result = Vec::new();
        for (idx, part) in parsed.attachments().enumerate() {
            let filename = part
                .attachment_name()
                .map(String::from)
                .unwrap_or_else(|| format!("attachment_{idx}"));

            let content_type = part
                .content_type()
                .map(|ct: &mail_parser::ContentType| {
                    let main = ct.ctype();
                    match ct.subtype() {
                        Some(sub) => format!("{main}/{sub}"),
                        None => main.to_string(),
                    }
                })
                .unwrap_or_else(|| "application/octet-stream".to_string());

            result.push(MboxAttachment {
                filename,
                content_type,
                data: part.contents().to_vec(),
            });
        }
        Ok(result)
    }
}

impl MailAttachment for MboxAttachment {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn content(&self) -> Result<Vec<u8>> {
        Ok(self.data.clone())
    }
}

// ── MBOX splitting ──────────────────────────────────────────────

/// Split an archive into raw per-message byte blocks.
///
/// A message starts at every line beginning with `From ` — occurrences
/// inside bodies are escaped as `>From ` by mboxrd writers, and base64
/// content cannot contain a space, so the plain prefix is a safe boundary.
fn split_messages(bytes: &[u8]) -> Vec<Vec<u8>> {
    let mut messages = Vec::new();
    let mut start: Option<usize> = None;
    let mut pos = 0;

    while pos < bytes.len() {
        let line_end = bytes[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|i| pos + i + 1)
            .unwrap_or(bytes.len());

        if bytes[pos..].starts_with(b"From ") {
            if let Some(s) = start {
                messages.push(bytes[s..pos].to_vec());
            }
            start = Some(pos);
        }
        pos = line_end;
    }

    if let Some(s) = start {
        messages.push(bytes[s..].to_vec());
    }
    messages
}

/// Strip the leading `From ` separator line if present.
fn skip_from_line(raw: &[u8]) -> &[u8] {
    if raw.starts_with(b"From ") {
        match raw.iter().position(|&b| b == b'\n') {
            Some(i) => &raw[i + 1..],
            None => &[],
        }
    } else {
        raw
    }
}

// ── Header scanning ─────────────────────────────────────────────

/// Minimal header map used by the search predicate.
#[derive(Debug, Default)]
struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    fn get(&self, name: &str) -> Option<&String> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

/// Scan the header block (up to the first empty line), unfolding
/// continuation lines. Names are lowercased.
fn scan_headers(raw: &[u8]) -> HeaderMap {
    let block = skip_from_line(raw);
    let text = String::from_utf8_lossy(block);

    let mut map = HeaderMap::default();
    for line in text.lines() {
        if line.is_empty() {
            break;
        }
        if (line.starts_with(' ') || line.starts_with('\t')) && !map.entries.is_empty() {
            // Folded continuation of the previous header
            let last = map.entries.len() - 1;
            map.entries[last].1.push(' ');
            map.entries[last].1.push_str(line.trim());
        } else if let Some(colon) = line.find(':') {
            let name = line[..colon].trim().to_lowercase();
            let value = line[colon + 1..].trim().to_string();
            map.entries.push((name, value));
        }
    }
    map
}

/// Extract the first `<...>` token from a header value, or the trimmed
/// value itself when no brackets are present.
fn extract_angle_bracket(value: &str) -> String {
    match (value.find('<'), value.find('>')) {
        (Some(start), Some(end)) if end > start => value[start..=end].to_string(),
        _ => value.trim().to_string(),
    }
}

/// Extract every `<...>` token from a `References` header value.
fn extract_all_angle_brackets(value: &str) -> Vec<String> {
    let mut ids = Vec::new();
    let mut rest = value;
    while let (Some(start), Some(end)) = (rest.find('<'), rest.find('>')) {
        if end <= start {
            break;
        }
        ids.push(rest[start..=end].to_string());
        rest = &rest[end + 1..];
    }
    ids
}

/// Parse an RFC 5322 `Date:` value by wrapping it in a minimal message and
/// letting `mail-parser` do the work.
fn parse_header_date(input: &str) -> Option<DateTime<Utc>> {
    let fake_msg = format!("Date: {input}\n\n");
    let parsed = MessageParser::default().parse(fake_msg.as_bytes())?;
    let rfc3339 = parsed.date()?.to_rfc3339();
    DateTime::parse_from_rfc3339(&rfc3339)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

// ── Threading ───────────────────────────────────────────────────

/// Group messages into threads by reference-chain root.
///
/// A flattened take on JWZ threading: the root key is the first
/// `References` id, else `In-Reply-To`, else the message's own id.
/// Threads keep archive order; so do messages within a thread.
fn group_threads(messages: Vec<MboxMessage>) -> Vec<MboxThread> {
    let mut order: Vec<String> = Vec::new();
    let mut grouped: std::collections::HashMap<String, Vec<MboxMessage>> =
        std::collections::HashMap::new();

    for message in messages {
        let root = message.thread_root();
        if !grouped.contains_key(&root) {
            order.push(root.clone());
        }
        grouped.entry(root).or_default().push(message);
    }

    order
        .into_iter()
        .map(|root| {
            let messages = grouped.remove(&root).unwrap_or_default();
            let subject = messages
                .first()
                .map(|m| m.subject.clone())
                .unwrap_or_default();
            MboxThread { subject, messages }
        })
        .collect()
}
