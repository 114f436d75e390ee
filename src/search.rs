//! Search predicate parsing.
//!
//! The export query uses the mail host's native syntax, kept deliberately
//! small:
//!
//! - `from:billing@jpsco.com` / `from:"Jamaica Public Service"` —
//!   case-insensitive substring match on the sender name or address
//! - `has:attachment` / `has:no-attachment`
//! - bare terms — case-insensitive substring match on subject or sender
//!
//! Parsing never fails; unrecognized syntax degrades to a plain text term.
//! The query value itself is opaque configuration — whatever the user puts
//! in `[search] query` is parsed as-is.

use crate::model::address::EmailAddress;

/// A parsed search query.
#[derive(Debug, Clone, Default)]
pub struct Query {
    /// Sender patterns from `from:` terms (all must match).
    pub senders: Vec<String>,
    /// Plain text terms matched against subject or sender (all must match).
    pub terms: Vec<String>,
    /// `Some(true)` for `has:attachment`, `Some(false)` for
    /// `has:no-attachment`, `None` if unspecified.
    pub has_attachment: Option<bool>,
}

impl Query {
    /// Parse a query string.
    pub fn parse(input: &str) -> Self {
        let mut query = Query::default();

        for token in tokenize(input.trim()) {
            if let Some(value) = token.strip_prefix("from:") {
                if !value.is_empty() {
                    query.senders.push(value.to_string());
                }
            } else if let Some(value) = token.strip_prefix("has:") {
                match value {
                    "attachment" | "attachments" => query.has_attachment = Some(true),
                    "no-attachment" | "no-attachments" => query.has_attachment = Some(false),
                    _ => {}
                }
            } else if !token.is_empty() {
                query.terms.push(token);
            }
        }

        query
    }

    /// Whether a single message satisfies every condition of the query.
    pub fn matches_message(
        &self,
        sender: &EmailAddress,
        subject: &str,
        attachment_count: usize,
    ) -> bool {
        if !self.senders.iter().all(|pat| sender.contains(pat)) {
            return false;
        }

        let subject_lower = subject.to_lowercase();
        let matches_term = |term: &String| {
            subject_lower.contains(&term.to_lowercase()) || sender.contains(term)
        };
        if !self.terms.iter().all(matches_term) {
            return false;
        }

        match self.has_attachment {
            Some(true) => attachment_count > 0,
            Some(false) => attachment_count == 0,
            None => true,
        }
    }
}

/// Split a query into tokens, honoring double quotes.
///
/// Quotes may wrap a whole token (`"two words"`) or a field value
/// (`from:"two words"`); the quotes themselves are dropped.
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in input.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> EmailAddress {
        EmailAddress::parse("Jamaica Public Service Co. Ltd <bills@jpsco.com>")
    }

    #[test]
    fn test_parse_sender_and_attachment() {
        let q = Query::parse("from:\"Jamaica Public Service\" has:attachment");
        assert_eq!(q.senders, vec!["Jamaica Public Service"]);
        assert!(q.terms.is_empty());
        assert_eq!(q.has_attachment, Some(true));
    }

    #[test]
    fn test_parse_plain_terms() {
        let q = Query::parse("electricity bill");
        assert_eq!(q.terms, vec!["electricity", "bill"]);
        assert!(q.senders.is_empty());
        assert_eq!(q.has_attachment, None);
    }

    #[test]
    fn test_parse_no_attachment() {
        let q = Query::parse("has:no-attachment");
        assert_eq!(q.has_attachment, Some(false));
    }

    #[test]
    fn test_match_sender_case_insensitive() {
        let q = Query::parse("from:\"jamaica public service\"");
        assert!(q.matches_message(&sender(), "Your bill", 0));
    }

    #[test]
    fn test_match_requires_attachment() {
        let q = Query::parse("from:jpsco has:attachment");
        assert!(!q.matches_message(&sender(), "Your bill", 0));
        assert!(q.matches_message(&sender(), "Your bill", 2));
    }

    #[test]
    fn test_match_term_against_subject() {
        let q = Query::parse("electricity");
        assert!(q.matches_message(&sender(), "Your Electricity Bill", 0));
        assert!(!q.matches_message(&sender(), "Service notice", 0));
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let q = Query::parse("");
        assert!(q.matches_message(&sender(), "", 0));
    }
}
