//! Sender address parsing (RFC 5322 §3.4).

/// A parsed sender address.
///
/// # Examples
/// - `"JPS Billing <billing@jpsco.com>"` → `display_name = "JPS Billing"`, `address = "billing@jpsco.com"`
/// - `"billing@jpsco.com"` → `display_name = ""`, `address = "billing@jpsco.com"`
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct EmailAddress {
    /// Human-readable display name (may be empty).
    pub display_name: String,
    /// The bare email address (`user@domain`).
    pub address: String,
}

impl EmailAddress {
    /// Parse a single address from a header value.
    ///
    /// Supported formats:
    /// - `"user@domain.com"`
    /// - `"<user@domain.com>"`
    /// - `"Display Name <user@domain.com>"`
    /// - `"\"Display, Name\" <user@domain.com>"`
    ///
    /// If parsing fails, the raw string is stored as `address`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::default();
        }

        if let (Some(angle_start), Some(angle_end)) = (trimmed.rfind('<'), trimmed.rfind('>')) {
            if angle_end > angle_start {
                return Self {
                    display_name: strip_quotes(&trimmed[..angle_start]),
                    address: trimmed[angle_start + 1..angle_end].trim().to_string(),
                };
            }
        }

        // Bare address or unparseable: store as-is
        Self {
            display_name: String::new(),
            address: trimmed.to_string(),
        }
    }

    /// Case-insensitive substring match against the display name or address.
    ///
    /// This is how the sender predicate of a search query is evaluated:
    /// `from:"Jamaica Public Service"` matches both
    /// `"Jamaica Public Service Co. Ltd <bills@jpsco.com>"` and a bare
    /// `jamaica.public.service@jpsco.com`.
    pub fn contains(&self, pattern: &str) -> bool {
        let pat = pattern.to_lowercase();
        self.display_name.to_lowercase().contains(&pat)
            || self.address.to_lowercase().contains(&pat)
    }

    /// Format for display: `"Display Name <address>"` or just `"address"`.
    pub fn display(&self) -> String {
        if self.display_name.is_empty() {
            self.address.clone()
        } else {
            format!("{} <{}>", self.display_name, self.address)
        }
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Strip surrounding double-quotes and trim whitespace.
fn strip_quotes(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_address() {
        let addr = EmailAddress::parse("user@example.com");
        assert_eq!(addr.display_name, "");
        assert_eq!(addr.address, "user@example.com");
    }

    #[test]
    fn test_parse_display_name() {
        let addr = EmailAddress::parse("JPS Billing <billing@jpsco.com>");
        assert_eq!(addr.display_name, "JPS Billing");
        assert_eq!(addr.address, "billing@jpsco.com");
    }

    #[test]
    fn test_parse_quoted_display_name() {
        let addr = EmailAddress::parse("\"Billing, JPS\" <billing@jpsco.com>");
        assert_eq!(addr.display_name, "Billing, JPS");
        assert_eq!(addr.address, "billing@jpsco.com");
    }

    #[test]
    fn test_parse_angle_only() {
        let addr = EmailAddress::parse("<billing@jpsco.com>");
        assert_eq!(addr.display_name, "");
        assert_eq!(addr.address, "billing@jpsco.com");
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        let addr = EmailAddress::parse("Jamaica Public Service Co. Ltd <bills@jpsco.com>");
        assert!(addr.contains("jamaica public service"));
        assert!(addr.contains("JPSCO.COM"));
        assert!(!addr.contains("nwc"));
    }

    #[test]
    fn test_display_roundtrip() {
        let addr = EmailAddress::parse("JPS Billing <billing@jpsco.com>");
        assert_eq!(addr.display(), "JPS Billing <billing@jpsco.com>");
        let bare = EmailAddress::parse("billing@jpsco.com");
        assert_eq!(bare.display(), "billing@jpsco.com");
    }
}
