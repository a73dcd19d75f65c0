//! Email address parsing and normalization.
//!
//! The normalized form (lower-cased, whitespace-trimmed bare address) is
//! the node identity key in the communication graph, so everything that
//! touches an address must go through [`normalize`] or
//! [`EmailAddress::normalized`].

use serde::{Deserialize, Serialize};

/// A parsed email address.
///
/// # Examples
/// - `"Jane Doe <Jane@Example.com>"` → `display_name = "Jane Doe"`, `address = "Jane@Example.com"`
/// - `"user@example.com"` → `display_name = ""`, `address = "user@example.com"`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmailAddress {
    /// Human-readable display name (may be empty).
    pub display_name: String,
    /// The bare address as written in the header, angle brackets removed.
    pub address: String,
}

impl EmailAddress {
    /// Parse a single address token from a header value.
    ///
    /// Malformed syntax never fails: the raw token is kept as the
    /// address so the record (and graph node) survives, lower-cased at
    /// normalization time.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();

        // "Display Name <address>" or "<address>"
        if let (Some(open), Some(close)) = (trimmed.rfind('<'), trimmed.rfind('>')) {
            if close > open {
                return Self {
                    display_name: strip_quotes(&trimmed[..open]),
                    address: trimmed[open + 1..close].trim().to_string(),
                };
            }
        }

        // Bare address or unrecognized token: keep as-is
        Self {
            display_name: String::new(),
            address: trimmed.to_string(),
        }
    }

    /// Parse a comma-separated address header value.
    ///
    /// Commas inside quoted display names (`"Last, First" <a@b.com>`) and
    /// inside angle brackets do not split. Empty segments are dropped.
    pub fn parse_list(raw: &str) -> Vec<Self> {
        let mut out = Vec::new();
        let mut segment = String::new();
        let mut in_quotes = false;
        let mut in_angle = false;

        for ch in raw.chars() {
            match ch {
                '"' => {
                    in_quotes = !in_quotes;
                    segment.push(ch);
                }
                '<' if !in_quotes => {
                    in_angle = true;
                    segment.push(ch);
                }
                '>' if !in_quotes => {
                    in_angle = false;
                    segment.push(ch);
                }
                ',' if !in_quotes && !in_angle => {
                    push_nonempty(&mut out, &segment);
                    segment.clear();
                }
                _ => segment.push(ch),
            }
        }
        push_nonempty(&mut out, &segment);
        out
    }

    /// The graph-identity form: lower-cased, whitespace-trimmed address.
    pub fn normalized(&self) -> String {
        normalize(&self.address)
    }
}

/// Normalize a raw address string: trim whitespace and case-fold.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn push_nonempty(out: &mut Vec<EmailAddress>, segment: &str) {
    let addr = EmailAddress::parse(segment);
    if !addr.address.is_empty() {
        out.push(addr);
    }
}

/// Strip surrounding double-quotes and trim whitespace.
fn strip_quotes(s: &str) -> String {
    let trimmed = s.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .map(|inner| inner.trim().to_string())
        .unwrap_or_else(|| trimmed.to_string())
}
