//! The normalized message record, the sole contract surface between the
//! extractor and every downstream stage.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One parsed email message.
///
/// A record is immutable once the extractor produces it; no downstream
/// component mutates it. Every container format (.eml, .mbox framing)
/// normalizes to this same shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Normalized sender address (lower-cased, trimmed). Empty if the
    /// `From:` header was absent or unparsable — never null.
    pub sender: String,

    /// Recipients from `To:` and `Cc:`, normalized, in header order,
    /// deduplicated.
    pub recipients: Vec<String>,

    /// Parsed `Date:` header normalized to UTC. `None` when the header
    /// is missing or unparsable; such records are excluded from date
    /// filtering but still count toward corpus-wide totals.
    pub timestamp: Option<DateTime<Utc>>,

    /// Raw subject line, possibly empty (encoded-words already decoded
    /// by the parser).
    pub subject: String,

    /// Plain-text body with multipart/HTML structure flattened.
    /// Attachment content is excluded.
    pub body: String,

    /// Attachment filenames, in document order.
    pub attachment_names: Vec<String>,

    /// Originating file, for audit and report traceability.
    pub source_path: PathBuf,
}

impl MessageRecord {
    /// The sender's domain part, if the address has one.
    pub fn sender_domain(&self) -> Option<&str> {
        self.sender.rsplit_once('@').map(|(_, domain)| domain)
    }

    /// Calendar date of the timestamp (UTC), if the record is dated.
    pub fn date(&self) -> Option<chrono::NaiveDate> {
        self.timestamp.map(|ts| ts.date_naive())
    }
}
