//! Extraction of a normalized [`MessageRecord`] from one raw RFC 5322
//! message.
//!
//! Header fields that drive the communication graph (From/To/Cc/Date)
//! are scanned manually so malformed syntax degrades to a raw
//! lower-cased token instead of losing the record. Body flattening and
//! attachment listing go through `mail-parser`, with manual fallbacks
//! when it rejects the message outright.

use std::path::Path;

use mail_parser::{MessageParser, MimeHeaders};

use crate::error::{Result, SleuthError};
use crate::model::address::EmailAddress;
use crate::model::record::MessageRecord;
use crate::parser::date;

/// Parse one raw message blob into a [`MessageRecord`].
///
/// Fails with [`SleuthError::Parse`] when no header structure can be
/// found, or [`SleuthError::Encoding`] when the bytes resist even the
/// permissive fallback decode. A missing or unparsable `Date:` header
/// is *not* an error: the record is returned with `timestamp = None`.
pub fn extract_record(raw: &[u8], source: &Path) -> Result<MessageRecord> {
    let text = decode_bytes(raw);
    let headers = unfold_headers(header_section(&text));

    if headers.is_empty() {
        return Err(if std::str::from_utf8(raw).is_err() {
            SleuthError::Encoding {
                path: source.to_path_buf(),
                reason: "no header structure survived fallback decoding".to_string(),
            }
        } else {
            SleuthError::Parse {
                path: source.to_path_buf(),
                reason: "no RFC 5322 headers found".to_string(),
            }
        });
    }

    let sender = get_header(&headers, "from")
        .map(|v| EmailAddress::parse(v).normalized())
        .unwrap_or_default();

    let mut recipients: Vec<String> = Vec::new();
    for name in ["to", "cc"] {
        if let Some(value) = get_header(&headers, name) {
            for addr in EmailAddress::parse_list(value) {
                let normalized = addr.normalized();
                if !normalized.is_empty() && !recipients.contains(&normalized) {
                    recipients.push(normalized);
                }
            }
        }
    }

    let timestamp = get_header(&headers, "date").and_then(|v| date::parse_date(v));

    let parsed = MessageParser::default().parse(raw);

    let subject = parsed
        .as_ref()
        .and_then(|m| m.subject())
        .map(String::from)
        .or_else(|| get_header(&headers, "subject").map(String::from))
        .unwrap_or_default();

    let (body, attachment_names) = match parsed.as_ref() {
        Some(msg) => (flatten_body(msg), list_attachment_names(msg)),
        None => (body_section(&text).to_string(), Vec::new()),
    };

    Ok(MessageRecord {
        sender,
        recipients,
        timestamp,
        subject,
        body,
        attachment_names,
        source_path: source.to_path_buf(),
    })
}

/// Decode raw message bytes to a string.
///
/// Tries UTF-8 first, then falls back to WINDOWS-1252, which accepts
/// every byte sequence.
fn decode_bytes(raw: &[u8]) -> String {
    let raw = raw.strip_prefix(&[0xEF, 0xBB, 0xBF][..]).unwrap_or(raw);
    match std::str::from_utf8(raw) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(raw);
            decoded.into_owned()
        }
    }
}

/// Everything before the first blank line.
fn header_section(text: &str) -> &str {
    match (text.find("\n\n"), text.find("\r\n\r\n")) {
        (Some(a), Some(b)) => &text[..a.min(b)],
        (Some(a), None) => &text[..a],
        (None, Some(b)) => &text[..b],
        (None, None) => text,
    }
}

/// Everything after the first blank line (fallback body when
/// `mail-parser` cannot parse the message).
fn body_section(text: &str) -> &str {
    if let Some(pos) = text.find("\r\n\r\n") {
        &text[pos + 4..]
    } else if let Some(pos) = text.find("\n\n") {
        &text[pos + 2..]
    } else {
        ""
    }
}

/// Unfold headers: continuation lines (leading space/tab) join the
/// previous header. Returns `(lowercase_name, value)` pairs.
fn unfold_headers(text: &str) -> Vec<(String, String)> {
    let mut result: Vec<(String, String)> = Vec::new();
    for line in text.lines() {
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some(last) = result.last_mut() {
                last.1.push(' ');
                last.1.push_str(line.trim());
            }
        } else if let Some(colon) = line.find(':') {
            result.push((
                line[..colon].trim().to_lowercase(),
                line[colon + 1..].trim().to_string(),
            ));
        }
        // Lines with neither a colon nor a fold are silently skipped
    }
    result
}

/// First value for a header name (already lower-cased keys).
fn get_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

/// Flatten a multipart message to plain text.
///
/// All `text/plain` parts are concatenated in document order. Only when
/// no plain part exists do the `text/html` parts contribute, stripped
/// to text. Attachment content never appears in the body.
fn flatten_body(msg: &mail_parser::Message<'_>) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut idx = 0;
    while let Some(part) = msg.body_text(idx) {
        parts.push(part.into_owned());
        idx += 1;
    }

    if parts.is_empty() {
        let mut idx = 0;
        while let Some(html) = msg.body_html(idx) {
            parts.push(html_to_text(&html));
            idx += 1;
        }
    }

    parts.join("\n")
}

/// Attachment filenames in document order.
fn list_attachment_names(msg: &mail_parser::Message<'_>) -> Vec<String> {
    msg.attachments()
        .enumerate()
        .map(|(idx, part)| {
            part.attachment_name()
                .map(String::from)
                .unwrap_or_else(|| format!("attachment_{idx}"))
        })
        .collect()
}

/// Strip an HTML body down to readable text.
pub fn html_to_text(html: &str) -> String {
    let mut text = remove_tag_block(html, "script");
    text = remove_tag_block(&text, "style");

    // Block-level elements become line breaks before tags are stripped
    for tag in ["<br>", "<br/>", "<br />", "</p>", "</div>", "</li>", "</tr>"] {
        text = replace_case_insensitive(&text, tag, "\n");
    }

    let mut stripped = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => stripped.push(ch),
            _ => {}
        }
    }

    let stripped = stripped
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ");

    // Collapse runs of blank lines
    let mut cleaned = String::with_capacity(stripped.len());
    let mut prev_blank = true;
    for line in stripped.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !prev_blank {
                cleaned.push('\n');
                prev_blank = true;
            }
        } else {
            cleaned.push_str(trimmed);
            cleaned.push('\n');
            prev_blank = false;
        }
    }
    cleaned.trim().to_string()
}

/// Remove `<tag …>…</tag>` blocks, case-insensitively.
fn remove_tag_block(html: &str, tag: &str) -> String {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let mut result = String::with_capacity(html.len());
    let mut remaining = html;

    while let Some(start) = find_ascii_ci(remaining, &open) {
        result.push_str(&remaining[..start]);
        match find_ascii_ci(&remaining[start..], &close) {
            Some(end) => remaining = &remaining[start + end + close.len()..],
            None => return result,
        }
    }
    result.push_str(remaining);
    result
}

fn replace_case_insensitive(text: &str, pattern: &str, replacement: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut remaining = text;
    while let Some(at) = find_ascii_ci(remaining, pattern) {
        result.push_str(&remaining[..at]);
        result.push_str(replacement);
        remaining = &remaining[at + pattern.len()..];
    }
    result.push_str(remaining);
    result
}

/// Byte-wise ASCII case-insensitive substring search.
///
/// The needle must be ASCII, so a match offset always lands on a char
/// boundary (ASCII bytes never occur inside a multi-byte sequence).
fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || h.len() < n.len() {
        return None;
    }
    (0..=h.len() - n.len()).find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn source() -> PathBuf {
        PathBuf::from("test.eml")
    }

    #[test]
    fn test_extract_simple_message() {
        let raw = b"From: Alice <Alice@Example.com>\r\n\
                    To: bob@example.com, carol@example.com\r\n\
                    Subject: Quarterly numbers\r\n\
                    Date: Thu, 04 Jan 2024 10:00:00 +0000\r\n\
                    \r\n\
                    Please see attached.\r\n";
        let rec = extract_record(raw, &source()).unwrap();
        assert_eq!(rec.sender, "alice@example.com");
        assert_eq!(rec.recipients, vec!["bob@example.com", "carol@example.com"]);
        assert_eq!(rec.subject, "Quarterly numbers");
        assert!(rec.timestamp.is_some());
        assert!(rec.body.contains("Please see attached."));
    }

    #[test]
    fn test_missing_date_is_none_not_error() {
        let raw = b"From: a@b.com\nTo: c@d.com\nSubject: hi\n\nbody\n";
        let rec = extract_record(raw, &source()).unwrap();
        assert_eq!(rec.timestamp, None);
    }

    #[test]
    fn test_unparsable_date_is_none() {
        let raw = b"From: a@b.com\nDate: yesterday sometime\n\nbody\n";
        let rec = extract_record(raw, &source()).unwrap();
        assert_eq!(rec.timestamp, None);
    }

    #[test]
    fn test_malformed_from_kept_raw_lowercased() {
        let raw = b"From: TOTALLY BROKEN\nTo: c@d.com\n\nbody\n";
        let rec = extract_record(raw, &source()).unwrap();
        assert_eq!(rec.sender, "totally broken");
    }

    #[test]
    fn test_recipients_deduplicated_in_order() {
        let raw = b"From: a@b.com\nTo: x@y.com, z@w.com\nCc: X@Y.com, q@r.com\n\nbody\n";
        let rec = extract_record(raw, &source()).unwrap();
        assert_eq!(rec.recipients, vec!["x@y.com", "z@w.com", "q@r.com"]);
    }

    #[test]
    fn test_garbage_fails_parse() {
        let err = extract_record(b"no structure here whatsoever", &source()).unwrap_err();
        assert!(matches!(err, SleuthError::Parse { .. }));
    }

    #[test]
    fn test_latin1_bytes_decode_via_fallback() {
        // "café" in ISO-8859-1: the 0xE9 byte is invalid UTF-8
        let raw = b"From: a@b.com\nSubject: caf\xe9\n\nbody\n";
        let rec = extract_record(raw, &source()).unwrap();
        assert_eq!(rec.sender, "a@b.com");
    }

    #[test]
    fn test_multipart_plain_parts_concatenated() {
        let raw = b"From: a@b.com\r\n\
            To: c@d.com\r\n\
            Subject: multi\r\n\
            MIME-Version: 1.0\r\n\
            Content-Type: multipart/mixed; boundary=\"XYZ\"\r\n\
            \r\n\
            --XYZ\r\n\
            Content-Type: text/plain\r\n\
            \r\n\
            first part\r\n\
            --XYZ\r\n\
            Content-Type: text/plain\r\n\
            \r\n\
            second part\r\n\
            --XYZ\r\n\
            Content-Type: application/pdf; name=\"report.pdf\"\r\n\
            Content-Disposition: attachment; filename=\"report.pdf\"\r\n\
            Content-Transfer-Encoding: base64\r\n\
            \r\n\
            JVBERi0=\r\n\
            --XYZ--\r\n";
        let rec = extract_record(raw, &source()).unwrap();
        let first = rec.body.find("first part").expect("first part present");
        let second = rec.body.find("second part").expect("second part present");
        assert!(first < second, "parts must keep document order");
        assert_eq!(rec.attachment_names, vec!["report.pdf"]);
        assert!(!rec.body.contains("JVBERi0="), "attachment content excluded");
    }

    #[test]
    fn test_html_only_body_stripped() {
        let raw = b"From: a@b.com\r\n\
            Subject: html\r\n\
            MIME-Version: 1.0\r\n\
            Content-Type: text/html\r\n\
            \r\n\
            <html><body><p>Hello <b>world</b></p><script>bad()</script></body></html>\r\n";
        let rec = extract_record(raw, &source()).unwrap();
        assert!(rec.body.contains("Hello world"));
        assert!(!rec.body.contains("bad()"));
    }

    #[test]
    fn test_html_to_text_entities_and_breaks() {
        let text = html_to_text("Tom &amp; Jerry<br>Second &lt;line&gt;");
        assert!(text.contains("Tom & Jerry"));
        assert!(text.contains("Second <line>"));
    }

    #[test]
    fn test_folded_header_unfolds() {
        let raw = b"From: a@b.com\nSubject: a long\n\tfolded subject\n\nbody\n";
        let rec = extract_record(raw, &source()).unwrap();
        assert_eq!(rec.subject, "a long folded subject");
    }
}
