//! MBOX sub-extractor.
//!
//! Streams an MBOX container, framing messages on `From ` separator
//! lines, and delegates each framed message to the .eml extractor so
//! every container format normalizes to the same [`MessageRecord`].
//!
//! Tolerant of mixed `\n`/`\r\n` line endings, `From ` lines without a
//! preceding blank line, and truncated trailing messages. A framed
//! message that fails extraction is skipped with a warning; it never
//! aborts the rest of the container.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::warn;

use crate::error::{Result, SleuthError};
use crate::model::record::MessageRecord;
use crate::parser::eml;

const READ_BUFFER_SIZE: usize = 128 * 1024;

/// Extract every message in an MBOX file as a normalized record.
pub fn extract_records(path: &Path) -> Result<Vec<MessageRecord>> {
    let file = File::open(path).map_err(|e| SleuthError::io(path, e))?;
    let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);

    let mut records = Vec::new();
    let mut message: Vec<u8> = Vec::with_capacity(16 * 1024);
    let mut line: Vec<u8> = Vec::with_capacity(4096);
    let mut prev_blank = true;
    let mut first_line = true;
    let mut skipped: usize = 0;

    loop {
        line.clear();
        let n = reader
            .read_until(b'\n', &mut line)
            .map_err(|e| SleuthError::io(path, e))?;
        if n == 0 {
            break; // EOF
        }

        if is_separator(&line) {
            if !first_line && !prev_blank {
                warn!(
                    path = %path.display(),
                    "'From ' separator without preceding blank line"
                );
            }
            flush(&mut message, path, &mut records, &mut skipped);
        } else {
            message.extend_from_slice(&line);
        }

        prev_blank = is_blank(&line);
        first_line = false;
    }
    flush(&mut message, path, &mut records, &mut skipped);

    if skipped > 0 {
        warn!(
            path = %path.display(),
            skipped,
            "Skipped unparseable messages in MBOX"
        );
    }

    Ok(records)
}

/// Extract the accumulated message bytes, if any, and reset the buffer.
fn flush(message: &mut Vec<u8>, path: &Path, records: &mut Vec<MessageRecord>, skipped: &mut usize) {
    if message.iter().all(|b| b.is_ascii_whitespace()) {
        message.clear();
        return;
    }
    match eml::extract_record(message, path) {
        Ok(record) => records.push(record),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Skipping unparseable MBOX message");
            *skipped += 1;
        }
    }
    message.clear();
}

/// An MBOX message separator: a line starting with `From ` (note the
/// space — `From:` is a header, not a separator).
fn is_separator(line: &[u8]) -> bool {
    line.starts_with(b"From ")
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(|b| matches!(b, b'\r' | b'\n'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_mbox(content: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new()
            .suffix(".mbox")
            .tempfile()
            .unwrap();
        f.write_all(content).unwrap();
        f
    }

    #[test]
    fn test_two_messages() {
        let mbox = b"From alice@example.com Thu Jan  4 10:00:00 2024\n\
            From: alice@example.com\n\
            To: bob@example.com\n\
            Subject: one\n\
            Date: Thu, 04 Jan 2024 10:00:00 +0000\n\
            \n\
            first body\n\
            \n\
            From bob@example.com Fri Jan  5 11:00:00 2024\n\
            From: bob@example.com\n\
            To: carol@example.com\n\
            Subject: two\n\
            Date: Fri, 05 Jan 2024 11:00:00 +0000\n\
            \n\
            second body\n";
        let f = write_mbox(mbox);
        let records = extract_records(f.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sender, "alice@example.com");
        assert_eq!(records[0].subject, "one");
        assert_eq!(records[1].recipients, vec!["carol@example.com"]);
    }

    #[test]
    fn test_from_header_does_not_split() {
        // "From:" inside a body line must not frame a new message
        let mbox = b"From a@b.com Thu Jan  4 10:00:00 2024\n\
            From: a@b.com\n\
            Subject: quoting\n\
            \n\
            He wrote:\n\
            >From: someone@else.com\n";
        let f = write_mbox(mbox);
        let records = extract_records(f.path()).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_empty_file() {
        let f = write_mbox(b"");
        assert!(extract_records(f.path()).unwrap().is_empty());
    }

    #[test]
    fn test_bad_message_skipped_good_kept() {
        let mbox = b"From x Thu Jan  4 10:00:00 2024\n\
            just some words without any headers\n\
            \n\
            From a@b.com Fri Jan  5 11:00:00 2024\n\
            From: a@b.com\n\
            To: c@d.com\n\
            Subject: survives\n\
            \n\
            body\n";
        let f = write_mbox(mbox);
        let records = extract_records(f.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].subject, "survives");
    }
}
