//! Message extraction: container format detection, .eml parsing, MBOX
//! framing, and permissive date handling.

pub mod date;
pub mod eml;
pub mod mbox;

use std::path::Path;

use crate::error::{Result, SleuthError};
use crate::model::record::MessageRecord;

/// Supported message container formats.
///
/// Every variant normalizes to the same [`MessageRecord`] shape; the
/// enum exists so the loader can dispatch on detected format instead of
/// guessing inside each extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageFormat {
    /// A bare RFC 5322 message in its own file.
    Eml,
    /// An MBOX container: multiple messages framed by `From ` separators.
    Mbox,
}

impl MessageFormat {
    /// Detect the format from the file extension.
    ///
    /// Returns `None` for files this pipeline does not ingest.
    pub fn detect(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "eml" => Some(Self::Eml),
            "mbox" => Some(Self::Mbox),
            _ => None,
        }
    }
}

/// Extract all records from one message file, dispatching on format.
///
/// An .eml file yields exactly one record; an .mbox may yield many.
pub fn extract_from_file(path: &Path) -> Result<Vec<MessageRecord>> {
    let format = MessageFormat::detect(path).ok_or_else(|| SleuthError::Parse {
        path: path.to_path_buf(),
        reason: "unrecognized message format".to_string(),
    })?;

    match format {
        MessageFormat::Eml => {
            let raw = std::fs::read(path).map_err(|e| SleuthError::io(path, e))?;
            Ok(vec![eml::extract_record(&raw, path)?])
        }
        MessageFormat::Mbox => mbox::extract_records(path),
    }
}
