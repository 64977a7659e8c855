//! Value types flowing between pipeline stages and back to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A qualifying file found by the directory scanner.
///
/// Immutable for the duration of a run. Processing order is
/// `modified_at` ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: PathBuf,
    pub modified_at: DateTime<Utc>,
    /// Lower-case hex SHA-256 of the full file contents.
    pub content_hash: String,
}

impl FileRecord {
    /// Lower-cased extension, empty when the file has none.
    pub fn extension(&self) -> String {
        extension_of(&self.path)
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

pub(crate) fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// Advisory findings about one file, shown to the operator before conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionIssue {
    pub file_path: PathBuf,
    pub messages: Vec<String>,
}

impl fmt::Display for ConversionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file_path.display(), self.messages.join(" "))
    }
}

/// A decoded image, converted to RGB and re-encoded as baseline JPEG at the
/// run's quality. Released once its page has been written.
#[derive(Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
    /// JPEG bytes, embedded into the PDF as-is.
    pub jpeg: Vec<u8>,
}

impl fmt::Debug for NormalizedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalizedImage")
            .field("source", &self.source)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("jpeg", &format_args!("<{} bytes>", self.jpeg.len()))
            .finish()
    }
}

/// How a run ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RunOutcome {
    /// The PDF was written to this path.
    Success(PathBuf),
    /// No qualifying files in the input folder.
    Empty,
    /// Every qualifying file was already converted.
    AlreadyUpToDate,
    /// The operator declined to continue after triage.
    Cancelled,
}

impl RunOutcome {
    pub fn output_path(&self) -> Option<&Path> {
        match self {
            RunOutcome::Success(p) => Some(p),
            _ => None,
        }
    }
}
