//! Error types for the heic2pdf library.
//!
//! A single [`ConversionError`] covers every way a run can end badly. The
//! variants are grouped by the failure taxonomy callers care about, and
//! [`ConversionError::kind`] collapses them into an [`ErrorKind`] for
//! front-ends that only want to show "what kind of thing went wrong".
//!
//! Two variants deserve a note:
//!
//! * [`ConversionError::CodecUnavailable`] means the process has no local
//!   decoder for a format at all. It is a property of the build, not of the
//!   file, and the orchestrator answers it by switching to the remote
//!   converter for every file of that format.
//!
//! * [`ConversionError::Decode`] means one specific file is malformed or
//!   truncated. It aborts the run.
//!
//! [`ConversionError::HistoryStore`] never escapes the history module: a
//! corrupt or unreadable history is logged and treated as empty.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the heic2pdf library.
#[derive(Debug, Error)]
pub enum ConversionError {
    // ── File-system errors ────────────────────────────────────────────────
    /// The input folder does not exist or is not a directory.
    #[error("Input folder not found: '{path}'\nCheck the path exists and is a directory.")]
    FolderNotFound { path: PathBuf },

    /// Reading, writing or deleting a file failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Image errors ──────────────────────────────────────────────────────
    /// A specific file could not be decoded (malformed or truncated).
    #[error("Failed to decode '{path}': {detail}")]
    Decode { path: PathBuf, detail: String },

    /// No local decoder exists for this format in the current build.
    #[error("No local decoder available for {format} ('{path}')")]
    CodecUnavailable { path: PathBuf, format: String },

    /// Re-encoding a decoded image failed.
    #[error("Failed to encode '{path}' at quality {quality}: {detail}")]
    Encode {
        path: PathBuf,
        quality: u8,
        detail: String,
    },

    // ── Remote conversion errors ──────────────────────────────────────────
    /// The remote converter is needed but was never configured.
    #[error("Remote conversion is required for '{path}' but no API key is configured.\nSet CLOUDCONVERT_API_KEY or pass --api-key.")]
    RemoteNotConfigured { path: PathBuf },

    /// Job creation, upload, polling or download failed.
    #[error("Remote conversion of '{path}' failed: {detail}")]
    RemoteConversion { path: PathBuf, detail: String },

    /// The remote job did not reach a terminal state in time.
    #[error("Remote conversion of '{path}' timed out after {secs}s")]
    RemoteTimeout { path: PathBuf, secs: u64 },

    // ── Document errors ───────────────────────────────────────────────────
    /// A page could not be written or the document could not be saved.
    #[error("Failed to write PDF: {0}")]
    DocumentWrite(String),

    /// An existing PDF listed for merging is unreadable or invalid.
    #[error("Cannot merge '{path}': {detail}")]
    MergeInput { path: PathBuf, detail: String },

    // ── History errors ────────────────────────────────────────────────────
    /// The history store is corrupt or unwritable.
    #[error("Conversion history '{path}' unusable: {detail}")]
    HistoryStore { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder or option validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`ConversionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    Io,
    Decode,
    RemoteConversion,
    DocumentWrite,
    HistoryStore,
    Config,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Io => "IoError",
            ErrorKind::Decode => "DecodeError",
            ErrorKind::RemoteConversion => "RemoteConversionError",
            ErrorKind::DocumentWrite => "DocumentWriteError",
            ErrorKind::HistoryStore => "HistoryStoreError",
            ErrorKind::Config => "ConfigError",
            ErrorKind::Internal => "InternalError",
        };
        f.write_str(name)
    }
}

impl ConversionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConversionError::FolderNotFound { .. } | ConversionError::Io { .. } => ErrorKind::Io,
            ConversionError::Decode { .. }
            | ConversionError::CodecUnavailable { .. }
            | ConversionError::Encode { .. } => ErrorKind::Decode,
            ConversionError::RemoteNotConfigured { .. }
            | ConversionError::RemoteConversion { .. }
            | ConversionError::RemoteTimeout { .. } => ErrorKind::RemoteConversion,
            ConversionError::DocumentWrite(_) | ConversionError::MergeInput { .. } => {
                ErrorKind::DocumentWrite
            }
            ConversionError::HistoryStore { .. } => ErrorKind::HistoryStore,
            ConversionError::InvalidConfig(_) => ErrorKind::Config,
            ConversionError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// The file this error originated from, when there is one.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            ConversionError::FolderNotFound { path }
            | ConversionError::Io { path, .. }
            | ConversionError::Decode { path, .. }
            | ConversionError::CodecUnavailable { path, .. }
            | ConversionError::Encode { path, .. }
            | ConversionError::RemoteNotConfigured { path }
            | ConversionError::RemoteConversion { path, .. }
            | ConversionError::RemoteTimeout { path, .. }
            | ConversionError::MergeInput { path, .. }
            | ConversionError::HistoryStore { path, .. } => Some(path),
            ConversionError::DocumentWrite(_)
            | ConversionError::InvalidConfig(_)
            | ConversionError::Internal(_) => None,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConversionError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ConversionError>;
