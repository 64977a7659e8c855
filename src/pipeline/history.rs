//! Persistent conversion history keyed by content fingerprint.
//!
//! The store is a single JSON object mapping fingerprints to the last
//! conversion of those bytes:
//!
//! ```json
//! {
//!   "9f86d0…": { "path": "/photos/a.jpg", "timestamp": "2024-05-01T10:00:00Z", "output": "/out/album.pdf" }
//! }
//! ```
//!
//! It is loaded once at run start and overwritten once at run end. A missing
//! or corrupt file loads as an empty history with a warning; the run goes on.
//! Concurrent runs against the same file are not supported: the last `save`
//! wins.

use crate::error::{ConversionError, Result};
use crate::output::FileRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Last conversion of one fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "path")]
    pub source_path: PathBuf,
    #[serde(rename = "timestamp")]
    pub converted_at: DateTime<Utc>,
    #[serde(rename = "output")]
    pub output_path: PathBuf,
}

/// Fingerprint → last conversion.
pub type History = BTreeMap<String, HistoryEntry>;

/// File-backed history store.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the history. Never fails: a missing store is empty, a corrupt one
    /// is logged and treated as empty.
    pub fn load(&self) -> History {
        match self.try_load() {
            Ok(history) => {
                debug!(
                    "Loaded {} history entries from {}",
                    history.len(),
                    self.path.display()
                );
                history
            }
            Err(e) => {
                warn!("{e}; starting with an empty history");
                History::new()
            }
        }
    }

    fn try_load(&self) -> Result<History> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(History::new()),
            Err(e) => {
                return Err(ConversionError::HistoryStore {
                    path: self.path.clone(),
                    detail: e.to_string(),
                })
            }
        };
        if raw.trim().is_empty() {
            return Ok(History::new());
        }
        serde_json::from_str(&raw).map_err(|e| ConversionError::HistoryStore {
            path: self.path.clone(),
            detail: e.to_string(),
        })
    }

    /// Overwrite the store with `history`.
    ///
    /// Written to a sibling temp file and renamed into place so a crash never
    /// leaves a half-written store behind.
    pub fn save(&self, history: &History) -> Result<()> {
        let store_err = |detail: String| ConversionError::HistoryStore {
            path: self.path.clone(),
            detail,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| store_err(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(history).map_err(|e| store_err(e.to_string()))?;

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json).map_err(|e| store_err(e.to_string()))?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| store_err(e.to_string()))?;

        debug!("Saved {} history entries to {}", history.len(), self.path.display());
        Ok(())
    }
}

/// True when `record`'s bytes were converted at or after its last modification.
pub fn is_converted(history: &History, record: &FileRecord) -> bool {
    history
        .get(&record.content_hash)
        .is_some_and(|entry| entry.converted_at >= record.modified_at)
}

/// Upsert one entry per record, all stamped with `converted_at`.
pub fn record_conversions<'a>(
    history: &mut History,
    records: impl IntoIterator<Item = &'a FileRecord>,
    output_path: &Path,
    converted_at: DateTime<Utc>,
) {
    for record in records {
        history.insert(
            record.content_hash.clone(),
            HistoryEntry {
                source_path: record.path.clone(),
                converted_at,
                output_path: output_path.to_path_buf(),
            },
        );
    }
}
