//! Directory scanning: find qualifying images and fingerprint their contents.
//!
//! A file qualifies when its lower-cased extension is on the allow-list and,
//! if a floor is given, it was modified at or after that instant. Each
//! qualifying file is hashed with SHA-256 over its full contents; the hash is
//! the file's identity in the conversion history, so a renamed or moved copy
//! is recognised as the same file.
//!
//! Files that vanish or cannot be read mid-scan are skipped with a warning.
//! Only an unusable root aborts the scan. No ordering is imposed here.

use crate::error::{ConversionError, Result};
use crate::output::{extension_of, FileRecord};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Walk `root` and return a [`FileRecord`] for every qualifying file.
///
/// `allowed_extensions` are compared against the lower-cased extension,
/// without the leading dot.
pub fn scan(
    root: &Path,
    allowed_extensions: &[String],
    recursive: bool,
    min_modified_at: Option<DateTime<Utc>>,
) -> Result<Vec<FileRecord>> {
    if !root.is_dir() {
        return Err(ConversionError::FolderNotFound {
            path: root.to_path_buf(),
        });
    }
    // Surface an unreadable root as an error instead of an empty scan.
    std::fs::read_dir(root).map_err(|e| ConversionError::io(root, e))?;

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut records = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).max_depth(max_depth) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let ext = extension_of(path);
        if !allowed_extensions.iter().any(|allowed| *allowed == ext) {
            continue;
        }

        let modified_at = match entry.metadata().map_err(io::Error::from).and_then(|m| m.modified()) {
            Ok(t) => DateTime::<Utc>::from(t),
            Err(e) => {
                warn!("Skipping {}: cannot read modification time: {}", path.display(), e);
                continue;
            }
        };
        if min_modified_at.is_some_and(|floor| modified_at < floor) {
            debug!("Skipping {}: modified before date filter", path.display());
            continue;
        }

        let content_hash = match fingerprint(path) {
            Ok(hash) => hash,
            Err(e) => {
                warn!("Skipping {}: cannot read contents: {}", path.display(), e);
                continue;
            }
        };

        records.push(FileRecord {
            path: path.to_path_buf(),
            modified_at,
            content_hash,
        });
    }

    info!(
        "Scanned {}: {} qualifying file(s){}",
        root.display(),
        records.len(),
        if recursive { " (recursive)" } else { "" }
    );
    Ok(records)
}

/// Lower-case hex SHA-256 of the file's full contents.
pub fn fingerprint(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn set_mtime(path: &Path, t: SystemTime) {
        fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(t)
            .unwrap();
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.JPG"), b"jpeg-a").unwrap();
        fs::write(dir.path().join("b.png"), b"png-b").unwrap();
        fs::write(dir.path().join("notes.txt"), b"ignore me").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/c.heic"), b"heic-c").unwrap();
        dir
    }

    #[test]
    fn non_recursive_ignores_subdirectories() {
        let dir = fixture();
        let files = scan(dir.path(), &exts(&["jpg", "png", "heic"]), false, None).unwrap();
        let mut names: Vec<String> = files.iter().map(|f| f.file_name()).collect();
        names.sort();
        assert_eq!(names, vec!["a.JPG", "b.png"]);
    }

    #[test]
    fn recursive_descends() {
        let dir = fixture();
        let files = scan(dir.path(), &exts(&["jpg", "png", "heic"]), true, None).unwrap();
        assert_eq!(files.len(), 3);
        assert!(files.iter().any(|f| f.file_name() == "c.heic"));
    }

    #[test]
    fn extension_filter_applies() {
        let dir = fixture();
        let files = scan(dir.path(), &exts(&["png"]), true, None).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name(), "b.png");
    }

    #[test]
    fn modification_floor_filters_old_files() {
        let dir = fixture();
        let old = SystemTime::now() - Duration::from_secs(10 * 24 * 3600);
        set_mtime(&dir.path().join("a.JPG"), old);

        let floor = Utc::now() - chrono::Duration::days(1);
        let files = scan(dir.path(), &exts(&["jpg", "png"]), false, Some(floor)).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name(), "b.png");
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = scan(&dir.path().join("nope"), &exts(&["jpg"]), false, None).unwrap_err();
        assert!(matches!(err, ConversionError::FolderNotFound { .. }));
    }

    #[test]
    fn identical_bytes_share_a_fingerprint() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("one.jpg"), b"same bytes").unwrap();
        fs::write(dir.path().join("two.jpg"), b"same bytes").unwrap();
        fs::write(dir.path().join("three.jpg"), b"other bytes").unwrap();

        let files = scan(dir.path(), &exts(&["jpg"]), false, None).unwrap();
        let hash = |name: &str| {
            files
                .iter()
                .find(|f| f.file_name() == name)
                .map(|f| f.content_hash.clone())
                .unwrap()
        };
        assert_eq!(hash("one.jpg"), hash("two.jpg"));
        assert_ne!(hash("one.jpg"), hash("three.jpg"));
        assert_eq!(hash("one.jpg").len(), 64);
    }
}
