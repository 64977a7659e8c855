//! Run entry points: one input folder in, one PDF out.
//!
//! [`run`] drives the whole pipeline:
//!
//! ```text
//! history ─▶ scan ─▶ skip converted ─▶ sort ─▶ triage ─▶ confirm
//!        ─▶ decode/normalise each (remote for HEIC) ─▶ assemble ─▶ merge
//!        ─▶ save ─▶ record history ─▶ delete sources
//! ```
//!
//! Scanning, triage and decoding run under `spawn_blocking`; the only network
//! I/O is the remote HEIC fallback. The sink is reset to idle on every exit
//! path, and every failure leaves an error report in the logs directory.

use crate::config::ConversionConfig;
use crate::error::{ConversionError, Result};
use crate::output::{ConversionIssue, FileRecord, NormalizedImage, RunOutcome};
use crate::pipeline::assemble::{self, PdfAssembler};
use crate::pipeline::history::{self, History, HistoryStore};
use crate::pipeline::retry::RetryPolicy;
use crate::pipeline::{codec, scan, triage};
use crate::progress::{IdleGuard, ProgressSink};
use crate::report;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Convert every qualifying image under `input_folder` into one PDF at
/// `output_path`.
///
/// # Returns
/// * `Success(path)` when the document was written
/// * `Empty` when the folder has no qualifying files
/// * `AlreadyUpToDate` when every qualifying file was converted before
///   (only with `skip_already_converted`)
/// * `Cancelled` when `sink.confirm` declined after triage
///
/// # Errors
/// Any I/O, decode, remote-conversion or document-write failure aborts the
/// run. History is only written after the document has been saved.
pub async fn run(
    input_folder: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
    sink: &dyn ProgressSink,
) -> Result<RunOutcome> {
    let input_folder = input_folder.as_ref();
    let output_path = output_path.as_ref();
    let _idle = IdleGuard::new(sink);
    let started = Instant::now();

    info!(
        "Starting conversion: {} → {} ({})",
        input_folder.display(),
        output_path.display(),
        config.summary()
    );

    let mut issues = Vec::new();
    match execute(input_folder, output_path, config, sink, &mut issues).await {
        Ok(outcome) => {
            info!("Run finished in {:?}: {:?}", started.elapsed(), outcome);
            if let RunOutcome::Success(path) = &outcome {
                report::send_alert(
                    config,
                    "Conversion succeeded",
                    &format!(
                        "Created {} from {}",
                        path.display(),
                        input_folder.display()
                    ),
                )
                .await;
            }
            Ok(outcome)
        }
        Err(e) => {
            error!(
                "Conversion of {} failed ({}): {} [file: {}] [{}]",
                input_folder.display(),
                e.kind(),
                e,
                e.path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "-".into()),
                config.summary()
            );
            match report::write_error_report(
                &config.logs_dir,
                &e,
                input_folder,
                output_path,
                config,
                &issues,
            ) {
                Ok(path) => info!("Error report written to {}", path.display()),
                Err(io) => warn!("Could not write error report: {}", io),
            }
            report::send_alert(
                config,
                "Conversion failed",
                &report::render_error_report(
                    Utc::now(),
                    &e,
                    input_folder,
                    output_path,
                    config,
                    &issues,
                ),
            )
            .await;
            Err(e)
        }
    }
}

/// Synchronous wrapper around [`run`].
///
/// Creates a temporary tokio runtime internally.
pub fn run_sync(
    input_folder: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
    sink: &dyn ProgressSink,
) -> Result<RunOutcome> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConversionError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(run(input_folder, output_path, config, sink))
}

async fn execute(
    input_folder: &Path,
    output_path: &Path,
    config: &ConversionConfig,
    sink: &dyn ProgressSink,
    issues: &mut Vec<ConversionIssue>,
) -> Result<RunOutcome> {
    // ── Step 1: Load history and scan ────────────────────────────────────
    let store = HistoryStore::new(&config.history_path);
    let mut history = store.load();

    let records = {
        let root = input_folder.to_path_buf();
        let extensions = config.allowed_extensions.clone();
        let (recursive, since) = (config.recursive, config.min_modified_at);
        blocking(move || scan::scan(&root, &extensions, recursive, since)).await?
    };
    if records.is_empty() {
        info!("No supported files in {}", input_folder.display());
        sink.report_status("No supported files found");
        return Ok(RunOutcome::Empty);
    }

    // ── Step 2: Drop already-converted files ─────────────────────────────
    let mut records = pending(records, &history, config.skip_already_converted);
    if records.is_empty() {
        info!("All files in {} already converted", input_folder.display());
        sink.report_status("All files already converted");
        return Ok(RunOutcome::AlreadyUpToDate);
    }

    // ── Step 3: Deterministic page order ─────────────────────────────────
    sort_for_pages(&mut records);

    // ── Step 4: Triage and confirmation ──────────────────────────────────
    *issues = {
        let batch = records.clone();
        blocking(move || Ok(triage::triage(&batch))).await?
    };
    if !issues.is_empty() {
        warn!("Triage found issues in {} file(s)", issues.len());
        for issue in issues.iter() {
            warn!("  {}", issue);
        }
        if !sink.confirm(issues.as_slice()) {
            info!("Run cancelled after triage");
            sink.report_status("Cancelled");
            return Ok(RunOutcome::Cancelled);
        }
    }

    // ── Step 5: Convert each file and lay out its page ───────────────────
    let total = records.len();
    let retry = RetryPolicy::new(config.max_attempts, config.retry_delay);
    let mut assembler = PdfAssembler::new(&config.pdf);
    let mut heic_via_remote = false;
    sink.report_progress(0, total);

    for (i, record) in records.iter().enumerate() {
        let image = normalize_record(record, config, &retry, sink, &mut heic_via_remote).await?;
        assembler.add_page(image)?;

        sink.report_progress(i + 1, total);
        sink.report_status(&format!("Processed: {} ({}/{})", record.file_name(), i + 1, total));
    }

    // ── Step 6: Finish, merge, save ──────────────────────────────────────
    let doc = assembler.finish()?;
    let mut doc = assemble::merge_all(doc, &config.pdf.merge_with)?;
    assemble::save(&mut doc, output_path)?;

    // ── Step 7: Record history ───────────────────────────────────────────
    history::record_conversions(&mut history, &records, output_path, Utc::now());
    if let Err(e) = store.save(&history) {
        warn!("{e}; this run will not be remembered");
    }

    // ── Step 8: Optionally delete sources ────────────────────────────────
    if config.delete_sources {
        delete_sources(&records);
    }

    Ok(RunOutcome::Success(output_path.to_path_buf()))
}

/// Records still to convert. With `skip_converted` off, everything is.
pub(crate) fn pending(records: Vec<FileRecord>, history: &History, skip_converted: bool) -> Vec<FileRecord> {
    if !skip_converted {
        return records;
    }
    let before = records.len();
    let remaining: Vec<FileRecord> = records
        .into_iter()
        .filter(|r| !history::is_converted(history, r))
        .collect();
    debug!("Skipping {} already-converted file(s)", before - remaining.len());
    remaining
}

/// Oldest first; ties broken by path so the order never depends on the walk.
pub(crate) fn sort_for_pages(records: &mut [FileRecord]) {
    records.sort_by(|a, b| {
        a.modified_at
            .cmp(&b.modified_at)
            .then_with(|| a.path.cmp(&b.path))
    });
}

fn is_heic(record: &FileRecord) -> bool {
    matches!(record.extension().as_str(), "heic" | "heif")
}

async fn normalize_record(
    record: &FileRecord,
    config: &ConversionConfig,
    retry: &RetryPolicy,
    sink: &dyn ProgressSink,
    heic_via_remote: &mut bool,
) -> Result<NormalizedImage> {
    if is_heic(record) && *heic_via_remote {
        return convert_remotely(record, config, retry, sink).await;
    }

    let path = record.path.clone();
    let quality = config.quality;
    match blocking(move || codec::load_normalized(&path, quality)).await {
        Ok(image) => Ok(image),
        Err(ConversionError::CodecUnavailable { format, .. }) if is_heic(record) => {
            info!("No local {} decoder; remaining {} files go to the remote converter", format, format);
            *heic_via_remote = true;
            convert_remotely(record, config, retry, sink).await
        }
        Err(e) => Err(e),
    }
}

async fn convert_remotely(
    record: &FileRecord,
    config: &ConversionConfig,
    retry: &RetryPolicy,
    sink: &dyn ProgressSink,
) -> Result<NormalizedImage> {
    let remote = config
        .remote
        .as_ref()
        .ok_or_else(|| ConversionError::RemoteNotConfigured {
            path: record.path.clone(),
        })?;
    let name = record.file_name();
    sink.report_status(&format!("Falling back to remote conversion for {name}"));

    // Lives only until the downloaded JPEG has been normalised.
    let workdir = tempfile::TempDir::new()
        .map_err(|e| ConversionError::Internal(format!("Failed to create temp dir: {e}")))?;
    let stem = record
        .path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let dest = workdir.path().join(format!("{stem}.jpg"));

    let downloaded: PathBuf = retry
        .run(&format!("Remote conversion of {name}"), || {
            remote.convert_remote(&record.path, &dest)
        })
        .await?;

    let quality = config.quality;
    let mut image = blocking(move || codec::load_normalized(&downloaded, quality)).await?;
    image.source = record.path.clone();
    Ok(image)
}

fn delete_sources(records: &[FileRecord]) {
    for record in records {
        match std::fs::remove_file(&record.path) {
            Ok(()) => debug!("Deleted {}", record.path.display()),
            Err(e) => warn!("Could not delete {}: {}", record.path.display(), e),
        }
    }
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ConversionError::Internal(format!("Blocking task failed: {e}")))?
}
