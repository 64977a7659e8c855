//! # heic2pdf
//!
//! Convert a folder of images (HEIC, JPEG, PNG, BMP, GIF, TIFF) into a single
//! PDF document.
//!
//! ## What a run does
//!
//! ```text
//! folder
//!  │
//!  ├─ 1. Scan     walk the folder, filter by extension and date, SHA-256 each file
//!  ├─ 2. Skip     drop files whose bytes were already converted (optional)
//!  ├─ 3. Sort     oldest modification first, so page order is reproducible
//!  ├─ 4. Triage   flag huge/tiny/odd-mode/oversized files, ask to continue
//!  ├─ 5. Convert  decode → RGB → JPEG; HEIC goes to a remote job API
//!  ├─ 6. Layout   one page per image, scaled to fit and centred
//!  ├─ 7. Merge    append existing PDFs (optional)
//!  └─ 8. Record   remember fingerprints, optionally delete sources
//! ```
//!
//! Repeated runs over the same folder with `skip_already_converted` only pick
//! up new or modified files. History is keyed by content, so a renamed or
//! moved copy of an already-converted file is recognised.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use heic2pdf::{run, ConversionConfig, NoopProgressSink, RunOutcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .quality(85)
//!         .skip_already_converted(true)
//!         .build()?;
//!     match run("photos/", "album.pdf", &config, &NoopProgressSink).await? {
//!         RunOutcome::Success(path) => println!("wrote {}", path.display()),
//!         other => println!("nothing written: {other:?}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## HEIC input
//!
//! The bundled codec has no HEIC decoder. HEIC files are sent to a remote
//! conversion service (CloudConvert) configured through
//! [`RemoteSettings::from_env`]; without one, a run containing HEIC files
//! fails with [`ConversionError::RemoteNotConfigured`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `heic2pdf` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! heic2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod report;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    parse_min_modified, ConversionConfig, ConversionConfigBuilder, Orientation, PageSize,
    PdfLayoutOptions, RemoteSettings, RgbColor,
};
pub use convert::{run, run_sync};
pub use error::{ConversionError, ErrorKind};
pub use output::{ConversionIssue, FileRecord, NormalizedImage, RunOutcome};
pub use pipeline::remote::{CloudConvertClient, RemoteConverter};
pub use pipeline::retry::RetryPolicy;
pub use progress::{NoopProgressSink, ProgressSink, IDLE_STATUS};
pub use report::{LogNotifier, Notifier, NotifyError};
