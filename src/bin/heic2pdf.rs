//! CLI binary for heic2pdf.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, renders progress and asks for confirmation when
//! triage finds issues.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use heic2pdf::{
    parse_min_modified, run, CloudConvertClient, ConversionConfig, ConversionIssue, LogNotifier,
    Orientation, PageSize, PdfLayoutOptions, ProgressSink, RemoteSettings, RgbColor, RunOutcome,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress sink using indicatif ────────────────────────────────────────

/// Terminal sink: a progress bar for file conversion, status texts as the bar
/// message, and a y/N prompt for triage findings.
struct CliSink {
    bar: Option<ProgressBar>,
    assume_yes: bool,
}

impl CliSink {
    fn new(show_progress: bool, assume_yes: bool) -> Self {
        let bar = show_progress.then(|| {
            let bar = ProgressBar::new(0);
            let style = ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} files  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
            bar.set_style(style);
            bar.set_prefix("Converting");
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });
        Self { bar, assume_yes }
    }

    fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

impl ProgressSink for CliSink {
    fn report_progress(&self, current: usize, total: usize) {
        if let Some(bar) = &self.bar {
            bar.set_length(total as u64);
            bar.set_position(current as u64);
        }
    }

    fn report_status(&self, text: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(text.to_string());
        }
    }

    fn confirm(&self, issues: &[ConversionIssue]) -> bool {
        let ask = || {
            eprintln!("{} {}", yellow("⚠"), bold("Potential issues found:"));
            for issue in issues {
                eprintln!("  {issue}");
            }
            if self.assume_yes {
                eprintln!("Continuing (--yes).");
                return true;
            }
            eprint!("Continue with conversion? [y/N] ");
            let _ = io::stderr().flush();
            let mut answer = String::new();
            match io::stdin().lock().read_line(&mut answer) {
                Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
                Err(_) => false,
            }
        };
        match &self.bar {
            Some(bar) => bar.suspend(ask),
            None => ask(),
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a folder, oldest photo first
  heic2pdf ~/Pictures/trip -o trip.pdf

  # Only new or changed photos since the last run, landscape A4
  heic2pdf ~/Pictures/trip -o trip-update.pdf --skip-converted --orientation L

  # Decorated Letter pages, appended to an existing document
  heic2pdf scans/ -o out.pdf --page-size Letter --watermark DRAFT \
      --page-numbers --merge cover.pdf

  # Custom paper size in millimetres
  heic2pdf scans/ -o out.pdf --page-size 100x150

ENVIRONMENT VARIABLES:
  CLOUDCONVERT_API_KEY   API key for the remote HEIC converter
  CLOUDCONVERT_API_URL   Override the API base URL
  RUST_LOG               Override the log filter (e.g. heic2pdf=debug)

HEIC:
  HEIC/HEIF files cannot be decoded locally. They are uploaded to
  CloudConvert and the returned JPEG is used instead. Without an API key a
  folder containing HEIC files fails with a configuration error.
"#;

#[derive(Parser, Debug)]
#[command(
    name = "heic2pdf",
    version,
    about = "Convert a folder of images (HEIC, JPEG, PNG, BMP, GIF, TIFF) into one PDF",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Folder containing the images.
    input: PathBuf,

    /// Output PDF path.
    #[arg(short, long, env = "HEIC2PDF_OUTPUT")]
    output: PathBuf,

    /// JPEG quality used for every page (1-100).
    #[arg(long, env = "HEIC2PDF_QUALITY", default_value_t = 85,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Comma-separated extension allow-list. Default: all supported formats.
    #[arg(long, env = "HEIC2PDF_EXTENSIONS", value_delimiter = ',')]
    extensions: Vec<String>,

    /// Include subfolders.
    #[arg(short, long, env = "HEIC2PDF_RECURSIVE")]
    recursive: bool,

    /// Only files modified on or after this date (YYYY-MM-DD).
    #[arg(long, env = "HEIC2PDF_SINCE")]
    since: Option<String>,

    /// Skip files whose contents were already converted.
    #[arg(long, env = "HEIC2PDF_SKIP_CONVERTED")]
    skip_converted: bool,

    /// Delete source images after a successful run.
    #[arg(long, env = "HEIC2PDF_DELETE_SOURCES")]
    delete_sources: bool,

    /// Page orientation: P (portrait) or L (landscape).
    #[arg(long, env = "HEIC2PDF_ORIENTATION", default_value = "P")]
    orientation: String,

    /// A3, A4, A5, Letter, Legal or WIDTHxHEIGHT in millimetres.
    #[arg(long, env = "HEIC2PDF_PAGE_SIZE", default_value = "A4")]
    page_size: String,

    /// Diagonal watermark text.
    #[arg(long, env = "HEIC2PDF_WATERMARK")]
    watermark: Option<String>,

    /// Print "Page N" at the bottom of every page.
    #[arg(long, env = "HEIC2PDF_PAGE_NUMBERS")]
    page_numbers: bool,

    /// Existing PDF to append after the new pages (repeatable).
    #[arg(long = "merge", value_name = "PDF")]
    merge: Vec<PathBuf>,

    /// Font for watermark and page numbers (Helvetica, Times, Courier).
    #[arg(long, env = "HEIC2PDF_FONT")]
    font: Option<String>,

    /// Page background colour (#rrggbb or r,g,b).
    #[arg(long, env = "HEIC2PDF_BACKGROUND")]
    background: Option<String>,

    /// Conversion history file.
    #[arg(long, env = "HEIC2PDF_HISTORY", default_value = heic2pdf::config::DEFAULT_HISTORY_FILE)]
    history: PathBuf,

    /// Directory for run logs and error reports.
    #[arg(long, env = "HEIC2PDF_LOGS_DIR", default_value = heic2pdf::config::DEFAULT_LOGS_DIR)]
    logs_dir: PathBuf,

    /// CloudConvert API key for HEIC input.
    #[arg(long, env = "CLOUDCONVERT_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// CloudConvert API base URL.
    #[arg(long, env = "CLOUDCONVERT_API_URL")]
    api_url: Option<String>,

    /// Give up on a remote job after this many seconds.
    #[arg(long, env = "HEIC2PDF_REMOTE_TIMEOUT", default_value_t = 300)]
    remote_timeout: u64,

    /// Attempts per remote conversion, counting the first one (1 = no retry).
    #[arg(long, env = "HEIC2PDF_MAX_ATTEMPTS", default_value_t = 3,
          value_parser = clap::value_parser!(u32).range(1..))]
    max_attempts: u32,

    /// Base delay between remote attempts, in milliseconds.
    #[arg(long, env = "HEIC2PDF_RETRY_DELAY_MS", default_value_t = 2000)]
    retry_delay_ms: u64,

    /// Log an alert for this recipient on success and failure.
    #[arg(long, env = "HEIC2PDF_NOTIFY")]
    notify: Option<String>,

    /// Continue without asking when triage finds issues.
    #[arg(short, long)]
    yes: bool,

    #[arg(long, env = "HEIC2PDF_NO_PROGRESS")]
    no_progress: bool,

    #[arg(short, long, env = "HEIC2PDF_VERBOSE")]
    verbose: bool,

    #[arg(short, long, env = "HEIC2PDF_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress;
    let _log_guard = init_logging(&cli, show_progress)?;

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli)?;
    let sink = CliSink::new(show_progress, cli.yes);

    // ── Run conversion ───────────────────────────────────────────────────
    let outcome = run(&cli.input, &cli.output, &config, &sink).await;
    sink.finish();
    let outcome = outcome.context("Conversion failed")?;

    if !cli.quiet {
        match outcome {
            RunOutcome::Success(path) => eprintln!(
                "{} PDF created  →  {}",
                green("✔"),
                bold(&path.display().to_string())
            ),
            RunOutcome::Empty => eprintln!(
                "{} No supported files found in {}",
                yellow("⚠"),
                cli.input.display()
            ),
            RunOutcome::AlreadyUpToDate => {
                eprintln!("{} All files already converted, nothing to do", green("✔"))
            }
            RunOutcome::Cancelled => eprintln!("{} Conversion cancelled", red("✘")),
        }
    }

    Ok(())
}

/// Stderr output filtered by the verbosity flags, plus a per-run log file in
/// the logs directory. The returned guard flushes the file on drop.
fn init_logging(cli: &Cli, show_progress: bool) -> Result<WorkerGuard> {
    // The progress bar carries the feedback that matters; keep stderr quiet.
    let console_level = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    let file_level = if cli.verbose { "debug" } else { "info" };

    std::fs::create_dir_all(&cli.logs_dir)
        .with_context(|| format!("Failed to create logs directory {}", cli.logs_dir.display()))?;
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(format!("heic2pdf_{}", Local::now().format("%Y%m%d_%H%M%S")))
        .filename_suffix("log")
        .build(&cli.logs_dir)
        .context("Failed to open log file")?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer().with_writer(io::stderr).with_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(console_level)),
            ),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(EnvFilter::new(file_level)),
        )
        .init();

    Ok(guard)
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli) -> Result<ConversionConfig> {
    let pdf = PdfLayoutOptions {
        orientation: Orientation::parse(&cli.orientation)?,
        page_size: PageSize::parse(&cli.page_size)?,
        watermark_text: cli.watermark.clone(),
        show_page_numbers: cli.page_numbers,
        merge_with: cli.merge.clone(),
        font: cli.font.clone(),
        background_color: cli.background.as_deref().map(RgbColor::parse).transpose()?,
    };

    let mut builder = ConversionConfig::builder()
        .quality(cli.quality)
        .recursive(cli.recursive)
        .skip_already_converted(cli.skip_converted)
        .delete_sources(cli.delete_sources)
        .pdf_options(pdf)
        .max_attempts(cli.max_attempts)
        .retry_delay(Duration::from_millis(cli.retry_delay_ms))
        .history_path(&cli.history)
        .logs_dir(&cli.logs_dir);

    if !cli.extensions.is_empty() {
        builder = builder.allowed_extensions(cli.extensions.iter().map(String::as_str));
    }
    if let Some(since) = &cli.since {
        builder = builder.min_modified_at(parse_min_modified(since)?);
    }
    if let Some(settings) = remote_settings(cli) {
        let client = CloudConvertClient::new(settings).context("Failed to set up remote converter")?;
        builder = builder.remote(Arc::new(client));
    }
    if let Some(recipient) = &cli.notify {
        builder = builder
            .notify_recipient(recipient.clone())
            .notifier(Arc::new(LogNotifier));
    }

    let config = builder.build()?;
    warn_on_merge_inputs(&config.pdf.merge_with);
    Ok(config)
}

fn remote_settings(cli: &Cli) -> Option<RemoteSettings> {
    let mut settings = RemoteSettings::from_parts(cli.api_key.as_deref(), cli.api_url.as_deref())?;
    settings.max_poll_wait = Duration::from_secs(cli.remote_timeout);
    Some(settings)
}

fn warn_on_merge_inputs(paths: &[PathBuf]) {
    for path in paths.iter().filter(|p| !p.is_file()) {
        tracing::warn!("Merge input {} does not exist; the run will fail at merge time", path.display());
    }
}
