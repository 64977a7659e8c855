//! Configuration types for image-folder-to-PDF conversion.
//!
//! All run behaviour is controlled through [`ConversionConfig`], built via its
//! [`ConversionConfigBuilder`]. Credentials and service endpoints live in
//! [`RemoteSettings`], which is constructed once at process start and handed
//! to the remote client explicitly; nothing in the library reads global
//! state on its own.
//!
//! Page presentation is described by [`PdfLayoutOptions`], an immutable value
//! passed to the PDF assembler for one run.

use crate::error::ConversionError;
use crate::pipeline::remote::RemoteConverter;
use crate::report::Notifier;
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Extensions accepted when the caller does not provide an allow-list.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "heic", "heif", "jpg", "jpeg", "png", "bmp", "gif", "tif", "tiff",
];

/// Default location of the conversion history, relative to the working directory.
pub const DEFAULT_HISTORY_FILE: &str = "conversion_history.json";

/// Default directory for run logs and error reports.
pub const DEFAULT_LOGS_DIR: &str = "logs";

const MM_TO_PT: f32 = 72.0 / 25.4;

/// Configuration for one folder-to-PDF run.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use heic2pdf::{ConversionConfig, PageSize};
///
/// let config = ConversionConfig::builder()
///     .quality(85)
///     .recursive(true)
///     .page_size(PageSize::A4)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// JPEG quality used when normalising each image. Range: 1–100. Default: 85.
    pub quality: u8,

    /// Lower-cased extensions (without the dot) that qualify for conversion.
    pub allowed_extensions: Vec<String>,

    /// Descend into subdirectories of the input folder. Default: false.
    pub recursive: bool,

    /// Only files modified at or after this instant qualify.
    pub min_modified_at: Option<DateTime<Utc>>,

    /// Drop files whose fingerprint was already converted after their last
    /// modification. Default: false.
    pub skip_already_converted: bool,

    /// Remove each processed source file after a successful run. Default: false.
    pub delete_sources: bool,

    /// Page layout and decorations.
    pub pdf: PdfLayoutOptions,

    /// Total attempts for a remote conversion (first try included). Default: 3.
    pub max_attempts: u32,

    /// Base delay between attempts; attempt `n` waits `n × retry_delay`. Default: 2 s.
    pub retry_delay: Duration,

    /// Path of the persistent conversion history.
    pub history_path: PathBuf,

    /// Directory receiving error reports.
    pub logs_dir: PathBuf,

    /// Recipient of success/failure alerts. No alerts when `None`.
    pub notify_recipient: Option<String>,

    /// Pre-constructed remote converter used as the HEIC fallback.
    pub remote: Option<Arc<dyn RemoteConverter>>,

    /// Alert delivery capability.
    pub notifier: Option<Arc<dyn Notifier>>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            quality: 85,
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            recursive: false,
            min_modified_at: None,
            skip_already_converted: false,
            delete_sources: false,
            pdf: PdfLayoutOptions::default(),
            max_attempts: 3,
            retry_delay: Duration::from_secs(2),
            history_path: PathBuf::from(DEFAULT_HISTORY_FILE),
            logs_dir: PathBuf::from(DEFAULT_LOGS_DIR),
            notify_recipient: None,
            remote: None,
            notifier: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("quality", &self.quality)
            .field("allowed_extensions", &self.allowed_extensions)
            .field("recursive", &self.recursive)
            .field("min_modified_at", &self.min_modified_at)
            .field("skip_already_converted", &self.skip_already_converted)
            .field("delete_sources", &self.delete_sources)
            .field("pdf", &self.pdf)
            .field("max_attempts", &self.max_attempts)
            .field("retry_delay", &self.retry_delay)
            .field("history_path", &self.history_path)
            .field("logs_dir", &self.logs_dir)
            .field("notify_recipient", &self.notify_recipient)
            .field("remote", &self.remote.as_ref().map(|_| "<dyn RemoteConverter>"))
            .field("notifier", &self.notifier.as_ref().map(|_| "<dyn Notifier>"))
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// One-line summary of the run parameters, used in logs and error reports.
    pub fn summary(&self) -> String {
        format!(
            "quality={} extensions=[{}] recursive={} since={} skip_converted={} delete_sources={} page={:?}/{:?}",
            self.quality,
            self.allowed_extensions.join(","),
            self.recursive,
            self.min_modified_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "-".into()),
            self.skip_already_converted,
            self.delete_sources,
            self.pdf.page_size,
            self.pdf.orientation,
        )
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn quality(mut self, quality: u8) -> Self {
        self.config.quality = quality;
        self
    }

    pub fn allowed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.allowed_extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    pub fn recursive(mut self, v: bool) -> Self {
        self.config.recursive = v;
        self
    }

    pub fn min_modified_at(mut self, t: DateTime<Utc>) -> Self {
        self.config.min_modified_at = Some(t);
        self
    }

    pub fn skip_already_converted(mut self, v: bool) -> Self {
        self.config.skip_already_converted = v;
        self
    }

    pub fn delete_sources(mut self, v: bool) -> Self {
        self.config.delete_sources = v;
        self
    }

    pub fn pdf_options(mut self, options: PdfLayoutOptions) -> Self {
        self.config.pdf = options;
        self
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.config.pdf.orientation = orientation;
        self
    }

    pub fn page_size(mut self, size: PageSize) -> Self {
        self.config.pdf.page_size = size;
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.max_attempts = n.max(1);
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry_delay = delay;
        self
    }

    pub fn history_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.history_path = path.into();
        self
    }

    pub fn logs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.logs_dir = dir.into();
        self
    }

    pub fn notify_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.config.notify_recipient = Some(recipient.into());
        self
    }

    pub fn remote(mut self, remote: Arc<dyn RemoteConverter>) -> Self {
        self.config.remote = Some(remote);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.config.notifier = Some(notifier);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConversionError> {
        let c = &self.config;
        if !(1..=100).contains(&c.quality) {
            return Err(ConversionError::InvalidConfig(format!(
                "Compression quality must be 1–100, got {}",
                c.quality
            )));
        }
        if c.allowed_extensions.is_empty() {
            return Err(ConversionError::InvalidConfig(
                "At least one file extension must be allowed".into(),
            ));
        }
        if let PageSize::Custom {
            width_mm,
            height_mm,
        } = c.pdf.page_size
        {
            if !(width_mm > 0.0 && height_mm > 0.0) {
                return Err(ConversionError::InvalidConfig(format!(
                    "Custom page size must be positive, got {width_mm}x{height_mm} mm"
                )));
            }
        }
        c.pdf.page_size.check_printable(c.pdf.orientation)?;
        Ok(self.config)
    }
}

/// Parse an ISO date (`YYYY-MM-DD`) into the start of that day, UTC.
pub fn parse_min_modified(s: &str) -> Result<DateTime<Utc>, ConversionError> {
    let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| {
        ConversionError::InvalidConfig(format!("Invalid date filter '{s}' (expected YYYY-MM-DD): {e}"))
    })?;
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| ConversionError::InvalidConfig(format!("Invalid date filter '{s}'")))
}

// ── PDF layout ───────────────────────────────────────────────────────────

/// Presentation options for the assembled document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PdfLayoutOptions {
    pub orientation: Orientation,
    pub page_size: PageSize,
    /// Diagonal light-gray text drawn over every page.
    pub watermark_text: Option<String>,
    /// Draw "Page N" centred at the bottom of every page.
    pub show_page_numbers: bool,
    /// Existing PDFs appended after the freshly produced pages, in order.
    pub merge_with: Vec<PathBuf>,
    /// Font for watermark and page numbers. Default: Helvetica.
    pub font: Option<String>,
    /// Full-page fill painted before the image.
    pub background_color: Option<RgbColor>,
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    /// Parse the `P`/`L` orientation code (long names accepted too).
    pub fn parse(s: &str) -> Result<Self, ConversionError> {
        match s.trim().to_lowercase().as_str() {
            "p" | "portrait" => Ok(Orientation::Portrait),
            "l" | "landscape" => Ok(Orientation::Landscape),
            other => Err(ConversionError::InvalidConfig(format!(
                "Orientation must be P or L, got '{other}'"
            ))),
        }
    }

    /// `(horizontal, vertical)` margin budget in points. The long page
    /// dimension gets the smaller margin.
    pub fn margins(self) -> (f32, f32) {
        match self {
            Orientation::Portrait => (20.0, 30.0),
            Orientation::Landscape => (30.0, 20.0),
        }
    }
}

/// Named paper sizes, or an explicit size in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PageSize {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
    Custom { width_mm: f32, height_mm: f32 },
}

static CUSTOM_SIZE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(\d+(?:\.\d+)?)\s*[x×]\s*(\d+(?:\.\d+)?)\s*(?:mm)?\s*$")
        .expect("valid page size regex")
});

impl PageSize {
    /// Parse a paper name (`A4`, `letter`, …) or `<width>x<height>` in mm.
    pub fn parse(s: &str) -> Result<Self, ConversionError> {
        match s.trim().to_lowercase().as_str() {
            "a3" => return Ok(PageSize::A3),
            "a4" => return Ok(PageSize::A4),
            "a5" => return Ok(PageSize::A5),
            "letter" => return Ok(PageSize::Letter),
            "legal" => return Ok(PageSize::Legal),
            _ => {}
        }
        let caps = CUSTOM_SIZE_RE.captures(s).ok_or_else(|| {
            ConversionError::InvalidConfig(format!(
                "Unknown page size '{s}' (use A3, A4, A5, Letter, Legal or WIDTHxHEIGHT in mm)"
            ))
        })?;
        let width_mm: f32 = caps[1]
            .parse()
            .map_err(|_| ConversionError::InvalidConfig(format!("Invalid page width in '{s}'")))?;
        let height_mm: f32 = caps[2]
            .parse()
            .map_err(|_| ConversionError::InvalidConfig(format!("Invalid page height in '{s}'")))?;
        let size = PageSize::Custom {
            width_mm,
            height_mm,
        };
        // Both orientations leave the same room: the short side loses the
        // smaller margin either way.
        size.check_printable(Orientation::Portrait)?;
        Ok(size)
    }

    /// Room left for the image once the orientation's margins are taken off,
    /// in points.
    pub fn printable_area(self, orientation: Orientation) -> (f32, f32) {
        let (w, h) = self.dimensions_pt(orientation);
        let (h_margin, v_margin) = orientation.margins();
        (w - h_margin, h - v_margin)
    }

    /// Fail with `InvalidConfig` unless the page leaves room for an image.
    pub fn check_printable(self, orientation: Orientation) -> Result<(), ConversionError> {
        let (w, h) = self.printable_area(orientation);
        if w > 0.0 && h > 0.0 {
            return Ok(());
        }
        let (w_mm, h_mm) = self.millimetres();
        Err(ConversionError::InvalidConfig(format!(
            "Page size {w_mm}x{h_mm} mm is too small: no room left inside the margins"
        )))
    }

    fn millimetres(self) -> (f32, f32) {
        match self {
            PageSize::A3 => (297.0, 420.0),
            PageSize::A4 => (210.0, 297.0),
            PageSize::A5 => (148.0, 210.0),
            PageSize::Letter => (215.9, 279.4),
            PageSize::Legal => (215.9, 355.6),
            PageSize::Custom {
                width_mm,
                height_mm,
            } => (width_mm, height_mm),
        }
    }

    /// Page `(width, height)` in points for the given orientation.
    pub fn dimensions_pt(self, orientation: Orientation) -> (f32, f32) {
        let (w, h) = self.millimetres();
        let (short, long) = if w <= h { (w, h) } else { (h, w) };
        let (w, h) = match orientation {
            Orientation::Portrait => (short, long),
            Orientation::Landscape => (long, short),
        };
        (w * MM_TO_PT, h * MM_TO_PT)
    }
}

/// An 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#?([0-9a-fA-F]{6})$").expect("valid hex colour regex"));
static TRIPLE_COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*$")
        .expect("valid rgb triple regex")
});

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `r,g,b`.
    pub fn parse(s: &str) -> Result<Self, ConversionError> {
        let invalid = || ConversionError::InvalidConfig(format!("Invalid colour '{s}' (use #rrggbb or r,g,b)"));
        if let Some(caps) = HEX_COLOR_RE.captures(s.trim()) {
            let v = u32::from_str_radix(&caps[1], 16).map_err(|_| invalid())?;
            return Ok(Self::new((v >> 16) as u8, (v >> 8) as u8, v as u8));
        }
        let caps = TRIPLE_COLOR_RE.captures(s).ok_or_else(invalid)?;
        let channel = |i: usize| caps[i].parse::<u8>().map_err(|_| invalid());
        Ok(Self::new(channel(1)?, channel(2)?, channel(3)?))
    }

    /// Channels scaled to the 0–1 range PDF colour operators expect.
    pub fn unit(self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

// ── Remote service ───────────────────────────────────────────────────────

/// Endpoint and credentials for the remote HEIC conversion service.
#[derive(Clone)]
pub struct RemoteSettings {
    pub api_base: String,
    pub api_key: String,
    /// Delay between job status polls. Default: 2 s.
    pub poll_interval: Duration,
    /// Give up on a job that is not terminal after this long. Default: 300 s.
    pub max_poll_wait: Duration,
    /// Per-request HTTP timeout. Default: 120 s.
    pub http_timeout: Duration,
}

impl fmt::Debug for RemoteSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteSettings")
            .field("api_base", &self.api_base)
            .field("api_key", &"<redacted>")
            .field("poll_interval", &self.poll_interval)
            .field("max_poll_wait", &self.max_poll_wait)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

impl RemoteSettings {
    pub const DEFAULT_API_BASE: &'static str = "https://api.cloudconvert.com/v2";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_base: Self::DEFAULT_API_BASE.to_string(),
            api_key: api_key.into(),
            poll_interval: Duration::from_secs(2),
            max_poll_wait: Duration::from_secs(300),
            http_timeout: Duration::from_secs(120),
        }
    }

    /// Settings from an API key and optional base URL. A blank key means no
    /// remote converter.
    pub fn from_parts(api_key: Option<&str>, api_base: Option<&str>) -> Option<Self> {
        let key = api_key.map(str::trim).filter(|k| !k.is_empty())?;
        let mut settings = Self::new(key);
        if let Some(base) = api_base.map(str::trim).filter(|b| !b.is_empty()) {
            settings.api_base = base.trim_end_matches('/').to_string();
        }
        Some(settings)
    }

    /// Read `CLOUDCONVERT_API_KEY` (required) and `CLOUDCONVERT_API_URL`.
    pub fn from_env() -> Option<Self> {
        let key = std::env::var("CLOUDCONVERT_API_KEY").ok();
        let base = std::env::var("CLOUDCONVERT_API_URL").ok();
        Self::from_parts(key.as_deref(), base.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_out_of_range_is_rejected() {
        assert!(ConversionConfig::builder().quality(0).build().is_err());
        assert!(ConversionConfig::builder().quality(101).build().is_err());
        assert!(ConversionConfig::builder().quality(1).build().is_ok());
        assert!(ConversionConfig::builder().quality(100).build().is_ok());
    }

    #[test]
    fn extensions_are_normalised() {
        let config = ConversionConfig::builder()
            .allowed_extensions([".JPG", "Png"])
            .build()
            .unwrap();
        assert_eq!(config.allowed_extensions, vec!["jpg", "png"]);
    }

    #[test]
    fn empty_extension_list_is_rejected() {
        let empty: [&str; 0] = [];
        assert!(ConversionConfig::builder()
            .allowed_extensions(empty)
            .build()
            .is_err());
    }

    #[test]
    fn min_modified_parses_iso_date() {
        let t = parse_min_modified("2024-03-01").unwrap();
        assert_eq!(t.to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert!(parse_min_modified("01/03/2024").is_err());
        assert!(parse_min_modified("2024-13-01").is_err());
    }

    #[test]
    fn page_size_names_and_custom() {
        assert_eq!(PageSize::parse("a4").unwrap(), PageSize::A4);
        assert_eq!(PageSize::parse("Letter").unwrap(), PageSize::Letter);
        assert_eq!(
            PageSize::parse("100x150").unwrap(),
            PageSize::Custom {
                width_mm: 100.0,
                height_mm: 150.0
            }
        );
        assert_eq!(
            PageSize::parse("90.5 x 60mm").unwrap(),
            PageSize::Custom {
                width_mm: 90.5,
                height_mm: 60.0
            }
        );
        assert!(PageSize::parse("B7").is_err());
        assert!(PageSize::parse("0x100").is_err());
    }

    #[test]
    fn pages_without_room_inside_the_margins_are_rejected() {
        assert!(matches!(
            PageSize::parse("5x5"),
            Err(ConversionError::InvalidConfig(_))
        ));
        let tiny = PageSize::Custom {
            width_mm: 5.0,
            height_mm: 5.0,
        };
        for orientation in [Orientation::Portrait, Orientation::Landscape] {
            let err = ConversionConfig::builder()
                .page_size(tiny)
                .orientation(orientation)
                .build()
                .unwrap_err();
            assert!(err.to_string().contains("too small"), "{err}");
        }

        // Just above the 20pt / 30pt budgets.
        let (w, h) = PageSize::parse("8x11").unwrap().printable_area(Orientation::Portrait);
        assert!(w > 0.0 && h > 0.0, "{w}x{h}");
        assert!(PageSize::A5.printable_area(Orientation::Landscape).0 > 0.0);
    }

    #[test]
    fn a4_dimensions_follow_orientation() {
        let (w, h) = PageSize::A4.dimensions_pt(Orientation::Portrait);
        assert!((w - 595.28).abs() < 0.1, "w={w}");
        assert!((h - 841.89).abs() < 0.1, "h={h}");
        let (lw, lh) = PageSize::A4.dimensions_pt(Orientation::Landscape);
        assert_eq!((lw, lh), (h, w));
    }

    #[test]
    fn orientation_codes() {
        assert_eq!(Orientation::parse("P").unwrap(), Orientation::Portrait);
        assert_eq!(Orientation::parse("l").unwrap(), Orientation::Landscape);
        assert!(Orientation::parse("X").is_err());
        assert_eq!(Orientation::Portrait.margins(), (20.0, 30.0));
        assert_eq!(Orientation::Landscape.margins(), (30.0, 20.0));
    }

    #[test]
    fn colour_parsing() {
        assert_eq!(RgbColor::parse("#ff8000").unwrap(), RgbColor::new(255, 128, 0));
        assert_eq!(RgbColor::parse("10, 20,30").unwrap(), RgbColor::new(10, 20, 30));
        assert!(RgbColor::parse("300,0,0").is_err());
        assert!(RgbColor::parse("blue").is_err());
    }

    #[test]
    fn remote_settings_need_a_key() {
        assert!(RemoteSettings::from_parts(None, Some("http://x")).is_none());
        assert!(RemoteSettings::from_parts(Some("  "), None).is_none());
        let s = RemoteSettings::from_parts(Some("k"), Some("http://localhost:8080/v2/")).unwrap();
        assert_eq!(s.api_base, "http://localhost:8080/v2");
        let s = RemoteSettings::from_parts(Some("k"), None).unwrap();
        assert_eq!(s.api_base, RemoteSettings::DEFAULT_API_BASE);
    }

    #[test]
    fn remote_settings_debug_redacts_key() {
        let s = RemoteSettings::new("secret-key");
        let dbg = format!("{s:?}");
        assert!(!dbg.contains("secret-key"));
        assert_eq!(s.max_poll_wait, Duration::from_secs(300));
    }
}
