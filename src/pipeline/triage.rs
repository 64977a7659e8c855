//! Issue triage: flag images likely to convert badly or slowly.
//!
//! Advisory only. The orchestrator collects the findings and asks the
//! operator once whether to go on; nothing here blocks a conversion.

use crate::error::ConversionError;
use crate::output::{extension_of, ConversionIssue, FileRecord};
use crate::pipeline::codec;
use image::ColorType;
use std::path::Path;
use tracing::debug;

/// Either dimension above this is flagged as a memory risk.
pub const MAX_DIMENSION_PX: u32 = 5000;
/// Either dimension below this is flagged as a quality risk.
pub const MIN_DIMENSION_PX: u32 = 100;
/// Files larger than this are flagged.
pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Inspect one file. An empty result means no issues.
///
/// Formats without a local decoder get the file-size rule only; their
/// pixels are checked after remote conversion, if at all.
pub fn inspect(path: &Path) -> Vec<String> {
    let mut messages = Vec::new();

    if codec::local_decoder_available(&extension_of(path)) {
        match codec::probe(path) {
            Ok(probe) => {
                let (w, h) = (probe.width, probe.height);
                if w > MAX_DIMENSION_PX || h > MAX_DIMENSION_PX {
                    messages.push(format!(
                        "High resolution ({w}x{h}px), possible memory pressure."
                    ));
                } else if w < MIN_DIMENSION_PX || h < MIN_DIMENSION_PX {
                    messages.push(format!("Low resolution ({w}x{h}px), possible quality loss."));
                }
                if !is_rgb_mode(probe.color_type) {
                    messages.push(format!(
                        "Unusual color mode {:?}, will be converted to RGB.",
                        probe.color_type
                    ));
                }
            }
            Err(ConversionError::Decode { detail, .. }) => {
                messages.push(format!("Cannot be read: {detail}."));
            }
            Err(e) => messages.push(format!("Cannot be read: {e}.")),
        }
    }

    match std::fs::metadata(path) {
        Ok(meta) if meta.len() > MAX_FILE_BYTES => {
            messages.push(format!(
                "Large file ({:.1} MB).",
                meta.len() as f64 / (1024.0 * 1024.0)
            ));
        }
        Ok(_) => {}
        Err(e) => messages.push(format!("Cannot read file size: {e}.")),
    }

    if !messages.is_empty() {
        debug!("Triage {}: {}", path.display(), messages.join(" "));
    }
    messages
}

/// Inspect every record, keeping only files with findings.
pub fn triage(records: &[FileRecord]) -> Vec<ConversionIssue> {
    records
        .iter()
        .filter_map(|record| {
            let messages = inspect(&record.path);
            (!messages.is_empty()).then(|| ConversionIssue {
                file_path: record.path.clone(),
                messages,
            })
        })
        .collect()
}

fn is_rgb_mode(color: ColorType) -> bool {
    matches!(
        color,
        ColorType::Rgb8
            | ColorType::Rgba8
            | ColorType::Rgb16
            | ColorType::Rgba16
            | ColorType::Rgb32F
            | ColorType::Rgba32F
    )
}
