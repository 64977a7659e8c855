//! Image codec adapter: open a raster file, normalise to RGB, re-encode as JPEG.
//!
//! Every page ends up as a baseline RGB JPEG at the run's quality, embedded
//! into the PDF unchanged (`DCTDecode`). JPEG keeps the document small for
//! photo-heavy folders; normalising to RGB drops alpha and palette modes that
//! PDF viewers handle inconsistently.
//!
//! Whether a format can be decoded locally at all is a property of the
//! build, answered by [`local_decoder_available`]. The `image` crate ships no
//! HEIC/HEIF decoder, so those files always report
//! [`ConversionError::CodecUnavailable`] and are routed to the remote
//! converter by the orchestrator.

use crate::error::{ConversionError, Result};
use crate::output::{extension_of, NormalizedImage};
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::path::Path;
use tracing::debug;

/// Header-level facts about an image, read without decoding pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageProbe {
    pub width: u32,
    pub height: u32,
    pub color_type: ColorType,
}

/// True when this build can decode files with extension `ext` locally.
pub fn local_decoder_available(ext: &str) -> bool {
    ImageFormat::from_extension(ext).is_some_and(|f| f.reading_enabled())
}

/// Display name for a format, used in messages.
pub fn format_name(ext: &str) -> String {
    match ext {
        "heic" | "heif" => "HEIC".to_string(),
        "" => "unknown format".to_string(),
        other => other.to_uppercase(),
    }
}

fn reader(path: &Path) -> Result<ImageReader<std::io::BufReader<std::fs::File>>> {
    let ext = extension_of(path);
    if !local_decoder_available(&ext) {
        return Err(ConversionError::CodecUnavailable {
            path: path.to_path_buf(),
            format: format_name(&ext),
        });
    }
    ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| ConversionError::io(path, e))
}

/// Read dimensions and colour type from the file header.
pub fn probe(path: &Path) -> Result<ImageProbe> {
    let decoder = reader(path)?
        .into_decoder()
        .map_err(|e| decode_error(path, e))?;
    let (width, height) = decoder.dimensions();
    Ok(ImageProbe {
        width,
        height,
        color_type: decoder.color_type(),
    })
}

/// Decode `path` into memory.
pub fn open(path: &Path) -> Result<DynamicImage> {
    let img = reader(path)?.decode().map_err(|e| decode_error(path, e))?;
    debug!(
        "Decoded {} → {}x{} {:?}",
        path.display(),
        img.width(),
        img.height(),
        img.color()
    );
    Ok(img)
}

/// Convert `img` to RGB and re-encode it as JPEG at `quality` (1–100).
pub fn normalize(source: &Path, img: DynamicImage, quality: u8) -> Result<NormalizedImage> {
    let rgb = match img {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => other.to_rgb8(),
    };
    let (width, height) = rgb.dimensions();

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality)
        .encode_image(&rgb)
        .map_err(|e| ConversionError::Encode {
            path: source.to_path_buf(),
            quality,
            detail: e.to_string(),
        })?;
    debug!(
        "Normalised {} → {}x{} JPEG q{} ({} bytes)",
        source.display(),
        width,
        height,
        quality,
        jpeg.len()
    );

    Ok(NormalizedImage {
        source: source.to_path_buf(),
        width,
        height,
        jpeg,
    })
}

/// Decode and normalise in one step.
pub fn load_normalized(path: &Path, quality: u8) -> Result<NormalizedImage> {
    let img = open(path)?;
    normalize(path, img, quality)
}

// Read failures after the file was opened mean truncated or malformed
// content, so every decoder error is a per-file decode failure.
fn decode_error(path: &Path, e: image::ImageError) -> ConversionError {
    ConversionError::Decode {
        path: path.to_path_buf(),
        detail: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
    use tempfile::TempDir;

    #[test]
    fn heic_has_no_local_decoder() {
        assert!(!local_decoder_available("heic"));
        assert!(!local_decoder_available("heif"));
        assert!(local_decoder_available("jpg"));
        assert!(local_decoder_available("png"));
        assert!(local_decoder_available("tiff"));
    }

    #[test]
    fn opening_heic_reports_codec_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("IMG_1.HEIC");
        std::fs::write(&path, b"\0\0\0\x18ftypheic").unwrap();
        let err = open(&path).unwrap_err();
        assert!(
            matches!(err, ConversionError::CodecUnavailable { ref format, .. } if format == "HEIC"),
            "got {err:?}"
        );
    }

    #[test]
    fn truncated_file_is_a_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"\x89PNG\r\n\x1a\nnot really").unwrap();
        let err = open(&path).unwrap_err();
        assert!(matches!(err, ConversionError::Decode { .. }), "got {err:?}");
    }

    #[test]
    fn rgba_is_flattened_to_rgb_jpeg() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 20, Rgba([10, 200, 30, 128])));
        let norm = normalize(Path::new("x.png"), img, 90).unwrap();
        assert_eq!((norm.width, norm.height), (40, 20));

        let decoded = image::load_from_memory_with_format(&norm.jpeg, ImageFormat::Jpeg).unwrap();
        assert_eq!(decoded.color(), ColorType::Rgb8);
        assert_eq!((decoded.width(), decoded.height()), (40, 20));
    }

    #[test]
    fn grayscale_is_expanded_to_rgb() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(16, 16, Luma([77])));
        let norm = normalize(Path::new("g.png"), img, 80).unwrap();
        let decoded = image::load_from_memory(&norm.jpeg).unwrap();
        assert_eq!(decoded.color(), ColorType::Rgb8);
    }

    #[test]
    fn reencoding_rgb_is_idempotent_at_fixed_quality() {
        // Mid-gray maps to zero AC/DC residue, so the first pass is exact.
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 48, Rgb([128, 128, 128])));
        let first = normalize(Path::new("a.jpg"), img, 85).unwrap();
        let decoded = image::load_from_memory(&first.jpeg).unwrap();
        let second = normalize(Path::new("a.jpg"), decoded, 85).unwrap();

        let a = image::load_from_memory(&first.jpeg).unwrap().to_rgb8();
        let b = image::load_from_memory(&second.jpeg).unwrap().to_rgb8();
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn probe_reads_header_only_facts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("p.png");
        GrayImage::from_pixel(120, 90, Luma([0])).save(&path).unwrap();
        let p = probe(&path).unwrap();
        assert_eq!((p.width, p.height), (120, 90));
        assert_eq!(p.color_type, ColorType::L8);
    }

    #[test]
    fn load_normalized_round_trip_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.png");
        RgbImage::from_pixel(32, 24, Rgb([1, 2, 3])).save(&path).unwrap();
        let norm = load_normalized(&path, 85).unwrap();
        assert_eq!(norm.source, path);
        assert_eq!((norm.width, norm.height), (32, 24));
        assert_eq!(&norm.jpeg[..2], &[0xFF, 0xD8]);
    }
}
