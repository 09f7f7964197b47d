//! Pure Rust image processing backend: no external programs.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` (header only, no decode) |
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate (pure Rust decoders) |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Fill + crop | `image::DynamicImage::resize_to_fill` |
//! | Sharpening | `image::imageops::unsharpen` |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless only) |
//!
//! The `image` crate only ships a lossless WebP encoder, so quality, method
//! and the preset's cwebp tuning are ignored here; sharpening still applies.
//! Output is written to a temporary file next to the target and renamed into
//! place, so a failed encode never leaves a truncated `.webp` behind.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::EncodeParams;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Encode as lossless WebP through a sibling temp file, then rename into place.
fn save_webp(img: &DynamicImage, path: &Path) -> Result<u64, BackendError> {
    // WebPEncoder accepts 8-bit RGB(A) only
    let img = if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".rendition-")
        .suffix(".webp")
        .tempfile_in(dir)?;

    let mut writer = BufWriter::new(tmp.as_file_mut());
    img.write_with_encoder(WebPEncoder::new_lossless(&mut writer))
        .map_err(|e| BackendError::ProcessingFailed(format!("WebP encode failed: {}", e)))?;
    writer.flush()?;
    drop(writer);

    tmp.persist(path).map_err(|e| BackendError::Io(e.error))?;
    Ok(std::fs::metadata(path)?.len())
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn encode(&self, params: &EncodeParams) -> Result<u64, BackendError> {
        let img = load_image(&params.source)?;

        let resized = if params.crop_to_fill {
            // Fill-resize then center-crop to exact dimensions
            img.resize_to_fill(params.width, params.height, FilterType::Lanczos3)
        } else {
            img.resize_exact(params.width, params.height, FilterType::Lanczos3)
        };

        let final_img = match params.flags.sharpening() {
            Some(s) if resized.color().has_alpha() => DynamicImage::from(
                image::imageops::unsharpen(&resized.to_rgba8(), s.sigma, s.threshold),
            ),
            Some(s) => DynamicImage::from(image::imageops::unsharpen(
                &resized.to_rgb8(),
                s.sigma,
                s.threshold,
            )),
            None => resized,
        };

        save_webp(&final_img, &params.output)
    }
}
