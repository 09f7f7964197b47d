//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the planner (which decides which renditions to create)
//! and the [`backend`](super::backend) (which does the actual pixel work).
//! This separation allows swapping backends (e.g. for testing with a mock)
//! without changing planning logic.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (0–100). Clamped on construction.
//! - [`Method`]: cwebp compression effort (0 = fastest, 6 = smallest output).
//! - [`AspectRatio`]: The fixed crop ratios: `16:9`, `4:3`, `1:1`.
//! - [`Preset`]: Named encoder tuning bundle for a class of imagery.
//! - [`Sharpening`]: Unsharp-mask parameters applied while resizing.
//! - [`EncoderFlags`]: Quality, effort and preset tuning resolved for one job.
//! - [`EncodeParams`]: Everything needed to encode one rendition.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// A textual parameter (ratio, preset) that does not name a known value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseParamError {
    #[error("unknown aspect ratio '{0}' (expected one of: 16:9, 4:3, 1:1)")]
    UnknownRatio(String),
    #[error("unknown preset '{0}' (expected one of: photo, picture, drawing, icon, text)")]
    UnknownPreset(String),
}

/// Quality setting for lossy WebP encoding (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.min(100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(82)
    }
}

/// Compression effort passed to cwebp as `-m` (0-6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Method(pub u32);

impl Method {
    pub const MAX: u32 = 6;

    pub fn new(value: u32) -> Self {
        Self(value.min(Self::MAX))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Method {
    fn default() -> Self {
        Self(4)
    }
}

/// Target aspect ratio for fixed-ratio renditions.
///
/// Heights are derived as `floor(width * height_part / width_part)` using the
/// reduced ratio, so `16:9` at 1920 gives 1080 and `4:3` at 1600 gives 1200.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "16:9")]
    Widescreen,
    #[serde(rename = "4:3")]
    Standard,
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatio {
    /// The reduced ratio as `(width_part, height_part)`.
    pub fn parts(self) -> (u32, u32) {
        match self {
            AspectRatio::Widescreen => (16, 9),
            AspectRatio::Standard => (4, 3),
            AspectRatio::Square => (1, 1),
        }
    }
}

impl FromStr for AspectRatio {
    type Err = ParseParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "16:9" => Ok(AspectRatio::Widescreen),
            "4:3" => Ok(AspectRatio::Standard),
            "1:1" => Ok(AspectRatio::Square),
            other => Err(ParseParamError::UnknownRatio(other.to_string())),
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.parts();
        write!(f, "{w}:{h}")
    }
}

/// Named encoder tuning bundle. The names match cwebp's own `-preset` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Photo,
    Picture,
    Drawing,
    Icon,
    Text,
}

impl Preset {
    pub const ALL: [Preset; 5] = [
        Preset::Photo,
        Preset::Picture,
        Preset::Drawing,
        Preset::Icon,
        Preset::Text,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Photo => "photo",
            Preset::Picture => "picture",
            Preset::Drawing => "drawing",
            Preset::Icon => "icon",
            Preset::Text => "text",
        }
    }

    /// Hand-tuned flags layered on top of cwebp's built-in preset.
    pub fn tuning(self) -> Tuning {
        match self {
            Preset::Photo => Tuning {
                sns_strength: 80,
                filter_strength: 30,
                segments: None,
                sharp_yuv: false,
                sharpening: Some(Sharpening::light()),
            },
            Preset::Picture => Tuning {
                sns_strength: 80,
                filter_strength: 35,
                segments: None,
                sharp_yuv: false,
                sharpening: Some(Sharpening::soft()),
            },
            Preset::Drawing => Tuning {
                sns_strength: 25,
                filter_strength: 10,
                segments: None,
                sharp_yuv: true,
                sharpening: Some(Sharpening::strong()),
            },
            Preset::Icon => Tuning {
                sns_strength: 0,
                filter_strength: 0,
                segments: None,
                sharp_yuv: false,
                sharpening: None,
            },
            // cwebp's text preset drops to 2 segments; bring it back up to 4
            Preset::Text => Tuning {
                sns_strength: 0,
                filter_strength: 0,
                segments: Some(4),
                sharp_yuv: false,
                sharpening: None,
            },
        }
    }
}

impl FromStr for Preset {
    type Err = ParseParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Preset::ALL
            .into_iter()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| ParseParamError::UnknownPreset(s.trim().to_string()))
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sharpening parameters for unsharp mask.
///
/// - `sigma`: Standard deviation of the Gaussian blur (higher = more sharpening)
/// - `threshold`: Minimum brightness difference to sharpen (0 = sharpen all pixels)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sharpening {
    pub sigma: f32,
    pub threshold: i32,
}

impl Sharpening {
    /// Mild sharpening for photographs.
    pub fn light() -> Self {
        Self {
            sigma: 0.5,
            threshold: 0,
        }
    }

    /// Gentler than [`light`](Self::light), keeps gradients smooth.
    pub fn soft() -> Self {
        Self {
            sigma: 0.3,
            threshold: 2,
        }
    }

    /// Line art and diagrams: keep edges crisp after downscaling.
    pub fn strong() -> Self {
        Self {
            sigma: 1.0,
            threshold: 0,
        }
    }
}

/// Per-preset tuning values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tuning {
    /// Spatial noise shaping, cwebp `-sns` (0-100).
    pub sns_strength: u32,
    /// Deblocking filter strength, cwebp `-f` (0-100).
    pub filter_strength: u32,
    /// Segment count override, cwebp `-segments` (1-4).
    pub segments: Option<u32>,
    /// Sharper RGB→YUV conversion, cwebp `-sharp_yuv`.
    pub sharp_yuv: bool,
    /// Unsharp mask applied after resizing.
    pub sharpening: Option<Sharpening>,
}

/// Encoder settings resolved for a single rendition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EncoderFlags {
    pub quality: Quality,
    pub method: Method,
    pub preset: Option<Preset>,
    pub tuning: Option<Tuning>,
}

impl EncoderFlags {
    /// Plain quality/method pair, or the preset's flag table when one is given.
    pub fn for_preset(preset: Option<Preset>, quality: Quality, method: Method) -> Self {
        Self {
            quality,
            method,
            preset,
            tuning: preset.map(Preset::tuning),
        }
    }

    /// Arguments for `cwebp`, excluding the input and `-o <output>`.
    ///
    /// `-preset` has to be the first option; cwebp applies it before
    /// everything else and would otherwise clobber the explicit values.
    pub fn cwebp_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(preset) = self.preset {
            args.push("-preset".to_string());
            args.push(preset.name().to_string());
        }
        args.push("-q".to_string());
        args.push(self.quality.value().to_string());
        args.push("-m".to_string());
        args.push(self.method.value().to_string());

        if let Some(t) = self.tuning {
            args.push("-sns".to_string());
            args.push(t.sns_strength.to_string());
            args.push("-f".to_string());
            args.push(t.filter_strength.to_string());
            if let Some(segments) = t.segments {
                args.push("-segments".to_string());
                args.push(segments.to_string());
            }
            if t.sharp_yuv {
                args.push("-sharp_yuv".to_string());
            }
        }
        args
    }

    /// Sharpening to apply at the resize step, if any.
    pub fn sharpening(&self) -> Option<Sharpening> {
        self.tuning.and_then(|t| t.sharpening)
    }
}

/// Parameters for one rendition encode: resize (or fill + center crop) the
/// source to exactly `width`x`height`, then encode it with `flags`.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Resize to cover the target box, then center-crop to it.
    pub crop_to_fill: bool,
    pub flags: EncoderFlags,
}
