//! Rendition planning: from a request and the source's dimensions to an
//! ordered list of jobs.
//!
//! Planning is a pure function. It never touches the filesystem or a backend,
//! so the same request always yields the same jobs in the same order.
//!
//! ## Rules
//!
//! 1. Widths are de-duplicated and sorted descending.
//! 2. Widths larger than the source are skipped, never upscaled.
//! 3. Heights follow the source aspect ratio (proportional mode) or a fixed
//!    ratio (fixed-ratio mode, which also center-crops at encode time).
//! 4. The smallest surviving width gets `thumb_quality`; all others get
//!    `quality`. This is positional, so if large widths are skipped the tier
//!    moves with them.
//! 5. The largest surviving width is written as `{basename}.webp`, all others
//!    as `{basename}-{w}x{h}.webp`.
//!
//! ## Example
//!
//! ```text
//! source 3000x2000, widths 2560,1920,1280,960,640, basename "photo"
//!
//! photo.webp            2560x1707  q82
//! photo-1920x1280.webp  1920x1280  q82
//! photo-1280x853.webp   1280x853   q82
//! photo-960x640.webp     960x640   q82
//! photo-640x427.webp     640x427   q75 (thumb)
//! ```

use crate::imaging::{
    AspectRatio, EncoderFlags, Method, ParseParamError, Preset, Quality, proportional_height,
    ratio_height,
};
use crate::naming::rendition_path;
use crate::types::{RenditionJob, SourceImage};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Caller-input errors. All of them are raised before any encode runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("no widths given")]
    NoWidths,
    #[error("invalid width '{0}': expected a positive integer")]
    InvalidWidth(String),
    #[error(transparent)]
    Param(#[from] ParseParamError),
    #[error("quality must be 0-100, got {0}")]
    InvalidQuality(u32),
    #[error("thumbnail quality must be 0-100, got {0}")]
    InvalidThumbQuality(u32),
    #[error("method must be 0-{max}, got {0}", max = Method::MAX)]
    InvalidMethod(u32),
    #[error("output basename must not be empty")]
    EmptyBasename,
}

/// How rendition heights are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Keep the source aspect ratio.
    Proportional,
    /// Force a ratio and center-crop to fill it.
    FixedRatio(AspectRatio),
}

impl Mode {
    pub fn height_for(self, source: &SourceImage, width: u32) -> u32 {
        match self {
            Mode::Proportional => proportional_height(source.dimensions(), width),
            Mode::FixedRatio(ratio) => ratio_height(ratio, width),
        }
    }

    pub fn crops(self) -> bool {
        matches!(self, Mode::FixedRatio(_))
    }
}

/// Everything the planner needs, fixed for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenditionRequest {
    pub source: SourceImage,
    pub widths: Vec<u32>,
    pub basename: String,
    pub output_dir: PathBuf,
    pub quality: u32,
    /// Quality for the smallest rendition. `None` means same as `quality`.
    pub thumb_quality: Option<u32>,
    pub method: u32,
    pub mode: Mode,
    pub preset: Option<Preset>,
}

impl RenditionRequest {
    pub fn effective_thumb_quality(&self) -> u32 {
        self.thumb_quality.unwrap_or(self.quality)
    }

    fn validate(&self) -> Result<(), PlanError> {
        if self.widths.is_empty() {
            return Err(PlanError::NoWidths);
        }
        if self.widths.contains(&0) {
            return Err(PlanError::InvalidWidth("0".to_string()));
        }
        if self.quality > 100 {
            return Err(PlanError::InvalidQuality(self.quality));
        }
        if let Some(q) = self.thumb_quality.filter(|&q| q > 100) {
            return Err(PlanError::InvalidThumbQuality(q));
        }
        if self.method > Method::MAX {
            return Err(PlanError::InvalidMethod(self.method));
        }
        if self.basename.trim().is_empty() {
            return Err(PlanError::EmptyBasename);
        }
        Ok(())
    }
}

/// The planned jobs plus the widths that were dropped as too large.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub jobs: Vec<RenditionJob>,
    /// Requested widths above the source width, descending.
    pub skipped: Vec<u32>,
}

/// Parse a comma-separated width list such as `"2560, 1920,1280"`.
///
/// Empty entries (a trailing comma) are ignored. Order is preserved; sorting
/// happens in [`plan_jobs`].
pub fn parse_widths(input: &str) -> Result<Vec<u32>, PlanError> {
    let widths = input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.parse::<u32>() {
            Ok(w) if w > 0 => Ok(w),
            _ => Err(PlanError::InvalidWidth(s.to_string())),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if widths.is_empty() {
        return Err(PlanError::NoWidths);
    }
    Ok(widths)
}

/// Compute the ordered job list for a request.
pub fn plan_jobs(request: &RenditionRequest) -> Result<Plan, PlanError> {
    request.validate()?;

    let mut widths = request.widths.clone();
    widths.sort_unstable_by(|a, b| b.cmp(a));
    widths.dedup();

    let (survivors, skipped): (Vec<u32>, Vec<u32>) = widths
        .into_iter()
        .partition(|&w| w <= request.source.width);

    let quality = Quality::new(request.quality);
    let thumb_quality = Quality::new(request.effective_thumb_quality());
    let method = Method::new(request.method);
    let smallest = survivors.last().copied();

    let jobs = survivors
        .iter()
        .enumerate()
        .map(|(i, &width)| {
            let height = request.mode.height_for(&request.source, width);
            let primary = i == 0;
            let q = if Some(width) == smallest {
                thumb_quality
            } else {
                quality
            };
            RenditionJob {
                width,
                height,
                output_path: rendition_path(
                    &request.output_dir,
                    &request.basename,
                    width,
                    height,
                    primary,
                ),
                primary,
                crop_to_fill: request.mode.crops(),
                flags: EncoderFlags::for_preset(request.preset, q, method),
            }
        })
        .collect();

    Ok(Plan { jobs, skipped })
}
