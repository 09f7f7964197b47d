//! Shared types used across planning, processing and output.
//!
//! Everything here is immutable once built: a [`SourceImage`] is probed once
//! per run, and the [`RenditionJob`] list is computed once and then consumed.
//! Both serialize to JSON for `plan --json`.

use crate::imaging::{EncodeParams, EncoderFlags, Quality};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// The image being converted, with the dimensions the plan is based on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl SourceImage {
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            width,
            height,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Outcome of probing the source for its dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Probe {
    pub image: SourceImage,
    /// Why the probe failed, when `image` carries the assumed fallback size.
    pub fallback_reason: Option<String>,
}

impl Probe {
    pub fn is_fallback(&self) -> bool {
        self.fallback_reason.is_some()
    }
}

/// One rendition to produce.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenditionJob {
    pub width: u32,
    pub height: u32,
    pub output_path: PathBuf,
    /// The largest rendition, written without a dimension suffix.
    pub primary: bool,
    /// Fixed-ratio jobs are resized to cover the box, then center-cropped.
    pub crop_to_fill: bool,
    pub flags: EncoderFlags,
}

impl RenditionJob {
    pub fn quality(&self) -> Quality {
        self.flags.quality
    }

    /// Backend parameters for encoding this job from `source`.
    pub fn encode_params(&self, source: &Path) -> EncodeParams {
        EncodeParams {
            source: source.to_path_buf(),
            output: self.output_path.clone(),
            width: self.width,
            height: self.height,
            crop_to_fill: self.crop_to_fill,
            flags: self.flags,
        }
    }
}
