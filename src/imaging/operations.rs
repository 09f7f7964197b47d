//! High-level image operations.
//!
//! These functions combine the backend with the policy around it: what to do
//! when the dimension probe fails, and how a planned job turns into an encode.

use super::backend::{BackendError, ImageBackend};
use crate::types::{Probe, RenditionJob, SourceImage};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Dimensions assumed when the source cannot be probed.
pub const FALLBACK_DIMENSIONS: (u32, u32) = (2560, 1440);

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// Probe the source, substituting `fallback` if the backend cannot read it.
///
/// A fallback is not an error, but every size derived from it may be wrong,
/// so the reason is carried along for the caller to warn about.
pub fn probe_or_fallback(
    backend: &impl ImageBackend,
    path: &Path,
    fallback: (u32, u32),
) -> Probe {
    match get_dimensions(backend, path) {
        Ok((width, height)) => Probe {
            image: SourceImage::new(path, width, height),
            fallback_reason: None,
        },
        Err(e) => Probe {
            image: SourceImage::new(path, fallback.0, fallback.1),
            fallback_reason: Some(e.to_string()),
        },
    }
}

/// Encode a single planned rendition. Returns the bytes written.
pub fn encode_job(backend: &impl ImageBackend, source: &Path, job: &RenditionJob) -> Result<u64> {
    backend.encode(&job.encode_params(source))
}
