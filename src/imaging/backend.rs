//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the capability interface between rendition
//! planning and pixel work. It has two operations: `identify` (read source
//! dimensions) and `encode` (resize or fill-crop one rendition and write it
//! as WebP).
//!
//! | Backend | identify | encode |
//! |---|---|---|
//! | [`ToolBackend`](super::tool_backend::ToolBackend) | ImageMagick `identify` | ImageMagick resize → `cwebp` |
//! | [`RustBackend`](super::rust_backend::RustBackend) | `image::image_dimensions` | `image` Lanczos3 → lossless WebP |

use super::params::EncodeParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Implementations must be `Sync`: the driver may call `encode` from several
/// rayon workers at once. Each call owns its output path and any temporary
/// files it creates.
pub trait ImageBackend: Sync {
    /// Get image dimensions.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Produce one rendition. Returns the number of bytes written.
    fn encode(&self, params: &EncodeParams) -> Result<u64, BackendError>;
}
