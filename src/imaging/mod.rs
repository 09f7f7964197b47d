//! Image processing: dimension probing, resampling and WebP encoding.
//!
//! | Operation | External tools backend | Pure Rust backend |
//! |---|---|---|
//! | **Identify** | ImageMagick `identify` | `image::image_dimensions` |
//! | **Resize / fill-crop** | ImageMagick `-resize` / `-extent` | Lanczos3 `resize_exact` / `resize_to_fill` |
//! | **Encode** | `cwebp` with preset tuning | `image` lossless WebP |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations and presets
//! - **Backend**: [`ImageBackend`] trait + [`ToolBackend`] + [`RustBackend`]
//! - **Operations**: Probe-with-fallback and job encoding on top of a backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;
pub mod tool_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{
    calculate_fill_dimensions, center_crop_offset, proportional_height, ratio_height,
};
pub use operations::{FALLBACK_DIMENSIONS, encode_job, get_dimensions, probe_or_fallback};
pub use params::{
    AspectRatio, EncodeParams, EncoderFlags, Method, ParseParamError, Preset, Quality, Sharpening,
    Tuning,
};
pub use rust_backend::RustBackend;
pub use tool_backend::{MissingDependency, ToolBackend};
