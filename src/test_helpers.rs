//! Shared test utilities.
//!
//! Synthetic source images for backend tests, so nothing depends on binary
//! fixtures checked into the repo.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let source = write_test_jpeg(tmp.path(), "photo.jpg", 300, 200);
//! assert_eq!(image::image_dimensions(&source).unwrap(), (300, 200));
//! ```

use image::{ImageEncoder, RgbImage};
use std::path::{Path, PathBuf};

/// Write a small gradient JPEG of the given size into `dir` and return its path.
pub fn write_test_jpeg(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(&path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    path
}

/// Names of all files directly inside `dir`, sorted.
pub fn file_names_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
