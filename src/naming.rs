//! Output filename convention for renditions.
//!
//! Consuming markup generators build `srcset` entries from these names, so
//! they must be bit-exact:
//!
//! - the largest rendition is `{basename}.webp`
//! - every other rendition is `{basename}-{width}x{height}.webp`
//!
//! Widths and heights are plain integers, no padding, no units.

use std::path::{Path, PathBuf};

pub const EXTENSION: &str = "webp";

/// File name for one rendition.
///
/// - `("photo", 2560, 1707, true)` → `photo.webp`
/// - `("photo", 1280, 853, false)` → `photo-1280x853.webp`
pub fn rendition_filename(basename: &str, width: u32, height: u32, primary: bool) -> String {
    if primary {
        format!("{basename}.{EXTENSION}")
    } else {
        format!("{basename}-{width}x{height}.{EXTENSION}")
    }
}

/// Full output path for one rendition inside `dir`.
pub fn rendition_path(
    dir: &Path,
    basename: &str,
    width: u32,
    height: u32,
    primary: bool,
) -> PathBuf {
    dir.join(rendition_filename(basename, width, height, primary))
}

/// Default basename: the input file name without its last extension.
///
/// - `"photos/hero.jpg"` → `"hero"`
/// - `"hero.final.png"` → `"hero.final"`
/// - `"README"` → `"README"`
///
/// Returns `None` when the path has no file name (e.g. `"/"` or `".."`).
pub fn default_basename(input: &Path) -> Option<String> {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
}
