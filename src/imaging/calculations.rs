//! Pure calculation functions for rendition dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::AspectRatio;

/// Height that preserves the source aspect ratio at `width`.
///
/// Rounds half away from zero: 3000x2000 at 2560 wide is 1706.67 → 1707.
/// Never returns 0 for a non-zero width.
///
/// # Examples
/// ```
/// # use webp_renditions::imaging::proportional_height;
/// assert_eq!(proportional_height((2560, 1440), 1920), 1080);
/// assert_eq!(proportional_height((3000, 2000), 1280), 853);
/// ```
pub fn proportional_height(source: (u32, u32), width: u32) -> u32 {
    let (src_w, src_h) = source;
    if src_w == 0 {
        return 0;
    }
    let h = (width as f64 * src_h as f64 / src_w as f64).round() as u32;
    h.max(1)
}

/// Height for a fixed aspect ratio at `width`, truncated toward zero.
///
/// # Examples
/// ```
/// # use webp_renditions::imaging::{AspectRatio, ratio_height};
/// assert_eq!(ratio_height(AspectRatio::Widescreen, 1920), 1080);
/// assert_eq!(ratio_height(AspectRatio::Standard, 1600), 1200);
/// ```
pub fn ratio_height(ratio: AspectRatio, width: u32) -> u32 {
    let (ratio_w, ratio_h) = ratio.parts();
    let h = (width as u64 * ratio_h as u64 / ratio_w as u64) as u32;
    h.max(1)
}

/// Calculate dimensions needed to fill a target area (resize before crop).
///
/// Returns dimensions that completely cover the target area while maintaining
/// the source aspect ratio. One dimension will match exactly, the other may exceed.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `target` - Target area dimensions (width, height)
///
/// # Returns
/// * `(width, height)` - Fill dimensions (at least one matches target)
pub fn calculate_fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: height will match, width will exceed
        let h = tgt_h;
        let w = (h as f64 * src_aspect).round() as u32;
        (w.max(tgt_w), h)
    } else {
        // Source is taller: width will match, height will exceed
        let w = tgt_w;
        let h = (w as f64 / src_aspect).round() as u32;
        (w, h.max(tgt_h))
    }
}

/// Top-left offset of a centered `crop` box inside `filled`.
pub fn center_crop_offset(filled: (u32, u32), crop: (u32, u32)) -> (u32, u32) {
    (
        filled.0.saturating_sub(crop.0) / 2,
        filled.1.saturating_sub(crop.1) / 2,
    )
}
