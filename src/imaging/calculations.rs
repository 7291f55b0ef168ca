//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the dimensions of an image scaled down to fit a square bounding box.
///
/// Returns `None` when both sides already fit within `max_dim` (nothing to do).
/// Otherwise the image is scaled by `min(max_dim / width, max_dim / height)`,
/// which puts the longer side at exactly `max_dim`; the shorter side is
/// rounded down, but never below one pixel.
///
/// Integer arithmetic keeps the result exact: a float ratio like
/// `512.0 / 1000.0` can land a hair under the true value and floor to 511.
///
/// # Examples
/// ```
/// # use painterly::imaging::fit_within;
/// assert_eq!(fit_within((1024, 768), 512), Some((512, 384)));
/// assert_eq!(fit_within((300, 200), 512), None);
/// ```
pub fn fit_within(source: (u32, u32), max_dim: u32) -> Option<(u32, u32)> {
    let (w, h) = source;
    if w <= max_dim && h <= max_dim {
        return None;
    }

    let scale_short = |short: u32, long: u32| -> u32 {
        let scaled = short as u64 * max_dim as u64 / long as u64;
        (scaled as u32).max(1)
    };

    if w >= h {
        // Landscape or square: width is the limiting side
        Some((max_dim, scale_short(h, w)))
    } else {
        Some((scale_short(w, h), max_dim))
    }
}
