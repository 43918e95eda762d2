//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate output dimensions for a uniform downscale.
///
/// The scale factor is `dim_max / max(width, height)` and both axes are
/// scaled by it, each rounded to the nearest pixel independently. The
/// sub-pixel aspect-ratio drift from independent rounding is accepted.
/// Images smaller than `dim_max` scale *up* — the factor is applied
/// unconditionally.
///
/// # Examples
/// ```
/// # use crop_annotator::imaging::scaled_dimensions;
/// // 4000x3000 at dim_max 1000 → factor 0.25 on both axes
/// assert_eq!(scaled_dimensions((4000, 3000), 1000), (1000, 750));
/// ```
pub fn scaled_dimensions(original: (u32, u32), dim_max: u32) -> (u32, u32) {
    let (width, height) = original;
    let factor = f64::from(dim_max) / f64::from(width.max(height));

    // Never collapse an axis to zero pixels.
    let scale = |edge: u32| ((f64::from(edge) * factor).round() as u32).max(1);
    (scale(width), scale(height))
}
