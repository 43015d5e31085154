//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate output dimensions that fit inside a `max_dimension` square.
///
/// The longer edge is scaled down to exactly `max_dimension` and the shorter
/// edge follows the source aspect ratio (rounded, never below 1px). Sources
/// that already fit are returned unchanged — images are never upscaled.
///
/// # Arguments
/// * `original` - Source image dimensions (width, height)
/// * `max_dimension` - Bound on either output dimension
///
/// # Returns
/// * `(width, height)` - Output dimensions
///
/// # Examples
/// ```
/// # use product_catalog::imaging::calculate_bounded_dimensions;
/// // 2000x1000 landscape → 800x400
/// assert_eq!(calculate_bounded_dimensions((2000, 1000), 800), (800, 400));
///
/// // 400x300 already fits → unchanged
/// assert_eq!(calculate_bounded_dimensions((400, 300), 800), (400, 300));
/// ```
pub fn calculate_bounded_dimensions(original: (u32, u32), max_dimension: u32) -> (u32, u32) {
    let (orig_w, orig_h) = original;

    if orig_w <= max_dimension && orig_h <= max_dimension {
        return original;
    }

    if orig_w >= orig_h {
        // Landscape or square: width is the longer edge
        let ratio = max_dimension as f64 / orig_w as f64;
        let h = ((orig_h as f64 * ratio).round() as u32).max(1);
        (max_dimension, h)
    } else {
        // Portrait
        let ratio = max_dimension as f64 / orig_h as f64;
        let w = ((orig_w as f64 * ratio).round() as u32).max(1);
        (w, max_dimension)
    }
}

/// Whether producing `target` from `original` needs a resample at all.
pub fn needs_resize(original: (u32, u32), target: (u32, u32)) -> bool {
    original != target
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // calculate_bounded_dimensions tests
    // =========================================================================

    #[test]
    fn bounded_landscape_scales_to_width() {
        // 2:1 landscape, longer edge 2000 → 800x400
        assert_eq!(calculate_bounded_dimensions((2000, 1000), 800), (800, 400));
    }

    #[test]
    fn bounded_portrait_scales_to_height() {
        assert_eq!(calculate_bounded_dimensions((1000, 2000), 800), (400, 800));
    }

    #[test]
    fn bounded_square_oversize() {
        assert_eq!(calculate_bounded_dimensions((1200, 1200), 800), (800, 800));
    }

    #[test]
    fn bounded_small_image_is_not_upscaled() {
        assert_eq!(calculate_bounded_dimensions((400, 300), 800), (400, 300));
    }

    #[test]
    fn bounded_exactly_at_limit_is_unchanged() {
        assert_eq!(calculate_bounded_dimensions((800, 800), 800), (800, 800));
        assert_eq!(calculate_bounded_dimensions((800, 10), 800), (800, 10));
    }

    #[test]
    fn bounded_only_height_exceeds() {
        // 600x1000 → height 800, width 600 * 0.8 = 480
        assert_eq!(calculate_bounded_dimensions((600, 1000), 800), (480, 800));
    }

    #[test]
    fn bounded_rounds_short_edge() {
        // 1000x333 → 800 x 266.4 → 266
        assert_eq!(calculate_bounded_dimensions((1000, 333), 800), (800, 266));
        // 3000x2000 → 800 x 533.33 → 533
        assert_eq!(calculate_bounded_dimensions((3000, 2000), 800), (800, 533));
    }

    #[test]
    fn bounded_extreme_strip_keeps_one_pixel() {
        assert_eq!(calculate_bounded_dimensions((5000, 1), 800), (800, 1));
        assert_eq!(calculate_bounded_dimensions((1, 5000), 800), (1, 800));
    }

    #[test]
    fn bounded_is_idempotent() {
        for dims in [(2000, 1000), (1000, 2000), (801, 799), (400, 300)] {
            let once = calculate_bounded_dimensions(dims, 800);
            assert_eq!(calculate_bounded_dimensions(once, 800), once);
        }
    }

    #[test]
    fn bounded_preserves_aspect_within_one_unit() {
        for (w, h) in [(4032u32, 3024u32), (1920, 1080), (1234, 5678), (999, 801)] {
            let (out_w, out_h) = calculate_bounded_dimensions((w, h), 800);
            assert_eq!(out_w.max(out_h), 800);
            let expected_h = out_w as f64 * h as f64 / w as f64;
            let drift = (out_h as f64 - expected_h).abs();
            assert!(drift <= 1.0, "{w}x{h} → {out_w}x{out_h}");
        }
    }

    #[test]
    fn needs_resize_only_when_dimensions_change() {
        assert!(!needs_resize((400, 300), (400, 300)));
        assert!(needs_resize((2000, 1000), (800, 400)));
    }
}
