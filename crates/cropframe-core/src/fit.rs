//! Initial selection placement.
//!
//! Computes the largest aspect-locked rectangle covering `coverage` of the
//! limiting image dimension, centered on the image.

use crate::config::CoverageConfig;
use crate::geometry::{LayoutBox, Rect, Size};

/// Compute the initial selection for a displayed image.
///
/// The width-constrained candidate (`w = image_width * coverage`) is tried
/// first. If its height does not fit, the height-constrained candidate
/// (`h = image_height * coverage`) is used instead.
///
/// # Arguments
///
/// * `image_box` - Displayed image box (page space)
/// * `container_box` - Container box (page space)
/// * `aspect_ratio` - Selection width / height
/// * `coverage` - Fraction of the limiting dimension, in (0, 1]
///
/// # Returns
///
/// The selection in container-relative coordinates, or `None` when the image
/// is degenerate or the inputs produce an empty rectangle.
pub fn compute_fit_selection(
    image_box: &LayoutBox,
    container_box: &LayoutBox,
    aspect_ratio: f64,
    coverage: f64,
) -> Option<Rect> {
    let image_width = image_box.width;
    let image_height = image_box.height;
    if !(image_width > 0.0 && image_height > 0.0) {
        return None;
    }
    if !(aspect_ratio.is_finite() && aspect_ratio > 0.0) || !coverage.is_finite() {
        return None;
    }

    let mut width = image_width * coverage;
    let mut height = width / aspect_ratio;
    if height > image_height {
        height = image_height * coverage;
        width = height * aspect_ratio;
    }

    if !(width > 0.0 && height > 0.0) {
        return None;
    }

    let image = image_box.relative_to(container_box);
    Some(Rect::centered_on(image.center(), Size::new(width, height)))
}

/// [`compute_fit_selection`] driven by a validated [`CoverageConfig`].
///
/// Invalid configuration is logged and yields `None`.
pub fn fit_with_config(
    image_box: &LayoutBox,
    container_box: &LayoutBox,
    config: &CoverageConfig,
) -> Option<Rect> {
    if let Err(e) = config.validate() {
        log::warn!("Skipping selection fit: {}", e);
        return None;
    }
    compute_fit_selection(image_box, container_box, config.aspect_ratio, config.coverage)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin_container() -> LayoutBox {
        LayoutBox::new(0.0, 0.0, 600.0, 600.0)
    }

    #[test]
    fn test_portrait_reference_case() {
        let image = LayoutBox::new(100.0, 50.0, 400.0, 400.0);
        let rect = compute_fit_selection(&image, &origin_container(), 9.0 / 16.0, 0.7).unwrap();

        assert!((rect.x - 221.25).abs() < 0.1);
        assert!((rect.y - 110.0).abs() < 0.1);
        assert!((rect.width - 157.5).abs() < 0.1);
        assert!((rect.height - 280.0).abs() < 0.1);
    }

    #[test]
    fn test_full_coverage_portrait_on_square() {
        let image = LayoutBox::new(0.0, 0.0, 500.0, 500.0);
        let rect = compute_fit_selection(&image, &origin_container(), 0.75, 1.0).unwrap();

        assert_eq!(rect.height, 500.0);
        assert_eq!(rect.width, 500.0 * 0.75);
    }

    #[test]
    fn test_landscape_uses_width_constraint() {
        let image = LayoutBox::new(0.0, 0.0, 400.0, 400.0);
        let rect = compute_fit_selection(&image, &origin_container(), 2.0, 0.5).unwrap();

        assert_eq!(rect.width, 200.0);
        assert_eq!(rect.height, 100.0);
        assert_eq!(rect.x, 100.0);
        assert_eq!(rect.y, 150.0);
    }

    #[test]
    fn test_container_offset_is_subtracted() {
        let image = LayoutBox::new(120.0, 80.0, 200.0, 100.0);
        let container = LayoutBox::new(20.0, 30.0, 400.0, 400.0);
        let rect = compute_fit_selection(&image, &container, 1.0, 1.0).unwrap();

        // 100x100 square centered on image center (200, 100) relative
        assert_eq!(rect, Rect::new(150.0, 50.0, 100.0, 100.0));
    }

    #[test]
    fn test_degenerate_image_yields_none() {
        let container = origin_container();
        for (w, h) in [(0.0, 100.0), (100.0, 0.0), (-5.0, 100.0), (100.0, -5.0)] {
            let image = LayoutBox::new(0.0, 0.0, w, h);
            assert!(compute_fit_selection(&image, &container, 1.0, 0.5).is_none());
        }
    }

    #[test]
    fn test_invalid_ratio_or_coverage_yields_none() {
        let image = LayoutBox::new(0.0, 0.0, 100.0, 100.0);
        let container = origin_container();
        assert!(compute_fit_selection(&image, &container, 0.0, 0.5).is_none());
        assert!(compute_fit_selection(&image, &container, f64::NAN, 0.5).is_none());
        assert!(compute_fit_selection(&image, &container, 1.0, 0.0).is_none());
        assert!(compute_fit_selection(&image, &container, 1.0, f64::INFINITY).is_none());
    }

    #[test]
    fn test_fit_with_invalid_config_skips() {
        let image = LayoutBox::new(0.0, 0.0, 100.0, 100.0);
        let config = CoverageConfig::new(1.0, 1.5);
        assert!(fit_with_config(&image, &origin_container(), &config).is_none());
    }

    #[test]
    fn test_fit_with_valid_config() {
        let image = LayoutBox::new(0.0, 0.0, 100.0, 100.0);
        let config = CoverageConfig::new(1.0, 0.5);
        let rect = fit_with_config(&image, &origin_container(), &config).unwrap();
        assert_eq!(rect, Rect::new(25.0, 25.0, 50.0, 50.0));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
