//! Export mapping from on-screen selection to source resolution.
//!
//! The on-screen selection is measured in view pixels. Dividing by the view
//! transform's uniform scale recovers the size of the same region in the
//! source image, independent of the current zoom level.
//!
//! Only uniform, axis-aligned transforms are supported. Skew, rotation,
//! reflection and non-uniform scale are rejected with
//! [`ExportError::UnsupportedTransform`] instead of producing a mis-mapped
//! size.

use crate::geometry::{AffineTransform, Rect, GEOMETRY_EPSILON};
use crate::raster::RasterImage;
use crate::viewport::ViewportState;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned when an export cannot be produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExportError {
    /// No live selection exists.
    #[error("No selection to export")]
    NoSelection,

    /// No image is loaded or laid out.
    #[error("No image to export")]
    NoImage,

    /// The view transform has skew, rotation, or non-uniform scale.
    #[error("Unsupported view transform for export: {0:?}")]
    UnsupportedTransform([f64; 6]),

    /// The view transform scale is zero or not finite.
    #[error("Degenerate view scale: {0}")]
    DegenerateScale(f64),

    /// The selection maps to an empty pixel region.
    #[error("Selection maps to an empty region ({width}x{height})")]
    EmptyRegion { width: u32, height: u32 },

    /// The target exceeds the renderer's maximum output edge.
    #[error("Output {width}x{height} exceeds maximum edge of {max_edge}px")]
    TooLarge {
        width: u32,
        height: u32,
        max_edge: u32,
    },

    /// The renderer produced no pixels.
    #[error("Renderer returned an empty buffer")]
    EmptyRaster,

    /// The renderer produced a buffer that does not match the target size.
    #[error("Renderer returned {actual_width}x{actual_height}, expected {width}x{height}")]
    SizeMismatch {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },
}

/// Output dimensions in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSize {
    pub width: u32,
    pub height: u32,
}

impl OutputSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn longest_edge(&self) -> u32 {
        self.width.max(self.height)
    }
}

/// Resampling quality requested from the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QualityHint {
    /// Fast resampling, suitable for live preview.
    #[default]
    Fast,
    /// High-quality resampling, suitable for final export.
    High,
}

/// Raster primitive supplied by the host.
///
/// Implementations render `region` (container-relative, rendered pixels) of
/// the image as laid out in `viewport` into a buffer of exactly `target`
/// pixels. An empty buffer signals failure.
pub trait Renderer {
    fn render(
        &self,
        region: &Rect,
        viewport: &ViewportState,
        target: OutputSize,
        quality: QualityHint,
    ) -> RasterImage;
}

/// Map a selection to its size in source pixels.
///
/// Target dimensions are `round(width / s)` and `round(height / s)` where
/// `s = sqrt(a² + b²)` is the uniform scale of `transform`. The selection must
/// be expressed in the same units as the transform output.
pub fn map_to_original_resolution(
    selection: &Rect,
    transform: &AffineTransform,
) -> Result<OutputSize, ExportError> {
    let scale = transform.uniform_scale();
    if !(scale.is_finite() && scale > 0.0) {
        return Err(ExportError::DegenerateScale(scale));
    }
    if !transform.is_finite() || !transform.is_uniform_axis_aligned(GEOMETRY_EPSILON) {
        return Err(ExportError::UnsupportedTransform(transform.to_array()));
    }

    let width = (selection.width / scale).round();
    let height = (selection.height / scale).round();
    if !(width >= 1.0 && height >= 1.0) || !width.is_finite() || !height.is_finite() {
        return Err(ExportError::EmptyRegion {
            width: width.max(0.0) as u32,
            height: height.max(0.0) as u32,
        });
    }

    Ok(OutputSize::new(width as u32, height as u32))
}

/// Render `region` through `renderer`, rejecting empty or mis-sized buffers.
pub fn render_checked<R: Renderer + ?Sized>(
    renderer: &R,
    region: &Rect,
    viewport: &ViewportState,
    target: OutputSize,
    quality: QualityHint,
) -> Result<RasterImage, ExportError> {
    let image = renderer.render(region, viewport, target, quality);
    if image.is_empty() {
        return Err(ExportError::EmptyRaster);
    }
    if image.width != target.width || image.height != target.height {
        return Err(ExportError::SizeMismatch {
            width: target.width,
            height: target.height,
            actual_width: image.width,
            actual_height: image.height,
        });
    }
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_maps_one_to_one() {
        let size = map_to_original_resolution(
            &Rect::new(10.0, 10.0, 157.5, 280.0),
            &AffineTransform::IDENTITY,
        )
        .unwrap();
        assert_eq!(size, OutputSize::new(158, 280));
    }

    #[test]
    fn test_zoomed_in_selection_maps_smaller() {
        let t = AffineTransform::scale_translate(2.0, -300.0, -100.0);
        let size = map_to_original_resolution(&Rect::new(0.0, 0.0, 300.0, 200.0), &t).unwrap();
        assert_eq!(size, OutputSize::new(150, 100));
    }

    #[test]
    fn test_zoomed_out_selection_maps_larger() {
        let t = AffineTransform::scale_translate(0.25, 0.0, 0.0);
        let size = map_to_original_resolution(&Rect::new(0.0, 0.0, 90.0, 160.0), &t).unwrap();
        assert_eq!(size, OutputSize::new(360, 640));
    }

    #[test]
    fn test_rotation_is_rejected() {
        let angle: f64 = 0.3;
        let t = AffineTransform::new(angle.cos(), angle.sin(), -angle.sin(), angle.cos(), 0.0, 0.0);
        assert!(matches!(
            map_to_original_resolution(&Rect::new(0.0, 0.0, 100.0, 100.0), &t),
            Err(ExportError::UnsupportedTransform(_))
        ));
    }

    #[test]
    fn test_skew_and_non_uniform_are_rejected() {
        let selection = Rect::new(0.0, 0.0, 100.0, 100.0);
        let skew = AffineTransform::new(1.0, 0.0, 0.5, 1.0, 0.0, 0.0);
        let stretch = AffineTransform::new(2.0, 0.0, 0.0, 1.0, 0.0, 0.0);
        assert!(matches!(
            map_to_original_resolution(&selection, &skew),
            Err(ExportError::UnsupportedTransform(_))
        ));
        assert!(matches!(
            map_to_original_resolution(&selection, &stretch),
            Err(ExportError::UnsupportedTransform(_))
        ));
    }

    #[test]
    fn test_zero_scale_is_degenerate() {
        let t = AffineTransform::scale_translate(0.0, 0.0, 0.0);
        assert_eq!(
            map_to_original_resolution(&Rect::new(0.0, 0.0, 10.0, 10.0), &t),
            Err(ExportError::DegenerateScale(0.0))
        );
    }

    #[test]
    fn test_sub_pixel_selection_is_empty() {
        let t = AffineTransform::scale_translate(10.0, 0.0, 0.0);
        assert!(matches!(
            map_to_original_resolution(&Rect::new(0.0, 0.0, 2.0, 2.0), &t),
            Err(ExportError::EmptyRegion { .. })
        ));
    }

    #[test]
    fn test_export_error_display() {
        let err = ExportError::TooLarge {
            width: 9000,
            height: 100,
            max_edge: 8192,
        };
        assert_eq!(err.to_string(), "Output 9000x100 exceeds maximum edge of 8192px");
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
