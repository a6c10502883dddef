//! In-memory raster buffers and a reference [`Renderer`].
//!
//! [`RasterRenderer`] renders a selection from a decoded RGB source image:
//! the on-screen region is mapped back through the view transform to a
//! normalized source region, cropped, and resampled to the requested size
//! with the `image` crate.
//!
//! # Normalized Coordinates
//!
//! - (0.0, 0.0) = top-left corner of the source
//! - (1.0, 1.0) = bottom-right corner of the source

use crate::export::{OutputSize, QualityHint, Renderer};
use crate::geometry::Rect;
use crate::viewport::ViewportState;
use thiserror::Error;

/// Errors from raster operations.
#[derive(Debug, Error)]
pub enum RasterError {
    /// Pixel buffer length does not match the dimensions.
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 3), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Requested output has a zero dimension.
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The view transform cannot be inverted.
    #[error("View transform is not invertible")]
    SingularTransform,
}

/// An RGB image buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// RGB pixel data in row-major order (3 bytes per pixel).
    pub pixels: Vec<u8>,
}

impl RasterImage {
    /// Create an image, checking that the buffer matches the dimensions.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, RasterError> {
        let expected = width as usize * height as usize * 3;
        if pixels.len() != expected {
            return Err(RasterError::InvalidPixelData {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// The failure value returned by renderers.
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            pixels: Vec::new(),
        }
    }

    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
        }
    }

    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}

/// Crop `image` to a normalized region.
///
/// Coordinates are clamped to the source. The output is at least 1x1.
pub fn crop_normalized(image: &RasterImage, region: &Rect) -> RasterImage {
    if region.x <= 0.0 && region.y <= 0.0 && region.right() >= 1.0 && region.bottom() >= 1.0 {
        return image.clone();
    }

    let src_w = image.width as f64;
    let src_h = image.height as f64;

    let left = (region.x.clamp(0.0, 1.0) * src_w).round() as u32;
    let top = (region.y.clamp(0.0, 1.0) * src_h).round() as u32;
    let right = (region.right().clamp(0.0, 1.0) * src_w).round() as u32;
    let bottom = (region.bottom().clamp(0.0, 1.0) * src_h).round() as u32;

    let left = left.min(image.width.saturating_sub(1));
    let top = top.min(image.height.saturating_sub(1));
    let out_width = right.min(image.width).saturating_sub(left).max(1);
    let out_height = bottom.min(image.height).saturating_sub(top).max(1);

    let row_bytes = out_width as usize * 3;
    let mut output = Vec::with_capacity(row_bytes * out_height as usize);
    for y in top..top + out_height {
        let start = (y as usize * image.width as usize + left as usize) * 3;
        output.extend_from_slice(&image.pixels[start..start + row_bytes]);
    }

    RasterImage {
        width: out_width,
        height: out_height,
        pixels: output,
    }
}

/// Resample `image` to exact dimensions.
pub fn resample(
    image: &RasterImage,
    target: OutputSize,
    quality: QualityHint,
) -> Result<RasterImage, RasterError> {
    if target.width == 0 || target.height == 0 {
        return Err(RasterError::InvalidDimensions {
            width: target.width,
            height: target.height,
        });
    }
    if image.width == target.width && image.height == target.height {
        return Ok(image.clone());
    }

    let rgb = image.to_rgb_image().ok_or(RasterError::InvalidPixelData {
        expected: image.width as usize * image.height as usize * 3,
        actual: image.pixels.len(),
    })?;

    let filter = match quality {
        QualityHint::Fast => image::imageops::FilterType::Triangle,
        QualityHint::High => image::imageops::FilterType::Lanczos3,
    };
    let resized = image::imageops::resize(&rgb, target.width, target.height, filter);
    Ok(RasterImage::from_rgb_image(resized))
}

/// Map an on-screen region to normalized source coordinates.
pub fn normalized_source_region(
    region: &Rect,
    viewport: &ViewportState,
) -> Result<Rect, RasterError> {
    let inverse = viewport
        .transform
        .inverse()
        .ok_or(RasterError::SingularTransform)?;
    let base = viewport.base_rect().ok_or(RasterError::SingularTransform)?;
    if base.size().is_degenerate() {
        return Err(RasterError::SingularTransform);
    }

    let local = inverse.map_rect(&region.scaled(1.0 / viewport.render_scale));
    Ok(Rect::new(
        (local.x - base.x) / base.width,
        (local.y - base.y) / base.height,
        local.width / base.width,
        local.height / base.height,
    ))
}

/// Reference renderer backed by a decoded source image.
#[derive(Debug, Clone)]
pub struct RasterRenderer {
    source: RasterImage,
}

impl RasterRenderer {
    pub fn new(source: RasterImage) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &RasterImage {
        &self.source
    }

    fn try_render(
        &self,
        region: &Rect,
        viewport: &ViewportState,
        target: OutputSize,
        quality: QualityHint,
    ) -> Result<RasterImage, RasterError> {
        let normalized = normalized_source_region(region, viewport)?;
        let cropped = crop_normalized(&self.source, &normalized);
        resample(&cropped, target, quality)
    }
}

impl Renderer for RasterRenderer {
    fn render(
        &self,
        region: &Rect,
        viewport: &ViewportState,
        target: OutputSize,
        quality: QualityHint,
    ) -> RasterImage {
        if self.source.is_empty() {
            return RasterImage::empty();
        }
        match self.try_render(region, viewport, target, quality) {
            Ok(image) => image,
            Err(e) => {
                log::warn!("Raster render failed: {}", e);
                RasterImage::empty()
            }
        }
    }
}
