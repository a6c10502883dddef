//! WASM-compatible wrapper types and conversions.
//!
//! This module provides JavaScript-friendly types that wrap the core Cropframe
//! types, handling the conversion between Rust and JavaScript data
//! representations.

use cropframe_core::{AffineTransform, Layout, LayoutBox, RasterImage, Size, ViewportState};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use wasm_bindgen::prelude::*;

/// A raster image wrapper for JavaScript.
///
/// # Memory Management
///
/// The pixel data is stored in WASM memory. When you call `pixels()`, a copy is made
/// to JavaScript memory as a `Uint8Array`.
#[wasm_bindgen]
pub struct JsRasterImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsRasterImage {
    /// Create a new JsRasterImage from dimensions and pixel data.
    ///
    /// # Arguments
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    /// * `pixels` - RGB pixel data (3 bytes per pixel, row-major order)
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> JsRasterImage {
        JsRasterImage {
            width,
            height,
            pixels,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of bytes in the pixel buffer (width * height * 3)
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGB pixel data as Uint8Array. This copies the buffer.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    /// Explicitly free WASM memory.
    pub fn free(self) {}
}

impl JsRasterImage {
    pub(crate) fn from_raster(img: RasterImage) -> Self {
        Self {
            width: img.width,
            height: img.height,
            pixels: img.pixels,
        }
    }

    /// Convert to a core RasterImage, validating the buffer length.
    pub(crate) fn to_raster(&self) -> Result<RasterImage, JsValue> {
        RasterImage::new(self.width, self.height, self.pixels.clone())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

/// Layout as reported by the host for one query.
///
/// Field names follow `DOMRect`, so `getBoundingClientRect()` results can be
/// passed straight through.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LayoutSnapshot {
    pub image_box: Option<LayoutBox>,
    pub container_box: Option<LayoutBox>,
    pub container_layout_size: Option<Size>,
    /// `[a, b, c, d, tx, ty]`; identity when absent.
    pub transform: Option<[f64; 6]>,
}

/// A fixed [`Layout`] built from one snapshot.
#[derive(Debug, Clone)]
pub(crate) struct SnapshotLayout {
    snapshot: LayoutSnapshot,
    transform: AffineTransform,
}

impl SnapshotLayout {
    pub fn new(snapshot: LayoutSnapshot) -> Self {
        let transform = snapshot
            .transform
            .map(AffineTransform::from_array)
            .unwrap_or(AffineTransform::IDENTITY);
        Self {
            snapshot,
            transform,
        }
    }

    pub fn viewport(&self) -> Option<ViewportState> {
        ViewportState::sample(self)
    }
}

impl Layout for SnapshotLayout {
    fn image_box(&self) -> Option<LayoutBox> {
        self.snapshot.image_box
    }

    fn container_box(&self) -> Option<LayoutBox> {
        self.snapshot.container_box
    }

    fn container_layout_size(&self) -> Option<Size> {
        self.snapshot.container_layout_size
    }

    fn transform(&self) -> AffineTransform {
        self.transform
    }

    fn set_transform(&mut self, transform: AffineTransform) {
        self.transform = transform;
    }
}

/// Deserialize a layout snapshot and sample it.
pub(crate) fn viewport_from_js(value: JsValue) -> Result<ViewportState, JsValue> {
    let snapshot: LayoutSnapshot = serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Invalid layout snapshot: {}", e)))?;
    SnapshotLayout::new(snapshot)
        .viewport()
        .ok_or_else(|| JsValue::from_str("Image is not laid out"))
}

/// Parse `[a, b, c, d, tx, ty]`.
pub(crate) fn parse_transform(values: &[f64]) -> Option<AffineTransform> {
    let array: [f64; 6] = values.try_into().ok()?;
    Some(AffineTransform::from_array(array))
}

pub(crate) fn transform_from_js(values: &[f64]) -> Result<AffineTransform, JsValue> {
    parse_transform(values).ok_or_else(|| {
        JsValue::from_str(&format!(
            "Transform must have 6 components, got {}",
            values.len()
        ))
    })
}

/// Convert a `performance.now()` style timestamp to a [`Duration`].
pub(crate) fn timestamp(now_ms: f64) -> Duration {
    if now_ms.is_finite() && now_ms > 0.0 {
        Duration::from_secs_f64(now_ms / 1000.0)
    } else {
        Duration::ZERO
    }
}

/// Serialize a value for JavaScript.
pub(crate) fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Deserialize an optional JavaScript value, falling back to `T::default()`.
pub(crate) fn from_js_or_default<T>(value: JsValue) -> Result<T, JsValue>
where
    T: Default + for<'de> Deserialize<'de>,
{
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_raster_image_creation() {
        let img = JsRasterImage::new(100, 50, vec![0u8; 100 * 50 * 3]);
        assert_eq!(img.width(), 100);
        assert_eq!(img.height(), 50);
        assert_eq!(img.byte_length(), 15000);
    }

    #[test]
    fn test_from_raster() {
        let raster = RasterImage::new(2, 1, vec![255, 128, 64, 32, 16, 8]).unwrap();
        let js_img = JsRasterImage::from_raster(raster);
        assert_eq!(js_img.pixels(), vec![255, 128, 64, 32, 16, 8]);
        assert_eq!(js_img.to_raster().unwrap().width, 2);
    }

    #[test]
    fn test_parse_transform() {
        let t = parse_transform(&[2.0, 0.0, 0.0, 2.0, 10.0, 20.0]).unwrap();
        assert_eq!(t, AffineTransform::scale_translate(2.0, 10.0, 20.0));
        assert!(parse_transform(&[1.0, 0.0, 0.0]).is_none());
    }

    #[test]
    fn test_timestamp() {
        assert_eq!(timestamp(1500.0), Duration::from_millis(1500));
        assert_eq!(timestamp(-5.0), Duration::ZERO);
        assert_eq!(timestamp(f64::NAN), Duration::ZERO);
    }

    #[test]
    fn test_snapshot_layout_samples_viewport() {
        let layout = SnapshotLayout::new(LayoutSnapshot {
            image_box: Some(LayoutBox::new(110.0, 60.0, 400.0, 400.0)),
            container_box: Some(LayoutBox::new(10.0, 10.0, 600.0, 600.0)),
            container_layout_size: None,
            transform: Some([1.0, 0.0, 0.0, 1.0, 100.0, 50.0]),
        });
        let viewport = layout.viewport().unwrap();
        assert_eq!(viewport.image_rect().x, 100.0);
        assert_eq!(viewport.render_scale, 1.0);
        assert_eq!(viewport.transform.tx, 100.0);
    }

    #[test]
    fn test_snapshot_without_image_has_no_viewport() {
        let layout = SnapshotLayout::new(LayoutSnapshot {
            container_box: Some(LayoutBox::new(0.0, 0.0, 600.0, 600.0)),
            ..Default::default()
        });
        assert!(layout.viewport().is_none());
    }
}
