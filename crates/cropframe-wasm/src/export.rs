//! WASM bindings for source-resolution export.

use crate::types::{to_js, transform_from_js, viewport_from_js, JsRasterImage};
use cropframe_core::export::render_checked;
use cropframe_core::{
    decode_image as core_decode, encode_jpeg as core_encode_jpeg,
    encode_png as core_encode_png, map_to_original_resolution as core_map, QualityHint,
    RasterRenderer, Rect,
};
use wasm_bindgen::prelude::*;

pub(crate) fn quality_from_bool(high_quality: bool) -> QualityHint {
    if high_quality {
        QualityHint::High
    } else {
        QualityHint::Fast
    }
}

/// Size of `selection` in source pixels under `transform`.
///
/// `selection` must be in the transform's output units. Returns
/// `{ width, height }`. Skewed, rotated or non-uniformly scaled transforms
/// are rejected.
#[wasm_bindgen]
pub fn map_to_original_resolution(selection: JsValue, transform: &[f64]) -> Result<JsValue, JsValue> {
    let selection: Rect = serde_wasm_bindgen::from_value(selection)
        .map_err(|e| JsValue::from_str(&format!("Invalid rectangle: {}", e)))?;
    let transform = transform_from_js(transform)?;
    let size = core_map(&selection, &transform).map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&size)
}

/// Render the on-screen `selection` of `source` at source resolution.
///
/// # Arguments
///
/// * `source` - Decoded source image
/// * `layout` - Layout snapshot the selection was measured against
/// * `selection` - Container-relative selection in rendered pixels
/// * `high_quality` - Use Lanczos3 resampling instead of bilinear
#[wasm_bindgen]
pub fn export_selection(
    source: &JsRasterImage,
    layout: JsValue,
    selection: JsValue,
    high_quality: bool,
) -> Result<JsRasterImage, JsValue> {
    let viewport = viewport_from_js(layout)?;
    let selection: Rect = serde_wasm_bindgen::from_value(selection)
        .map_err(|e| JsValue::from_str(&format!("Invalid rectangle: {}", e)))?;

    let in_layout_units = selection.scaled(1.0 / viewport.render_scale);
    let target = core_map(&in_layout_units, &viewport.transform)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let renderer = RasterRenderer::new(source.to_raster()?);
    let image = render_checked(
        &renderer,
        &selection,
        &viewport,
        target,
        quality_from_bool(high_quality),
    )
    .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(JsRasterImage::from_raster(image))
}

/// Decode JPEG or PNG bytes into an RGB image for export.
///
/// # Example (TypeScript)
///
/// ```typescript
/// const source = decode_image(new Uint8Array(await file.arrayBuffer()));
/// const crop = session.export(source, true);
/// const jpeg = encode_jpeg(crop, 90);
/// ```
#[wasm_bindgen]
pub fn decode_image(bytes: &[u8]) -> Result<JsRasterImage, JsValue> {
    core_decode(bytes)
        .map(JsRasterImage::from_raster)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Encode an exported image as JPEG. `quality` is clamped to 1-100.
#[wasm_bindgen]
pub fn encode_jpeg(image: &JsRasterImage, quality: u8) -> Result<Vec<u8>, JsValue> {
    core_encode_jpeg(&image.to_raster()?, quality).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Encode an exported image as PNG.
#[wasm_bindgen]
pub fn encode_png(image: &JsRasterImage) -> Result<Vec<u8>, JsValue> {
    core_encode_png(&image.to_raster()?).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_from_bool() {
        assert_eq!(quality_from_bool(true), QualityHint::High);
        assert_eq!(quality_from_bool(false), QualityHint::Fast);
    }
}

/// WASM-specific tests that require JsValue.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use crate::types::LayoutSnapshot;
    use cropframe_core::{LayoutBox, OutputSize};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_map_zoomed_selection() {
        let selection = serde_wasm_bindgen::to_value(&Rect::new(0.0, 0.0, 300.0, 200.0)).unwrap();
        let value = map_to_original_resolution(selection, &[2.0, 0.0, 0.0, 2.0, -300.0, -100.0]).unwrap();
        let size: OutputSize = serde_wasm_bindgen::from_value(value).unwrap();
        assert_eq!(size, OutputSize::new(150, 100));
    }

    #[wasm_bindgen_test]
    fn test_map_rejects_rotation() {
        let selection = serde_wasm_bindgen::to_value(&Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        let angle: f64 = 0.3;
        let rotated = [angle.cos(), angle.sin(), -angle.sin(), angle.cos(), 0.0, 0.0];
        assert!(map_to_original_resolution(selection, &rotated).is_err());
    }

    #[wasm_bindgen_test]
    fn test_export_selection_size() {
        let source = JsRasterImage::new(400, 400, vec![70u8; 400 * 400 * 3]);
        let layout = serde_wasm_bindgen::to_value(&LayoutSnapshot {
            image_box: Some(LayoutBox::new(100.0, 50.0, 400.0, 400.0)),
            container_box: Some(LayoutBox::new(0.0, 0.0, 600.0, 600.0)),
            container_layout_size: None,
            transform: Some([1.0, 0.0, 0.0, 1.0, 100.0, 50.0]),
        })
        .unwrap();
        let selection = serde_wasm_bindgen::to_value(&Rect::new(200.0, 150.0, 200.0, 200.0)).unwrap();

        let image = export_selection(&source, layout, selection, false).unwrap();
        assert_eq!((image.width(), image.height()), (200, 200));

        let jpeg = encode_jpeg(&image, 85).unwrap();
        let decoded = decode_image(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 200));
    }

    #[wasm_bindgen_test]
    fn test_decode_garbage_is_an_error() {
        assert!(decode_image(&[1, 2, 3]).is_err());
    }
}
