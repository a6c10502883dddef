//! WASM bindings for stateless crop geometry.
//!
//! Each function takes a layout snapshot (`{ imageBox, containerBox,
//! containerLayoutSize?, transform? }`) sampled by the caller and returns a
//! plain JavaScript object. Nothing is retained between calls.

use crate::types::{to_js, transform_from_js, viewport_from_js};
use cropframe_core::{
    compute_correction as core_compute_correction,
    compute_fit_selection as core_compute_fit_selection, constrain_selection as core_constrain,
    validate_selection as core_validate_selection, validate_transform as core_validate_transform,
    LayoutBox, Point, Rect,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Snap-back correction as exposed to JavaScript.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsCorrection {
    target: [f64; 6],
    scale_factor: f64,
    delta: Point,
}

fn rect_from_js(value: JsValue) -> Result<Rect, JsValue> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Invalid rectangle: {}", e)))
}

fn layout_box_from_js(value: JsValue) -> Result<LayoutBox, JsValue> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Invalid layout box: {}", e)))
}

/// Compute the initial aspect-locked selection.
///
/// # Returns
///
/// `{ x, y, width, height }` relative to the container, or `null` when the
/// image is degenerate.
///
/// # Example (TypeScript)
///
/// ```typescript
/// const rect = compute_fit_selection(
///   img.getBoundingClientRect(),
///   container.getBoundingClientRect(),
///   9 / 16,
///   0.8,
/// );
/// ```
#[wasm_bindgen]
pub fn compute_fit_selection(
    image_box: JsValue,
    container_box: JsValue,
    aspect_ratio: f64,
    coverage: f64,
) -> Result<JsValue, JsValue> {
    let image_box = layout_box_from_js(image_box)?;
    let container_box = layout_box_from_js(container_box)?;
    match core_compute_fit_selection(&image_box, &container_box, aspect_ratio, coverage) {
        Some(rect) => to_js(&rect),
        None => Ok(JsValue::NULL),
    }
}

/// Check whether the image under `candidate` would still contain `selection`.
///
/// Returns `{ result: "accept" }` or
/// `{ result: "reject", rejection: { reason, edge? } }`.
#[wasm_bindgen]
pub fn validate_transform(
    layout: JsValue,
    selection: JsValue,
    candidate: &[f64],
    epsilon: f64,
) -> Result<JsValue, JsValue> {
    let viewport = viewport_from_js(layout)?;
    let selection = rect_from_js(selection)?;
    let candidate = transform_from_js(candidate)?;
    to_js(&core_validate_transform(
        &viewport, &selection, &candidate, epsilon,
    ))
}

/// Check whether a candidate selection lies within the displayed image.
#[wasm_bindgen]
pub fn validate_selection(
    layout: JsValue,
    candidate: JsValue,
    epsilon: f64,
) -> Result<JsValue, JsValue> {
    let viewport = viewport_from_js(layout)?;
    let candidate = rect_from_js(candidate)?;
    to_js(&core_validate_selection(&viewport, &candidate, epsilon))
}

/// Compute the snap-back correction for the given layout.
///
/// Returns `{ target, scaleFactor, delta }` or `null` for a degenerate image.
#[wasm_bindgen]
pub fn compute_correction(layout: JsValue, selection: JsValue) -> Result<JsValue, JsValue> {
    let viewport = viewport_from_js(layout)?;
    let selection = rect_from_js(selection)?;
    match core_compute_correction(&viewport, &selection) {
        Some(correction) => to_js(&JsCorrection {
            target: correction.target.to_array(),
            scale_factor: correction.scale_factor,
            delta: correction.delta,
        }),
        None => Ok(JsValue::NULL),
    }
}

/// Pull a selection back inside the image, shrinking it if needed.
#[wasm_bindgen]
pub fn constrain_selection(layout: JsValue, selection: JsValue) -> Result<JsValue, JsValue> {
    let viewport = viewport_from_js(layout)?;
    let selection = rect_from_js(selection)?;
    match core_constrain(&viewport, &selection) {
        Some(rect) => to_js(&rect),
        None => Ok(JsValue::NULL),
    }
}

/// WASM-specific tests that require JsValue.
///
/// Use `wasm-pack test` to run these.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use crate::types::LayoutSnapshot;
    use serde::Deserialize;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[derive(Deserialize)]
    struct Outcome {
        result: String,
    }

    fn layout() -> JsValue {
        serde_wasm_bindgen::to_value(&LayoutSnapshot {
            image_box: Some(LayoutBox::new(100.0, 50.0, 400.0, 400.0)),
            container_box: Some(LayoutBox::new(0.0, 0.0, 600.0, 600.0)),
            container_layout_size: None,
            transform: Some([1.0, 0.0, 0.0, 1.0, 100.0, 50.0]),
        })
        .unwrap()
    }

    fn selection() -> JsValue {
        serde_wasm_bindgen::to_value(&Rect::new(221.25, 110.0, 157.5, 280.0)).unwrap()
    }

    #[wasm_bindgen_test]
    fn test_fit_reference_case() {
        let image = serde_wasm_bindgen::to_value(&LayoutBox::new(100.0, 50.0, 400.0, 400.0)).unwrap();
        let container = serde_wasm_bindgen::to_value(&LayoutBox::new(0.0, 0.0, 600.0, 600.0)).unwrap();
        let rect: Rect =
            serde_wasm_bindgen::from_value(compute_fit_selection(image, container, 9.0 / 16.0, 0.7).unwrap())
                .unwrap();
        assert!((rect.x - 221.25).abs() < 1e-9);
        assert!((rect.height - 280.0).abs() < 1e-9);
    }

    #[wasm_bindgen_test]
    fn test_fit_degenerate_returns_null() {
        let image = serde_wasm_bindgen::to_value(&LayoutBox::new(0.0, 0.0, 0.0, 400.0)).unwrap();
        let container = serde_wasm_bindgen::to_value(&LayoutBox::new(0.0, 0.0, 600.0, 600.0)).unwrap();
        assert!(compute_fit_selection(image, container, 1.0, 0.8).unwrap().is_null());
    }

    #[wasm_bindgen_test]
    fn test_validate_transform_outcomes() {
        let inside = validate_transform(layout(), selection(), &[1.0, 0.0, 0.0, 1.0, 110.0, 50.0], 0.5)
            .unwrap();
        let outcome: Outcome = serde_wasm_bindgen::from_value(inside).unwrap();
        assert_eq!(outcome.result, "accept");

        let escaped = validate_transform(layout(), selection(), &[1.0, 0.0, 0.0, 1.0, 300.0, 50.0], 0.5)
            .unwrap();
        let outcome: Outcome = serde_wasm_bindgen::from_value(escaped).unwrap();
        assert_eq!(outcome.result, "reject");
    }

    #[wasm_bindgen_test]
    fn test_short_transform_is_an_error() {
        assert!(validate_transform(layout(), selection(), &[1.0, 0.0], 0.5).is_err());
    }

    #[wasm_bindgen_test]
    fn test_correction_for_contained_selection_is_zero() {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Correction {
            scale_factor: f64,
            delta: Point,
        }
        let value = compute_correction(layout(), selection()).unwrap();
        let correction: Correction = serde_wasm_bindgen::from_value(value).unwrap();
        assert_eq!(correction.scale_factor, 1.0);
        assert_eq!(correction.delta, Point::new(0.0, 0.0));
    }
}
