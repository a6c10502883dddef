//! WASM bindings for the interactive crop session.
//!
//! The host supplies two callbacks:
//!
//! - `query()` returns the current layout snapshot
//!   (`{ imageBox, containerBox, containerLayoutSize? }`), or `null` when the
//!   image is not laid out. It is called once per engine query.
//! - `apply(transform)` receives `[a, b, c, d, tx, ty]` whenever the engine
//!   writes the image transform, including every snap-back frame.
//!
//! Timestamps are milliseconds from a monotonic clock such as
//! `performance.now()`.

use crate::export::quality_from_bool;
use crate::types::{
    from_js_or_default, timestamp, to_js, transform_from_js, JsRasterImage, LayoutSnapshot,
};
use cropframe_core::{
    AffineTransform, BoundaryMode, Capabilities, CoverageConfig, CropSession, EngineConfig,
    Layout, LayoutBox, LayoutFrame, LoadToken, Point, RasterRenderer, ReadyError, Rect, Size, StaticProbe,
};
use wasm_bindgen::prelude::*;

/// [`Layout`] backed by host callbacks.
struct JsLayout {
    query: js_sys::Function,
    apply: js_sys::Function,
    transform: AffineTransform,
}

impl JsLayout {
    fn snapshot(&self) -> Option<LayoutSnapshot> {
        let value = match self.query.call0(&JsValue::NULL) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Layout query failed: {:?}", e);
                return None;
            }
        };
        if value.is_null() || value.is_undefined() {
            return None;
        }
        match serde_wasm_bindgen::from_value(value) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                log::warn!("Invalid layout snapshot: {}", e);
                None
            }
        }
    }
}

impl Layout for JsLayout {
    fn image_box(&self) -> Option<LayoutBox> {
        self.snapshot()?.image_box
    }

    fn container_box(&self) -> Option<LayoutBox> {
        self.snapshot()?.container_box
    }

    fn container_layout_size(&self) -> Option<Size> {
        self.snapshot()?.container_layout_size
    }

    fn frame(&self) -> Option<LayoutFrame> {
        let snapshot = self.snapshot()?;
        Some(LayoutFrame {
            image_box: snapshot.image_box?,
            container_box: snapshot.container_box?,
            container_layout_size: snapshot.container_layout_size,
        })
    }

    fn transform(&self) -> AffineTransform {
        self.transform
    }

    fn set_transform(&mut self, transform: AffineTransform) {
        self.transform = transform;
        let values = js_sys::Float64Array::from(&transform.to_array()[..]);
        if let Err(e) = self.apply.call1(&JsValue::NULL, &values) {
            log::warn!("Transform callback failed: {:?}", e);
        }
    }
}

/// Interactive crop session for JavaScript.
///
/// # Example (TypeScript)
///
/// ```typescript
/// const session = new JsCropSession(
///   () => ({
///     imageBox: img.getBoundingClientRect(),
///     containerBox: container.getBoundingClientRect(),
///     containerLayoutSize: { width: container.offsetWidth, height: container.offsetHeight },
///   }),
///   (m) => { img.style.transform = `matrix(${Array.from(m).join(',')})`; },
///   undefined,
///   { aspectRatio: 9 / 16, coverage: 0.8 },
///   { kind: 'selectionBounded', snapBack: true },
/// );
/// const token = session.load_image(performance.now());
/// img.onload = () => session.image_ready(token, undefined, performance.now());
/// ```
#[wasm_bindgen]
pub struct JsCropSession {
    inner: CropSession<JsLayout>,
    current_load: Option<LoadToken>,
}

#[wasm_bindgen]
impl JsCropSession {
    /// Create a session.
    ///
    /// `config`, `coverage` and `mode` may be `undefined` to use defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(
        query: js_sys::Function,
        apply: js_sys::Function,
        config: JsValue,
        coverage: JsValue,
        mode: JsValue,
    ) -> Result<JsCropSession, JsValue> {
        let config: EngineConfig = from_js_or_default(config)?;
        let coverage: CoverageConfig = from_js_or_default(coverage)?;
        let mode: BoundaryMode = from_js_or_default(mode)?;
        let layout = JsLayout {
            query,
            apply,
            transform: AffineTransform::IDENTITY,
        };
        let inner = CropSession::new(layout, config, coverage, mode)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self {
            inner,
            current_load: None,
        })
    }

    /// Start loading a new image. Returns the load token to pass to
    /// `image_ready`.
    pub fn load_image(&mut self, now_ms: f64) -> u32 {
        let token = self.inner.load_image(timestamp(now_ms));
        self.current_load = Some(token);
        token.generation()
    }

    /// Report that the image for `token` decoded, or failed with `error`.
    pub fn image_ready(
        &mut self,
        token: u32,
        error: Option<String>,
        now_ms: f64,
    ) -> Result<(), JsValue> {
        let Some(current) = self.current_load.filter(|t| t.generation() == token) else {
            log::debug!("Ignoring ready signal for stale load {}", token);
            return Ok(());
        };
        let result = match error {
            Some(message) => Err(ReadyError::DecodeFailed(message)),
            None => Ok(()),
        };
        self.inner
            .image_ready(current, result, timestamp(now_ms))
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Call on the first animation frame after the image became ready.
    pub fn layout_settled(&mut self, now_ms: f64) {
        self.inner.layout_settled(timestamp(now_ms));
    }

    /// Call after a resize, device pixel ratio change or orientation change.
    pub fn layout_changed(&mut self, now_ms: f64) {
        self.inner.layout_changed(timestamp(now_ms));
    }

    pub fn clear_image(&mut self) {
        self.current_load = None;
        self.inner.clear_image();
    }

    /// Change aspect ratio and coverage (`{ aspectRatio, coverage }`).
    pub fn set_coverage(&mut self, coverage: JsValue) -> Result<(), JsValue> {
        let coverage: CoverageConfig = serde_wasm_bindgen::from_value(coverage)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.inner
            .set_coverage(coverage)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Current selection `{ x, y, width, height }`, or `null`.
    pub fn selection(&self) -> Result<JsValue, JsValue> {
        match self.inner.selection() {
            Some(selection) => to_js(&selection.rect()),
            None => Ok(JsValue::NULL),
        }
    }

    /// Current image transform as `[a, b, c, d, tx, ty]`.
    pub fn transform(&self) -> Vec<f64> {
        self.inner.layout().transform().to_array().to_vec()
    }

    #[wasm_bindgen(getter)]
    pub fn is_animating(&self) -> bool {
        self.inner.is_animating()
    }

    #[wasm_bindgen(getter)]
    pub fn allow_programmatic_transform(&self) -> bool {
        self.inner.gate().allow_programmatic_transform()
    }

    /// Propose a pan/zoom transform. Returns the validation outcome.
    pub fn propose_transform(&mut self, candidate: &[f64]) -> Result<JsValue, JsValue> {
        let candidate = transform_from_js(candidate)?;
        to_js(&self.inner.propose_transform(candidate))
    }

    /// Propose a new selection rectangle. Returns the validation outcome.
    pub fn propose_selection(&mut self, candidate: JsValue) -> Result<JsValue, JsValue> {
        let candidate: Rect = serde_wasm_bindgen::from_value(candidate)
            .map_err(|e| JsValue::from_str(&format!("Invalid rectangle: {}", e)))?;
        to_js(&self.inner.propose_selection(candidate))
    }

    pub fn pointer_down(&mut self, id: i32, x: f64, y: f64, now_ms: f64) {
        self.inner
            .pointer_down(id, Point::new(x, y), timestamp(now_ms));
    }

    pub fn pointer_move(&mut self, id: i32, x: f64, y: f64, now_ms: f64) {
        self.inner
            .pointer_move(id, Point::new(x, y), timestamp(now_ms));
    }

    pub fn pointer_up(&mut self, id: i32, now_ms: f64) {
        self.inner.pointer_up(id, timestamp(now_ms));
    }

    pub fn pointer_cancel(&mut self, id: i32, now_ms: f64) {
        self.inner.pointer_cancel(id, timestamp(now_ms));
    }

    /// Wheel zoom to `candidate`.
    pub fn wheel(&mut self, candidate: &[f64], now_ms: f64) -> Result<JsValue, JsValue> {
        let candidate = transform_from_js(candidate)?;
        to_js(&self.inner.wheel(candidate, timestamp(now_ms)))
    }

    /// Advance timers and animation. Call once per animation frame.
    pub fn tick(&mut self, now_ms: f64) {
        self.inner.tick(timestamp(now_ms));
    }

    /// Register a callback fired once each time interaction goes idle.
    pub fn on_interaction_idle(&mut self, callback: js_sys::Function) {
        self.inner.on_interaction_idle(Box::new(move || {
            if let Err(e) = callback.call0(&JsValue::NULL) {
                log::warn!("Idle callback failed: {:?}", e);
            }
        }));
    }

    /// Set renderer capabilities (`{ highQualityResampling, maxOutputEdge? }`).
    pub fn set_capabilities(&mut self, capabilities: JsValue) -> Result<(), JsValue> {
        let capabilities: Capabilities = from_js_or_default(capabilities)?;
        self.inner.reset_capabilities();
        self.inner.init_capabilities(&StaticProbe(capabilities));
        Ok(())
    }

    /// Source-resolution size of the selection, `{ width, height }`.
    pub fn export_size(&self) -> Result<JsValue, JsValue> {
        let size = self
            .inner
            .export_size()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        to_js(&size)
    }

    /// Render the selection from `source` at source resolution.
    pub fn export(
        &self,
        source: &JsRasterImage,
        high_quality: bool,
    ) -> Result<JsRasterImage, JsValue> {
        let renderer = RasterRenderer::new(source.to_raster()?);
        let image = self
            .inner
            .export(&renderer, quality_from_bool(high_quality))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(JsRasterImage::from_raster(image))
    }
}
