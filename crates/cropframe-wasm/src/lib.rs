//! Cropframe WASM - WebAssembly bindings for Cropframe
//!
//! This crate exposes the cropframe-core crop engine to JavaScript/TypeScript
//! applications.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible wrapper types and conversions
//! - `geometry` - Stateless fit, validation and correction functions
//! - `export` - Source-resolution size mapping, rendering and encoding
//! - `session` - Interactive `JsCropSession` driven by host callbacks
//!
//! # Usage
//!
//! ```typescript
//! import init, { compute_fit_selection } from '@cropframe/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const rect = compute_fit_selection(imageBox, containerBox, 9 / 16, 0.8);
//! ```

use wasm_bindgen::prelude::*;

mod export;
mod geometry;
mod session;
mod types;

// Re-export public types
pub use export::{
    decode_image, encode_jpeg, encode_png, export_selection, map_to_original_resolution,
};
pub use geometry::{
    compute_correction, compute_fit_selection, constrain_selection, validate_selection,
    validate_transform,
};
pub use session::JsCropSession;
pub use types::JsRasterImage;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();

    // A logger may already be installed by the host page
    if console_log::init_with_level(log::Level::Info).is_ok() {
        log::info!("Cropframe WASM {} initialized", version());
    }
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
    }
}
