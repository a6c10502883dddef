//! Cropframe Core - Aspect-locked crop geometry
//!
//! This crate provides the geometry and boundary enforcement behind an
//! interactive crop frame: fitting an aspect-locked selection over a
//! displayed image, validating or correcting pan/zoom gestures so the image
//! always covers the selection, and mapping the on-screen selection back to
//! source-resolution pixels for export.
//!
//! # Modules
//!
//! - [`geometry`]: points, rectangles, layout boxes, affine transforms
//! - [`viewport`]: the [`Layout`] capability and per-query snapshots
//! - [`fit`]: initial selection placement
//! - [`bounds`]: selection-bounded and image-bounded enforcement
//! - [`gate`]: interaction state machine
//! - [`session`]: the [`CropSession`] tying it all together
//! - [`export`], [`raster`], [`capability`]: source-resolution output
//! - [`codec`]: decoding sources and encoding exports

pub mod bounds;
pub mod capability;
pub mod codec;
pub mod config;
pub mod export;
pub mod fit;
pub mod gate;
pub mod geometry;
pub mod raster;
pub mod selection;
pub mod session;
pub mod tween;
pub mod viewport;

pub use bounds::{
    compute_correction, constrain_selection, validate_selection, validate_transform, Correction,
    Rejection, Validation,
};
pub use capability::{Capabilities, CapabilityCache, CapabilityProbe, StaticProbe};
pub use codec::{decode_image, encode_jpeg, encode_png, CodecError};
pub use config::{BoundaryMode, ConfigError, CoverageConfig, Easing, EngineConfig};
pub use export::{map_to_original_resolution, ExportError, OutputSize, QualityHint, Renderer};
pub use fit::{compute_fit_selection, fit_with_config};
pub use gate::{GateAction, InputEvent, InteractionGate, PointerId};
pub use geometry::{AffineTransform, Edge, LayoutBox, Point, Rect, Size};
pub use raster::{RasterError, RasterImage, RasterRenderer};
pub use selection::{Corner, Selection};
pub use session::{CropSession, IdleCallback, LoadToken, ReadyError};
pub use tween::{SnapTween, TweenFrame};
pub use viewport::{HeadlessLayout, Layout, LayoutFrame, ViewportState};
