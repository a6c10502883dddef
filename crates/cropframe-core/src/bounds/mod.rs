//! Boundary enforcement between the selection and the displayed image.
//!
//! Both modes maintain the same relation, selection ⊆ image bounds, but
//! differ in which side moves:
//!
//! - **Selection-bounded** ([`selection_bounded`]): the image pans and zooms
//!   under a fixed selection. Candidate transforms are validated, or
//!   overshoot is corrected afterwards with a snap-back.
//! - **Image-bounded** ([`image_bounded`]): the selection moves over a fixed
//!   image. Candidate selections are validated before being confirmed.
//!
//! All checks tolerate an overshoot of `epsilon` rendered pixels so that
//! layout float noise never rejects an exact-boundary state.

pub mod image_bounded;
pub mod selection_bounded;

pub use image_bounded::{constrain_selection, validate_selection};
pub use selection_bounded::{compute_correction, validate_transform, Correction};

use crate::geometry::Edge;
use serde::{Deserialize, Serialize};

/// Why a candidate was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "reason", content = "edge")]
pub enum Rejection {
    /// The given selection edge would fall outside the image.
    OutOfBounds(Edge),
    /// The candidate breaks the aspect-ratio lock.
    AspectMismatch,
    /// No image (or a degenerate one) is displayed.
    NoImage,
    /// The candidate transform is singular or not finite.
    InvalidTransform,
}

/// Outcome of validating a candidate change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "result")]
pub enum Validation {
    Accept,
    Reject { rejection: Rejection },
}

impl Validation {
    pub fn reject(rejection: Rejection) -> Self {
        Validation::Reject { rejection }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Validation::Accept)
    }
}
