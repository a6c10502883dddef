//! Selection-bounded mode: the image moves, the selection stays put.
//!
//! # Snap-back Algorithm
//!
//! After an interaction ends, [`compute_correction`] restores containment in
//! two steps:
//!
//! 1. If the image is smaller than the selection along either axis, scale it
//!    about its center by the smallest factor that covers both axes.
//! 2. Translate by the minimal per-side vector that closes any gap between an
//!    image edge and the matching selection edge. Sides without a gap are
//!    left alone.
//!
//! Deltas are measured in rendered container pixels and divided by the
//! render scale before being written into the transform.

use super::{Rejection, Validation};
use crate::geometry::{AffineTransform, Point, Rect, Size, GEOMETRY_EPSILON};
use crate::viewport::ViewportState;

/// Accept `candidate` only if the image would still contain `selection`.
///
/// Rejection is a strict no-op: the caller must not apply the transform.
pub fn validate_transform(
    viewport: &ViewportState,
    selection: &Rect,
    candidate: &AffineTransform,
    epsilon: f64,
) -> Validation {
    if viewport.has_degenerate_image() {
        return Validation::reject(Rejection::NoImage);
    }
    let Some(bounds) = viewport.image_bounds_under(candidate) else {
        return Validation::reject(Rejection::InvalidTransform);
    };
    if bounds.size().is_degenerate() {
        return Validation::reject(Rejection::InvalidTransform);
    }
    match bounds.first_violated_edge(selection, epsilon) {
        Some(edge) => Validation::reject(Rejection::OutOfBounds(edge)),
        None => Validation::Accept,
    }
}

/// A corrective transform restoring image ⊇ selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correction {
    /// Transform to animate towards.
    pub target: AffineTransform,
    /// Scale applied about the image center (1.0 when none was needed).
    pub scale_factor: f64,
    /// Translation applied after scaling, in rendered container pixels.
    pub delta: Point,
}

impl Correction {
    /// True when applying the correction would make no visible change.
    pub fn is_noop(&self, epsilon: f64) -> bool {
        (self.scale_factor - 1.0).abs() <= GEOMETRY_EPSILON && self.delta.is_zero(epsilon)
    }
}

/// Compute the snap-back correction for the current viewport.
///
/// Returns `None` if the image is degenerate or the transform singular.
pub fn compute_correction(viewport: &ViewportState, selection: &Rect) -> Option<Correction> {
    let mut bounds = viewport.image_rect();
    if bounds.size().is_degenerate() || viewport.transform.inverse().is_none() {
        return None;
    }

    let mut target = viewport.transform;
    let mut scale_factor = 1.0;

    if selection.width - bounds.width > GEOMETRY_EPSILON
        || selection.height - bounds.height > GEOMETRY_EPSILON
    {
        scale_factor = (selection.width / bounds.width).max(selection.height / bounds.height);
        target = target.scaled_about(scale_factor, viewport.image_center_layout());
        bounds = Rect::centered_on(
            bounds.center(),
            Size::new(bounds.width * scale_factor, bounds.height * scale_factor),
        );
    }

    let delta = Point::new(
        closing_offset(bounds.left(), bounds.right(), selection.left(), selection.right()),
        closing_offset(bounds.top(), bounds.bottom(), selection.top(), selection.bottom()),
    );

    target = target.translated(delta.x / viewport.render_scale, delta.y / viewport.render_scale);

    Some(Correction {
        target,
        scale_factor,
        delta,
    })
}

/// Offset that moves `[lo, hi]` to cover `[sel_lo, sel_hi]` along one axis.
fn closing_offset(lo: f64, hi: f64, sel_lo: f64, sel_hi: f64) -> f64 {
    if lo > sel_lo {
        sel_lo - lo
    } else if hi < sel_hi {
        sel_hi - hi
    } else {
        0.0
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::geometry::LayoutBox;
    use crate::viewport::{HeadlessLayout, Layout};
    use proptest::prelude::*;

    proptest! {
        /// Property: After applying a correction the image contains the selection.
        #[test]
        fn prop_correction_restores_containment(
            scale in 0.05f64..4.0,
            tx in -800.0f64..800.0,
            ty in -800.0f64..800.0,
            render_scale in 0.5f64..3.0,
        ) {
            let mut layout = HeadlessLayout::new(
                LayoutBox::new(10.0, 10.0, 600.0, 600.0),
                Size::new(300.0, 200.0),
            )
            .with_render_scale(render_scale)
            .with_transform(AffineTransform::scale_translate(scale, tx, ty));
            let selection = Rect::new(150.0, 200.0, 160.0, 90.0);

            let vp = ViewportState::sample(&layout).unwrap();
            let correction = compute_correction(&vp, &selection).unwrap();
            layout.set_transform(correction.target);

            let after = ViewportState::sample(&layout).unwrap();
            prop_assert!(after.image_rect().contains_rect(&selection, 1e-6));

            let again = compute_correction(&after, &selection).unwrap();
            prop_assert!(again.is_noop(0.5));
        }
    }
}
