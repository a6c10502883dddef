//! Image-bounded mode: the selection moves over a fixed image.
//!
//! Selection updates are transactional. A gesture proposes a candidate,
//! [`validate_selection`] checks it against freshly sampled image bounds, and
//! only an accepted candidate replaces the selection.

use super::{Rejection, Validation};
use crate::geometry::{Rect, Size};
use crate::viewport::ViewportState;

/// Accept `candidate` only if every edge lies within the image bounds,
/// allowing `epsilon` pixels of overshoot.
pub fn validate_selection(viewport: &ViewportState, candidate: &Rect, epsilon: f64) -> Validation {
    let bounds = viewport.image_rect();
    if bounds.size().is_degenerate() {
        return Validation::reject(Rejection::NoImage);
    }
    match bounds.first_violated_edge(candidate, epsilon) {
        Some(edge) => Validation::reject(Rejection::OutOfBounds(edge)),
        None => Validation::Accept,
    }
}

/// Pull an escaped selection back inside the image.
///
/// Used after layout changes (container resize, image swap) that move the
/// image out from under an otherwise untouched selection. The selection is
/// shrunk about its center if it no longer fits, keeping its aspect ratio,
/// then shifted by the minimal amount. Returns `None` for a degenerate image.
pub fn constrain_selection(viewport: &ViewportState, selection: &Rect) -> Option<Rect> {
    let bounds = viewport.image_rect();
    if bounds.size().is_degenerate() || selection.size().is_degenerate() {
        return None;
    }

    let mut rect = *selection;
    let shrink = (bounds.width / rect.width).min(bounds.height / rect.height);
    if shrink < 1.0 {
        rect = Rect::centered_on(
            rect.center(),
            Size::new(rect.width * shrink, rect.height * shrink),
        );
    }

    let x = rect.x.clamp(bounds.left(), (bounds.right() - rect.width).max(bounds.left()));
    let y = rect.y.clamp(bounds.top(), (bounds.bottom() - rect.height).max(bounds.top()));
    Some(Rect::new(x, y, rect.width, rect.height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{AffineTransform, Edge, LayoutBox};
    use crate::selection::matches_aspect;
    use crate::viewport::HeadlessLayout;

    const EPS: f64 = 0.5;

    fn viewport() -> ViewportState {
        // Image displayed at container-relative (100, 50) sized 400x400
        let layout = HeadlessLayout::new(
            LayoutBox::new(0.0, 0.0, 600.0, 600.0),
            Size::new(400.0, 400.0),
        )
        .with_transform(AffineTransform::scale_translate(1.0, 100.0, 50.0));
        ViewportState::sample(&layout).unwrap()
    }

    #[test]
    fn test_accepts_inside() {
        let candidate = Rect::new(200.0, 100.0, 100.0, 100.0);
        assert_eq!(validate_selection(&viewport(), &candidate, EPS), Validation::Accept);
    }

    #[test]
    fn test_accepts_exact_boundary() {
        let candidate = Rect::new(100.0, 50.0, 400.0, 400.0);
        assert!(validate_selection(&viewport(), &candidate, EPS).is_accepted());
    }

    #[test]
    fn test_rejects_each_edge() {
        let vp = viewport();
        let cases = [
            (Rect::new(99.0, 100.0, 50.0, 50.0), Edge::Left),
            (Rect::new(200.0, 49.0, 50.0, 50.0), Edge::Top),
            (Rect::new(451.0, 100.0, 50.0, 50.0), Edge::Right),
            (Rect::new(200.0, 401.0, 50.0, 50.0), Edge::Bottom),
        ];
        for (candidate, edge) in cases {
            assert_eq!(
                validate_selection(&vp, &candidate, EPS),
                Validation::reject(Rejection::OutOfBounds(edge))
            );
        }
    }

    #[test]
    fn test_tolerates_float_noise() {
        let candidate = Rect::new(99.7, 50.0, 100.0, 100.0);
        assert!(validate_selection(&viewport(), &candidate, EPS).is_accepted());
    }

    #[test]
    fn test_degenerate_image_rejects() {
        let mut vp = viewport();
        vp.image_box.width = 0.0;
        let candidate = Rect::new(100.0, 50.0, 10.0, 10.0);
        assert_eq!(
            validate_selection(&vp, &candidate, EPS),
            Validation::reject(Rejection::NoImage)
        );
    }

    #[test]
    fn test_constrain_shifts_inside() {
        let escaped = Rect::new(450.0, 0.0, 100.0, 100.0);
        let fixed = constrain_selection(&viewport(), &escaped).unwrap();
        assert_eq!(fixed, Rect::new(400.0, 50.0, 100.0, 100.0));
    }

    #[test]
    fn test_constrain_shrinks_oversized() {
        let oversized = Rect::new(0.0, 0.0, 800.0, 450.0);
        let fixed = constrain_selection(&viewport(), &oversized).unwrap();
        assert!(matches_aspect(&fixed, 800.0 / 450.0));
        assert!((fixed.width - 400.0).abs() < 1e-9);
        assert!(viewport().image_rect().contains_rect(&fixed, 1e-9));
    }

    #[test]
    fn test_constrain_leaves_valid_selection() {
        let inside = Rect::new(150.0, 100.0, 50.0, 50.0);
        assert_eq!(constrain_selection(&viewport(), &inside), Some(inside));
    }
}
