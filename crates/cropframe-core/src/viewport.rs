//! Viewport model: live layout queries and per-query snapshots.
//!
//! The engine never caches layout between interaction steps. Every operation
//! samples a fresh [`ViewportState`] from a [`Layout`] implementation, which
//! may be a real rendering surface or the [`HeadlessLayout`] harness.
//!
//! # Units
//!
//! Layout boxes are reported in rendered page pixels. The image transform is
//! expressed in the container's layout units. The two differ by the render
//! scale when the container itself is scaled (page zoom, CSS transform).

use crate::geometry::{AffineTransform, LayoutBox, Point, Rect, Size};

/// Layout capability the engine depends on.
///
/// All queries must reflect the current state of the surface. Returning
/// `None` means the element is missing or not laid out (hidden, detached,
/// image not loaded yet).
pub trait Layout {
    /// Displayed bounding box of the image, including its transform.
    fn image_box(&self) -> Option<LayoutBox>;

    /// Rendered bounding box of the container.
    fn container_box(&self) -> Option<LayoutBox>;

    /// Untransformed layout size of the container.
    fn container_layout_size(&self) -> Option<Size>;

    /// Read all boxes from a single layout pass.
    ///
    /// The default combines the individual queries. Surfaces where a query
    /// is costly or may observe different frames should override it.
    fn frame(&self) -> Option<LayoutFrame> {
        Some(LayoutFrame {
            image_box: self.image_box()?,
            container_box: self.container_box()?,
            container_layout_size: self.container_layout_size(),
        })
    }

    /// Current transform of the image inside the container.
    fn transform(&self) -> AffineTransform;

    /// Replace the image transform.
    fn set_transform(&mut self, transform: AffineTransform);
}

/// Boxes observed in one layout pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutFrame {
    pub image_box: LayoutBox,
    pub container_box: LayoutBox,
    pub container_layout_size: Option<Size>,
}

/// Relative difference between horizontal and vertical container scale
/// above which the mismatch is logged.
const ANISOTROPY_TOLERANCE: f64 = 1e-3;

/// Ephemeral snapshot of the viewport. Recreate it for every query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub image_box: LayoutBox,
    pub container_box: LayoutBox,
    pub transform: AffineTransform,
    /// Container rendered width divided by its layout width.
    ///
    /// Containers are assumed to scale uniformly. The vertical ratio is only
    /// compared, never used.
    pub render_scale: f64,
}

impl ViewportState {
    /// Sample the current layout. Returns `None` if either box is missing.
    pub fn sample<L: Layout + ?Sized>(layout: &L) -> Option<Self> {
        let frame = layout.frame()?;
        Some(Self {
            image_box: frame.image_box,
            container_box: frame.container_box,
            transform: layout.transform(),
            render_scale: render_scale(&frame.container_box, frame.container_layout_size),
        })
    }

    /// Displayed image bounds in container-relative rendered pixels.
    pub fn image_rect(&self) -> Rect {
        self.image_box.relative_to(&self.container_box)
    }

    /// Untransformed image rectangle in container layout units.
    ///
    /// Returns `None` if the current transform cannot be inverted.
    pub fn base_rect(&self) -> Option<Rect> {
        let inverse = self.transform.inverse()?;
        Some(inverse.map_rect(&self.image_rect().scaled(1.0 / self.render_scale)))
    }

    /// Image bounds the image would have under `candidate`, in
    /// container-relative rendered pixels.
    pub fn image_bounds_under(&self, candidate: &AffineTransform) -> Option<Rect> {
        if !candidate.is_finite() {
            return None;
        }
        let base = self.base_rect()?;
        Some(candidate.map_rect(&base).scaled(self.render_scale))
    }

    /// Center of the displayed image in container layout units.
    pub fn image_center_layout(&self) -> Point {
        let center = self.image_rect().center();
        Point::new(center.x / self.render_scale, center.y / self.render_scale)
    }

    pub fn has_degenerate_image(&self) -> bool {
        self.image_box.size().is_degenerate()
    }
}

fn render_scale(container_box: &LayoutBox, layout_size: Option<Size>) -> f64 {
    let Some(size) = layout_size.filter(|size| !size.is_degenerate()) else {
        return 1.0;
    };
    if container_box.width <= 0.0 {
        return 1.0;
    }
    let horizontal = container_box.width / size.width;
    let vertical = container_box.height / size.height;
    if (horizontal - vertical).abs() > ANISOTROPY_TOLERANCE * horizontal {
        log::debug!(
            "Anisotropic container scale {:.4} x {:.4}, using horizontal",
            horizontal,
            vertical
        );
    }
    horizontal
}

/// Deterministic in-memory [`Layout`] for tests and headless hosts.
///
/// The image is a rectangle in container layout units that the current
/// transform maps into place. Boxes are derived from it on every query.
#[derive(Debug, Clone)]
pub struct HeadlessLayout {
    container: LayoutBox,
    layout_size: Size,
    image: Option<Rect>,
    transform: AffineTransform,
    visible: bool,
}

impl HeadlessLayout {
    /// A container at `container` holding an untransformed image of
    /// `image_size` at its top-left corner.
    pub fn new(container: LayoutBox, image_size: Size) -> Self {
        Self {
            container,
            layout_size: container.size(),
            image: Some(Rect::new(0.0, 0.0, image_size.width, image_size.height)),
            transform: AffineTransform::IDENTITY,
            visible: true,
        }
    }

    /// Scale the rendered container relative to its layout size.
    pub fn with_render_scale(mut self, scale: f64) -> Self {
        self.layout_size = Size::new(self.container.width / scale, self.container.height / scale);
        self
    }

    pub fn with_transform(mut self, transform: AffineTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Position of the untransformed image inside the container.
    pub fn with_image_rect(mut self, rect: Rect) -> Self {
        self.image = Some(rect);
        self
    }

    pub fn set_image(&mut self, rect: Option<Rect>) {
        self.image = rect;
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn render_scale(&self) -> f64 {
        if self.layout_size.is_degenerate() {
            1.0
        } else {
            self.container.width / self.layout_size.width
        }
    }
}

impl Layout for HeadlessLayout {
    fn image_box(&self) -> Option<LayoutBox> {
        if !self.visible {
            return None;
        }
        let image = self.image?;
        let rect = self.transform.map_rect(&image).scaled(self.render_scale());
        Some(LayoutBox::new(
            self.container.left + rect.x,
            self.container.top + rect.y,
            rect.width,
            rect.height,
        ))
    }

    fn container_box(&self) -> Option<LayoutBox> {
        self.visible.then_some(self.container)
    }

    fn container_layout_size(&self) -> Option<Size> {
        self.visible.then_some(self.layout_size)
    }

    fn transform(&self) -> AffineTransform {
        self.transform
    }

    fn set_transform(&mut self, transform: AffineTransform) {
        self.transform = transform;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn layout() -> HeadlessLayout {
        HeadlessLayout::new(
            LayoutBox::new(50.0, 20.0, 600.0, 400.0),
            Size::new(300.0, 200.0),
        )
    }

    #[test]
    fn test_sample_reports_container_relative_image() {
        let layout = layout().with_transform(AffineTransform::scale_translate(1.0, 100.0, 40.0));
        let state = ViewportState::sample(&layout).unwrap();
        assert_eq!(state.image_box, LayoutBox::new(150.0, 60.0, 300.0, 200.0));
        assert_eq!(state.image_rect(), Rect::new(100.0, 40.0, 300.0, 200.0));
        assert_eq!(state.render_scale, 1.0);
    }

    #[test]
    fn test_hidden_layout_samples_nothing() {
        let mut layout = layout();
        layout.set_visible(false);
        assert!(ViewportState::sample(&layout).is_none());
    }

    #[test]
    fn test_missing_image_samples_nothing() {
        let mut layout = layout();
        layout.set_image(None);
        assert!(ViewportState::sample(&layout).is_none());
    }

    #[test]
    fn test_base_rect_recovers_untransformed_image() {
        let layout = layout().with_transform(AffineTransform::scale_translate(2.0, 10.0, 5.0));
        let state = ViewportState::sample(&layout).unwrap();
        let base = state.base_rect().unwrap();
        assert!((base.x - 0.0).abs() < 1e-9);
        assert!((base.width - 300.0).abs() < 1e-9);
        assert!((base.height - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_bounds_under_candidate() {
        let state = ViewportState::sample(&layout()).unwrap();
        let candidate = AffineTransform::scale_translate(1.5, -20.0, 10.0);
        let bounds = state.image_bounds_under(&candidate).unwrap();
        assert!((bounds.x + 20.0).abs() < 1e-9);
        assert!((bounds.y - 10.0).abs() < 1e-9);
        assert!((bounds.width - 450.0).abs() < 1e-9);
        assert!((bounds.height - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_render_scale_applies_to_bounds() {
        let layout = layout()
            .with_render_scale(2.0)
            .with_transform(AffineTransform::scale_translate(1.0, 10.0, 0.0));
        let state = ViewportState::sample(&layout).unwrap();
        assert!((state.render_scale - 2.0).abs() < 1e-9);
        // Translation of 10 layout units renders as 20 pixels
        assert!((state.image_rect().x - 20.0).abs() < 1e-9);

        let shifted = state
            .image_bounds_under(&AffineTransform::scale_translate(1.0, 15.0, 0.0))
            .unwrap();
        assert!((shifted.x - 30.0).abs() < 1e-9);
    }

    /// Layout that only answers through [`Layout::frame`] and counts reads.
    struct FrameLayout {
        frame: LayoutFrame,
        reads: Cell<usize>,
    }

    impl Layout for FrameLayout {
        fn image_box(&self) -> Option<LayoutBox> {
            unreachable!("boxes are read through frame()")
        }

        fn container_box(&self) -> Option<LayoutBox> {
            unreachable!("boxes are read through frame()")
        }

        fn container_layout_size(&self) -> Option<Size> {
            unreachable!("boxes are read through frame()")
        }

        fn frame(&self) -> Option<LayoutFrame> {
            self.reads.set(self.reads.get() + 1);
            Some(self.frame)
        }

        fn transform(&self) -> AffineTransform {
            AffineTransform::IDENTITY
        }

        fn set_transform(&mut self, _transform: AffineTransform) {}
    }

    fn frame_layout(container_layout_size: Option<Size>) -> FrameLayout {
        FrameLayout {
            frame: LayoutFrame {
                image_box: LayoutBox::new(0.0, 0.0, 200.0, 200.0),
                container_box: LayoutBox::new(0.0, 0.0, 600.0, 400.0),
                container_layout_size,
            },
            reads: Cell::new(0),
        }
    }

    #[test]
    fn test_sample_reads_layout_once() {
        let layout = frame_layout(None);
        let state = ViewportState::sample(&layout).unwrap();
        assert_eq!(layout.reads.get(), 1);
        assert_eq!(state.render_scale, 1.0);
    }

    #[test]
    fn test_anisotropic_container_uses_width_ratio() {
        // Width scaled 2x, height 4x
        let layout = frame_layout(Some(Size::new(300.0, 100.0)));
        let state = ViewportState::sample(&layout).unwrap();
        assert!((state.render_scale - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_layout_size_means_unscaled() {
        let layout = frame_layout(Some(Size::new(0.0, 100.0)));
        let state = ViewportState::sample(&layout).unwrap();
        assert_eq!(state.render_scale, 1.0);
    }

    #[test]
    fn test_non_finite_candidate_has_no_bounds() {
        let state = ViewportState::sample(&layout()).unwrap();
        let candidate = AffineTransform::scale_translate(f64::NAN, 0.0, 0.0);
        assert!(state.image_bounds_under(&candidate).is_none());
    }
}
