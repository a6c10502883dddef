//! Geometric primitives shared by every part of the engine.
//!
//! # Coordinate Systems
//!
//! - [`LayoutBox`] is page-space, as reported by the hosting layout
//!   (like a bounding-client rect).
//! - [`Rect`] is container-relative: `(0, 0)` is the container's top-left
//!   corner in rendered pixels.
//! - [`AffineTransform`] maps image-local layout units into container layout
//!   units. Multiply by the render scale to reach rendered pixels.

use serde::{Deserialize, Serialize};

/// Tolerance used when comparing derived floating point quantities.
pub const GEOMETRY_EPSILON: f64 = 1e-6;

/// A 2D point or vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Midpoint between two points.
    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Vector from `origin` to `self`.
    pub fn delta_from(self, origin: Point) -> Point {
        Point::new(self.x - origin.x, self.y - origin.y)
    }

    pub fn is_zero(self, tolerance: f64) -> bool {
        self.x.abs() <= tolerance && self.y.abs() <= tolerance
    }
}

/// Width and height pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero, negative, or not finite.
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }
}

/// A page-space box as reported by the hosting layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl LayoutBox {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Express this box relative to `container`'s origin.
    pub fn relative_to(&self, container: &LayoutBox) -> Rect {
        Rect::new(
            self.left - container.left,
            self.top - container.top,
            self.width,
            self.height,
        )
    }
}

/// Axis-aligned rectangle in container-relative coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a rectangle of `size` centered on `center`.
    pub fn centered_on(center: Point, size: Size) -> Self {
        Self::new(
            center.x - size.width / 2.0,
            center.y - size.height / 2.0,
            size.width,
            size.height,
        )
    }

    #[inline]
    pub fn left(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn top(&self) -> f64 {
        self.y
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    pub fn translated(&self, delta: Point) -> Rect {
        Rect::new(self.x + delta.x, self.y + delta.y, self.width, self.height)
    }

    pub fn scaled(&self, factor: f64) -> Rect {
        Rect::new(
            self.x * factor,
            self.y * factor,
            self.width * factor,
            self.height * factor,
        )
    }

    /// True if `inner` lies inside `self`, allowing each edge to overshoot by
    /// at most `epsilon`. Touching edges are contained.
    pub fn contains_rect(&self, inner: &Rect, epsilon: f64) -> bool {
        self.first_violated_edge(inner, epsilon).is_none()
    }

    /// First edge of `inner` that pokes out of `self` by more than `epsilon`.
    pub fn first_violated_edge(&self, inner: &Rect, epsilon: f64) -> Option<Edge> {
        if inner.left() < self.left() - epsilon {
            Some(Edge::Left)
        } else if inner.top() < self.top() - epsilon {
            Some(Edge::Top)
        } else if inner.right() > self.right() + epsilon {
            Some(Edge::Right)
        } else if inner.bottom() > self.bottom() + epsilon {
            Some(Edge::Bottom)
        } else {
            None
        }
    }
}

/// Rectangle edge, used to report boundary violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edge {
    Left,
    Top,
    Right,
    Bottom,
}

/// 2D affine transform `[a, b, c, d, tx, ty]`.
///
/// A point maps as:
/// ```text
/// x' = a * x + c * y + tx
/// y' = b * x + d * y + ty
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl AffineTransform {
    pub const IDENTITY: AffineTransform = AffineTransform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    pub fn new(a: f64, b: f64, c: f64, d: f64, tx: f64, ty: f64) -> Self {
        Self { a, b, c, d, tx, ty }
    }

    /// Uniform scale followed by a translation.
    pub fn scale_translate(scale: f64, tx: f64, ty: f64) -> Self {
        Self::new(scale, 0.0, 0.0, scale, tx, ty)
    }

    pub fn from_array(m: [f64; 6]) -> Self {
        Self::new(m[0], m[1], m[2], m[3], m[4], m[5])
    }

    pub fn to_array(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.tx, self.ty]
    }

    /// Uniform scale factor `sqrt(a² + b²)`.
    pub fn uniform_scale(&self) -> f64 {
        (self.a * self.a + self.b * self.b).sqrt()
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }

    /// True when the transform is a positive uniform scale plus translation,
    /// with no skew, rotation, or reflection.
    pub fn is_uniform_axis_aligned(&self, tolerance: f64) -> bool {
        self.b.abs() <= tolerance
            && self.c.abs() <= tolerance
            && self.a > 0.0
            && (self.a - self.d).abs() <= tolerance * self.a.max(1.0)
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.tx,
            self.b * p.x + self.d * p.y + self.ty,
        )
    }

    /// Inverse transform, or `None` if the matrix is singular.
    pub fn inverse(&self) -> Option<AffineTransform> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < f64::EPSILON {
            return None;
        }
        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        let tx = -(a * self.tx + c * self.ty);
        let ty = -(b * self.tx + d * self.ty);
        Some(AffineTransform::new(a, b, c, d, tx, ty))
    }

    /// Axis-aligned bounding box of `rect` after transformation.
    pub fn map_rect(&self, rect: &Rect) -> Rect {
        let corners = [
            self.apply(Point::new(rect.left(), rect.top())),
            self.apply(Point::new(rect.right(), rect.top())),
            self.apply(Point::new(rect.left(), rect.bottom())),
            self.apply(Point::new(rect.right(), rect.bottom())),
        ];
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in corners {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Compose a post-translation onto this transform.
    pub fn translated(&self, dx: f64, dy: f64) -> AffineTransform {
        AffineTransform {
            tx: self.tx + dx,
            ty: self.ty + dy,
            ..*self
        }
    }

    /// Compose a post-scale of `factor` about `center` onto this transform.
    pub fn scaled_about(&self, factor: f64, center: Point) -> AffineTransform {
        AffineTransform::new(
            self.a * factor,
            self.b * factor,
            self.c * factor,
            self.d * factor,
            factor * self.tx + (1.0 - factor) * center.x,
            factor * self.ty + (1.0 - factor) * center.y,
        )
    }

    /// Component-wise interpolation from `self` towards `target`.
    pub fn lerp(&self, target: &AffineTransform, t: f64) -> AffineTransform {
        let mix = |from: f64, to: f64| from + (to - from) * t;
        AffineTransform::new(
            mix(self.a, target.a),
            mix(self.b, target.b),
            mix(self.c, target.c),
            mix(self.d, target.d),
            mix(self.tx, target.tx),
            mix(self.ty, target.ty),
        )
    }

    /// True when every component differs by at most `tolerance`.
    pub fn approx_eq(&self, other: &AffineTransform, tolerance: f64) -> bool {
        self.to_array()
            .iter()
            .zip(other.to_array().iter())
            .all(|(l, r)| (l - r).abs() <= tolerance)
    }
}
