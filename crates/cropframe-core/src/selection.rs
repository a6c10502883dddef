//! The aspect-locked crop selection.
//!
//! A [`Selection`] can only hold rectangles whose width / height matches its
//! locked aspect ratio. Gestures produce candidate rectangles through the
//! helpers below; the session confirms a candidate only after validation.

use crate::geometry::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// Relative tolerance for the aspect-ratio lock.
pub const ASPECT_TOLERANCE: f64 = 1e-6;

/// Corner that stays fixed while resizing from the opposite handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Returns true if `rect` has the given aspect ratio within tolerance.
pub fn matches_aspect(rect: &Rect, aspect_ratio: f64) -> bool {
    if !(rect.width > 0.0 && rect.height > 0.0) {
        return false;
    }
    (rect.aspect_ratio() - aspect_ratio).abs() <= ASPECT_TOLERANCE * aspect_ratio.max(1.0)
}

/// Crop rectangle with a fixed aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    rect: Rect,
    aspect_ratio: f64,
}

impl Selection {
    /// Create a selection, or `None` if `rect` is empty or off-ratio.
    pub fn new(rect: Rect, aspect_ratio: f64) -> Option<Self> {
        if !(aspect_ratio.is_finite() && aspect_ratio > 0.0) || !matches_aspect(&rect, aspect_ratio) {
            return None;
        }
        Some(Self { rect, aspect_ratio })
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio
    }

    /// Candidate moved by `delta`.
    pub fn moved_by(&self, delta: Point) -> Rect {
        self.rect.translated(delta)
    }

    /// Candidate of `width` sharing the current center.
    pub fn resized_about_center(&self, width: f64) -> Rect {
        Rect::centered_on(
            self.rect.center(),
            Size::new(width, width / self.aspect_ratio),
        )
    }

    /// Candidate of `width` keeping `anchor` fixed.
    pub fn resized_from(&self, anchor: Corner, width: f64) -> Rect {
        let height = width / self.aspect_ratio;
        let r = self.rect;
        match anchor {
            Corner::TopLeft => Rect::new(r.left(), r.top(), width, height),
            Corner::TopRight => Rect::new(r.right() - width, r.top(), width, height),
            Corner::BottomLeft => Rect::new(r.left(), r.bottom() - height, width, height),
            Corner::BottomRight => {
                Rect::new(r.right() - width, r.bottom() - height, width, height)
            }
        }
    }

    /// Replace the rectangle. Returns false, leaving the selection
    /// untouched, if `rect` breaks the aspect lock.
    pub fn confirm(&mut self, rect: Rect) -> bool {
        if !matches_aspect(&rect, self.aspect_ratio) {
            return false;
        }
        self.rect = rect;
        true
    }
}
