//! Clock-driven corrective animation.
//!
//! A [`SnapTween`] interpolates the image transform from its value at the
//! start of a correction to the corrected target. It is advanced by external
//! clock ticks and has a hard deadline (`duration + grace`) after which its
//! state is dropped even if no frame could be applied, e.g. because the
//! surface was hidden mid-animation.

use crate::config::Easing;
use crate::geometry::AffineTransform;
use std::time::Duration;

/// One sampled animation frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenFrame {
    pub transform: AffineTransform,
    /// True once the target has been reached.
    pub finished: bool,
}

/// Snap-back animation between two transforms.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapTween {
    from: AffineTransform,
    to: AffineTransform,
    start: Duration,
    duration: Duration,
    deadline: Duration,
    easing: Easing,
}

impl SnapTween {
    pub fn new(
        from: AffineTransform,
        to: AffineTransform,
        start: Duration,
        duration: Duration,
        grace: Duration,
        easing: Easing,
    ) -> Self {
        Self {
            from,
            to,
            start,
            duration,
            deadline: start + duration + grace,
            easing,
        }
    }

    pub fn target(&self) -> AffineTransform {
        self.to
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Linear progress in `[0, 1]` at `now`.
    pub fn progress(&self, now: Duration) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.start);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Sample the eased transform at `now`.
    pub fn sample(&self, now: Duration) -> TweenFrame {
        let t = self.progress(now);
        if t >= 1.0 {
            return TweenFrame {
                transform: self.to,
                finished: true,
            };
        }
        TweenFrame {
            transform: self.from.lerp(&self.to, self.easing.apply(t)),
            finished: false,
        }
    }

    /// True once the fallback deadline has passed.
    pub fn is_expired(&self, now: Duration) -> bool {
        now >= self.deadline
    }
}
