//! Engine configuration.
//!
//! Configuration is validated once at the boundary. Invalid values are
//! reported as [`ConfigError`] and never replaced by substitutes.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default tolerance for boundary checks, in rendered pixels.
pub const DEFAULT_BOUNDARY_EPSILON: f64 = 0.5;

/// Errors reported for out-of-range configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Aspect ratio is not a positive finite number.
    #[error("Invalid aspect ratio: {0} (must be finite and > 0)")]
    InvalidAspectRatio(f64),

    /// Coverage is outside (0, 1].
    #[error("Invalid coverage: {0} (must be in (0, 1])")]
    InvalidCoverage(f64),

    /// Boundary epsilon is negative or not finite.
    #[error("Invalid boundary epsilon: {0} (must be finite and >= 0)")]
    InvalidEpsilon(f64),

    /// A duration setting is zero where a positive value is required.
    #[error("Invalid duration for {name}: must be greater than zero")]
    InvalidDuration { name: &'static str },
}

/// Aspect ratio and coverage for the initial selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageConfig {
    /// Selection width / height.
    pub aspect_ratio: f64,
    /// Fraction of the limiting image dimension covered, in (0, 1].
    pub coverage: f64,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: 1.0,
            coverage: 0.8,
        }
    }
}

impl CoverageConfig {
    pub fn new(aspect_ratio: f64, coverage: f64) -> Self {
        Self {
            aspect_ratio,
            coverage,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.aspect_ratio.is_finite() || self.aspect_ratio <= 0.0 {
            return Err(ConfigError::InvalidAspectRatio(self.aspect_ratio));
        }
        if !self.coverage.is_finite() || self.coverage <= 0.0 || self.coverage > 1.0 {
            return Err(ConfigError::InvalidCoverage(self.coverage));
        }
        Ok(())
    }
}

/// Which side of the crop is movable and how violations are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum BoundaryMode {
    /// The image pans/zooms under a fixed selection.
    ///
    /// With `snap_back`, overshoot is allowed while interacting and corrected
    /// with an animation afterwards. Without it, offending transforms are
    /// rejected outright.
    #[serde(rename_all = "camelCase")]
    SelectionBounded { snap_back: bool },
    /// The selection moves over a fixed image.
    ImageBounded,
}

impl Default for BoundaryMode {
    fn default() -> Self {
        BoundaryMode::SelectionBounded { snap_back: true }
    }
}

/// Easing curve for corrective animations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    Linear,
    /// `1 - (1 - t)^3`
    #[default]
    EaseOutCubic,
}

impl Easing {
    /// Map linear progress in `[0, 1]` onto the curve.
    #[inline]
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
        }
    }
}

/// Tunables for boundary enforcement and interaction timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Allowed overshoot before a boundary check fails, in rendered pixels.
    pub boundary_epsilon: f64,
    /// Length of the snap-back animation.
    pub snap_duration_ms: u64,
    /// Extra time after the animation before its state is force-cleared.
    pub snap_grace_ms: u64,
    /// Quiet period after the last wheel event before correcting.
    pub wheel_debounce_ms: u64,
    /// How long programmatic transforms stay allowed without a ready signal.
    pub programmatic_timeout_ms: u64,
    pub easing: Easing,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            boundary_epsilon: DEFAULT_BOUNDARY_EPSILON,
            snap_duration_ms: 300,
            snap_grace_ms: 50,
            wheel_debounce_ms: 150,
            programmatic_timeout_ms: 500,
            easing: Easing::EaseOutCubic,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.boundary_epsilon.is_finite() || self.boundary_epsilon < 0.0 {
            return Err(ConfigError::InvalidEpsilon(self.boundary_epsilon));
        }
        let durations = [
            ("snap_duration_ms", self.snap_duration_ms),
            ("wheel_debounce_ms", self.wheel_debounce_ms),
            ("programmatic_timeout_ms", self.programmatic_timeout_ms),
        ];
        for (name, value) in durations {
            if value == 0 {
                return Err(ConfigError::InvalidDuration { name });
            }
        }
        Ok(())
    }

    pub fn snap_duration(&self) -> Duration {
        Duration::from_millis(self.snap_duration_ms)
    }

    pub fn snap_grace(&self) -> Duration {
        Duration::from_millis(self.snap_grace_ms)
    }

    pub fn wheel_debounce(&self) -> Duration {
        Duration::from_millis(self.wheel_debounce_ms)
    }

    pub fn programmatic_timeout(&self) -> Duration {
        Duration::from_millis(self.programmatic_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
        assert!(CoverageConfig::default().validate().is_ok());
    }

    #[test]
    fn test_coverage_bounds() {
        assert!(CoverageConfig::new(1.0, 1.0).validate().is_ok());
        assert_eq!(
            CoverageConfig::new(1.0, 0.0).validate(),
            Err(ConfigError::InvalidCoverage(0.0))
        );
        assert_eq!(
            CoverageConfig::new(1.0, 1.01).validate(),
            Err(ConfigError::InvalidCoverage(1.01))
        );
        assert!(CoverageConfig::new(1.0, f64::NAN).validate().is_err());
    }

    #[test]
    fn test_aspect_ratio_bounds() {
        assert_eq!(
            CoverageConfig::new(0.0, 0.5).validate(),
            Err(ConfigError::InvalidAspectRatio(0.0))
        );
        assert!(CoverageConfig::new(-1.0, 0.5).validate().is_err());
        assert!(CoverageConfig::new(f64::INFINITY, 0.5).validate().is_err());
    }

    #[test]
    fn test_engine_config_rejects_bad_values() {
        let mut config = EngineConfig::default();
        config.boundary_epsilon = -0.1;
        assert_eq!(config.validate(), Err(ConfigError::InvalidEpsilon(-0.1)));

        let mut config = EngineConfig::default();
        config.wheel_debounce_ms = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidDuration {
                name: "wheel_debounce_ms"
            })
        );
    }

    #[test]
    fn test_durations() {
        let config = EngineConfig::default();
        assert_eq!(config.snap_duration(), Duration::from_millis(300));
        assert_eq!(config.snap_grace(), Duration::from_millis(50));
        assert_eq!(config.wheel_debounce(), Duration::from_millis(150));
        assert_eq!(config.programmatic_timeout(), Duration::from_millis(500));
    }

    #[test]
    fn test_easing_endpoints() {
        for easing in [Easing::Linear, Easing::EaseOutCubic] {
            assert!((easing.apply(0.0) - 0.0).abs() < f64::EPSILON);
            assert!((easing.apply(1.0) - 1.0).abs() < f64::EPSILON);
        }
        // Ease-out front-loads progress
        assert!(Easing::EaseOutCubic.apply(0.5) > 0.5);
        assert!((Easing::EaseOutCubic.apply(0.5) - 0.875).abs() < 1e-12);
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidCoverage(1.5);
        assert_eq!(err.to_string(), "Invalid coverage: 1.5 (must be in (0, 1])");
    }
}
