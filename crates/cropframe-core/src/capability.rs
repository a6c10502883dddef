//! Renderer capability detection with an explicit lifecycle.
//!
//! Capabilities are probed once through a [`CapabilityProbe`] and memoized in
//! a [`CapabilityCache`] owned by the session. Calling [`CapabilityCache::reset`]
//! forces the next [`CapabilityCache::init`] to probe again.

use crate::export::{ExportError, OutputSize, QualityHint};
use serde::{Deserialize, Serialize};

/// What the host's raster surface supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    /// Whether high-quality resampling is available.
    pub high_quality_resampling: bool,
    /// Longest output edge the surface can allocate, if limited.
    pub max_output_edge: Option<u32>,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            high_quality_resampling: true,
            max_output_edge: None,
        }
    }
}

impl Capabilities {
    /// Downgrade a quality request the surface cannot honor.
    pub fn effective_quality(&self, requested: QualityHint) -> QualityHint {
        match requested {
            QualityHint::High if !self.high_quality_resampling => QualityHint::Fast,
            other => other,
        }
    }

    /// Reject output sizes beyond the surface limit.
    pub fn check_output(&self, size: OutputSize) -> Result<(), ExportError> {
        match self.max_output_edge {
            Some(max_edge) if size.longest_edge() > max_edge => Err(ExportError::TooLarge {
                width: size.width,
                height: size.height,
                max_edge,
            }),
            _ => Ok(()),
        }
    }
}

/// One-time detection of host capabilities.
pub trait CapabilityProbe {
    fn probe(&self) -> Capabilities;
}

/// Probe that reports a fixed capability set.
#[derive(Debug, Clone, Default)]
pub struct StaticProbe(pub Capabilities);

impl CapabilityProbe for StaticProbe {
    fn probe(&self) -> Capabilities {
        self.0.clone()
    }
}

/// Memoized capabilities.
#[derive(Debug, Clone, Default)]
pub struct CapabilityCache {
    cached: Option<Capabilities>,
}

impl CapabilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe on first use and return the memoized result afterwards.
    pub fn init(&mut self, probe: &dyn CapabilityProbe) -> &Capabilities {
        self.cached.get_or_insert_with(|| probe.probe())
    }

    pub fn get(&self) -> Option<&Capabilities> {
        self.cached.as_ref()
    }

    pub fn reset(&mut self) {
        self.cached = None;
    }
}
