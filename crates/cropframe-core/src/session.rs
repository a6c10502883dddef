//! Crop session: the single owner of selection, gate, and correction state.
//!
//! # Lifecycle
//!
//! 1. [`CropSession::load_image`] issues a [`LoadToken`] and opens the
//!    programmatic window.
//! 2. [`CropSession::image_ready`] reports decode completion for that token.
//! 3. [`CropSession::layout_settled`] closes the window and fits the initial
//!    selection.
//! 4. Pointer, wheel, and proposal calls drive interaction. Idle transitions
//!    run boundary correction and notify [`CropSession::on_interaction_idle`]
//!    listeners.
//! 5. [`CropSession::tick`] advances timers and the snap-back animation.
//!    [`CropSession::layout_changed`] re-checks bounds after a resize.
//! 6. [`CropSession::export`] renders the selection at source resolution.
//!
//! Every query samples the layout afresh. Nothing geometric is cached
//! between calls except the selection itself.

use crate::bounds::{
    compute_correction, constrain_selection, validate_selection, validate_transform, Correction,
    Rejection, Validation,
};
use crate::capability::{Capabilities, CapabilityCache, CapabilityProbe};
use crate::codec::CodecError;
use crate::config::{BoundaryMode, ConfigError, CoverageConfig, EngineConfig};
use crate::export::{
    map_to_original_resolution, render_checked, ExportError, OutputSize, QualityHint, Renderer,
};
use crate::fit::fit_with_config;
use crate::gate::{GateAction, InputEvent, InteractionGate, PointerId};
use crate::geometry::{AffineTransform, Point, Rect};
use crate::raster::RasterImage;
use crate::selection::{matches_aspect, Selection};
use crate::tween::SnapTween;
use crate::viewport::{Layout, ViewportState};
use std::time::Duration;
use thiserror::Error;

/// Errors reported when an image fails to become ready.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadyError {
    /// The host could not decode the image source.
    #[error("Image failed to decode: {0}")]
    DecodeFailed(String),

    /// The image decoded but never received a layout box.
    #[error("Image has no layout box")]
    NotLaidOut,
}

impl From<CodecError> for ReadyError {
    fn from(e: CodecError) -> Self {
        ReadyError::DecodeFailed(e.to_string())
    }
}

/// Identifies one image load. Signals carrying an older token are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadToken(u32);

impl LoadToken {
    pub fn generation(&self) -> u32 {
        self.0
    }
}

/// Listener notified once per idle transition.
pub type IdleCallback = Box<dyn FnMut()>;

/// Interactive crop session over a [`Layout`].
pub struct CropSession<L: Layout> {
    layout: L,
    config: EngineConfig,
    coverage: CoverageConfig,
    mode: BoundaryMode,
    selection: Option<Selection>,
    gate: InteractionGate,
    tween: Option<SnapTween>,
    last_correction: Option<Correction>,
    capabilities: CapabilityCache,
    generation: u32,
    image_ready: bool,
    idle_callbacks: Vec<IdleCallback>,
}

impl<L: Layout> CropSession<L> {
    /// Create a session. An invalid `config` is an error. An invalid
    /// `coverage` is accepted but logged, and fitting is skipped until a
    /// valid one is set.
    pub fn new(
        layout: L,
        config: EngineConfig,
        coverage: CoverageConfig,
        mode: BoundaryMode,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if let Err(e) = coverage.validate() {
            log::warn!("Invalid coverage configuration: {}", e);
        }
        Ok(Self {
            gate: InteractionGate::new(&config),
            layout,
            config,
            coverage,
            mode,
            selection: None,
            tween: None,
            last_correction: None,
            capabilities: CapabilityCache::new(),
            generation: 0,
            image_ready: false,
            idle_callbacks: Vec::new(),
        })
    }

    pub fn layout(&self) -> &L {
        &self.layout
    }

    pub fn layout_mut(&mut self) -> &mut L {
        &mut self.layout
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn coverage(&self) -> &CoverageConfig {
        &self.coverage
    }

    pub fn mode(&self) -> BoundaryMode {
        self.mode
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn gate(&self) -> &InteractionGate {
        &self.gate
    }

    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    /// Most recent correction computed on an idle transition.
    pub fn last_correction(&self) -> Option<Correction> {
        self.last_correction
    }

    /// Fresh snapshot of the viewport.
    pub fn viewport(&self) -> Option<ViewportState> {
        ViewportState::sample(&self.layout)
    }

    /// Register a listener fired once per idle transition.
    pub fn on_interaction_idle(&mut self, callback: IdleCallback) {
        self.idle_callbacks.push(callback);
    }

    // ------------------------------------------------------------------
    // Image lifecycle
    // ------------------------------------------------------------------

    /// Start loading a new image. Discards the selection and every pending
    /// timer or animation of the previous image.
    pub fn load_image(&mut self, now: Duration) -> LoadToken {
        self.generation = self.generation.wrapping_add(1);
        self.selection = None;
        self.image_ready = false;
        self.last_correction = None;
        let actions = self.gate.handle(InputEvent::SourceChanged, now);
        self.process(actions, now);
        LoadToken(self.generation)
    }

    /// Report decode completion for `token`.
    ///
    /// Stale tokens are ignored. A failed decode is returned to the caller
    /// unchanged; it is not retried.
    pub fn image_ready(
        &mut self,
        token: LoadToken,
        result: Result<(), ReadyError>,
        now: Duration,
    ) -> Result<(), ReadyError> {
        if token.0 != self.generation {
            log::debug!(
                "Ignoring ready signal for stale load {} (current {})",
                token.0,
                self.generation
            );
            return Ok(());
        }
        result?;
        let actions = self.gate.handle(InputEvent::ImageReady, now);
        self.process(actions, now);
        Ok(())
    }

    /// First layout tick after the image became ready.
    pub fn layout_settled(&mut self, now: Duration) {
        let actions = self.gate.handle(InputEvent::LayoutSettled, now);
        self.process(actions, now);
    }

    /// The surface was resized, rescaled or reoriented.
    ///
    /// Runs boundary correction against the new layout unless the user is
    /// mid-gesture, in which case the next idle transition handles it.
    pub fn layout_changed(&mut self, now: Duration) {
        if self.gate.is_interacting() {
            return;
        }
        log::debug!("Layout changed, re-checking bounds");
        self.run_correction(now);
    }

    /// Drop the image and everything associated with it.
    pub fn clear_image(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.selection = None;
        self.tween = None;
        self.last_correction = None;
        self.image_ready = false;
        self.gate.reset();
    }

    /// Change aspect ratio and coverage, refitting the selection.
    ///
    /// An invalid configuration is rejected and the current selection kept.
    pub fn set_coverage(&mut self, coverage: CoverageConfig) -> Result<(), ConfigError> {
        if let Err(e) = coverage.validate() {
            log::warn!("Rejecting coverage configuration: {}", e);
            return Err(e);
        }
        self.coverage = coverage;
        if self.image_ready {
            self.refit();
        }
        Ok(())
    }

    /// Recompute the selection from the current layout.
    ///
    /// Degenerate layouts leave the selection unchanged.
    pub fn refit(&mut self) {
        let Some(viewport) = self.viewport() else {
            return;
        };
        let fitted = fit_with_config(&viewport.image_box, &viewport.container_box, &self.coverage)
            .and_then(|rect| Selection::new(rect, self.coverage.aspect_ratio));
        if let Some(selection) = fitted {
            log::debug!("Fitted selection {:?}", selection.rect());
            self.selection = Some(selection);
        }
    }

    // ------------------------------------------------------------------
    // Proposals
    // ------------------------------------------------------------------

    /// Propose a new image transform (pan, pinch, wheel zoom).
    ///
    /// Accepted transforms are applied to the layout. Rejected ones are not.
    /// In snap-back mode an escaping transform is only accepted while a
    /// pointer is down or a wheel gesture is pending.
    pub fn propose_transform(&mut self, candidate: AffineTransform) -> Validation {
        let Some(viewport) = self.viewport() else {
            return Validation::reject(Rejection::NoImage);
        };
        if !candidate.is_finite() || candidate.inverse().is_none() {
            return Validation::reject(Rejection::InvalidTransform);
        }

        let verdict = if self.gate.allow_programmatic_transform() {
            Validation::Accept
        } else {
            match (self.selection, self.mode) {
                (None, _) => Validation::Accept,
                (Some(_), BoundaryMode::SelectionBounded { snap_back: true })
                    if self.gate.is_interacting() =>
                {
                    Validation::Accept
                }
                (Some(selection), _) => validate_transform(
                    &viewport,
                    &selection.rect(),
                    &candidate,
                    self.config.boundary_epsilon,
                ),
            }
        };

        if verdict.is_accepted() {
            self.tween = None;
            self.layout.set_transform(candidate);
        }
        verdict
    }

    /// Propose a new selection rectangle. Applied only if accepted.
    pub fn propose_selection(&mut self, candidate: Rect) -> Validation {
        let Some(mut selection) = self.selection else {
            return Validation::reject(Rejection::NoImage);
        };
        if !matches_aspect(&candidate, selection.aspect_ratio()) {
            return Validation::reject(Rejection::AspectMismatch);
        }
        let Some(viewport) = self.viewport() else {
            return Validation::reject(Rejection::NoImage);
        };

        let verdict = validate_selection(&viewport, &candidate, self.config.boundary_epsilon);
        if verdict.is_accepted() && selection.confirm(candidate) {
            self.selection = Some(selection);
        }
        verdict
    }

    // ------------------------------------------------------------------
    // Input events
    // ------------------------------------------------------------------

    pub fn pointer_down(&mut self, id: PointerId, position: Point, now: Duration) {
        let actions = self.gate.handle(InputEvent::PointerDown { id, position }, now);
        self.process(actions, now);
    }

    pub fn pointer_move(&mut self, id: PointerId, position: Point, now: Duration) {
        let actions = self.gate.handle(InputEvent::PointerMove { id, position }, now);
        self.process(actions, now);
    }

    pub fn pointer_up(&mut self, id: PointerId, now: Duration) {
        let actions = self.gate.handle(InputEvent::PointerUp { id }, now);
        self.process(actions, now);
    }

    pub fn pointer_cancel(&mut self, id: PointerId, now: Duration) {
        let actions = self.gate.handle(InputEvent::PointerCancel { id }, now);
        self.process(actions, now);
    }

    /// Wheel zoom to `candidate`. Restarts the correction debounce.
    pub fn wheel(&mut self, candidate: AffineTransform, now: Duration) -> Validation {
        let actions = self.gate.handle(InputEvent::Wheel, now);
        self.process(actions, now);
        self.propose_transform(candidate)
    }

    /// Advance timers and the snap-back animation.
    pub fn tick(&mut self, now: Duration) {
        let actions = self.gate.handle(InputEvent::Tick, now);
        self.process(actions, now);
        self.advance_tween(now);
    }

    fn process(&mut self, actions: Vec<GateAction>, now: Duration) {
        for action in actions {
            match action {
                GateAction::CancelCorrection => {
                    if self.tween.take().is_some() {
                        log::debug!("Snap-back cancelled by user input");
                    }
                }
                GateAction::Pan(delta) => self.apply_pan(delta),
                GateAction::Settled => {
                    self.image_ready = true;
                    self.refit();
                }
                GateAction::Idle => {
                    self.run_correction(now);
                    for callback in self.idle_callbacks.iter_mut() {
                        callback();
                    }
                }
            }
        }
    }

    fn apply_pan(&mut self, delta: Point) {
        let Some(viewport) = self.viewport() else {
            return;
        };
        let candidate = viewport.transform.translated(
            delta.x / viewport.render_scale,
            delta.y / viewport.render_scale,
        );
        self.propose_transform(candidate);
    }

    // ------------------------------------------------------------------
    // Correction
    // ------------------------------------------------------------------

    /// Restore the boundary invariant for the current mode.
    ///
    /// Recomputes against live state, so calling it mid-animation retargets
    /// the animation instead of queuing a second one.
    fn run_correction(&mut self, now: Duration) {
        if !self.gate.can_correct() {
            return;
        }
        let (Some(viewport), Some(mut selection)) = (self.viewport(), self.selection) else {
            return;
        };

        match self.mode {
            BoundaryMode::SelectionBounded { snap_back } => {
                let Some(correction) = compute_correction(&viewport, &selection.rect()) else {
                    return;
                };
                self.last_correction = Some(correction);
                if correction.is_noop(self.config.boundary_epsilon) {
                    self.tween = None;
                    return;
                }
                log::debug!(
                    "Snap-back: scale {:.4}, delta ({:.2}, {:.2})",
                    correction.scale_factor,
                    correction.delta.x,
                    correction.delta.y
                );
                if snap_back {
                    self.tween = Some(SnapTween::new(
                        viewport.transform,
                        correction.target,
                        now,
                        self.config.snap_duration(),
                        self.config.snap_grace(),
                        self.config.easing,
                    ));
                } else {
                    self.layout.set_transform(correction.target);
                }
            }
            BoundaryMode::ImageBounded => {
                if let Some(rect) = constrain_selection(&viewport, &selection.rect()) {
                    if rect != selection.rect() && selection.confirm(rect) {
                        log::debug!("Constrained selection to {:?}", rect);
                        self.selection = Some(selection);
                    }
                }
            }
        }
    }

    fn advance_tween(&mut self, now: Duration) {
        let Some(tween) = self.tween.as_ref() else {
            return;
        };
        if self.viewport().is_some() {
            let frame = tween.sample(now);
            log::trace!("Snap-back frame {:?}", frame.transform);
            self.layout.set_transform(frame.transform);
            if frame.finished {
                self.tween = None;
            }
        } else if tween.is_expired(now) {
            log::debug!("Snap-back deadline passed while hidden, finishing");
            let target = tween.target();
            self.layout.set_transform(target);
            self.tween = None;
        }
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// Probe renderer capabilities once. Later calls reuse the result.
    pub fn init_capabilities(&mut self, probe: &dyn CapabilityProbe) -> &Capabilities {
        self.capabilities.init(probe)
    }

    /// Forget probed capabilities.
    pub fn reset_capabilities(&mut self) {
        self.capabilities.reset();
    }

    /// Source-resolution size of the current selection.
    pub fn export_size(&self) -> Result<OutputSize, ExportError> {
        let selection = self.selection.ok_or(ExportError::NoSelection)?;
        let viewport = self.viewport().ok_or(ExportError::NoImage)?;
        if viewport.has_degenerate_image() {
            return Err(ExportError::NoImage);
        }
        let in_layout_units = selection.rect().scaled(1.0 / viewport.render_scale);
        map_to_original_resolution(&in_layout_units, &viewport.transform)
    }

    /// Render the selection at source resolution.
    pub fn export<R: Renderer + ?Sized>(
        &self,
        renderer: &R,
        quality: QualityHint,
    ) -> Result<RasterImage, ExportError> {
        let target = self.export_size()?;
        let capabilities = self.capabilities.get().cloned().unwrap_or_default();
        capabilities.check_output(target)?;

        let selection = self.selection.ok_or(ExportError::NoSelection)?;
        let viewport = self.viewport().ok_or(ExportError::NoImage)?;
        render_checked(
            renderer,
            &selection.rect(),
            &viewport,
            target,
            capabilities.effective_quality(quality),
        )
    }
}
