//! Interaction gate: decides who may write the transform, and when to correct.
//!
//! The gate is a synchronous reducer over a discrete [`InputEvent`] stream.
//! Timers are stored as deadlines and checked on [`InputEvent::Tick`], so a
//! reload simply overwrites them and stale timers can never fire.
//!
//! # Guarantees
//!
//! - [`GateAction::Idle`] is never emitted while programmatic transforms are
//!   allowed or while any pointer is down.
//! - Releasing the last pointer emits exactly one `Idle`, unless a wheel
//!   debounce is pending, in which case the debounce emits it.
//! - Each wheel event restarts the debounce. `Idle` follows only once the
//!   debounce expires uncontested.

use crate::config::EngineConfig;
use crate::geometry::Point;
use std::collections::BTreeMap;
use std::time::Duration;

/// Identifier of an active pointer (touch, pen, or mouse).
pub type PointerId = i32;

/// Discrete input consumed by the gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A new image source was set. Opens the programmatic window.
    SourceChanged,
    /// The image finished decoding.
    ImageReady,
    /// First layout/paint tick after the image became ready. Emits
    /// [`GateAction::Settled`] once per ready signal.
    LayoutSettled,
    PointerDown { id: PointerId, position: Point },
    PointerMove { id: PointerId, position: Point },
    PointerUp { id: PointerId },
    PointerCancel { id: PointerId },
    Wheel,
    /// Clock tick; fires expired deadlines.
    Tick,
}

/// Side effects requested by the gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateAction {
    /// User input took over; stop any in-flight correction.
    CancelCorrection,
    /// Extra translation from a two-finger pan, in rendered pixels.
    Pan(Point),
    /// The programmatic window closed after layout settled.
    Settled,
    /// Interaction went idle: run correction and notify listeners.
    Idle,
}

/// Event-driven interaction state machine.
#[derive(Debug, Clone)]
pub struct InteractionGate {
    programmatic_timeout: Duration,
    wheel_debounce: Duration,
    allow_programmatic: bool,
    programmatic_deadline: Option<Duration>,
    ready: bool,
    active_pointers: BTreeMap<PointerId, Point>,
    last_midpoint: Option<Point>,
    wheel_deadline: Option<Duration>,
}

impl InteractionGate {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            programmatic_timeout: config.programmatic_timeout(),
            wheel_debounce: config.wheel_debounce(),
            allow_programmatic: false,
            programmatic_deadline: None,
            ready: false,
            active_pointers: BTreeMap::new(),
            last_midpoint: None,
            wheel_deadline: None,
        }
    }

    /// Whether the hosting renderer may currently transform the image
    /// without validation.
    pub fn allow_programmatic_transform(&self) -> bool {
        self.allow_programmatic
    }

    pub fn active_pointer_count(&self) -> usize {
        self.active_pointers.len()
    }

    /// True while pointers are down or a wheel debounce is pending.
    pub fn is_interacting(&self) -> bool {
        !self.active_pointers.is_empty() || self.wheel_deadline.is_some()
    }

    /// True when a correction is allowed to run.
    pub fn can_correct(&self) -> bool {
        !self.allow_programmatic && self.active_pointers.is_empty()
    }

    /// Drop all state belonging to the current image.
    pub fn reset(&mut self) {
        self.allow_programmatic = false;
        self.programmatic_deadline = None;
        self.ready = false;
        self.active_pointers.clear();
        self.last_midpoint = None;
        self.wheel_deadline = None;
    }

    /// Apply one event and return the resulting actions.
    pub fn handle(&mut self, event: InputEvent, now: Duration) -> Vec<GateAction> {
        let mut actions = Vec::new();
        match event {
            InputEvent::SourceChanged => {
                self.reset();
                self.allow_programmatic = true;
                self.programmatic_deadline = Some(now + self.programmatic_timeout);
                actions.push(GateAction::CancelCorrection);
                log::debug!("gate: source changed, programmatic window open");
            }
            InputEvent::ImageReady => {
                // Recorded even after the window timed out, so a slow decode
                // still gets its settle.
                self.ready = true;
            }
            InputEvent::LayoutSettled => {
                if self.ready {
                    self.ready = false;
                    self.close_programmatic_window();
                    actions.push(GateAction::Settled);
                    log::debug!("gate: layout settled, programmatic window closed");
                }
            }
            InputEvent::PointerDown { id, position } => {
                if self.active_pointers.is_empty() {
                    actions.push(GateAction::CancelCorrection);
                }
                self.active_pointers.insert(id, position);
                self.last_midpoint = self.two_finger_midpoint();
            }
            InputEvent::PointerMove { id, position } => {
                if let Some(slot) = self.active_pointers.get_mut(&id) {
                    *slot = position;
                    if let Some(midpoint) = self.two_finger_midpoint() {
                        if let Some(last) = self.last_midpoint {
                            let delta = midpoint.delta_from(last);
                            if !delta.is_zero(0.0) {
                                actions.push(GateAction::Pan(delta));
                            }
                        }
                        self.last_midpoint = Some(midpoint);
                    }
                }
            }
            InputEvent::PointerUp { id } | InputEvent::PointerCancel { id } => {
                if self.active_pointers.remove(&id).is_some() {
                    self.last_midpoint = self.two_finger_midpoint();
                    if self.active_pointers.is_empty()
                        && self.wheel_deadline.is_none()
                        && !self.allow_programmatic
                    {
                        actions.push(GateAction::Idle);
                    }
                }
            }
            InputEvent::Wheel => {
                if self.wheel_deadline.is_none() && self.active_pointers.is_empty() {
                    actions.push(GateAction::CancelCorrection);
                }
                self.wheel_deadline = Some(now + self.wheel_debounce);
            }
            InputEvent::Tick => {
                if self.programmatic_deadline.is_some_and(|deadline| now >= deadline) {
                    self.close_programmatic_window();
                    log::debug!("gate: no ready signal, programmatic window timed out");
                }
                if self.wheel_deadline.is_some_and(|deadline| now >= deadline) {
                    self.wheel_deadline = None;
                    if self.can_correct() {
                        actions.push(GateAction::Idle);
                    }
                }
            }
        }
        actions
    }

    fn close_programmatic_window(&mut self) {
        self.allow_programmatic = false;
        self.programmatic_deadline = None;
    }

    fn two_finger_midpoint(&self) -> Option<Point> {
        if self.active_pointers.len() != 2 {
            return None;
        }
        let mut positions = self.active_pointers.values();
        let first = *positions.next()?;
        let second = *positions.next()?;
        Some(first.midpoint(second))
    }
}
