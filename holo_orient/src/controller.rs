//! The single owner of the orientation state.
//!
//! [`OrientationController`] receives every input through its `on_*` entry
//! points, applies it in call order, and pushes the result to all four
//! display panels through a [`PanelSink`].  It is not `Sync` by intent: the
//! host keeps it on one control thread and feeds it from a command queue.

use tracing::{debug, info, trace};

use crate::animation::{AnimationSession, AnimationSpeed};
use crate::config::ControlConfig;
use crate::direction::{is_static, Direction};
use crate::gesture::{GestureRecognizer, ManipulationDelta, ManipulationEvent, Permissions};
use crate::hand::{Hand, HandFrame};
use crate::movement::{apply_step, InputProfile, MovementTracker, PointerSample, TrackOutcome};
use crate::orientation::Orientation;
use crate::{ensure_finite, Result};

// ════════════════════════════════════════════════════════════════════════════
// Panels and sinks
// ════════════════════════════════════════════════════════════════════════════

/// The four synchronized faces of the hologram pyramid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Panel {
    Top,
    Bottom,
    Left,
    Right,
}

impl Panel {
    pub const ALL: [Panel; 4] = [Panel::Top, Panel::Bottom, Panel::Left, Panel::Right];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// What a panel needs to draw the model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanelView {
    pub orientation: Orientation,
    pub zoom:        f64,
}

/// Receiver of orientation broadcasts (the rendering collaborator).
pub trait PanelSink {
    fn apply(&mut self, panel: Panel, view: PanelView);
}

/// Sink that keeps every update; used by tests and headless runs.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub updates: Vec<(Panel, PanelView)>,
}

impl RecordingSink {
    /// Number of complete four-panel broadcasts received.
    pub fn broadcasts(&self) -> usize {
        self.updates.len() / Panel::ALL.len()
    }

    pub fn last(&self) -> Option<PanelView> {
        self.updates.last().map(|(_, v)| *v)
    }
}

impl PanelSink for RecordingSink {
    fn apply(&mut self, panel: Panel, view: PanelView) {
        self.updates.push((panel, view));
    }
}

/// Downstream handler for classified manipulations.
///
/// Only the hooks the current permissions allow are called.
pub trait ManipulationDispatcher {
    fn pan(&mut self, _delta: &ManipulationDelta) {}
    fn scale(&mut self, _delta: &ManipulationDelta) {}
    fn rotate(&mut self, _delta: &ManipulationDelta) {}
    fn permissions_changed(&mut self, _permissions: Permissions) {}
}

pub struct NullDispatcher;

impl ManipulationDispatcher for NullDispatcher {}

/// Which input a movement came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputSource {
    Pointer,
    Sensor,
}

// ════════════════════════════════════════════════════════════════════════════
// OrientationController
// ════════════════════════════════════════════════════════════════════════════

pub struct OrientationController<S: PanelSink, D: ManipulationDispatcher> {
    config:      ControlConfig,
    orientation: Orientation,
    zoom:        f64,

    // ── movement ─────────────────────────────────────────────────────────
    pointer:          MovementTracker,
    sensor:           MovementTracker,
    pointer_engaged:  bool,
    sensor_engaged:   bool,
    pointer_at_rest:  bool,
    active_hand:      Option<Hand>,

    // ── gestures ─────────────────────────────────────────────────────────
    recognizer:       GestureRecognizer,
    permissions:      Permissions,

    // ── animation ────────────────────────────────────────────────────────
    animation:        Option<AnimationSession>,
    next_session:     u64,

    sink:       S,
    dispatcher: D,
}

impl<S: PanelSink, D: ManipulationDispatcher> OrientationController<S, D> {
    pub fn new(config: ControlConfig, sink: S, dispatcher: D) -> Self {
        let recognizer = GestureRecognizer::new(config.gesture.clone());
        OrientationController {
            config,
            orientation: Orientation::default(),
            zoom: 1.0,
            pointer: MovementTracker::default(),
            sensor: MovementTracker::default(),
            pointer_engaged: false,
            sensor_engaged: false,
            pointer_at_rest: false,
            active_hand: None,
            recognizer,
            permissions: Permissions::NONE,
            animation: None,
            next_session: 0,
            sink,
            dispatcher,
        }
    }

    // ── accessors ────────────────────────────────────────────────────────

    pub fn config(&self) -> &ControlConfig { &self.config }
    pub fn orientation(&self) -> Orientation { self.orientation }
    pub fn zoom(&self) -> f64 { self.zoom }
    pub fn permissions(&self) -> Permissions { self.permissions }
    pub fn animation(&self) -> Option<AnimationSession> { self.animation }
    pub fn recognizer(&self) -> &GestureRecognizer { &self.recognizer }
    pub fn pointer_engaged(&self) -> bool { self.pointer_engaged }
    pub fn sensor_engaged(&self) -> bool { self.sensor_engaged }
    pub fn sink(&self) -> &S { &self.sink }
    pub fn sink_mut(&mut self) -> &mut S { &mut self.sink }
    pub fn dispatcher(&self) -> &D { &self.dispatcher }

    pub fn view(&self) -> PanelView {
        PanelView { orientation: self.orientation, zoom: self.zoom }
    }

    /// Push the current view to all four panels.
    pub fn broadcast(&mut self) {
        let view = self.view();
        for panel in Panel::ALL {
            self.sink.apply(panel, view);
        }
    }

    // ── pointer ──────────────────────────────────────────────────────────

    /// Primary button pressed or released.
    pub fn on_pointer_button(&mut self, pressed: bool) {
        if pressed != self.pointer_engaged {
            debug!(pressed, "pointer engagement changed");
        }
        self.pointer_engaged = pressed;
        self.pointer_at_rest = false;
    }

    pub fn on_sample(&mut self, sample: PointerSample) -> Result<()> {
        sample.validate()?;

        let profile = self.config.pointer.profile();
        let outcomes = self.pointer.track(sample.x, sample.y, &profile, self.pointer_engaged, false);
        let applied = self.apply_outcomes(outcomes, &profile, InputSource::Pointer)?;

        if applied > 0 {
            self.pointer_at_rest = false;
            return Ok(());
        }

        if self.pointer_engaged && outcomes.iter().all(TrackOutcome::is_pending) {
            let band = self.config.pointer.static_band;
            let resting = match (self.pointer.horizontal.anchor(), self.pointer.vertical.anchor()) {
                (Some(ax), Some(ay)) => is_static(sample.x, ax, band) && is_static(sample.y, ay, band),
                _ => false,
            };
            if resting && !self.pointer_at_rest {
                self.pointer_at_rest = true;
                self.neutral_reset()?;
            }
        }
        Ok(())
    }

    /// The pointer came to rest while engaged: refresh the panels, or send
    /// the model home when configured to.
    fn neutral_reset(&mut self) -> Result<()> {
        if self.config.pointer.home_on_rest {
            let home_z = self.animation.map(|a| a.step).unwrap_or(0.0);
            self.orientation.set_z(home_z)?;
            self.orientation.set_x(0.0)?;
            debug!(home_z, "pointer at rest; orientation sent home");
        } else {
            trace!("pointer at rest; refreshing panels");
        }
        self.broadcast();
        Ok(())
    }

    // ── sensor ───────────────────────────────────────────────────────────

    /// One skeletal frame.  The hand nearer the sensor drives rotation while
    /// it is closed.
    pub fn on_hands(&mut self, frame: HandFrame) -> Result<()> {
        frame.left.validate()?;
        frame.right.validate()?;

        let (hand, point, closed) = frame.active_point();
        if self.active_hand != Some(hand) {
            debug!(hand = hand.as_str(), "active hand changed");
            self.active_hand = Some(hand);
            self.sensor.reset();
        }
        if closed != self.sensor_engaged {
            debug!(closed, hand = hand.as_str(), "grab state changed");
        }
        self.sensor_engaged = closed;

        let profile = self.config.sensor.profile();
        let cross = self.config.sensor.cross_axis_reset;
        let outcomes = self.sensor.track(point.x, point.y, &profile, closed, cross);
        self.apply_outcomes(outcomes, &profile, InputSource::Sensor)?;
        Ok(())
    }

    // ── movement engine ──────────────────────────────────────────────────

    /// Apply a classified movement of `magnitude` units from `source`.
    ///
    /// No-op unless that source is engaged.  Returns the number of steps
    /// applied (`floor(magnitude / trigger)`, bounded by
    /// [`InputProfile::step_limit`]).
    pub fn apply_movement(&mut self, source: InputSource, direction: Direction, magnitude: f64) -> Result<u32> {
        ensure_finite("movement.magnitude", magnitude)?;
        let (engaged, profile) = match source {
            InputSource::Pointer => (self.pointer_engaged, self.config.pointer.profile()),
            InputSource::Sensor => (self.sensor_engaged, self.config.sensor.profile()),
        };
        let magnitude = magnitude.abs();
        if !engaged || magnitude < profile.trigger {
            return Ok(0);
        }
        let (steps, _) = profile.steps_for(magnitude);
        self.apply_steps(source, direction, steps, profile.step_deg)?;
        Ok(steps)
    }

    fn apply_outcomes(&mut self, outcomes: [TrackOutcome; 2], profile: &InputProfile, source: InputSource) -> Result<u32> {
        let mut applied = 0;
        for outcome in outcomes {
            if let TrackOutcome::Moved { direction, steps, magnitude } = outcome {
                trace!(?source, ?direction, steps, magnitude, "qualifying movement");
                self.apply_steps(source, direction, steps, profile.step_deg)?;
                applied += steps;
            }
        }
        Ok(applied)
    }

    fn apply_steps(&mut self, source: InputSource, direction: Direction, steps: u32, degrees: f64) -> Result<()> {
        if steps == 0 {
            return Ok(());
        }
        if let Some(session) = self.animation.take() {
            info!(session = session.id, ?source, "manual input supersedes animation");
        }
        for _ in 0..steps {
            apply_step(&mut self.orientation, direction, degrees)?;
            self.broadcast();
        }
        Ok(())
    }

    // ── manipulation ─────────────────────────────────────────────────────

    pub fn on_manipulation(&mut self, event: ManipulationEvent) -> Result<Permissions> {
        let permissions = self.recognizer.handle(&event)?;

        if permissions != self.permissions {
            self.permissions = permissions;
            self.dispatcher.permissions_changed(permissions);
        }

        if let ManipulationEvent::Delta(delta) = &event {
            if permissions.pan {
                self.dispatcher.pan(delta);
            }
            if permissions.scale {
                self.dispatcher.scale(delta);
            }
            if permissions.rotate {
                self.dispatcher.rotate(delta);
            }
        }
        Ok(permissions)
    }

    // ── zoom ─────────────────────────────────────────────────────────────

    /// Mouse wheel: scrolling down zooms in, up zooms out, one step per event.
    pub fn on_wheel(&mut self, delta: f64) -> Result<f64> {
        ensure_finite("wheel.delta", delta)?;
        if delta == 0.0 {
            return Ok(self.zoom);
        }
        let z = &self.config.zoom;
        let next = if delta < 0.0 { self.zoom + z.step } else { self.zoom - z.step };
        self.zoom = next.clamp(z.min, z.max);
        self.broadcast();
        Ok(self.zoom)
    }

    // ── animation ────────────────────────────────────────────────────────

    /// Start (or replace) the turntable animation.  The host schedules
    /// ticks at `session.interval` and reports them with the session id.
    pub fn start_animation(&mut self, speed: AnimationSpeed, direction: Direction) -> Result<AnimationSession> {
        self.next_session += 1;
        let session = AnimationSession::new(self.next_session, speed, direction, &self.config.animation);

        if let Some(old) = self.animation.replace(session) {
            debug!(old = old.id, new = session.id, "animation replaced");
        }
        if !self.config.animation.advance_on_tick {
            self.orientation.set_z(session.step)?;
        }
        info!(
            session = session.id,
            %speed,
            ?direction,
            interval_ms = session.interval.as_millis() as u64,
            "animation started"
        );
        self.broadcast();
        Ok(session)
    }

    pub fn stop_animation(&mut self) -> Option<AnimationSession> {
        let stopped = self.animation.take();
        if let Some(s) = stopped {
            info!(session = s.id, "animation stopped");
        }
        stopped
    }

    /// One timer tick.  Returns false for ticks of a session that is no
    /// longer live.
    pub fn on_animation_tick(&mut self, session_id: u64) -> Result<bool> {
        let session = match self.animation {
            Some(s) if s.id == session_id => s,
            _ => {
                trace!(session_id, "stale animation tick");
                return Ok(false);
            }
        };
        if self.config.animation.advance_on_tick {
            self.orientation.nudge_z(session.step)?;
        }
        self.broadcast();
        Ok(true)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
