//! Movement engine: turns successive positions into rotation steps.
//!
//! Each axis keeps an *anchor*, the position at which the last step was
//! applied.  Travel away from the anchor accumulates until it reaches the
//! trigger distance; every full trigger distance is one step.  Anything
//! shorter is noise and leaves the orientation alone.
//!
//! Horizontal steps turn the model around Z (Right = +), vertical steps
//! tilt it around X (Up = +).

use crate::direction::{classify, Axis, Direction};
use crate::orientation::Orientation;
use crate::{ensure_finite, Result};

// ════════════════════════════════════════════════════════════════════════════
// Inputs
// ════════════════════════════════════════════════════════════════════════════

/// One pointer position.  `y` is up-positive; producers working in screen
/// coordinates flip it before sending.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerSample {
    pub x: f64,
    pub y: f64,
}

impl PointerSample {
    pub fn new(x: f64, y: f64) -> Self {
        PointerSample { x, y }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        ensure_finite("pointer.x", self.x)?;
        ensure_finite("pointer.y", self.y)?;
        Ok(())
    }
}

/// How one input source maps travel to rotation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputProfile {
    /// Travel needed for one step
    pub trigger:              f64,
    /// Degrees per step
    pub step_deg:             f64,
    /// Upper bound on steps from a single sample
    pub max_steps_per_sample: Option<u32>,
}

impl InputProfile {
    /// Most steps one sample may apply: the configured cap, never more
    /// than one full turn.
    pub fn step_limit(&self) -> u32 {
        let turn = (360.0 / self.step_deg).ceil().clamp(1.0, u32::MAX as f64) as u32;
        self.max_steps_per_sample.map_or(turn, |cap| cap.min(turn))
    }

    /// Whole steps covered by `magnitude` of travel, bounded by
    /// [`step_limit`](Self::step_limit).  The flag is set when the bound
    /// cut the count short.
    pub fn steps_for(&self, magnitude: f64) -> (u32, bool) {
        let raw = (magnitude.abs() / self.trigger).floor();
        let limit = self.step_limit();
        if raw > limit as f64 {
            (limit, true)
        } else {
            (raw as u32, false)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AxisTracker
// ════════════════════════════════════════════════════════════════════════════

/// What a single sample did on one axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TrackOutcome {
    /// First sample seen; anchor set, nothing else.
    Anchored,
    /// Not engaged; anchor follows the input.
    Disengaged,
    /// Qualifying movement: `steps` ≥ 1 steps toward `direction`.
    Moved { direction: Direction, steps: u32, magnitude: f64 },
    /// Sub-threshold travel from the anchor.
    Pending { direction: Direction, magnitude: f64 },
}

impl TrackOutcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, TrackOutcome::Pending { .. })
    }
}

/// Anchor bookkeeping for one axis.
#[derive(Clone, Debug)]
pub struct AxisTracker {
    axis:   Axis,
    anchor: Option<f64>,
}

impl AxisTracker {
    pub fn new(axis: Axis) -> Self {
        AxisTracker { axis, anchor: None }
    }

    pub fn axis(&self) -> Axis { self.axis }
    pub fn anchor(&self) -> Option<f64> { self.anchor }

    /// Drop pending travel: the next sample measures from `position`.
    pub fn reanchor(&mut self, position: f64) {
        self.anchor = Some(position);
    }

    /// Forget the anchor entirely; the next sample only re-anchors.
    pub fn reset(&mut self) {
        self.anchor = None;
    }

    pub fn track(&mut self, position: f64, profile: &InputProfile, engaged: bool) -> TrackOutcome {
        let anchor = match self.anchor {
            Some(a) => a,
            None => {
                self.anchor = Some(position);
                return TrackOutcome::Anchored;
            }
        };

        if !engaged {
            self.anchor = Some(position);
            return TrackOutcome::Disengaged;
        }

        let (positive, negative) = self.axis.pair();
        let c = classify(position, anchor, positive, negative);

        if c.magnitude < profile.trigger {
            return TrackOutcome::Pending { direction: c.direction, magnitude: c.magnitude };
        }

        let (steps, capped) = profile.steps_for(c.magnitude);

        if capped {
            // Surplus travel is dropped.
            self.anchor = Some(position);
        } else {
            self.anchor = Some(anchor + c.direction.sign() * steps as f64 * profile.trigger);
        }

        TrackOutcome::Moved { direction: c.direction, steps, magnitude: c.magnitude }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MovementTracker: both axes of one input source
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct MovementTracker {
    pub horizontal: AxisTracker,
    pub vertical:   AxisTracker,
}

impl Default for MovementTracker {
    fn default() -> Self {
        MovementTracker {
            horizontal: AxisTracker::new(Axis::Horizontal),
            vertical:   AxisTracker::new(Axis::Vertical),
        }
    }
}

impl MovementTracker {
    /// Track one 2D position.  Returns `[horizontal, vertical]` outcomes.
    ///
    /// With `cross_axis_reset`, an axis that stayed below the trigger
    /// clears the leftover travel of an axis that moved in the same sample,
    /// so the moving axis measures its next step from where the hand is now.
    pub fn track(
        &mut self,
        x: f64,
        y: f64,
        profile: &InputProfile,
        engaged: bool,
        cross_axis_reset: bool,
    ) -> [TrackOutcome; 2] {
        let h = self.horizontal.track(x, profile, engaged);
        let v = self.vertical.track(y, profile, engaged);

        if cross_axis_reset {
            if h.is_pending() && matches!(v, TrackOutcome::Moved { .. }) {
                self.vertical.reanchor(y);
            }
            if v.is_pending() && matches!(h, TrackOutcome::Moved { .. }) {
                self.horizontal.reanchor(x);
            }
        }
        [h, v]
    }

    pub fn reanchor(&mut self, x: f64, y: f64) {
        self.horizontal.reanchor(x);
        self.vertical.reanchor(y);
    }

    pub fn reset(&mut self) {
        self.horizontal.reset();
        self.vertical.reset();
    }
}

/// Apply one step of `degrees` in `direction`: horizontal → Z, vertical → X.
pub fn apply_step(orientation: &mut Orientation, direction: Direction, degrees: f64) -> Result<()> {
    let delta = direction.sign() * degrees;
    match direction.axis() {
        Axis::Horizontal => orientation.nudge_z(delta),
        Axis::Vertical => orientation.nudge_x(delta),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
