//! The three rotation accumulators applied to the displayed model.

use crate::{ensure_finite, Result};

/// Wrap an angle into the accumulator domain.
///
/// Below 0 wraps to 359, 360 and above wraps to 1; anything in `[0, 360)`
/// is returned as-is.  This mirrors a one-step turntable, not a modulo: a
/// single step never crosses more than one boundary.
pub fn wrap_angle(value: f64) -> f64 {
    if value < 0.0 {
        359.0
    } else if value >= 360.0 {
        1.0
    } else {
        value
    }
}

/// Rotation angles in degrees.  Z turns the model like a turntable, X tilts
/// it toward/away from the viewer; Y is kept for completeness.
///
/// Every setter wraps its own axis independently and rejects non-finite
/// values, so the stored angles are always in `[0, 360)`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Orientation {
    x: f64,
    y: f64,
    z: f64,
}

impl Orientation {
    pub fn new(x: f64, y: f64, z: f64) -> Result<Self> {
        let mut o = Orientation::default();
        o.set_x(x)?;
        o.set_y(y)?;
        o.set_z(z)?;
        Ok(o)
    }

    pub fn x(&self) -> f64 { self.x }
    pub fn y(&self) -> f64 { self.y }
    pub fn z(&self) -> f64 { self.z }

    pub fn set_x(&mut self, value: f64) -> Result<()> {
        self.x = wrap_angle(ensure_finite("orientation.x", value)?);
        Ok(())
    }

    pub fn set_y(&mut self, value: f64) -> Result<()> {
        self.y = wrap_angle(ensure_finite("orientation.y", value)?);
        Ok(())
    }

    pub fn set_z(&mut self, value: f64) -> Result<()> {
        self.z = wrap_angle(ensure_finite("orientation.z", value)?);
        Ok(())
    }

    /// Add `delta` degrees to X, wrapping.
    pub fn nudge_x(&mut self, delta: f64) -> Result<()> {
        self.set_x(self.x + delta)
    }

    /// Add `delta` degrees to Z, wrapping.
    pub fn nudge_z(&mut self, delta: f64) -> Result<()> {
        self.set_z(self.z + delta)
    }

    /// `[x, y, z]` in radians, for renderers.
    pub fn radians(&self) -> [f64; 3] {
        [self.x.to_radians(), self.y.to_radians(), self.z.to_radians()]
    }
}
