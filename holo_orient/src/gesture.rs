//! Multi-point manipulation classifier.
//!
//! A manipulation session (two or more contacts, from touch-down to release)
//! is classified once into one of two permission sets:
//!
//! | Accumulated signal                                  | Class           | pan | scale | rotate |
//! |-----------------------------------------------------|-----------------|-----|-------|--------|
//! | `|scale| > scale_trigger` and `|rot| < rot_trigger` | `PanScale`      | ✓   | ✓     |        |
//! | `|rot| >= rot_trigger` and span `> min_distance`     | `PanScaleRotate`| ✓   | ✓     | ✓      |
//!
//! The first rule that matches wins and stays latched until the session
//! ends.  Until then no permission is granted.

use tracing::debug;

use crate::config::GestureConfig;
use crate::{ensure_finite, Result};

// ════════════════════════════════════════════════════════════════════════════
// Events
// ════════════════════════════════════════════════════════════════════════════

/// One incremental update of a manipulation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ManipulationDelta {
    /// Incremental scale factor per axis (`(1, 1)` = unchanged)
    pub scale:        (f64, f64),
    /// Incremental rotation in degrees
    pub rotation_deg: f64,
    /// Current contact points, in pixels
    pub contacts:     Vec<(f64, f64)>,
}

impl ManipulationDelta {
    pub fn new(scale: (f64, f64), rotation_deg: f64, contacts: Vec<(f64, f64)>) -> Self {
        ManipulationDelta { scale, rotation_deg, contacts }
    }

    /// Length of the scale vector.
    pub fn scale_magnitude(&self) -> f64 {
        (self.scale.0 * self.scale.0 + self.scale.1 * self.scale.1).sqrt()
    }

    /// Diagonal of the contacts' bounding box, in pixels.  Zero for fewer
    /// than two contacts.
    pub fn contact_span(&self) -> f64 {
        if self.contacts.len() < 2 {
            return 0.0;
        }
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for &(x, y) in &self.contacts {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        let (w, h) = (max_x - min_x, max_y - min_y);
        (w * w + h * h).sqrt()
    }

    fn validate(&self) -> Result<()> {
        ensure_finite("manipulation.scale.x", self.scale.0)?;
        ensure_finite("manipulation.scale.y", self.scale.1)?;
        ensure_finite("manipulation.rotation", self.rotation_deg)?;
        for &(x, y) in &self.contacts {
            ensure_finite("manipulation.contact.x", x)?;
            ensure_finite("manipulation.contact.y", y)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ManipulationEvent {
    Started,
    Delta(ManipulationDelta),
    Completed,
}

// ════════════════════════════════════════════════════════════════════════════
// Permissions / phase
// ════════════════════════════════════════════════════════════════════════════

/// What the downstream pan/scale/rotate dispatcher may do right now.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Permissions {
    pub pan:    bool,
    pub scale:  bool,
    pub rotate: bool,
}

impl Permissions {
    pub const NONE: Permissions = Permissions { pan: false, scale: false, rotate: false };

    pub fn any(&self) -> bool {
        self.pan || self.scale || self.rotate
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureClass {
    PanScale,
    PanScaleRotate,
}

impl GestureClass {
    pub fn permissions(self) -> Permissions {
        match self {
            GestureClass::PanScale => Permissions { pan: true, scale: true, rotate: false },
            GestureClass::PanScaleRotate => Permissions { pan: true, scale: true, rotate: true },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GesturePhase {
    /// No session in progress.
    Idle,
    /// Session running, not classified yet.
    Tracking,
    /// Latched until the session completes.
    Classified(GestureClass),
}

// ════════════════════════════════════════════════════════════════════════════
// GestureRecognizer
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct GestureRecognizer {
    config:       GestureConfig,
    phase:        GesturePhase,
    scale_acc:    f64,
    rotation_acc: f64,
}

impl GestureRecognizer {
    pub fn new(config: GestureConfig) -> Self {
        GestureRecognizer {
            config,
            phase:        GesturePhase::Idle,
            scale_acc:    0.0,
            rotation_acc: 0.0,
        }
    }

    pub fn phase(&self) -> GesturePhase { self.phase }
    pub fn scale_accumulator(&self) -> f64 { self.scale_acc }
    pub fn rotation_accumulator(&self) -> f64 { self.rotation_acc }

    pub fn permissions(&self) -> Permissions {
        match self.phase {
            GesturePhase::Classified(class) => class.permissions(),
            _ => Permissions::NONE,
        }
    }

    /// Feed one event and return the permissions in effect afterwards.
    pub fn handle(&mut self, event: &ManipulationEvent) -> Result<Permissions> {
        match event {
            ManipulationEvent::Started => self.begin(),
            ManipulationEvent::Delta(delta) => self.update(delta)?,
            ManipulationEvent::Completed => self.complete(),
        }
        Ok(self.permissions())
    }

    fn begin(&mut self) {
        self.scale_acc = 0.0;
        self.rotation_acc = 0.0;
        self.phase = GesturePhase::Tracking;
    }

    fn update(&mut self, delta: &ManipulationDelta) -> Result<()> {
        delta.validate()?;

        if self.phase == GesturePhase::Idle {
            debug!("manipulation delta without start; opening session");
            self.begin();
        }

        self.scale_acc += 1.0 - delta.scale_magnitude() / std::f64::consts::SQRT_2;
        self.rotation_acc += delta.rotation_deg;

        if let GesturePhase::Classified(_) = self.phase {
            return Ok(());
        }

        let span_cm = delta.contact_span() / self.config.pixels_per_cm;
        let rotating = self.rotation_acc.abs() >= self.config.rotation_trigger_deg;

        let class = if self.scale_acc.abs() > self.config.scale_trigger && !rotating {
            Some(GestureClass::PanScale)
        } else if rotating && span_cm > self.config.min_finger_distance_cm {
            Some(GestureClass::PanScaleRotate)
        } else {
            None
        };

        if let Some(class) = class {
            debug!(
                ?class,
                scale = self.scale_acc,
                rotation = self.rotation_acc,
                span_cm,
                "manipulation classified"
            );
            self.phase = GesturePhase::Classified(class);
        }
        Ok(())
    }

    fn complete(&mut self) {
        self.scale_acc = 0.0;
        self.rotation_acc = 0.0;
        self.phase = GesturePhase::Idle;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    /// A uniform scale factor `s` contributes `1 − s` to the accumulator.
    fn pinch(s: f64, rotation_deg: f64, span_px: f64) -> ManipulationEvent {
        ManipulationEvent::Delta(ManipulationDelta::new(
            (s, s),
            rotation_deg,
            vec![(0.0, 0.0), (span_px, 0.0)],
        ))
    }

    fn recognizer() -> GestureRecognizer {
        let mut r = GestureRecognizer::new(GestureConfig::default());
        r.handle(&ManipulationEvent::Started).unwrap();
        r
    }

    #[test]
    fn start_grants_nothing() {
        let r = recognizer();
        assert_eq!(r.phase(), GesturePhase::Tracking);
        assert_eq!(r.permissions(), Permissions::NONE);
    }

    #[test]
    fn quiet_session_never_grants() {
        let mut r = recognizer();
        // 50 × 0.0005 = 0.025 of scale and 50 × 0.1° = 5° of rotation
        for _ in 0..50 {
            let p = r.handle(&pinch(0.9995, 0.1, 200.0)).unwrap();
            assert!(!p.any());
        }
        assert!(r.scale_accumulator().abs() < 0.05);
        assert!(r.rotation_accumulator().abs() < 10.0);
        assert_eq!(r.phase(), GesturePhase::Tracking);
    }

    #[test]
    fn scale_first_latches_pan_scale() {
        let mut r = recognizer();
        // 1 − 0.94 = 0.06 > 0.05
        let p = r.handle(&pinch(0.94, 0.0, 40.0)).unwrap();
        assert_eq!(p, Permissions { pan: true, scale: true, rotate: false });

        // Heavy rotation afterwards does not reclassify.
        let p = r.handle(&pinch(1.0, 30.0, 400.0)).unwrap();
        assert_eq!(p, Permissions { pan: true, scale: true, rotate: false });
        assert_eq!(r.phase(), GesturePhase::Classified(GestureClass::PanScale));
    }

    #[test]
    fn rotation_with_wide_contacts_grants_all() {
        let mut r = recognizer();
        // 3 cm at 38 px/cm
        let p = r.handle(&pinch(1.0, 12.0, 3.0 * 38.0)).unwrap();
        assert_eq!(p, Permissions { pan: true, scale: true, rotate: true });
    }

    #[test]
    fn rotation_with_close_contacts_waits() {
        let mut r = recognizer();
        let p = r.handle(&pinch(1.0, 12.0, 1.0 * 38.0)).unwrap();
        assert!(!p.any());
        // Spread the fingers: the accumulated rotation still counts.
        let p = r.handle(&pinch(1.0, 0.0, 3.0 * 38.0)).unwrap();
        assert!(p.rotate);
    }

    #[test]
    fn completion_resets_everything() {
        let mut r = recognizer();
        r.handle(&pinch(1.0, 12.0, 200.0)).unwrap();
        let p = r.handle(&ManipulationEvent::Completed).unwrap();
        assert_eq!(p, Permissions::NONE);
        assert_eq!(r.phase(), GesturePhase::Idle);
        assert_eq!(r.scale_accumulator(), 0.0);
        assert_eq!(r.rotation_accumulator(), 0.0);
    }

    #[test]
    fn delta_without_start_opens_session() {
        let mut r = GestureRecognizer::new(GestureConfig::default());
        let p = r.handle(&pinch(0.9, 0.0, 10.0)).unwrap();
        assert!(p.scale);
    }

    #[test]
    fn non_finite_delta_is_rejected() {
        let mut r = recognizer();
        let bad = ManipulationEvent::Delta(ManipulationDelta::new((f64::NAN, 1.0), 0.0, vec![]));
        assert!(r.handle(&bad).is_err());
        assert_eq!(r.scale_accumulator(), 0.0);
        assert_eq!(r.phase(), GesturePhase::Tracking);
    }

    #[test]
    fn span_uses_bounding_box_diagonal() {
        let d = ManipulationDelta::new((1.0, 1.0), 0.0, vec![(0.0, 0.0), (30.0, 0.0), (0.0, 40.0)]);
        assert_eq!(d.contact_span(), 50.0);
        assert_eq!(ManipulationDelta::new((1.0, 1.0), 0.0, vec![(5.0, 5.0)]).contact_span(), 0.0);
    }
}
