//! Tracked hands and active-hand selection.
//!
//! Depth convention: a larger `depth` means the hand is closer to the sensor
//! (reaching further toward the display).  Every hand producer maps its own
//! coordinate system into this convention before building a [`HandFrame`].

use crate::{ensure_finite, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hand::Left => "left",
            Hand::Right => "right",
        }
    }
}

/// One tracked hand position.  `x`/`y` are in the producer's 2D units
/// (depth-space pixels, millimetres, ...), `y` up-positive.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HandPoint {
    pub x:     f64,
    pub y:     f64,
    pub depth: f64,
}

impl HandPoint {
    pub fn new(x: f64, y: f64, depth: f64) -> Self {
        HandPoint { x, y, depth }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        ensure_finite("hand.x", self.x)?;
        ensure_finite("hand.y", self.y)?;
        ensure_finite("hand.depth", self.depth)?;
        Ok(())
    }
}

/// Both hands of one tracked body for a single sensor frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HandFrame {
    pub left:         HandPoint,
    pub right:        HandPoint,
    /// Grab state: a closed hand engages rotation.
    pub left_closed:  bool,
    pub right_closed: bool,
}

impl HandFrame {
    pub fn active(&self) -> Hand {
        select_active_hand(self.left, self.right)
    }

    /// Position and grab state of the active hand.
    pub fn active_point(&self) -> (Hand, HandPoint, bool) {
        match self.active() {
            Hand::Left => (Hand::Left, self.left, self.left_closed),
            Hand::Right => (Hand::Right, self.right, self.right_closed),
        }
    }
}

/// Pick the hand nearer the sensor.  Ties go to the right hand.
pub fn select_active_hand(left: HandPoint, right: HandPoint) -> Hand {
    if left.depth > right.depth {
        Hand::Left
    } else {
        Hand::Right
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearer_left_hand_wins() {
        let l = HandPoint::new(0.0, 0.0, 0.5);
        let r = HandPoint::new(0.0, 0.0, 0.3);
        assert_eq!(select_active_hand(l, r), Hand::Left);
        assert_eq!(select_active_hand(r, l), Hand::Right);
    }

    #[test]
    fn tie_goes_right() {
        let p = HandPoint::new(1.0, 2.0, 0.4);
        assert_eq!(select_active_hand(p, p), Hand::Right);
    }

    #[test]
    fn active_point_carries_grab_state() {
        let frame = HandFrame {
            left:         HandPoint::new(10.0, 20.0, 0.9),
            right:        HandPoint::new(30.0, 40.0, 0.1),
            left_closed:  true,
            right_closed: false,
        };
        let (hand, point, closed) = frame.active_point();
        assert_eq!(hand, Hand::Left);
        assert_eq!(point.x, 10.0);
        assert!(closed);
    }

    #[test]
    fn nan_depth_is_rejected() {
        assert!(HandPoint::new(0.0, 0.0, f64::NAN).validate().is_err());
        assert!(HandPoint::new(0.0, 0.0, 1.0).validate().is_ok());
    }
}
