//! Autonomous turntable animation.
//!
//! This module only models a session; the timer that produces ticks lives
//! with the host (see `leap_holo::animation`).  Ticks carry the session id
//! so the controller can ignore ticks from a session that was superseded.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::config::AnimationConfig;
use crate::direction::Direction;

/// Coarse animation speed; each maps to a tick interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnimationSpeed {
    VeryFast,
    Fast,
    Medium,
    Slow,
}

impl AnimationSpeed {
    pub const ALL: [AnimationSpeed; 4] = [
        AnimationSpeed::VeryFast,
        AnimationSpeed::Fast,
        AnimationSpeed::Medium,
        AnimationSpeed::Slow,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AnimationSpeed::VeryFast => "very-fast",
            AnimationSpeed::Fast => "fast",
            AnimationSpeed::Medium => "medium",
            AnimationSpeed::Slow => "slow",
        }
    }
}

impl fmt::Display for AnimationSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AnimationSpeed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "very-fast" | "veryfast" => Ok(AnimationSpeed::VeryFast),
            "fast" => Ok(AnimationSpeed::Fast),
            "medium" => Ok(AnimationSpeed::Medium),
            "slow" => Ok(AnimationSpeed::Slow),
            other => Err(format!("unknown animation speed '{}' (very-fast, fast, medium, slow)", other)),
        }
    }
}

/// A running animation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationSession {
    pub id:        u64,
    pub speed:     AnimationSpeed,
    pub direction: Direction,
    pub interval:  Duration,
    /// Signed Z step: the base step, negated for a rightward animation
    pub step:      f64,
}

impl AnimationSession {
    pub fn new(id: u64, speed: AnimationSpeed, direction: Direction, config: &AnimationConfig) -> Self {
        let step = if direction == Direction::Right {
            -config.base_step
        } else {
            config.base_step
        };
        AnimationSession {
            id,
            speed,
            direction,
            interval: config.timings.interval(speed),
            step,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn right_flips_the_step() {
        let cfg = AnimationConfig::default();
        let right = AnimationSession::new(1, AnimationSpeed::Fast, Direction::Right, &cfg);
        let left = AnimationSession::new(2, AnimationSpeed::Fast, Direction::Left, &cfg);
        assert_eq!(right.step, -1.0);
        assert_eq!(left.step, 1.0);
        assert_eq!(right.interval, Duration::from_millis(20));
    }

    #[test]
    fn parse_speed_names() {
        assert_eq!("very-fast".parse::<AnimationSpeed>(), Ok(AnimationSpeed::VeryFast));
        assert_eq!("Very_Fast".parse::<AnimationSpeed>(), Ok(AnimationSpeed::VeryFast));
        assert_eq!("slow".parse::<AnimationSpeed>(), Ok(AnimationSpeed::Slow));
        assert!("warp".parse::<AnimationSpeed>().is_err());
        for s in AnimationSpeed::ALL {
            assert_eq!(s.to_string().parse::<AnimationSpeed>(), Ok(s));
        }
    }
}
