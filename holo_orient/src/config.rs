//! Tunable parameters for the controller.
//!
//! Every threshold and step size is a field here rather than a literal in
//! the code.  The defaults match the four-panel display rig the controller
//! was tuned on; a TOML file can override any subset of them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::animation::AnimationSpeed;
use crate::movement::InputProfile;
use crate::{ControlError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ControlConfig {
    /// Mouse / manual pointer input
    pub pointer:   PointerConfig,
    /// Depth-sensor hand input
    pub sensor:    SensorConfig,
    /// Multi-point manipulation classification
    pub gesture:   GestureConfig,
    /// Autonomous turntable animation
    pub animation: AnimationConfig,
    /// Mouse-wheel zoom
    pub zoom:      ZoomConfig,
}

/// Pointer (manual) input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerConfig {
    /// Travel (pointer units) per qualifying step
    pub trigger: f64,
    /// Degrees applied per step
    pub step_deg: f64,
    /// Cap on steps produced by a single sample (unlimited when absent)
    pub max_steps_per_sample: Option<u32>,
    /// Half-width of the band around the anchor in which the pointer is "at rest"
    pub static_band: f64,
    /// Send the resting axis back home instead of just refreshing the panels
    pub home_on_rest: bool,
    /// Delay between pointer samples (ms)
    pub sample_period_ms: u64,
}

/// Hand-tracking input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub trigger: f64,
    pub step_deg: f64,
    pub max_steps_per_sample: Option<u32>,
    /// A sub-threshold sample on one axis clears pending travel on the other
    pub cross_axis_reset: bool,
    /// Grab strength (0–1) above which a hand counts as closed
    pub grab_threshold: f64,
}

/// Manipulation (pinch / twist) classification thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub pixels_per_cm: f64,
    pub scale_trigger: f64,
    pub rotation_trigger_deg: f64,
    pub min_finger_distance_cm: f64,
}

/// Tick intervals for each [`AnimationSpeed`], in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationTimings {
    pub very_fast_ms: u64,
    pub fast_ms:      u64,
    pub medium_ms:    u64,
    pub slow_ms:      u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Unsigned step; its sign is set by the animation direction
    pub base_step: f64,
    /// Advance Z by the step every tick (continuous spin) instead of
    /// re-broadcasting the angle set at start
    pub advance_on_tick: bool,
    pub timings: AnimationTimings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub step: f64,
    pub min:  f64,
    pub max:  f64,
}

// ════════════════════════════════════════════════════════════════════════════
// Defaults
// ════════════════════════════════════════════════════════════════════════════

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            trigger: 10.0,
            step_deg: 1.0,
            max_steps_per_sample: None,
            static_band: 10.0,
            home_on_rest: false,
            sample_period_ms: 5,
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            trigger: 10.0,
            step_deg: 15.0,
            max_steps_per_sample: Some(1),
            cross_axis_reset: true,
            grab_threshold: 0.8,
        }
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pixels_per_cm: 38.0,
            scale_trigger: 0.05,
            rotation_trigger_deg: 10.0,
            min_finger_distance_cm: 2.0,
        }
    }
}

impl Default for AnimationTimings {
    fn default() -> Self {
        Self { very_fast_ms: 5, fast_ms: 20, medium_ms: 50, slow_ms: 250 }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            base_step: 1.0,
            advance_on_tick: false,
            timings: AnimationTimings::default(),
        }
    }
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self { step: 0.01, min: 0.25, max: 4.0 }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Accessors
// ════════════════════════════════════════════════════════════════════════════

impl PointerConfig {
    pub fn profile(&self) -> InputProfile {
        InputProfile {
            trigger: self.trigger,
            step_deg: self.step_deg,
            max_steps_per_sample: self.max_steps_per_sample,
        }
    }

    pub fn sample_period(&self) -> Duration {
        Duration::from_millis(self.sample_period_ms)
    }
}

impl SensorConfig {
    pub fn profile(&self) -> InputProfile {
        InputProfile {
            trigger: self.trigger,
            step_deg: self.step_deg,
            max_steps_per_sample: self.max_steps_per_sample,
        }
    }
}

impl AnimationTimings {
    pub fn interval(&self, speed: AnimationSpeed) -> Duration {
        let ms = match speed {
            AnimationSpeed::VeryFast => self.very_fast_ms,
            AnimationSpeed::Fast => self.fast_ms,
            AnimationSpeed::Medium => self.medium_ms,
            AnimationSpeed::Slow => self.slow_ms,
        };
        Duration::from_millis(ms)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Validation and persistence
// ════════════════════════════════════════════════════════════════════════════

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ControlError::Config(format!("{} must be a positive number, got {}", name, value)))
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ControlError::Config(format!("{} must be >= 0, got {}", name, value)))
    }
}

impl ControlConfig {
    /// Check every field is in range.  Returns the first offending field.
    pub fn validate(&self) -> Result<()> {
        let p = &self.pointer;
        positive("pointer.trigger", p.trigger)?;
        positive("pointer.step_deg", p.step_deg)?;
        non_negative("pointer.static_band", p.static_band)?;
        if !(1..=10).contains(&p.sample_period_ms) {
            return Err(ControlError::Config(format!(
                "pointer.sample_period_ms must be in [1, 10], got {}", p.sample_period_ms
            )));
        }

        let s = &self.sensor;
        positive("sensor.trigger", s.trigger)?;
        positive("sensor.step_deg", s.step_deg)?;
        if !(0.0..=1.0).contains(&s.grab_threshold) {
            return Err(ControlError::Config(format!(
                "sensor.grab_threshold must be in [0, 1], got {}", s.grab_threshold
            )));
        }

        for cap in [p.max_steps_per_sample, s.max_steps_per_sample].into_iter().flatten() {
            if cap == 0 {
                return Err(ControlError::Config("max_steps_per_sample must be > 0".to_string()));
            }
        }

        let g = &self.gesture;
        positive("gesture.pixels_per_cm", g.pixels_per_cm)?;
        non_negative("gesture.scale_trigger", g.scale_trigger)?;
        non_negative("gesture.rotation_trigger_deg", g.rotation_trigger_deg)?;
        non_negative("gesture.min_finger_distance_cm", g.min_finger_distance_cm)?;

        let a = &self.animation;
        positive("animation.base_step", a.base_step)?;
        let t = &a.timings;
        if [t.very_fast_ms, t.fast_ms, t.medium_ms, t.slow_ms].contains(&0) {
            return Err(ControlError::Config("animation timings must be > 0 ms".to_string()));
        }

        let z = &self.zoom;
        positive("zoom.step", z.step)?;
        positive("zoom.min", z.min)?;
        positive("zoom.max", z.max)?;
        if z.min > z.max {
            return Err(ControlError::Config(format!(
                "zoom.min ({}) must not exceed zoom.max ({})", z.min, z.max
            )));
        }
        Ok(())
    }

    /// Load and validate a TOML file.  Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from [`Self::default_path`] if it exists, defaults otherwise.
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_toml()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("leap_holo").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("leap_holo.toml"))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ControlError::Config(e.to_string()))
    }
}
