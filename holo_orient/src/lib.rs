//! # holo_orient
//!
//! Orientation controller for a four-panel "hologram" pyramid display.
//!
//! A stream of pointer positions (mouse) or tracked hand positions (depth
//! sensor) is turned into movement directions, and those into a rotation of
//! the displayed model.  The same model is shown on four panels (Top, Bottom,
//! Left, Right), so every change is broadcast to all four at once.
//!
//! ## Pipeline
//!
//! ```text
//!  PointerSample ─┐                      ┌──────────────┐
//!                 ├─▶ AxisTracker ──▶ ───▶│ Orientation  │──▶ PanelSink × 4
//!  HandFrame ─────┘  (classify)          │  x / y / z   │
//!   (active hand)                        └──────────────┘
//!                                               ▲
//!  AnimationSession tick ───────────────────────┘
//!
//!  ManipulationEvent ──▶ GestureRecognizer ──▶ Permissions ──▶ ManipulationDispatcher
//! ```
//!
//! Everything in this crate is synchronous and single-owner: the
//! [`OrientationController`] is meant to live on one control thread and be
//! fed by a command queue (see the `leap_holo` crate).
//!
//! ## Quick start
//!
//! ```rust
//! use holo_orient::{ControlConfig, OrientationController, PointerSample, RecordingSink, NullDispatcher};
//!
//! let mut ctl = OrientationController::new(ControlConfig::default(), RecordingSink::default(), NullDispatcher);
//! ctl.on_pointer_button(true);
//! for x in [100.0, 115.0, 130.0, 145.0, 150.0] {
//!     ctl.on_sample(PointerSample::new(x, 0.0)).unwrap();
//! }
//! assert_eq!(ctl.orientation().z(), 5.0);
//! ```

pub mod animation;
pub mod config;
pub mod controller;
pub mod direction;
pub mod gesture;
pub mod hand;
pub mod movement;
pub mod orientation;

pub use animation::{AnimationSession, AnimationSpeed};
pub use config::{
    AnimationConfig, AnimationTimings, ControlConfig, GestureConfig, PointerConfig, SensorConfig,
    ZoomConfig,
};
pub use controller::{
    InputSource, ManipulationDispatcher, NullDispatcher, OrientationController, Panel, PanelSink,
    PanelView, RecordingSink,
};
pub use direction::{classify, is_static, Axis, Classified, Direction};
pub use gesture::{
    GestureClass, GesturePhase, GestureRecognizer, ManipulationDelta, ManipulationEvent,
    Permissions,
};
pub use hand::{select_active_hand, Hand, HandFrame, HandPoint};
pub use movement::{apply_step, AxisTracker, InputProfile, MovementTracker, PointerSample, TrackOutcome};
pub use orientation::{wrap_angle, Orientation};

// ════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════

/// Errors surfaced by the controller and its configuration layer.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// A sample carried a non-finite coordinate or parameter.
    #[error("invalid sample: {field} = {value}")]
    InvalidSample { field: &'static str, value: f64 },

    /// Configuration value out of range.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ControlError>;

/// Reject NaN and infinities before they can reach the orientation state.
pub(crate) fn ensure_finite(field: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ControlError::InvalidSample { field, value })
    }
}
