//! # leap_holo
//!
//! Four-panel hologram viewer driven by mouse or LeapMotion hands, built on
//! the [`holo_orient`] controller.
//!
//! ## Input → Action mapping
//!
//! | Input | Mode | Action |
//! |---|---|---|
//! | Left-drag horizontally | pointer | Turn the model around Z, 1° per 10 px |
//! | Left-drag vertically | pointer | Tilt the model around X, 1° per 10 px |
//! | Closed hand, moved | sensor | Same, 15° per step (hand nearer the sensor wins) |
//! | Wheel | both | Zoom in (down) / out (up) |
//! | Right-drag (+ `Z`/`X`, wheel) | both | Simulated two-finger manipulation |
//! | `1`–`4` (+`Shift`) | both | Start turntable animation, very-fast … slow (rightward) |
//! | `0` | both | Stop animation |
//! | `A` / `D` | both | Shrink / grow the panel grid |
//! | `Q` / `Esc` | both | Quit |
//!
//! ## Threads
//!
//! * **control**: owns the controller, applies [`app::Command`]s in order.
//! * **pointer-sampler** / **leap-hands**: one input producer.
//! * **animation-ticker**: only while an animation runs.
//! * main: the window: polls input, draws the four panels.
//!
//! ## Feature flags
//!
//! * (default): **Pointer mode** only: the mouse drives rotation.
//! * `leap`: **Sensor mode** available: polls a real LeapMotion controller via LeapC.

pub mod animation;
pub mod app;
pub mod canvas;
pub mod input;
pub mod visualizer;
