//! Software-rendered four-panel viewer using `minifb`.
//!
//! Layout (the pyramid sits on the centre cell):
//!
//! ```text
//! ┌─────────┬─────────┬─────────┐
//! │         │   TOP   │         │
//! │         │ (180°)  │         │
//! ├─────────┼─────────┼─────────┤
//! │  LEFT   │         │  RIGHT  │
//! │ (90°)   │         │ (-90°)  │
//! ├─────────┼─────────┼─────────┤
//! │         │ BOTTOM  │         │
//! │         │  (0°)   │         │
//! └─────────┴─────────┴─────────┘
//!   status bar
//! ```
//!
//! Each panel draws the same wireframe model from its own `PanelView`, then
//! turns the picture so its base faces the centre.

use std::f32::consts::{FRAC_PI_2, PI};
use std::sync::mpsc::Sender;

use anyhow::Context;
use glam::{Mat2, Mat3, Vec2, Vec3};
use holo_orient::{
    AnimationSpeed, Direction, ManipulationDelta, ManipulationEvent, Panel, PanelView, Permissions,
    PointerSample,
};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};
use tracing::{debug, warn};

use crate::app::{Command, InputMode, RenderUpdate};
use crate::canvas::{text_width, Canvas};
use crate::input::SharedCursor;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:       usize = 720;
pub const GRID_AREA:   usize = WIN_W;
const STATUS_H:        usize = 44;
pub const WIN_H:       usize = GRID_AREA + STATUS_H;
const GRID_STEP:       isize = 10;
const BG_COLOR:        u32   = 0xFF000000;
const CELL_COLOR:      u32   = 0xFF161616;
const CELL_EDGE:       u32   = 0xFF303030;
const MODEL_COLOR:     u32   = 0xFF66DDFF;
const NOSE_COLOR:      u32   = 0xFFFFB040;
const STATUS_BG:       u32   = 0xFF0F3460;
const TEXT_COLOR:      u32   = 0xFFEEEEEE;
const LEGEND_COLOR:    u32   = 0xFF888888;
/// Camera looks slightly down on the model so turntable motion reads.
const VIEW_TILT:       f32   = 0.35;
/// Model radius as a fraction of the cell size, at zoom 1.
const MODEL_FILL:      f32   = 0.28;
const MANIP_ROTATE:    f64   = 2.0;
const MANIP_SCALE:     f64   = 0.02;

// ════════════════════════════════════════════════════════════════════════════
// Geometry
// ════════════════════════════════════════════════════════════════════════════

/// Unit cube plus a "nose" segment sticking out of the +Y face.
const VERTICES: [[f32; 3]; 10] = [
    [-1.0, -1.0, -1.0],
    [ 1.0, -1.0, -1.0],
    [ 1.0,  1.0, -1.0],
    [-1.0,  1.0, -1.0],
    [-1.0, -1.0,  1.0],
    [ 1.0, -1.0,  1.0],
    [ 1.0,  1.0,  1.0],
    [-1.0,  1.0,  1.0],
    [ 0.0,  1.0,  0.0],
    [ 0.0,  1.7,  0.0],
];

const EDGES: [(usize, usize); 12] = [
    (0, 1), (1, 2), (2, 3), (3, 0),
    (4, 5), (5, 6), (6, 7), (7, 4),
    (0, 4), (1, 5), (2, 6), (3, 7),
];

const NOSE: (usize, usize) = (8, 9);

/// In-plane rotation that turns a panel's picture to face the centre.
pub fn panel_angle(panel: Panel) -> f32 {
    match panel {
        Panel::Bottom => 0.0,
        Panel::Top => PI,
        Panel::Left => FRAC_PI_2,
        Panel::Right => -FRAC_PI_2,
    }
}

/// Top-left corner and side of `panel`'s cell for a centred grid of side
/// `grid` inside the grid area.
pub fn panel_cell(panel: Panel, grid: usize) -> (usize, usize, usize) {
    let cell = grid / 3;
    let origin = (GRID_AREA - grid.min(GRID_AREA)) / 2;
    let (col, row) = match panel {
        Panel::Top => (1, 0),
        Panel::Left => (0, 1),
        Panel::Right => (2, 1),
        Panel::Bottom => (1, 2),
    };
    (origin + col * cell, origin + row * cell, cell)
}

/// Resize the grid by `delta` pixels, kept within [¼ window, window].
pub fn resize_grid(grid: usize, delta: isize) -> usize {
    let min = GRID_AREA / 4;
    let next = grid as isize + delta;
    (next.max(min as isize) as usize).min(GRID_AREA)
}

/// Model rotation for an orientation: X first, then Y, then Z.
pub fn model_rotation(view: &PanelView) -> Mat3 {
    let [x, y, z] = view.orientation.radians();
    Mat3::from_rotation_z(z as f32) * Mat3::from_rotation_y(y as f32) * Mat3::from_rotation_x(x as f32)
}

/// Project every model vertex into window coordinates for one panel.
pub fn project(view: &PanelView, panel: Panel, center: Vec2, cell: f32) -> Vec<Vec2> {
    let camera = Mat3::from_rotation_x(VIEW_TILT) * model_rotation(view);
    let turn = Mat2::from_angle(panel_angle(panel));
    let radius = cell * MODEL_FILL * view.zoom as f32;
    VERTICES
        .iter()
        .map(|v| {
            let p = camera * Vec3::from_array(*v);
            // Looking along +Y with Z up; screen Y grows downward.
            let flat = Vec2::new(p.x, -p.z) * radius;
            center + turn * flat
        })
        .collect()
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

struct ManipulationSim {
    origin: (f64, f64),
    last:   (f64, f64),
}

pub struct Visualizer {
    window:      Window,
    canvas:      Canvas,
    commands:    Sender<Command>,
    cursor:      SharedCursor,
    mode:        InputMode,

    // ── display state (from the control thread) ─────────────────────────
    grid:        usize,
    views:       [PanelView; 4],
    permissions: Permissions,
    animation:   Option<(AnimationSpeed, Direction)>,

    // ── input edge tracking ──────────────────────────────────────────────
    left_down:   bool,
    manip:       Option<ManipulationSim>,
}

impl Visualizer {
    pub fn new(commands: Sender<Command>, cursor: SharedCursor, mode: InputMode) -> anyhow::Result<Self> {
        let mut window = Window::new(
            "Leap Holo — four-panel viewer",
            WIN_W,
            WIN_H,
            WindowOptions { resize: false, ..WindowOptions::default() },
        )
        .context("opening viewer window")?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        let neutral = PanelView { orientation: Default::default(), zoom: 1.0 };
        Ok(Visualizer {
            window,
            canvas: Canvas::new(WIN_W, WIN_H, BG_COLOR),
            commands,
            cursor,
            mode,
            grid: GRID_AREA,
            views: [neutral; 4],
            permissions: Permissions::NONE,
            animation: None,
            left_down: false,
            manip: None,
        })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    pub fn apply(&mut self, update: RenderUpdate) {
        match update {
            RenderUpdate::Panel { panel, view } => self.views[panel.index()] = view,
            RenderUpdate::Permissions(p) => self.permissions = p,
            RenderUpdate::Animation(a) => self.animation = a,
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            warn!("control queue closed");
        }
    }

    /// Poll keyboard and mouse, forwarding input to the control queue.
    /// Returns false when the user asked to quit.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() {
            return false;
        }
        if self.window.is_key_pressed(Key::Q, KeyRepeat::No)
            || self.window.is_key_pressed(Key::Escape, KeyRepeat::No)
        {
            return false;
        }

        let shift = self.window.is_key_down(Key::LeftShift) || self.window.is_key_down(Key::RightShift);

        // ── grid size ────────────────────────────────────────────────────
        if self.window.is_key_pressed(Key::A, KeyRepeat::Yes) {
            self.grid = resize_grid(self.grid, -GRID_STEP);
        }
        if self.window.is_key_pressed(Key::D, KeyRepeat::Yes) {
            self.grid = resize_grid(self.grid, GRID_STEP);
        }

        // ── animation keys ───────────────────────────────────────────────
        let direction = if shift { Direction::Right } else { Direction::Left };
        for (key, speed) in [Key::Key1, Key::Key2, Key::Key3, Key::Key4].into_iter().zip(AnimationSpeed::ALL) {
            if self.window.is_key_pressed(key, KeyRepeat::No) {
                self.send(Command::StartAnimation { speed, direction });
            }
        }
        if self.window.is_key_pressed(Key::Key0, KeyRepeat::No) {
            self.send(Command::StopAnimation);
        }

        // ── pointer ──────────────────────────────────────────────────────
        let pos = self
            .window
            .get_mouse_pos(MouseMode::Discard)
            .map(|(x, y)| (x as f64, y as f64));
        let wheel = self.window.get_scroll_wheel().map_or(0.0, |(_, y)| y as f64);

        if self.mode == InputMode::Pointer {
            if let Some((x, y)) = pos {
                self.cursor.publish(PointerSample::new(x, -y));
            }
            let down = self.window.get_mouse_down(MouseButton::Left);
            if down != self.left_down {
                self.left_down = down;
                self.send(Command::Button { pressed: down });
            }
        }

        // ── manipulation simulation (right button) ───────────────────────
        let right = self.window.get_mouse_down(MouseButton::Right);
        let wheel_used = self.simulate_manipulation(right, pos, wheel);

        if !wheel_used && wheel != 0.0 {
            self.send(Command::Wheel(wheel));
        }
        true
    }

    /// Two contacts (press point and cursor); the wheel scales, Z/X rotate.
    /// Returns true when the wheel was consumed.
    fn simulate_manipulation(&mut self, held: bool, pos: Option<(f64, f64)>, wheel: f64) -> bool {
        let Some(mut sim) = self.manip.take() else {
            if let (true, Some(p)) = (held, pos) {
                debug!("manipulation simulation started");
                self.manip = Some(ManipulationSim { origin: p, last: p });
                self.send(Command::Manipulation(ManipulationEvent::Started));
            }
            return false;
        };

        if !held {
            self.send(Command::Manipulation(ManipulationEvent::Completed));
            return false;
        }

        let cursor = pos.unwrap_or(sim.last);
        let mut rotation = 0.0;
        if self.window.is_key_down(Key::Z) {
            rotation += MANIP_ROTATE;
        }
        if self.window.is_key_down(Key::X) {
            rotation -= MANIP_ROTATE;
        }
        let scale = if wheel > 0.0 {
            1.0 + MANIP_SCALE
        } else if wheel < 0.0 {
            1.0 - MANIP_SCALE
        } else {
            1.0
        };

        if cursor != sim.last || rotation != 0.0 || scale != 1.0 {
            sim.last = cursor;
            let delta = ManipulationDelta::new((scale, scale), rotation, vec![sim.origin, cursor]);
            self.send(Command::Manipulation(ManipulationEvent::Delta(delta)));
        }
        self.manip = Some(sim);
        true
    }

    /// Render one frame.
    pub fn render(&mut self) {
        self.canvas.clear(BG_COLOR);

        for panel in Panel::ALL {
            let (x, y, cell) = panel_cell(panel, self.grid);
            self.canvas.fill_rect(x, y, cell, cell, CELL_COLOR);
            self.canvas.draw_border(x, y, cell, cell, CELL_EDGE);
            self.draw_model(panel, x, y, cell);
        }

        self.draw_status();

        if let Err(e) = self.window.update_with_buffer(&self.canvas.buf, WIN_W, WIN_H) {
            warn!(error = %e, "frame update failed");
        }
    }

    fn draw_model(&mut self, panel: Panel, x: usize, y: usize, cell: usize) {
        let center = Vec2::new((x + cell / 2) as f32, (y + cell / 2) as f32);
        let points = project(&self.views[panel.index()], panel, center, cell as f32);
        let line = |canvas: &mut Canvas, (a, b): (usize, usize), color: u32| {
            let (p, q) = (points[a], points[b]);
            canvas.draw_line(p.x.round() as isize, p.y.round() as isize, q.x.round() as isize, q.y.round() as isize, color);
        };
        for edge in EDGES {
            line(&mut self.canvas, edge, MODEL_COLOR);
        }
        line(&mut self.canvas, NOSE, NOSE_COLOR);
    }

    fn draw_status(&mut self) {
        self.canvas.fill_rect(0, GRID_AREA, WIN_W, STATUS_H, STATUS_BG);

        let view = self.views[Panel::Bottom.index()];
        let flag = |on: bool| if on { "+" } else { "-" };
        let anim = match self.animation {
            Some((speed, direction)) => format!("{} {:?}", speed, direction),
            None => "off".to_string(),
        };
        let status = format!(
            "x {:.0}  z {:.0}  zoom {:.2}  pan{} scale{} rotate{}  anim {}  grid {}",
            view.orientation.x(),
            view.orientation.z(),
            view.zoom,
            flag(self.permissions.pan),
            flag(self.permissions.scale),
            flag(self.permissions.rotate),
            anim,
            self.grid,
        );
        self.canvas.draw_text(&status, 10, GRID_AREA + 8, 2, TEXT_COLOR);

        let legend = match self.mode {
            InputMode::Pointer => "drag=rotate  rmb+z/x/wheel=manipulate  wheel=zoom  1-4 anim (shift=right)  0 stop  a/d grid  q quit",
            InputMode::Sensor => "fist=rotate  rmb+z/x/wheel=manipulate  wheel=zoom  1-4 anim (shift=right)  0 stop  a/d grid  q quit",
        };
        let x = WIN_W.saturating_sub(text_width(legend, 1)) / 2;
        self.canvas.draw_text(legend, x, GRID_AREA + 30, 1, LEGEND_COLOR);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
