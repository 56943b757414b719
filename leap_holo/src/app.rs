//! Top-level application wiring.
//!
//! [`ControlThread`] owns the `OrientationController` and is the only place
//! orientation state changes.  Every producer (pointer sampler, hand source,
//! animation ticker, the window) talks to it through [`Command`]s, and it
//! talks back to the window through [`RenderUpdate`]s.

use std::io;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context};
use holo_orient::{
    AnimationSpeed, ControlConfig, Direction, HandFrame, ManipulationDelta, ManipulationDispatcher,
    ManipulationEvent, OrientationController, Panel, PanelSink, PanelView, Permissions,
    PointerSample,
};
use tracing::{debug, error, info, trace, warn};

use crate::animation::AnimationTicker;
use crate::input::{spawn_source, PointerSampler, ProducerGuard, SharedCursor};
use crate::visualizer::Visualizer;

// ════════════════════════════════════════════════════════════════════════════
// Commands and render updates
// ════════════════════════════════════════════════════════════════════════════

/// Everything the control thread can be asked to do.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Periodic pointer position.
    Sample(PointerSample),
    /// Primary pointer button pressed / released.
    Button { pressed: bool },
    /// One skeletal frame from the hand sensor.
    Hands(HandFrame),
    Manipulation(ManipulationEvent),
    /// Mouse wheel delta (positive = scrolled up).
    Wheel(f64),
    StartAnimation { speed: AnimationSpeed, direction: Direction },
    StopAnimation,
    AnimationTick { session: u64 },
    /// Re-send the current view to every panel.
    Refresh,
    Shutdown,
}

/// State pushed from the control thread to the window.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderUpdate {
    Panel { panel: Panel, view: PanelView },
    Permissions(Permissions),
    Animation(Option<(AnimationSpeed, Direction)>),
}

/// Forwards panel broadcasts to the render thread.
pub struct ChannelSink {
    tx: Sender<RenderUpdate>,
}

impl PanelSink for ChannelSink {
    fn apply(&mut self, panel: Panel, view: PanelView) {
        // A closed window just means nobody is watching any more.
        let _ = self.tx.send(RenderUpdate::Panel { panel, view });
    }
}

/// Reports manipulation permissions to the window; the deltas themselves
/// are only logged.
pub struct ChannelDispatcher {
    tx: Sender<RenderUpdate>,
}

impl ManipulationDispatcher for ChannelDispatcher {
    fn pan(&mut self, delta: &ManipulationDelta) {
        trace!(contacts = delta.contacts.len(), "pan");
    }

    fn scale(&mut self, delta: &ManipulationDelta) {
        trace!(scale = ?delta.scale, "scale");
    }

    fn rotate(&mut self, delta: &ManipulationDelta) {
        trace!(rotation = delta.rotation_deg, "rotate");
    }

    fn permissions_changed(&mut self, permissions: Permissions) {
        debug!(?permissions, "manipulation permissions");
        let _ = self.tx.send(RenderUpdate::Permissions(permissions));
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ControlThread
// ════════════════════════════════════════════════════════════════════════════

pub type Controller = OrientationController<ChannelSink, ChannelDispatcher>;

pub struct ControlThread {
    controller: Controller,
    rx:         Receiver<Command>,
    /// Handed to tickers so they can feed this same queue.
    tx:         Sender<Command>,
    ticker:     Option<(u64, ProducerGuard)>,
    render:     Sender<RenderUpdate>,
}

impl ControlThread {
    /// Create the control thread state and the sender producers use.
    pub fn new(config: ControlConfig, render: Sender<RenderUpdate>) -> (Self, Sender<Command>) {
        let (tx, rx) = mpsc::channel();
        let controller = OrientationController::new(
            config,
            ChannelSink { tx: render.clone() },
            ChannelDispatcher { tx: render.clone() },
        );
        let thread = ControlThread { controller, rx, tx: tx.clone(), ticker: None, render };
        (thread, tx)
    }

    pub fn controller(&self) -> &Controller { &self.controller }

    /// Session id of the running ticker thread, if any.
    pub fn ticker_session(&self) -> Option<u64> {
        self.ticker.as_ref().map(|(id, _)| *id)
    }

    /// Apply one command.  Returns `false` on shutdown.
    pub fn handle(&mut self, command: Command) -> bool {
        let result = match command {
            Command::Sample(sample) => self.controller.on_sample(sample),
            Command::Button { pressed } => {
                self.controller.on_pointer_button(pressed);
                Ok(())
            }
            Command::Hands(frame) => self.controller.on_hands(frame),
            Command::Manipulation(event) => self.controller.on_manipulation(event).map(drop),
            Command::Wheel(delta) => self.controller.on_wheel(delta).map(drop),
            Command::StartAnimation { speed, direction } => {
                self.controller.start_animation(speed, direction).map(drop)
            }
            Command::StopAnimation => {
                self.controller.stop_animation();
                Ok(())
            }
            Command::AnimationTick { session } => self.controller.on_animation_tick(session).map(drop),
            Command::Refresh => {
                self.controller.broadcast();
                Ok(())
            }
            Command::Shutdown => {
                self.ticker = None;
                return false;
            }
        };

        if let Err(e) = result {
            warn!(error = %e, "command rejected");
        }
        self.sync_ticker();
        true
    }

    /// Keep exactly one ticker thread per live animation session.
    fn sync_ticker(&mut self) {
        let live = self.controller.animation();
        if live.map(|s| s.id) == self.ticker_session() {
            return;
        }

        // Dropping the guard joins the old ticker.
        self.ticker = None;
        if let Some(session) = live {
            match spawn_source(AnimationTicker::new(&session), self.tx.clone()) {
                Ok(guard) => self.ticker = Some((session.id, guard)),
                Err(e) => {
                    error!(error = %e, "failed to start animation ticker");
                    self.controller.stop_animation();
                }
            }
        }
        let state = self.controller.animation().map(|s| (s.speed, s.direction));
        let _ = self.render.send(RenderUpdate::Animation(state));
    }

    /// Consume commands in arrival order until `Shutdown`.
    pub fn run(mut self) {
        info!("control thread running");
        while let Ok(command) = self.rx.recv() {
            if !self.handle(command) {
                break;
            }
        }
        info!("control thread stopped");
    }

    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new().name("control".to_string()).spawn(move || self.run())
    }

    /// Spawn and wrap the thread in a [`ControlGuard`].
    pub fn start(self) -> io::Result<ControlGuard> {
        let commands = self.tx.clone();
        let handle = self.spawn()?;
        Ok(ControlGuard { commands, handle: Some(handle) })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ControlGuard
// ════════════════════════════════════════════════════════════════════════════

/// Owns the running control thread.  The thread holds a sender to its own
/// queue, so it only exits on `Shutdown`; the guard sends it and joins,
/// either explicitly through [`shutdown`](Self::shutdown) or on drop.
pub struct ControlGuard {
    commands: Sender<Command>,
    handle:   Option<JoinHandle<()>>,
}

impl ControlGuard {
    pub fn commands(&self) -> Sender<Command> {
        self.commands.clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }

    pub fn shutdown(mut self) -> anyhow::Result<()> {
        self.stop()
    }

    fn stop(&mut self) -> anyhow::Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        let _ = self.commands.send(Command::Shutdown);
        handle.join().map_err(|_| anyhow!("control thread panicked"))
    }
}

impl Drop for ControlGuard {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!(error = %e, "control thread did not stop cleanly");
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Which producer drives rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    /// Mouse drag in the window.
    Pointer,
    /// LeapMotion hands (`leap` feature).
    Sensor,
}

/// Configuration for the full application.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub control:   ControlConfig,
    pub mode:      InputMode,
    /// Animation to start with, if any.
    pub animation: Option<(AnimationSpeed, Direction)>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig { control: ControlConfig::default(), mode: InputMode::Pointer, animation: None }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the main application loop
// ════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "leap")]
fn spawn_sensor(cfg: &AppConfig, tx: Sender<Command>) -> anyhow::Result<ProducerGuard> {
    let source = crate::input::LeapHandSource { grab_threshold: cfg.control.sensor.grab_threshold };
    spawn_source(source, tx).context("starting LeapMotion source")
}

#[cfg(not(feature = "leap"))]
fn spawn_sensor(_cfg: &AppConfig, _tx: Sender<Command>) -> anyhow::Result<ProducerGuard> {
    Err(anyhow!("sensor mode needs a build with `--features leap`"))
}

/// Run the full application.
///
/// Starts the control thread, the producer for the chosen input mode and the
/// window, then drives the render loop at ~60 fps until the window closes.
pub fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let (render_tx, render_rx) = mpsc::channel();
    let (control, commands) = ControlThread::new(cfg.control.clone(), render_tx);
    // Any early return below drops the guard, which stops the thread.
    let control = control.start().context("starting control thread")?;

    let cursor = SharedCursor::default();
    let producer = match cfg.mode {
        InputMode::Pointer => {
            let sampler = PointerSampler::new(cursor.clone(), cfg.control.pointer.sample_period());
            spawn_source(sampler, commands.clone()).context("starting pointer sampler")?
        }
        InputMode::Sensor => spawn_sensor(&cfg, commands.clone())?,
    };
    info!(mode = ?cfg.mode, producer = producer.name(), "input ready");

    let mut vis = Visualizer::new(commands.clone(), cursor, cfg.mode)?;

    let _ = commands.send(Command::Refresh);
    if let Some((speed, direction)) = cfg.animation {
        let _ = commands.send(Command::StartAnimation { speed, direction });
    }

    'frames: while vis.is_open() {
        if !vis.poll_input() {
            break;
        }

        loop {
            match render_rx.try_recv() {
                Ok(update) => vis.apply(update),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("control thread went away");
                    break 'frames;
                }
            }
        }

        vis.render();
    }

    drop(producer);
    control.shutdown()
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn control() -> (ControlThread, Receiver<RenderUpdate>) {
        let (render_tx, render_rx) = mpsc::channel();
        let (thread, _tx) = ControlThread::new(ControlConfig::default(), render_tx);
        (thread, render_rx)
    }

    fn panel_updates(rx: &Receiver<RenderUpdate>) -> Vec<PanelView> {
        rx.try_iter()
            .filter_map(|u| match u {
                RenderUpdate::Panel { view, .. } => Some(view),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn drag_reaches_all_panels() {
        let (mut c, rx) = control();
        c.handle(Command::Button { pressed: true });
        c.handle(Command::Sample(PointerSample::new(0.0, 0.0)));
        c.handle(Command::Sample(PointerSample::new(20.0, 0.0)));
        let views = panel_updates(&rx);
        assert_eq!(views.len(), 8);
        assert_eq!(views.last().map(|v| v.orientation.z()), Some(2.0));
    }

    #[test]
    fn invalid_command_is_dropped_not_fatal() {
        let (mut c, _rx) = control();
        assert!(c.handle(Command::Wheel(f64::NAN)));
        assert_eq!(c.controller().zoom(), 1.0);
    }

    #[test]
    fn animation_owns_one_ticker() {
        let (mut c, rx) = control();
        c.handle(Command::StartAnimation { speed: AnimationSpeed::Slow, direction: Direction::Left });
        let first = c.ticker_session();
        assert!(first.is_some());

        c.handle(Command::StartAnimation { speed: AnimationSpeed::Fast, direction: Direction::Right });
        let second = c.ticker_session();
        assert!(second.is_some());
        assert_ne!(first, second);

        c.handle(Command::StopAnimation);
        assert_eq!(c.ticker_session(), None);

        let states: Vec<_> = rx
            .try_iter()
            .filter_map(|u| match u {
                RenderUpdate::Animation(a) => Some(a),
                _ => None,
            })
            .collect();
        assert_eq!(
            states,
            vec![
                Some((AnimationSpeed::Slow, Direction::Left)),
                Some((AnimationSpeed::Fast, Direction::Right)),
                None,
            ]
        );
    }

    #[test]
    fn manual_input_stops_ticker() {
        let (mut c, _rx) = control();
        c.handle(Command::StartAnimation { speed: AnimationSpeed::Slow, direction: Direction::Left });
        c.handle(Command::Button { pressed: true });
        c.handle(Command::Sample(PointerSample::new(0.0, 0.0)));
        c.handle(Command::Sample(PointerSample::new(0.0, 10.0)));
        assert!(c.controller().animation().is_none());
        assert_eq!(c.ticker_session(), None);
    }

    #[test]
    fn manipulation_permissions_are_reported() {
        let (mut c, rx) = control();
        c.handle(Command::Manipulation(ManipulationEvent::Started));
        c.handle(Command::Manipulation(ManipulationEvent::Delta(ManipulationDelta::new(
            (0.9, 0.9),
            0.0,
            vec![(0.0, 0.0), (100.0, 0.0)],
        ))));
        let perms: Vec<_> = rx
            .try_iter()
            .filter_map(|u| match u {
                RenderUpdate::Permissions(p) => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(perms, vec![Permissions { pan: true, scale: true, rotate: false }]);
    }

    #[test]
    fn spawned_thread_processes_queue_in_order() {
        let (render_tx, render_rx) = mpsc::channel();
        let (thread, tx) = ControlThread::new(ControlConfig::default(), render_tx);
        let handle = thread.spawn().unwrap();

        tx.send(Command::Button { pressed: true }).unwrap();
        for x in [100.0, 115.0, 130.0, 145.0, 150.0] {
            tx.send(Command::Sample(PointerSample::new(x, 0.0))).unwrap();
        }
        tx.send(Command::Shutdown).unwrap();
        handle.join().unwrap();

        let views = panel_updates(&render_rx);
        assert_eq!(views.len(), 20);
        let zs: Vec<f64> = views.chunks(4).map(|c| c[0].orientation.z()).collect();
        assert_eq!(zs, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn dropped_guard_stops_control_thread() {
        let (render_tx, render_rx) = mpsc::channel();
        let (thread, _tx) = ControlThread::new(ControlConfig::default(), render_tx);
        let guard = thread.start().unwrap();
        guard.commands().send(Command::Refresh).unwrap();
        assert!(guard.is_running());
        // early-exit path: no explicit Shutdown
        drop(guard);
        // the thread is gone, so nothing holds the render sender any more
        assert_eq!(panel_updates(&render_rx).len(), 4);
        assert!(matches!(render_rx.try_recv(), Err(TryRecvError::Disconnected)));
    }

    #[test]
    fn guard_shutdown_joins() {
        let (render_tx, _render_rx) = mpsc::channel();
        let (thread, _tx) = ControlThread::new(ControlConfig::default(), render_tx);
        let guard = thread.start().unwrap();
        assert!(guard.shutdown().is_ok());
    }

    #[test]
    fn ticks_flow_back_through_queue() {
        let mut cfg = ControlConfig::default();
        cfg.animation.advance_on_tick = true;
        let (render_tx, render_rx) = mpsc::channel();
        let (thread, tx) = ControlThread::new(cfg, render_tx);
        let handle = thread.spawn().unwrap();

        tx.send(Command::StartAnimation { speed: AnimationSpeed::VeryFast, direction: Direction::Left })
            .unwrap();
        std::thread::sleep(Duration::from_millis(200));
        tx.send(Command::Shutdown).unwrap();
        handle.join().unwrap();

        let last = panel_updates(&render_rx).last().map(|v| v.orientation.z()).unwrap_or(0.0);
        assert!(last > 0.0, "animation never advanced");
    }
}
