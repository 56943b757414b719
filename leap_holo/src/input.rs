//! Input producers: pointer sampling and (with the `leap` feature) the
//! LeapMotion hand source.
//!
//! The public interface is [`Command`] delivered over the control queue.
//! The controller does not need to know which thread a command came from.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use holo_orient::{HandFrame, HandPoint, PointerSample};
use tracing::{debug, warn};

use crate::app::Command;

// ════════════════════════════════════════════════════════════════════════════
// CommandSource: one trait for every producer thread
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can run on its own thread and feed the control queue.
///
/// `run` must check `running` on every iteration and return promptly once
/// it is cleared.
pub trait CommandSource: Send + 'static {
    fn name(&self) -> &'static str;
    fn run(self: Box<Self>, tx: Sender<Command>, running: Arc<AtomicBool>);
}

// ════════════════════════════════════════════════════════════════════════════
// ProducerGuard
// ════════════════════════════════════════════════════════════════════════════

/// Dropping the guard stops the producer and joins its thread.
pub struct ProducerGuard {
    name:    &'static str,
    running: Arc<AtomicBool>,
    handle:  Option<JoinHandle<()>>,
}

impl ProducerGuard {
    pub fn name(&self) -> &'static str { self.name }

    /// True while the producer thread has not returned.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }
}

impl Drop for ProducerGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            if handle.join().is_err() {
                warn!(producer = self.name, "producer thread panicked");
            } else {
                debug!(producer = self.name, "producer stopped");
            }
        }
    }
}

/// Spawn a command source on its own named thread.
pub fn spawn_source<S: CommandSource>(source: S, tx: Sender<Command>) -> io::Result<ProducerGuard> {
    let name = source.name();
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    let handle = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || Box::new(source).run(tx, flag))?;
    debug!(producer = name, "producer started");
    Ok(ProducerGuard { name, running, handle: Some(handle) })
}

/// Sleep for `period`, waking early when the guard stops the producer.
/// Returns `false` once the producer should exit.
pub fn pause(running: &AtomicBool, period: Duration) -> bool {
    let deadline = Instant::now() + period;
    loop {
        if !running.load(Ordering::Acquire) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::park_timeout(deadline - now);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Pointer sampling
// ════════════════════════════════════════════════════════════════════════════

/// Latest cursor position, published by the window thread.
#[derive(Clone, Default)]
pub struct SharedCursor(Arc<Mutex<Option<PointerSample>>>);

impl SharedCursor {
    pub fn publish(&self, sample: PointerSample) {
        if let Ok(mut slot) = self.0.lock() {
            *slot = Some(sample);
        }
    }

    pub fn latest(&self) -> Option<PointerSample> {
        self.0.lock().ok().and_then(|slot| *slot)
    }
}

/// Forwards the latest cursor position to the controller at a fixed period.
pub struct PointerSampler {
    cursor: SharedCursor,
    period: Duration,
}

impl PointerSampler {
    pub fn new(cursor: SharedCursor, period: Duration) -> Self {
        PointerSampler { cursor, period }
    }
}

impl CommandSource for PointerSampler {
    fn name(&self) -> &'static str { "pointer-sampler" }

    fn run(self: Box<Self>, tx: Sender<Command>, running: Arc<AtomicBool>) {
        while pause(&running, self.period) {
            if let Some(sample) = self.cursor.latest() {
                if tx.send(Command::Sample(sample)).is_err() {
                    return;
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Hand frames
// ════════════════════════════════════════════════════════════════════════════

/// One tracked hand as reported by the sensor: position plus grab strength
/// in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackedHand {
    pub point: HandPoint,
    pub grab:  f64,
}

/// Build a [`HandFrame`] from whatever hands the sensor saw.
///
/// A hand counts as closed when its grab strength exceeds `grab_threshold`.
/// When only one hand is visible the missing one is placed behind it and
/// open, so the visible hand is always the active one.  `None` when no hand
/// is visible.
pub fn hand_frame(left: Option<TrackedHand>, right: Option<TrackedHand>, grab_threshold: f64) -> Option<HandFrame> {
    let stand_in = |other: TrackedHand| TrackedHand {
        point: HandPoint::new(other.point.x, other.point.y, other.point.depth - 1.0),
        grab:  0.0,
    };
    let (left, right) = match (left, right) {
        (None, None) => return None,
        (Some(l), Some(r)) => (l, r),
        (Some(l), None) => (l, stand_in(l)),
        (None, Some(r)) => (stand_in(r), r),
    };
    Some(HandFrame {
        left:         left.point,
        right:        right.point,
        left_closed:  left.grab > grab_threshold,
        right_closed: right.grab > grab_threshold,
    })
}

// ════════════════════════════════════════════════════════════════════════════
// LeapHandSource (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Hand source backed by a real LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
/// Palm positions are in millimetres; depth is `-z`, so a hand pushed toward
/// the display is nearer.
#[cfg(feature = "leap")]
pub struct LeapHandSource {
    pub grab_threshold: f64,
}

#[cfg(feature = "leap")]
impl CommandSource for LeapHandSource {
    fn name(&self) -> &'static str { "leap-hands" }

    fn run(self: Box<Self>, tx: Sender<Command>, running: Arc<AtomicBool>) {
        use leaprs::*;
        use tracing::{error, info};

        let mut connection = match Connection::create(ConnectionConfig::default()) {
            Ok(c) => c,
            Err(e) => {
                error!(?e, "failed to create LeapC connection");
                return;
            }
        };
        if let Err(e) = connection.open() {
            error!(?e, "failed to open LeapMotion device");
            return;
        }
        info!("LeapMotion connection open");

        while running.load(Ordering::Acquire) {
            let msg = match connection.poll(100) {
                Ok(m) => m,
                Err(_) => continue,
            };

            if let Event::Tracking(frame) = msg.event() {
                let mut left = None;
                let mut right = None;
                for hand in frame.hands() {
                    let p = hand.palm().position();
                    let tracked = TrackedHand {
                        point: HandPoint::new(p.x as f64, p.y as f64, -(p.z as f64)),
                        grab:  hand.grab_strength as f64,
                    };
                    match hand.hand_type() {
                        HandType::Left => left = Some(tracked),
                        HandType::Right => right = Some(tracked),
                    }
                }
                if let Some(frame) = hand_frame(left, right, self.grab_threshold) {
                    if tx.send(Command::Hands(frame)).is_err() {
                        return;
                    }
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use holo_orient::Hand;
    use std::sync::mpsc;

    fn hand(x: f64, depth: f64, grab: f64) -> TrackedHand {
        TrackedHand { point: HandPoint::new(x, 0.0, depth), grab }
    }

    #[test]
    fn grab_threshold_closes_hand() {
        let f = hand_frame(Some(hand(0.0, 1.0, 0.81)), Some(hand(5.0, 2.0, 0.8)), 0.8).unwrap();
        assert!(f.left_closed);
        assert!(!f.right_closed);
    }

    #[test]
    fn single_hand_is_always_active() {
        let f = hand_frame(None, Some(hand(3.0, -40.0, 1.0)), 0.8).unwrap();
        assert_eq!(f.active(), Hand::Right);
        assert!(!f.left_closed);
        let f = hand_frame(Some(hand(3.0, 40.0, 0.0)), None, 0.8).unwrap();
        assert_eq!(f.active(), Hand::Left);
        assert!(hand_frame(None, None, 0.8).is_none());
    }

    #[test]
    fn sampler_forwards_latest_cursor() {
        let cursor = SharedCursor::default();
        let (tx, rx) = mpsc::channel();
        let guard = spawn_source(PointerSampler::new(cursor.clone(), Duration::from_millis(1)), tx).unwrap();
        cursor.publish(PointerSample::new(4.0, -2.0));
        let cmd = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(matches!(cmd, Command::Sample(s) if s == PointerSample::new(4.0, -2.0)));
        drop(guard);
    }

    #[test]
    fn dropping_guard_stops_producer() {
        let (tx, rx) = mpsc::channel();
        let guard = spawn_source(PointerSampler::new(SharedCursor::default(), Duration::from_secs(60)), tx).unwrap();
        assert!(guard.is_running());
        let started = Instant::now();
        drop(guard);
        // woken early instead of sleeping out the period
        assert!(started.elapsed() < Duration::from_secs(30));
        // the sender went away with the thread
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn pause_returns_false_when_stopped() {
        let running = AtomicBool::new(false);
        assert!(!pause(&running, Duration::from_secs(5)));
        let running = AtomicBool::new(true);
        assert!(pause(&running, Duration::from_millis(1)));
    }
}
