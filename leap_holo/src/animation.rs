//! Turntable ticker thread.
//!
//! One ticker per live [`AnimationSession`]; each tick is a command tagged
//! with the session id, so ticks already queued when the session ends are
//! recognised as stale by the controller.

use std::sync::atomic::AtomicBool;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

use holo_orient::AnimationSession;

use crate::app::Command;
use crate::input::{pause, CommandSource};

pub struct AnimationTicker {
    session:  u64,
    interval: Duration,
}

impl AnimationTicker {
    pub fn new(session: &AnimationSession) -> Self {
        AnimationTicker { session: session.id, interval: session.interval }
    }
}

impl CommandSource for AnimationTicker {
    fn name(&self) -> &'static str { "animation-ticker" }

    fn run(self: Box<Self>, tx: Sender<Command>, running: Arc<AtomicBool>) {
        while pause(&running, self.interval) {
            if tx.send(Command::AnimationTick { session: self.session }).is_err() {
                return;
            }
        }
    }
}
