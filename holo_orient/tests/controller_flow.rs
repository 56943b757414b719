//! End-to-end flows through the public controller API.

use holo_orient::{
    AnimationSpeed, ControlConfig, ControlError, Direction, GesturePhase, HandFrame, HandPoint,
    ManipulationDelta, ManipulationDispatcher, ManipulationEvent, NullDispatcher,
    OrientationController, Panel, PanelSink, PanelView, Permissions, PointerSample, RecordingSink,
};

type Ctl = OrientationController<RecordingSink, NullDispatcher>;

fn controller() -> Ctl {
    OrientationController::new(ControlConfig::default(), RecordingSink::default(), NullDispatcher)
}

fn drag(ctl: &mut Ctl, points: &[(f64, f64)]) {
    ctl.on_pointer_button(true);
    for &(x, y) in points {
        ctl.on_sample(PointerSample::new(x, y)).unwrap();
    }
    ctl.on_pointer_button(false);
}

#[test]
fn steady_right_drag_turns_five_degrees() {
    let mut ctl = controller();
    drag(&mut ctl, &[(100.0, 0.0), (115.0, 0.0), (130.0, 0.0), (145.0, 0.0), (150.0, 0.0)]);
    assert_eq!(ctl.orientation().z(), 5.0);
    assert_eq!(ctl.orientation().x(), 0.0);
    assert_eq!(ctl.sink().broadcasts(), 5);
}

#[test]
fn orientation_always_stays_in_range() {
    let mut ctl = controller();
    let mut points = Vec::new();
    for i in 0..400 {
        let t = i as f64;
        points.push(((t * 7.3).sin() * 900.0, (t * 3.1).cos() * 700.0));
    }
    drag(&mut ctl, &points);
    let o = ctl.orientation();
    for v in [o.x(), o.y(), o.z()] {
        assert!((0.0..360.0).contains(&v), "{} out of range", v);
    }
    for (_, view) in &ctl.sink().updates {
        assert!((0.0..360.0).contains(&view.orientation.z()));
        assert!((0.0..360.0).contains(&view.orientation.x()));
    }
}

#[test]
fn left_from_zero_wraps_to_359() {
    let mut ctl = controller();
    drag(&mut ctl, &[(0.0, 0.0), (-10.0, 0.0)]);
    assert_eq!(ctl.orientation().z(), 359.0);
}

#[test]
fn released_pointer_travel_is_ignored() {
    let mut ctl = controller();
    drag(&mut ctl, &[(0.0, 0.0), (20.0, 0.0)]);
    assert_eq!(ctl.orientation().z(), 2.0);
    for x in [200.0, 400.0, 600.0] {
        ctl.on_sample(PointerSample::new(x, 0.0)).unwrap();
    }
    assert_eq!(ctl.orientation().z(), 2.0);

    // The next press measures from where the pointer is now.
    ctl.on_pointer_button(true);
    ctl.on_sample(PointerSample::new(605.0, 0.0)).unwrap();
    assert_eq!(ctl.orientation().z(), 2.0);
}

#[test]
fn every_broadcast_reaches_four_panels_with_same_view() {
    let mut ctl = controller();
    drag(&mut ctl, &[(0.0, 0.0), (0.0, 30.0)]);
    let updates = &ctl.sink().updates;
    assert_eq!(updates.len() % 4, 0);
    for chunk in updates.chunks(4) {
        let panels: Vec<Panel> = chunk.iter().map(|(p, _)| *p).collect();
        assert_eq!(panels, Panel::ALL.to_vec());
        assert!(chunk.iter().all(|(_, v)| *v == chunk[0].1));
    }
}

#[test]
fn nan_input_is_rejected_without_side_effects() {
    let mut ctl = controller();
    ctl.on_pointer_button(true);
    ctl.on_sample(PointerSample::new(0.0, 0.0)).unwrap();
    let err = ctl.on_sample(PointerSample::new(f64::NAN, 0.0)).unwrap_err();
    assert!(matches!(err, ControlError::InvalidSample { field: "pointer.x", .. }));

    let bad_hand = HandFrame {
        left:         HandPoint::new(0.0, f64::NEG_INFINITY, 0.2),
        right:        HandPoint::new(0.0, 0.0, 0.1),
        left_closed:  true,
        right_closed: false,
    };
    assert!(ctl.on_hands(bad_hand).is_err());
    assert!(ctl.on_wheel(f64::NAN).is_err());
    assert_eq!(ctl.sink().broadcasts(), 0);
}

// ── sensor ──────────────────────────────────────────────────────────────────

fn right_hand(x: f64, y: f64, closed: bool) -> HandFrame {
    HandFrame {
        left:         HandPoint::new(-200.0, 0.0, -50.0),
        right:        HandPoint::new(x, y, 50.0),
        left_closed:  false,
        right_closed: closed,
    }
}

#[test]
fn closed_hand_turns_in_fifteen_degree_steps() {
    let mut ctl = controller();
    ctl.on_hands(right_hand(0.0, 0.0, true)).unwrap();
    ctl.on_hands(right_hand(-12.0, 0.0, true)).unwrap();
    assert_eq!(ctl.orientation().z(), 345.0);
    ctl.on_hands(right_hand(-12.0, -25.0, true)).unwrap();
    assert_eq!(ctl.orientation().x(), 345.0);
}

#[test]
fn sensor_cross_axis_reset_can_be_disabled() {
    let mut cfg = ControlConfig::default();
    cfg.sensor.cross_axis_reset = false;
    let mut ctl = OrientationController::new(cfg, RecordingSink::default(), NullDispatcher);
    ctl.on_hands(right_hand(0.0, 0.0, true)).unwrap();
    ctl.on_hands(right_hand(15.0, 0.0, true)).unwrap();
    // anchor advanced to 10; 5 more is another trigger
    ctl.on_hands(right_hand(20.0, 0.0, true)).unwrap();
    assert_eq!(ctl.orientation().z(), 30.0);

    let mut ctl = controller();
    ctl.on_hands(right_hand(0.0, 0.0, true)).unwrap();
    ctl.on_hands(right_hand(15.0, 0.0, true)).unwrap();
    ctl.on_hands(right_hand(20.0, 0.0, true)).unwrap();
    assert_eq!(ctl.orientation().z(), 15.0);
}

// ── animation ───────────────────────────────────────────────────────────────

#[test]
fn animation_replays_its_step_by_default() {
    let mut ctl = controller();
    let s = ctl.start_animation(AnimationSpeed::Medium, Direction::Right).unwrap();
    assert_eq!(s.interval.as_millis(), 50);
    assert_eq!(ctl.orientation().z(), 359.0);
    for _ in 0..10 {
        assert!(ctl.on_animation_tick(s.id).unwrap());
    }
    assert_eq!(ctl.orientation().z(), 359.0);
    assert_eq!(ctl.sink().broadcasts(), 11);
}

#[test]
fn advancing_animation_turns_each_tick() {
    let mut cfg = ControlConfig::default();
    cfg.animation.advance_on_tick = true;
    let mut ctl = OrientationController::new(cfg, RecordingSink::default(), NullDispatcher);
    let s = ctl.start_animation(AnimationSpeed::VeryFast, Direction::Left).unwrap();
    for _ in 0..359 {
        ctl.on_animation_tick(s.id).unwrap();
    }
    assert_eq!(ctl.orientation().z(), 359.0);
    // 360 wraps to 1, not 0
    ctl.on_animation_tick(s.id).unwrap();
    assert_eq!(ctl.orientation().z(), 1.0);
}

#[test]
fn restarting_animation_makes_old_ticks_stale() {
    let mut ctl = controller();
    let first = ctl.start_animation(AnimationSpeed::Slow, Direction::Left).unwrap();
    let second = ctl.start_animation(AnimationSpeed::Fast, Direction::Right).unwrap();
    assert_ne!(first.id, second.id);
    assert!(!ctl.on_animation_tick(first.id).unwrap());
    assert!(ctl.on_animation_tick(second.id).unwrap());
    assert_eq!(ctl.animation(), Some(second));
}

#[test]
fn manual_drag_cancels_animation() {
    let mut ctl = controller();
    let s = ctl.start_animation(AnimationSpeed::Fast, Direction::Left).unwrap();
    drag(&mut ctl, &[(0.0, 0.0), (0.0, 10.0)]);
    assert!(ctl.animation().is_none());
    assert!(!ctl.on_animation_tick(s.id).unwrap());
    assert_eq!(ctl.orientation().x(), 1.0);
}

#[test]
fn sub_threshold_drag_keeps_animation() {
    let mut ctl = controller();
    ctl.start_animation(AnimationSpeed::Fast, Direction::Left).unwrap();
    drag(&mut ctl, &[(0.0, 0.0), (3.0, 0.0)]);
    assert!(ctl.animation().is_some());
}

#[test]
fn stop_animation_ends_session() {
    let mut ctl = controller();
    let s = ctl.start_animation(AnimationSpeed::Fast, Direction::Left).unwrap();
    assert_eq!(ctl.stop_animation(), Some(s));
    assert_eq!(ctl.stop_animation(), None);
    assert!(!ctl.on_animation_tick(s.id).unwrap());
}

#[test]
fn homing_during_animation_returns_to_animation_step() {
    let mut cfg = ControlConfig::default();
    cfg.pointer.home_on_rest = true;
    let mut ctl = OrientationController::new(cfg, RecordingSink::default(), NullDispatcher);
    ctl.start_animation(AnimationSpeed::Fast, Direction::Right).unwrap();
    ctl.on_pointer_button(true);
    ctl.on_sample(PointerSample::new(0.0, 0.0)).unwrap();
    ctl.on_sample(PointerSample::new(4.0, 0.0)).unwrap();
    assert_eq!(ctl.orientation().z(), 359.0);
    assert_eq!(ctl.orientation().x(), 0.0);
}

// ── manipulation ────────────────────────────────────────────────────────────

#[derive(Default)]
struct Counting {
    pans:    usize,
    scales:  usize,
    rotates: usize,
    changes: Vec<Permissions>,
}

impl ManipulationDispatcher for Counting {
    fn pan(&mut self, _: &ManipulationDelta) { self.pans += 1; }
    fn scale(&mut self, _: &ManipulationDelta) { self.scales += 1; }
    fn rotate(&mut self, _: &ManipulationDelta) { self.rotates += 1; }
    fn permissions_changed(&mut self, p: Permissions) { self.changes.push(p); }
}

struct Discard;

impl PanelSink for Discard {
    fn apply(&mut self, _: Panel, _: PanelView) {}
}

#[test]
fn classified_manipulation_reaches_dispatcher() {
    let mut ctl = OrientationController::new(ControlConfig::default(), Discard, Counting::default());
    let delta = |s: f64, r: f64| {
        ManipulationEvent::Delta(ManipulationDelta::new((s, s), r, vec![(0.0, 0.0), (200.0, 0.0)]))
    };

    ctl.on_manipulation(ManipulationEvent::Started).unwrap();
    ctl.on_manipulation(delta(1.0, 4.0)).unwrap();
    assert_eq!(ctl.dispatcher().pans, 0);

    let p = ctl.on_manipulation(delta(1.0, 8.0)).unwrap();
    assert!(p.rotate);
    ctl.on_manipulation(delta(1.02, 1.0)).unwrap();
    assert_eq!(ctl.dispatcher().rotates, 2);
    assert_eq!(ctl.dispatcher().scales, 2);

    ctl.on_manipulation(ManipulationEvent::Completed).unwrap();
    assert_eq!(ctl.recognizer().phase(), GesturePhase::Idle);
    assert_eq!(
        ctl.dispatcher().changes,
        vec![Permissions { pan: true, scale: true, rotate: true }, Permissions::NONE]
    );
    // manipulation never touches the orientation
    assert_eq!(ctl.orientation().z(), 0.0);
}
