//! Integration tests for the overscroll animator
//!
//! The animator runs on a real scheduler driven by a manual time source:
//! - Rollout, bounce-out and bounce-back chain and commit once
//! - Wheel events move, settle and hand momentum over to a rollout
//! - Key steps and gestures end at rest inside the valid range

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use blinc_animation::{AnimationScheduler, AnimationTarget, ManualTimeSource};
use blinc_core::{Modifiers, Point, WheelDirection, WheelEvent};
use blinc_scroll::{
    Axis, GestureKind, OverScrollAnimator, OverScrollConfig, OverScrollObserver, ScrollDirection,
    ScrollError, ScrollParam, V_SCROLL_POSITION,
};

const FRAME: f64 = 1.0 / 60.0;

#[derive(Default)]
struct PositionLog {
    positions: RefCell<Vec<(Axis, i32)>>,
}

impl PositionLog {
    fn max(&self, axis: Axis) -> Option<i32> {
        self.positions
            .borrow()
            .iter()
            .filter(|(a, _)| *a == axis)
            .map(|(_, p)| *p)
            .max()
    }
}

impl OverScrollObserver for PositionLog {
    fn on_over_scroll(&self, axis: Axis, position: i32) {
        self.positions.borrow_mut().push((axis, position));
    }
}

struct Harness {
    time: Rc<ManualTimeSource>,
    scheduler: Rc<AnimationScheduler>,
    param: Rc<ScrollParam>,
    commits: Rc<RefCell<Vec<i32>>>,
}

impl Harness {
    fn new(min: i32, max: i32) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("blinc_scroll=debug,blinc_animation=debug")
            .with_test_writer()
            .try_init();
        let time = Rc::new(ManualTimeSource::new(0.0));
        let scheduler = Rc::new(AnimationScheduler::with_time_source(time.clone()));
        let param = Rc::new(ScrollParam::new(min, max));
        let commits = Rc::new(RefCell::new(Vec::new()));
        let sink = commits.clone();
        param.set_on_commit(move |value| sink.borrow_mut().push(value));
        Self {
            time,
            scheduler,
            param,
            commits,
        }
    }

    fn vertical(&self, config: OverScrollConfig) -> Rc<OverScrollAnimator> {
        OverScrollAnimator::new(self.scheduler.clone(), config, Some(self.param.clone()), None)
            .unwrap()
    }

    fn horizontal(&self, config: OverScrollConfig) -> Rc<OverScrollAnimator> {
        OverScrollAnimator::new(self.scheduler.clone(), config, None, Some(self.param.clone()))
            .unwrap()
    }

    /// Tick at 60 Hz until the scheduler is idle; returns the frame count
    fn run(&self, max_frames: usize) -> usize {
        self.run_with_step(FRAME, max_frames)
    }

    fn run_with_step(&self, step: f64, max_frames: usize) -> usize {
        for frame in 1..=max_frames {
            self.time.advance(step);
            if !self.scheduler.tick() {
                return frame;
            }
        }
        panic!("still animating after {max_frames} frames");
    }
}

fn continuous(delta: f32, direction: WheelDirection, roll_out_phase: bool) -> WheelEvent {
    WheelEvent::Continuous {
        delta,
        direction,
        axis_inverted: false,
        roll_out_phase,
        modifiers: Modifiers::NONE,
    }
}

#[test]
fn test_rollout_bounces_out_and_back() {
    let h = Harness::new(0, 1000);
    let animator = h.vertical(OverScrollConfig::vertical(1000, 50));
    let log = Rc::new(PositionLog::default());
    let observer: Rc<dyn OverScrollObserver> = log.clone();
    animator.set_observer(&observer);

    assert_eq!(animator.over_scroll_position(Axis::Vertical), 50);
    h.param.begin_edit();
    animator
        .start_scroll_animation(Point::new(0.0, -300.0))
        .unwrap();
    assert!(animator.is_animating(Axis::Vertical));

    // The rollout alone takes five seconds
    let frames = h.run(2000);
    assert!(frames > 290, "finished after {frames} frames");

    // Pulled into the trailing margin, then back to the boundary
    assert_eq!(log.max(Axis::Vertical), Some(1100));
    assert_eq!(animator.over_scroll_position(Axis::Vertical), 1050);
    assert_eq!(animator.content_offset(Axis::Vertical), 1000);
    assert!(!animator.is_animating(Axis::Vertical));

    assert_eq!(h.param.value(), 1000);
    assert_eq!(*h.commits.borrow(), vec![1000]);
    assert!(!h.param.is_editing());
}

#[test]
fn test_fast_fling_over_large_range_settles_at_bound() {
    let h = Harness::new(0, 1_000_000);
    let animator = h.vertical(OverScrollConfig::vertical(1_000_000, 50));

    // The glide distance saturates far past the end of the range
    animator
        .start_scroll_animation(Point::new(0.0, -1.0e6))
        .unwrap();
    assert!(animator.is_animating(Axis::Vertical));
    h.run_with_step(1.0, 5000);

    assert_eq!(animator.over_scroll_position(Axis::Vertical), 1_000_050);
    assert_eq!(h.param.value(), 1_000_000);
    assert_eq!(*h.commits.borrow(), vec![1_000_000]);

    // Flinging back at full speed returns to the start
    animator
        .start_scroll_animation(Point::new(0.0, 1.0e6))
        .unwrap();
    h.run_with_step(1.0, 5000);
    assert_eq!(animator.over_scroll_position(Axis::Vertical), 50);
    assert_eq!(h.param.value(), 0);
}

#[test]
fn test_fast_fling_against_leading_edge_stays_put() {
    let h = Harness::new(0, 1_000_000);
    let animator = h.vertical(OverScrollConfig::vertical(1_000_000, 50));

    animator
        .start_scroll_animation(Point::new(0.0, 1.0e6))
        .unwrap();
    assert!(!animator.is_animating(Axis::Vertical));
    assert_eq!(animator.over_scroll_position(Axis::Vertical), 50);
    assert_eq!(*h.commits.borrow(), vec![0]);
}

#[test]
fn test_stop_animation_keeps_position() {
    let h = Harness::new(0, 1000);
    let animator = h.vertical(OverScrollConfig::vertical(1000, 50));

    animator
        .start_scroll_animation(Point::new(0.0, -300.0))
        .unwrap();
    for _ in 0..30 {
        h.time.advance(FRAME);
        h.scheduler.tick();
    }
    let position = animator.over_scroll_position(Axis::Vertical);
    assert!(position > 50);

    animator.stop_animation(Axis::Vertical);
    assert!(!animator.is_animating(Axis::Vertical));
    assert_eq!(animator.over_scroll_position(Axis::Vertical), position);
    assert_eq!(h.commits.borrow().len(), 1);
    assert!(!h.scheduler.tick());
}

#[test]
fn test_dropped_animator_stops_silently() {
    let h = Harness::new(0, 1000);
    let animator = h.vertical(OverScrollConfig::vertical(1000, 50));
    animator
        .start_scroll_animation(Point::new(0.0, -300.0))
        .unwrap();
    assert_eq!(h.scheduler.animation_count(), 1);

    drop(animator);
    assert_eq!(h.scheduler.animation_count(), 0);
    assert!(!h.scheduler.tick());
    assert!(h.commits.borrow().is_empty());
}

#[test]
fn test_wheel_roll_out_hands_off_once() {
    let h = Harness::new(0, 1000);
    let animator = h.vertical(OverScrollConfig::vertical(1000, 50));
    let target: Rc<dyn AnimationTarget> = animator.clone();

    assert!(animator.on_wheel(&continuous(20.0, WheelDirection::Down, false), 0.0));
    assert_eq!(animator.over_scroll_position(Axis::Vertical), 57);
    assert!(!animator.is_animating(Axis::Vertical));

    // Platform momentum starts one rollout
    assert!(animator.on_wheel(&continuous(20.0, WheelDirection::Down, true), 16.0));
    let first = h.scheduler.running_animation(&target, V_SCROLL_POSITION);
    assert!(first.is_some());

    h.time.advance(FRAME);
    h.scheduler.tick();

    // Further momentum events are swallowed
    assert!(animator.on_wheel(&continuous(15.0, WheelDirection::Down, true), 32.0));
    assert_eq!(h.scheduler.running_animation(&target, V_SCROLL_POSITION), first);

    h.run(2000);
    assert_eq!(animator.over_scroll_position(Axis::Vertical), 1050);
    assert_eq!(h.param.value(), 1000);
}

#[test]
fn test_wheel_past_edge_bounces_back_after_pause() {
    let h = Harness::new(0, 100);
    let animator = h.horizontal(OverScrollConfig::horizontal(1000, 50));

    assert!(animator.on_wheel(&continuous(-30.0, WheelDirection::Left, false), 1000.0));
    assert_eq!(animator.over_scroll_position(Axis::Horizontal), 40);
    assert!(animator.needs_bounce_animation(Axis::Horizontal));

    // Nothing happens before the pause is over
    assert!(animator.poll(1020.0));
    assert!(!animator.is_animating(Axis::Horizontal));

    assert!(!animator.poll(1050.0));
    assert!(animator.is_animating(Axis::Horizontal));
    h.run(200);
    assert_eq!(animator.over_scroll_position(Axis::Horizontal), 50);
    assert_eq!(h.param.value(), 0);
}

#[test]
fn test_discrete_wheel_wraps_forward() {
    let h = Harness::new(0, 9);
    let animator = h.vertical(OverScrollConfig::wheel(900, 100));

    h.param.set_value(9);
    animator.on_scroll_param_changed(Axis::Vertical);
    assert_eq!(animator.over_scroll_position(Axis::Vertical), 900);

    let down = WheelEvent::Discrete {
        direction: WheelDirection::Down,
        modifiers: Modifiers::NONE,
    };
    assert!(animator.on_wheel(&down, 0.0));
    assert_eq!(h.param.value(), 0);
    assert_eq!(animator.over_scroll_position(Axis::Vertical), 0);
    assert_eq!(*h.commits.borrow(), vec![0]);
}

#[test]
fn test_key_steps_on_horizontal_axis() {
    let h = Harness::new(0, 5);
    let animator = h.horizontal(OverScrollConfig::horizontal(500, 0).with_snap(Axis::Horizontal, 100));

    animator.increment().unwrap();
    assert!(animator.is_animating(Axis::Horizontal));
    h.run(600);
    assert_eq!(animator.over_scroll_position(Axis::Horizontal), 100);
    assert_eq!(h.param.value(), 1);

    // Stepping below the minimum does nothing
    h.param.set_value(0);
    animator.on_scroll_param_changed(Axis::Horizontal);
    animator.decrement().unwrap();
    assert!(!animator.is_animating(Axis::Horizontal));
    assert_eq!(animator.pending_steps(), 0);
}

#[test]
fn test_touch_fling_comes_to_rest() {
    let h = Harness::new(0, 1000);
    let animator = h.vertical(OverScrollConfig::vertical(1000, 50));
    let clicks = Rc::new(Cell::new(0));
    let sink = clicks.clone();
    let mut gesture = animator
        .create_gesture(GestureKind::Touch)
        .unwrap()
        .with_click_action(move || sink.set(sink.get() + 1));

    gesture.on_begin(Point::new(0.0, 500.0), Modifiers::NONE, 0.0);
    gesture.on_move(Point::new(0.0, 450.0), Modifiers::NONE, 16.0);
    gesture.on_move(Point::new(0.0, 400.0), Modifiers::NONE, 32.0);
    assert!(h.param.is_editing());
    gesture
        .on_release(Point::new(0.0, 400.0), Modifiers::NONE, 40.0)
        .unwrap();
    assert!(animator.is_animating(Axis::Vertical));

    h.run(2000);
    assert_eq!(clicks.get(), 0);
    assert_eq!(animator.over_scroll_position(Axis::Vertical), 1050);
    assert_eq!(*h.commits.borrow(), vec![1000]);
    assert!(!h.param.is_editing());
}

#[test]
fn test_config_from_toml() {
    let h = Harness::new(0, 100);
    let config = OverScrollConfig::from_toml_str(
        r#"
        direction = "both"
        range_x = 400
        range_y = 800
        snap_y = 8
        margins = { top = 20, bottom = 20, left = 10, right = 10 }
        "#,
    )
    .unwrap();
    assert_eq!(config.direction, ScrollDirection::Both);

    let missing = OverScrollAnimator::new(h.scheduler.clone(), config, Some(h.param.clone()), None);
    assert!(matches!(missing, Err(ScrollError::MissingAxis(Axis::Horizontal))));

    let horizontal = Rc::new(ScrollParam::new(0, 40));
    let animator = OverScrollAnimator::new(
        h.scheduler.clone(),
        config,
        Some(h.param.clone()),
        Some(horizontal),
    )
    .unwrap();
    assert_eq!(animator.bounds(Axis::Vertical), Some((20, 820)));
    assert_eq!(animator.bounds(Axis::Horizontal), Some((10, 410)));
    assert_eq!(animator.snap_size(Axis::Vertical), 8);
}
