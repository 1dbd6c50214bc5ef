//! Integration tests for the animation scheduler
//!
//! These tests drive the scheduler through a manual time source and verify:
//! - Repetition and auto-reverse end at the right time
//! - Completion handlers can chain new animations
//! - Targets, handlers and observers may re-enter the scheduler
//! - Redirected properties are written on their holder

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use blinc_animation::{
    AddOutcome, AnimatePhase, AnimatedValue, AnimationScheduler, AnimationSpec, AnimationTarget,
    ClockObserver, Easing, ManualTimeSource, PropertyId, RemoveOutcome, RepeatCount, ResetMode,
    TargetKey, TransformOp, TransformOpKind, WriteMode,
};
use blinc_core::{Color, Point};

const FRAME: f64 = 1.0 / 60.0;

#[derive(Default)]
struct Recorder {
    writes: RefCell<Vec<(String, AnimatedValue, WriteMode)>>,
}

impl Recorder {
    fn scalars(&self, property: &str) -> Vec<f64> {
        self.writes
            .borrow()
            .iter()
            .filter(|(p, _, _)| p == property)
            .filter_map(|(_, v, _)| v.as_scalar())
            .collect()
    }

    fn last(&self) -> Option<(String, AnimatedValue, WriteMode)> {
        self.writes.borrow().last().cloned()
    }
}

impl AnimationTarget for Recorder {
    fn set_property(&self, property: &PropertyId, value: &AnimatedValue, mode: WriteMode) {
        self.writes
            .borrow_mut()
            .push((property.to_string(), *value, mode));
    }
}

struct Harness {
    time: Rc<ManualTimeSource>,
    scheduler: Rc<AnimationScheduler>,
}

impl Harness {
    fn new() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("blinc_animation=debug")
            .with_test_writer()
            .try_init();
        let time = Rc::new(ManualTimeSource::new(10.0));
        let scheduler = Rc::new(AnimationScheduler::with_time_source(time.clone()));
        Self { time, scheduler }
    }

    /// Tick at 60 Hz until nothing is left to animate; returns the frame count
    fn run(&self, max_frames: usize) -> usize {
        for frame in 1..=max_frames {
            self.time.advance(FRAME);
            if !self.scheduler.tick() {
                return frame;
            }
        }
        max_frames
    }
}

#[test]
fn test_auto_reverse_runs_every_leg() {
    let h = Harness::new();
    let recorder = Rc::new(Recorder::default());
    let target: Rc<dyn AnimationTarget> = recorder.clone();

    let spec = AnimationSpec::basic(0.0, 100.0)
        .with_duration(0.5)
        .with_repeat(RepeatCount::Times(3))
        .with_auto_reverse(true);
    h.scheduler.add_animation(&target, "x", &spec).unwrap();

    let frames = h.run(1000);
    // Three legs of 0.5s; the finishing frame is the first one past 1.5s
    assert!((90..=92).contains(&frames), "ran {frames} frames");

    let values = recorder.scalars("x");
    let peak = values.iter().cloned().fold(f64::MIN, f64::max);
    assert!(peak > 95.0);
    // Second leg goes back down before the third goes up again
    let valley_after_peak = values
        .iter()
        .skip_while(|v| **v < peak)
        .cloned()
        .fold(f64::MAX, f64::min);
    assert!(valley_after_peak < 5.0);

    assert_eq!(
        recorder.last().map(|(_, v, m)| (v, m)),
        Some((AnimatedValue::Scalar(0.0), WriteMode::Reset(ResetMode::ToStart)))
    );
    assert_eq!(h.scheduler.animation_count(), 0);
}

#[test]
fn test_completion_chains_next_animation() {
    let h = Harness::new();
    let recorder = Rc::new(Recorder::default());
    let target: Rc<dyn AnimationTarget> = recorder.clone();

    let second = AnimationSpec::basic(Color::BLACK, Color::WHITE).with_duration(0.2);
    let chained_target = Rc::downgrade(&target);
    let first = AnimationSpec::basic(0.0, 1.0)
        .with_duration(0.2)
        .with_reset_mode(ResetMode::ToEnd)
        .on_finished(move |scheduler: &AnimationScheduler| {
            if let Some(target) = chained_target.upgrade() {
                scheduler.add_animation(&target, "color", &second).unwrap();
            }
        });
    h.scheduler.add_animation(&target, "x", &first).unwrap();

    h.run(1000);
    let writes = recorder.writes.borrow();
    let x_end = writes
        .iter()
        .position(|(p, _, m)| p == "x" && *m == WriteMode::Reset(ResetMode::ToEnd))
        .unwrap();
    let first_color = writes.iter().position(|(p, _, _)| p == "color").unwrap();
    assert!(first_color > x_end);
    assert_eq!(
        writes.last().map(|(_, v, _)| *v),
        Some(AnimatedValue::Color(Color::BLACK))
    );
}

#[test]
fn test_supersede_keeps_one_animation_per_property() {
    let h = Harness::new();
    let recorder = Rc::new(Recorder::default());
    let target: Rc<dyn AnimationTarget> = recorder.clone();

    let finished = Rc::new(Cell::new(0));
    let counter = finished.clone();
    let slow = AnimationSpec::basic(0.0, 1.0)
        .with_duration(10.0)
        .on_finished(move |_: &AnimationScheduler| counter.set(counter.get() + 1));
    h.scheduler.add_animation(&target, "x", &slow).unwrap();
    h.run(3);

    let fast = AnimationSpec::basic(50.0, 60.0).with_duration(0.1);
    h.scheduler.add_animation(&target, "x", &fast).unwrap();
    assert_eq!(h.scheduler.animation_count(), 1);

    h.run(1000);
    // The superseded animation never completes
    assert_eq!(finished.get(), 0);
    assert!(recorder.scalars("x").iter().skip(3).all(|v| *v >= 50.0));
}

#[test]
fn test_remove_twice() {
    let h = Harness::new();
    let target: Rc<dyn AnimationTarget> = Rc::new(Recorder::default());
    h.scheduler
        .add_animation(&target, "x", &AnimationSpec::basic(0.0, 1.0))
        .unwrap();

    assert_eq!(
        h.scheduler.remove_animation(&target, "x").unwrap(),
        RemoveOutcome::Removed
    );
    assert_eq!(
        h.scheduler.remove_animation(&target, "x").unwrap(),
        RemoveOutcome::AlreadyAbsent
    );
    assert!(!h.scheduler.has_active_animations());
}

/// Cancels a sibling animation from inside its own property write
struct Canceller {
    scheduler: Weak<AnimationScheduler>,
    this: RefCell<Weak<Canceller>>,
    writes: Cell<usize>,
}

impl AnimationTarget for Canceller {
    fn set_property(&self, property: &PropertyId, _: &AnimatedValue, mode: WriteMode) {
        if property.as_str() != "driver" || mode != WriteMode::Animated {
            return;
        }
        self.writes.set(self.writes.get() + 1);
        let (Some(scheduler), Some(this)) = (self.scheduler.upgrade(), self.this.borrow().upgrade())
        else {
            return;
        };
        let this: Rc<dyn AnimationTarget> = this;
        scheduler.remove_animation(&this, "victim").unwrap();
    }
}

#[test]
fn test_target_write_may_cancel_animations() {
    let h = Harness::new();
    let canceller = Rc::new(Canceller {
        scheduler: Rc::downgrade(&h.scheduler),
        this: RefCell::new(Weak::new()),
        writes: Cell::new(0),
    });
    *canceller.this.borrow_mut() = Rc::downgrade(&canceller);
    let target: Rc<dyn AnimationTarget> = canceller.clone();

    let clock = h.scheduler.shared_clock("group").unwrap();
    let spec = AnimationSpec::basic(0.0, 1.0).with_duration(1.0).with_clock(clock);
    h.scheduler.add_animation(&target, "driver", &spec).unwrap();
    h.scheduler.add_animation(&target, "victim", &spec).unwrap();

    h.time.advance(FRAME);
    h.scheduler.tick();
    assert_eq!(canceller.writes.get(), 1);
    assert!(!h.scheduler.is_animating(&target, "victim"));
    assert!(h.scheduler.is_animating(&target, "driver"));
}

struct Facade {
    layer: Rc<Recorder>,
}

impl AnimationTarget for Facade {
    fn set_property(&self, _: &PropertyId, _: &AnimatedValue, _: WriteMode) {}

    fn redirect_property(&self, property: &PropertyId) -> Option<(Rc<dyn AnimationTarget>, PropertyId)> {
        (property.as_str() == "transform").then(|| {
            let layer: Rc<dyn AnimationTarget> = self.layer.clone();
            (layer, PropertyId::from("layer.transform"))
        })
    }
}

#[test]
fn test_redirected_property_is_shared_by_identity() {
    let h = Harness::new();
    let layer = Rc::new(Recorder::default());
    let facade: Rc<dyn AnimationTarget> = Rc::new(Facade {
        layer: layer.clone(),
    });
    let layer_target: Rc<dyn AnimationTarget> = layer.clone();

    let spin = AnimationSpec::transform([
        TransformOp::new(TransformOpKind::TranslateX, 0.0, 20.0),
        TransformOp::new(TransformOpKind::Rotate, 0.0, 90.0),
    ])
    .with_easing(Easing::EaseInOut)
    .with_reset_mode(ResetMode::ToEnd);
    h.scheduler.add_animation(&facade, "transform", &spin).unwrap();

    // Same holder and id: the facade's animation is found through the layer
    assert!(h.scheduler.is_animating(&layer_target, "layer.transform"));
    assert_eq!(h.scheduler.target_count(), 1);

    h.run(1000);
    let (property, value, _) = layer.last().unwrap();
    assert_eq!(property, "layer.transform");
    let p = value
        .as_transform()
        .unwrap()
        .transform_point(Point::new(1.0, 0.0));
    assert!((p.x - 0.0).abs() < 1e-4);
    assert!((p.y - 21.0).abs() < 1e-4);
}

#[test]
fn test_destroyed_target_stops_silently() {
    let h = Harness::new();
    let recorder = Rc::new(Recorder::default());
    let target: Rc<dyn AnimationTarget> = recorder.clone();
    let spec = AnimationSpec::basic(0.0, 1.0).with_repeat(RepeatCount::Forever);
    h.scheduler.add_animation(&target, "x", &spec).unwrap();
    h.scheduler.add_animation(&target, "y", &spec).unwrap();
    h.run(2);
    let writes_before = recorder.writes.borrow().len();

    h.scheduler.on_target_destroyed(TargetKey::of(&*recorder));
    assert_eq!(h.run(10), 1);
    assert_eq!(recorder.writes.borrow().len(), writes_before);
}

#[test]
fn test_observer_brackets_writes_and_may_start_animations() {
    struct Batch {
        scheduler: Weak<AnimationScheduler>,
        target: Rc<dyn AnimationTarget>,
        phases: RefCell<Vec<AnimatePhase>>,
    }

    impl ClockObserver for Batch {
        fn on_animate(&self, phase: AnimatePhase) {
            self.phases.borrow_mut().push(phase);
            if phase == AnimatePhase::End && self.phases.borrow().len() == 2 {
                if let Some(scheduler) = self.scheduler.upgrade() {
                    let spec = AnimationSpec::basic(0.0, 1.0).with_duration(0.05);
                    let started = scheduler.add_animation(&self.target, "late", &spec).unwrap();
                    assert!(matches!(started, AddOutcome::Started(_)));
                }
            }
        }
    }

    let h = Harness::new();
    let recorder = Rc::new(Recorder::default());
    let target: Rc<dyn AnimationTarget> = recorder.clone();
    let clock = h.scheduler.shared_clock("frame").unwrap();
    let batch = Rc::new(Batch {
        scheduler: Rc::downgrade(&h.scheduler),
        target: target.clone(),
        phases: RefCell::new(Vec::new()),
    });
    h.scheduler.observe_clock(clock, batch.clone()).unwrap();

    let spec = AnimationSpec::basic(0.0, 1.0).with_duration(0.1).with_clock(clock);
    h.scheduler.add_animation(&target, "x", &spec).unwrap();
    h.run(1000);

    let phases = batch.phases.borrow();
    assert!(phases.len() >= 4);
    assert!(phases.chunks(2).all(|pair| pair == [AnimatePhase::Begin, AnimatePhase::End]));
    assert!(!recorder.scalars("late").is_empty());
}
