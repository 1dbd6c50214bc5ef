//! Overscroll animator
//!
//! Drives the raw over-scroll position of one or two axes through three
//! animation phases:
//!
//! - **Rollout**: a decelerating glide from the release velocity to a snapped
//!   rest position. A glide that would leave the valid range is cut at the
//!   boundary with an ease-out curve whose end slope matches the velocity the
//!   next phase starts with.
//! - **BounceOut**: continues past the boundary into the margin.
//! - **BounceBack**: eases back to the nearest valid boundary.
//!
//! Every phase is a basic animation of the `fullVScrollPosition` /
//! `fullHScrollPosition` property of the animator itself, submitted to the
//! [`AnimationScheduler`]. Phase completion handlers chain the next phase or
//! commit the logical [`ScrollParam`].
//!
//! The raw position of an axis spans `[0, range + margins]`; the valid range
//! is `[leading margin, max - trailing margin]`.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use blinc_animation::{
    AnimatedValue, AnimationCompletionHandler, AnimationScheduler, AnimationSpec, AnimationTarget,
    Easing, PropertyId, RemoveOutcome, ResetMode, TargetKey, WriteMode,
};
use blinc_core::{Point, WheelDirection, WheelEvent};
use smallvec::SmallVec;

use crate::config::{Axis, OverScrollConfig, ScrollDirection};
use crate::error::{Result, ScrollError};
use crate::gesture::{GestureKind, OverScrollGesture};
use crate::param::ScrollParam;
use crate::physics;

/// Animated property of the vertical over-scroll position
pub const V_SCROLL_POSITION: PropertyId = PropertyId::from_static("fullVScrollPosition");

/// Animated property of the horizontal over-scroll position
pub const H_SCROLL_POSITION: PropertyId = PropertyId::from_static("fullHScrollPosition");

/// Hand-off velocities below this end a phase chain
const MIN_BOUNCE_VELOCITY: f32 = 1e-5;

/// Wheel friction while the content is pulled past its bounds
const OUT_OF_RANGE_FRICTION: f32 = 0.2;

/// Gap after which a wheel event starts a new scroll
const WHEEL_RESET_MS: f64 = 1000.0;

/// Elapsed time assumed for the first event of a wheel scroll
const WHEEL_RESTART_MS: f64 = 10.0;

/// Receives raw position changes, e.g. to move content or draw a rubber band
pub trait OverScrollObserver {
    fn on_over_scroll(&self, axis: Axis, position: i32);
}

/// Property animated for `axis`
pub fn position_property(axis: Axis) -> PropertyId {
    match axis {
        Axis::Vertical => V_SCROLL_POSITION,
        Axis::Horizontal => H_SCROLL_POSITION,
    }
}

fn axis_of(property: &PropertyId) -> Option<Axis> {
    match property.as_str() {
        "fullVScrollPosition" => Some(Axis::Vertical),
        "fullHScrollPosition" => Some(Axis::Horizontal),
        _ => None,
    }
}

// ============================================================================
// Axis State
// ============================================================================

/// Geometry and position of one axis
struct AxisState {
    param: Rc<ScrollParam>,
    position: i32,
    /// Upper end of the raw position
    max: i32,
    range: i32,
    snap: i32,
    leading: i32,
    trailing: i32,
    wrap_around: bool,
    animating: bool,
}

impl AxisState {
    fn new(config: &OverScrollConfig, axis: Axis, param: Rc<ScrollParam>) -> Self {
        Self {
            param,
            position: 0,
            max: config.position_max(axis),
            range: config.range(axis),
            snap: config.snap(axis),
            leading: config.leading_margin(axis),
            trailing: config.trailing_margin(axis),
            wrap_around: config.wrap_around,
            animating: false,
        }
    }

    fn bounds_min(&self) -> i32 {
        self.leading
    }

    fn bounds_max(&self) -> i32 {
        self.max - self.trailing
    }

    fn needs_bounce(&self) -> bool {
        !self.wrap_around && (self.position < self.bounds_min() || self.position > self.bounds_max())
    }

    fn value_range(&self) -> i32 {
        self.param.value_range()
    }

    /// Wrap a raw position into `[0, max)` for endless scrolling
    fn wrap(&self, mut value: i32) -> i32 {
        if self.wrap_around && self.max > 0 {
            value = value.rem_euclid(self.max);
        }
        value
    }

    /// Normalized logical value for the current raw position
    fn to_normalized(&self) -> f64 {
        let mut position = self.position;
        if !self.wrap_around {
            position = (position - self.leading).clamp(0, self.bounds_max() - self.leading);
        }
        let value = (position + self.snap / 2) / self.snap;
        let range = self.value_range();
        if range > 0 {
            (value % (range + 1)) as f64 / range as f64
        } else {
            0.0
        }
    }

    /// Raw position for the current logical value
    fn from_normalized(&self) -> i32 {
        (self.param.normalized() * self.range as f64) as i32 + self.leading
    }
}

// ============================================================================
// Wheel State and Deferred Tasks
// ============================================================================

#[derive(Default)]
struct WheelState {
    pps: Point,
    accumulated: Point,
    sign_x: i32,
    sign_y: i32,
    roll_out_triggered: bool,
    last_event_ms: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TaskKind {
    BounceBack(Axis),
    /// Walk one point towards the snap grid, `repeats` times
    SnapStep {
        axis: Axis,
        step: i32,
        repeats: u32,
        delay_ms: f64,
    },
}

enum WheelOutcome {
    /// Platform momentum; carries the hand-off velocity for the first event
    RollOut(Option<Point>),
    Move { elapsed: f64 },
}

#[derive(Debug, Clone, Copy)]
struct DeferredTask {
    due_ms: f64,
    kind: TaskKind,
}

struct State {
    vertical: Option<AxisState>,
    horizontal: Option<AxisState>,
    pending_steps: i32,
    steps_start_value: i32,
    wheel: WheelState,
    tasks: SmallVec<[DeferredTask; 2]>,
}

impl State {
    fn axis(&self, axis: Axis) -> Option<&AxisState> {
        match axis {
            Axis::Vertical => self.vertical.as_ref(),
            Axis::Horizontal => self.horizontal.as_ref(),
        }
    }

    fn axis_mut(&mut self, axis: Axis) -> Option<&mut AxisState> {
        match axis {
            Axis::Vertical => self.vertical.as_mut(),
            Axis::Horizontal => self.horizontal.as_mut(),
        }
    }
}

/// Phase of an overscroll animation, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Rollout,
    BounceOut,
    BounceBack,
    ScrollTo,
}

// ============================================================================
// Completion Handler
// ============================================================================

/// Chains the next phase when a phase animation ends
struct PhaseCompletion {
    animator: Weak<OverScrollAnimator>,
    axis: Axis,
    end_value: i32,
    bounce_velocity: f32,
}

impl AnimationCompletionHandler for PhaseCompletion {
    fn on_finished(&self, _scheduler: &AnimationScheduler) {
        let Some(animator) = self.animator.upgrade() else {
            return;
        };
        let pending = self.bounce_velocity.abs() > MIN_BOUNCE_VELOCITY;
        animator.stop_animation_at(self.axis, Some(self.end_value), pending);
        if !pending {
            return;
        }

        let next = if animator.needs_bounce_animation(self.axis) {
            animator.trigger_bounce_back(self.axis, self.bounce_velocity)
        } else {
            animator.trigger_bounce_out(self.axis, self.bounce_velocity)
        };
        if let Err(err) = next {
            tracing::warn!(axis = ?self.axis, %err, "failed to chain overscroll phase");
        }
    }
}

// ============================================================================
// OverScrollAnimator
// ============================================================================

/// Physics controller for scrollables with rubber-band edges
pub struct OverScrollAnimator {
    this: Weak<OverScrollAnimator>,
    scheduler: Rc<AnimationScheduler>,
    config: OverScrollConfig,
    /// Velocity cap in points per second
    max_pps: f32,
    observer: RefCell<Option<Weak<dyn OverScrollObserver>>>,
    state: RefCell<State>,
}

impl OverScrollAnimator {
    /// Create an animator for the axes `config.direction` names
    ///
    /// Every scrolling axis needs its logical parameter. The raw positions
    /// are derived from the parameters' current values.
    pub fn new(
        scheduler: Rc<AnimationScheduler>,
        config: OverScrollConfig,
        vertical: Option<Rc<ScrollParam>>,
        horizontal: Option<Rc<ScrollParam>>,
    ) -> Result<Rc<Self>> {
        let vertical = match (config.direction.includes(Axis::Vertical), vertical) {
            (true, None) => return Err(ScrollError::MissingAxis(Axis::Vertical)),
            (true, Some(param)) => Some(AxisState::new(&config, Axis::Vertical, param)),
            (false, _) => None,
        };
        let horizontal = match (config.direction.includes(Axis::Horizontal), horizontal) {
            (true, None) => return Err(ScrollError::MissingAxis(Axis::Horizontal)),
            (true, Some(param)) => Some(AxisState::new(&config, Axis::Horizontal, param)),
            (false, _) => None,
        };

        let max_pps = vertical
            .iter()
            .chain(horizontal.iter())
            .map(|axis| axis.max)
            .max()
            .unwrap_or(0) as f32;

        let animator = Rc::new_cyclic(|this| Self {
            this: this.clone(),
            scheduler,
            config,
            max_pps,
            observer: RefCell::new(None),
            state: RefCell::new(State {
                vertical,
                horizontal,
                pending_steps: 0,
                steps_start_value: -1,
                wheel: WheelState::default(),
                tasks: SmallVec::new(),
            }),
        });

        for axis in Axis::BOTH {
            animator.sync_position(axis, true);
        }
        tracing::debug!(direction = ?config.direction, max_pps, "overscroll animator created");
        Ok(animator)
    }

    pub fn set_observer(&self, observer: &Rc<dyn OverScrollObserver>) {
        *self.observer.borrow_mut() = Some(Rc::downgrade(observer));
    }

    pub fn config(&self) -> &OverScrollConfig {
        &self.config
    }

    pub fn direction(&self) -> ScrollDirection {
        self.config.direction
    }

    pub fn scheduler(&self) -> &Rc<AnimationScheduler> {
        &self.scheduler
    }

    fn as_target(&self) -> Option<Rc<dyn AnimationTarget>> {
        self.this.upgrade().map(|this| this as Rc<dyn AnimationTarget>)
    }

    // ------------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------------

    pub fn can_scroll(&self, axis: Axis) -> bool {
        self.state.borrow().axis(axis).is_some()
    }

    pub fn scroll_param(&self, axis: Axis) -> Option<Rc<ScrollParam>> {
        self.state.borrow().axis(axis).map(|a| a.param.clone())
    }

    /// Raw over-scroll position, margins included
    pub fn over_scroll_position(&self, axis: Axis) -> i32 {
        self.state.borrow().axis(axis).map_or(0, |a| a.position)
    }

    /// Position relative to the start of the valid range
    pub fn content_offset(&self, axis: Axis) -> i32 {
        self.state
            .borrow()
            .axis(axis)
            .map_or(0, |a| a.position - a.bounds_min())
    }

    /// Valid raw positions `(min, max)`
    pub fn bounds(&self, axis: Axis) -> Option<(i32, i32)> {
        self.state
            .borrow()
            .axis(axis)
            .map(|a| (a.bounds_min(), a.bounds_max()))
    }

    /// Snap grid of the axis, at least 1
    pub fn snap_size(&self, axis: Axis) -> i32 {
        self.config.snap(axis)
    }

    /// `max - min` of the logical parameter
    pub fn value_range(&self, axis: Axis) -> i32 {
        self.state.borrow().axis(axis).map_or(0, AxisState::value_range)
    }

    /// Whether the axis rests outside its valid range
    pub fn needs_bounce_animation(&self, axis: Axis) -> bool {
        self.state.borrow().axis(axis).is_some_and(AxisState::needs_bounce)
    }

    pub fn is_animating(&self, axis: Axis) -> bool {
        self.state.borrow().axis(axis).is_some_and(|a| a.animating)
    }

    /// Number of queued key steps of a running scroll-to animation
    pub fn pending_steps(&self) -> i32 {
        self.state.borrow().pending_steps
    }

    /// Move the raw position, wrapping or clamping as configured
    ///
    /// The logical parameter follows and the observer is notified when the
    /// position changes.
    pub fn set_scroll_value(&self, axis: Axis, value: i32) {
        let update = {
            let mut state = self.state.borrow_mut();
            let Some(ax) = state.axis_mut(axis) else {
                return;
            };
            let value = ax.wrap(value).clamp(0, ax.max);
            if value == ax.position {
                return;
            }
            ax.position = value;
            (ax.param.clone(), ax.to_normalized(), value)
        };

        let (param, normalized, position) = update;
        param.set_normalized(normalized);
        let observer = self.observer.borrow().as_ref().and_then(Weak::upgrade);
        if let Some(observer) = observer {
            observer.on_over_scroll(axis, position);
        }
    }

    /// Re-derive the raw position after the logical parameter changed
    /// from outside; a running animation on the axis is stopped
    pub fn on_scroll_param_changed(&self, axis: Axis) {
        self.sync_position(axis, false);
    }

    fn sync_position(&self, axis: Axis, force: bool) {
        let target = {
            let state = self.state.borrow();
            let Some(ax) = state.axis(axis) else {
                return;
            };
            let in_sync = ax.param.value() == ax.param.value_for_normalized(ax.to_normalized());
            if in_sync && !force {
                return;
            }
            ax.from_normalized()
        };
        self.stop_animation(axis);
        self.set_scroll_value(axis, target);
    }

    // ------------------------------------------------------------------------
    // Phases
    // ------------------------------------------------------------------------

    /// Start the release animation of every scrolling axis
    ///
    /// Axes outside their valid range bounce back; the others roll out with
    /// the given velocity (points per second, opposite to the scroll
    /// direction).
    pub fn start_scroll_animation(&self, velocity: Point) -> Result<()> {
        self.state.borrow_mut().pending_steps = 0;
        for axis in Axis::BOTH {
            if !self.can_scroll(axis) {
                continue;
            }
            let v = match axis {
                Axis::Vertical => velocity.y,
                Axis::Horizontal => velocity.x,
            };
            if self.needs_bounce_animation(axis) {
                self.trigger_bounce_back(axis, 0.0)?;
            } else {
                self.trigger_roll_out(axis, v)?;
            }
        }
        Ok(())
    }

    fn trigger_roll_out(&self, axis: Axis, velocity: f32) -> Result<()> {
        let (start, snap, bounds, wrap_around) = {
            let state = self.state.borrow();
            let Some(ax) = state.axis(axis) else {
                return Ok(());
            };
            (ax.position, ax.snap, (ax.bounds_min(), ax.bounds_max()), ax.wrap_around)
        };

        let velocity = physics::bounded_velocity(velocity, self.max_pps);
        // fast glides over large ranges leave the i32 position range
        let mut roll_out = i64::from(physics::roll_out_distance(velocity));
        let start_value = i64::from(start);
        let snap = i64::from(snap);
        let end = start_value - roll_out + snap / 2;
        let mut snapped = (end / snap) * snap;

        let mut slope = 0.0;
        if !wrap_around {
            let (min, max) = (i64::from(bounds.0), i64::from(bounds.1));
            slope = physics::exit_slope(start_value, snapped, min, max);
            snapped = snapped.clamp(min, max);
        }
        let snapped = snapped.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
        let bounce_velocity = slope * velocity;

        if roll_out == 0 {
            roll_out = 1;
        }
        let travel = i64::from(snapped) - start_value;
        let distance_factor = travel as f32 / roll_out as f32;
        let distance = travel.abs();

        if distance == 0 {
            self.set_scroll_value(axis, snapped);
            self.commit(axis);
            return Ok(());
        }

        let duration = physics::animation_duration(distance, velocity * distance_factor);
        let spec = AnimationSpec::basic(start as f64, snapped as f64)
            .with_duration(duration)
            .with_easing(Easing::CubicBezier(physics::ease_out_points(slope)));
        self.submit(axis, Phase::Rollout, spec, snapped, bounce_velocity)
    }

    pub(crate) fn trigger_bounce_out(&self, axis: Axis, velocity: f32) -> Result<()> {
        let (start, margin) = {
            let state = self.state.borrow();
            let Some(ax) = state.axis(axis) else {
                return Ok(());
            };
            // negative velocities travel towards the end of the axis
            let margin = if velocity < 0.0 { ax.trailing } else { ax.leading };
            (ax.position, margin)
        };

        let distance = physics::roll_out_distance(velocity).clamp(-margin, margin);
        if distance == 0 {
            self.commit(axis);
            return Ok(());
        }
        let end = start - distance;
        let spec = AnimationSpec::basic(start as f64, end as f64)
            .with_duration(physics::animation_duration(i64::from(distance), velocity))
            .with_easing(Easing::EaseOut);
        self.submit(axis, Phase::BounceOut, spec, end, velocity)
    }

    pub(crate) fn trigger_bounce_back(&self, axis: Axis, velocity: f32) -> Result<()> {
        let (start, end) = {
            let state = self.state.borrow();
            let Some(ax) = state.axis(axis) else {
                return Ok(());
            };
            let end = if ax.position < ax.bounds_min() {
                ax.bounds_min()
            } else {
                ax.bounds_max()
            };
            (ax.position, end)
        };

        let spec = AnimationSpec::basic(start as f64, end as f64)
            .with_duration(physics::animation_duration(i64::from(start - end), velocity))
            .with_easing(Easing::EaseInOut);
        self.submit(axis, Phase::BounceBack, spec, end, 0.0)
    }

    fn submit(
        &self,
        axis: Axis,
        phase: Phase,
        spec: AnimationSpec,
        end_value: i32,
        bounce_velocity: f32,
    ) -> Result<()> {
        let Some(target) = self.as_target() else {
            return Ok(());
        };
        tracing::debug!(
            ?axis,
            ?phase,
            start = ?spec.first_value(),
            end_value,
            duration = spec.duration(),
            bounce_velocity,
            "overscroll phase"
        );

        let spec = spec.on_finished(PhaseCompletion {
            animator: self.this.clone(),
            axis,
            end_value,
            bounce_velocity,
        });
        self.scheduler.add_animation(&target, position_property(axis), &spec)?;
        if let Some(ax) = self.state.borrow_mut().axis_mut(axis) {
            ax.animating = true;
        }
        Ok(())
    }

    /// Stop the animation of an axis where it is
    pub fn stop_animation(&self, axis: Axis) {
        self.stop_animation_at(axis, None, false);
    }

    /// Stop the animation of an axis, optionally jumping to `end_value`
    ///
    /// Unless another phase follows (`pending`), the logical parameter is
    /// committed and its edit bracket closed.
    fn stop_animation_at(&self, axis: Axis, end_value: Option<i32>, pending: bool) {
        if !self.is_animating(axis) {
            return;
        }
        let Some(target) = self.as_target() else {
            return;
        };
        let removed = match self.scheduler.remove_animation(&target, position_property(axis)) {
            Ok(outcome) => outcome == RemoveOutcome::Removed,
            Err(err) => {
                tracing::warn!(?axis, %err, "failed to stop overscroll animation");
                false
            }
        };
        if !removed {
            return;
        }

        if let Some(ax) = self.state.borrow_mut().axis_mut(axis) {
            ax.animating = false;
        }
        if let Some(end_value) = end_value {
            self.state.borrow_mut().pending_steps = 0;
            self.set_scroll_value(axis, end_value);
        }
        if !pending {
            self.commit(axis);
        }
    }

    fn commit(&self, axis: Axis) {
        if let Some(param) = self.scroll_param(axis) {
            param.perform_update();
            param.end_edit();
            tracing::debug!(?axis, value = param.value(), "scroll value committed");
        }
    }

    // ------------------------------------------------------------------------
    // Key Steps
    // ------------------------------------------------------------------------

    /// Animate to the next logical value
    pub fn increment(&self) -> Result<()> {
        self.step_by(1)
    }

    /// Animate to the previous logical value
    pub fn decrement(&self) -> Result<()> {
        self.step_by(-1)
    }

    fn step_axis(&self) -> Axis {
        if self.can_scroll(Axis::Vertical) {
            Axis::Vertical
        } else {
            Axis::Horizontal
        }
    }

    fn step_by(&self, step: i32) -> Result<()> {
        let axis = self.step_axis();
        match self.prepare_scroll_to(axis, step) {
            Some(end_value) => self.trigger_scroll_to(axis, end_value),
            None => Ok(()),
        }
    }

    /// Raw end position of a key step, `None` when the value cannot move
    ///
    /// Repeated steps while the animation runs accumulate from the value the
    /// first step started at.
    fn prepare_scroll_to(&self, axis: Axis, step: i32) -> Option<i32> {
        let mut state = self.state.borrow_mut();
        let pending = state.pending_steps;
        let ax = state.axis(axis)?;
        let param = ax.param.clone();

        let current = if pending == 0 {
            param.value()
        } else {
            state.steps_start_value
        };
        let target = (current + step + pending).clamp(param.min(), param.max());
        if target == current {
            param.set_value(target);
            state.pending_steps = 0;
            return None;
        }

        let range = ax.value_range().max(1);
        let normalized = (target - param.min()) as f64 / range as f64;
        let mut end_value = (normalized * ax.range as f64) as i32 + ax.bounds_min();

        // take the short way round on wrapping axes
        let mid = ax.max / 2;
        if (ax.position - end_value).abs() > mid {
            end_value += if mid > end_value { ax.max } else { -ax.max };
        }

        if pending == 0 {
            state.steps_start_value = current;
        }
        state.pending_steps += step;
        Some(end_value)
    }

    fn trigger_scroll_to(&self, axis: Axis, end_value: i32) -> Result<()> {
        let pending = self.pending_steps();
        self.stop_animation(axis);

        let start = self.over_scroll_position(axis);
        let speed = self.snap_size(axis) as f32;
        let velocity = speed + speed * 0.1 * pending.unsigned_abs() as f32;
        let easing = if pending.abs() > 1 {
            Easing::EaseOut
        } else {
            Easing::EaseInOut
        };
        let spec = AnimationSpec::basic(start as f64, end_value as f64)
            .with_duration(physics::animation_duration(i64::from(start - end_value), velocity))
            .with_easing(easing);
        self.submit(axis, Phase::ScrollTo, spec, end_value, 0.0)
    }

    // ------------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------------

    /// Create the drag handler for a mouse or touch gesture
    ///
    /// Animations are stopped unless key steps are still running.
    pub fn create_gesture(&self, kind: GestureKind) -> Option<OverScrollGesture> {
        let this = self.this.upgrade()?;
        if self.pending_steps() == 0 {
            self.stop_animation(Axis::Vertical);
            self.stop_animation(Axis::Horizontal);
        }
        Some(OverScrollGesture::new(this, kind))
    }

    /// Handle a wheel event at `time_ms`; returns whether it was consumed
    pub fn on_wheel(&self, event: &WheelEvent, time_ms: f64) -> bool {
        if self.pending_steps() != 0 {
            return false;
        }
        match *event {
            WheelEvent::Discrete { direction, .. } => self.on_wheel_discrete(direction),
            WheelEvent::Continuous {
                delta,
                direction,
                axis_inverted,
                roll_out_phase,
                modifiers,
            } => {
                let delta = if axis_inverted { -delta } else { delta };
                let (dx, dy) = if direction.is_vertical() {
                    (0.0, delta)
                } else {
                    (delta, 0.0)
                };
                self.on_wheel_continuous(dx, dy, direction, roll_out_phase, modifiers.shift(), time_ms)
            }
        }
    }

    fn on_wheel_discrete(&self, direction: WheelDirection) -> bool {
        let preferred = if direction.is_vertical() {
            Axis::Vertical
        } else {
            Axis::Horizontal
        };
        let axis = if self.can_scroll(preferred) {
            preferred
        } else if self.can_scroll(Axis::Vertical) {
            Axis::Vertical
        } else {
            Axis::Horizontal
        };
        let Some(param) = self.scroll_param(axis) else {
            return true;
        };

        self.stop_animation(axis);
        param.begin_edit();
        let forward = matches!(direction, WheelDirection::Down | WheelDirection::Right);
        let wrap_around = self.config.wrap_around;
        if forward {
            if param.value() == param.max() && wrap_around {
                param.set_value(param.min());
            } else {
                param.increment();
            }
        } else if param.value() == param.min() && wrap_around {
            param.set_value(param.max());
        } else {
            param.decrement();
        }
        param.perform_update();
        param.end_edit();
        self.on_scroll_param_changed(axis);
        true
    }

    fn on_wheel_continuous(
        &self,
        mut dx: f32,
        mut dy: f32,
        direction: WheelDirection,
        roll_out_phase: bool,
        fine: bool,
        time_ms: f64,
    ) -> bool {
        self.state.borrow_mut().tasks.clear();

        let sign_x = sign_of(dx);
        let sign_y = sign_of(dy);
        if !roll_out_phase {
            if self.needs_bounce_animation(Axis::Horizontal) {
                dx *= OUT_OF_RANGE_FRICTION;
            }
            if self.needs_bounce_animation(Axis::Vertical) {
                dy *= OUT_OF_RANGE_FRICTION;
            }
        }
        let range_x = self.value_range(Axis::Horizontal);
        let range_y = self.value_range(Axis::Vertical);
        let factor = if fine {
            physics::FINE_ROLL_OUT_FACTOR
        } else {
            physics::ROLL_OUT_FACTOR
        };

        let outcome = {
            let mut state = self.state.borrow_mut();
            let wheel = &mut state.wheel;

            // the first event of a scroll counts as a long pause
            let mut elapsed = wheel
                .last_event_ms
                .map_or(f64::INFINITY, |last| (time_ms - last).max(1.0));
            wheel.last_event_ms = Some(time_ms);

            let direction_change = match self.config.direction {
                ScrollDirection::Vertical => sign_y != wheel.sign_y,
                ScrollDirection::Horizontal => sign_x != wheel.sign_x,
                ScrollDirection::Both => sign_x != wheel.sign_x || sign_y != wheel.sign_y,
            };
            wheel.sign_x = sign_x;
            wheel.sign_y = sign_y;

            if elapsed > WHEEL_RESET_MS || direction_change {
                wheel.pps = Point::ZERO;
                wheel.accumulated = Point::ZERO;
                elapsed = WHEEL_RESTART_MS;
            }

            wheel.accumulated.x += physics::boosted_delta(dx, wheel.pps.x, range_x) * factor;
            wheel.accumulated.y += physics::boosted_delta(dy, wheel.pps.y, range_y) * factor;

            if roll_out_phase {
                let velocity = (!wheel.roll_out_triggered).then(|| {
                    Point::new(
                        (-wheel.accumulated.x).clamp(-(range_x as f32), range_x as f32),
                        (-wheel.accumulated.y).clamp(-(range_y as f32), range_y as f32),
                    )
                });
                wheel.accumulated = Point::ZERO;
                wheel.pps = Point::ZERO;
                wheel.roll_out_triggered = true;
                WheelOutcome::RollOut(velocity)
            } else {
                wheel.roll_out_triggered = false;
                physics::average_velocity(&mut wheel.pps.x, dx, elapsed);
                physics::average_velocity(&mut wheel.pps.y, dy, elapsed);
                WheelOutcome::Move { elapsed }
            }
        };

        match outcome {
            WheelOutcome::RollOut(Some(velocity)) => {
                tracing::debug!(?velocity, "wheel roll-out hand-off");
                if let Err(err) = self.start_scroll_animation(velocity) {
                    tracing::warn!(%err, "failed to start wheel roll-out");
                }
            }
            WheelOutcome::RollOut(None) => {}
            WheelOutcome::Move { elapsed } => self.apply_wheel_delta(direction, elapsed, time_ms),
        }
        true
    }

    /// Move by the accumulated wheel delta and schedule the settling task
    fn apply_wheel_delta(&self, direction: WheelDirection, elapsed: f64, time_ms: f64) {
        let event_axis = if direction.is_vertical() {
            Axis::Vertical
        } else {
            Axis::Horizontal
        };
        self.stop_animation(event_axis);

        for axis in [Axis::Horizontal, Axis::Vertical] {
            if !self.can_scroll(axis) {
                continue;
            }
            let delta = {
                let mut state = self.state.borrow_mut();
                let accumulated = match axis {
                    Axis::Horizontal => &mut state.wheel.accumulated.x,
                    Axis::Vertical => &mut state.wheel.accumulated.y,
                };
                if accumulated.abs() > 1.0 {
                    let delta = *accumulated;
                    *accumulated = 0.0;
                    Some(delta)
                } else {
                    None
                }
            };
            if let Some(delta) = delta {
                let position = self.over_scroll_position(axis);
                self.set_scroll_value(axis, (position as f32 + delta).round() as i32);
            }
            self.schedule_settle(axis, elapsed, time_ms);
        }
    }

    /// After a pause, bounce back or walk to the snap grid
    fn schedule_settle(&self, axis: Axis, delay_ms: f64, now_ms: f64) {
        let pause = (delay_ms * 2.0).max(50.0);
        let kind = {
            let state = self.state.borrow();
            let Some(ax) = state.axis(axis) else {
                return;
            };
            if ax.needs_bounce() {
                Some(TaskKind::BounceBack(axis))
            } else {
                let snapped = ((ax.position + ax.snap / 2) / ax.snap) * ax.snap;
                let diff = snapped - ax.position;
                (diff != 0).then(|| TaskKind::SnapStep {
                    axis,
                    step: diff.signum(),
                    repeats: diff.unsigned_abs(),
                    delay_ms,
                })
            }
        };
        if let Some(kind) = kind {
            self.state.borrow_mut().tasks.push(DeferredTask {
                due_ms: now_ms + pause,
                kind,
            });
        }
    }

    /// Run deferred wheel tasks that are due; returns whether tasks remain
    pub fn poll(&self, now_ms: f64) -> bool {
        let due = {
            let mut state = self.state.borrow_mut();
            let (due, later): (SmallVec<[DeferredTask; 2]>, SmallVec<[DeferredTask; 2]>) =
                std::mem::take(&mut state.tasks)
                    .into_iter()
                    .partition(|task| task.due_ms <= now_ms);
            state.tasks = later;
            due
        };

        for task in due {
            match task.kind {
                TaskKind::BounceBack(axis) => {
                    // the position may have moved back into range meanwhile
                    if !self.needs_bounce_animation(axis) {
                        tracing::trace!(?axis, "deferred bounce-back no longer needed");
                        continue;
                    }
                    if let Err(err) = self.trigger_bounce_back(axis, 0.0) {
                        tracing::warn!(?axis, %err, "failed to start deferred bounce-back");
                    }
                }
                TaskKind::SnapStep {
                    axis,
                    step,
                    repeats,
                    delay_ms,
                } => {
                    let position = self.over_scroll_position(axis);
                    self.set_scroll_value(axis, position + step);
                    let repeats = repeats.saturating_sub(1);
                    if repeats > 0 {
                        // slow down a little with every step
                        let delay_ms = (delay_ms * 1.1).round();
                        self.state.borrow_mut().tasks.push(DeferredTask {
                            due_ms: now_ms + delay_ms,
                            kind: TaskKind::SnapStep {
                                axis,
                                step,
                                repeats,
                                delay_ms,
                            },
                        });
                    } else {
                        self.commit(axis);
                    }
                }
            }
        }
        !self.state.borrow().tasks.is_empty()
    }
}

impl AnimationTarget for OverScrollAnimator {
    fn set_property(&self, property: &PropertyId, value: &AnimatedValue, mode: WriteMode) {
        // a stopped phase must not jump back to its start
        if mode == WriteMode::Reset(ResetMode::ToStart) {
            return;
        }
        let (Some(axis), Some(value)) = (axis_of(property), value.as_scalar()) else {
            return;
        };
        self.set_scroll_value(axis, value.round() as i32);
    }
}

impl Drop for OverScrollAnimator {
    fn drop(&mut self) {
        self.scheduler
            .on_target_destroyed(TargetKey::of(&*self));
    }
}

fn sign_of(value: f32) -> i32 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}
