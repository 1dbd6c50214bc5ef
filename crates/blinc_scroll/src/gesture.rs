//! Drag gestures feeding an [`OverScrollAnimator`]
//!
//! A gesture follows the pointer while it is down and hands the averaged
//! release velocity to the animator's rollout. Short taps that barely move
//! are reported as clicks instead.

use std::rc::Rc;

use blinc_core::{Modifiers, Point};

use crate::animator::OverScrollAnimator;
use crate::config::Axis;
use crate::error::Result;
use crate::physics;

/// Largest pointer travel, per axis, that still counts as a click
const CLICK_SLOP: f32 = 2.0;

/// Longest press that still counts as a click
const CLICK_TIME_MS: f64 = 250.0;

/// Input device driving a gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureKind {
    #[default]
    Mouse,
    /// Touch screens get half again as much release boost
    Touch,
}

/// Pointer drag on an overscroll animator
///
/// Created by [`OverScrollAnimator::create_gesture`]. Times are in
/// milliseconds of any monotonic clock.
pub struct OverScrollGesture {
    animator: Rc<OverScrollAnimator>,
    kind: GestureKind,
    click_action: Option<Box<dyn Fn()>>,
    start_where: Point,
    start_time_ms: f64,
    prev_where: Point,
    prev_time_ms: f64,
    /// Unrounded raw positions
    value: Point,
    last_delta: Point,
    pps: Point,
    fine: bool,
    is_click: bool,
}

impl OverScrollGesture {
    pub(crate) fn new(animator: Rc<OverScrollAnimator>, kind: GestureKind) -> Self {
        Self {
            animator,
            kind,
            click_action: None,
            start_where: Point::ZERO,
            start_time_ms: 0.0,
            prev_where: Point::ZERO,
            prev_time_ms: 0.0,
            value: Point::ZERO,
            last_delta: Point::ZERO,
            pps: Point::ZERO,
            fine: false,
            is_click: true,
        }
    }

    /// Run `action` instead of scrolling when the gesture is a click
    pub fn with_click_action(mut self, action: impl Fn() + 'static) -> Self {
        self.click_action = Some(Box::new(action));
        self
    }

    pub fn kind(&self) -> GestureKind {
        self.kind
    }

    /// Averaged pointer velocity in points per second
    pub fn velocity(&self) -> Point {
        self.pps
    }

    fn scrolling_axes(&self) -> impl Iterator<Item = Axis> + '_ {
        Axis::BOTH
            .into_iter()
            .filter(|axis| self.animator.can_scroll(*axis))
    }

    fn current_positions(&self) -> Point {
        Point::new(
            self.animator.over_scroll_position(Axis::Horizontal) as f32,
            self.animator.over_scroll_position(Axis::Vertical) as f32,
        )
    }

    pub fn on_begin(&mut self, at: Point, modifiers: Modifiers, time_ms: f64) {
        for axis in self.scrolling_axes() {
            if let Some(param) = self.animator.scroll_param(axis) {
                param.begin_edit();
            }
        }
        self.start_where = at;
        self.prev_where = at;
        self.start_time_ms = time_ms;
        self.prev_time_ms = time_ms;
        self.value = self.current_positions();
        self.last_delta = Point::ZERO;
        self.pps = Point::ZERO;
        self.fine = modifiers.shift();
        self.is_click = true;
    }

    pub fn on_move(&mut self, at: Point, modifiers: Modifiers, time_ms: f64) {
        if self.is_click {
            self.animator.stop_animation(Axis::Vertical);
            self.animator.stop_animation(Axis::Horizontal);
            self.is_click = false;
        }

        // switching precision continues from where the content is
        if modifiers.shift() != self.fine {
            self.fine = modifiers.shift();
            self.value = self.current_positions();
            self.prev_where = at;
        }

        let elapsed = time_ms - self.prev_time_ms;
        if elapsed <= 0.0 {
            return;
        }

        let delta = Point::new(self.prev_where.x - at.x, self.prev_where.y - at.y);
        let factor = if self.fine { 0.2 } else { 0.8 };
        self.value.x += delta.x * factor;
        self.value.y += delta.y * factor;

        for axis in Axis::BOTH {
            if !self.animator.can_scroll(axis) {
                continue;
            }
            let (value, d, pps) = match axis {
                Axis::Horizontal => (self.value.x, delta.x, &mut self.pps.x),
                Axis::Vertical => (self.value.y, delta.y, &mut self.pps.y),
            };
            physics::average_velocity(pps, d, elapsed);
            self.animator.set_scroll_value(axis, value.round() as i32);
        }

        self.last_delta = delta;
        self.prev_where = at;
        self.prev_time_ms = time_ms;
    }

    /// Called while the pointer rests; the remembered velocity decays
    pub fn on_periodic(&mut self) {
        self.pps.x *= 0.5;
        self.pps.y *= 0.5;
    }

    /// Finish the gesture with a click or a rollout
    pub fn on_release(&mut self, at: Point, modifiers: Modifiers, time_ms: f64) -> Result<()> {
        let short_press = (at.x - self.start_where.x).abs() <= CLICK_SLOP
            && (at.y - self.start_where.y).abs() <= CLICK_SLOP
            && time_ms - self.start_time_ms < CLICK_TIME_MS;

        if let Some(action) = self.click_action.as_ref() {
            if self.is_click || short_press {
                tracing::debug!(?at, "overscroll gesture click");
                action();
                for axis in self.scrolling_axes() {
                    if let Some(param) = self.animator.scroll_param(axis) {
                        param.end_edit();
                    }
                }
                return Ok(());
            }
        }

        let fine = modifiers.shift();
        let velocity = Point::new(
            physics::release_velocity(
                self.last_delta.x,
                self.pps.x,
                self.boost_range(Axis::Horizontal),
                fine,
            ),
            physics::release_velocity(
                self.last_delta.y,
                self.pps.y,
                self.boost_range(Axis::Vertical),
                fine,
            ),
        );
        tracing::debug!(?velocity, "overscroll gesture released");
        self.animator.start_scroll_animation(velocity)
    }

    fn boost_range(&self, axis: Axis) -> i32 {
        let range = self.animator.value_range(axis);
        match self.kind {
            GestureKind::Mouse => range,
            GestureKind::Touch => (range as f32 * 1.5) as i32,
        }
    }
}
