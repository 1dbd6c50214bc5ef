//! Timed animations
//!
//! An [`AnimationSpec`] is an immutable, cloneable description: timing,
//! repetition and the values to produce. Handing it to the
//! [`AnimationScheduler`] creates a running [`AnimationInstance`] bound to a
//! property and a clock. Instances are never reused; once stopped they are
//! discarded.
//!
//! # Example
//!
//! ```rust
//! use blinc_animation::{AnimationSpec, Easing, RepeatCount};
//!
//! let fade = AnimationSpec::basic(0.0, 1.0)
//!     .with_duration(0.3)
//!     .with_easing(Easing::EaseOut)
//!     .with_repeat(RepeatCount::Times(2))
//!     .with_auto_reverse(true);
//!
//! assert_eq!(fade.total_running_time(), Some(0.6));
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::clock::ClockId;
use crate::easing::{Easing, TimingFunction};
use crate::error::{AnimationError, Result};
use crate::property::Property;
use crate::scheduler::AnimationScheduler;
use crate::values::{compose_transform, AnimatedValue, TransformOp, TransformOps};

new_key_type! {
    pub struct AnimationId;
}

/// Durations below this are treated as zero
const MIN_DURATION: f64 = 1e-13;

/// Value written back when an animation stops
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResetMode {
    /// Restore the start value
    #[default]
    ToStart,
    /// Leave the property at the end value
    ToEnd,
}

/// How often an animation runs
///
/// With auto-reverse every leg (forward or backward) is one repetition, so
/// legs are counted rather than round trips: `Times(2)` runs forward once and
/// back once, and an odd count ends on the final value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepeatCount {
    Times(u32),
    Forever,
}

impl Default for RepeatCount {
    fn default() -> Self {
        RepeatCount::Times(1)
    }
}

/// Called once when a running animation reaches its natural end
pub trait AnimationCompletionHandler {
    fn on_finished(&self, scheduler: &AnimationScheduler);
}

impl<F> AnimationCompletionHandler for F
where
    F: Fn(&AnimationScheduler),
{
    fn on_finished(&self, scheduler: &AnimationScheduler) {
        self(scheduler)
    }
}

/// Fans one completion out to several handlers, in registration order
#[derive(Default)]
pub struct CompletionHandlerList {
    handlers: RefCell<Vec<Rc<dyn AnimationCompletionHandler>>>,
}

impl CompletionHandlerList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_handler(&self, handler: Rc<dyn AnimationCompletionHandler>) {
        self.handlers.borrow_mut().push(handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.borrow().is_empty()
    }
}

impl AnimationCompletionHandler for CompletionHandlerList {
    fn on_finished(&self, scheduler: &AnimationScheduler) {
        // Handlers may add further handlers to this list
        let handlers = self.handlers.borrow().clone();
        for handler in handlers {
            handler.on_finished(scheduler);
        }
    }
}

/// Timing part of an animation, loadable from configuration files
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationDescription {
    /// Duration of one repetition in seconds
    #[serde(default = "default_duration")]
    pub duration: f64,
    #[serde(default)]
    pub easing: Easing,
    #[serde(default)]
    pub repeat: RepeatCount,
    #[serde(default)]
    pub auto_reverse: bool,
    #[serde(default)]
    pub reset_mode: ResetMode,
}

fn default_duration() -> f64 {
    0.25
}

impl Default for AnimationDescription {
    fn default() -> Self {
        Self {
            duration: default_duration(),
            easing: Easing::default(),
            repeat: RepeatCount::default(),
            auto_reverse: false,
            reset_mode: ResetMode::default(),
        }
    }
}

/// What an animation produces
#[derive(Clone, Debug, PartialEq)]
pub enum AnimationKind {
    /// Blend between two values of the same kind
    Basic {
        from: AnimatedValue,
        to: AnimatedValue,
    },
    /// Compose interpolated transform operations
    Transform(TransformOps),
}

impl AnimationKind {
    fn value_at(&self, normalized: f64) -> AnimatedValue {
        match self {
            AnimationKind::Basic { from, to } => from.interpolate(to, normalized).unwrap_or(*from),
            AnimationKind::Transform(ops) => {
                AnimatedValue::Transform(compose_transform(ops, normalized))
            }
        }
    }
}

/// Immutable animation prototype
#[derive(Clone)]
pub struct AnimationSpec {
    description: AnimationDescription,
    kind: AnimationKind,
    clock: Option<ClockId>,
    completion: Option<Rc<dyn AnimationCompletionHandler>>,
}

impl AnimationSpec {
    pub fn new(kind: AnimationKind) -> Self {
        Self {
            description: AnimationDescription::default(),
            kind,
            clock: None,
            completion: None,
        }
    }

    /// Blend `from -> to`
    pub fn basic(from: impl Into<AnimatedValue>, to: impl Into<AnimatedValue>) -> Self {
        Self::new(AnimationKind::Basic {
            from: from.into(),
            to: to.into(),
        })
    }

    pub fn transform(ops: impl IntoIterator<Item = TransformOp>) -> Self {
        Self::new(AnimationKind::Transform(ops.into_iter().collect()))
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.description.duration = seconds;
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.description.easing = easing;
        self
    }

    pub fn with_repeat(mut self, repeat: RepeatCount) -> Self {
        self.description.repeat = repeat;
        self
    }

    pub fn with_auto_reverse(mut self, auto_reverse: bool) -> Self {
        self.description.auto_reverse = auto_reverse;
        self
    }

    pub fn with_reset_mode(mut self, reset_mode: ResetMode) -> Self {
        self.description.reset_mode = reset_mode;
        self
    }

    pub fn with_description(mut self, description: AnimationDescription) -> Self {
        self.description = description;
        self
    }

    /// Run on a shared clock (see [`AnimationScheduler::shared_clock`])
    pub fn with_clock(mut self, clock: ClockId) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn on_finished(mut self, handler: impl AnimationCompletionHandler + 'static) -> Self {
        self.completion = Some(Rc::new(handler));
        self
    }

    pub fn with_completion_handler(mut self, handler: Rc<dyn AnimationCompletionHandler>) -> Self {
        self.completion = Some(handler);
        self
    }

    pub fn description(&self) -> &AnimationDescription {
        &self.description
    }

    pub fn kind(&self) -> &AnimationKind {
        &self.kind
    }

    pub fn duration(&self) -> f64 {
        self.description.duration
    }

    pub fn easing(&self) -> Easing {
        self.description.easing
    }

    pub fn repeat(&self) -> RepeatCount {
        self.description.repeat
    }

    pub fn auto_reverse(&self) -> bool {
        self.description.auto_reverse
    }

    pub fn reset_mode(&self) -> ResetMode {
        self.description.reset_mode
    }

    pub fn clock(&self) -> Option<ClockId> {
        self.clock
    }

    pub fn completion_handler(&self) -> Option<&Rc<dyn AnimationCompletionHandler>> {
        self.completion.as_ref()
    }

    pub fn first_value(&self) -> AnimatedValue {
        self.kind.value_at(0.0)
    }

    pub fn final_value(&self) -> AnimatedValue {
        self.kind.value_at(1.0)
    }

    /// Overall running time, `None` for endless animations
    pub fn total_running_time(&self) -> Option<f64> {
        match self.description.repeat {
            RepeatCount::Forever => None,
            RepeatCount::Times(n) => Some(self.description.duration * n as f64),
        }
    }

    /// Check the spec can be started
    pub fn validate(&self) -> Result<()> {
        let duration = self.description.duration;
        if !duration.is_finite() || duration < 0.0 {
            return Err(AnimationError::InvalidArgument(
                "duration must be finite and not negative",
            ));
        }
        if let AnimationKind::Basic { from, to } = &self.kind {
            if !from.is_interpolable() {
                return Err(AnimationError::NotAnimatable(from.kind_name()));
            }
            if std::mem::discriminant(from) != std::mem::discriminant(to) {
                return Err(AnimationError::ValueMismatch {
                    from: from.kind_name(),
                    to: to.kind_name(),
                });
            }
        }
        Ok(())
    }

    /// Position within the current repetition, `None` once the animation ended
    pub fn position_at(&self, relative_time: f64) -> Option<f64> {
        let duration = self.description.duration;
        if duration < MIN_DURATION {
            return None;
        }

        let relative_time = relative_time.max(0.0);
        let repeat_index = (relative_time / duration).floor();
        if let RepeatCount::Times(count) = self.description.repeat {
            if repeat_index >= count as f64 {
                return None;
            }
        }

        let position = (relative_time % duration) / duration;
        if self.description.auto_reverse && repeat_index % 2.0 == 1.0 {
            Some(1.0 - position)
        } else {
            Some(position)
        }
    }

    /// Value produced `relative_time` seconds after the start
    pub fn value_at_time(&self, relative_time: f64) -> AnimatedValue {
        match self.position_at(relative_time) {
            Some(position) => self
                .kind
                .value_at(self.description.easing.apply(position)),
            None => self.final_value(),
        }
    }

    fn reset_value(&self) -> AnimatedValue {
        match self.description.reset_mode {
            ResetMode::ToStart => self.first_value(),
            ResetMode::ToEnd => self.final_value(),
        }
    }
}

impl fmt::Debug for AnimationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationSpec")
            .field("description", &self.description)
            .field("kind", &self.kind)
            .field("clock", &self.clock)
            .field("has_completion_handler", &self.completion.is_some())
            .finish()
    }
}

/// Lifecycle of a running instance
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationState {
    Stopped,
    Running,
}

/// Outcome of advancing an instance by one tick
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Step {
    Write(AnimatedValue),
    Finished,
}

/// A spec bound to a property and a clock
#[derive(Debug)]
pub struct AnimationInstance {
    spec: AnimationSpec,
    timing: TimingFunction,
    property: Property,
    clock: ClockId,
    private_clock: bool,
    start_time: f64,
    state: AnimationState,
}

impl AnimationInstance {
    pub(crate) fn new(
        spec: AnimationSpec,
        property: Property,
        clock: ClockId,
        private_clock: bool,
    ) -> Self {
        Self {
            timing: TimingFunction::from(spec.easing()),
            spec,
            property,
            clock,
            private_clock,
            start_time: 0.0,
            state: AnimationState::Stopped,
        }
    }

    pub fn spec(&self) -> &AnimationSpec {
        &self.spec
    }

    pub fn property(&self) -> &Property {
        &self.property
    }

    pub fn clock(&self) -> ClockId {
        self.clock
    }

    pub(crate) fn has_private_clock(&self) -> bool {
        self.private_clock
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == AnimationState::Running
    }

    /// Enter `Running`; a second start is a programming error and ignored
    pub(crate) fn start(&mut self, now: f64) -> bool {
        if self.is_running() {
            debug_assert!(false, "animation started twice");
            tracing::warn!(property = %self.property.id(), "animation is already running");
            return false;
        }
        self.start_time = now;
        self.state = AnimationState::Running;
        true
    }

    /// Compute this tick's output
    pub(crate) fn step(&self, now: f64) -> Step {
        let relative = now - self.start_time;
        match self.spec.position_at(relative) {
            Some(position) => {
                let normalized = self.timing.normalized_value(position);
                tracing::trace!(
                    property = %self.property.id(),
                    position,
                    normalized,
                    "animate"
                );
                Step::Write(self.spec.kind.value_at(normalized))
            }
            None => Step::Finished,
        }
    }

    /// Leave `Running` and return the value to restore
    pub(crate) fn mark_stopped(&mut self) -> AnimatedValue {
        self.state = AnimationState::Stopped;
        self.spec.reset_value()
    }
}
