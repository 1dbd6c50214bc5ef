//! Animation clocks
//!
//! A clock groups animations that share one time base. It samples the time
//! source once per tick so every animation in the group sees the same `now`,
//! and it only asks for ticks while it has animations to drive.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use slotmap::new_key_type;
use smallvec::SmallVec;

use crate::animation::AnimationId;

new_key_type! {
    pub struct ClockId;
}

/// Source of the current time in seconds
pub trait TimeSource {
    fn now(&self) -> f64;
}

/// Monotonic wall clock
#[derive(Debug)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Manually advanced time, for deterministic tests and offline rendering
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    now: Cell<f64>,
}

impl ManualTimeSource {
    pub fn new(start: f64) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn set(&self, now: f64) {
        self.now.set(now);
    }

    pub fn advance(&self, seconds: f64) {
        self.now.set(self.now.get() + seconds);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

/// Bracket of a clock tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimatePhase {
    Begin,
    End,
}

/// Notified around every batch of property writes made by a clock
pub trait ClockObserver {
    fn on_animate(&self, phase: AnimatePhase);
}

/// Calls `on_animate(Begin)` on creation and `on_animate(End)` on drop
pub struct ClockScope {
    observers: SmallVec<[Rc<dyn ClockObserver>; 2]>,
}

impl ClockScope {
    pub(crate) fn enter(observers: SmallVec<[Rc<dyn ClockObserver>; 2]>) -> Self {
        for observer in &observers {
            observer.on_animate(AnimatePhase::Begin);
        }
        Self { observers }
    }
}

impl Drop for ClockScope {
    fn drop(&mut self) {
        for observer in &self.observers {
            observer.on_animate(AnimatePhase::End);
        }
    }
}

/// A group of running animations sharing one time base
pub struct AnimationClock {
    name: Option<String>,
    animations: Vec<AnimationId>,
    system_time: f64,
    timer_enabled: bool,
    observers: SmallVec<[Rc<dyn ClockObserver>; 2]>,
}

impl AnimationClock {
    pub fn new(name: Option<String>) -> Self {
        Self {
            name,
            animations: Vec::new(),
            system_time: 0.0,
            timer_enabled: false,
            observers: SmallVec::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Time sampled at the last tick (or when the timer was enabled)
    pub fn system_time(&self) -> f64 {
        self.system_time
    }

    pub fn is_timer_enabled(&self) -> bool {
        self.timer_enabled
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    pub fn contains(&self, id: AnimationId) -> bool {
        self.animations.contains(&id)
    }

    /// Register an animation, enabling the timer if it was idle
    pub fn add_animation(&mut self, id: AnimationId, now: f64) {
        if !self.contains(id) {
            self.animations.push(id);
        }
        if !self.timer_enabled {
            self.timer_enabled = true;
            self.system_time = now;
            tracing::trace!(clock = ?self.name, "clock timer enabled");
        }
    }

    /// Deregister an animation, disabling the timer once the clock is empty
    pub fn remove_animation(&mut self, id: AnimationId) -> bool {
        let Some(index) = self.animations.iter().position(|a| *a == id) else {
            return false;
        };
        self.animations.remove(index);
        if self.animations.is_empty() && self.timer_enabled {
            self.timer_enabled = false;
            tracing::trace!(clock = ?self.name, "clock timer disabled");
        }
        true
    }

    pub fn add_observer(&mut self, observer: Rc<dyn ClockObserver>) {
        self.observers.push(observer);
    }

    pub fn remove_observer(&mut self, observer: &Rc<dyn ClockObserver>) -> bool {
        let before = self.observers.len();
        self.observers.retain(|o| !Rc::ptr_eq(o, observer));
        self.observers.len() != before
    }

    /// Refresh the time and snapshot the animations to advance
    ///
    /// Animations may leave the clock while the snapshot is processed; callers
    /// must skip ids that are no longer registered.
    pub fn begin_tick(&mut self, now: f64) -> Vec<AnimationId> {
        self.system_time = now;
        self.animations.clone()
    }

    pub(crate) fn observers(&self) -> SmallVec<[Rc<dyn ClockObserver>; 2]> {
        self.observers.clone()
    }

    /// Edit bracket for writes made on behalf of this clock
    pub fn scope(&self) -> ClockScope {
        ClockScope::enter(self.observers())
    }
}

impl std::fmt::Debug for AnimationClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationClock")
            .field("name", &self.name)
            .field("animations", &self.animations.len())
            .field("system_time", &self.system_time)
            .field("timer_enabled", &self.timer_enabled)
            .finish()
    }
}
