//! Animation scheduler
//!
//! Owns every running animation and its clock, keyed by the property it
//! drives. There is at most one animation per resolved property: starting a
//! second one replaces the first.
//!
//! The scheduler is single-threaded and re-entrant. It never holds its
//! internal borrow while calling out to targets, handlers, clock observers or
//! completion handlers, so all of them may start or cancel animations.
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use blinc_animation::{
//!     AnimatedValue, AnimationScheduler, AnimationSpec, AnimationTarget, ManualTimeSource,
//!     PropertyId, WriteMode,
//! };
//!
//! #[derive(Default)]
//! struct Opacity(Cell<f64>);
//!
//! impl AnimationTarget for Opacity {
//!     fn set_property(&self, _: &PropertyId, value: &AnimatedValue, _: WriteMode) {
//!         self.0.set(value.as_scalar().unwrap_or_default());
//!     }
//! }
//!
//! let time = Rc::new(ManualTimeSource::new(0.0));
//! let scheduler = AnimationScheduler::with_time_source(time.clone());
//! let view = Rc::new(Opacity::default());
//! let target: Rc<dyn AnimationTarget> = view.clone();
//!
//! let fade = AnimationSpec::basic(0.0, 1.0).with_duration(1.0);
//! scheduler.add_animation(&target, "opacity", &fade).unwrap();
//!
//! time.advance(0.5);
//! scheduler.tick();
//! assert_eq!(view.0.get(), 0.5);
//! ```

use std::cell::RefCell;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use rustc_hash::{FxHashMap, FxHasher};
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::animation::{AnimationId, AnimationInstance, AnimationSpec, AnimationState, Step};
use crate::clock::{AnimationClock, ClockId, ClockObserver, ClockScope, SystemTimeSource, TimeSource};
use crate::error::{AnimationError, Result};
use crate::property::{AnimationTarget, Property, PropertyId, TargetKey, WriteMode};

/// Number of hash buckets for target lookup
const BUCKET_COUNT: usize = 64;

/// Result of [`AnimationScheduler::add_animation`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddOutcome {
    Started(AnimationId),
    /// A registered [`AnimationHandler`] took over the request
    Handled,
}

/// Result of [`AnimationScheduler::remove_animation`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    AlreadyAbsent,
    /// A registered [`AnimationHandler`] took over the request
    Handled,
}

/// Answer of an [`AnimationHandler`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandlerOutcome {
    Handled,
    NotHandled,
}

/// Intercepts animation requests before the scheduler's own path
///
/// Used to forward animations to an external engine (for example native
/// platform animations) for selected targets or properties.
pub trait AnimationHandler {
    fn try_add(
        &self,
        target: &Rc<dyn AnimationTarget>,
        property: &PropertyId,
        spec: &AnimationSpec,
    ) -> HandlerOutcome;

    fn try_remove(&self, _target: &Rc<dyn AnimationTarget>, _property: &PropertyId) -> HandlerOutcome {
        HandlerOutcome::NotHandled
    }
}

/// Animations of one target object
struct TargetItem {
    key: TargetKey,
    target: Weak<dyn AnimationTarget>,
    animations: SmallVec<[AnimationId; 4]>,
}

impl TargetItem {
    fn is_alive(&self) -> bool {
        self.target.strong_count() > 0
    }
}

struct Inner {
    animations: SlotMap<AnimationId, AnimationInstance>,
    clocks: SlotMap<ClockId, AnimationClock>,
    shared_clocks: FxHashMap<String, ClockId>,
    buckets: Vec<Vec<TargetItem>>,
    handlers: Vec<Rc<dyn AnimationHandler>>,
    pending_finished: Vec<AnimationId>,
}

impl Inner {
    fn new() -> Self {
        Self {
            animations: SlotMap::with_key(),
            clocks: SlotMap::with_key(),
            shared_clocks: FxHashMap::default(),
            buckets: (0..BUCKET_COUNT).map(|_| Vec::new()).collect(),
            handlers: Vec::new(),
            pending_finished: Vec::new(),
        }
    }

    fn bucket_index(key: TargetKey) -> usize {
        let mut hasher = FxHasher::default();
        key.raw().hash(&mut hasher);
        (hasher.finish() as usize) % BUCKET_COUNT
    }

    fn item(&self, key: TargetKey) -> Option<&TargetItem> {
        self.buckets[Self::bucket_index(key)]
            .iter()
            .find(|item| item.key == key && item.is_alive())
    }

    fn find_animation(&self, property: &Property) -> Option<AnimationId> {
        self.item(property.key())?
            .animations
            .iter()
            .copied()
            .find(|id| {
                self.animations
                    .get(*id)
                    .is_some_and(|a| a.property().id() == property.id())
            })
    }

    /// Register `id` with the property's target, creating the item on demand
    ///
    /// An item whose target died (its address may have been reused) is purged
    /// first.
    fn attach(&mut self, property: &Property, id: AnimationId, garbage: &mut Vec<AnimationInstance>) {
        let key = property.key();
        let bucket = Self::bucket_index(key);
        if let Some(index) = self.buckets[bucket]
            .iter()
            .position(|item| item.key == key && !item.is_alive())
        {
            let stale = self.buckets[bucket].swap_remove(index);
            for old in stale.animations {
                garbage.extend(self.release(old));
            }
        }

        let items = &mut self.buckets[bucket];
        match items.iter_mut().find(|item| item.key == key) {
            Some(item) => item.animations.push(id),
            None => items.push(TargetItem {
                key,
                target: property.weak_target(),
                animations: SmallVec::from_elem(id, 1),
            }),
        }
    }

    /// Unregister `id` from its target item, dropping the item once empty
    fn detach(&mut self, id: AnimationId) {
        let Some(key) = self.animations.get(id).map(|a| a.property().key()) else {
            return;
        };
        let items = &mut self.buckets[Self::bucket_index(key)];
        if let Some(index) = items.iter().position(|item| item.key == key) {
            items[index].animations.retain(|a| *a != id);
            if items[index].animations.is_empty() {
                items.swap_remove(index);
            }
        }
    }

    /// Remove an instance from the arena and its clock
    ///
    /// The instance is returned so the caller can drop it (and whatever its
    /// completion handler captured) outside the borrow.
    fn release(&mut self, id: AnimationId) -> Option<AnimationInstance> {
        let instance = self.animations.remove(id)?;
        let clock = instance.clock();
        if instance.has_private_clock() {
            self.clocks.remove(clock);
        } else if let Some(clock) = self.clocks.get_mut(clock) {
            clock.remove_animation(id);
        }
        Some(instance)
    }

    fn purge_target(&mut self, key: TargetKey) -> Vec<AnimationInstance> {
        let items = &mut self.buckets[Self::bucket_index(key)];
        let Some(index) = items.iter().position(|item| item.key == key) else {
            return Vec::new();
        };
        let item = items.swap_remove(index);
        item.animations
            .into_iter()
            .filter_map(|id| self.release(id))
            .collect()
    }
}

/// Drives all animations of an application
pub struct AnimationScheduler {
    inner: RefCell<Inner>,
    time: Rc<dyn TimeSource>,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self::with_time_source(Rc::new(SystemTimeSource::new()))
    }

    pub fn with_time_source(time: Rc<dyn TimeSource>) -> Self {
        Self {
            inner: RefCell::new(Inner::new()),
            time,
        }
    }

    /// Current time of the scheduler's time source, in seconds
    pub fn now(&self) -> f64 {
        self.time.now()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Clocks
    // ─────────────────────────────────────────────────────────────────────────

    /// Named clock shared by every spec that opts into it, created on first use
    pub fn shared_clock(&self, name: &str) -> Result<ClockId> {
        if name.is_empty() {
            return Err(AnimationError::EmptyClockName);
        }
        let mut inner = self.inner.borrow_mut();
        if let Some(id) = inner.shared_clocks.get(name) {
            return Ok(*id);
        }
        let id = inner.clocks.insert(AnimationClock::new(Some(name.to_owned())));
        inner.shared_clocks.insert(name.to_owned(), id);
        tracing::debug!(clock = name, "created shared clock");
        Ok(id)
    }

    /// Bracket every tick of `clock` with `on_animate` notifications
    pub fn observe_clock(&self, clock: ClockId, observer: Rc<dyn ClockObserver>) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let clock = inner
            .clocks
            .get_mut(clock)
            .ok_or(AnimationError::InvalidArgument("unknown clock"))?;
        clock.add_observer(observer);
        Ok(())
    }

    /// Time sampled by `clock` at its last tick
    pub fn clock_time(&self, clock: ClockId) -> Option<f64> {
        self.inner.borrow().clocks.get(clock).map(|c| c.system_time())
    }

    /// Whether any clock still wants ticks
    pub fn has_active_animations(&self) -> bool {
        self.inner
            .borrow()
            .clocks
            .values()
            .any(|clock| clock.is_timer_enabled())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Handlers
    // ─────────────────────────────────────────────────────────────────────────

    pub fn register_handler(&self, handler: Rc<dyn AnimationHandler>) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.handlers.iter().any(|h| Rc::ptr_eq(h, &handler)) {
            return Err(AnimationError::HandlerAlreadyRegistered);
        }
        inner.handlers.push(handler);
        Ok(())
    }

    pub fn unregister_handler(&self, handler: &Rc<dyn AnimationHandler>) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let index = inner
            .handlers
            .iter()
            .position(|h| Rc::ptr_eq(h, handler))
            .ok_or(AnimationError::HandlerNotRegistered)?;
        inner.handlers.remove(index);
        Ok(())
    }

    fn handlers(&self) -> Vec<Rc<dyn AnimationHandler>> {
        self.inner.borrow().handlers.clone()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Animations
    // ─────────────────────────────────────────────────────────────────────────

    /// Start `spec` on `target`'s `property`, replacing any animation already
    /// running on that property
    pub fn add_animation(
        &self,
        target: &Rc<dyn AnimationTarget>,
        property: impl Into<PropertyId>,
        spec: &AnimationSpec,
    ) -> Result<AddOutcome> {
        let property = Property::resolve(target, property.into()).map_err(|err| {
            tracing::warn!(%err, "rejected animation");
            err
        })?;
        if let Err(err) = spec.validate() {
            tracing::warn!(property = %property.id(), %err, "rejected animation");
            return Err(err);
        }
        let holder = property.target().ok_or(AnimationError::TargetDropped)?;

        for handler in self.handlers() {
            if handler.try_add(&holder, property.id(), spec) == HandlerOutcome::Handled {
                tracing::debug!(property = %property.id(), "animation taken over by handler");
                return Ok(AddOutcome::Handled);
            }
        }
        drop(holder);

        let now = self.time.now();
        let mut garbage = Vec::new();
        let id = {
            let mut inner = self.inner.borrow_mut();
            if let Some(clock) = spec.clock() {
                if !inner.clocks.contains_key(clock) {
                    return Err(AnimationError::InvalidArgument("unknown clock"));
                }
            }

            if let Some(existing) = inner.find_animation(&property) {
                tracing::debug!(property = %property.id(), "superseding running animation");
                inner.detach(existing);
                garbage.extend(inner.release(existing));
            }

            let (clock, private_clock) = match spec.clock() {
                Some(clock) => (clock, false),
                None => (inner.clocks.insert(AnimationClock::new(None)), true),
            };
            let instance = AnimationInstance::new(spec.clone(), property.clone(), clock, private_clock);
            let id = inner.animations.insert(instance);
            inner.attach(&property, id, &mut garbage);

            let start_time = match inner.clocks.get_mut(clock) {
                Some(clock) => {
                    clock.add_animation(id, now);
                    clock.system_time()
                }
                None => now,
            };
            if let Some(instance) = inner.animations.get_mut(id) {
                instance.start(start_time);
            }
            id
        };
        drop(garbage);

        tracing::debug!(
            property = %property.id(),
            duration = spec.duration(),
            "animation started"
        );
        Ok(AddOutcome::Started(id))
    }

    /// Cancel the animation running on `target`'s `property`
    ///
    /// A still running animation writes its reset value before it is
    /// discarded.
    pub fn remove_animation(
        &self,
        target: &Rc<dyn AnimationTarget>,
        property: impl Into<PropertyId>,
    ) -> Result<RemoveOutcome> {
        let property = Property::resolve(target, property.into())?;
        let holder = property.target().ok_or(AnimationError::TargetDropped)?;

        for handler in self.handlers() {
            if handler.try_remove(&holder, property.id()) == HandlerOutcome::Handled {
                tracing::debug!(property = %property.id(), "removal taken over by handler");
                return Ok(RemoveOutcome::Handled);
            }
        }
        drop(holder);

        let (instance, observers) = {
            let mut inner = self.inner.borrow_mut();
            let Some(id) = inner.find_animation(&property) else {
                return Ok(RemoveOutcome::AlreadyAbsent);
            };
            let observers = inner
                .animations
                .get(id)
                .and_then(|a| inner.clocks.get(a.clock()))
                .map(|clock| clock.observers())
                .unwrap_or_default();
            inner.detach(id);
            (inner.release(id), observers)
        };

        if let Some(mut instance) = instance {
            if instance.is_running() {
                let value = instance.mark_stopped();
                let mode = instance.spec().reset_mode();
                let _scope = ClockScope::enter(observers);
                instance.property().set(&value, WriteMode::Reset(mode));
            }
        }
        tracing::debug!(property = %property.id(), "animation removed");
        Ok(RemoveOutcome::Removed)
    }

    /// Drop every animation of a target that is being destroyed
    ///
    /// Nothing is written to the target.
    pub fn on_target_destroyed(&self, target: TargetKey) {
        let garbage = self.inner.borrow_mut().purge_target(target);
        if !garbage.is_empty() {
            tracing::debug!(count = garbage.len(), "purged animations of destroyed target");
        }
    }

    pub fn is_animating(&self, target: &Rc<dyn AnimationTarget>, property: impl Into<PropertyId>) -> bool {
        self.running_animation(target, property).is_some()
    }

    /// Id of the animation running on a property
    pub fn running_animation(
        &self,
        target: &Rc<dyn AnimationTarget>,
        property: impl Into<PropertyId>,
    ) -> Option<AnimationId> {
        let property = Property::resolve(target, property.into()).ok()?;
        let inner = self.inner.borrow();
        inner
            .find_animation(&property)
            .filter(|id| inner.animations.get(*id).is_some_and(|a| a.is_running()))
    }

    pub fn animation_state(&self, id: AnimationId) -> Option<AnimationState> {
        self.inner.borrow().animations.get(id).map(|a| a.state())
    }

    /// Number of registered instances, including finished ones awaiting cleanup
    pub fn animation_count(&self) -> usize {
        self.inner.borrow().animations.len()
    }

    /// Number of targets with registered animations
    pub fn target_count(&self) -> usize {
        self.inner.borrow().buckets.iter().map(Vec::len).sum()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ticking
    // ─────────────────────────────────────────────────────────────────────────

    /// Advance every active clock; returns whether more ticks are needed
    pub fn tick(&self) -> bool {
        let now = self.time.now();
        let clocks: SmallVec<[ClockId; 8]> = self
            .inner
            .borrow()
            .clocks
            .iter()
            .filter(|(_, clock)| clock.is_timer_enabled())
            .map(|(id, _)| id)
            .collect();

        for clock in clocks {
            let (snapshot, observers) = {
                let mut inner = self.inner.borrow_mut();
                let Some(clock) = inner.clocks.get_mut(clock) else {
                    continue;
                };
                (clock.begin_tick(now), clock.observers())
            };

            let _scope = ClockScope::enter(observers);
            for id in snapshot {
                self.advance(id);
            }
        }

        self.process_finished();
        self.has_active_animations()
    }

    fn advance(&self, id: AnimationId) {
        let (step, property) = {
            let inner = self.inner.borrow();
            let Some(instance) = inner.animations.get(id) else {
                return;
            };
            if !instance.is_running() {
                return;
            }
            let Some(clock) = inner.clocks.get(instance.clock()) else {
                return;
            };
            (instance.step(clock.system_time()), instance.property().clone())
        };

        match step {
            Step::Write(value) => {
                if !property.set(&value, WriteMode::Animated) {
                    self.on_target_destroyed(property.key());
                }
            }
            Step::Finished => self.finish(id),
        }
    }

    /// Natural end: stop, restore, notify, and queue the cleanup
    fn finish(&self, id: AnimationId) {
        let (property, value, mode, handler) = {
            let mut inner = self.inner.borrow_mut();
            let Some(instance) = inner.animations.get_mut(id) else {
                return;
            };
            if !instance.is_running() {
                return;
            }
            let value = instance.mark_stopped();
            let mode = instance.spec().reset_mode();
            let property = instance.property().clone();
            let handler = instance.spec().completion_handler().cloned();
            let clock = instance.clock();
            if let Some(clock) = inner.clocks.get_mut(clock) {
                clock.remove_animation(id);
            }
            inner.pending_finished.push(id);
            (property, value, mode, handler)
        };

        tracing::debug!(property = %property.id(), "animation finished");
        if !property.set(&value, WriteMode::Reset(mode)) {
            self.on_target_destroyed(property.key());
        }
        if let Some(handler) = handler {
            handler.on_finished(self);
        }
    }

    /// Discard instances that finished since the last call
    pub fn process_finished(&self) {
        let garbage: Vec<AnimationInstance> = {
            let mut inner = self.inner.borrow_mut();
            let pending = std::mem::take(&mut inner.pending_finished);
            pending
                .into_iter()
                .filter_map(|id| {
                    inner.detach(id);
                    inner.release(id)
                })
                .collect()
        };
        drop(garbage);
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new()
    }
}
